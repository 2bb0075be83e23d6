//! Queries, filters, and the predicate compiler.

mod predicate;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CompileError;
use crate::value::FieldValue;

pub use predicate::{Predicate, PredicateArg, REFERENCE_EPOCH_OFFSET, compile};

/// Filter comparators accepted by the query endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Comparator {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEquals,
    GreaterThan,
    GreaterThanOrEquals,
    Near,
    ContainsAllTokens,
    ContainsAnyTokens,
    In,
    NotIn,
    ListContains,
    NotListContains,
    NotListContainsAny,
    BeginsWith,
    NotBeginsWith,
    ListMemberBeginsWith,
    NotListMemberBeginsWith,
    ListContainsAll,
    NotListContainsAll,
}

impl Comparator {
    /// Comparators whose value or field is a list.
    pub fn is_list_oriented(&self) -> bool {
        matches!(
            self,
            Comparator::In
                | Comparator::NotIn
                | Comparator::ListContains
                | Comparator::NotListContains
                | Comparator::NotListContainsAny
                | Comparator::ListMemberBeginsWith
                | Comparator::NotListMemberBeginsWith
                | Comparator::ListContainsAll
                | Comparator::NotListContainsAll
        )
    }

    /// The comparator that holds when the operands are swapped.
    pub fn reversed(&self) -> Self {
        match self {
            Comparator::LessThan => Comparator::GreaterThan,
            Comparator::LessThanOrEquals => Comparator::GreaterThanOrEquals,
            Comparator::GreaterThan => Comparator::LessThan,
            Comparator::GreaterThanOrEquals => Comparator::LessThanOrEquals,
            other => *other,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        f.write_str(&name)
    }
}

/// One comparator/field/value constraint.
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub comparator: Comparator,
    pub field_name: String,
    pub value: FieldValue,
}

impl Filter {
    pub fn new(comparator: Comparator, field_name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            comparator,
            field_name: field_name.into(),
            value: value.into(),
        }
    }
}

/// Result ordering on a single field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortDescriptor {
    pub field_name: String,
    pub ascending: bool,
}

impl SortDescriptor {
    pub fn new(field_name: impl Into<String>, ascending: bool) -> Self {
        Self {
            field_name: field_name.into(),
            ascending,
        }
    }
}

/// A record type plus the filters and ordering to apply to it.
///
/// # Example
///
/// ```
/// use ckws::{Comparator, FieldValue, Predicate, Query};
///
/// let predicate = Predicate::new("%K == %@", &["lastName".into(), "Chen".into()]).unwrap();
/// let query = Query::new("Users", &predicate).unwrap().sorted_by("firstName", true);
///
/// assert_eq!(query.filters[0].comparator, Comparator::Equals);
/// assert_eq!(query.filters[0].value, FieldValue::from("Chen"));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    pub record_type: String,
    pub filters: Vec<Filter>,
    pub sort: Vec<SortDescriptor>,
}

impl Query {
    /// Build a query by compiling `predicate`.
    pub fn new(record_type: impl Into<String>, predicate: &Predicate) -> Result<Self, CompileError> {
        Ok(Self::with_filters(record_type, predicate.compile()?))
    }

    /// Build a query from already-compiled filters.
    pub fn with_filters(record_type: impl Into<String>, filters: Vec<Filter>) -> Self {
        Self {
            record_type: record_type.into(),
            filters,
            sort: Vec::new(),
        }
    }

    /// Append a sort descriptor.
    pub fn sorted_by(mut self, field_name: impl Into<String>, ascending: bool) -> Self {
        self.sort.push(SortDescriptor::new(field_name, ascending));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparators_use_wire_names() {
        assert_eq!(Comparator::ListContains.to_string(), "LIST_CONTAINS");
        assert_eq!(
            serde_json::to_value(Comparator::GreaterThanOrEquals).unwrap(),
            "GREATER_THAN_OR_EQUALS"
        );
        let parsed: Comparator = serde_json::from_value("NOT_LIST_CONTAINS_ANY".into()).unwrap();
        assert_eq!(parsed, Comparator::NotListContainsAny);
    }

    #[test]
    fn reversing_only_touches_ordering_comparators() {
        assert_eq!(Comparator::LessThan.reversed(), Comparator::GreaterThan);
        assert_eq!(Comparator::GreaterThanOrEquals.reversed(), Comparator::LessThanOrEquals);
        assert_eq!(Comparator::Equals.reversed(), Comparator::Equals);
        assert_eq!(Comparator::In.reversed(), Comparator::In);
    }

    #[test]
    fn true_predicate_query_has_no_filters() {
        let query = Query::new("Users", &Predicate::value(true)).unwrap();
        assert!(query.filters.is_empty());
        assert!(Query::new("Users", &Predicate::value(false)).is_err());
    }
}
