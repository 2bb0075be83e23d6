//! Predicate strings and their compiler.
//!
//! The grammar is a narrow textual subset: one comparison per predicate,
//! found by scanning for operator tokens, plus the `TRUEPREDICATE` and
//! `FALSEPREDICATE` literals. There is no `AND`/`OR`. Text that happens to
//! contain an operator token (a field named `INDEX`, a quoted `=`) splits
//! in the wrong place; that is a known limitation of the scanner.

use chrono::{DateTime, Utc};

use super::{Comparator, Filter};
use crate::error::CompileError;
use crate::types::RecordId;
use crate::value::{FieldValue, Reference, ReferenceAction};

/// Seconds between the Unix epoch and 2001-01-01T00:00:00Z, the epoch
/// used by `CAST(<seconds>, "NSDate")` literals.
pub const REFERENCE_EPOCH_OFFSET: i64 = 978_307_200;

const TRUE_PREDICATE: &str = "TRUEPREDICATE";
const FALSE_PREDICATE: &str = "FALSEPREDICATE";

/// Operator tokens in priority order. The leftmost occurrence wins; ties
/// go to the earlier entry, so `==` beats `=` and `<>` beats `<`.
const OPERATORS: [(&str, Comparator); 13] = [
    ("==", Comparator::Equals),
    (">=", Comparator::GreaterThanOrEquals),
    ("=>", Comparator::GreaterThanOrEquals),
    ("<=", Comparator::LessThanOrEquals),
    ("=<", Comparator::LessThanOrEquals),
    ("!=", Comparator::NotEquals),
    ("<>", Comparator::NotEquals),
    ("=", Comparator::Equals),
    (">", Comparator::GreaterThan),
    ("<", Comparator::LessThan),
    ("CONTAINS", Comparator::ListContains),
    ("BEGINSWITH", Comparator::BeginsWith),
    ("IN", Comparator::In),
];

/// An argument substituted into a predicate format string.
#[derive(Clone, Debug, PartialEq)]
pub enum PredicateArg {
    String(String),
    Integer(i64),
    Double(f64),
    Date(DateTime<Utc>),
    Reference(RecordId),
}

impl PredicateArg {
    /// Rendering for a `%@` placeholder.
    fn as_value(&self) -> String {
        match self {
            PredicateArg::String(s) => format!("\"{}\"", s),
            PredicateArg::Integer(n) => n.to_string(),
            // Debug keeps the fraction on whole values (`3.0`, not `3`)
            PredicateArg::Double(d) if d.is_finite() => format!("{:?}", d),
            PredicateArg::Double(d) => d.to_string(),
            PredicateArg::Date(when) => {
                let seconds = when.timestamp_millis() as f64 / 1000.0 - REFERENCE_EPOCH_OFFSET as f64;
                format!("CAST({}, \"NSDate\")", seconds)
            }
            PredicateArg::Reference(id) => {
                format!("<CKReference: action=NONE; recordName={}>", id.name())
            }
        }
    }

    /// Rendering for a `%K` placeholder.
    fn as_key_path(&self) -> String {
        match self {
            PredicateArg::String(s) => s.clone(),
            PredicateArg::Reference(id) => id.name().to_string(),
            other => other.as_value(),
        }
    }
}

impl From<&str> for PredicateArg {
    fn from(value: &str) -> Self {
        PredicateArg::String(value.to_string())
    }
}

impl From<String> for PredicateArg {
    fn from(value: String) -> Self {
        PredicateArg::String(value)
    }
}

impl From<i64> for PredicateArg {
    fn from(value: i64) -> Self {
        PredicateArg::Integer(value)
    }
}

impl From<f64> for PredicateArg {
    fn from(value: f64) -> Self {
        PredicateArg::Double(value)
    }
}

impl From<DateTime<Utc>> for PredicateArg {
    fn from(value: DateTime<Utc>) -> Self {
        PredicateArg::Date(value)
    }
}

impl From<RecordId> for PredicateArg {
    fn from(value: RecordId) -> Self {
        PredicateArg::Reference(value)
    }
}

/// A predicate in its textual form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Predicate {
    format: String,
}

impl Predicate {
    /// Build a predicate from a format string.
    ///
    /// `%@` takes the next argument as a value (strings are double-quoted)
    /// and `%K` takes it verbatim as a key path. Single quotes in the format
    /// text itself become double quotes. Every placeholder needs exactly one
    /// argument.
    pub fn new(format: &str, args: &[PredicateArg]) -> Result<Self, CompileError> {
        let mut out = String::with_capacity(format.len());
        let mut args_iter = args.iter();
        let mut rest = format;

        while let Some(pos) = rest.find('%') {
            out.push_str(&rest[..pos].replace('\'', "\""));
            let after = &rest[pos + 1..];
            let rendered = match after.chars().next() {
                Some('@') => next_arg(&mut args_iter, format)?.as_value(),
                Some('K') => next_arg(&mut args_iter, format)?.as_key_path(),
                _ => {
                    out.push('%');
                    rest = after;
                    continue;
                }
            };
            out.push_str(&rendered);
            rest = &after[1..];
        }
        out.push_str(&rest.replace('\'', "\""));

        if args_iter.next().is_some() {
            return Err(CompileError::malformed(format, "more arguments than placeholders"));
        }
        Ok(Self { format: out })
    }

    /// `TRUEPREDICATE` or `FALSEPREDICATE`.
    pub fn value(value: bool) -> Self {
        let format = if value { TRUE_PREDICATE } else { FALSE_PREDICATE };
        Self {
            format: format.to_string(),
        }
    }

    /// The substituted predicate text.
    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn compile(&self) -> Result<Vec<Filter>, CompileError> {
        compile(&self.format)
    }
}

fn next_arg<'a>(
    args: &mut std::slice::Iter<'a, PredicateArg>,
    format: &str,
) -> Result<&'a PredicateArg, CompileError> {
    args.next()
        .ok_or_else(|| CompileError::malformed(format, "fewer arguments than placeholders"))
}

/// One side of a comparison.
#[derive(Debug)]
enum Operand {
    Field { name: String, any: bool },
    Value(FieldValue),
}

/// Compile predicate text into filters.
///
/// `TRUEPREDICATE` yields no filters. Anything else must be a single
/// comparison between one field and one literal.
///
/// ```
/// use ckws::query::{compile, Comparator, Filter};
///
/// let filters = compile("'red' IN favoriteColors").unwrap();
/// assert_eq!(filters, vec![Filter::new(Comparator::ListContains, "favoriteColors", "red")]);
/// ```
pub fn compile(predicate: &str) -> Result<Vec<Filter>, CompileError> {
    let text = predicate.trim();
    if text == TRUE_PREDICATE {
        return Ok(Vec::new());
    }
    if text == FALSE_PREDICATE {
        return Err(CompileError::AlwaysFalse);
    }

    let (token, operator) = OPERATORS
        .iter()
        .filter_map(|(token, comparator)| text.find(token).map(|pos| (pos, *token, *comparator)))
        .min_by_key(|(pos, _, _)| *pos)
        .map(|(_, token, comparator)| (token, comparator))
        .ok_or_else(|| CompileError::malformed(predicate, "no comparison operator"))?;

    let segments: Vec<&str> = text.split(token).map(str::trim).collect();
    let [left, right] = segments.as_slice() else {
        return Err(CompileError::malformed(
            predicate,
            format!("expected one '{}' but found {}", token, segments.len() - 1),
        ));
    };

    let left = classify(left, predicate)?;
    let right = classify(right, predicate)?;

    let (field, any, value, value_first) = match (left, right) {
        (Operand::Field { name, any }, Operand::Value(value)) => (name, any, value, false),
        (Operand::Value(value), Operand::Field { name, any }) => (name, any, value, true),
        (Operand::Field { .. }, Operand::Field { .. }) => {
            return Err(CompileError::malformed(predicate, "both sides are field names"));
        }
        (Operand::Value(_), Operand::Value(_)) => {
            return Err(CompileError::malformed(predicate, "neither side is a field name"));
        }
    };

    let mut comparator = operator;
    if any && operator == Comparator::Equals {
        comparator = Comparator::ListContains;
    }
    if matches!(value, FieldValue::StringList(_)) && !comparator.is_list_oriented() {
        comparator = Comparator::In;
    }
    if operator == Comparator::In && value_first {
        comparator = Comparator::ListContains;
    }
    if value_first {
        comparator = comparator.reversed();
    }

    Ok(vec![Filter {
        comparator,
        field_name: field,
        value,
    }])
}

fn classify(segment: &str, predicate: &str) -> Result<Operand, CompileError> {
    if segment.is_empty() {
        return Err(CompileError::malformed(predicate, "empty operand"));
    }
    if let Some(inner) = segment.strip_prefix("CAST(") {
        return cast_date(inner, predicate).map(Operand::Value);
    }
    if let Some(list) = list_literal(segment) {
        return Ok(Operand::Value(FieldValue::StringList(list)));
    }
    if let Some(s) = quoted(segment) {
        return Ok(Operand::Value(FieldValue::String(s.to_string())));
    }
    if let Ok(n) = segment.parse::<i64>() {
        return Ok(Operand::Value(FieldValue::Integer(n)));
    }
    if let Some(d) = decimal(segment) {
        return Ok(Operand::Value(FieldValue::Double(d)));
    }
    if segment.starts_with('<') && segment.ends_with('>') {
        return reference(segment, predicate).map(Operand::Value);
    }

    let (name, any) = match segment.strip_prefix("ANY ") {
        Some(rest) => (rest.trim(), true),
        None => (segment, false),
    };
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(CompileError::malformed(
            predicate,
            format!("'{}' is neither a literal nor a field name", segment),
        ));
    }
    Ok(Operand::Field {
        name: name.to_string(),
        any,
    })
}

fn quoted(segment: &str) -> Option<&str> {
    ['"', '\''].into_iter().find_map(|quote| {
        segment
            .strip_prefix(quote)?
            .strip_suffix(quote)
    })
}

fn list_literal(segment: &str) -> Option<Vec<String>> {
    let body = segment
        .strip_prefix("ANY ")
        .map(str::trim_start)
        .unwrap_or(segment)
        .strip_prefix('{')?
        .strip_suffix('}')?;
    let items = body
        .split(',')
        .map(|item| item.trim_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace()))
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    Some(items)
}

fn decimal(segment: &str) -> Option<f64> {
    let starts_numeric = segment
        .trim_start_matches(['-', '+'])
        .starts_with(|c: char| c.is_ascii_digit() || c == '.');
    if !starts_numeric {
        return None;
    }
    segment.parse::<f64>().ok().filter(|d| d.is_finite())
}

/// `CAST(<seconds since 2001-01-01>, "NSDate")` as milliseconds since the
/// Unix epoch.
fn cast_date(inner: &str, predicate: &str) -> Result<FieldValue, CompileError> {
    let body = inner
        .strip_suffix(')')
        .ok_or_else(|| CompileError::malformed(predicate, "unterminated CAST"))?;
    let (seconds, kind) = body
        .split_once(',')
        .ok_or_else(|| CompileError::malformed(predicate, "CAST needs a value and a type"))?;
    if quoted(kind.trim()) != Some("NSDate") {
        return Err(CompileError::malformed(predicate, "only CAST to NSDate is supported"));
    }
    let seconds: f64 = seconds
        .trim()
        .parse()
        .map_err(|_| CompileError::malformed(predicate, "CAST value is not a number"))?;
    let millis = ((seconds + REFERENCE_EPOCH_OFFSET as f64) * 1000.0).round() as i64;
    Ok(FieldValue::DateTime(millis))
}

fn reference(segment: &str, predicate: &str) -> Result<FieldValue, CompileError> {
    if !segment.starts_with("<CKReference:") {
        return Err(CompileError::malformed(predicate, "unsupported object literal"));
    }
    let (_, after) = segment
        .rsplit_once("recordName=")
        .ok_or_else(|| CompileError::malformed(predicate, "reference without recordName"))?;
    let name = after
        .split([',', ';', '>'])
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| CompileError::malformed(predicate, "reference without recordName"))?;
    Ok(FieldValue::Reference(Reference::new(
        RecordId::new(name),
        ReferenceAction::None,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn single(predicate: &str) -> Filter {
        let mut filters = compile(predicate).unwrap();
        assert_eq!(filters.len(), 1, "{}", predicate);
        filters.remove(0)
    }

    #[test]
    fn literal_predicates() {
        assert_eq!(compile("TRUEPREDICATE").unwrap(), vec![]);
        assert_eq!(compile("FALSEPREDICATE"), Err(CompileError::AlwaysFalse));
    }

    #[test]
    fn single_and_double_equals_match() {
        let expected = Filter::new(Comparator::Equals, "number", 13_i64);
        assert_eq!(single("number = 13"), expected);
        assert_eq!(single("number == 13"), expected);
    }

    #[test]
    fn list_membership_phrasings_agree() {
        let expected = Filter::new(Comparator::ListContains, "favoriteColors", "red");
        assert_eq!(single("favoriteColors CONTAINS 'red'"), expected);
        assert_eq!(single("ANY favoriteColors = 'red'"), expected);
        assert_eq!(single("'red' IN favoriteColors"), expected);
        assert_eq!(single("\"red\" IN favoriteColors"), expected);
    }

    #[test]
    fn field_in_list_literal() {
        assert_eq!(
            single("favoriteColor IN {'red','green'}"),
            Filter::new(
                Comparator::In,
                "favoriteColor",
                vec!["red".to_string(), "green".to_string()]
            )
        );
    }

    #[test]
    fn list_literal_forces_in() {
        let filter = single("ANY { 'red', 'green' } = favoriteColor");
        assert_eq!(filter.comparator, Comparator::In);
        assert_eq!(
            filter.value,
            FieldValue::StringList(vec!["red".into(), "green".into()])
        );
    }

    #[test]
    fn begins_with_keeps_any_field() {
        let filter = single("ANY favoriteColors BEGINSWITH 'red'");
        assert_eq!(filter.comparator, Comparator::BeginsWith);
        assert_eq!(filter.field_name, "favoriteColors");
    }

    #[test]
    fn operator_priority() {
        assert_eq!(single("age >= 21").comparator, Comparator::GreaterThanOrEquals);
        assert_eq!(single("age => 21").comparator, Comparator::GreaterThanOrEquals);
        assert_eq!(single("age <= 21").comparator, Comparator::LessThanOrEquals);
        assert_eq!(single("age =< 21").comparator, Comparator::LessThanOrEquals);
        assert_eq!(single("age != 21").comparator, Comparator::NotEquals);
        assert_eq!(single("age <> 21").comparator, Comparator::NotEquals);
        assert_eq!(single("age > 21").comparator, Comparator::GreaterThan);
        assert_eq!(single("age < 21").comparator, Comparator::LessThan);
    }

    #[test]
    fn value_first_ordering_is_reversed() {
        assert_eq!(
            single("21 < age"),
            Filter::new(Comparator::GreaterThan, "age", 21_i64)
        );
    }

    #[test]
    fn decimals_compile_to_doubles() {
        assert_eq!(single("ratio > 0.5").value, FieldValue::Double(0.5));
        assert_eq!(single("offset = -3").value, FieldValue::Integer(-3));
    }

    #[test]
    fn whole_double_arguments_stay_doubles() {
        let predicate = Predicate::new("ratio > %@", &[3.0_f64.into()]).unwrap();
        assert_eq!(predicate.format(), "ratio > 3.0");
        assert_eq!(predicate.compile().unwrap()[0].value, FieldValue::Double(3.0));

        let predicate = Predicate::new("ratio > %@", &[(-0.25_f64).into()]).unwrap();
        assert_eq!(predicate.compile().unwrap()[0].value, FieldValue::Double(-0.25));
    }

    #[test]
    fn cast_dates_are_shifted_to_unix_millis() {
        let filter = single("createdAt > CAST(630000000, \"NSDate\")");
        assert_eq!(
            filter.value,
            FieldValue::DateTime((630_000_000 + REFERENCE_EPOCH_OFFSET) * 1000)
        );
    }

    #[test]
    fn reference_literals_take_the_record_name() {
        let filter = single(
            "owner == <CKReference: 0x600; recordID=<CKRecordID: 0x601; recordName=E621E1F8, zoneID=_defaultZone>>",
        );
        assert_eq!(
            filter.value,
            FieldValue::Reference(Reference::new(RecordId::new("E621E1F8"), ReferenceAction::None))
        );
    }

    #[test]
    fn malformed_predicates() {
        for predicate in [
            "firstName lastName",
            "a == b",
            "'a' == 'b'",
            "a = 1 = 2",
            " = 3",
            "first name = 3",
            "when > CAST(12, \"NSNumber\")",
        ] {
            assert!(
                matches!(compile(predicate), Err(CompileError::Malformed { .. })),
                "{}",
                predicate
            );
        }
    }

    #[test]
    fn format_substitutes_values_and_key_paths() {
        let predicate = Predicate::new(
            "%K == %@ AND ignored = 'x'",
            &["lastName".into(), "Chen".into()],
        )
        .unwrap();
        assert_eq!(predicate.format(), "lastName == \"Chen\" AND ignored = \"x\"");
    }

    #[test]
    fn format_argument_count_must_match() {
        assert!(Predicate::new("%K == %@", &["a".into()]).is_err());
        assert!(Predicate::new("a == %@", &[1_i64.into(), 2_i64.into()]).is_err());
        assert!(Predicate::new("pct == 100%", &[]).is_ok());
    }

    #[test]
    fn formatted_references_and_dates_compile_back() {
        let id = RecordId::new("emp-1");
        let filters = Predicate::new("manager == %@", &[id.clone().into()])
            .unwrap()
            .compile()
            .unwrap();
        assert_eq!(
            filters[0].value,
            FieldValue::Reference(Reference::new(id, ReferenceAction::None))
        );

        let when = Utc.timestamp_millis_opt(1_608_638_400_000).unwrap();
        let filters = Predicate::new("createdAt > %@", &[when.into()])
            .unwrap()
            .compile()
            .unwrap();
        assert_eq!(filters[0].value, FieldValue::from(when));
    }
}
