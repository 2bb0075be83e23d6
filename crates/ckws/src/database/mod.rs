//! Containers and databases.
//!
//! A [`Container`] owns one [`WsClient`] and hands out a [`Database`] per
//! scope. Every database operation is an independent request (or, for
//! saves with assets, a short sequence of requests) against that client.

mod save;

use std::sync::Arc;
use tracing::{debug, instrument};

use crate::clock::Clock;
use crate::config::Config;
use crate::error::{DecodeError, Error};
use crate::query::Query;
use crate::record::{Completeness, Record, RecordWire, codec};
use crate::transport::Transport;
use crate::types::{RecordId, Scope, ZoneId};
use crate::ws::WsClient;
use crate::ws::endpoints::{
    LookupRequest, ModifyRequest, OperationType, QueryRequest, QueryResponse, QueryWire,
    RECORDS_LOOKUP, RECORDS_MODIFY, RECORDS_QUERY, RecordLookup, RecordOperation, RecordsResponse,
};
use crate::ws::errors;

pub use save::SavePolicy;

/// Entry point for one container.
///
/// # Example
///
/// ```no_run
/// use ckws::{Config, Container, PrivateKey, Record};
///
/// # async fn example() -> ckws::Result<()> {
/// let key = PrivateKey::from_file("eckey.pem")?;
/// let container = Container::new(Config::new("iCloud.com.example.app", "1234567890", key));
///
/// let mut record = Record::new("Users");
/// record.set("firstName", "Mei");
/// let saved = container.public_database().save(&record).await?;
/// assert!(saved.is_persisted());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Container {
    client: WsClient,
}

impl Container {
    pub fn new(config: Config) -> Self {
        Self {
            client: WsClient::new(config),
        }
    }

    /// A container using a custom transport and clock.
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>, clock: Arc<dyn Clock>) -> Self {
        Self {
            client: WsClient::with_transport(config, transport, clock),
        }
    }

    pub fn identifier(&self) -> &str {
        self.client.config().container()
    }

    pub fn config(&self) -> &Config {
        self.client.config()
    }

    pub fn public_database(&self) -> Database {
        self.database(Scope::Public)
    }

    pub fn private_database(&self) -> Database {
        self.database(Scope::Private)
    }

    pub fn shared_database(&self) -> Database {
        self.database(Scope::Shared)
    }

    pub fn database(&self, scope: Scope) -> Database {
        Database {
            client: self.client.clone(),
            scope,
        }
    }
}

/// One page of query results.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryOutput {
    pub records: Vec<Record>,
    /// Pass back to [`Database::perform`] to fetch the next page.
    pub continuation_marker: Option<String>,
}

/// A database scope within a container.
#[derive(Clone, Debug)]
pub struct Database {
    client: WsClient,
    scope: Scope,
}

impl Database {
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Save a record, uploading any staged assets first.
    ///
    /// Unsaved records are created; saved ones are updated only if their
    /// change tag still matches the server's.
    pub async fn save(&self, record: &Record) -> Result<Record, Error> {
        self.save_with_policy(record, SavePolicy::default()).await
    }

    pub async fn save_with_policy(&self, record: &Record, policy: SavePolicy) -> Result<Record, Error> {
        save::SaveOperation::new(&self.client, self.scope, record, policy)
            .run()
            .await
    }

    /// Fetch one record by id.
    #[instrument(skip(self), fields(scope = %self.scope))]
    pub async fn fetch(&self, id: &RecordId) -> Result<Record, Error> {
        let request = LookupRequest {
            records: vec![RecordLookup {
                record_name: id.name().to_string(),
            }],
            zone_id: None,
        };
        let response: RecordsResponse = self.client.post(self.scope, RECORDS_LOOKUP, &request).await?;
        let wire = single(response.records)?;
        Ok(codec::decode_record(wire, Completeness::Typed)?)
    }

    /// Delete a record by id, whatever its server version.
    pub async fn delete(&self, id: &RecordId) -> Result<RecordId, Error> {
        self.delete_wire(OperationType::ForceDelete, RecordWire::reference_only(id, None))
            .await
    }

    /// Delete a record only if its change tag still matches the server's.
    pub async fn delete_record(&self, record: &Record) -> Result<RecordId, Error> {
        let wire = RecordWire::reference_only(record.id(), record.change_tag());
        let operation = match record.change_tag() {
            Some(_) => OperationType::Delete,
            None => OperationType::ForceDelete,
        };
        self.delete_wire(operation, wire).await
    }

    #[instrument(skip(self, record), fields(scope = %self.scope, record = record.record_name.as_deref().unwrap_or("")))]
    async fn delete_wire(&self, operation_type: OperationType, record: RecordWire) -> Result<RecordId, Error> {
        let request = ModifyRequest {
            operations: vec![RecordOperation {
                operation_type,
                desired_keys: None,
                record,
            }],
            zone_id: None,
        };
        let response: RecordsResponse = self.client.post(self.scope, RECORDS_MODIFY, &request).await?;
        let wire = single(response.records)?;
        let deleted = codec::decode_record(wire, Completeness::Name)?;
        debug!(record = %deleted.id(), "record deleted");
        Ok(deleted.id().clone())
    }

    /// Run a query, returning one page of results.
    #[instrument(skip(self, query), fields(scope = %self.scope, record_type = %query.record_type))]
    pub async fn perform(
        &self,
        query: &Query,
        zone: Option<ZoneId>,
        results_limit: Option<u32>,
        continuation: Option<String>,
    ) -> Result<QueryOutput, Error> {
        let request = QueryRequest {
            zone_id: zone,
            results_limit,
            continuation_marker: continuation,
            query: QueryWire::from_query(query)?,
        };
        let response: QueryResponse = self.client.post(self.scope, RECORDS_QUERY, &request).await?;

        let records = response
            .records
            .into_iter()
            .map(|wire| {
                if let Some(error) = errors::record_error(&wire) {
                    return Err(Error::from(error));
                }
                Ok(codec::decode_record(wire, Completeness::Typed)?)
            })
            .collect::<Result<Vec<_>, Error>>()?;
        debug!(count = records.len(), more = response.continuation_marker.is_some(), "query page");

        Ok(QueryOutput {
            records,
            continuation_marker: response.continuation_marker,
        })
    }
}

/// The only record of a single-record response, with any per-record
/// error surfaced.
fn single(records: Vec<RecordWire>) -> Result<RecordWire, Error> {
    let wire = records
        .into_iter()
        .next()
        .ok_or_else(|| DecodeError::shape("one record", "an empty records list"))?;
    match errors::record_error(&wire) {
        Some(error) => Err(error.into()),
        None => Ok(wire),
    }
}
