//! ckws - CloudKit Web Services client
//!
//! Signed access to the record API of a CloudKit container: save records
//! (uploading their assets first), fetch and delete them by id, and query
//! them with predicate strings. Requests are authenticated with a
//! server-to-server P-256 key.
//!
//! # Example
//!
//! ```no_run
//! use ckws::{Asset, Config, Container, Predicate, PrivateKey, Query, Record};
//!
//! # async fn example() -> Result<(), ckws::Error> {
//! let key = PrivateKey::from_file("eckey.pem")?;
//! let container = Container::new(Config::new("iCloud.com.example.app", "1234567890", key));
//! let database = container.public_database();
//!
//! let mut photo = Record::new("Photos");
//! photo.set("title", "sunset");
//! photo.set("image", Asset::from_file("sunset.png"));
//! let saved = database.save(&photo).await?;
//! println!("{}", saved.get("image").and_then(|v| v.as_asset()).and_then(|a| a.download_url()).unwrap_or_default());
//!
//! let predicate = Predicate::new("title BEGINSWITH %@", &["sun".into()])?;
//! let page = database.perform(&Query::new("Photos", &predicate)?, None, Some(50), None).await?;
//! for record in page.records {
//!     println!("{}", record.id());
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod query;
pub mod record;
pub mod transport;
pub mod types;
pub mod value;
pub mod ws;

// Re-export primary types at crate root for convenience
pub use auth::{PrivateKey, RequestSigner};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, MissingAssetPolicy};
pub use database::{Container, Database, QueryOutput, SavePolicy};
pub use error::Error;
pub use query::{Comparator, Filter, Predicate, PredicateArg, Query, SortDescriptor};
pub use record::Record;
pub use transport::{ReqwestTransport, Transport};
pub use types::{Environment, RecordId, Scope, ServiceUrl, ZoneId};
pub use value::{Asset, AssetDescriptor, FieldValue, Reference, ReferenceAction};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
