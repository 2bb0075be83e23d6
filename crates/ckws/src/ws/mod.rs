//! Web service client and wire types.

mod client;
pub mod endpoints;
pub mod errors;

pub use client::WsClient;
