//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_metabase_client;
mod rate_limit_headers;

pub use http_metabase_client::HttpMetabaseClient;
