pub mod client;
pub use client::Client;

mod error;
pub use error::{Error, ErrorKind};

pub mod consumer_groups;
pub mod records;
pub mod topics;

lazy_static::lazy_static! {
    // Used when no endpoint is configured for the "local" profile.
    pub static ref LOCAL_API_URL: url::Url = url::Url::parse("http://localhost:8080/").unwrap();
}

/// User agent reported by clients of this crate, absent a more specific one.
pub const DEFAULT_USER_AGENT: &str = concat!("console-client/", env!("CARGO_PKG_VERSION"));
