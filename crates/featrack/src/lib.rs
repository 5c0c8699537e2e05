//! Featrack usage analytics SDK for Rust.
//!
//! Reports customer creation, session lifecycle and feature usage to the
//! Featrack API.
//!
//! # Example
//!
//! ```rust,ignore
//! use featrack::{ErrorMode, Featrack};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), featrack::Error> {
//!     let client = Featrack::builder("ft_token", "my-app")
//!         .error_mode(ErrorMode::Throw)
//!         .build()?;
//!
//!     client.sessions().identify("user-42").await?;
//!
//!     client.usages().track("export-csv")
//!         .feature_name("CSV export")
//!         .send()
//!         .await?;
//!
//!     client.sessions().end(Duration::from_secs(120)).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error modes
//!
//! Every operation returns `Result<Option<T>, Error>`. With
//! [`ErrorMode::Warn`] (the default) failures are logged through `tracing`
//! and the call resolves to `Ok(None)`; with [`ErrorMode::Throw`] they are
//! returned as `Err`.

mod builders;
mod client;
mod config;
mod error;
pub mod global;
mod policy;
mod state;
mod transport;
pub mod types;

pub use client::{
    CustomerMethods, Featrack, SendableCustomer, SendableStart, SendableUsage, SessionMethods,
    UsageMethods,
};
pub use config::{
    Config, ErrorMode, FeatrackBuilder, DEFAULT_API_URL, DEFAULT_TIMEOUT, ENV_API_KEY,
    ENV_API_URL, ENV_APPLICATION_SLUG, ENV_ERROR_MODE,
};
pub use error::{Error, ErrorKind};
pub use types::{Ack, Customer, SessionStarted, UsageAck};
