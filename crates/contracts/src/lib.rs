//! # Contracts
//!
//! Frozen interface contracts shared by every relay crate: the metric event
//! model, the wire payload, the site connection / hook / identity traits and
//! the relay configuration.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.

mod config;
mod connection;
mod error;
mod event;
mod hook;
mod identity;
mod payload;
mod version;

pub use config::*;
pub use connection::{LocalSiteConnection, SiteConnection};
pub use error::*;
pub use event::*;
pub use hook::{DispatchHook, NoopHook};
pub use identity::{IdentityProvider, StaticIdentity};
pub use payload::*;
pub use version::{ServerVersion, MIN_METRICS_VERSION};
