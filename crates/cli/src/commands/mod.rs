//! Command implementations.

mod event_spec;
mod run;
mod validate;

pub use run::run_relay;
pub use validate::run_validate;
