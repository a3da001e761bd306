//! Post-dispatch notification hook

use serde_json::Value;

use crate::ContractError;

/// Callback invoked after every send attempt with the batch that was attempted.
///
/// Called whether or not the transport succeeded.
pub trait DispatchHook: Send + Sync {
    /// Hook name (used for logging)
    fn name(&self) -> &str {
        "hook"
    }

    fn on_dispatched(&self, metrics: &[Value]) -> Result<(), ContractError>;
}

impl<F> DispatchHook for F
where
    F: Fn(&[Value]) -> Result<(), ContractError> + Send + Sync,
{
    fn name(&self) -> &str {
        "closure"
    }

    fn on_dispatched(&self, metrics: &[Value]) -> Result<(), ContractError> {
        (self)(metrics)
    }
}

/// Hook that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHook;

impl DispatchHook for NoopHook {
    fn name(&self) -> &str {
        "noop"
    }

    fn on_dispatched(&self, _metrics: &[Value]) -> Result<(), ContractError> {
        Ok(())
    }
}
