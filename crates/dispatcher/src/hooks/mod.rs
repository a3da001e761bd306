//! Post-dispatch hook implementations
//!
//! Contains LogHook and FileHook.

mod file;
mod log;

pub use self::file::FileHook;
pub use self::log::LogHook;

use std::sync::Arc;

use contracts::{DispatchHook, HookConfig, HookKind, NoopHook};
use tracing::instrument;

use crate::error::DispatcherError;

/// Create a hook from configuration
#[instrument(name = "dispatcher_build_hook", skip(config), fields(kind = ?config.kind))]
pub fn build_hook(config: &HookConfig) -> Result<Arc<dyn DispatchHook>, DispatcherError> {
    match config.kind {
        HookKind::None => Ok(Arc::new(NoopHook)),
        HookKind::Log => Ok(Arc::new(LogHook::new("log_metrics"))),
        HookKind::File => {
            let path = config.path.as_ref().ok_or_else(|| {
                DispatcherError::hook_creation("file", "missing 'path' for file hook")
            })?;
            let hook = FileHook::new("file_metrics", path)
                .map_err(|e| DispatcherError::hook_creation("file", e.to_string()))?;
            Ok(Arc::new(hook))
        }
    }
}
