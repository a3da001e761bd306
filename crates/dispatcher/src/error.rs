//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// A thread panicked while holding the queue lock
    #[error("metric queue lock poisoned")]
    QueuePoisoned,

    /// Worker task could not be joined
    #[error("dispatch worker {worker_id} failed to join: {message}")]
    WorkerJoin { worker_id: usize, message: String },

    /// Hook creation error
    #[error("failed to create hook '{name}': {message}")]
    HookCreation { name: String, message: String },

    /// Site / payload error (from contract)
    #[error("contract error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// Create a hook creation error
    pub fn hook_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HookCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
