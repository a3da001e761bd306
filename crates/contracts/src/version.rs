//! Remote server version and the metrics capability gate

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Oldest server version that accepts metrics batches
pub const MIN_METRICS_VERSION: ServerVersion = ServerVersion::new(7, 4, 0);

/// `major.minor.patch` version reported by the remote site.
///
/// Ordering is lexicographic on the three components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ServerVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Build from the leading components of a version list.
    ///
    /// Missing minor/patch default to 0, extra components are ignored.
    pub fn from_components(components: &[u64]) -> Result<Self, ContractError> {
        let component = |idx: usize| -> Result<u32, ContractError> {
            components
                .get(idx)
                .copied()
                .unwrap_or(0)
                .try_into()
                .map_err(|_| ContractError::ServerVersion(format!("{components:?}")))
        };

        if components.is_empty() {
            return Err(ContractError::ServerVersion("empty version".to_string()));
        }

        Ok(Self::new(component(0)?, component(1)?, component(2)?))
    }

    /// Whether this server can ingest metrics
    pub fn supports_metrics(&self) -> bool {
        *self >= MIN_METRICS_VERSION
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for ServerVersion {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let components = s
            .trim()
            .trim_start_matches('v')
            .split('.')
            .map(|part| {
                part.parse::<u64>()
                    .map_err(|_| ContractError::ServerVersion(s.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_components(&components)
    }
}
