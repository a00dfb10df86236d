//! Operator configuration for query evaluation.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::document::{DocumentLocator, SiblingFileLocator};

/// Whether a local container runtime may be used to honour Docker hints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContainerRuntime {
    /// Probe `PATH` for a `docker` executable.
    #[default]
    Detect,
    Available,
    Unavailable,
}

impl ContainerRuntime {
    pub fn is_available(self) -> bool {
        match self {
            Self::Detect => {
                let found = which::which("docker").is_ok();
                debug!(found, "probed for a docker executable");
                found
            }
            Self::Available => true,
            Self::Unavailable => false,
        }
    }
}

/// Settings supplied by the operator rather than by the document or its inputs.
#[derive(Clone)]
pub struct InspectOptions {
    /// Script engine executable; `None` searches `PATH` for `node`/`nodejs`.
    pub script_engine: Option<PathBuf>,
    pub container_runtime: ContainerRuntime,
    /// Strategy for resolving workflow step `run` references.
    pub document_locator: Arc<dyn DocumentLocator + Send + Sync>,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            script_engine: None,
            container_runtime: ContainerRuntime::default(),
            document_locator: Arc::new(SiblingFileLocator),
        }
    }
}

impl fmt::Debug for InspectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InspectOptions")
            .field("script_engine", &self.script_engine)
            .field("container_runtime", &self.container_runtime)
            .finish_non_exhaustive()
    }
}
