// src/pipeline/claims.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::errors::{PipelineError, Result};

/// Which task wrote which output path during one build pass.
///
/// Tasks own disjoint outputs by configuration; this registry turns an
/// accidental overlap into an error for the second claimant instead of a
/// silent last-writer-wins.
#[derive(Debug, Clone, Default)]
pub struct OutputClaims {
    owners: Arc<Mutex<HashMap<PathBuf, String>>>,
}

impl OutputClaims {
    /// Claim `path` for `task`. Re-claiming by the same task is fine.
    pub fn claim(&self, path: &Path, task: &str) -> Result<()> {
        let mut owners = match self.owners.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("output claim registry mutex poisoned; continuing");
                poisoned.into_inner()
            }
        };

        match owners.get(path) {
            Some(owner) if owner != task => Err(PipelineError::OutputConflict {
                path: path.to_path_buf(),
                first: owner.clone(),
                second: task.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                owners.insert(path.to_path_buf(), task.to_string());
                Ok(())
            }
        }
    }

    pub fn owner_of(&self, path: &Path) -> Option<String> {
        self.owners.lock().ok()?.get(path).cloned()
    }
}
