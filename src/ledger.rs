//! The delivery ledger: which message ids have already produced a post.
//!
//! A single JSON document mapping message id → post path, loaded entirely
//! at startup and rewritten in full after every successful delivery. Not
//! safe for concurrent invocations; the scheduler is expected to run one
//! instance at a time.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Mail2BlogError, Result};

/// Relative path of the ledger document.
pub const LEDGER_FILENAME: &str = "post_history.json";

/// Durable mapping from message identity to delivery outcome.
#[derive(Debug)]
pub struct DeliveryLedger {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl DeliveryLedger {
    /// Load the ledger from `path`.
    ///
    /// A missing file means an empty ledger, never an error. A file that
    /// exists but does not parse is fatal: treating it as empty would
    /// republish every message in the mailbox.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|e| Mail2BlogError::InvalidLedger {
                    path: path.clone(),
                    reason: e.to_string(),
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(Mail2BlogError::io(&path, e)),
        };

        Ok(Self { path, entries })
    }

    /// Whether a message id has already produced a post.
    pub fn is_delivered(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Record a delivery and rewrite the whole store.
    ///
    /// Call this only after the post file was persisted; a crash between
    /// the two produces a duplicate post on the next run, never a lost one.
    pub fn record_delivered(&mut self, id: &str, post_path: &Path) -> Result<()> {
        self.entries
            .insert(id.to_string(), post_path.to_string_lossy().into_owned());
        self.save()
    }

    /// Number of recorded deliveries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn save(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.entries).map_err(|e| {
            Mail2BlogError::InvalidLedger {
                path: self.path.clone(),
                reason: e.to_string(),
            }
        })?;
        std::fs::write(&self.path, contents).map_err(|e| Mail2BlogError::io(&self.path, e))
    }
}
