//! The per-run publishing loop.
//!
//! Fetches one batch from the mail source and walks it sequentially:
//! consult the ledger, convert, persist, record. A failure in one message
//! is logged and never aborts the rest of the batch.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::PublishConfig;
use crate::convert;
use crate::error::{Mail2BlogError, Result};
use crate::ledger::DeliveryLedger;
use crate::post::BlogPost;
use crate::source::{FetchedMail, MailSource};

/// Counts for one run of the batch loop.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub published: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum Outcome {
    Published(PathBuf),
    Skipped,
}

/// Fetch a batch and publish every message that is not yet in the ledger.
///
/// Only the fetch itself is fatal. Per-message errors (missing id, image
/// decode failure, I/O) leave the ledger untouched for that message, so it
/// is retried on the next invocation.
pub fn publish_batch(
    source: &mut dyn MailSource,
    ledger: &mut DeliveryLedger,
    config: &PublishConfig,
    limit: usize,
) -> Result<RunSummary> {
    let batch = source.fetch_batch(limit)?;

    if batch.is_empty() {
        info!("No new messages found");
        return Ok(RunSummary::default());
    }

    let mut summary = RunSummary::default();
    for fetched in &batch {
        match publish_one(fetched, ledger, config) {
            Ok(Outcome::Published(path)) => {
                info!(path = %path.display(), "Post published");
                summary.published += 1;
            }
            Ok(Outcome::Skipped) => summary.skipped += 1,
            Err(e) => {
                warn!(
                    subject = %fetched.message.subject,
                    id = fetched.message.message_id.as_deref().unwrap_or("<none>"),
                    error = %e,
                    "Failed to publish message"
                );
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

fn publish_one(
    fetched: &FetchedMail,
    ledger: &mut DeliveryLedger,
    config: &PublishConfig,
) -> Result<Outcome> {
    let message = &fetched.message;
    let id = message
        .message_id
        .as_deref()
        .ok_or(Mail2BlogError::MissingMessageId)?;

    if ledger.is_delivered(id) {
        info!(id, subject = %message.subject, "Already published, skipping");
        return Ok(Outcome::Skipped);
    }

    let body = convert::convert(&message.body_html, &fetched.attachments, &config.assets_dir)?;
    let post = BlogPost::new(&message.subject, &message.sender, message.date, body);
    let path = post.persist(&config.post_dir)?;

    // Recorded only after the post file exists. A crash in between means a
    // duplicate post on the next run, never a lost message.
    ledger.record_delivered(id, &path)?;

    Ok(Outcome::Published(path))
}
