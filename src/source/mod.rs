//! Mailbox access: the batch-fetch contract and the IMAP implementation.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::model::attachment::Attachment;
use crate::model::message::Message;

pub mod imap;

/// Default number of messages fetched per run.
///
/// Messages beyond the batch are deferred, not lost: they stay in the
/// mailbox and are picked up by a later run.
pub const DEFAULT_BATCH_LIMIT: usize = 10;

/// A message together with its inline attachments, keyed by Content-ID.
#[derive(Debug, Clone)]
pub struct FetchedMail {
    pub message: Message,
    pub attachments: BTreeMap<String, Attachment>,
}

/// A source of candidate messages.
///
/// One `fetch_batch` call per run. Implementations return at most `limit`
/// messages, ordered most-recent-first, with every inline attachment
/// pre-resolved into the Content-ID lookup. An empty batch is the normal
/// "nothing to do" outcome, not an error.
pub trait MailSource {
    fn fetch_batch(&mut self, limit: usize) -> Result<Vec<FetchedMail>>;
}
