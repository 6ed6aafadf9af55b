//! The fetched mail message, reduced to the fields a post needs.

use chrono::{DateTime, Utc};

/// A single mail message as handed over by the mail source.
///
/// Field defaulting happens at the source boundary: `subject` and `sender`
/// are already resolved (`"Untitled"` / `"Unknown"` fallbacks), and `date`
/// falls back to the time of the run. Only `message_id` stays optional —
/// a missing id is a per-message failure decided by the publisher, not here.
#[derive(Debug, Clone)]
pub struct Message {
    /// The `Message-ID` header value, angle brackets stripped.
    pub message_id: Option<String>,

    /// Decoded subject line.
    pub subject: String,

    /// Sender display name (falls back to the bare address).
    pub sender: String,

    /// Parsed date from the `Date:` header.
    pub date: DateTime<Utc>,

    /// HTML body. Plain-text body if the message carries no HTML part.
    pub body_html: String,
}
