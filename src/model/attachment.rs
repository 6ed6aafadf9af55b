//! Inline attachment payloads.

/// A fully-decoded inline attachment.
///
/// Unlike regular attachments, inline parts are referenced from the HTML
/// body by their Content-ID (`cid:` tokens), so the id doubles as the
/// lookup key within one message.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Content-ID token as referenced from the body, angle brackets stripped.
    pub content_id: String,

    /// Filename of the attachment. Generated if missing from the headers.
    pub filename: String,

    /// MIME content type (e.g. `"image/png"`, `"application/pdf"`).
    pub content_type: String,

    /// Decoded binary payload.
    pub payload: Vec<u8>,
}
