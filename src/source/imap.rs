//! IMAP-over-TLS mail source.
//!
//! Connects once per run, selects the configured folder and fetches the
//! newest messages by sequence range. Each raw RFC 822 payload is parsed
//! with `mail-parser` into the fixed-shape [`Message`] record plus a
//! Content-ID-keyed attachment map.

use std::collections::BTreeMap;
use std::net::TcpStream;

use chrono::{DateTime, Utc};
use mail_parser::{MessageParser, MimeHeaders};
use native_tls::TlsStream;
use tracing::{debug, warn};

use crate::config::MailboxConfig;
use crate::error::Result;
use crate::model::attachment::Attachment;
use crate::model::message::Message;

use super::{FetchedMail, MailSource};

/// Mail source backed by an authenticated IMAP session.
pub struct ImapSource {
    session: imap::Session<TlsStream<TcpStream>>,
    folder: String,
}

impl ImapSource {
    /// Connect and log in.
    ///
    /// Connection and authentication failures are fatal for the run.
    pub fn connect(config: &MailboxConfig) -> Result<Self> {
        let tls = native_tls::TlsConnector::builder().build()?;

        // The domain is passed twice so the server certificate is checked
        // against the host we are actually connecting to.
        let client = imap::connect(
            (config.host.as_str(), config.port),
            config.host.as_str(),
            &tls,
        )?;

        let session = client
            .login(&config.user, &config.password)
            .map_err(|(e, _)| e)?;

        debug!(host = %config.host, folder = %config.folder, "Logged in to mailbox");

        Ok(Self {
            session,
            folder: config.folder.clone(),
        })
    }
}

impl MailSource for ImapSource {
    fn fetch_batch(&mut self, limit: usize) -> Result<Vec<FetchedMail>> {
        let mailbox = self.session.select(&self.folder)?;
        if mailbox.exists == 0 || limit == 0 {
            return Ok(Vec::new());
        }

        // Sequence numbers are assigned oldest-first; take the tail.
        let last = mailbox.exists;
        let first = last.saturating_sub(limit as u32 - 1).max(1);
        let fetches = self.session.fetch(format!("{first}:{last}"), "RFC822")?;

        let mut batch = Vec::new();
        for fetch in fetches.iter() {
            match fetch.body() {
                Some(raw) => batch.push(parse_fetched(raw)),
                None => warn!(
                    sequence = fetch.message,
                    "Fetch response carried no body, skipping"
                ),
            }
        }

        // Server order is oldest-first within the range.
        batch.reverse();
        Ok(batch)
    }
}

impl Drop for ImapSource {
    fn drop(&mut self) {
        if let Err(e) = self.session.logout() {
            debug!(error = %e, "IMAP logout failed");
        }
    }
}

/// Parse a raw RFC 822 message into a [`FetchedMail`].
///
/// Never fails: an unparseable payload yields a message without an id,
/// which the publisher reports as a per-message failure.
pub fn parse_fetched(raw: &[u8]) -> FetchedMail {
    let parser = MessageParser::default();
    let Some(msg) = parser.parse(raw) else {
        warn!("Message could not be parsed as RFC 822");
        return FetchedMail {
            message: Message {
                message_id: None,
                subject: "Untitled".to_string(),
                sender: "Unknown".to_string(),
                date: Utc::now(),
                body_html: String::new(),
            },
            attachments: BTreeMap::new(),
        };
    };

    let message_id = msg
        .message_id()
        .map(|id| strip_angle_brackets(id).to_string());

    let subject = msg
        .subject()
        .map(str::to_string)
        .unwrap_or_else(|| "Untitled".to_string());

    let sender = msg
        .from()
        .and_then(|a| a.first())
        .and_then(|addr| {
            addr.name
                .as_deref()
                .or(addr.address.as_deref())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "Unknown".to_string());

    let date = msg
        .date()
        .and_then(|dt| DateTime::<Utc>::from_timestamp(dt.to_timestamp(), 0))
        .unwrap_or_else(Utc::now);

    let body_html = msg
        .body_html(0)
        .or_else(|| msg.body_text(0))
        .map(|s| s.into_owned())
        .unwrap_or_default();

    let mut attachments = BTreeMap::new();
    for part in msg.attachments() {
        let Some(content_id) = part.content_id() else {
            debug!("Attachment has no Content-ID, not referenced from the body");
            continue;
        };
        let content_id = strip_angle_brackets(content_id).to_string();

        let filename = part
            .attachment_name()
            .map(String::from)
            .unwrap_or_else(|| format!("attachment_{}", attachments.len()));

        let content_type = part
            .content_type()
            .map(|ct| match ct.subtype() {
                Some(sub) => format!("{}/{sub}", ct.ctype()),
                None => ct.ctype().to_string(),
            })
            .unwrap_or_else(|| "application/octet-stream".to_string());

        attachments.insert(
            content_id.clone(),
            Attachment {
                content_id,
                filename,
                content_type,
                payload: part.contents().to_vec(),
            },
        );
    }

    FetchedMail {
        message: Message {
            message_id,
            subject,
            sender,
            date,
            body_html,
        },
        attachments,
    }
}

/// Strip a single pair of surrounding angle brackets (`<id>` → `id`).
fn strip_angle_brackets(s: &str) -> &str {
    s.strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW_WITH_INLINE_PNG: &str = "Message-ID: <msg001@example.com>\r\n\
From: Jane Poster <jane@example.com>\r\n\
Date: Sun, 01 Jan 2023 12:00:00 +0000\r\n\
Subject: My Post\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/related; boundary=\"XYZ\"\r\n\
\r\n\
--XYZ\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<p>Look: <img src=\"cid:1\"></p>\r\n\
--XYZ\r\n\
Content-Type: image/png; name=\"pic.png\"\r\n\
Content-Disposition: inline; filename=\"pic.png\"\r\n\
Content-ID: <1>\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
aGVsbG8=\r\n\
--XYZ--\r\n";

    #[test]
    fn test_parse_fetched_fields() {
        let fetched = parse_fetched(RAW_WITH_INLINE_PNG.as_bytes());
        let msg = &fetched.message;

        assert_eq!(msg.message_id.as_deref(), Some("msg001@example.com"));
        assert_eq!(msg.subject, "My Post");
        assert_eq!(msg.sender, "Jane Poster");
        assert_eq!(msg.date.format("%Y-%m-%d %H:%M:%S").to_string(), "2023-01-01 12:00:00");
        assert!(msg.body_html.contains("cid:1"));
    }

    #[test]
    fn test_parse_fetched_attachment_map() {
        let fetched = parse_fetched(RAW_WITH_INLINE_PNG.as_bytes());
        let att = fetched.attachments.get("1").expect("inline attachment keyed by cid");

        assert_eq!(att.filename, "pic.png");
        assert_eq!(att.content_type, "image/png");
        assert_eq!(att.payload, b"hello");
    }

    #[test]
    fn test_parse_fetched_missing_headers() {
        let raw = b"Subject: =?UTF-8?B?SGVsbG8=?=\r\n\r\nplain body\r\n";
        let fetched = parse_fetched(raw);

        assert_eq!(fetched.message.message_id, None);
        assert_eq!(fetched.message.subject, "Hello");
        assert_eq!(fetched.message.sender, "Unknown");
        assert_eq!(fetched.message.body_html.trim(), "plain body");
        assert!(fetched.attachments.is_empty());
    }

    #[test]
    fn test_strip_angle_brackets() {
        assert_eq!(strip_angle_brackets("<a@b>"), "a@b");
        assert_eq!(strip_angle_brackets("a@b"), "a@b");
        assert_eq!(strip_angle_brackets("<unclosed"), "<unclosed");
    }
}
