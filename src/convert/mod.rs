//! Mail body conversion: HTML to Markdown, inline attachments to site assets.
//!
//! The body is translated structurally (headings, emphasis, links and images
//! map one-to-one). Every inline attachment is written to the assets
//! directory under a Content-ID-prefixed name, convertible images are
//! transcoded to JPEG, and each `cid:` token in the Markdown is rewritten to
//! a site-relative link.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::error::{Mail2BlogError, Result};
use crate::model::attachment::Attachment;

pub mod transcode;

use self::transcode::{transcode_to_jpeg, MAX_ASSET_WIDTH};

/// Base-URL placeholder emitted into rewritten asset links.
///
/// Left for the site generator to expand at build time.
pub const SITE_BASE_URL: &str = "{{ site.baseurl }}";

/// Extension appended to transcoded image assets.
const JPEG_EXT: &str = "jpeg";

/// How an attachment is treated by the conversion step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    /// An image that is resized and re-encoded as JPEG.
    ConvertibleImage,
    /// An image passed through untouched (animated GIFs would not survive
    /// a JPEG re-encode).
    OpaqueImage,
    /// Any non-image payload, passed through untouched.
    Opaque,
}

/// Classify an attachment by its MIME content type.
pub fn classify(content_type: &str) -> AttachmentKind {
    let ct = content_type.to_ascii_lowercase();
    if ct == "image/gif" {
        AttachmentKind::OpaqueImage
    } else if ct.starts_with("image/") {
        AttachmentKind::ConvertibleImage
    } else {
        AttachmentKind::Opaque
    }
}

/// Convert an HTML body into post-ready Markdown, materializing every
/// inline attachment under `assets_dir`.
///
/// A decode failure on any image attachment aborts the whole conversion;
/// assets already written stay on disk (the message is retried on the next
/// run and every write overwrites).
pub fn convert(
    body_html: &str,
    attachments: &BTreeMap<String, Attachment>,
    assets_dir: &Path,
) -> Result<String> {
    let mut content = html2md::parse_html(body_html);

    if attachments.is_empty() {
        return Ok(content);
    }

    std::fs::create_dir_all(assets_dir).map_err(|e| Mail2BlogError::io(assets_dir, e))?;

    let assets_base = assets_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    for (cid, att) in attachments {
        // Prefix the Content-ID to dodge filename collisions across messages.
        let mut asset_name = format!("{cid}.{}", att.filename);
        let kind = classify(&att.content_type);

        // Transcoded images get a distinct on-disk name: the referenced
        // asset is no longer the original payload.
        if kind == AttachmentKind::ConvertibleImage {
            asset_name.push('.');
            asset_name.push_str(JPEG_EXT);
        }

        let dest = assets_dir.join(&asset_name);
        std::fs::write(&dest, &att.payload).map_err(|e| Mail2BlogError::io(&dest, e))?;

        if kind == AttachmentKind::ConvertibleImage {
            let jpeg = transcode_to_jpeg(&att.payload, MAX_ASSET_WIDTH)?;
            std::fs::write(&dest, jpeg).map_err(|e| Mail2BlogError::io(&dest, e))?;
        }

        debug!(path = %dest.display(), content_type = %att.content_type, "Asset written");

        let link = format!("{SITE_BASE_URL}/{assets_base}/{asset_name}");
        content = content.replace(&format!("cid:{cid}"), &link);
    }

    Ok(content)
}
