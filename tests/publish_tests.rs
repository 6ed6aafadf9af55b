//! Integration tests for the publishing pipeline: batch processing,
//! idempotent delivery and failure isolation.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;

use chrono::{TimeZone, Utc};
use image::{DynamicImage, ImageFormat};

use mail2blog::config::PublishConfig;
use mail2blog::error::Result;
use mail2blog::ledger::{DeliveryLedger, LEDGER_FILENAME};
use mail2blog::model::attachment::Attachment;
use mail2blog::model::message::Message;
use mail2blog::publish::publish_batch;
use mail2blog::source::{FetchedMail, MailSource};

// NOTE: concurrent invocations racing on the ledger file and on post
// filenames are deliberately not covered here. The design assumes a
// scheduler that never overlaps runs.

struct StubSource {
    batch: Vec<FetchedMail>,
}

impl MailSource for StubSource {
    fn fetch_batch(&mut self, limit: usize) -> Result<Vec<FetchedMail>> {
        Ok(self.batch.iter().take(limit).cloned().collect())
    }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 40, 255]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode fixture PNG");
    out.into_inner()
}

fn fetched_with_image(id: &str, subject: &str, payload: Vec<u8>) -> FetchedMail {
    let mut attachments = BTreeMap::new();
    attachments.insert(
        "1".to_string(),
        Attachment {
            content_id: "1".to_string(),
            filename: "pic.png".to_string(),
            content_type: "image/png".to_string(),
            payload,
        },
    );
    FetchedMail {
        message: Message {
            message_id: Some(id.to_string()),
            subject: subject.to_string(),
            sender: "Jane".to_string(),
            date: Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap(),
            body_html: "<p>Hello</p><img src=\"cid:1\">".to_string(),
        },
        attachments,
    }
}

fn config(root: &Path) -> PublishConfig {
    PublishConfig {
        assets_dir: root.join("assets"),
        post_dir: root.join("posts"),
    }
}

// ─── Test 1: End-to-end single message with an oversized image ──────

#[test]
fn test_end_to_end_message_with_wide_image() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    let mut ledger = DeliveryLedger::load(dir.path().join(LEDGER_FILENAME)).unwrap();
    let mut source = StubSource {
        batch: vec![fetched_with_image("msg-1", "My Post", png_bytes(800, 400))],
    };

    let summary = publish_batch(&mut source, &mut ledger, &cfg, 10).unwrap();
    assert_eq!(summary.published, 1);
    assert_eq!(summary.failed, 0);

    // Post file: front matter plus rewritten asset link.
    let post_path = cfg.post_dir.join("2023-01-01-my-post.md");
    let post = std::fs::read_to_string(&post_path).unwrap();
    assert!(post.starts_with("---\nlayout: post\ntitle: \"My Post\"\nauthor: \"Jane\"\n"));
    assert!(post.contains("date: 2023-01-01 12:00:00"));
    assert!(post.contains("{{ site.baseurl }}/assets/1.pic.png.jpeg"));
    assert!(!post.contains("cid:1"));

    // Asset: transcoded down to 600px wide, aspect ratio kept.
    let asset = std::fs::read(cfg.assets_dir.join("1.pic.png.jpeg")).unwrap();
    let img = image::load_from_memory(&asset).unwrap();
    assert_eq!((img.width(), img.height()), (600, 300));

    // Ledger: the message id maps to the post path.
    assert!(ledger.is_delivered("msg-1"));
}

// ─── Test 2: A second run publishes nothing new ─────────────────────

#[test]
fn test_second_run_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    let mut ledger = DeliveryLedger::load(dir.path().join(LEDGER_FILENAME)).unwrap();
    let batch = vec![fetched_with_image("msg-1", "My Post", png_bytes(640, 480))];

    let mut source = StubSource { batch: batch.clone() };
    publish_batch(&mut source, &mut ledger, &cfg, 10).unwrap();

    let asset_path = cfg.assets_dir.join("1.pic.png.jpeg");
    let post_path = cfg.post_dir.join("2023-01-01-my-post.md");
    let asset_mtime = std::fs::metadata(&asset_path).unwrap().modified().unwrap();
    let post_mtime = std::fs::metadata(&post_path).unwrap().modified().unwrap();

    // Same batch again, fresh ledger object loaded from the same store.
    let mut ledger = DeliveryLedger::load(dir.path().join(LEDGER_FILENAME)).unwrap();
    let mut source = StubSource { batch };
    let summary = publish_batch(&mut source, &mut ledger, &cfg, 10).unwrap();

    assert_eq!(summary.published, 0);
    assert_eq!(summary.skipped, 1);
    assert_eq!(
        std::fs::metadata(&asset_path).unwrap().modified().unwrap(),
        asset_mtime,
        "skipped message must not rewrite assets"
    );
    assert_eq!(
        std::fs::metadata(&post_path).unwrap().modified().unwrap(),
        post_mtime,
        "skipped message must not rewrite the post"
    );
}

// ─── Test 3: A corrupt message in the middle does not block the batch ─

#[test]
fn test_corrupt_middle_message_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    let mut ledger = DeliveryLedger::load(dir.path().join(LEDGER_FILENAME)).unwrap();

    let mut source = StubSource {
        batch: vec![
            fetched_with_image("msg-1", "First", png_bytes(100, 100)),
            fetched_with_image("msg-2", "Second", b"corrupt payload".to_vec()),
            fetched_with_image("msg-3", "Third", png_bytes(100, 100)),
        ],
    };

    let summary = publish_batch(&mut source, &mut ledger, &cfg, 10).unwrap();

    assert_eq!(summary.published, 2);
    assert_eq!(summary.failed, 1);

    assert!(cfg.post_dir.join("2023-01-01-first.md").exists());
    assert!(cfg.post_dir.join("2023-01-01-third.md").exists());
    assert!(!cfg.post_dir.join("2023-01-01-second.md").exists());

    // The failed message stays out of the ledger and is retried next run.
    assert!(ledger.is_delivered("msg-1"));
    assert!(!ledger.is_delivered("msg-2"));
    assert!(ledger.is_delivered("msg-3"));
}

// ─── Test 4: Ledger state survives across separate runs ─────────────

#[test]
fn test_ledger_persists_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    let ledger_path = dir.path().join(LEDGER_FILENAME);

    {
        let mut ledger = DeliveryLedger::load(&ledger_path).unwrap();
        let mut source = StubSource {
            batch: vec![fetched_with_image("msg-1", "My Post", png_bytes(100, 100))],
        };
        publish_batch(&mut source, &mut ledger, &cfg, 10).unwrap();
    }

    let raw = std::fs::read_to_string(&ledger_path).unwrap();
    let parsed: BTreeMap<String, String> = serde_json::from_str(&raw).unwrap();
    let recorded = parsed.get("msg-1").expect("msg-1 recorded");
    assert!(recorded.ends_with("2023-01-01-my-post.md"));
}
