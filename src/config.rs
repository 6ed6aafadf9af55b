//! Application configuration.
//!
//! All settings come from `M2B_*` environment variables, read once at startup:
//!
//! | Variable              | Default     |
//! |-----------------------|-------------|
//! | `M2B_IMAP_HOST`       | `localhost` |
//! | `M2B_IMAP_PORT`       | `993`       |
//! | `M2B_MAILBOX_USER`    | *required*  |
//! | `M2B_MAILBOX_PASS`    | *required*  |
//! | `M2B_MAILBOX_FOLDER`  | `Blog`      |
//! | `M2B_BLOG_ASSETS_DIR` | `assets`    |
//! | `M2B_BLOG_POST_DIR`   | `.`         |

use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Mailbox connection settings.
    pub mailbox: MailboxConfig,
    /// Post and asset output settings.
    pub publish: PublishConfig,
}

/// Mailbox connection settings.
#[derive(Debug, Clone)]
pub struct MailboxConfig {
    /// IMAP server hostname.
    pub host: String,
    /// IMAP server port (implicit TLS).
    pub port: u16,
    /// Login user.
    pub user: String,
    /// Login password.
    pub password: String,
    /// Mailbox folder that holds post candidates.
    pub folder: String,
}

/// Post and asset output settings.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Directory where rewritten image assets are written.
    pub assets_dir: PathBuf,
    /// Directory where post files are written. A leading `~` is expanded.
    pub post_dir: PathBuf,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 993,
            user: String::new(),
            password: String::new(),
            folder: "Blog".to_string(),
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("assets"),
            post_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Credentials are the only required settings; everything else falls back
    /// to the documented defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = MailboxConfig::default();

        let user = require_env("M2B_MAILBOX_USER")?;
        let password = require_env("M2B_MAILBOX_PASS")?;

        let port = match std::env::var("M2B_IMAP_PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| anyhow::anyhow!("M2B_IMAP_PORT is not a valid port: '{raw}'"))?,
            Err(_) => defaults.port,
        };

        Ok(Self {
            mailbox: MailboxConfig {
                host: env_or("M2B_IMAP_HOST", &defaults.host),
                port,
                user,
                password,
                folder: env_or("M2B_MAILBOX_FOLDER", &defaults.folder),
            },
            publish: PublishConfig {
                assets_dir: PathBuf::from(env_or("M2B_BLOG_ASSETS_DIR", "assets")),
                post_dir: PathBuf::from(env_or("M2B_BLOG_POST_DIR", ".")),
            },
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn require_env(key: &str) -> anyhow::Result<String> {
    std::env::var(key).map_err(|_| anyhow::anyhow!("required environment variable {key} is not set"))
}
