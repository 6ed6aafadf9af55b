//! CLI entry point for `mail2blog`.

use clap::Parser;

use mail2blog::config::Config;
use mail2blog::ledger::{DeliveryLedger, LEDGER_FILENAME};
use mail2blog::publish::{publish_batch, RunSummary};
use mail2blog::source::imap::ImapSource;
use mail2blog::source::DEFAULT_BATCH_LIMIT;

#[derive(Parser)]
#[command(name = "mail2blog", version)]
#[command(about = "Publish new mailbox messages as blog posts")]
struct Cli {
    /// Maximum number of messages to fetch this run
    #[arg(short, long, default_value_t = DEFAULT_BATCH_LIMIT)]
    limit: usize,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level);

    let config = Config::from_env()?;

    let mut ledger = DeliveryLedger::load(LEDGER_FILENAME)?;
    let mut source = ImapSource::connect(&config.mailbox)?;

    let summary = publish_batch(&mut source, &mut ledger, &config.publish, cli.limit)?;

    if summary == RunSummary::default() {
        println!("No new messages found.");
        return Ok(());
    }

    println!();
    println!("  {:<12} {}", "Published", summary.published);
    println!("  {:<12} {}", "Skipped", summary.skipped);
    println!("  {:<12} {}", "Failed", summary.failed);
    println!();

    Ok(())
}

/// Set up tracing with stderr output.
fn setup_logging(level: &str) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();
}
