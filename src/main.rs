//! # beepex CLI
//!
//! Command-line interface for the beepex library.

use std::process;
use std::time::Instant;

use tracing_subscriber::EnvFilter;

use beepex::BeepexError;
use beepex::config::resolve_token;
use beepex::export::{Exporter, is_archive};
use beepex::progress::stderr_progress;
use beepex::source::BeeperClient;

fn main() {
    if let Err(e) = run() {
        eprintln!("❌ Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "beepex=debug" } else { "beepex=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<(), BeepexError> {
    let total_start = Instant::now();
    let (args, rules) = beepex::cli::parse();
    init_logging(args.verbose);

    // Print header
    println!("📦 beepex v{}", env!("CARGO_PKG_VERSION"));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("🌐 Host:    {}", args.host);
    println!("💾 Output:  {}", args.output_dir.display());
    if let Some(ref remap) = args.remap {
        println!("🏷️  Remap:   {}", remap.display());
    }
    for rule in &rules {
        println!("🔍 Filter:  {}", rule);
    }
    if args.no_thumbnails {
        println!("🖼️  Thumbnails disabled");
    }
    println!();

    if args.output_dir.is_dir() && !is_archive(&args.output_dir) {
        let non_empty = std::fs::read_dir(&args.output_dir)?.next().is_some();
        if non_empty {
            println!("⚠️  Output directory is not empty, existing files may be overwritten");
        }
    }

    // Configuration errors surface before any request is made
    let exporter = Exporter::new(args.export_config(rules))?.with_progress(stderr_progress());
    if !exporter.names().is_empty() {
        println!("   Loaded {} chat name overrides", exporter.names().len());
    }
    let token = resolve_token(args.token.as_deref(), args.env_file.as_deref())?;

    println!("🔌 Connecting to Beeper Desktop...");
    let client = BeeperClient::connect(args.client_config(token))?;
    if let Some(version) = client.version() {
        println!("   Beeper Desktop {}", version);
    }

    println!("⏳ Exporting chats...");
    let summary = exporter.run(&client)?;

    let total_time = total_start.elapsed();

    println!();
    println!(
        "✅ Done! Archive saved to {}",
        summary.output_dir.join("index.html").display()
    );

    // Summary
    println!();
    println!("📊 Summary:");
    println!("   Accounts:  {}", summary.accounts);
    println!(
        "   Chats:     {} of {} exported",
        summary.chats_exported, summary.chats_seen
    );
    println!("   Messages:  {}", summary.messages);
    println!(
        "   Media:     {} written, {} reused, {} thumbnails",
        summary.media.written, summary.media.reused, summary.media.thumbnails
    );
    if summary.media.failed > 0 {
        println!(
            "   Skipped:   {} attachments (see warnings above)",
            summary.media.failed
        );
    }

    // Performance stats
    println!();
    println!("⚡ Performance:");
    println!("   Total time:  {:.2}s", total_time.as_secs_f64());

    Ok(())
}
