//! Vigil CLI: run a monitored session from the terminal.
//!
//! Usage:
//!   cargo run -p vigil-session -- --run [--duration 60] [--block-shortcuts]
//!
//! Starts the voice, clipboard, and peripheral channels (camera capture needs
//! an embedder providing a frame source), polls the aggregate status once a
//! second, and prints the final snapshot as JSON on exit or kickout.

use std::thread;
use std::time::Duration;
use tracing::{info, warn};
use vigil_core::MonitorConfig;
use vigil_session::{DirectoryInventory, SessionMonitor};

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let mut run = false;
    let mut duration_secs: u64 = 60;
    let mut block_shortcuts = false;
    let mut config_stem: Option<String> = None;

    while let Some(a) = args.next() {
        match a.as_str() {
            "--run" => run = true,
            "--duration" => {
                if let Some(d) = args.next() {
                    duration_secs = d.parse().unwrap_or(60);
                }
            }
            "--config" => {
                config_stem = args.next();
            }
            "--block-shortcuts" => block_shortcuts = true,
            _ => {}
        }
    }

    if !run {
        eprintln!("Vigil — exam-session integrity monitor");
        eprintln!("  --run                Start monitoring (default 60s, or --duration N)");
        eprintln!("  --duration N         Session length in seconds (default 60)");
        eprintln!("  --config NAME        Config file stem (default \"vigil\", reads vigil.toml)");
        eprintln!("  --block-shortcuts    Suppress Ctrl+C/V/X/A, Alt+Tab, Alt+F4");
        eprintln!();
        eprintln!("VIGIL_* environment variables override any config field,");
        eprintln!("e.g. VIGIL_SESSION__KICKOUT_THRESHOLD=500.");
        return Ok(());
    }

    let config = match config_stem {
        Some(stem) => MonitorConfig::load_from(&stem)?,
        None => MonitorConfig::load()?,
    };
    info!("starting session for {}s", duration_secs);

    let mut monitor = SessionMonitor::new(config);

    // A channel whose device is missing degrades that channel, not the session.
    if let Err(e) = monitor.start_voice() {
        warn!("voice channel disabled: {e}");
    }
    if let Err(e) = monitor.start_clipboard() {
        warn!("clipboard channel disabled: {e}");
    }
    if let Err(e) = monitor.start_peripheral(DirectoryInventory::default()) {
        warn!("peripheral channel disabled: {e}");
    }
    if block_shortcuts {
        monitor.enable_shortcut_block()?;
    }

    let mut elapsed = 0u64;
    while elapsed < duration_secs {
        thread::sleep(Duration::from_secs(1));
        elapsed += 1;

        let snap = monitor.compute_status();
        info!(
            aggregate = snap.aggregate,
            status = %snap.aggregate_status,
            "session status"
        );
        if snap.kickout {
            warn!("aggregate risk crossed the kickout threshold, ending session");
            break;
        }
    }

    monitor.shutdown();
    let final_snapshot = monitor.compute_status();
    println!("{}", serde_json::to_string_pretty(&final_snapshot)?);
    info!(
        aggregate = final_snapshot.aggregate,
        kickout = final_snapshot.kickout,
        "session ended"
    );
    Ok(())
}
