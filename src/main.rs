//! Telecommand binary entry point.

use std::io::Write;
use std::time::Duration;

use telecommand::config::Config;
use telecommand::{cli, format, logging, ConsoleTransport, Dispatcher, SystemHost, SystemVolumes};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::parse_args()?;
    if args.help {
        cli::print_help();
        return Ok(());
    }
    if args.version {
        cli::print_version();
        return Ok(());
    }

    let config = Config::load(&args)?;
    logging::init(config.log_filter());

    info!("telecommand v{}", env!("CARGO_PKG_VERSION"));
    append_startup_log();

    let host = SystemHost::new(&config.webcam.video_device, &config.webcam.audio_device);
    let mut dispatcher = Dispatcher::new(
        config.principal_id(),
        config.principal.password.clone(),
        host,
        SystemVolumes,
    );

    let transport = ConsoleTransport::new(config.principal_id());
    transport.announce_after(Duration::from_secs(3));
    transport.run(&mut dispatcher).await?;

    info!("telecommand stopped");
    Ok(())
}

/// Append a line to the local startup log. Best effort; a machine that
/// cannot write next to the binary still starts.
fn append_startup_log() {
    let line = format!("Agent started at {}\n", format::now_timestamp());
    let opened = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("startup_log.txt");
    match opened {
        Ok(mut file) => {
            if let Err(e) = file.write_all(line.as_bytes()) {
                warn!(error = %e, "could not write startup log");
            }
        }
        Err(e) => warn!(error = %e, "could not open startup log"),
    }
}
