//! Console transport.
//!
//! Stands in for a chat network connection: each stdin line is one
//! message from the principal, and outbound payloads are printed to
//! stdout. Media and document payloads are printed as references to
//! the file on disk. An `!upload <path>` line simulates sending the
//! agent a file attachment.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::format::now_timestamp;
use crate::fs::VolumeProvider;
use crate::platform::HostActions;
use crate::protocol::{Control, Dispatcher, Inbound, Outbound};
use crate::session::ChatId;

pub struct ConsoleTransport {
    principal: ChatId,
}

impl ConsoleTransport {
    pub fn new(principal: ChatId) -> Self {
        Self { principal }
    }

    /// Announce startup on the console after a short delay, once the
    /// rest of the process has settled.
    pub fn announce_after(&self, delay: Duration) {
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            println!("Agent started at {}. Type /help for commands.", now_timestamp());
        });
    }

    /// Read stdin line by line and feed the dispatcher until EOF, a
    /// Ctrl-C, or a `/stopbot`.
    pub async fn run<H, V>(&self, dispatcher: &mut Dispatcher<H, V>) -> std::io::Result<()>
    where
        H: HostActions,
        V: VolumeProvider,
    {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupt received");
                    break;
                }
            };
            let Some(line) = line else {
                info!("input closed");
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let inbound = match self.parse_line(&line) {
                Ok(inbound) => inbound,
                Err(e) => {
                    warn!(error = %e, "cannot read upload file");
                    println!("Cannot read that file: {}", e);
                    continue;
                }
            };

            let result = dispatcher.dispatch(inbound);
            for reply in &result.replies {
                println!("{}", render_outbound(reply));
            }
            if result.control == Control::Shutdown {
                break;
            }
        }

        Ok(())
    }

    fn parse_line(&self, line: &str) -> std::io::Result<Inbound> {
        let trimmed = line.trim();
        if let Some(path) = trimmed.strip_prefix("!upload ") {
            let path = path.trim();
            let data = std::fs::read(path)?;
            let file_name = std::path::Path::new(path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string());
            return Ok(Inbound::document(self.principal, file_name, data));
        }
        Ok(Inbound::text(self.principal, trimmed))
    }
}

fn render_outbound(reply: &Outbound) -> String {
    match reply {
        Outbound::Text(text) => text.clone(),
        Outbound::Photo { path, caption } => {
            format!("[photo] {} - {}", path.display(), caption)
        }
        Outbound::Video { path, caption } => {
            format!("[video] {} - {}", path.display(), caption)
        }
        Outbound::Document {
            path,
            file_name,
            caption,
        } => format!("[file] {} at {} - {}", file_name, path.display(), caption),
    }
}
