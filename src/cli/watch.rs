use super::{report, ui};
use crate::App;
use crate::core::ledger::{LedgerEvent, parse_buyback_line};
use anyhow::{Context, Result};
use console::Term;
use std::io::Read;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

pub async fn run(app: &App, cancel: &CancellationToken) -> Result<()> {
    watch_loop(app, BufReader::new(spawn_stdin_reader()), cancel, true).await
}

/// Pumps stdin into an in-memory pipe from a plain OS thread.
///
/// A read on `tokio::io::stdin` cannot be cancelled and would keep the runtime
/// from shutting down after Ctrl-C. A detached thread dies with the process.
fn spawn_stdin_reader() -> DuplexStream {
    let (reader, mut writer) = tokio::io::duplex(4096);
    let handle = Handle::current();

    std::thread::spawn(move || {
        let mut buf = [0u8; 1024];
        let mut stdin = std::io::stdin().lock();
        loop {
            match stdin.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if handle.block_on(writer.write_all(&buf[..n])).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read stdin: {e}");
                    break;
                }
            }
        }
    });

    reader
}

/// Redraws the report, then waits for a `<price> <appraisal-id>` line.
///
/// Ends on end of input, when reading input fails or when `cancel` fires.
/// Report, parse and ledger write failures are printed and the loop keeps
/// going.
pub async fn watch_loop<R>(
    app: &App,
    mut input: R,
    cancel: &CancellationToken,
    clear_screen: bool,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        if clear_screen {
            Term::stdout().clear_screen()?;
        }

        match report::build_report(app, cancel).await {
            Ok(report) => println!("{}", report.display_as_table()),
            Err(e) if cancel.is_cancelled() => {
                debug!("Report interrupted: {e:#}");
                break;
            }
            Err(e) => {
                error!("Failed to build report: {e:?}");
                println!("{}", ui::style_text(&format!("{e:#}"), ui::StyleType::Error));
            }
        }

        println!(
            "\n{}",
            ui::style_text("Enter '<price> <appraisal-id>' (Ctrl-C to quit):", ui::StyleType::Subtle)
        );

        let mut raw = Vec::new();
        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            read = input.read_until(b'\n', &mut raw) => read?,
        };
        if read == 0 {
            debug!("End of input, leaving watch loop");
            break;
        }

        // Invalid UTF-8 becomes replacement characters and fails to parse
        let line = String::from_utf8_lossy(&raw);
        let recorded = match parse_buyback_line(&line) {
            Ok(Some(event)) => app
                .ledger
                .append(LedgerEvent::Buyback(event))
                .await
                .context("Failed to record buyback"),
            Ok(None) => {
                debug!("Ignoring input line {:?}", line.trim_end());
                Ok(())
            }
            Err(e) => Err(e),
        };
        if let Err(e) = recorded {
            warn!("{e:#}");
            println!("{}", ui::style_text(&format!("{e:#}"), ui::StyleType::Error));
        }
    }

    Ok(())
}
