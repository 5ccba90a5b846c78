//! Line-based TCP front end for the scheduler.
//!
//! Every line `<command>,<characterId>` is answered with exactly one line.
//! Lines starting with `.rndbot ` are operator console commands instead.

use crate::{logging, metrics};
use rndbot::SchedulerHandle;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

const CONSOLE_PREFIX: &str = ".rndbot ";

/// Longest accepted request line, newline excluded
const MAX_LINE_BYTES: usize = 4096;

/// Accept connections until the listener fails
///
/// # Arguments
///
/// * `listener` - Bound listener
/// * `handle` - Scheduler the requests are forwarded to
pub async fn serve(listener: TcpListener, handle: SchedulerHandle) -> std::io::Result<()> {
    let active = Arc::new(AtomicUsize::new(0));

    loop {
        let (stream, peer) = listener.accept().await?;
        let handle = handle.clone();
        let active = active.clone();

        tokio::spawn(async move {
            metrics::remote_connections_active(active.fetch_add(1, Ordering::Relaxed) + 1);
            let source = peer.to_string();
            if let Err(e) = serve_connection(stream, &source, &handle).await {
                tracing::debug!(peer = %source, "Remote connection closed: {}", e);
            }
            metrics::remote_connections_active(active.fetch_sub(1, Ordering::Relaxed) - 1);
        });
    }
}

async fn serve_connection(stream: TcpStream, source: &str, handle: &SchedulerHandle) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = (&mut reader)
            .take(MAX_LINE_BYTES as u64 + 1)
            .read_until(b'\n', &mut buf)
            .await?;
        if read == 0 {
            break;
        }
        if buf.last() != Some(&b'\n') && buf.len() > MAX_LINE_BYTES {
            writer.write_all(b"request too long\n").await?;
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("request line exceeds {MAX_LINE_BYTES} bytes"),
            ));
        }

        let line = String::from_utf8_lossy(&buf);
        let request = line.trim();
        if request.is_empty() {
            continue;
        }

        let reply = answer(request, handle).await;
        logging::log_command(source, request, &reply);

        writer.write_all(reply.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }
    Ok(())
}

/// Route one request line and flatten the outcome into a reply line
pub async fn answer(request: &str, handle: &SchedulerHandle) -> String {
    let (kind, result) = match request.strip_prefix(CONSOLE_PREFIX) {
        Some(command) => ("console", handle.console(command.trim()).await),
        None => ("remote", handle.remote(request).await),
    };
    metrics::commands_total(kind, result.is_ok());

    // replies are single-line by protocol
    match result {
        Ok(reply) | Err(reply) => reply.replace('\n', " "),
    }
}
