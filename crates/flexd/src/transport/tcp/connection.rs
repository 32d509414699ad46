//! Per-connection message loop.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::TcpStream;

use tracing::{debug, warn};

use super::super::TRANSPORT_TARGET;
use super::super::line;
use super::super::state::RunState;
use crate::dispatch::FlexService;

/// Serves newline-delimited tasks until the peer hangs up, or until the
/// receiver is stopping and no partial message is buffered.
///
/// A message that grows past `max_line` bytes without a newline closes the
/// connection.
pub(super) fn serve_connection(
    stream: TcpStream,
    service: &FlexService,
    state: &RunState,
    max_line: usize,
) {
    let peer = stream
        .peer_addr()
        .map_or_else(|_| "unknown".to_owned(), |addr| addr.to_string());
    let mut writer = match stream.try_clone() {
        Ok(writer) => writer,
        Err(error) => {
            warn!(target: TRANSPORT_TARGET, %peer, %error, "failed to clone connection");
            return;
        }
    };
    let mut reader = BufReader::new(stream);
    let mut message = Vec::new();

    loop {
        let remaining = u64::try_from(max_line.saturating_sub(message.len())).unwrap_or(u64::MAX);
        match reader.by_ref().take(remaining).read_until(b'\n', &mut message) {
            Ok(0) if remaining > 0 => break,
            Ok(_) if message.len() >= max_line && message.last() != Some(&b'\n') => {
                warn!(
                    target: TRANSPORT_TARGET,
                    %peer,
                    limit = max_line,
                    "task message exceeds size limit, closing connection"
                );
                break;
            }
            Ok(_) => {
                if let Err(error) = reply(&mut writer, service, &message) {
                    warn!(target: TRANSPORT_TARGET, %peer, %error, "failed to write reply");
                    break;
                }
                message.clear();
            }
            Err(error) if is_poll_timeout(&error) => {
                if message.is_empty() && state.is_stopping() {
                    debug!(target: TRANSPORT_TARGET, %peer, "closing idle connection");
                    break;
                }
            }
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => {
                warn!(target: TRANSPORT_TARGET, %peer, %error, "connection read failed");
                break;
            }
        }
    }
}

fn reply(writer: &mut TcpStream, service: &FlexService, message: &[u8]) -> io::Result<()> {
    if message.trim_ascii().is_empty() {
        return Ok(());
    }
    match line::answer(service, message) {
        Ok(mut reply) => {
            reply.push(b'\n');
            writer.write_all(&reply)?;
            writer.flush()
        }
        Err(error) => {
            warn!(target: TRANSPORT_TARGET, %error, "skipping malformed task message");
            Ok(())
        }
    }
}

fn is_poll_timeout(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
