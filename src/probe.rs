use crate::error::ScanError;
use crate::services;
use crate::types::{PortResult, PortState};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time;

// EMFILE / ENFILE: the process or the whole system is out of file
// descriptors. Unlike a refused or filtered port this poisons every
// subsequent probe, so it aborts the scan.
const EMFILE: i32 = 24;
const ENFILE: i32 = 23;

/// Probe a single `target:port` with a bounded-duration TCP connect.
///
/// Returns `Ok(Some(..))` when the full handshake succeeds, `Ok(None)` for
/// every ordinary negative outcome (refused, timed out, unreachable, DNS
/// failure). The connection is dropped as soon as it is established; no
/// data is exchanged and the socket cannot leak because the stream never
/// escapes this function.
pub async fn probe(target: &str, port: u16, timeout: Duration) -> Result<Option<PortResult>, ScanError> {
    let addr = format!("{target}:{port}");
    match time::timeout(timeout, TcpStream::connect(&addr)).await {
        Ok(Ok(stream)) => {
            drop(stream);
            Ok(Some(PortResult {
                port,
                state: PortState::Open,
                service: services::service_name(port).to_string(),
            }))
        }
        Ok(Err(e)) if is_resource_exhaustion(&e) => {
            log::error!("probe {addr}: out of sockets: {e}");
            Err(ScanError::Resource(e))
        }
        Ok(Err(e)) => {
            log::trace!("probe {addr}: {e}");
            Ok(None)
        }
        Err(_elapsed) => {
            log::trace!("probe {addr}: timed out after {timeout:?}");
            Ok(None)
        }
    }
}

fn is_resource_exhaustion(e: &std::io::Error) -> bool {
    matches!(e.raw_os_error(), Some(EMFILE) | Some(ENFILE))
}
