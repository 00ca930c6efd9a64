use thiserror::Error;

/// Errors that can abort a scan before or during execution.
///
/// Per-port connect failures (refused, timed out, unreachable, DNS) are not
/// errors: they are absorbed as "no result" and the scan continues. Only an
/// invalid configuration or running out of system resources surfaces here.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("invalid port range: {0}")]
    InvalidPortRange(String),

    #[error("invalid concurrency: {0}")]
    InvalidConcurrency(String),

    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),

    /// Socket or file-descriptor exhaustion. Fatal to the whole scan,
    /// unlike an ordinary closed-port outcome.
    #[error("system resource exhausted: {0}")]
    Resource(#[source] std::io::Error),

    #[error("worker task failed: {0}")]
    Worker(String),
}
