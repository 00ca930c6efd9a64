use crate::error::ScanError;
use std::time::Duration;

/// Default per-connection timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);
/// Default number of concurrent connect attempts.
pub const DEFAULT_CONCURRENCY: usize = 100;

/// Validated scan parameters. Immutable once a scan starts.
///
/// `concurrency` larger than the number of ports in range is fine; excess
/// workers just find the queue already drained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    pub target: String,
    pub start_port: u16,
    pub end_port: u16,
    pub timeout: Duration,
    pub concurrency: usize,
}

impl ScanConfig {
    /// Build a config for scanning `target` over `start_port..=end_port`
    /// inclusive, with default timeout and concurrency.
    pub fn new(target: impl Into<String>, start_port: u16, end_port: u16) -> Result<Self, ScanError> {
        let cfg = Self {
            target: target.into(),
            start_port,
            end_port,
            timeout: DEFAULT_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ScanError> {
        if timeout.is_zero() {
            return Err(ScanError::InvalidTimeout("timeout must be positive".into()));
        }
        self.timeout = timeout;
        Ok(self)
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Result<Self, ScanError> {
        if concurrency == 0 {
            return Err(ScanError::InvalidConcurrency(
                "concurrency must be at least 1".into(),
            ));
        }
        self.concurrency = concurrency;
        Ok(self)
    }

    /// Number of ports in the inclusive range.
    pub fn port_count(&self) -> usize {
        usize::from(self.end_port) - usize::from(self.start_port) + 1
    }

    /// Re-check the invariants. The scanner calls this again before any
    /// worker starts so a hand-built config still fails fast.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.target.trim().is_empty() {
            return Err(ScanError::InvalidTarget("target must not be empty".into()));
        }
        if self.start_port == 0 {
            return Err(ScanError::InvalidPortRange(
                "start port must be at least 1".into(),
            ));
        }
        if self.end_port < self.start_port {
            return Err(ScanError::InvalidPortRange(format!(
                "end port {} is below start port {}",
                self.end_port, self.start_port
            )));
        }
        if self.concurrency == 0 {
            return Err(ScanError::InvalidConcurrency(
                "concurrency must be at least 1".into(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(ScanError::InvalidTimeout("timeout must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_applied() {
        let cfg = ScanConfig::new("localhost", 1, 1024).unwrap();
        assert_eq!(cfg.timeout, DEFAULT_TIMEOUT);
        assert_eq!(cfg.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(cfg.port_count(), 1024);
    }

    #[test]
    fn empty_target_rejected() {
        assert!(matches!(
            ScanConfig::new("   ", 1, 100),
            Err(ScanError::InvalidTarget(_))
        ));
    }

    #[test]
    fn reversed_range_rejected() {
        assert!(matches!(
            ScanConfig::new("localhost", 500, 100),
            Err(ScanError::InvalidPortRange(_))
        ));
    }

    #[test]
    fn port_zero_rejected() {
        assert!(matches!(
            ScanConfig::new("localhost", 0, 100),
            Err(ScanError::InvalidPortRange(_))
        ));
    }

    #[test]
    fn zero_concurrency_rejected() {
        let err = ScanConfig::new("localhost", 1, 100)
            .unwrap()
            .with_concurrency(0);
        assert!(matches!(err, Err(ScanError::InvalidConcurrency(_))));
    }

    #[test]
    fn single_port_range_valid() {
        let cfg = ScanConfig::new("localhost", 80, 80).unwrap();
        assert_eq!(cfg.port_count(), 1);
    }
}
