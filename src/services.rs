use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Fallback label for ports with no table entry.
pub const UNKNOWN_SERVICE: &str = "unknown";

/// Well-known TCP port to service name mapping.
///
/// Deliberately an open map rather than a closed enum so new entries are a
/// one-line addition.
static SERVICES: Lazy<HashMap<u16, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (20, "FTP-DATA"),
        (21, "FTP"),
        (22, "SSH"),
        (23, "TELNET"),
        (25, "SMTP"),
        (53, "DNS"),
        (80, "HTTP"),
        (110, "POP3"),
        (143, "IMAP"),
        (443, "HTTPS"),
        (445, "SMB"),
        (993, "IMAPS"),
        (995, "POP3S"),
        (3306, "MySQL"),
        (3389, "RDP"),
        (5432, "PostgreSQL"),
        (6379, "Redis"),
        (8080, "HTTP-ALT"),
        (8443, "HTTPS-ALT"),
        (27017, "MongoDB"),
    ])
});

/// Look up the well-known service name for a port, if the table has one.
pub fn lookup(port: u16) -> Option<&'static str> {
    SERVICES.get(&port).copied()
}

/// Service name for a port, falling back to [`UNKNOWN_SERVICE`].
pub fn service_name(port: u16) -> &'static str {
    lookup(port).unwrap_or(UNKNOWN_SERVICE)
}
