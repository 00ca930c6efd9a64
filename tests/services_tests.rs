use port_scan_rs::services::{lookup, service_name, UNKNOWN_SERVICE};

#[test]
fn well_known_ports_have_exact_names() {
    assert_eq!(service_name(22), "SSH");
    assert_eq!(service_name(80), "HTTP");
    assert_eq!(service_name(443), "HTTPS");
    assert_eq!(service_name(21), "FTP");
    assert_eq!(service_name(3306), "MySQL");
}

#[test]
fn absent_ports_report_unknown() {
    assert_eq!(lookup(4), None);
    assert_eq!(service_name(4), UNKNOWN_SERVICE);
    assert_eq!(service_name(60000), UNKNOWN_SERVICE);
}
