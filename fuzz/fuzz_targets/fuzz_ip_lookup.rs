#![no_main]
use ip2geo::fixture::{FixtureBuilder, FixtureRow};
use libfuzzer_sys::fuzz_target;
use std::net::IpAddr;

fuzz_target!(|data: &[u8]| {
    let image = FixtureBuilder::new(5)
        .v4_rows(vec![
            FixtureRow::v4(0, "-", "-", "-", "-"),
            FixtureRow::v4(0x0102_0300, "AU", "Australia", "Queensland", "Brisbane"),
            FixtureRow::v4(0x0A00_0000, "-", "-", "-", "-"),
            FixtureRow::v4(0xC0A8_0000, "TW", "Taiwan", "Taipei", "Taipei"),
        ])
        .v6_rows(vec![
            FixtureRow::v6(0, "-", "-", "-", "-"),
            FixtureRow::v6(0x2001_0db8 << 96, "HK", "Hong Kong", "Hong Kong", "Central"),
        ])
        .build();

    let Ok(db) = ip2geo::Database::from_bytes_builder(image)
        .map_embedded_ipv4(true)
        .open()
    else {
        return;
    };

    // Raw bytes exercise the packed forms, text the parser
    let _ = db.search(data);
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = db.search(s);
        if let Ok(ip) = s.parse::<IpAddr>() {
            let _ = db.search_ip(ip);
        }
    }
});
