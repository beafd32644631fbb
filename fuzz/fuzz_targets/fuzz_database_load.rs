#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Garbage images must be rejected or searched without panicking
    if let Ok(db) = ip2geo::Database::from_bytes(data.to_vec()) {
        let _ = db.search("8.8.8.8");
        let _ = db.search("2001:4860:4860::8888");
        let _ = db.search(u32::MAX);
    }
});
