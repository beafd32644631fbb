use assert_cmd::Command;
use ip2geo::fixture::{FixtureBuilder, FixtureRow};
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to create an ip2geo command
fn ip2geo_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("ip2geo"))
}

/// Write a small DB5 database into `dir`
fn create_test_db(dir: &TempDir) -> PathBuf {
    let image = FixtureBuilder::new(5)
        .build_date(2025, 1, 15)
        .v4_rows(vec![
            FixtureRow::v4(0, "-", "-", "-", "-"),
            FixtureRow::v4(0x0808_0800, "US", "United States", "California", "Mountain View")
                .with_coordinates(37.40599, -122.078514),
            FixtureRow::v4(0x0808_0900, "-", "-", "-", "-"),
            FixtureRow::v4(0x7000_0000, "HK", "Hong Kong", "Hong Kong", "Central"),
            FixtureRow::v4(0x7001_0000, "-", "-", "-", "-"),
        ])
        .v6_rows(vec![FixtureRow::v6(0, "-", "-", "-", "-")])
        .v6_end(1 << 127)
        .build();
    let path = dir.path().join("test.bin");
    fs::write(&path, image).unwrap();
    path
}

#[test]
fn test_help() {
    ip2geo_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("IP2Location BIN databases"));
}

#[test]
fn test_version() {
    ip2geo_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ip2geo"));
}

#[test]
fn test_query_help() {
    ip2geo_cmd()
        .arg("query")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Look up one or more addresses"));
}

#[test]
fn test_query_requires_address() {
    let dir = TempDir::new().unwrap();
    let db = create_test_db(&dir);
    ip2geo_cmd().arg("query").arg(&db).assert().failure();
}

#[test]
fn test_query_found() {
    let dir = TempDir::new().unwrap();
    let db = create_test_db(&dir);

    ip2geo_cmd()
        .arg("query")
        .arg(&db)
        .arg("8.8.8.8")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""country_code": "US""#))
        .stdout(predicate::str::contains(r#""city": "Mountain View""#))
        .stdout(predicate::str::contains(r#""latitude": 37.405991"#));
}

#[test]
fn test_query_override() {
    let dir = TempDir::new().unwrap();
    let db = create_test_db(&dir);

    ip2geo_cmd()
        .arg("query")
        .arg(&db)
        .arg("112.0.0.1")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""country": "中国""#))
        .stdout(predicate::str::contains(r#""city": "香港""#));
}

#[test]
fn test_query_not_found_exit_code() {
    let dir = TempDir::new().unwrap();
    let db = create_test_db(&dir);

    // Past the final IPv6 end
    ip2geo_cmd()
        .arg("query")
        .arg(&db)
        .arg("ffff::1")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("null"));
}

#[test]
fn test_query_invalid_address() {
    let dir = TempDir::new().unwrap();
    let db = create_test_db(&dir);

    ip2geo_cmd()
        .arg("query")
        .arg(&db)
        .arg("not-an-ip")
        .arg("8.8.8.8")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid address: not-an-ip"))
        .stdout(predicate::str::contains("Mountain View"));
}

#[test]
fn test_query_quiet() {
    let dir = TempDir::new().unwrap();
    let db = create_test_db(&dir);

    ip2geo_cmd()
        .arg("query")
        .arg(&db)
        .arg("8.8.8.8")
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    ip2geo_cmd()
        .arg("query")
        .arg(&db)
        .arg("ffff::1")
        .arg("--quiet")
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_query_stdin() {
    let dir = TempDir::new().unwrap();
    let db = create_test_db(&dir);

    ip2geo_cmd()
        .arg("query")
        .arg(&db)
        .arg("-")
        .write_stdin("8.8.8.8\n\n8.8.8.200\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""ip": "8.8.8.8""#))
        .stdout(predicate::str::contains(r#""ip": "8.8.8.200""#));
}

#[test]
fn test_query_translations_dir() {
    let dir = TempDir::new().unwrap();
    let db = create_test_db(&dir);
    let i18n = dir.path().join("i18n");
    fs::create_dir(&i18n).unwrap();
    fs::write(i18n.join("country.json"), r#"{"United States": "美国"}"#).unwrap();

    ip2geo_cmd()
        .arg("query")
        .arg(&db)
        .arg("8.8.8.8")
        .arg("--translations")
        .arg(&i18n)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""country": "美国""#));
}

#[test]
fn test_query_embedded_ipv4() {
    let dir = TempDir::new().unwrap();
    let db = create_test_db(&dir);

    ip2geo_cmd()
        .arg("query")
        .arg(&db)
        .arg("::ffff:8.8.8.8")
        .arg("--embedded-ipv4")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""country_code": "US""#));
}

#[test]
fn test_query_missing_database() {
    ip2geo_cmd()
        .arg("query")
        .arg("/nonexistent/db.bin")
        .arg("8.8.8.8")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load database"));
}

#[test]
fn test_inspect_text() {
    let dir = TempDir::new().unwrap();
    let db = create_test_db(&dir);

    ip2geo_cmd()
        .arg("inspect")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("Schema:     DB5"))
        .stdout(predicate::str::contains("Built:      2025-01-15"))
        .stdout(predicate::str::contains("IPv4:"))
        .stdout(predicate::str::contains("IPv6:"));
}

#[test]
fn test_inspect_json() {
    let dir = TempDir::new().unwrap();
    let db = create_test_db(&dir);

    let output = ip2geo_cmd()
        .arg("inspect")
        .arg(&db)
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["header"]["db_type"], 5);
    assert_eq!(json["header"]["v4_count"], 5);
    assert_eq!(json["build_date"], "2025-01-15");
    assert_eq!(json["has_coordinates"], true);
    assert_eq!(json["indexed"]["ipv4"], true);
}

#[test]
fn test_debug_logging_goes_to_stderr() {
    let dir = TempDir::new().unwrap();
    let db = create_test_db(&dir);

    ip2geo_cmd()
        .arg("--debug")
        .arg("inspect")
        .arg(&db)
        .assert()
        .success()
        .stderr(predicate::str::contains("opened database"));
}
