use anyhow::{Context, Result};
use ip2geo::Database;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

/// Open a database, loading translations from `translations` when given
pub fn open_database(
    database: &Path,
    translations: Option<PathBuf>,
    embedded_ipv4: bool,
) -> Result<Database> {
    let mut opener = Database::from(database).map_embedded_ipv4(embedded_ipv4);
    if let Some(dir) = translations {
        opener = opener.translations_dir(dir);
    }
    opener
        .open()
        .with_context(|| format!("Failed to load database: {}", database.display()))
}

/// Replace `-` with the non-empty, trimmed lines of `reader`
///
/// Lines starting with `#` are skipped. `reader` is only consumed once, by
/// the first `-`.
pub fn expand_addresses<R: BufRead>(args: Vec<String>, reader: R) -> Result<Vec<String>> {
    if !args.iter().any(|a| a == "-") {
        return Ok(args);
    }

    let mut from_reader = Vec::new();
    for line in reader.lines() {
        let line = line.context("Failed to read addresses from stdin")?;
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            from_reader.push(trimmed.to_string());
        }
    }

    let mut from_reader = Some(from_reader);
    let mut expanded = Vec::with_capacity(args.len());
    for arg in args {
        if arg == "-" {
            if let Some(lines) = from_reader.take() {
                expanded.extend(lines);
            }
        } else {
            expanded.push(arg);
        }
    }
    Ok(expanded)
}

/// Addresses from the command line, reading stdin for `-`
pub fn read_addresses(args: Vec<String>) -> Result<Vec<String>> {
    expand_addresses(args, io::stdin().lock())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_without_marker() {
        let args = vec!["1.1.1.1".to_string(), "::1".to_string()];
        let out = expand_addresses(args.clone(), "ignored\n".as_bytes()).unwrap();
        assert_eq!(out, args);
    }

    #[test]
    fn test_expand_marker_once() {
        let args = vec!["8.8.8.8".to_string(), "-".to_string(), "-".to_string()];
        let input = "1.1.1.1\n\n  9.9.9.9  \n# comment\n";
        let out = expand_addresses(args, input.as_bytes()).unwrap();
        assert_eq!(out, vec!["8.8.8.8", "1.1.1.1", "9.9.9.9"]);
    }
}
