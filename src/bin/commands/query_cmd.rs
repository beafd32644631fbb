use anyhow::Result;
use ip2geo::GeoError;
use serde_json::{json, Value};
use std::path::PathBuf;

use crate::cli_utils::{open_database, read_addresses};

pub fn cmd_query(
    database: PathBuf,
    addresses: Vec<String>,
    translations: Option<PathBuf>,
    embedded_ipv4: bool,
    quiet: bool,
) -> Result<()> {
    let db = open_database(&database, translations, embedded_ipv4)?;
    let addresses = read_addresses(addresses)?;

    let mut all_found = !addresses.is_empty();
    let mut results = Vec::with_capacity(addresses.len());

    for (address, result) in addresses.iter().zip(db.search_many(&addresses)) {
        match result {
            Ok(Some(record)) => results.push(serde_json::to_value(&record)?),
            Ok(None) => {
                all_found = false;
                results.push(Value::Null);
            }
            Err(GeoError::InvalidAddress(_)) => {
                all_found = false;
                if !quiet {
                    eprintln!("Invalid address: {}", address);
                }
                results.push(Value::Null);
            }
            Err(e) => {
                return Err(anyhow::Error::new(e).context(format!("Query failed for: {}", address)))
            }
        }
    }

    if !quiet {
        // Always an array, one entry per address, null when not found
        println!("{}", serde_json::to_string_pretty(&json!(results))?);
    }

    std::process::exit(if all_found { 0 } else { 1 });
}
