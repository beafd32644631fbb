use anyhow::Result;
use ip2geo::IpVersion;
use serde_json::json;
use std::path::PathBuf;

use crate::cli_utils::open_database;

pub fn cmd_inspect(database: PathBuf, json_output: bool) -> Result<()> {
    let db = open_database(&database, None, false)?;
    let header = db.header();

    if json_output {
        let output = json!({
            "file": database.display().to_string(),
            "size": db.size(),
            "header": header,
            "build_date": header.build_date.to_string(),
            "has_coordinates": header.has_coordinates(),
            "indexed": {
                "ipv4": header.v4_index_addr != 0,
                "ipv6": header.v6_index_addr != 0,
            },
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Database:   {}", database.display());
    println!("Size:       {} bytes", db.size());
    println!("Schema:     DB{}", header.db_type);
    println!("Columns:    {}", header.column_count);
    println!("Built:      {}", header.build_date);
    println!(
        "Coordinates: {}",
        if header.has_coordinates() { "yes" } else { "no" }
    );
    println!();

    for version in [IpVersion::V4, IpVersion::V6] {
        let index = header.index_address(version);
        println!("{}:", version);
        println!("  Rows:       {}", header.ip_count(version));
        println!("  Table:      {}", header.base_address(version));
        println!("  Row width:  {} bytes", header.row_width(version));
        if index == 0 {
            println!("  Index:      none");
        } else {
            println!("  Index:      {}", index);
        }
    }

    Ok(())
}
