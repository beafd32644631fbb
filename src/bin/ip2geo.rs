mod cli_utils;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

use commands::{cmd_inspect, cmd_query};

#[derive(Parser)]
#[command(name = "ip2geo")]
#[command(
    about = "Look up IP addresses in IP2Location BIN databases",
    long_about = "ip2geo - IP geolocation lookups against IP2Location BIN databases\n\n\
    Resolves IPv4 and IPv6 addresses to country, region, city and coordinates.\n\
    Databases are memory-mapped and searched through their coarse index.\n\n\
    Examples:\n\
      ip2geo query IP2LOCATION-LITE-DB5.IPV6.BIN 8.8.8.8 2001:4860:4860::8888\n\
      cat addresses.txt | ip2geo query IP2LOCATION-LITE-DB5.IPV6.BIN -\n\
      ip2geo query db.bin 1.1.1.1 --translations ./i18n\n\
      ip2geo inspect IP2LOCATION-LITE-DB5.IPV6.BIN --json"
)]
#[command(version)]
struct Cli {
    /// Print debug logging to stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up one or more addresses
    Query {
        /// Path to the BIN database
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// Addresses to look up, or "-" to read one per line from stdin
        #[arg(value_name = "ADDRESS", required = true)]
        addresses: Vec<String>,

        /// Directory holding country.json, region.json and city.json
        #[arg(short, long, value_name = "DIR")]
        translations: Option<PathBuf>,

        /// Search IPv4-mapped, 6to4 and Teredo addresses in the IPv4 table
        #[arg(long)]
        embedded_ipv4: bool,

        /// Quiet mode - no output, only exit code (0 = all found, 1 = otherwise)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show database header information
    Inspect {
        /// Path to the BIN database
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// Output header as JSON
        #[arg(short, long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.debug {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Query {
            database,
            addresses,
            translations,
            embedded_ipv4,
            quiet,
        } => cmd_query(database, addresses, translations, embedded_ipv4, quiet),
        Commands::Inspect { database, json } => cmd_inspect(database, json),
    }
}
