//! ip2geo - IP2Location BIN Database Reader
//!
//! Looks up IPv4 and IPv6 addresses in IP2Location BIN files and returns
//! country, region, city and (for DB5 and richer schemas) coordinates,
//! with localized display names from optional translation tables.
//!
//! # Quick Start
//!
//! ```rust
//! use ip2geo::Database;
//! use ip2geo::fixture::{FixtureBuilder, FixtureRow};
//!
//! # let image = FixtureBuilder::new(5)
//! #     .v4_rows(vec![
//! #         FixtureRow::v4(0, "-", "-", "-", "-"),
//! #         FixtureRow::v4(0x0808_0800, "US", "United States", "California", "Mountain View")
//! #             .with_coordinates(37.40599, -122.078514),
//! #         FixtureRow::v4(0x0808_0900, "-", "-", "-", "-"),
//! #     ])
//! #     .build();
//! # let tmp_path = std::env::temp_dir().join("ip2geo_doctest_db5.bin");
//! # std::fs::write(&tmp_path, image)?;
//! # let db = Database::open(&tmp_path)?;
//! # let _ = std::fs::remove_file(&tmp_path);
//! # /*
//! let db = Database::open("IP2LOCATION-LITE-DB5.IPV6.BIN")?;
//! # */
//!
//! if let Some(record) = db.search("8.8.8.8")? {
//!     assert_eq!(record.country_code, "US");
//!     println!("{} / {} / {}", record.country, record.region, record.city);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # File Layout
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │  32-byte header                      │
//! │  IPv4 / IPv6 coarse index (optional) │
//! │  IPv4 row table                      │
//! │  IPv6 row table                      │
//! │  String pool                         │
//! └──────────────────────────────────────┘
//!          ↓ mmap()
//! ┌──────────────────────────────────────┐
//! │  index bucket → row bounds           │
//! │  binary search → row                 │
//! │  decode columns → GeoRecord          │
//! └──────────────────────────────────────┘
//! ```
//!
//! A [`Database`] is read-only once opened and can be shared between
//! threads by reference or `Arc`.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Address normalization and input conversion
pub mod address;
/// Bounds-checked reads over the database image
pub mod cursor;
/// Database handle
pub mod database;
/// Row attribute decoding
pub mod decoder;
/// Error types
pub mod error;
/// Synthetic database images for tests and benchmarks
#[doc(hidden)]
pub mod fixture;
/// File header
pub mod header;
/// Row search
pub mod locator;
/// Lookup results
pub mod record;
/// Translation tables
pub mod translation;

pub use crate::address::{IpNumber, IpVersion, ToIpAddr};
pub use crate::database::{Database, DatabaseOpener};
pub use crate::error::{GeoError, Result};
pub use crate::header::{BuildDate, DatabaseHeader};
pub use crate::record::GeoRecord;
pub use crate::translation::{TranslationTable, Translations};

/// Library version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
