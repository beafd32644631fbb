//! BIN Database Header
//!
//! The first 32 bytes of an IP2Location BIN file describe everything the
//! reader needs: schema type, column count, build date, and per-protocol
//! row counts and table addresses.
//!
//! ```text
//! offset  size  field
//! ------  ----  -----------------------------
//!      0     1  schema type (DB1 .. DB26)
//!      1     1  column count (includes ip_from)
//!      2     3  build year (since 2000), month, day
//!      5     4  IPv4 row count
//!      9     4  IPv4 row table address
//!     13     4  IPv6 row count
//!     17     4  IPv6 row table address
//!     21     4  IPv4 index table address (0 = none)
//!     25     4  IPv6 index table address (0 = none)
//!     29     3  reserved
//! ```
//!
//! All multi-byte integers are little-endian; all addresses are 1-based file
//! positions.

use crate::address::IpVersion;
use crate::error::{GeoError, Result};
use serde::Serialize;
use std::fmt;
use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Size of the fixed header prefix
pub const HEADER_LEN: usize = 32;

/// Number of buckets in each coarse index table (top 16 address bits)
pub const INDEX_BUCKETS: u64 = 1 << 16;

/// Bytes per index bucket: `(low, high)` row bounds as two u32 values
pub const INDEX_ENTRY_LEN: u64 = 8;

/// Schema types at or above this value carry latitude/longitude columns
pub const COORDINATES_MIN_SCHEMA: u8 = 5;

/// On-disk header layout (32 bytes, byte-aligned)
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub(crate) struct RawHeader {
    pub db_type: u8,
    pub db_column: u8,
    pub year: u8,
    pub month: u8,
    pub day: u8,
    pub v4_count: U32,
    pub v4_addr: U32,
    pub v6_count: U32,
    pub v6_addr: U32,
    pub v4_index_addr: U32,
    pub v6_index_addr: U32,
    pub reserved: [u8; 3],
}

/// Build date recorded in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildDate {
    /// Full year (header stores years since 2000)
    pub year: u16,
    /// Month (1-12)
    pub month: u8,
    /// Day of month (1-31)
    pub day: u8,
}

impl fmt::Display for BuildDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Parsed database header
///
/// Immutable after load. Table addresses are 1-based file positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatabaseHeader {
    /// Schema type byte (selects which attribute columns exist)
    pub db_type: u8,
    /// Columns per row, including the leading `ip_from` column
    pub column_count: u8,
    /// Build date of the file
    pub build_date: BuildDate,
    /// Number of IPv4 rows
    pub v4_count: u32,
    /// Address of the IPv4 row table
    pub v4_addr: u32,
    /// Number of IPv6 rows
    pub v6_count: u32,
    /// Address of the IPv6 row table
    pub v6_addr: u32,
    /// Address of the IPv4 coarse index (0 = no index)
    pub v4_index_addr: u32,
    /// Address of the IPv6 coarse index (0 = no index)
    pub v6_index_addr: u32,
}

impl DatabaseHeader {
    /// Parse the 32-byte header prefix without checking it against the file
    ///
    /// Fails with [`GeoError::CorruptHeader`] if fewer than 32 bytes are
    /// available.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let (raw, _) = RawHeader::read_from_prefix(bytes).map_err(|_| {
            GeoError::CorruptHeader(format!(
                "file is {} bytes, header needs {}",
                bytes.len(),
                HEADER_LEN
            ))
        })?;

        Ok(DatabaseHeader {
            db_type: raw.db_type,
            column_count: raw.db_column,
            build_date: BuildDate {
                year: 2000 + raw.year as u16,
                month: raw.month,
                day: raw.day,
            },
            v4_count: raw.v4_count.get(),
            v4_addr: raw.v4_addr.get(),
            v6_count: raw.v6_count.get(),
            v6_addr: raw.v6_addr.get(),
            v4_index_addr: raw.v4_index_addr.get(),
            v6_index_addr: raw.v6_index_addr.get(),
        })
    }

    /// Parse the header and check every table it describes fits in the file
    pub fn from_file(bytes: &[u8]) -> Result<Self> {
        let header = Self::parse(bytes)?;
        header.validate(bytes.len())?;
        Ok(header)
    }

    /// Check header fields for consistency with a file of `file_len` bytes
    pub fn validate(&self, file_len: usize) -> Result<()> {
        if self.column_count < 2 {
            return Err(GeoError::CorruptHeader(format!(
                "column count {} leaves no attribute columns",
                self.column_count
            )));
        }

        let file_len = file_len as u64;
        for version in [IpVersion::V4, IpVersion::V6] {
            let count = self.ip_count(version) as u64;
            let base = self.base_address(version) as u64;

            if count > 0 {
                if base == 0 {
                    return Err(GeoError::CorruptHeader(format!(
                        "{} rows declared with no row table",
                        version
                    )));
                }
                // Last row plus the next row's ip_from, which bounds it.
                let table_end =
                    base - 1 + count * self.row_width(version) + version.address_len() as u64;
                if table_end > file_len {
                    return Err(GeoError::CorruptHeader(format!(
                        "{} row table ends at {} past file size {}",
                        version, table_end, file_len
                    )));
                }
            }

            let index = self.index_address(version) as u64;
            if index != 0 {
                let index_end = index - 1 + INDEX_BUCKETS * INDEX_ENTRY_LEN;
                if index_end > file_len {
                    return Err(GeoError::CorruptHeader(format!(
                        "{} index table ends at {} past file size {}",
                        version, index_end, file_len
                    )));
                }
            }
        }

        Ok(())
    }

    /// Row count for a protocol
    pub fn ip_count(&self, version: IpVersion) -> u32 {
        match version {
            IpVersion::V4 => self.v4_count,
            IpVersion::V6 => self.v6_count,
        }
    }

    /// Row table address for a protocol
    pub fn base_address(&self, version: IpVersion) -> u32 {
        match version {
            IpVersion::V4 => self.v4_addr,
            IpVersion::V6 => self.v6_addr,
        }
    }

    /// Coarse index table address for a protocol (0 = no index)
    pub fn index_address(&self, version: IpVersion) -> u32 {
        match version {
            IpVersion::V4 => self.v4_index_addr,
            IpVersion::V6 => self.v6_index_addr,
        }
    }

    /// Bytes per row: IPv6 rows widen `ip_from` from 4 to 16 bytes
    pub fn row_width(&self, version: IpVersion) -> u64 {
        let columns = self.column_count as u64 * 4;
        match version {
            IpVersion::V4 => columns,
            IpVersion::V6 => columns + 12,
        }
    }

    /// Number of string/float pointer columns following `ip_from`
    pub fn attribute_columns(&self) -> u8 {
        self.column_count.saturating_sub(1)
    }

    /// True if rows carry latitude/longitude
    pub fn has_coordinates(&self) -> bool {
        self.db_type >= COORDINATES_MIN_SCHEMA && self.attribute_columns() >= 5
    }
}

impl From<&DatabaseHeader> for RawHeader {
    fn from(header: &DatabaseHeader) -> Self {
        RawHeader {
            db_type: header.db_type,
            db_column: header.column_count,
            year: header.build_date.year.saturating_sub(2000) as u8,
            month: header.build_date.month,
            day: header.build_date.day,
            v4_count: U32::new(header.v4_count),
            v4_addr: U32::new(header.v4_addr),
            v6_count: U32::new(header.v6_count),
            v6_addr: U32::new(header.v6_addr),
            v4_index_addr: U32::new(header.v4_index_addr),
            v6_index_addr: U32::new(header.v6_index_addr),
            reserved: [0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bytes() -> Vec<u8> {
        let mut data = vec![0u8; HEADER_LEN];
        data[0] = 5; // DB5
        data[1] = 6; // ip_from + 5 attributes
        data[2] = 24;
        data[3] = 5;
        data[4] = 1;
        data[5..9].copy_from_slice(&3u32.to_le_bytes());
        data[9..13].copy_from_slice(&1000u32.to_le_bytes());
        data[13..17].copy_from_slice(&2u32.to_le_bytes());
        data[17..21].copy_from_slice(&2000u32.to_le_bytes());
        data[21..25].copy_from_slice(&33u32.to_le_bytes());
        data[25..29].copy_from_slice(&524_321u32.to_le_bytes());
        data
    }

    #[test]
    fn test_header_size() {
        assert_eq!(std::mem::size_of::<RawHeader>(), HEADER_LEN);
    }

    #[test]
    fn test_parse_fields() {
        let header = DatabaseHeader::parse(&sample_bytes()).unwrap();
        assert_eq!(header.db_type, 5);
        assert_eq!(header.column_count, 6);
        assert_eq!(header.build_date.to_string(), "2024-05-01");
        assert_eq!(header.v4_count, 3);
        assert_eq!(header.v4_addr, 1000);
        assert_eq!(header.v6_count, 2);
        assert_eq!(header.v6_addr, 2000);
        assert_eq!(header.v4_index_addr, 33);
        assert_eq!(header.v6_index_addr, 524_321);
        assert!(header.has_coordinates());
    }

    #[test]
    fn test_short_file() {
        let result = DatabaseHeader::parse(&[0u8; 31]);
        assert!(matches!(result, Err(GeoError::CorruptHeader(_))));
        assert!(matches!(DatabaseHeader::parse(&[]), Err(GeoError::CorruptHeader(_))));
    }

    #[test]
    fn test_row_widths() {
        let header = DatabaseHeader::parse(&sample_bytes()).unwrap();
        assert_eq!(header.row_width(IpVersion::V4), 24);
        assert_eq!(header.row_width(IpVersion::V6), 36);
        assert_eq!(header.attribute_columns(), 5);
    }

    #[test]
    fn test_validate_rejects_tables_past_eof() {
        let header = DatabaseHeader::parse(&sample_bytes()).unwrap();
        // Index tables alone need 512 KiB each.
        assert!(matches!(header.validate(4096), Err(GeoError::CorruptHeader(_))));
    }

    #[test]
    fn test_validate_without_index() {
        let mut header = DatabaseHeader::parse(&sample_bytes()).unwrap();
        header.v4_index_addr = 0;
        header.v6_index_addr = 0;
        // v6 table: 2000 - 1 + 2 * 36 + 16 = 2087
        assert!(header.validate(2087).is_ok());
        assert!(header.validate(2086).is_err());
    }

    #[test]
    fn test_validate_rejects_single_column() {
        let mut header = DatabaseHeader::parse(&sample_bytes()).unwrap();
        header.column_count = 1;
        assert!(matches!(header.validate(usize::MAX), Err(GeoError::CorruptHeader(_))));
    }

    #[test]
    fn test_validate_rejects_rows_without_table() {
        let mut header = DatabaseHeader::parse(&sample_bytes()).unwrap();
        header.v4_addr = 0;
        assert!(matches!(header.validate(usize::MAX), Err(GeoError::CorruptHeader(_))));
    }

    #[test]
    fn test_coordinates_need_schema_five() {
        let mut header = DatabaseHeader::parse(&sample_bytes()).unwrap();
        header.db_type = 3;
        assert!(!header.has_coordinates());
        header.db_type = 11;
        assert!(header.has_coordinates());
        header.column_count = 4;
        assert!(!header.has_coordinates());
    }

    #[test]
    fn test_raw_round_trip() {
        let bytes = sample_bytes();
        let header = DatabaseHeader::parse(&bytes).unwrap();
        let raw = RawHeader::from(&header);
        assert_eq!(raw.as_bytes(), &bytes[..]);
    }
}
