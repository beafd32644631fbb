//! Synthetic BIN images for tests, benchmarks and fuzzing.
//!
//! Produces files in the same layout the reader consumes: header, optional
//! coarse index tables, IPv4 and IPv6 row tables (each followed by a
//! sentinel row holding the final exclusive end), then a deduplicated
//! string area. Not a general-purpose database writer.
//!
//! ```rust
//! use ip2geo::fixture::{FixtureBuilder, FixtureRow};
//! use ip2geo::Database;
//!
//! let image = FixtureBuilder::new(5)
//!     .v4_rows(vec![
//!         FixtureRow::v4(0, "-", "-", "-", "-"),
//!         FixtureRow::v4(0x0808_0000, "US", "United States", "California", "Mountain View")
//!             .with_coordinates(37.40599, -122.078514),
//!         FixtureRow::v4(0x0809_0000, "-", "-", "-", "-"),
//!     ])
//!     .build();
//!
//! let db = Database::from_bytes(image)?;
//! let record = db.search("8.8.8.8")?.unwrap();
//! assert_eq!(record.country_code, "US");
//! # Ok::<(), ip2geo::GeoError>(())
//! ```

use crate::address::IpVersion;
use crate::header::{BuildDate, DatabaseHeader, RawHeader, HEADER_LEN, INDEX_BUCKETS};
use std::collections::HashMap;
use zerocopy::IntoBytes;

/// One range row: `[start, next row's start)`
#[derive(Debug, Clone)]
pub struct FixtureRow {
    /// First address of the range
    pub start: u128,
    /// Two-letter country code (`-` for unassigned)
    pub country_code: String,
    /// Raw country name
    pub country_name: String,
    /// Raw region name
    pub region: String,
    /// Raw city name
    pub city: String,
    /// Stored latitude (schema 5 and up)
    pub latitude: f32,
    /// Stored longitude (schema 5 and up)
    pub longitude: f32,
}

impl FixtureRow {
    /// IPv4 row starting at `start`
    pub fn v4(start: u32, country_code: &str, country_name: &str, region: &str, city: &str) -> Self {
        Self::v6(start as u128, country_code, country_name, region, city)
    }

    /// IPv6 row starting at `start`
    pub fn v6(start: u128, country_code: &str, country_name: &str, region: &str, city: &str) -> Self {
        FixtureRow {
            start,
            country_code: country_code.to_string(),
            country_name: country_name.to_string(),
            region: region.to_string(),
            city: city.to_string(),
            latitude: 0.0,
            longitude: 0.0,
        }
    }

    /// Set the stored coordinates
    pub fn with_coordinates(mut self, latitude: f32, longitude: f32) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }
}

/// Builder for synthetic database images
#[derive(Debug, Clone)]
pub struct FixtureBuilder {
    db_type: u8,
    column_count: u8,
    build_date: BuildDate,
    with_index: bool,
    v4_rows: Vec<FixtureRow>,
    v4_end: u32,
    v6_rows: Vec<FixtureRow>,
    v6_end: u128,
}

impl FixtureBuilder {
    /// Start an image of the given schema type
    ///
    /// Column count follows the schema: DB1 has country only, DB2-DB4 add
    /// region and city, DB5 and up add latitude and longitude.
    pub fn new(db_type: u8) -> Self {
        let column_count = match db_type {
            0 | 1 => 2,
            2..=4 => 4,
            _ => 6,
        };
        FixtureBuilder {
            db_type,
            column_count,
            build_date: BuildDate {
                year: 2024,
                month: 1,
                day: 1,
            },
            with_index: true,
            v4_rows: Vec::new(),
            v4_end: u32::MAX,
            v6_rows: Vec::new(),
            v6_end: u128::MAX,
        }
    }

    /// Override the column count (including `ip_from`)
    pub fn column_count(mut self, column_count: u8) -> Self {
        self.column_count = column_count;
        self
    }

    /// Set the header build date
    pub fn build_date(mut self, year: u16, month: u8, day: u8) -> Self {
        self.build_date = BuildDate { year, month, day };
        self
    }

    /// Write coarse index tables (default) or leave both addresses zero
    pub fn with_index(mut self, with_index: bool) -> Self {
        self.with_index = with_index;
        self
    }

    /// IPv4 rows, sorted by start
    pub fn v4_rows(mut self, rows: Vec<FixtureRow>) -> Self {
        self.v4_rows = rows;
        self
    }

    /// Exclusive end of the last IPv4 row (default `u32::MAX`)
    pub fn v4_end(mut self, end: u32) -> Self {
        self.v4_end = end;
        self
    }

    /// IPv6 rows, sorted by start
    pub fn v6_rows(mut self, rows: Vec<FixtureRow>) -> Self {
        self.v6_rows = rows;
        self
    }

    /// Exclusive end of the last IPv6 row (default `u128::MAX`)
    pub fn v6_end(mut self, end: u128) -> Self {
        self.v6_end = end;
        self
    }

    /// Serialize the image
    pub fn build(&self) -> Vec<u8> {
        let index_len = if self.with_index {
            INDEX_BUCKETS * crate::header::INDEX_ENTRY_LEN
        } else {
            0
        };
        let header_end = HEADER_LEN as u64;

        let mut header = DatabaseHeader {
            db_type: self.db_type,
            column_count: self.column_count,
            build_date: self.build_date,
            v4_count: self.v4_rows.len() as u32,
            v4_addr: 0,
            v6_count: self.v6_rows.len() as u32,
            v6_addr: 0,
            v4_index_addr: 0,
            v6_index_addr: 0,
        };
        if self.with_index {
            header.v4_index_addr = (header_end + 1) as u32;
            header.v6_index_addr = (header_end + index_len + 1) as u32;
        }
        header.v4_addr = (header_end + 2 * index_len + 1) as u32;
        let v4_table_len = table_len(&header, IpVersion::V4, self.v4_rows.len());
        header.v6_addr = header.v4_addr + v4_table_len as u32;
        let v6_table_len = table_len(&header, IpVersion::V6, self.v6_rows.len());
        let strings_base = header.v6_addr as u64 - 1 + v6_table_len;

        let mut pool = StringPool::new(strings_base);
        let mut out = Vec::with_capacity(strings_base as usize);
        out.extend_from_slice(RawHeader::from(&header).as_bytes());

        if self.with_index {
            write_index(&mut out, &self.v4_rows, self.v4_end as u128, IpVersion::V4);
            write_index(&mut out, &self.v6_rows, self.v6_end, IpVersion::V6);
        }

        self.write_table(&mut out, &mut pool, &self.v4_rows, self.v4_end as u128, IpVersion::V4);
        self.write_table(&mut out, &mut pool, &self.v6_rows, self.v6_end, IpVersion::V6);
        debug_assert_eq!(out.len() as u64, strings_base);

        out.extend_from_slice(&pool.bytes);
        out
    }

    fn write_table(
        &self,
        out: &mut Vec<u8>,
        pool: &mut StringPool,
        rows: &[FixtureRow],
        end: u128,
        version: IpVersion,
    ) {
        if rows.is_empty() {
            return;
        }
        let attributes = self.column_count.saturating_sub(1) as usize;

        for row in rows {
            write_address(out, row.start, version);

            let mut columns = vec![0u32; attributes];
            if attributes >= 1 {
                columns[0] = pool.country(&row.country_code, &row.country_name);
            }
            if attributes >= 2 {
                columns[1] = pool.string(&row.region);
            }
            if attributes >= 3 {
                columns[2] = pool.string(&row.city);
            }
            if attributes >= 5 {
                columns[3] = row.latitude.to_bits();
                columns[4] = row.longitude.to_bits();
            }
            for column in columns {
                out.extend_from_slice(&column.to_le_bytes());
            }
        }

        // Sentinel row: only its ip_from is ever read.
        write_address(out, end, version);
        out.extend(std::iter::repeat(0u8).take(attributes * 4));
    }
}

fn table_len(header: &DatabaseHeader, version: IpVersion, rows: usize) -> u64 {
    if rows == 0 {
        0
    } else {
        (rows as u64 + 1) * header.row_width(version)
    }
}

fn write_address(out: &mut Vec<u8>, value: u128, version: IpVersion) {
    match version {
        IpVersion::V4 => out.extend_from_slice(&(value as u32).to_le_bytes()),
        IpVersion::V6 => {
            for limb in 0..4 {
                out.extend_from_slice(&((value >> (32 * limb)) as u32).to_le_bytes());
            }
        }
    }
}

/// One `(low, high)` entry per top-16-bit bucket
fn write_index(out: &mut Vec<u8>, rows: &[FixtureRow], end: u128, version: IpVersion) {
    let starts: Vec<u128> = rows.iter().map(|r| r.start).collect();
    let ends: Vec<u128> = starts.iter().skip(1).copied().chain(Some(end)).collect();
    let shift = version.index_shift();
    let span: u128 = (1u128 << shift) - 1;

    for bucket in 0..INDEX_BUCKETS as u128 {
        let first = bucket << shift;
        let last = first | span;
        // First row ending after the bucket starts, last row starting inside it.
        let low = ends.partition_point(|&e| e <= first);
        let above = starts.partition_point(|&s| s <= last);

        let (low, high) = if above == 0 || low >= starts.len() {
            (1u32, 0u32)
        } else {
            (low as u32, (above - 1) as u32)
        };
        out.extend_from_slice(&low.to_le_bytes());
        out.extend_from_slice(&high.to_le_bytes());
    }
}

/// Deduplicated length-prefixed Latin-1 strings
struct StringPool {
    base: u64,
    bytes: Vec<u8>,
    seen: HashMap<(String, String), u32>,
}

impl StringPool {
    fn new(base: u64) -> Self {
        StringPool {
            base,
            bytes: Vec::new(),
            seen: HashMap::new(),
        }
    }

    /// 0-based offset of a plain string
    fn string(&mut self, value: &str) -> u32 {
        let key = (String::new(), value.to_string());
        if let Some(&offset) = self.seen.get(&key) {
            return offset;
        }
        let offset = self.offset();
        push_latin1(&mut self.bytes, value);
        self.seen.insert(key, offset);
        offset
    }

    /// 0-based offset of a country code slot (3 bytes) followed by the name
    fn country(&mut self, code: &str, name: &str) -> u32 {
        let key = (code.to_string(), name.to_string());
        if let Some(&offset) = self.seen.get(&key) {
            return offset;
        }
        let offset = self.offset();
        let code: Vec<u8> = code.chars().take(2).map(latin1_byte).collect();
        self.bytes.push(code.len() as u8);
        self.bytes.extend_from_slice(&code);
        self.bytes.extend(std::iter::repeat(0u8).take(2 - code.len()));
        push_latin1(&mut self.bytes, name);
        self.seen.insert(key, offset);
        offset
    }

    fn offset(&self) -> u32 {
        (self.base + self.bytes.len() as u64) as u32
    }
}

fn latin1_byte(c: char) -> u8 {
    u8::try_from(c as u32).unwrap_or(b'?')
}

fn push_latin1(out: &mut Vec<u8>, value: &str) {
    let bytes: Vec<u8> = value.chars().take(255).map(latin1_byte).collect();
    out.push(bytes.len() as u8);
    out.extend_from_slice(&bytes);
}
