//! Row Attribute Decoding
//!
//! After the row's `ip_from` come `column_count - 1` little-endian u32
//! columns in fixed order:
//!
//! | position | column    | encoding                                      |
//! |----------|-----------|-----------------------------------------------|
//! | 1        | country   | pointer to code slot (3 bytes) + name string   |
//! | 2        | region    | pointer to string                             |
//! | 3        | city      | pointer to string                             |
//! | 4        | latitude  | IEEE-754 f32 bits (schema 5 and up)            |
//! | 5        | longitude | IEEE-754 f32 bits (schema 5 and up)            |
//!
//! Pointers are 0-based file offsets of a length byte followed by Latin-1
//! text. Columns the file does not have are not read.

use crate::address::IpVersion;
use crate::cursor::{le_u32, ByteCursor};
use crate::error::Result;
use crate::header::DatabaseHeader;
use crate::locator::RowIndex;
use crate::record::GeoRecord;
use crate::translation::Translations;
use std::net::IpAddr;

const COUNTRY: usize = 1;
const REGION: usize = 2;
const CITY: usize = 3;
const LATITUDE: usize = 4;
const LONGITUDE: usize = 5;

/// Country name slot follows the code slot (length byte + 2 characters)
const COUNTRY_NAME_OFFSET: u64 = 3;

/// Codes reported as China with a fixed display name
pub const CHINESE_TERRITORIES: [&str; 4] = ["CN", "HK", "MO", "TW"];
/// Canonical code for [`CHINESE_TERRITORIES`]
pub const CHINA_CODE: &str = "CN";
/// Display name for [`CHINESE_TERRITORIES`]
pub const CHINA_NAME: &str = "中国";
/// Taiwan's raw country code
pub const TAIWAN_CODE: &str = "TW";
/// Region display name forced for Taiwan
pub const TAIWAN_REGION: &str = "台湾";
/// Hong Kong's raw country code
pub const HONG_KONG_CODE: &str = "HK";
/// City display name forced for Hong Kong (source data is street level)
pub const HONG_KONG_CITY: &str = "香港";

/// Materializes [`GeoRecord`]s from located rows
pub struct RecordDecoder<'a> {
    cursor: ByteCursor<'a>,
    header: &'a DatabaseHeader,
    translations: &'a Translations,
}

impl<'a> RecordDecoder<'a> {
    /// Create a decoder over a database image
    pub fn new(
        cursor: ByteCursor<'a>,
        header: &'a DatabaseHeader,
        translations: &'a Translations,
    ) -> Self {
        Self {
            cursor,
            header,
            translations,
        }
    }

    /// Decode row `row` of `version`'s table into a record for `ip`
    pub fn decode(&self, ip: IpAddr, row: RowIndex, version: IpVersion) -> Result<GeoRecord> {
        let columns = self.columns(row, version)?;
        let column = |position: usize| -> Option<u32> {
            (position * 4 <= columns.len()).then(|| le_u32(columns, (position - 1) * 4))
        };

        let (raw_code, raw_country) = match column(COUNTRY) {
            Some(pointer) => (
                self.read_string(pointer, 0)?,
                self.read_string(pointer, COUNTRY_NAME_OFFSET)?,
            ),
            None => (String::new(), String::new()),
        };
        let raw_region = column(REGION)
            .map(|pointer| self.read_string(pointer, 0))
            .transpose()?
            .unwrap_or_default();
        let raw_city = column(CITY)
            .map(|pointer| self.read_string(pointer, 0))
            .transpose()?
            .unwrap_or_default();

        let (country_code, country) = if CHINESE_TERRITORIES.contains(&raw_code.as_str()) {
            (CHINA_CODE.to_string(), CHINA_NAME.to_string())
        } else {
            let display = self.translations.country.lookup(&raw_country).to_string();
            (raw_code.clone(), display)
        };

        let region = if raw_code == TAIWAN_CODE {
            TAIWAN_REGION.to_string()
        } else {
            self.translations.region.lookup(&raw_region).to_string()
        };

        let city = if raw_code == HONG_KONG_CODE {
            HONG_KONG_CITY.to_string()
        } else {
            self.translations.city.lookup(&raw_city).to_string()
        };

        let (latitude, longitude) = if self.header.has_coordinates() {
            (
                column(LATITUDE).map(|bits| round_coordinate(f32::from_bits(bits))),
                column(LONGITUDE).map(|bits| round_coordinate(f32::from_bits(bits))),
            )
        } else {
            (None, None)
        };

        Ok(GeoRecord {
            ip,
            country_code,
            country,
            region,
            city,
            latitude,
            longitude,
        })
    }

    /// The row's attribute columns, `(column_count - 1) * 4` bytes
    fn columns(&self, row: RowIndex, version: IpVersion) -> Result<&'a [u8]> {
        let position = self.header.base_address(version) as u64
            + row as u64 * self.header.row_width(version)
            + version.address_len() as u64;
        let len = self.header.attribute_columns() as usize * 4;
        self.cursor.slice_at(position, len)
    }

    /// String at 0-based `pointer + skip`
    fn read_string(&self, pointer: u32, skip: u64) -> Result<String> {
        self.cursor.str_at(pointer as u64 + skip + 1)
    }
}

/// Round a stored coordinate to 6 fractional digits
///
/// The f32 is widened exactly to f64, formatted with 6 fractional digits
/// (correctly rounded from the exact binary value, ties to even) and parsed
/// back, so the result prints identically with `{:.6}`.
pub fn round_coordinate(raw: f32) -> f64 {
    let wide = raw as f64;
    format!("{:.6}", wide).parse().unwrap_or(wide)
}
