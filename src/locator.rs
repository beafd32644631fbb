//! Range Row Search
//!
//! Finds the row whose `[ip_from, next ip_from)` range contains an address.
//! Search runs in two stages:
//!
//! 1. The coarse index maps the top 16 bits of the address to a `(low, high)`
//!    row range. A zero index address means the file has no index and the
//!    whole table is searched.
//! 2. A closed-interval binary search over that range reads each probed
//!    row's start and the following row's start (its exclusive end).
//!
//! ```text
//! IPv4 row (column_count * 4 bytes)
//! ┌──────────┬──────────┬──────────┬─────┐
//! │ ip_from  │ country* │ region*  │ ... │  ← next row's ip_from is this row's end
//! └──────────┴──────────┴──────────┴─────┘
//!
//! IPv6 row (column_count * 4 + 12 bytes)
//! ┌──────────────────────┬──────────┬─────┐
//! │ ip_from (4 LE limbs) │ country* │ ... │
//! └──────────────────────┴──────────┴─────┘
//! ```

use crate::address::{IpNumber, IpVersion};
use crate::cursor::{le_u128_limbs, le_u32, ByteCursor};
use crate::error::Result;
use crate::header::{DatabaseHeader, INDEX_ENTRY_LEN};
use tracing::trace;

/// Zero-based row number within one protocol's row table
pub type RowIndex = u32;

/// Row search over one database image
pub struct RangeLocator<'a> {
    cursor: ByteCursor<'a>,
    header: &'a DatabaseHeader,
}

impl<'a> RangeLocator<'a> {
    /// Create a locator over a database image and its parsed header
    pub fn new(cursor: ByteCursor<'a>, header: &'a DatabaseHeader) -> Self {
        Self { cursor, header }
    }

    /// Find the row containing `number`
    ///
    /// Returns `Ok(None)` when the address falls outside every row.
    pub fn locate(&self, number: IpNumber) -> Result<Option<RowIndex>> {
        self.locate_with_probe(number, |_| {})
    }

    /// Find the row containing `number`, reporting every row probed
    pub fn locate_with_probe<F>(&self, number: IpNumber, mut probe: F) -> Result<Option<RowIndex>>
    where
        F: FnMut(RowIndex),
    {
        let version = number.version;
        let count = self.header.ip_count(version);
        if count == 0 {
            return Ok(None);
        }
        let last = count - 1;

        let (mut low, high) = self.search_bounds(number)?;
        let mut high = high.min(last);

        while low <= high {
            let mid = ((low as u64 + high as u64) / 2) as RowIndex;
            probe(mid);

            let (ip_start, ip_end) = self.row_range(version, mid)?;
            trace!(%version, low, high, mid, ip_start, ip_end, "probe row");

            if ip_start <= number.value && number.value < ip_end {
                return Ok(Some(mid));
            }

            if number.value < ip_start {
                if mid == 0 {
                    break;
                }
                high = mid - 1;
            } else {
                low = mid + 1;
            }
        }

        Ok(None)
    }

    /// Initial `(low, high)` row bounds from the coarse index
    ///
    /// Without an index the whole table `(0, count - 1)` is returned. Index
    /// entries are returned as stored; `locate` clamps them.
    pub fn search_bounds(&self, number: IpNumber) -> Result<(RowIndex, RowIndex)> {
        let index = self.header.index_address(number.version) as u64;
        if index == 0 {
            let count = self.header.ip_count(number.version);
            return Ok((0, count.saturating_sub(1)));
        }

        let position = index + number.bucket() * INDEX_ENTRY_LEN;
        self.cursor.u32_pair_at(position)
    }

    /// `(ip_start, ip_end)` of a row, `ip_end` exclusive
    pub fn row_range(&self, version: IpVersion, row: RowIndex) -> Result<(u128, u128)> {
        match version {
            IpVersion::V4 => self.read_row32(row),
            IpVersion::V6 => self.read_row128(row),
        }
    }

    /// 1-based position of a row
    pub fn row_position(&self, version: IpVersion, row: RowIndex) -> u64 {
        self.header.base_address(version) as u64 + row as u64 * self.header.row_width(version)
    }

    /// IPv4 row: start is the leading u32, end the u32 just past the row
    fn read_row32(&self, row: RowIndex) -> Result<(u128, u128)> {
        let len = self.header.row_width(IpVersion::V4) as usize + 4;
        let window = self
            .cursor
            .slice_at(self.row_position(IpVersion::V4, row), len)?;

        Ok((le_u32(window, 0) as u128, le_u32(window, len - 4) as u128))
    }

    /// IPv6 row: start is the leading 16 bytes, end the 16 bytes past the row
    fn read_row128(&self, row: RowIndex) -> Result<(u128, u128)> {
        let len = self.header.row_width(IpVersion::V6) as usize + 16;
        let window = self
            .cursor
            .slice_at(self.row_position(IpVersion::V6, row), len)?;

        Ok((le_u128_limbs(window, 0), le_u128_limbs(window, len - 16)))
    }
}
