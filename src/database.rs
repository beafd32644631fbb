//! Database Handle
//!
//! A [`Database`] owns one read-only database image (memory-mapped file or
//! owned bytes), its parsed header and the translation tables. Construct it
//! once and share it: every query only reads, so `&Database` (or
//! `Arc<Database>`) can be used from any number of threads.
//!
//! Closing requires `&mut Database`, so it cannot overlap a query that
//! holds a shared reference.

use crate::address::{IpNumber, IpVersion, ToIpAddr};
use crate::cursor::ByteCursor;
use crate::decoder::RecordDecoder;
use crate::error::{GeoError, Result};
use crate::header::{BuildDate, DatabaseHeader, HEADER_LEN};
use crate::locator::{RangeLocator, RowIndex};
use crate::record::GeoRecord;
use crate::translation::Translations;
use memmap2::Mmap;
use std::fs::File;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Storage for database data - either owned or memory-mapped
enum DatabaseStorage {
    Owned(Vec<u8>),
    Mmap(Mmap),
}

impl DatabaseStorage {
    fn as_slice(&self) -> &[u8] {
        match self {
            DatabaseStorage::Owned(v) => v.as_slice(),
            DatabaseStorage::Mmap(m) => &m[..],
        }
    }
}

/// Where translation tables come from
#[derive(Debug, Clone, Default)]
enum TranslationSource {
    #[default]
    Defaults,
    Tables(Translations),
    Dir(PathBuf),
}

#[derive(Debug, Default)]
struct DatabaseOptions {
    path: Option<PathBuf>,
    bytes: Option<Vec<u8>>,
    translations: TranslationSource,
    map_embedded_ipv4: bool,
}

/// Configures and opens a [`Database`]
///
/// # Examples
///
/// ```no_run
/// use ip2geo::Database;
///
/// let db = Database::from("data/IP2LOCATION-LITE-DB5.IPV6.BIN")
///     .translations_dir("data")
///     .map_embedded_ipv4(true)
///     .open()?;
/// # Ok::<(), ip2geo::GeoError>(())
/// ```
#[derive(Debug)]
pub struct DatabaseOpener {
    options: DatabaseOptions,
}

impl DatabaseOpener {
    fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            options: DatabaseOptions {
                path: Some(path.into()),
                ..Default::default()
            },
        }
    }

    fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            options: DatabaseOptions {
                bytes: Some(bytes),
                ..Default::default()
            },
        }
    }

    /// Use these translation tables
    pub fn translations(mut self, translations: Translations) -> Self {
        self.options.translations = TranslationSource::Tables(translations);
        self
    }

    /// Load `country.json`, `region.json` and `city.json` from `dir`
    ///
    /// Missing files fall back to the built-in defaults.
    pub fn translations_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.translations = TranslationSource::Dir(dir.into());
        self
    }

    /// Search IPv6 addresses that embed an IPv4 address (IPv4-mapped, 6to4,
    /// Teredo) in the IPv4 table
    ///
    /// Default: off
    pub fn map_embedded_ipv4(mut self, enabled: bool) -> Self {
        self.options.map_embedded_ipv4 = enabled;
        self
    }

    /// Open the database
    pub fn open(self) -> Result<Database> {
        let DatabaseOptions {
            path,
            bytes,
            translations,
            map_embedded_ipv4,
        } = self.options;

        let (storage, source) = match (bytes, path) {
            (Some(bytes), _) => (DatabaseStorage::Owned(bytes), "<memory>".to_string()),
            (None, Some(path)) => {
                let storage = map_file(&path)?;
                (storage, path.display().to_string())
            }
            (None, None) => {
                return Err(GeoError::DatabaseNotFound("no path given".to_string()));
            }
        };

        let translations = match translations {
            TranslationSource::Defaults => Translations::defaults(),
            TranslationSource::Tables(tables) => tables,
            TranslationSource::Dir(dir) => Translations::load_dir(dir)?,
        };

        Database::from_storage(storage, source, translations, map_embedded_ipv4)
    }
}

fn map_file(path: &Path) -> Result<DatabaseStorage> {
    if !path.is_file() {
        return Err(GeoError::DatabaseNotFound(path.display().to_string()));
    }

    let file = File::open(path)
        .map_err(|e| GeoError::DatabaseNotFound(format!("{} ({})", path.display(), e)))?;

    let len = file.metadata()?.len();
    if len < HEADER_LEN as u64 {
        return Err(GeoError::CorruptHeader(format!(
            "{} is {} bytes, header needs {}",
            path.display(),
            len,
            HEADER_LEN
        )));
    }

    // SAFETY: the mapping is read-only and lives inside Database; the file
    // must not be modified by other processes while it is mapped.
    let mmap = unsafe { Mmap::map(&file) }
        .map_err(|e| GeoError::Io(format!("Failed to mmap {}: {}", path.display(), e)))?;

    Ok(DatabaseStorage::Mmap(mmap))
}

/// Geolocation database over one BIN image
///
/// # Examples
///
/// ```no_run
/// use ip2geo::Database;
///
/// let db = Database::open("IP2LOCATION-LITE-DB5.IPV6.BIN")?;
///
/// if let Some(record) = db.search("8.8.8.8")? {
///     println!("{} {} {}", record.country, record.region, record.city);
/// }
/// # Ok::<(), ip2geo::GeoError>(())
/// ```
pub struct Database {
    data: Option<DatabaseStorage>,
    header: DatabaseHeader,
    translations: Translations,
    map_embedded_ipv4: bool,
    source: String,
}

impl Database {
    /// Memory-map a database file with default translation tables
    ///
    /// Fails with [`GeoError::DatabaseNotFound`] if `path` is not a regular
    /// file and [`GeoError::CorruptHeader`] if the header is unusable.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        DatabaseOpener::new(path.as_ref()).open()
    }

    /// Start configuring a database opened from `path`
    #[allow(clippy::should_implement_trait)]
    pub fn from(path: impl Into<PathBuf>) -> DatabaseOpener {
        DatabaseOpener::new(path)
    }

    /// Create a database from raw bytes with default translation tables
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        DatabaseOpener::from_bytes(data).open()
    }

    /// Start configuring a database held in memory
    pub fn from_bytes_builder(data: Vec<u8>) -> DatabaseOpener {
        DatabaseOpener::from_bytes(data)
    }

    fn from_storage(
        storage: DatabaseStorage,
        source: String,
        translations: Translations,
        map_embedded_ipv4: bool,
    ) -> Result<Self> {
        let header = DatabaseHeader::from_file(storage.as_slice())?;

        debug!(
            source = %source,
            db_type = header.db_type,
            columns = header.column_count,
            build_date = %header.build_date,
            ipv4_rows = header.v4_count,
            ipv6_rows = header.v6_count,
            indexed = header.v4_index_addr != 0,
            "opened database"
        );

        Ok(Self {
            data: Some(storage),
            header,
            translations,
            map_embedded_ipv4,
            source,
        })
    }

    /// Look up an address
    ///
    /// Accepts text, `std::net` addresses, packed bytes and integers (see
    /// [`ToIpAddr`]). Returns `Ok(None)` when no row contains the address.
    pub fn search<A: ToIpAddr>(&self, address: A) -> Result<Option<GeoRecord>> {
        let ip = address.to_ip_addr()?;
        self.search_ip(ip)
    }

    /// Look up a parsed address
    pub fn search_ip(&self, ip: IpAddr) -> Result<Option<GeoRecord>> {
        match self.locate(ip)? {
            Some((version, row)) => self.decode_row(ip, version, row).map(Some),
            None => {
                trace!(%ip, "address not found");
                Ok(None)
            }
        }
    }

    /// Look up many addresses; each result is independent of the others
    pub fn search_many<I, A>(&self, addresses: I) -> Vec<Result<Option<GeoRecord>>>
    where
        I: IntoIterator<Item = A>,
        A: ToIpAddr,
    {
        addresses
            .into_iter()
            .map(|address| self.search(address))
            .collect()
    }

    /// Find the table and row containing `ip`
    pub fn locate(&self, ip: IpAddr) -> Result<Option<(IpVersion, RowIndex)>> {
        let number = if self.map_embedded_ipv4 {
            IpNumber::from_ip_embedded(ip)
        } else {
            IpNumber::from_ip(ip)
        };

        let locator = RangeLocator::new(self.cursor()?, &self.header);
        let row = locator.locate(number)?;
        trace!(%ip, version = %number.version, ?row, "located");
        Ok(row.map(|row| (number.version, row)))
    }

    /// Decode a specific row into a record for `ip`
    pub fn decode_row(&self, ip: IpAddr, version: IpVersion, row: RowIndex) -> Result<GeoRecord> {
        let decoder = RecordDecoder::new(self.cursor()?, &self.header, &self.translations);
        decoder.decode(ip, row, version)
    }

    /// `(ip_start, ip_end)` of a row, `ip_end` exclusive
    pub fn row_range(&self, version: IpVersion, row: RowIndex) -> Result<(u128, u128)> {
        RangeLocator::new(self.cursor()?, &self.header).row_range(version, row)
    }

    /// Parsed header
    pub fn header(&self) -> &DatabaseHeader {
        &self.header
    }

    /// Build date recorded in the header
    pub fn build_date(&self) -> BuildDate {
        self.header.build_date
    }

    /// Translation tables in use
    pub fn translations(&self) -> &Translations {
        &self.translations
    }

    /// Path the database was opened from, or `<memory>`
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Size of the database image in bytes (0 once closed)
    pub fn size(&self) -> usize {
        self.data.as_ref().map_or(0, |d| d.as_slice().len())
    }

    /// True once [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.data.is_none()
    }

    /// Release the mapping
    ///
    /// Idempotent: closing an already closed database does nothing. Queries
    /// after close fail with [`GeoError::Closed`].
    pub fn close(&mut self) {
        if self.data.take().is_some() {
            debug!(source = %self.source, "closed database");
        }
    }

    fn cursor(&self) -> Result<ByteCursor<'_>> {
        self.data
            .as_ref()
            .map(|d| ByteCursor::new(d.as_slice()))
            .ok_or(GeoError::Closed)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("source", &self.source)
            .field("size", &self.size())
            .field("header", &self.header)
            .field("map_embedded_ipv4", &self.map_embedded_ipv4)
            .finish()
    }
}
