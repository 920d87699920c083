//! Size-based rotation of log files
//!
//! When a log file has grown to the configured size, the next write first
//! moves it aside as `{stem}_{%Y_%m_%d_%H_%M_%S_%6f}.{ext}` (or deletes it
//! when no archives are kept). Compression and retention then run on a
//! detached thread; their failures are recorded in the diagnostic log and
//! never reach the writer.

use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};

const ARCHIVE_DATE_FORMAT: &str = "%Y_%m_%d_%H_%M_%S_%6f";
const ZIP_COMPRESSION_LEVEL: i64 = 7;

/// Decimal size units accepted by [`FileSize::parse`]
const UNITS: [(&str, u64); 5] = [
    ("TB", 1_000_000_000_000),
    ("GB", 1_000_000_000),
    ("MB", 1_000_000),
    ("KB", 1_000),
    ("B", 1),
];

/// A positive size in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FileSize(u64);

impl FileSize {
    pub fn bytes(bytes: u64) -> Result<Self> {
        if bytes == 0 {
            return Err(Error::invalid_parameter("Log file size must be bigger than 0"));
        }
        Ok(Self(bytes))
    }

    /// Parse `"10 MB"`, `"10MB"` or `"512B"` (units B, KB, MB, GB, TB; case-insensitive)
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || Error::invalid_parameter(format!("File size [{}] has invalid syntax", text));

        let compact: String = text.split_whitespace().collect();
        if text.split_whitespace().count() > 2 {
            return Err(invalid());
        }
        let upper = compact.to_uppercase();
        let (number, multiplier) = UNITS
            .iter()
            .find_map(|(unit, multiplier)| {
                upper.strip_suffix(unit).map(|number| (number, *multiplier))
            })
            .ok_or_else(invalid)?;

        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let count: u64 = number.parse().map_err(|_| invalid())?;
        let bytes = count.checked_mul(multiplier).ok_or_else(invalid)?;
        Self::bytes(bytes).map_err(|_| invalid())
    }

    pub fn as_bytes(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}B", self.0)
    }
}

impl FromStr for FileSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for FileSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bytes(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Bytes(bytes) => FileSize::bytes(bytes),
            Raw::Text(text) => FileSize::parse(&text),
        }
        .map_err(serde::de::Error::custom)
    }
}

/// When and how a file output rotates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    pub max_file_size: FileSize,
    /// Archives to keep; 0 deletes the full file instead of archiving it
    pub files_amount: usize,
    pub is_zip: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_file_size: FileSize(10 * 1_000_000),
            files_amount: 10,
            is_zip: false,
        }
    }
}

impl RotationPolicy {
    pub fn new(max_file_size: FileSize) -> Self {
        Self {
            max_file_size,
            ..Self::default()
        }
    }

    pub fn with_files_amount(mut self, files_amount: usize) -> Self {
        self.files_amount = files_amount;
        self
    }

    pub fn with_zip(mut self, is_zip: bool) -> Self {
        self.is_zip = is_zip;
        self
    }
}

/// Move `path` aside if it reached the size limit
///
/// Returns the archive path when the file was renamed.
pub(crate) fn rotate_if_needed(path: &Path, policy: &RotationPolicy) -> Result<Option<PathBuf>> {
    let size = match fs::metadata(path) {
        Ok(metadata) => metadata.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if size < policy.max_file_size.as_bytes() {
        return Ok(None);
    }

    if policy.files_amount == 0 {
        fs::remove_file(path)?;
        return Ok(None);
    }

    let archive = archive_path(path, Local::now());
    fs::rename(path, &archive)?;
    Ok(Some(archive))
}

/// Compress and prune on a detached thread
pub(crate) fn spawn_housekeeping(log_path: PathBuf, archive: PathBuf, policy: RotationPolicy) {
    let spawned = std::thread::Builder::new()
        .name("nestlog-rotation".to_string())
        .spawn(move || {
            if let Err(e) = housekeeping(&log_path, &archive, &policy) {
                crate::diag_error!("rotation of {} failed: {}", log_path.display(), e);
            }
        });

    if let Err(e) = spawned {
        crate::diag_error!("failed to spawn rotation thread: {}", e);
    }
}

/// Zip `archive` if requested, then keep only the newest `files_amount` archives
pub fn housekeeping(log_path: &Path, archive: &Path, policy: &RotationPolicy) -> Result<()> {
    if policy.is_zip {
        compress(archive)?;
    }
    enforce_retention(log_path, policy.files_amount)
}

/// Archive name for `path` at time `now`
pub fn archive_path(path: &Path, now: DateTime<Local>) -> PathBuf {
    let stamp = now.format(ARCHIVE_DATE_FORMAT);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, stamp, ext.to_string_lossy()),
        None => format!("{}_{}", stem, stamp),
    };
    path.with_file_name(name)
}

/// Archives belonging to `log_path`, oldest first
pub fn list_archives(log_path: &Path) -> Result<Vec<PathBuf>> {
    let dir = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let prefix = format!(
        "{}_",
        log_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    );

    let mut archives: Vec<PathBuf> = fs::read_dir(&dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy())
                .and_then(|name| name.strip_prefix(&prefix).map(is_archive_stamp))
                .unwrap_or(false)
        })
        .collect();

    // the zero-padded stamp sorts chronologically
    archives.sort();
    Ok(archives)
}

fn is_archive_stamp(suffix: &str) -> bool {
    let stamp = suffix.split('.').next().unwrap_or(suffix);
    let widths = [4, 2, 2, 2, 2, 2, 6];
    let parts: Vec<&str> = stamp.split('_').collect();
    parts.len() == widths.len()
        && parts
            .iter()
            .zip(widths)
            .all(|(part, width)| part.len() == width && part.chars().all(|c| c.is_ascii_digit()))
}

fn compress(archive: &Path) -> Result<PathBuf> {
    let mut zip_name = archive.as_os_str().to_owned();
    zip_name.push(".zip");
    let zip_path = PathBuf::from(zip_name);

    let entry_name = archive
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(ZIP_COMPRESSION_LEVEL));

    let mut writer = ZipWriter::new(File::create(&zip_path)?);
    writer.start_file(entry_name, options).map_err(zip_error)?;
    io::copy(&mut File::open(archive)?, &mut writer)?;
    writer.finish().map_err(zip_error)?;

    fs::remove_file(archive)?;
    Ok(zip_path)
}

fn enforce_retention(log_path: &Path, files_amount: usize) -> Result<()> {
    if files_amount == 0 {
        return Ok(());
    }

    let archives = list_archives(log_path)?;
    let excess = archives.len().saturating_sub(files_amount);
    for oldest in &archives[..excess] {
        fs::remove_file(oldest)?;
    }
    Ok(())
}

fn zip_error(e: zip::result::ZipError) -> Error {
    Error::Io(io::Error::other(e))
}
