//! Turning video locations into local files.
//!
//! Extraction always reads a local file. A [`VideoLocator`] maps whatever the
//! caller holds (a path, a `file://` URL, a cloud object URL) to such a file.
//!
//! - [`LocalLocator`] accepts local paths only.
//! - [`VideoCache`] downloads remote videos through an injected
//!   [`VideoFetcher`] into a size-bounded cache directory.
//!
//! A `VideoCache` is meant to be created once and shared by reference between
//! extraction calls, including calls on different threads.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

use sha1::{Digest, Sha1};

use crate::error::FramepickError;

/// Video extensions kept on cached files. Anything else is stored as `.mp4`.
const VIDEO_EXTENSIONS: [&str; 8] = ["mp4", "mov", "avi", "mkv", "webm", "flv", "3gp", "wmv"];

/// Eviction trims the cache to this fraction of its size limit.
const EVICTION_TARGET: f64 = 0.8;

/// Where a video lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// A local filesystem path or `file://` URL.
    Local,
    /// A plain HTTP(S) URL.
    Http,
    /// Amazon S3, via `s3://` or an `s3.*.amazonaws.com` URL.
    AwsS3,
    /// Azure Blob Storage.
    AzureBlob,
    /// Google Cloud Storage, via `gs://` or `storage.googleapis.com`.
    GoogleCloud,
}

impl StorageKind {
    /// Classify a location string.
    ///
    /// ```
    /// use framepick::StorageKind;
    ///
    /// assert_eq!(StorageKind::classify("clip.mp4"), StorageKind::Local);
    /// assert_eq!(StorageKind::classify("s3://bucket/clip.mp4"), StorageKind::AwsS3);
    /// assert_eq!(
    ///     StorageKind::classify("https://acct.blob.core.windows.net/c/clip.mp4"),
    ///     StorageKind::AzureBlob,
    /// );
    /// ```
    pub fn classify(location: &str) -> Self {
        let lowered = location.trim().to_ascii_lowercase();

        if let Some(rest) = lowered
            .strip_prefix("https://")
            .or_else(|| lowered.strip_prefix("http://"))
        {
            let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
            return if host.contains("s3.") && host.contains("amazonaws.com") {
                StorageKind::AwsS3
            } else if host.contains("blob.core.windows.net") {
                StorageKind::AzureBlob
            } else if host.contains("storage.googleapis.com") {
                StorageKind::GoogleCloud
            } else {
                StorageKind::Http
            };
        }
        if lowered.starts_with("s3://") {
            return StorageKind::AwsS3;
        }
        if lowered.starts_with("gs://") {
            return StorageKind::GoogleCloud;
        }
        if lowered.contains("blob.core.windows.net") {
            return StorageKind::AzureBlob;
        }
        if lowered.contains("storage.googleapis.com") {
            return StorageKind::GoogleCloud;
        }
        StorageKind::Local
    }

    /// Returns `true` for every kind except [`StorageKind::Local`].
    pub fn is_remote(self) -> bool {
        self != StorageKind::Local
    }
}

impl Display for StorageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            StorageKind::Local => "local",
            StorageKind::Http => "http",
            StorageKind::AwsS3 => "aws_s3",
            StorageKind::AzureBlob => "azure_blob",
            StorageKind::GoogleCloud => "google_cloud",
        };
        f.write_str(name)
    }
}

/// Returns `true` if `location` names a remote video.
pub fn is_remote_url(location: &str) -> bool {
    StorageKind::classify(location).is_remote()
}

/// Resolves a video location to a readable local file.
pub trait VideoLocator: Send + Sync {
    /// Return a local path holding the video at `location`.
    ///
    /// # Errors
    ///
    /// Implementations return an input error (see
    /// [`ErrorCategory::Input`](crate::ErrorCategory::Input)) when the
    /// location cannot be resolved.
    fn resolve_to_local_path(&self, location: &str) -> Result<PathBuf, FramepickError>;
}

/// Accepts local paths and `file://` URLs; rejects everything remote.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalLocator;

impl VideoLocator for LocalLocator {
    fn resolve_to_local_path(&self, location: &str) -> Result<PathBuf, FramepickError> {
        if is_remote_url(location) {
            return Err(FramepickError::UnsupportedLocation(location.to_string()));
        }
        let path = PathBuf::from(location.strip_prefix("file://").unwrap_or(location));
        if !path.is_file() {
            return Err(FramepickError::FileOpen {
                path,
                reason: "no such file".to_string(),
            });
        }
        Ok(path)
    }
}

/// Downloads one remote video.
///
/// Network access is left to implementations; the cache only decides where
/// the bytes go and when they are reused.
pub trait VideoFetcher: Send + Sync {
    /// Write the video at `location` to `destination`.
    ///
    /// # Errors
    ///
    /// Any error aborts the fetch. A partially written `destination` is
    /// removed by the cache.
    fn fetch(
        &self,
        location: &str,
        kind: StorageKind,
        destination: &Path,
    ) -> Result<(), FramepickError>;
}

/// A size-bounded, on-disk cache of remote videos.
///
/// Entries are named after the SHA-1 of their URL. A hit refreshes the
/// entry's modification time; after each download the oldest entries are
/// removed until the cache fits in 80% of `max_bytes`. Lookups are
/// serialized, so concurrent callers never download the same URL twice.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// use framepick::{FramepickError, StorageKind, VideoCache, VideoFetcher, VideoLocator};
///
/// struct CopyFetcher;
///
/// impl VideoFetcher for CopyFetcher {
///     fn fetch(&self, _: &str, _: StorageKind, destination: &Path) -> Result<(), FramepickError> {
///         std::fs::copy("mirror/clip.mp4", destination)?;
///         Ok(())
///     }
/// }
///
/// let cache = VideoCache::new("/tmp/framepick-cache", 5 << 30, CopyFetcher).unwrap();
/// let local = cache.resolve_to_local_path("https://example.com/clip.mp4").unwrap();
/// ```
#[derive(Debug)]
pub struct VideoCache<F> {
    directory: PathBuf,
    max_bytes: u64,
    fetcher: F,
    lock: Mutex<()>,
}

impl<F: VideoFetcher> VideoCache<F> {
    /// Create a cache in `directory`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`FramepickError::IoError`] if the directory cannot be created.
    pub fn new<P: AsRef<Path>>(
        directory: P,
        max_bytes: u64,
        fetcher: F,
    ) -> Result<Self, FramepickError> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory)?;
        Ok(Self {
            directory,
            max_bytes,
            fetcher,
            lock: Mutex::new(()),
        })
    }

    /// The cache directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The fetcher used for cache misses.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Size limit in bytes.
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Where `location` is (or would be) cached.
    pub fn cache_path(&self, location: &str) -> PathBuf {
        let digest = Sha1::digest(location.as_bytes());
        let hash: String = digest.iter().map(|byte| format!("{byte:02x}")).collect();
        let extension = video_extension(location).unwrap_or("mp4");
        self.directory.join(format!("{hash}.{extension}"))
    }

    /// Return the cached copy of `location`, downloading it first if needed.
    ///
    /// # Errors
    ///
    /// Returns [`FramepickError::UnsupportedLocation`] for local locations,
    /// [`FramepickError::FetchFailed`] if the fetcher fails, and
    /// [`FramepickError::IoError`] for cache directory failures.
    pub fn get_or_fetch(&self, location: &str) -> Result<PathBuf, FramepickError> {
        let kind = StorageKind::classify(location);
        if !kind.is_remote() {
            return Err(FramepickError::UnsupportedLocation(location.to_string()));
        }

        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let path = self.cache_path(location);
        if path.is_file() {
            log::debug!("Cache hit for {location}: {}", path.display());
            touch(&path)?;
            return Ok(path);
        }

        let partial = path.with_extension("part");
        log::info!("Fetching {location} ({kind}) into {}", path.display());
        let fetched = self
            .fetcher
            .fetch(location, kind, &partial)
            .and_then(|()| fs::rename(&partial, &path).map_err(FramepickError::from));
        if let Err(error) = fetched {
            if partial.exists() {
                if let Err(cleanup) = fs::remove_file(&partial) {
                    log::warn!("Failed to remove {}: {cleanup}", partial.display());
                }
            }
            return Err(match error {
                FramepickError::FetchFailed { .. } => error,
                other => FramepickError::FetchFailed {
                    location: location.to_string(),
                    reason: other.to_string(),
                },
            });
        }

        self.evict_locked(Some(&path))?;
        Ok(path)
    }

    /// Total size of the cached files in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FramepickError::IoError`] if the directory cannot be read.
    pub fn total_size(&self) -> Result<u64, FramepickError> {
        Ok(self.entries()?.iter().map(|entry| entry.size).sum())
    }

    /// Remove the oldest entries until the cache fits its size limit.
    ///
    /// Returns the number of files removed.
    ///
    /// # Errors
    ///
    /// Returns [`FramepickError::IoError`] if the directory cannot be read.
    pub fn evict(&self) -> Result<usize, FramepickError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.evict_locked(None)
    }

    /// Eviction proper; the caller holds the lock. `keep` is never removed.
    fn evict_locked(&self, keep: Option<&Path>) -> Result<usize, FramepickError> {
        let mut entries = self.entries()?;
        let mut total: u64 = entries.iter().map(|entry| entry.size).sum();
        if total <= self.max_bytes {
            return Ok(0);
        }

        let target = (self.max_bytes as f64 * EVICTION_TARGET) as u64;
        entries.sort_by_key(|entry| entry.modified);

        let mut removed = 0;
        for entry in entries {
            if total <= target {
                break;
            }
            if keep == Some(entry.path.as_path()) {
                continue;
            }
            match fs::remove_file(&entry.path) {
                Ok(()) => {
                    total = total.saturating_sub(entry.size);
                    removed += 1;
                    log::info!("Evicted cached video {}", entry.path.display());
                }
                Err(error) => {
                    log::warn!("Failed to evict {}: {error}", entry.path.display());
                }
            }
        }
        Ok(removed)
    }

    fn entries(&self) -> Result<Vec<CacheEntry>, FramepickError> {
        let mut entries = Vec::new();
        for dir_entry in fs::read_dir(&self.directory)? {
            let dir_entry = dir_entry?;
            let metadata = dir_entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            entries.push(CacheEntry {
                path: dir_entry.path(),
                size: metadata.len(),
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }
        Ok(entries)
    }
}

impl<F: VideoFetcher> VideoLocator for VideoCache<F> {
    fn resolve_to_local_path(&self, location: &str) -> Result<PathBuf, FramepickError> {
        if is_remote_url(location) {
            self.get_or_fetch(location)
        } else {
            LocalLocator.resolve_to_local_path(location)
        }
    }
}

struct CacheEntry {
    path: PathBuf,
    size: u64,
    modified: SystemTime,
}

fn touch(path: &Path) -> Result<(), FramepickError> {
    File::options()
        .write(true)
        .open(path)?
        .set_modified(SystemTime::now())?;
    Ok(())
}

/// The recognised video extension of a URL's path, lowercased.
fn video_extension(location: &str) -> Option<&'static str> {
    let without_scheme = location
        .split_once("://")
        .map_or(location, |(_, rest)| rest);
    let path = without_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let file_name = path.rsplit('/').next().unwrap_or_default();
    let (_, extension) = file_name.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();
    VIDEO_EXTENSIONS
        .iter()
        .copied()
        .find(|known| *known == extension)
}
