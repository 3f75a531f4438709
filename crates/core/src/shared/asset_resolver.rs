//! Locates runtime assets (the face cascade) on disk, downloading them into
//! the user cache on first use.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

const APP_DIR: &str = "Anime Cropper";
const ASSET_SUBDIR: &str = "assets";

#[derive(Error, Debug)]
pub enum AssetResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write asset to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`, where
/// `total_bytes` is 0 when the server sends no Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Finds `name` in the user cache, then in `bundled_dir`, and otherwise
/// downloads it from `url` into the cache.
pub fn resolve(
    name: &str,
    url: &str,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, AssetResolveError> {
    resolve_in(&asset_cache_dir()?, name, url, bundled_dir, progress)
}

/// [`resolve`] against an explicit cache directory.
pub fn resolve_in(
    cache_dir: &Path,
    name: &str,
    url: &str,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, AssetResolveError> {
    let cached = cache_dir.join(name);
    let existing = std::iter::once(cached.clone())
        .chain(bundled_dir.map(|dir| dir.join(name)))
        .find(|candidate| is_usable(candidate));
    if let Some(path) = existing {
        log::debug!("Using asset {}", path.display());
        return Ok(path);
    }

    fs::create_dir_all(cache_dir).map_err(AssetResolveError::CacheDir)?;
    log::info!("Fetching {name} from {url}");
    download(url, &cached, progress)?;
    Ok(cached)
}

/// Per-user asset cache: `<cache dir>/Anime Cropper/assets`.
///
/// macOS keeps it under Application Support like other app data; elsewhere
/// it follows the platform cache directory (`$XDG_CACHE_HOME`,
/// `%LOCALAPPDATA%`).
pub fn asset_cache_dir() -> Result<PathBuf, AssetResolveError> {
    let base = if cfg!(target_os = "macos") {
        dirs::data_dir()
    } else {
        dirs::cache_dir()
    };
    base.map(|dir| dir.join(APP_DIR).join(ASSET_SUBDIR))
        .ok_or(AssetResolveError::NoCacheDir)
}

/// Zero-length files are leftovers of interrupted copies.
fn is_usable(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|m| m.is_file() && m.len() > 0)
}

/// Streams `url` into `<dest>.part` and renames it over `dest` once
/// complete, so `dest` never holds a partial file.
fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), AssetResolveError> {
    let part = dest.with_extension("part");
    let result = fetch_to(url, &part, progress).and_then(|()| {
        fs::rename(&part, dest).map_err(|source| AssetResolveError::Write {
            path: dest.to_path_buf(),
            source,
        })
    });
    if result.is_err() {
        let _ = fs::remove_file(&part);
    }
    result
}

fn fetch_to(url: &str, path: &Path, progress: Option<ProgressFn>) -> Result<(), AssetResolveError> {
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|source| AssetResolveError::Download {
            url: url.to_string(),
            source,
        })?;

    let write_err = |source: io::Error| AssetResolveError::Write {
        path: path.to_path_buf(),
        source,
    };
    let total = response.content_length().unwrap_or(0);
    let mut reader = ProgressReader {
        inner: response,
        read: 0,
        total,
        progress,
    };
    let mut file = fs::File::create(path).map_err(write_err)?;
    io::copy(&mut reader, &mut file).map_err(write_err)?;
    file.sync_all().map_err(write_err)
}

/// Reports cumulative bytes after every read.
struct ProgressReader<R> {
    inner: R,
    read: u64,
    total: u64,
    progress: Option<ProgressFn>,
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.read += n as u64;
            if let Some(cb) = &self.progress {
                cb(self.read, self.total);
            }
        }
        Ok(n)
    }
}
