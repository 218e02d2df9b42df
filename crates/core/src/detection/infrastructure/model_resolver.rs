use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::APP_DIR_NAME;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("model file not found: {0}")]
    NotFound(PathBuf),
    #[error("cannot create model cache: {0}")]
    CacheDir(#[source] io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("cannot write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no platform cache directory")]
    NoCacheDir,
}

/// Download progress as `(received, expected)` bytes; `expected` is 0 when
/// the server sends no length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Finds the model file named `name`.
///
/// A path the user gave wins and must exist. Otherwise the per-user cache is
/// consulted, and on a miss the model is fetched from `url` into it.
pub fn resolve(
    name: &str,
    url: &str,
    explicit: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    match explicit {
        Some(path) => require_existing(path),
        None => resolve_in(&model_cache_dir()?, name, url, progress),
    }
}

/// Cache lookup and download against `cache_dir`.
pub fn resolve_in(
    cache_dir: &Path,
    name: &str,
    url: &str,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let target = cache_dir.join(name);
    if target.exists() {
        log::debug!("Model cache hit: {}", target.display());
        return Ok(target);
    }

    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    log::info!("Fetching {name} from {url}");
    download(url, &target, progress)?;
    Ok(target)
}

pub fn require_existing(path: &Path) -> Result<PathBuf, ModelResolveError> {
    if !path.is_file() {
        return Err(ModelResolveError::NotFound(path.to_path_buf()));
    }
    Ok(path.to_path_buf())
}

/// `<cache>/FaceLock/models`, where `<cache>` is the platform cache
/// directory (application data on macOS).
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    let base = if cfg!(target_os = "macos") {
        dirs::data_dir()
    } else {
        dirs::cache_dir()
    };
    base.map(|d| d.join(APP_DIR_NAME).join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

/// Streams `url` into `dest` through a `.part` file, so an interrupted
/// download never leaves a truncated model behind.
fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let partial = dest.with_extension("part");
    let result = fetch_to(url, &partial, progress)
        .and_then(|()| fs::rename(&partial, dest).map_err(write_error(dest)));
    if result.is_err() {
        let _ = fs::remove_file(&partial);
    }
    result
}

fn fetch_to(url: &str, path: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let mut response = reqwest::blocking::get(url)
        .and_then(reqwest::blocking::Response::error_for_status)
        .map_err(|source| ModelResolveError::Download {
            url: url.to_string(),
            source,
        })?;

    let file = fs::File::create(path).map_err(write_error(path))?;
    let mut sink = ProgressWriter {
        inner: BufWriter::new(file),
        written: 0,
        expected: response.content_length().unwrap_or(0),
        progress,
    };
    io::copy(&mut response, &mut sink).map_err(write_error(path))?;
    sink.flush().map_err(write_error(path))
}

fn write_error(path: &Path) -> impl FnOnce(io::Error) -> ModelResolveError {
    let path = path.to_path_buf();
    move |source| ModelResolveError::Write { path, source }
}

/// Reports the running byte count to `progress` after every write.
struct ProgressWriter<W> {
    inner: W,
    written: u64,
    expected: u64,
    progress: Option<ProgressFn>,
}

impl<W: Write> Write for ProgressWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        if let Some(report) = &self.progress {
            report(self.written, self.expected);
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_prefers_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let model = tmp.path().join("custom.onnx");
        fs::write(&model, b"model").unwrap();

        let resolved = resolve("ignored.onnx", "http://invalid.example", Some(&model), None);

        assert_eq!(resolved.unwrap(), model);
    }

    #[test]
    fn test_resolve_missing_explicit_path_errors() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing.onnx");

        let err = resolve("x.onnx", "http://invalid.example", Some(&missing), None).unwrap_err();

        assert!(matches!(err, ModelResolveError::NotFound(p) if p == missing));
    }

    #[test]
    fn test_resolve_in_finds_cached_file() {
        let tmp = TempDir::new().unwrap();
        let cached = tmp.path().join("face.onnx");
        fs::write(&cached, b"cached model").unwrap();

        let resolved = resolve_in(
            tmp.path(),
            "face.onnx",
            "http://invalid.nonexistent.example.com/face.onnx",
            None,
        );

        assert_eq!(resolved.unwrap(), cached);
    }

    #[test]
    fn test_model_cache_dir_returns_path() {
        let path = model_cache_dir().unwrap();
        assert!(path.to_string_lossy().contains(APP_DIR_NAME));
        assert!(path.to_string_lossy().contains("models"));
    }

    #[test]
    fn test_progress_writer_reports_running_total() {
        use std::sync::{Arc, Mutex};
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let mut sink = ProgressWriter {
            inner: Vec::new(),
            written: 0,
            expected: 6,
            progress: Some(Box::new(move |got, total| log.lock().unwrap().push((got, total)))),
        };

        sink.write_all(b"abc").unwrap();
        sink.write_all(b"def").unwrap();

        assert_eq!(sink.inner, b"abcdef");
        assert_eq!(*seen.lock().unwrap(), vec![(3, 6), (6, 6)]);
    }

    #[test]
    fn test_download_invalid_url_leaves_no_partial_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");

        let result = download("http://invalid.nonexistent.example.com/model", &dest, None);

        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }
}
