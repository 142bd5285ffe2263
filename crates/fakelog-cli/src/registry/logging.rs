use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;

use super::{RegistryError, RegistryResult};

pub const LOG_FILE_NAME: &str = "fakelog.log";
const MAX_LOG_BYTES: u64 = 1024 * 1024;
const LOG_BACKUPS: u32 = 3;

/// Install JSON logging to stderr and, when `path` is set, to a size-rotated
/// log file.
pub fn init_logging(path: Option<&Path>) -> RegistryResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_timer(UtcTime::rfc_3339())
        .with_writer(io::stderr);

    let file_layer = match path {
        Some(path) => {
            let file = RotatingFile::open(path, MAX_LOG_BYTES, LOG_BACKUPS)?;
            let file = Arc::new(Mutex::new(file));
            let make_writer = BoxMakeWriter::new(move || SharedWriter {
                file: Arc::clone(&file),
            });
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_timer(UtcTime::rfc_3339())
                    .with_writer(make_writer),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|err| RegistryError::Logging(err.to_string()))?;

    Ok(())
}

/// Append-only log file that rolls over to `<name>.1 .. <name>.N` once it
/// exceeds `max_bytes`.
#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backups: u32,
    file: File,
    written: u64,
}

impl RotatingFile {
    pub fn open(path: &Path, max_bytes: u64, backups: u32) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path: path.to_path_buf(),
            max_bytes,
            backups,
            file,
            written,
        })
    }

    fn backup_path(&self, index: u32) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if self.backups > 0 {
            for index in (1..self.backups).rev() {
                let from = self.backup_path(index);
                if from.exists() {
                    std::fs::rename(&from, self.backup_path(index + 1))?;
                }
            }
            std::fs::rename(&self.path, self.backup_path(1))?;
            self.file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
        } else {
            self.file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&self.path)?;
        }
        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let size = self.file.write(buf)?;
        self.written = self.written.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

struct SharedWriter {
    file: Arc<Mutex<RotatingFile>>,
}

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| io::Error::other("failed to lock log file"))?;
        file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| io::Error::other("failed to lock log file"))?;
        file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log(label: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("fakelog_logging_{label}_{}", uuid::Uuid::new_v4()));
        dir.join(LOG_FILE_NAME)
    }

    #[test]
    fn rotates_and_keeps_bounded_backups() {
        let path = temp_log("rotate");
        let mut file = RotatingFile::open(&path, 16, 2).expect("open log");

        for line in ["aaaaaaaaaa\n", "bbbbbbbbbb\n", "cccccccccc\n", "dddddddddd\n"] {
            file.write_all(line.as_bytes()).expect("write line");
        }
        file.flush().expect("flush");

        let read = |p: PathBuf| std::fs::read_to_string(p).expect("read log");
        assert_eq!(read(path.clone()), "dddddddddd\n");
        assert_eq!(read(file.backup_path(1)), "cccccccccc\n");
        assert_eq!(read(file.backup_path(2)), "bbbbbbbbbb\n");
        assert!(!file.backup_path(3).exists());
    }

    #[test]
    fn resumes_size_of_existing_file() {
        let path = temp_log("resume");
        std::fs::create_dir_all(path.parent().expect("parent")).expect("create dir");
        std::fs::write(&path, "0123456789").expect("seed log");

        let mut file = RotatingFile::open(&path, 12, 1).expect("open log");
        file.write_all(b"abc").expect("write");
        file.flush().expect("flush");

        assert_eq!(std::fs::read_to_string(&path).expect("read"), "abc");
        assert_eq!(
            std::fs::read_to_string(file.backup_path(1)).expect("read backup"),
            "0123456789"
        );
    }
}
