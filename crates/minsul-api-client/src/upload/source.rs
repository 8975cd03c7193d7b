use bytes::Bytes;
use std::io::SeekFrom;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::error::{ClientError, ClientResult};

/// Where upload bytes come from.
///
/// A `File` source is read one chunk at a time, so at most one chunk of a
/// large file is held in memory.
#[derive(Debug, Clone)]
pub enum UploadSource {
    Memory { name: String, data: Bytes },
    File { name: String, path: PathBuf, size: u64 },
}

impl UploadSource {
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        UploadSource::Memory {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Stat a local file; the upload name is its file name.
    pub async fn open(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(ClientError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            )));
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.bin")
            .to_string();

        Ok(UploadSource::File {
            name,
            path: path.to_path_buf(),
            size: metadata.len(),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            UploadSource::Memory { name, .. } | UploadSource::File { name, .. } => name,
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            UploadSource::Memory { data, .. } => data.len() as u64,
            UploadSource::File { size, .. } => *size,
        }
    }

    /// Bytes in `[range.start, range.end)`.
    pub async fn read_range(&self, range: Range<u64>) -> ClientResult<Bytes> {
        match self {
            UploadSource::Memory { data, .. } => {
                let end = (range.end as usize).min(data.len());
                let start = (range.start as usize).min(end);
                Ok(data.slice(start..end))
            }
            UploadSource::File { path, .. } => {
                let mut file = tokio::fs::File::open(path).await?;
                file.seek(SeekFrom::Start(range.start)).await?;
                let mut buffer = vec![0u8; (range.end - range.start) as usize];
                file.read_exact(&mut buffer).await?;
                Ok(Bytes::from(buffer))
            }
        }
    }

    pub async fn read_all(&self) -> ClientResult<Bytes> {
        self.read_range(0..self.size()).await
    }
}
