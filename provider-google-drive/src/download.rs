//! Chunked media download with progress reporting.
//!
//! The file is fetched with consecutive ranged requests into an in-memory
//! buffer. After every chunk the observer receives a [`DownloadStatus`].

use crate::error::{GoogleDriveError, Result};
use crate::session::DriveSession;
use crate::types::ByteRange;
use std::io::{self, Cursor, Write};
use tracing::{debug, info, instrument};

/// Bytes received so far and the declared file size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadStatus {
    pub received: u64,
    pub total: u64,
}

impl DownloadStatus {
    /// Whole-number percentage, rounded down. An empty file is 100%.
    pub fn percent(&self) -> u64 {
        if self.total == 0 {
            100
        } else {
            self.received.saturating_mul(100) / self.total
        }
    }
}

/// Observer for download progress
pub trait DownloadProgress: Send {
    /// Called after each chunk is written
    fn on_progress(&mut self, file_id: &str, status: DownloadStatus);

    /// Called once after the last chunk
    fn on_complete(&mut self, _file_id: &str, _status: DownloadStatus) {}
}

/// Discards progress
#[derive(Debug, Default)]
pub struct NoProgress;

impl DownloadProgress for NoProgress {
    fn on_progress(&mut self, _file_id: &str, _status: DownloadStatus) {}
}

/// Prints `Download [<id>] at <N>%` and overwrites it in place with `\r`,
/// finishing with a newline-terminated line.
pub struct ConsoleProgress<W> {
    out: W,
}

impl ConsoleProgress<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleProgress<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, line: String) {
        // A closed terminal must not abort the transfer
        if let Err(e) = self.out.write_all(line.as_bytes()).and_then(|_| self.out.flush()) {
            debug!(error = %e, "Failed to write download progress");
        }
    }
}

impl<W: Write + Send> DownloadProgress for ConsoleProgress<W> {
    fn on_progress(&mut self, file_id: &str, status: DownloadStatus) {
        self.emit(format!("Download [{}] at {}%\r", file_id, status.percent()));
    }

    fn on_complete(&mut self, file_id: &str, status: DownloadStatus) {
        self.emit(format!("Download [{}] at {}%\n", file_id, status.percent()));
    }
}

/// Fetch `file_id` in chunks of `chunk_size` bytes.
///
/// The returned cursor is positioned at offset zero. A chunk that comes back
/// empty before the declared size is reached is
/// [`GoogleDriveError::IncompleteDownload`].
#[instrument(skip(session, progress))]
pub async fn download_to_buffer(
    session: &dyn DriveSession,
    file_id: &str,
    chunk_size: u64,
    progress: &mut dyn DownloadProgress,
) -> Result<Cursor<Vec<u8>>> {
    let mut buffer = Cursor::new(Vec::new());
    let mut received = 0u64;

    loop {
        let range = ByteRange::starting_at(received, chunk_size);
        let chunk = session.get_media(file_id, range).await?;
        let chunk_len = chunk.data.len() as u64;
        let total = chunk.total_size.unwrap_or(received + chunk_len);

        if chunk_len == 0 && received < total {
            return Err(GoogleDriveError::IncompleteDownload {
                file_id: file_id.to_string(),
                received,
                total,
            });
        }

        buffer.write_all(&chunk.data)?;
        received += chunk_len;

        let status = DownloadStatus { received, total };
        progress.on_progress(file_id, status);

        if received >= total {
            progress.on_complete(file_id, status);
            break;
        }
    }

    buffer.set_position(0);
    info!(bytes = received, "Download complete");
    Ok(buffer)
}
