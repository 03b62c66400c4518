use std::path::Path;

use tokio::io::AsyncWriteExt;
use tokio_util::io::{StreamReader, SyncIoBridge};

use crate::effects::transport::ByteStream;
use crate::error::{FetchError, Result};

/// Copy a response body into `destination`, replacing any existing file.
///
/// Read failures in the middle of the body surface as I/O errors so the
/// caller's retry loop treats them like any other local I/O failure.
pub(crate) async fn write_stream(stream: ByteStream, destination: &Path) -> Result<u64> {
    let mut reader = StreamReader::new(stream);
    let mut file = tokio::fs::File::create(destination)
        .await
        .map_err(|e| FetchError::io(destination, e))?;

    let written = tokio::io::copy(&mut reader, &mut file)
        .await
        .map_err(|e| FetchError::io(destination, e))?;
    file.flush().await.map_err(|e| FetchError::io(destination, e))?;

    Ok(written)
}

/// Like [`write_stream`], inflating a GZip body on the way to disk.
pub(crate) async fn write_gzip_stream(stream: ByteStream, destination: &Path) -> Result<u64> {
    let reader = SyncIoBridge::new(StreamReader::new(stream));
    let destination = destination.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let mut decoder = flate2::read::GzDecoder::new(reader);
        let mut file =
            std::fs::File::create(&destination).map_err(|e| FetchError::io(&destination, e))?;
        std::io::copy(&mut decoder, &mut file).map_err(|e| FetchError::io(&destination, e))
    })
    .await
    .map_err(|e| FetchError::Worker(e.to_string()))?
}
