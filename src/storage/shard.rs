//! Shard File I/O
//!
//! Input and output files share one format: concatenated `RECORD_LEN`-byte records,
//! no header and no separators.

use std::path::Path;
use tokio::io::{AsyncWriteExt, BufWriter};

use super::record::{RECORD_LEN, Record};
use crate::error::{Result, SortError};

/// Reads a whole shard into memory. The file size must be a multiple of `RECORD_LEN`.
pub async fn read_shard(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;

    if bytes.len() % RECORD_LEN != 0 {
        return Err(SortError::MalformedShard {
            path: path.to_path_buf(),
            len: bytes.len() as u64,
            record_len: RECORD_LEN,
        });
    }

    let records: Vec<Record> = bytes
        .chunks_exact(RECORD_LEN)
        .filter_map(Record::from_slice)
        .collect();

    tracing::debug!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Writes records in the given order, replacing any existing file.
pub async fn write_output(path: impl AsRef<Path>, records: &[Record]) -> Result<()> {
    let path = path.as_ref();
    let file = tokio::fs::File::create(path).await?;
    let mut writer = BufWriter::new(file);

    for record in records {
        writer.write_all(record.as_bytes()).await?;
    }
    writer.flush().await?;
    writer.get_ref().sync_all().await?;

    tracing::debug!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}
