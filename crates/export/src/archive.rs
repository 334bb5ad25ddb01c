use std::io::Write;

use ampere_core::FieldRecord;
use flate2::write::GzEncoder;
use flate2::Compression;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Pack every record as a standalone pretty-printed JSON file
/// (`bill_<n>_extracted.json`, 1-based) into a gzip-compressed tarball.
pub fn write_json_archive<W: Write>(
    records: &[FieldRecord],
    writer: W,
) -> Result<(), ArchiveError> {
    let encoder = GzEncoder::new(writer, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (idx, record) in records.iter().enumerate() {
        let json = serde_json::to_vec_pretty(record)?;
        let mut header = tar::Header::new_gnu();
        header.set_size(json.len() as u64);
        header.set_mode(0o644);
        builder.append_data(
            &mut header,
            format!("bill_{}_extracted.json", idx + 1),
            json.as_slice(),
        )?;
    }

    builder.into_inner()?.finish()?;
    Ok(())
}
