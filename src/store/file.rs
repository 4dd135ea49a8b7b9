//! Binary file codec for the vector store.
//!
//! File format: vectors.bin
//!
//! Header (47 bytes):
//! - version: u8 (1)
//! - model_id: [u8; 32] (SHA256 hash of model name)
//! - dimensions: u16 (little-endian)
//! - record_count: u64 (little-endian)
//! - checksum: u32 (CRC32 of header fields before checksum)
//!
//! Records (repeated):
//! - id: u32 length (little-endian) + UTF-8 bytes
//! - text: u32 length (little-endian) + UTF-8 bytes
//! - metadata: u8 presence flag, then u32 length + UTF-8 bytes if present
//! - vector: [f32; dimensions] (little-endian)

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use super::{StoreError, StoredRecord};

/// Current file format version
pub(super) const FORMAT_VERSION: u8 = 1;

/// Header size in bytes: version(1) + model_id(32) + dimensions(2) + record_count(8) + checksum(4)
pub(super) const HEADER_SIZE: usize = 47;

/// Longest string field accepted when decoding (guards against reading
/// garbage lengths out of a truncated or corrupted file).
const MAX_FIELD_LEN: u32 = 16 * 1024 * 1024;

/// File header structure.
#[derive(Debug, Clone, Copy)]
pub(super) struct Header {
    pub version: u8,
    pub model_id: [u8; 32],
    pub dimensions: u16,
    pub record_count: u64,
}

/// Read and checksum-validate the header from an open reader.
pub(super) fn read_header(reader: &mut impl Read) -> Result<Header, StoreError> {
    let mut header_bytes = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header_bytes)?;

    let version = header_bytes[0];
    if version > FORMAT_VERSION {
        return Err(StoreError::VersionMismatch(version, FORMAT_VERSION));
    }

    let mut model_id = [0u8; 32];
    model_id.copy_from_slice(&header_bytes[1..33]);

    let dimensions = u16::from_le_bytes([header_bytes[33], header_bytes[34]]);
    let record_count = u64::from_le_bytes(
        header_bytes[35..43]
            .try_into()
            .expect("slice is 8 bytes by construction"),
    );
    let stored_checksum = u32::from_le_bytes(
        header_bytes[43..47]
            .try_into()
            .expect("slice is 4 bytes by construction"),
    );

    let computed_checksum = crc32fast::hash(&header_bytes[0..43]);
    if stored_checksum != computed_checksum {
        return Err(StoreError::ChecksumMismatch);
    }

    Ok(Header {
        version,
        model_id,
        dimensions,
        record_count,
    })
}

/// Validate a header against the values this store was opened with.
pub(super) fn validate_header(
    header: &Header,
    expected_model_id: &[u8; 32],
    expected_dimensions: usize,
) -> Result<(), StoreError> {
    if header.model_id != *expected_model_id {
        return Err(StoreError::ModelMismatch);
    }
    if header.dimensions as usize != expected_dimensions {
        return Err(StoreError::DimensionMismatch {
            expected: expected_dimensions,
            got: header.dimensions as usize,
        });
    }
    Ok(())
}

/// Read the header of a store file on disk.
pub(super) fn read_header_from(path: &Path) -> Result<Header, StoreError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    read_header(&mut reader)
}

/// Read all records following the header.
pub(super) fn read_records(
    reader: &mut impl Read,
    header: &Header,
) -> Result<Vec<StoredRecord>, StoreError> {
    let dimensions = header.dimensions as usize;
    let mut records = Vec::with_capacity(header.record_count as usize);

    for _ in 0..header.record_count {
        let id = read_string(reader)?;
        let text = read_string(reader)?;

        let mut flag = [0u8; 1];
        reader.read_exact(&mut flag)?;
        let metadata = if flag[0] == 1 {
            Some(read_string(reader)?)
        } else {
            None
        };

        let mut vector = Vec::with_capacity(dimensions);
        let mut float_bytes = [0u8; 4];
        for _ in 0..dimensions {
            reader.read_exact(&mut float_bytes)?;
            vector.push(f32::from_le_bytes(float_bytes));
        }

        records.push(StoredRecord {
            id,
            text,
            metadata,
            vector,
        });
    }

    Ok(records)
}

/// Write a complete store file: header plus every record.
///
/// Callers are expected to write to a temp path and rename; this function
/// flushes and fsyncs before returning.
pub(super) fn write_store(
    path: &Path,
    model_id: &[u8; 32],
    dimensions: usize,
    records: &[StoredRecord],
) -> Result<(), StoreError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    write_header(
        &mut writer,
        &Header {
            version: FORMAT_VERSION,
            model_id: *model_id,
            dimensions: dimensions as u16,
            record_count: records.len() as u64,
        },
    )?;

    for record in records {
        write_string(&mut writer, &record.id)?;
        write_string(&mut writer, &record.text)?;
        match &record.metadata {
            Some(metadata) => {
                writer.write_all(&[1u8])?;
                write_string(&mut writer, metadata)?;
            }
            None => writer.write_all(&[0u8])?,
        }
        for &value in &record.vector {
            writer.write_all(&value.to_le_bytes())?;
        }
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    Ok(())
}

fn write_header(writer: &mut impl Write, header: &Header) -> Result<(), StoreError> {
    let mut header_bytes = [0u8; HEADER_SIZE];

    header_bytes[0] = header.version;
    header_bytes[1..33].copy_from_slice(&header.model_id);
    header_bytes[33..35].copy_from_slice(&header.dimensions.to_le_bytes());
    header_bytes[35..43].copy_from_slice(&header.record_count.to_le_bytes());

    let checksum = crc32fast::hash(&header_bytes[0..43]);
    header_bytes[43..47].copy_from_slice(&checksum.to_le_bytes());

    writer.write_all(&header_bytes)?;
    Ok(())
}

fn read_string(reader: &mut impl Read) -> Result<String, StoreError> {
    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes)?;
    let len = u32::from_le_bytes(len_bytes);
    if len > MAX_FIELD_LEN {
        return Err(StoreError::InvalidFormat(format!(
            "string field of {} bytes exceeds limit",
            len
        )));
    }

    let mut bytes = vec![0u8; len as usize];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes)
        .map_err(|e| StoreError::InvalidFormat(format!("invalid UTF-8 in record: {}", e)))
}

fn write_string(writer: &mut impl Write, value: &str) -> Result<(), StoreError> {
    writer.write_all(&(value.len() as u32).to_le_bytes())?;
    writer.write_all(value.as_bytes())?;
    Ok(())
}
