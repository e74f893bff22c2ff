//! Reading metadata text from files.

use std::path::{Path, PathBuf};

use thiserror::Error;

const TIFF_LITTLE_ENDIAN: [u8; 4] = *b"II*\0";
const TIFF_BIG_ENDIAN: [u8; 4] = *b"MM\0*";

/// Bytes inspected to decide what a file holds.
const HEADER_LEN: usize = 8;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is a TIFF container; its embedded description is not read
    #[error("{0:?} is a TIFF file, extract its OME-XML description first")]
    TiffContainer(PathBuf),

    #[error("{0:?} does not contain OME-XML")]
    NotMetadata(PathBuf),

    #[error("{path:?} is too short ({len} bytes) to hold metadata")]
    TooShort { path: PathBuf, len: usize },
}

/// Kind of file, judged from its first bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Tiff,
    Xml,
    Unknown,
}

/// Classify a file from its leading bytes.
pub fn sniff(bytes: &[u8]) -> FileKind {
    let header = &bytes[..bytes.len().min(HEADER_LEN)];
    if header.starts_with(&TIFF_LITTLE_ENDIAN) || header.starts_with(&TIFF_BIG_ENDIAN) {
        return FileKind::Tiff;
    }

    let text = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let start = text
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(text.len());
    let text = &text[start..];
    if text.starts_with(b"<?xml") || text.starts_with(b"<OME") {
        FileKind::Xml
    } else {
        FileKind::Unknown
    }
}

/// Read the OME-XML text of a bare metadata file.
pub fn read_metadata(path: &Path) -> Result<String, IntakeError> {
    let bytes = std::fs::read(path)?;
    if bytes.len() < TIFF_LITTLE_ENDIAN.len() {
        return Err(IntakeError::TooShort {
            path: path.to_path_buf(),
            len: bytes.len(),
        });
    }

    match sniff(&bytes) {
        FileKind::Tiff => Err(IntakeError::TiffContainer(path.to_path_buf())),
        FileKind::Unknown => Err(IntakeError::NotMetadata(path.to_path_buf())),
        FileKind::Xml => {
            let text = String::from_utf8(bytes).map_err(|_| IntakeError::NotMetadata(path.to_path_buf()))?;
            log::debug!("Read {} bytes of metadata from {:?}", text.len(), path);
            Ok(text.trim_start_matches('\u{feff}').to_string())
        }
    }
}
