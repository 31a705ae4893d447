// --- Error Types ---

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors raised while decoding a SoundFont file.
#[derive(Debug, Error)]
pub enum Sf2Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid file format: Expected RIFF header but found '{0}'")]
    InvalidRiffHeader(String),
    #[error("Invalid file format: Expected sfbk signature but found '{0}' (not a SoundFont 2 file)")]
    InvalidSfbkSignature(String),
    #[error("Missing required '{0}' chunk")]
    MissingRequiredChunk(&'static str),
    #[error("Corrupted '{0}' chunk: {1}")]
    CorruptedChunk(&'static str, String),
    #[error("Malformed record in '{chunk}' chunk: {source}")]
    Record {
        chunk: &'static str,
        #[source]
        source: binrw::Error,
    },
}

/// Per-sample export failures. These never abort a preset.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("WAV writer error: {0}")]
    Wav(#[from] hound::Error),
    #[error("Unsupported sample width of {0} bytes")]
    UnsupportedSampleWidth(u16),
}

/// Failures writing a preset's document or sample folder.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Failed to create folder {path:?}: {source}")]
    CreateFolder {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write document {path:?}: {source}")]
    WriteDocument {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
