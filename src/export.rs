// --- Sample Export ---
//
// Each preset gets its own `ExportContext`: samples are written once per
// preset no matter how many zones use them, and file names never collide
// within the preset's sample folder.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::bank::{Sample, SampleId};
use crate::error::ExportError;

/// File name used in a region when its sample could not be written.
pub const UNKNOWN_SAMPLE: &str = "UNKNOWN";

/// Replaces every character outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

/// Destination for exported sample audio.
pub trait SampleSink {
    fn write_sample(&mut self, path: &Path, sample: &Sample) -> Result<(), ExportError>;
}

/// Writes mono PCM WAV files.
#[derive(Debug, Default, Clone, Copy)]
pub struct WavSink;

impl SampleSink for WavSink {
    fn write_sample(&mut self, path: &Path, sample: &Sample) -> Result<(), ExportError> {
        write_wav(path, sample)
    }
}

/// Writes `sample.data` as a mono WAV at the sample's width and rate. A
/// buffer whose length disagrees with the sample's frame range is written
/// anyway after a warning.
pub fn write_wav(path: &Path, sample: &Sample) -> Result<(), ExportError> {
    let expected = sample.expected_len();
    if sample.data.len() != expected {
        warn!(
            "Sample '{}' expected {} bytes, got {} bytes",
            sample.name,
            expected,
            sample.data.len()
        );
    }

    let width = sample.sample_width;
    if !(1..=4).contains(&width) {
        return Err(ExportError::UnsupportedSampleWidth(width));
    }

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: sample.sample_rate,
        bits_per_sample: width * 8,
        sample_format: hound::SampleFormat::Int,
    };
    let file = File::create(path)?;
    let mut writer = hound::WavWriter::new(BufWriter::new(file), spec)?;

    let frames = sample.data.chunks_exact(width as usize);
    let leftover = frames.remainder().len();
    for frame in frames {
        match frame {
            [unsigned] => writer.write_sample((*unsigned as i16 - 128) as i8)?,
            [lo, hi] => writer.write_sample(i16::from_le_bytes([*lo, *hi]))?,
            // Shift into the top bytes and back down to sign-extend.
            [lo, mid, hi] => writer.write_sample(i32::from_le_bytes([0, *lo, *mid, *hi]) >> 8)?,
            [b0, b1, b2, b3] => writer.write_sample(i32::from_le_bytes([*b0, *b1, *b2, *b3]))?,
            _ => unreachable!("frame width is checked above"),
        }
    }
    if leftover > 0 {
        warn!("Sample '{}': dropped {} trailing bytes", sample.name, leftover);
    }

    writer.finalize()?;
    debug!("Wrote {:?}", path);
    Ok(())
}

/// Per-preset bookkeeping for exported samples.
#[derive(Debug)]
pub struct ExportContext {
    folder: PathBuf,
    file_prefix: String,
    preset_name: String,
    files: HashMap<SampleId, String>,
    used_names: HashMap<String, u32>,
    exported: usize,
    failed: usize,
}

impl ExportContext {
    /// `file_prefix` is prepended to every sample file name.
    pub fn new(folder: PathBuf, file_prefix: String, preset_name: String) -> Self {
        ExportContext {
            folder,
            file_prefix,
            preset_name,
            files: HashMap::new(),
            used_names: HashMap::new(),
            exported: 0,
            failed: 0,
        }
    }

    pub fn exported(&self) -> usize {
        self.exported
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Returns `base` the first time it is seen, then `base-2`, `base-3`, ...
    pub fn unique_base_name(&mut self, base: &str) -> String {
        match self.used_names.get_mut(base) {
            Some(count) => {
                *count += 1;
                format!("{base}-{count}")
            }
            None => {
                self.used_names.insert(base.to_string(), 1);
                base.to_string()
            }
        }
    }

    /// The file name a region should reference for `sample`, exporting it on
    /// first use. Sentinel samples yield `None`. Export failures are logged
    /// and yield [`UNKNOWN_SAMPLE`].
    pub fn sample_file<S: SampleSink + ?Sized>(
        &mut self,
        id: SampleId,
        sample: &Sample,
        sink: &mut S,
    ) -> Option<String> {
        if sample.is_sentinel() {
            return None;
        }
        if let Some(existing) = self.files.get(&id) {
            return Some(existing.clone());
        }

        let base = self.unique_base_name(&sanitize_filename(sample.name.trim()));
        let mut file_name = format!("{}{}.wav", self.file_prefix, base);
        let path = self.folder.join(&file_name);
        match sink.write_sample(&path, sample) {
            Ok(()) => self.exported += 1,
            Err(err) => {
                warn!(
                    "Failed to export sample for preset {} ({}): {}",
                    self.preset_name, sample.name, err
                );
                self.failed += 1;
                file_name = UNKNOWN_SAMPLE.to_string();
            }
        }
        self.files.insert(id, file_name.clone());
        Some(file_name)
    }
}
