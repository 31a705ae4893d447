// --- Main Conversion Logic ---
//
// One preset in, one `.sfz` document and one sample folder out.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::bank::{Preset, SoundBank};
use crate::error::ConvertError;
use crate::export::{ExportContext, SampleSink, WavSink};
use crate::format::{MappingTables, format_zone};
use crate::sfz::{Region, SfzDocument};

/// Where a bank's generated files go.
///
/// For an output base `Bank` and preset `Grand Piano`:
/// - `<root>/Bank Grand Piano.sfz`
/// - `<root>/Bank Grand Piano Samples/Bank-GrandPiano-<sample>.wav`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
    base_name: String,
}

impl OutputLayout {
    pub fn new(root: PathBuf, base_name: impl Into<String>) -> Self {
        OutputLayout { root, base_name: base_name.into() }
    }

    /// Derives the layout from the output argument: its stem is the base name
    /// and a folder of that name next to it is the root.
    pub fn from_output_path(output: &Path) -> Self {
        let base_name = output
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        let parent = output.parent().unwrap_or_else(|| Path::new(""));
        OutputLayout::new(parent.join(&base_name), base_name)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn sample_folder_name(&self, preset_name: &str) -> String {
        format!("{} {} Samples", self.base_name, path_component(preset_name))
    }

    pub fn sample_folder(&self, preset_name: &str) -> PathBuf {
        self.root.join(self.sample_folder_name(preset_name))
    }

    pub fn document_path(&self, preset_name: &str) -> PathBuf {
        self.root.join(format!("{} {}.sfz", self.base_name, path_component(preset_name)))
    }

    pub fn sample_file_prefix(&self, preset_name: &str) -> String {
        format!("{}-{}-", self.base_name, path_component(&preset_name.replace(' ', "")))
    }
}

/// Makes a preset name safe to embed in a single file or folder name.
/// Separators, control characters and characters Windows rejects become `_`,
/// and a name that would resolve to `.` or `..` is replaced outright.
fn path_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '<' | '>' | '"' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

/// Summary of one converted preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetReport {
    pub preset: String,
    pub document: PathBuf,
    pub regions: usize,
    pub exported_samples: usize,
    pub failed_samples: usize,
}

pub struct Converter<'a, S: SampleSink = WavSink> {
    bank: &'a SoundBank,
    layout: OutputLayout,
    tables: MappingTables,
    sink: S,
}

impl<'a> Converter<'a, WavSink> {
    pub fn new(bank: &'a SoundBank, layout: OutputLayout) -> Self {
        Converter::with_sink(bank, layout, WavSink)
    }
}

impl<'a, S: SampleSink> Converter<'a, S> {
    pub fn with_sink(bank: &'a SoundBank, layout: OutputLayout, sink: S) -> Self {
        Converter {
            bank,
            layout,
            tables: MappingTables::standard(),
            sink,
        }
    }

    /// Converts every preset in bank order. The end-of-presets sentinel
    /// produces no entry; a failing preset does not stop the others.
    pub fn convert_all(&mut self) -> Vec<Result<PresetReport, ConvertError>> {
        let bank = self.bank;
        bank.presets
            .iter()
            .filter_map(|preset| self.convert_preset(preset).transpose())
            .collect()
    }

    /// Writes one preset's sample folder and document. Returns `Ok(None)` for
    /// the end-of-presets sentinel.
    pub fn convert_preset(&mut self, preset: &Preset) -> Result<Option<PresetReport>, ConvertError> {
        if preset.is_sentinel() {
            return Ok(None);
        }
        let bank = self.bank;
        let name = preset.name.trim();
        debug!("Preset {name}: bank {} program {}", preset.bank, preset.program);

        let folder = self.layout.sample_folder(name);
        fs::create_dir_all(&folder).map_err(|source| ConvertError::CreateFolder {
            path: folder.clone(),
            source,
        })?;

        let mut document = SfzDocument::new(name, &self.layout.sample_folder_name(name));
        let global: String = preset
            .global_zones()
            .map(|zone| format_zone(zone, &self.tables))
            .collect();
        document.push_global(&global);

        let mut exports = ExportContext::new(
            folder,
            self.layout.sample_file_prefix(name),
            name.to_string(),
        );

        for instrument_id in preset.instruments() {
            let Some(instrument) = bank.instrument(instrument_id) else {
                warn!("Preset {name} references missing instrument {}", instrument_id.0);
                continue;
            };
            debug!("Preset {name}: instrument {}", instrument.name);
            let instrument_global = instrument.global_zone();

            for zone in &instrument.zones {
                let Some(sample_id) = zone.sample else {
                    continue;
                };
                let Some(sample) = bank.sample(sample_id) else {
                    warn!("Instrument {} references missing sample {}", instrument.name, sample_id.0);
                    continue;
                };
                let Some(sample_file) = exports.sample_file(sample_id, sample, &mut self.sink) else {
                    continue;
                };

                let merged;
                let zone = match instrument_global {
                    Some(global) => {
                        merged = zone.inherit(global);
                        &merged
                    }
                    None => zone,
                };
                let region = Region::synthesize(zone, sample, sample_file, &self.tables);
                document.push_region(&region);
            }
        }

        let path = self.layout.document_path(name);
        fs::write(&path, document.as_str()).map_err(|source| ConvertError::WriteDocument {
            path: path.clone(),
            source,
        })?;
        info!("Preset {name}: {} regions", document.region_count());

        Ok(Some(PresetReport {
            preset: name.to_string(),
            document: path,
            regions: document.region_count(),
            exported_samples: exports.exported(),
            failed_samples: exports.failed(),
        }))
    }
}
