// --- SFZ Generation Logic ---

use log::debug;

use crate::bank::{Sample, Zone};
use crate::format::{MappingTables, format_zone};

/// Crossfade written for every looping region, in seconds.
pub const LOOP_CROSSFADE: f64 = 0.01;

/// Coarse tunings at or beyond this many semitones are treated as garbage.
pub const COARSE_TUNE_LIMIT: i32 = 100;

/// Net tuning in cents, or `None` when it is zero.
pub fn resolve_tune(zone: &Zone) -> Option<i32> {
    let mut coarse = zone.tuning.unwrap_or(0);
    if coarse.abs() >= COARSE_TUNE_LIMIT {
        debug!("Discarding coarse tuning of {coarse} semitones");
        coarse = 0;
    }
    let tune = coarse * 100 + zone.fine_tuning.unwrap_or(0);
    (tune != 0).then_some(tune)
}

/// The zone's root key override, falling back to the sample's original pitch.
pub fn resolve_pitch_center(zone: &Zone, sample: &Sample) -> Option<u8> {
    zone.base_note.or(sample.original_pitch)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSettings {
    pub on_note_off: bool,
    pub start: u32,
    /// Exclusive end frame.
    pub end: u32,
}

impl LoopSettings {
    pub fn mode(&self) -> &'static str {
        if self.on_note_off { "loop_sustain" } else { "loop_continuous" }
    }
}

fn offset_frame(frame: u32, offset: Option<i32>) -> u32 {
    let shifted = frame as i64 + offset.unwrap_or(0) as i64;
    shifted.clamp(0, u32::MAX as i64) as u32
}

pub fn resolve_loop(zone: &Zone, sample: &Sample) -> Option<LoopSettings> {
    if !zone.sample_loop() {
        return None;
    }
    Some(LoopSettings {
        on_note_off: zone.sample_loop_on_noteoff(),
        start: offset_frame(sample.loop_start, zone.loop_start_offset),
        end: offset_frame(sample.loop_end, zone.loop_end_offset),
    })
}

/// One `<region>` block.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub sample_file: String,
    pub parameters: String,
    pub pitch_center: Option<u8>,
    pub tune: Option<i32>,
    pub looping: Option<LoopSettings>,
}

impl Region {
    pub fn synthesize(
        zone: &Zone,
        sample: &Sample,
        sample_file: String,
        tables: &MappingTables,
    ) -> Region {
        Region {
            sample_file,
            parameters: format_zone(zone, tables),
            pitch_center: resolve_pitch_center(zone, sample),
            tune: resolve_tune(zone),
            looping: resolve_loop(zone, sample),
        }
    }

    pub fn render(&self, out: &mut String) {
        out.push_str("<region>\n");
        out.push_str(&format!("sample={}\n", self.sample_file));
        out.push_str(&self.parameters);

        if let Some(key) = self.pitch_center {
            match self.tune {
                Some(tune) => out.push_str(&format!("pitch_keycenter={key} tune={tune}\n")),
                None => out.push_str(&format!("pitch_keycenter={key}\n")),
            }
        }

        if let Some(looping) = &self.looping {
            out.push_str(&format!("loop_mode={}\n", looping.mode()));
            out.push_str(&format!("loop_start={}\n", looping.start));
            out.push_str(&format!("loop_end={}\n", looping.end.saturating_sub(1)));
            out.push_str(&format!("loop_crossfade={LOOP_CROSSFADE}\n"));
        }
        out.push('\n');
    }
}

/// Text of one preset's `.sfz` file.
#[derive(Debug, Clone, Default)]
pub struct SfzDocument {
    text: String,
    regions: usize,
}

impl SfzDocument {
    /// Starts a document with the header comments and a `<control>` block
    /// pointing at `sample_folder`.
    pub fn new(preset_name: &str, sample_folder: &str) -> Self {
        let mut text = String::new();
        text.push_str(&format!("// {preset_name}\n"));
        text.push_str("// Converted from SF2 to SFZ\n\n");
        text.push_str("<control>\n");
        text.push_str(&format!("default_path={sample_folder}/\n\n"));
        SfzDocument { text, regions: 0 }
    }

    /// Appends a `<global>` block unless `parameters` is empty.
    pub fn push_global(&mut self, parameters: &str) {
        if parameters.is_empty() {
            return;
        }
        self.text.push_str("<global>\n");
        self.text.push_str(parameters);
        self.text.push('\n');
    }

    pub fn push_region(&mut self, region: &Region) {
        region.render(&mut self.text);
        self.regions += 1;
    }

    pub fn region_count(&self) -> usize {
        self.regions
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::LoopMode;

    fn tables() -> MappingTables {
        MappingTables::standard()
    }

    fn sample() -> Sample {
        Sample {
            name: "Piano C4".to_string(),
            sample_width: 2,
            sample_rate: 44100,
            start: 0,
            end: 4000,
            loop_start: 1000,
            loop_end: 3000,
            original_pitch: Some(60),
            ..Default::default()
        }
    }

    fn tuned(coarse: Option<i32>, fine: Option<i32>) -> Zone {
        Zone {
            tuning: coarse,
            fine_tuning: fine,
            ..Default::default()
        }
    }

    #[test]
    fn test_tune_combines_coarse_and_fine() {
        assert_eq!(resolve_tune(&tuned(Some(2), Some(-15))), Some(185));
        assert_eq!(resolve_tune(&tuned(Some(-1), None)), Some(-100));
        assert_eq!(resolve_tune(&tuned(None, Some(7))), Some(7));
        assert_eq!(resolve_tune(&tuned(Some(99), Some(1))), Some(9901));
    }

    #[test]
    fn test_tune_discards_out_of_range_coarse() {
        assert_eq!(resolve_tune(&tuned(Some(100), Some(12))), Some(12));
        assert_eq!(resolve_tune(&tuned(Some(-120), Some(-5))), Some(-5));
        assert_eq!(resolve_tune(&tuned(Some(100), None)), None);
    }

    #[test]
    fn test_zero_tune_is_omitted() {
        assert_eq!(resolve_tune(&tuned(None, None)), None);
        assert_eq!(resolve_tune(&tuned(Some(1), Some(-100))), None);
    }

    #[test]
    fn test_pitch_center_fallback_order() {
        let sample = sample();
        let zone = Zone {
            base_note: Some(72),
            ..Default::default()
        };
        assert_eq!(resolve_pitch_center(&zone, &sample), Some(72));
        assert_eq!(resolve_pitch_center(&Zone::default(), &sample), Some(60));

        let unpitched = Sample {
            original_pitch: None,
            ..sample
        };
        assert_eq!(resolve_pitch_center(&Zone::default(), &unpitched), None);
    }

    #[test]
    fn test_loop_modes() {
        let sample = sample();
        let mut zone = Zone {
            loop_mode: Some(LoopMode::Continuous),
            ..Default::default()
        };
        let looping = resolve_loop(&zone, &sample).unwrap();
        assert_eq!(looping.mode(), "loop_continuous");
        assert_eq!((looping.start, looping.end), (1000, 3000));

        zone.loop_mode = Some(LoopMode::UntilRelease);
        assert_eq!(resolve_loop(&zone, &sample).unwrap().mode(), "loop_sustain");

        zone.loop_mode = Some(LoopMode::NoLoop);
        assert_eq!(resolve_loop(&zone, &sample), None);
    }

    #[test]
    fn test_loop_offsets_shift_loop_points() {
        let zone = Zone {
            loop_mode: Some(LoopMode::Continuous),
            loop_start_offset: Some(-1500),
            loop_end_offset: Some(16),
            ..Default::default()
        };
        let looping = resolve_loop(&zone, &sample()).unwrap();
        assert_eq!((looping.start, looping.end), (0, 3016));
    }

    #[test]
    fn test_region_render_looping() {
        let zone = Zone {
            key_range: Some((48, 72)),
            tuning: Some(-1),
            fine_tuning: Some(20),
            loop_mode: Some(LoopMode::UntilRelease),
            ..Default::default()
        };
        let region = Region::synthesize(&zone, &sample(), "Bank-Piano-Piano_C4.wav".to_string(), &tables());

        let mut out = String::new();
        region.render(&mut out);
        assert_eq!(
            out,
            "<region>\n\
             sample=Bank-Piano-Piano_C4.wav\n\
             lokey=48 hikey=72\n\
             pitch_keycenter=60 tune=-80\n\
             loop_mode=loop_sustain\n\
             loop_start=1000\n\
             loop_end=2999\n\
             loop_crossfade=0.01\n\n"
        );
    }

    #[test]
    fn test_region_without_pitch_center_drops_tune() {
        let zone = tuned(Some(1), None);
        let unpitched = Sample {
            original_pitch: None,
            ..sample()
        };
        let region = Region::synthesize(&zone, &unpitched, "a.wav".to_string(), &tables());
        let mut out = String::new();
        region.render(&mut out);
        assert_eq!(out, "<region>\nsample=a.wav\n\n");
    }

    #[test]
    fn test_document_layout() {
        let mut doc = SfzDocument::new("Piano", "Bank Piano Samples");
        doc.push_global("");
        doc.push_global("ampeg_release=0.5\n");
        let region = Region::synthesize(&Zone::default(), &sample(), "p.wav".to_string(), &tables());
        doc.push_region(&region);

        assert_eq!(doc.region_count(), 1);
        assert_eq!(
            doc.as_str(),
            "// Piano\n\
             // Converted from SF2 to SFZ\n\n\
             <control>\n\
             default_path=Bank Piano Samples/\n\n\
             <global>\n\
             ampeg_release=0.5\n\n\
             <region>\n\
             sample=p.wav\n\
             pitch_keycenter=60\n\n"
        );
    }
}
