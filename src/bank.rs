// --- Data Structures ---
//
// Read-only object model of a parsed sound bank. Optional zone parameters are
// explicit `Option`s, filled (or left empty) by the parser adapter.

use crate::generator::{GeneratorRecord, Operator};

/// Name of the terminal preset record.
pub const END_OF_PRESETS: &str = "EOP";
/// Name of the terminal instrument record.
pub const END_OF_INSTRUMENTS: &str = "EOI";
/// Name of the terminal sample record.
pub const END_OF_SAMPLES: &str = "EOS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstrumentId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SampleId(pub usize);

#[derive(Debug, Default, Clone)]
pub struct SoundBank {
    pub presets: Vec<Preset>,
    pub instruments: Vec<Instrument>,
    pub samples: Vec<Sample>,
}

impl SoundBank {
    pub fn instrument(&self, id: InstrumentId) -> Option<&Instrument> {
        self.instruments.get(id.0)
    }

    pub fn sample(&self, id: SampleId) -> Option<&Sample> {
        self.samples.get(id.0)
    }
}

#[derive(Debug, Default, Clone)]
pub struct Preset {
    pub name: String,
    /// MIDI program number.
    pub program: u16,
    /// MIDI bank number.
    pub bank: u16,
    pub zones: Vec<Zone>,
}

impl Preset {
    pub fn is_sentinel(&self) -> bool {
        self.name == END_OF_PRESETS
    }

    /// Zones without an instrument reference.
    pub fn global_zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter().filter(|zone| zone.instrument.is_none())
    }

    /// Referenced instruments, in zone order.
    pub fn instruments(&self) -> impl Iterator<Item = InstrumentId> + '_ {
        self.zones.iter().filter_map(|zone| zone.instrument)
    }
}

#[derive(Debug, Default, Clone)]
pub struct Instrument {
    pub name: String,
    pub zones: Vec<Zone>,
}

impl Instrument {
    /// The instrument-level global zone, if the first zone carries no sample.
    pub fn global_zone(&self) -> Option<&Zone> {
        self.zones.first().filter(|zone| zone.sample.is_none())
    }
}

/// How a zone loops its sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    #[default]
    NoLoop,
    Continuous,
    /// Loops while the key is held, then plays to the end.
    UntilRelease,
}

impl LoopMode {
    pub fn from_sample_modes(modes: u16) -> Self {
        match modes & 0b11 {
            1 => LoopMode::Continuous,
            3 => LoopMode::UntilRelease,
            _ => LoopMode::NoLoop,
        }
    }
}

/// Volume envelope as resolved attributes. Times in seconds, sustain in
/// decibels below peak.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VolumeEnvelope {
    pub delay: Option<f64>,
    pub attack: Option<f64>,
    pub hold: Option<f64>,
    pub decay: Option<f64>,
    pub sustain: Option<f64>,
    pub release: Option<f64>,
}

impl VolumeEnvelope {
    fn or(self, other: VolumeEnvelope) -> VolumeEnvelope {
        VolumeEnvelope {
            delay: self.delay.or(other.delay),
            attack: self.attack.or(other.attack),
            hold: self.hold.or(other.hold),
            decay: self.decay.or(other.decay),
            sustain: self.sustain.or(other.sustain),
            release: self.release.or(other.release),
        }
    }
}

/// A parameter scope ("bag").
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Zone {
    pub generators: Vec<GeneratorRecord>,
    pub instrument: Option<InstrumentId>,
    pub sample: Option<SampleId>,
    pub key_range: Option<(u8, u8)>,
    pub velocity_range: Option<(u8, u8)>,
    /// Coarse tuning in semitones.
    pub tuning: Option<i32>,
    /// Fine tuning in cents.
    pub fine_tuning: Option<i32>,
    pub base_note: Option<u8>,
    pub loop_mode: Option<LoopMode>,
    /// Frame offsets added to the sample's own loop points.
    pub loop_start_offset: Option<i32>,
    pub loop_end_offset: Option<i32>,
    pub volume_envelope: VolumeEnvelope,
}

impl Zone {
    pub fn sample_loop(&self) -> bool {
        matches!(self.loop_mode, Some(LoopMode::Continuous | LoopMode::UntilRelease))
    }

    pub fn sample_loop_on_noteoff(&self) -> bool {
        self.loop_mode == Some(LoopMode::UntilRelease)
    }

    /// The last generator record with the given operator.
    pub fn generator(&self, operator: Operator) -> Option<&GeneratorRecord> {
        let id = operator.id();
        self.generators.iter().rev().find(|record| record.operator == id)
    }

    pub fn attribute(&self, attribute: Attribute) -> Option<AttributeValue> {
        let env = &self.volume_envelope;
        let number = |value: Option<f64>| value.map(AttributeValue::Number);
        match attribute {
            Attribute::VolumeEnvelopeDelay => number(env.delay),
            Attribute::VolumeEnvelopeAttack => number(env.attack),
            Attribute::VolumeEnvelopeHold => number(env.hold),
            Attribute::VolumeEnvelopeDecay => number(env.decay),
            Attribute::VolumeEnvelopeSustain => number(env.sustain),
            Attribute::VolumeEnvelopeRelease => number(env.release),
            Attribute::KeyRange => self.key_range.map(|(lo, hi)| AttributeValue::Pair(lo, hi)),
            Attribute::VelocityRange => {
                self.velocity_range.map(|(lo, hi)| AttributeValue::Pair(lo, hi))
            }
        }
    }

    /// Merges this zone over an instrument-level global zone. Local values
    /// win; generators only the global zone sets are inherited.
    pub fn inherit(&self, global: &Zone) -> Zone {
        let mut generators: Vec<GeneratorRecord> = global
            .generators
            .iter()
            .filter(|inherited| {
                !self.generators.iter().any(|local| local.operator == inherited.operator)
            })
            .copied()
            .collect();
        generators.extend_from_slice(&self.generators);

        Zone {
            generators,
            instrument: self.instrument.or(global.instrument),
            sample: self.sample.or(global.sample),
            key_range: self.key_range.or(global.key_range),
            velocity_range: self.velocity_range.or(global.velocity_range),
            tuning: self.tuning.or(global.tuning),
            fine_tuning: self.fine_tuning.or(global.fine_tuning),
            base_note: self.base_note.or(global.base_note),
            loop_mode: self.loop_mode.or(global.loop_mode),
            loop_start_offset: self.loop_start_offset.or(global.loop_start_offset),
            loop_end_offset: self.loop_end_offset.or(global.loop_end_offset),
            volume_envelope: self.volume_envelope.or(global.volume_envelope),
        }
    }
}

/// Named zone attributes that map onto output opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    VolumeEnvelopeDelay,
    VolumeEnvelopeAttack,
    VolumeEnvelopeHold,
    VolumeEnvelopeDecay,
    VolumeEnvelopeSustain,
    VolumeEnvelopeRelease,
    KeyRange,
    VelocityRange,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeValue {
    Number(f64),
    Pair(u8, u8),
}

#[derive(Debug, Default, Clone)]
pub struct Sample {
    pub name: String,
    /// Raw little-endian PCM for `[start, end)`.
    pub data: Vec<u8>,
    /// Bytes per frame of the single channel.
    pub sample_width: u16,
    pub sample_rate: u32,
    pub start: u32,
    pub end: u32,
    /// Loop points relative to `start`.
    pub loop_start: u32,
    pub loop_end: u32,
    pub original_pitch: Option<u8>,
}

impl Sample {
    pub fn is_sentinel(&self) -> bool {
        self.name == END_OF_SAMPLES
    }

    pub fn expected_len(&self) -> usize {
        self.end.saturating_sub(self.start) as usize * self.sample_width as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_mode_from_sample_modes() {
        assert_eq!(LoopMode::from_sample_modes(0), LoopMode::NoLoop);
        assert_eq!(LoopMode::from_sample_modes(1), LoopMode::Continuous);
        assert_eq!(LoopMode::from_sample_modes(2), LoopMode::NoLoop);
        assert_eq!(LoopMode::from_sample_modes(3), LoopMode::UntilRelease);
    }

    #[test]
    fn test_loop_flags() {
        let mut zone = Zone::default();
        assert!(!zone.sample_loop());

        zone.loop_mode = Some(LoopMode::Continuous);
        assert!(zone.sample_loop());
        assert!(!zone.sample_loop_on_noteoff());

        zone.loop_mode = Some(LoopMode::UntilRelease);
        assert!(zone.sample_loop());
        assert!(zone.sample_loop_on_noteoff());
    }

    #[test]
    fn test_inherit_prefers_local_values() {
        let global = Zone {
            generators: vec![
                GeneratorRecord::signed(Operator::Pan, -200),
                GeneratorRecord::signed(Operator::InitialFilterQ, 50),
            ],
            key_range: Some((0, 127)),
            tuning: Some(-12),
            base_note: Some(48),
            volume_envelope: VolumeEnvelope {
                attack: Some(0.5),
                release: Some(1.0),
                ..Default::default()
            },
            ..Default::default()
        };
        let local = Zone {
            generators: vec![GeneratorRecord::signed(Operator::Pan, 300)],
            sample: Some(SampleId(3)),
            key_range: Some((60, 72)),
            volume_envelope: VolumeEnvelope {
                attack: Some(0.01),
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = local.inherit(&global);
        assert_eq!(merged.sample, Some(SampleId(3)));
        assert_eq!(merged.key_range, Some((60, 72)));
        assert_eq!(merged.tuning, Some(-12));
        assert_eq!(merged.base_note, Some(48));
        assert_eq!(merged.volume_envelope.attack, Some(0.01));
        assert_eq!(merged.volume_envelope.release, Some(1.0));
        assert_eq!(merged.generators.len(), 2);
        assert_eq!(merged.generator(Operator::Pan).map(|g| g.amount.as_i16()), Some(300));
        assert!(merged.generator(Operator::InitialFilterQ).is_some());
    }

    #[test]
    fn test_global_zone_detection() {
        let instrument = Instrument {
            name: "Strings".to_string(),
            zones: vec![
                Zone::default(),
                Zone { sample: Some(SampleId(0)), ..Default::default() },
            ],
        };
        assert!(instrument.global_zone().is_some());

        let preset = Preset {
            name: "Strings".to_string(),
            zones: vec![
                Zone::default(),
                Zone { instrument: Some(InstrumentId(0)), ..Default::default() },
            ],
            ..Default::default()
        };
        assert_eq!(preset.global_zones().count(), 1);
        assert_eq!(preset.instruments().collect::<Vec<_>>(), vec![InstrumentId(0)]);
    }

    #[test]
    fn test_expected_len() {
        let sample = Sample {
            sample_width: 2,
            start: 100,
            end: 150,
            ..Default::default()
        };
        assert_eq!(sample.expected_len(), 100);
    }
}
