//! Static SF2 → SFZ parameter tables.
//!
//! Two tables drive the zone formatter: one keyed by resolved zone
//! [`Attribute`]s and one keyed by generator [`Operator`]s. A handful of
//! operators fan out to a second opcode because SFZ splits concepts that
//! SoundFont keeps together (one modulation LFO, one modulation envelope);
//! those live in [`DUPLICATED_OPCODES`].

use crate::bank::Attribute;
use crate::generator::{Operator, absolute_cents_to_hertz, timecents_to_seconds};

/// Output opcode(s) for one source parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcodes {
    Single(&'static str),
    /// Low/high pair for two-valued attributes.
    Pair(&'static str, &'static str),
}

/// Numeric conversion applied before a value is written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    Identity,
    Negate,
    Scale(f64),
    TimecentsToSeconds,
    AbsoluteCentsToHertz,
    /// Decibels below peak to a linear percentage.
    DecibelsToPercent,
    /// Signed level in dB (zero at peak) to a linear percentage.
    LevelToPercent,
    /// Signed percent decrease (zero at full) to a percentage.
    DecreaseToPercent,
}

impl Transform {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Transform::Identity => value,
            Transform::Negate => -value,
            Transform::Scale(factor) => value * factor,
            Transform::TimecentsToSeconds => timecents_to_seconds(value),
            Transform::AbsoluteCentsToHertz => absolute_cents_to_hertz(value),
            Transform::DecibelsToPercent => decibels_to_percent(value),
            Transform::LevelToPercent => decibels_to_percent(-value),
            Transform::DecreaseToPercent => (100.0 + value).clamp(0.0, 100.0),
        }
    }
}

/// Linear sustain percentage for a level `db` decibels below peak.
pub fn decibels_to_percent(db: f64) -> f64 {
    100.0 * 10f64.powf(-db / 20.0)
}

#[derive(Debug, Clone, Copy)]
pub struct AttributeMapping {
    pub attribute: Attribute,
    pub opcodes: Opcodes,
    pub transform: Transform,
}

#[derive(Debug, Clone, Copy)]
pub struct GeneratorMapping {
    pub operator: Operator,
    pub opcode: &'static str,
    pub transform: Transform,
}

const fn attr(attribute: Attribute, opcodes: Opcodes, transform: Transform) -> AttributeMapping {
    AttributeMapping { attribute, opcodes, transform }
}

const fn generator(operator: Operator, opcode: &'static str, transform: Transform) -> GeneratorMapping {
    GeneratorMapping { operator, opcode, transform }
}

pub static ATTRIBUTE_OPCODES: &[AttributeMapping] = &[
    attr(Attribute::KeyRange, Opcodes::Pair("lokey", "hikey"), Transform::Identity),
    attr(Attribute::VelocityRange, Opcodes::Pair("lovel", "hivel"), Transform::Identity),
    attr(Attribute::VolumeEnvelopeDelay, Opcodes::Single("ampeg_delay"), Transform::Identity),
    attr(Attribute::VolumeEnvelopeAttack, Opcodes::Single("ampeg_attack"), Transform::Identity),
    attr(Attribute::VolumeEnvelopeHold, Opcodes::Single("ampeg_hold"), Transform::Identity),
    attr(Attribute::VolumeEnvelopeDecay, Opcodes::Single("ampeg_decay"), Transform::Identity),
    attr(
        Attribute::VolumeEnvelopeSustain,
        Opcodes::Single("ampeg_sustain"),
        Transform::DecibelsToPercent,
    ),
    attr(Attribute::VolumeEnvelopeRelease, Opcodes::Single("ampeg_release"), Transform::Identity),
];

// Vibrato entries precede the modulation LFO so a dedicated vibrato wins the
// pitch LFO opcodes when both are present.
pub static GENERATOR_OPCODES: &[GeneratorMapping] = &[
    generator(Operator::DelayVolEnv, "ampeg_delay", Transform::TimecentsToSeconds),
    generator(Operator::AttackVolEnv, "ampeg_attack", Transform::TimecentsToSeconds),
    generator(Operator::HoldVolEnv, "ampeg_hold", Transform::TimecentsToSeconds),
    generator(Operator::DecayVolEnv, "ampeg_decay", Transform::TimecentsToSeconds),
    generator(Operator::SustainVolEnv, "ampeg_sustain", Transform::LevelToPercent),
    generator(Operator::ReleaseVolEnv, "ampeg_release", Transform::TimecentsToSeconds),
    generator(Operator::InitialAttenuation, "volume", Transform::Negate),
    generator(Operator::Pan, "pan", Transform::Scale(0.2)),
    generator(Operator::ReverbEffectsSend, "effect1", Transform::Scale(0.1)),
    generator(Operator::ChorusEffectsSend, "effect2", Transform::Scale(0.1)),
    generator(Operator::ScaleTuning, "pitch_keytrack", Transform::Identity),
    generator(Operator::InitialFilterFc, "cutoff", Transform::AbsoluteCentsToHertz),
    generator(Operator::InitialFilterQ, "resonance", Transform::Identity),
    generator(Operator::DelayModEnv, "fileg_delay", Transform::TimecentsToSeconds),
    generator(Operator::AttackModEnv, "fileg_attack", Transform::TimecentsToSeconds),
    generator(Operator::HoldModEnv, "fileg_hold", Transform::TimecentsToSeconds),
    generator(Operator::DecayModEnv, "fileg_decay", Transform::TimecentsToSeconds),
    generator(Operator::SustainModEnv, "fileg_sustain", Transform::DecreaseToPercent),
    generator(Operator::ReleaseModEnv, "fileg_release", Transform::TimecentsToSeconds),
    generator(Operator::ModEnvToFilterFc, "fileg_depth", Transform::Identity),
    generator(Operator::ModEnvToPitch, "pitcheg_depth", Transform::Identity),
    generator(Operator::DelayVibLfo, "pitchlfo_delay", Transform::TimecentsToSeconds),
    generator(Operator::FreqVibLfo, "pitchlfo_freq", Transform::AbsoluteCentsToHertz),
    generator(Operator::VibLfoToPitch, "pitchlfo_depth", Transform::Identity),
    generator(Operator::DelayModLfo, "amplfo_delay", Transform::TimecentsToSeconds),
    generator(Operator::FreqModLfo, "amplfo_freq", Transform::AbsoluteCentsToHertz),
    generator(Operator::ModLfoToVolume, "amplfo_depth", Transform::Identity),
    generator(Operator::ModLfoToFilterFc, "fillfo_depth", Transform::Identity),
    generator(Operator::ModLfoToPitch, "pitchlfo_depth", Transform::Identity),
];

/// Operators that also write a second opcode with the same value.
pub static DUPLICATED_OPCODES: &[(Operator, &str)] = &[
    (Operator::DelayModLfo, "pitchlfo_delay"),
    (Operator::FreqModLfo, "pitchlfo_freq"),
    (Operator::DelayModEnv, "pitcheg_delay"),
    (Operator::AttackModEnv, "pitcheg_attack"),
    (Operator::HoldModEnv, "pitcheg_hold"),
    (Operator::DecayModEnv, "pitcheg_decay"),
    (Operator::SustainModEnv, "pitcheg_sustain"),
    (Operator::ReleaseModEnv, "pitcheg_release"),
];

/// Opcodes that only take effect once a filter type is set.
pub static FILTER_OPCODES: &[&str] = &["cutoff", "resonance", "fil_veltrack"];

/// The filter type written ahead of the first filter opcode in a block.
pub const DEFAULT_FILTER_TYPE: &str = "fil_type=lpf_2p";
