//! Generator resolution.
//!
//! A SoundFont zone carries its synthesis parameters as raw `(operator, amount)`
//! records. This module turns one record into a value with a known unit. Every
//! supported operator has exactly one [`UnitDescriptor`]; ids outside the
//! closed [`Operator`] set resolve to `None` and are ignored by callers.

/// Frames represented by one unit of a coarse address offset.
pub const COARSE_OFFSET_FRAMES: i32 = 32768;

/// Raw two-byte generator amount, little-endian as stored in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenAmount(pub [u8; 2]);

impl GenAmount {
    pub fn from_i16(value: i16) -> Self {
        GenAmount(value.to_le_bytes())
    }

    pub fn from_range(low: u8, high: u8) -> Self {
        GenAmount([low, high])
    }

    pub fn as_i16(self) -> i16 {
        i16::from_le_bytes(self.0)
    }

    pub fn as_u16(self) -> u16 {
        u16::from_le_bytes(self.0)
    }

    pub fn as_range(self) -> (u8, u8) {
        (self.0[0], self.0[1])
    }
}

/// One generator record as attached to a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorRecord {
    pub operator: u16,
    pub amount: GenAmount,
}

impl GeneratorRecord {
    pub fn new(operator: Operator, amount: GenAmount) -> Self {
        GeneratorRecord { operator: operator.id(), amount }
    }

    pub fn signed(operator: Operator, value: i16) -> Self {
        Self::new(operator, GenAmount::from_i16(value))
    }

    pub fn range(operator: Operator, low: u8, high: u8) -> Self {
        Self::new(operator, GenAmount::from_range(low, high))
    }

    /// The operator, if it belongs to the supported set.
    pub fn kind(&self) -> Option<Operator> {
        Operator::from_id(self.operator)
    }

    pub fn resolve(&self) -> Option<GeneratorValue> {
        resolve(self.operator, self.amount)
    }
}

macro_rules! operators {
    ($($name:ident = $id:literal),* $(,)?) => {
        /// Closed set of generator operators understood by the converter.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Operator {
            $($name),*
        }

        impl Operator {
            pub const ALL: &'static [Operator] = &[$(Operator::$name),*];

            pub fn from_id(id: u16) -> Option<Self> {
                match id {
                    $($id => Some(Operator::$name),)*
                    _ => None,
                }
            }

            pub const fn id(self) -> u16 {
                match self {
                    $(Operator::$name => $id),*
                }
            }
        }
    };
}

operators! {
    StartAddrsOffset = 0,
    EndAddrsOffset = 1,
    StartloopAddrsOffset = 2,
    EndloopAddrsOffset = 3,
    StartAddrsCoarseOffset = 4,
    ModLfoToPitch = 5,
    VibLfoToPitch = 6,
    ModEnvToPitch = 7,
    InitialFilterFc = 8,
    InitialFilterQ = 9,
    ModLfoToFilterFc = 10,
    ModEnvToFilterFc = 11,
    EndAddrsCoarseOffset = 12,
    ModLfoToVolume = 13,
    ChorusEffectsSend = 15,
    ReverbEffectsSend = 16,
    Pan = 17,
    DelayModLfo = 21,
    FreqModLfo = 22,
    DelayVibLfo = 23,
    FreqVibLfo = 24,
    DelayModEnv = 25,
    AttackModEnv = 26,
    HoldModEnv = 27,
    DecayModEnv = 28,
    SustainModEnv = 29,
    ReleaseModEnv = 30,
    KeynumToModEnvHold = 31,
    KeynumToModEnvDecay = 32,
    DelayVolEnv = 33,
    AttackVolEnv = 34,
    HoldVolEnv = 35,
    DecayVolEnv = 36,
    SustainVolEnv = 37,
    ReleaseVolEnv = 38,
    KeynumToVolEnvHold = 39,
    KeynumToVolEnvDecay = 40,
    Instrument = 41,
    KeyRange = 43,
    VelRange = 44,
    StartloopAddrsCoarseOffset = 45,
    Keynum = 46,
    Velocity = 47,
    InitialAttenuation = 48,
    EndloopAddrsCoarseOffset = 50,
    CoarseTune = 51,
    FineTune = 52,
    SampleId = 53,
    SampleModes = 54,
    ScaleTuning = 56,
    ExclusiveClass = 57,
    OverridingRootKey = 58,
}

/// Unit a raw amount is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// Sample frames.
    Offset,
    /// Multiples of [`COARSE_OFFSET_FRAMES`]; returned unscaled.
    CoarseOffset,
    /// Relative pitch in cents.
    Cents,
    /// Time in timecents; `seconds = 2^(tc / 1200)`.
    Timecents,
    /// Absolute frequency in cents above 8.176 Hz.
    AbsoluteCents,
    /// Centibels, scaled to decibels.
    Centibels,
    /// Sustain decrease from full level, sign-flipped into a level.
    Sustain,
    Passthrough,
    Range,
    Index,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitDescriptor {
    pub kind: UnitKind,
    /// The raw amount is divided by this to reach the semantic unit.
    pub divisor: f64,
}

impl UnitDescriptor {
    const fn new(kind: UnitKind, divisor: f64) -> Self {
        UnitDescriptor { kind, divisor }
    }
}

/// A generator amount in its semantic unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeneratorValue {
    Offset(i32),
    /// Cents or timecents.
    Cents(f64),
    AbsoluteCents(f64),
    Decibels(f64),
    /// Level relative to full scale: dB for the volume envelope, percent
    /// for the modulation envelope. Zero is full level.
    Sustain(f64),
    Amount(i32),
    Range(u8, u8),
    Index(u16),
}

impl GeneratorValue {
    /// Scalar view of the value. Ranges have none.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            GeneratorValue::Offset(v) | GeneratorValue::Amount(v) => Some(v as f64),
            GeneratorValue::Cents(v)
            | GeneratorValue::AbsoluteCents(v)
            | GeneratorValue::Decibels(v)
            | GeneratorValue::Sustain(v) => Some(v),
            GeneratorValue::Index(v) => Some(v as f64),
            GeneratorValue::Range(..) => None,
        }
    }
}

impl Operator {
    pub const fn descriptor(self) -> UnitDescriptor {
        use Operator::*;
        use UnitKind as U;
        match self {
            StartAddrsOffset | EndAddrsOffset | StartloopAddrsOffset | EndloopAddrsOffset => {
                UnitDescriptor::new(U::Offset, 1.0)
            }
            StartAddrsCoarseOffset
            | EndAddrsCoarseOffset
            | StartloopAddrsCoarseOffset
            | EndloopAddrsCoarseOffset => UnitDescriptor::new(U::CoarseOffset, 1.0),
            ModLfoToPitch | VibLfoToPitch | ModEnvToPitch | ModLfoToFilterFc | ModEnvToFilterFc => {
                UnitDescriptor::new(U::Cents, 1.0)
            }
            DelayModLfo | DelayVibLfo | DelayModEnv | AttackModEnv | HoldModEnv | DecayModEnv
            | ReleaseModEnv | DelayVolEnv | AttackVolEnv | HoldVolEnv | DecayVolEnv
            | ReleaseVolEnv => UnitDescriptor::new(U::Timecents, 1.0),
            InitialFilterFc | FreqModLfo | FreqVibLfo => UnitDescriptor::new(U::AbsoluteCents, 1.0),
            InitialFilterQ | ModLfoToVolume | InitialAttenuation => {
                UnitDescriptor::new(U::Centibels, 10.0)
            }
            SustainModEnv | SustainVolEnv => UnitDescriptor::new(U::Sustain, -10.0),
            ChorusEffectsSend | ReverbEffectsSend | Pan | KeynumToModEnvHold
            | KeynumToModEnvDecay | KeynumToVolEnvHold | KeynumToVolEnvDecay | Keynum
            | Velocity | CoarseTune | FineTune | SampleModes | ScaleTuning | ExclusiveClass
            | OverridingRootKey => UnitDescriptor::new(U::Passthrough, 1.0),
            KeyRange | VelRange => UnitDescriptor::new(U::Range, 1.0),
            Instrument | SampleId => UnitDescriptor::new(U::Index, 1.0),
        }
    }

    pub fn resolve(self, amount: GenAmount) -> GeneratorValue {
        let UnitDescriptor { kind, divisor } = self.descriptor();
        let raw = amount.as_i16();
        let scaled = raw as f64 / divisor;
        match kind {
            UnitKind::Offset | UnitKind::CoarseOffset => GeneratorValue::Offset(raw as i32),
            UnitKind::Cents | UnitKind::Timecents => GeneratorValue::Cents(scaled),
            UnitKind::AbsoluteCents => GeneratorValue::AbsoluteCents(scaled),
            UnitKind::Centibels => GeneratorValue::Decibels(scaled),
            UnitKind::Sustain => GeneratorValue::Sustain(scaled),
            UnitKind::Passthrough => GeneratorValue::Amount(raw as i32),
            UnitKind::Range => {
                let (low, high) = amount.as_range();
                GeneratorValue::Range(low, high)
            }
            UnitKind::Index => GeneratorValue::Index(amount.as_u16()),
        }
    }
}

/// Resolves one raw generator record. Unknown operators yield `None`.
pub fn resolve(operator: u16, amount: GenAmount) -> Option<GeneratorValue> {
    Operator::from_id(operator).map(|op| op.resolve(amount))
}

pub fn timecents_to_seconds(timecents: f64) -> f64 {
    2f64.powf(timecents / 1200.0)
}

pub fn absolute_cents_to_hertz(cents: f64) -> f64 {
    8.176 * 2f64.powf(cents / 1200.0)
}

/// Combines a fine and a coarse address offset into frames.
pub fn combine_offsets(fine: i32, coarse: i32) -> i32 {
    fine + coarse * COARSE_OFFSET_FRAMES
}
