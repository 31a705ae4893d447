// --- SoundFont 2 Parsing ---
//
// Walks the RIFF container with `byteorder`, decodes the fixed-size `pdta`
// records with `binrw`, and assembles the read-only `SoundBank` model.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::ops::Range;
use std::path::Path;
use std::str;

use binrw::BinRead;
use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, info, warn};

use crate::bank::{
    END_OF_INSTRUMENTS, Instrument, InstrumentId, LoopMode, Preset, Sample, SampleId, SoundBank,
    VolumeEnvelope, Zone,
};
use crate::error::Sf2Error;
use crate::generator::{GenAmount, GeneratorRecord, Operator, combine_offsets, timecents_to_seconds};

type Result<T> = std::result::Result<T, Sf2Error>;

const PRESET_HEADER_SIZE: usize = 38;
const BAG_SIZE: usize = 4;
const MODULATOR_SIZE: usize = 10;
const GENERATOR_SIZE: usize = 4;
const INSTRUMENT_HEADER_SIZE: usize = 22;
const SAMPLE_HEADER_SIZE: usize = 46;

/// Original pitch value meaning "unpitched".
const UNPITCHED: u8 = 255;

#[derive(Debug)]
struct RiffChunkHeader {
    id: String,
    size: u32,
}

#[derive(Debug, BinRead)]
#[br(little)]
struct PresetHeader {
    #[br(map = |raw: [u8; 20]| decode_name(&raw))]
    name: String,
    preset: u16,
    bank: u16,
    // library, genre and morphology are reserved
    #[br(pad_after = 12)]
    bag_index: u16,
}

#[derive(Debug, BinRead)]
#[br(little)]
struct InstrumentHeader {
    #[br(map = |raw: [u8; 20]| decode_name(&raw))]
    name: String,
    bag_index: u16,
}

#[derive(Debug, Clone, Copy, BinRead)]
#[br(little)]
struct Bag {
    generator_index: u16,
    modulator_index: u16,
}

#[derive(Debug, Clone, Copy, BinRead)]
#[br(little)]
struct GeneratorData {
    operator: u16,
    #[br(map = |raw: [u8; 2]| GenAmount(raw))]
    amount: GenAmount,
}

#[derive(Debug, BinRead)]
#[br(little)]
struct ModulatorData {
    _source: u16,
    destination: u16,
    _amount: i16,
    _amount_source: u16,
    _transform: u16,
}

#[derive(Debug, BinRead)]
#[br(little)]
struct SampleHeader {
    #[br(map = |raw: [u8; 20]| decode_name(&raw))]
    name: String,
    start: u32,
    end: u32,
    loop_start: u32,
    loop_end: u32,
    sample_rate: u32,
    // pitch correction, sample link and sample type are not used
    #[br(pad_after = 5)]
    original_pitch: u8,
}

/// Names stored as 20 bytes, NUL-terminated unless full length.
fn decode_name(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

fn read_fourcc<R: Read>(reader: &mut R) -> Result<String> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(str::from_utf8(&buf).unwrap_or("????").to_string())
}

fn read_chunk_header<R: Read>(reader: &mut R) -> Result<RiffChunkHeader> {
    let id = read_fourcc(reader)?;
    let size = reader.read_u32::<LittleEndian>()?;
    Ok(RiffChunkHeader { id, size })
}

/// Static name for the sub-chunks the reader keeps.
fn known_chunk(id: &str) -> Option<&'static str> {
    const KNOWN: [&str; 11] = [
        "smpl", "sm24", "phdr", "pbag", "pmod", "pgen", "inst", "ibag", "imod", "igen", "shdr",
    ];
    KNOWN.iter().copied().find(|known| *known == id)
}

fn skip_padded<R: Seek>(reader: &mut R, size: u32) -> Result<()> {
    reader.seek(SeekFrom::Current(size as i64 + (size & 1) as i64))?;
    Ok(())
}

/// Raw chunk payloads of the `sdta` and `pdta` lists, keyed by chunk id.
#[derive(Debug, Default)]
struct RawChunks(HashMap<&'static str, Vec<u8>>);

impl RawChunks {
    fn required(&mut self, id: &'static str) -> Result<Vec<u8>> {
        self.0.remove(id).ok_or(Sf2Error::MissingRequiredChunk(id))
    }

    fn optional(&mut self, id: &'static str) -> Option<Vec<u8>> {
        self.0.remove(id)
    }
}

fn validate_riff_header<R: Read>(reader: &mut R) -> Result<u32> {
    let riff = read_fourcc(reader)
        .map_err(|_| Sf2Error::CorruptedChunk("RIFF", "Failed to read RIFF signature".to_string()))?;
    if riff != "RIFF" {
        return Err(Sf2Error::InvalidRiffHeader(riff));
    }
    let size = reader.read_u32::<LittleEndian>()?;
    let form = read_fourcc(reader)
        .map_err(|_| Sf2Error::CorruptedChunk("sfbk", "Failed to read sfbk signature".to_string()))?;
    if form != "sfbk" {
        return Err(Sf2Error::InvalidSfbkSignature(form));
    }
    Ok(size)
}

fn parse_list<R: Read + Seek>(reader: &mut R, end_pos: u64, chunks: &mut RawChunks) -> Result<()> {
    while reader.stream_position()? + 8 <= end_pos {
        let header = read_chunk_header(reader)?;
        let Some(id) = known_chunk(&header.id) else {
            debug!("Skipping unknown chunk '{}'", header.id);
            skip_padded(reader, header.size)?;
            continue;
        };

        let mut data = Vec::new();
        reader.by_ref().take(header.size as u64).read_to_end(&mut data)?;
        if data.len() != header.size as usize {
            return Err(Sf2Error::CorruptedChunk(
                id,
                format!("expected {} bytes, found {}", header.size, data.len()),
            ));
        }
        if header.size & 1 == 1 {
            reader.seek(SeekFrom::Current(1))?;
        }
        chunks.0.insert(id, data);
    }
    Ok(())
}

fn parse_top_level_chunks<R: Read + Seek>(reader: &mut R, end_pos: u64) -> Result<RawChunks> {
    let mut chunks = RawChunks::default();
    while reader.stream_position()? + 8 <= end_pos {
        let header = read_chunk_header(reader)?;
        if header.id != "LIST" {
            debug!("Skipping top-level chunk '{}'", header.id);
            skip_padded(reader, header.size)?;
            continue;
        }

        let list_end = reader.stream_position()? + header.size as u64;
        let list_type = read_fourcc(reader)?;
        match list_type.as_str() {
            "sdta" | "pdta" => parse_list(reader, list_end.min(end_pos), &mut chunks)?,
            _ => debug!("Skipping '{}' list", list_type),
        }
        reader.seek(SeekFrom::Start(list_end + (header.size & 1) as u64))?;
    }
    Ok(chunks)
}

fn read_records<T>(chunk: &'static str, data: &[u8], record_size: usize) -> Result<Vec<T>>
where
    T: for<'a> BinRead<Args<'a> = ()>,
{
    if data.len() % record_size != 0 {
        return Err(Sf2Error::CorruptedChunk(
            chunk,
            format!("size {} is not a multiple of {}", data.len(), record_size),
        ));
    }
    let mut cursor = Cursor::new(data);
    (0..data.len() / record_size)
        .map(|_| T::read_le(&mut cursor).map_err(|source| Sf2Error::Record { chunk, source }))
        .collect()
}

/// Bag indices `[start, end)` of header `index`, given each header's first bag.
fn bag_range(starts: &[u16], index: usize, bag_count: usize, chunk: &'static str) -> Result<Range<usize>> {
    let start = starts[index] as usize;
    let end = starts.get(index + 1).map_or(start, |&next| next as usize);
    // The last bag is a terminator and owns no zone.
    if start > end || (end > start && end >= bag_count) {
        return Err(Sf2Error::CorruptedChunk(
            chunk,
            format!("bag range {start}..{end} out of bounds ({bag_count} bags)"),
        ));
    }
    Ok(start..end)
}

fn build_zones(
    bags: &[Bag],
    generators: &[GeneratorData],
    modulator_count: usize,
    range: Range<usize>,
    chunk: &'static str,
) -> Result<Vec<Zone>> {
    range
        .map(|index| {
            let bag = bags[index];
            let next = bags[index + 1];
            let first = bag.generator_index as usize;
            let last = next.generator_index as usize;
            if first > last || last > generators.len() {
                return Err(Sf2Error::CorruptedChunk(
                    chunk,
                    format!("generator range {first}..{last} out of bounds"),
                ));
            }
            if bag.modulator_index as usize > modulator_count {
                return Err(Sf2Error::CorruptedChunk(
                    chunk,
                    format!("modulator index {} out of bounds", bag.modulator_index),
                ));
            }
            let records = generators[first..last]
                .iter()
                .map(|g| GeneratorRecord { operator: g.operator, amount: g.amount })
                .collect();
            Ok(zone_from_generators(records))
        })
        .collect()
}

/// Fills the zone's resolved attributes from its generator records. Later
/// records for the same operator override earlier ones.
pub fn zone_from_generators(generators: Vec<GeneratorRecord>) -> Zone {
    let mut zone = Zone::default();
    let mut envelope = VolumeEnvelope::default();
    let mut start_loop = (None, None);
    let mut end_loop = (None, None);

    for record in &generators {
        let Some(operator) = record.kind() else {
            continue;
        };
        let amount = record.amount;
        let value = amount.as_i16();
        let seconds = || Some(timecents_to_seconds(value as f64));
        match operator {
            Operator::KeyRange => zone.key_range = Some(amount.as_range()),
            Operator::VelRange => zone.velocity_range = Some(amount.as_range()),
            Operator::Instrument => zone.instrument = Some(InstrumentId(amount.as_u16() as usize)),
            Operator::SampleId => zone.sample = Some(SampleId(amount.as_u16() as usize)),
            Operator::CoarseTune => zone.tuning = Some(value as i32),
            Operator::FineTune => zone.fine_tuning = Some(value as i32),
            Operator::OverridingRootKey => {
                zone.base_note = (0..=127).contains(&value).then_some(value as u8);
            }
            Operator::SampleModes => {
                zone.loop_mode = Some(LoopMode::from_sample_modes(amount.as_u16()));
            }
            Operator::DelayVolEnv => envelope.delay = seconds(),
            Operator::AttackVolEnv => envelope.attack = seconds(),
            Operator::HoldVolEnv => envelope.hold = seconds(),
            Operator::DecayVolEnv => envelope.decay = seconds(),
            Operator::SustainVolEnv => envelope.sustain = Some(value as f64 / 10.0),
            Operator::ReleaseVolEnv => envelope.release = seconds(),
            Operator::StartloopAddrsOffset => start_loop.0 = Some(value as i32),
            Operator::StartloopAddrsCoarseOffset => start_loop.1 = Some(value as i32),
            Operator::EndloopAddrsOffset => end_loop.0 = Some(value as i32),
            Operator::EndloopAddrsCoarseOffset => end_loop.1 = Some(value as i32),
            _ => {}
        }
    }

    let loop_offset = |(fine, coarse): (Option<i32>, Option<i32>)| {
        (fine.is_some() || coarse.is_some())
            .then(|| combine_offsets(fine.unwrap_or(0), coarse.unwrap_or(0)))
    };
    zone.loop_start_offset = loop_offset(start_loop);
    zone.loop_end_offset = loop_offset(end_loop);
    zone.volume_envelope = envelope;
    zone.generators = generators;
    zone
}

fn build_sample(header: &SampleHeader, smpl: &[u8], sm24: Option<&[u8]>) -> Sample {
    let frames = smpl.len() / 2;
    let start = (header.start as usize).min(frames);
    let end = (header.end as usize).clamp(start, frames);
    if start != header.start as usize || end != header.end as usize {
        warn!(
            "Sample '{}' range {}..{} exceeds the {} frame sample pool",
            header.name, header.start, header.end, frames
        );
    }

    let (data, sample_width) = match sm24 {
        Some(low_bytes) => {
            let mut data = Vec::with_capacity((end - start) * 3);
            for frame in start..end {
                data.push(low_bytes.get(frame).copied().unwrap_or(0));
                data.extend_from_slice(&smpl[frame * 2..frame * 2 + 2]);
            }
            (data, 3)
        }
        None => (smpl[start * 2..end * 2].to_vec(), 2),
    };

    Sample {
        name: header.name.clone(),
        data,
        sample_width,
        sample_rate: header.sample_rate,
        start: header.start,
        end: header.end,
        loop_start: header.loop_start.saturating_sub(header.start),
        loop_end: header.loop_end.saturating_sub(header.start),
        original_pitch: (header.original_pitch != UNPITCHED && header.original_pitch <= 127)
            .then_some(header.original_pitch),
    }
}

/// Decodes a SoundFont 2 bank from any seekable reader.
pub fn read_sound_bank<R: Read + Seek>(reader: &mut R) -> Result<SoundBank> {
    let riff_size = validate_riff_header(reader)?;
    let end_pos = (8 + riff_size as u64).min(reader.seek(SeekFrom::End(0))?);
    reader.seek(SeekFrom::Start(12))?;
    let mut chunks = parse_top_level_chunks(reader, end_pos)?;

    let smpl = chunks.required("smpl")?;
    let sm24 = chunks.optional("sm24");
    let preset_headers: Vec<PresetHeader> =
        read_records("phdr", &chunks.required("phdr")?, PRESET_HEADER_SIZE)?;
    let preset_bags: Vec<Bag> = read_records("pbag", &chunks.required("pbag")?, BAG_SIZE)?;
    let preset_modulators: Vec<ModulatorData> =
        read_records("pmod", &chunks.optional("pmod").unwrap_or_default(), MODULATOR_SIZE)?;
    let preset_generators: Vec<GeneratorData> =
        read_records("pgen", &chunks.required("pgen")?, GENERATOR_SIZE)?;
    let instrument_headers: Vec<InstrumentHeader> =
        read_records("inst", &chunks.required("inst")?, INSTRUMENT_HEADER_SIZE)?;
    let instrument_bags: Vec<Bag> = read_records("ibag", &chunks.required("ibag")?, BAG_SIZE)?;
    let instrument_modulators: Vec<ModulatorData> =
        read_records("imod", &chunks.optional("imod").unwrap_or_default(), MODULATOR_SIZE)?;
    let instrument_generators: Vec<GeneratorData> =
        read_records("igen", &chunks.required("igen")?, GENERATOR_SIZE)?;
    let sample_headers: Vec<SampleHeader> =
        read_records("shdr", &chunks.required("shdr")?, SAMPLE_HEADER_SIZE)?;

    let unmapped = preset_modulators
        .iter()
        .chain(&instrument_modulators)
        .filter(|m| m.destination != 0)
        .count();
    if unmapped > 0 {
        debug!("Ignoring {} modulators", unmapped);
    }

    let starts: Vec<u16> = preset_headers.iter().map(|h| h.bag_index).collect();
    let presets = preset_headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            let range = bag_range(&starts, index, preset_bags.len(), "pbag")?;
            Ok(Preset {
                name: header.name.clone(),
                program: header.preset,
                bank: header.bank,
                zones: build_zones(
                    &preset_bags,
                    &preset_generators,
                    preset_modulators.len(),
                    range,
                    "pgen",
                )?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let starts: Vec<u16> = instrument_headers.iter().map(|h| h.bag_index).collect();
    let instruments = instrument_headers
        .iter()
        .enumerate()
        .filter(|(index, header)| !(*index + 1 == starts.len() && header.name == END_OF_INSTRUMENTS))
        .map(|(index, header)| {
            let range = bag_range(&starts, index, instrument_bags.len(), "ibag")?;
            Ok(Instrument {
                name: header.name.clone(),
                zones: build_zones(
                    &instrument_bags,
                    &instrument_generators,
                    instrument_modulators.len(),
                    range,
                    "igen",
                )?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let samples: Vec<Sample> = sample_headers
        .iter()
        .map(|header| build_sample(header, &smpl, sm24.as_deref()))
        .collect();

    info!(
        "Loaded {} presets, {} instruments, {} samples",
        presets.len(),
        instruments.len(),
        samples.len()
    );
    Ok(SoundBank { presets, instruments, samples })
}

/// Opens and decodes a `.sf2` file.
pub fn load(path: &Path) -> Result<SoundBank> {
    let file = File::open(path)?;
    read_sound_bank(&mut BufReader::new(file))
}
