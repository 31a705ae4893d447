//! Builds small in-memory SoundFont banks for the integration tests.

#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use rusty_soundbank::generator::Operator;

pub struct SampleDef {
    pub name: &'static str,
    pub frames: Vec<i16>,
    pub loop_points: (u32, u32),
    pub original_pitch: u8,
}

pub struct ZoneDef {
    pub generators: Vec<(Operator, [u8; 2])>,
}

impl ZoneDef {
    pub fn new(generators: Vec<(Operator, [u8; 2])>) -> Self {
        ZoneDef { generators }
    }
}

pub fn signed(operator: Operator, value: i16) -> (Operator, [u8; 2]) {
    (operator, value.to_le_bytes())
}

pub fn range(operator: Operator, low: u8, high: u8) -> (Operator, [u8; 2]) {
    (operator, [low, high])
}

pub struct HeaderDef {
    pub name: &'static str,
    pub zones: Vec<ZoneDef>,
}

#[derive(Default)]
pub struct BankBuilder {
    presets: Vec<HeaderDef>,
    instruments: Vec<HeaderDef>,
    samples: Vec<SampleDef>,
}

impl BankBuilder {
    pub fn preset(mut self, name: &'static str, zones: Vec<ZoneDef>) -> Self {
        self.presets.push(HeaderDef { name, zones });
        self
    }

    pub fn instrument(mut self, name: &'static str, zones: Vec<ZoneDef>) -> Self {
        self.instruments.push(HeaderDef { name, zones });
        self
    }

    pub fn sample(mut self, sample: SampleDef) -> Self {
        self.samples.push(sample);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut pcm: Vec<u8> = Vec::new();
        let mut shdr: Vec<u8> = Vec::new();
        let mut offset = 0u32;
        for sample in &self.samples {
            let start = offset;
            let end = start + sample.frames.len() as u32;
            for frame in &sample.frames {
                pcm.write_i16::<LittleEndian>(*frame).unwrap();
            }
            // 46 zero frames between samples, as the format asks for.
            pcm.extend_from_slice(&[0; 92]);
            offset = end + 46;

            shdr.extend(name20(sample.name));
            for value in [
                start,
                end,
                start + sample.loop_points.0,
                start + sample.loop_points.1,
                44100,
            ] {
                shdr.write_u32::<LittleEndian>(value).unwrap();
            }
            shdr.push(sample.original_pitch);
            shdr.extend_from_slice(&[0; 5]);
        }
        shdr.extend(name20("EOS"));
        shdr.extend_from_slice(&[0; 26]);

        let (phdr, pbag, pgen) = hydra(&self.presets, "EOP", 38);
        let (inst, ibag, igen) = hydra(&self.instruments, "EOI", 22);

        let sdta = list("sdta", &[chunk("smpl", &pcm)]);
        let pdta = list(
            "pdta",
            &[
                chunk("phdr", &phdr),
                chunk("pbag", &pbag),
                chunk("pmod", &[0; 10]),
                chunk("pgen", &pgen),
                chunk("inst", &inst),
                chunk("ibag", &ibag),
                chunk("imod", &[0; 10]),
                chunk("igen", &igen),
                chunk("shdr", &shdr),
            ],
        );
        let info = list("INFO", &[chunk("ifil", &[2, 0, 1, 0])]);

        let mut body = b"sfbk".to_vec();
        body.extend(info);
        body.extend(sdta);
        body.extend(pdta);
        chunk("RIFF", &body)
    }
}

/// Header, bag and generator tables for presets or instruments, with their
/// terminal records appended.
fn hydra(headers: &[HeaderDef], terminal: &str, header_size: usize) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
    let mut records: Vec<u8> = Vec::new();
    let mut bags: Vec<u8> = Vec::new();
    let mut generators: Vec<u8> = Vec::new();
    let mut bag_count = 0u16;
    let mut generator_count = 0u16;

    let push_header = |records: &mut Vec<u8>, name: &str, bag: u16| {
        records.extend(name20(name));
        if header_size == 38 {
            records.write_u16::<LittleEndian>(0).unwrap();
            records.write_u16::<LittleEndian>(0).unwrap();
            records.write_u16::<LittleEndian>(bag).unwrap();
            records.extend_from_slice(&[0; 12]);
        } else {
            records.write_u16::<LittleEndian>(bag).unwrap();
        }
    };

    for header in headers {
        push_header(&mut records, header.name, bag_count);
        for zone in &header.zones {
            bags.write_u16::<LittleEndian>(generator_count).unwrap();
            bags.write_u16::<LittleEndian>(0).unwrap();
            bag_count += 1;
            for (operator, amount) in &zone.generators {
                generators.write_u16::<LittleEndian>(operator.id()).unwrap();
                generators.extend_from_slice(amount);
                generator_count += 1;
            }
        }
    }
    push_header(&mut records, terminal, bag_count);
    bags.write_u16::<LittleEndian>(generator_count).unwrap();
    bags.write_u16::<LittleEndian>(0).unwrap();
    generators.extend_from_slice(&[0; 4]);

    (records, bags, generators)
}

fn name20(name: &str) -> Vec<u8> {
    let mut raw = name.as_bytes().to_vec();
    raw.resize(20, 0);
    raw
}

fn chunk(id: &str, data: &[u8]) -> Vec<u8> {
    let mut out = id.as_bytes().to_vec();
    out.write_u32::<LittleEndian>(data.len() as u32).unwrap();
    out.extend_from_slice(data);
    if data.len() % 2 == 1 {
        out.push(0);
    }
    out
}

fn list(kind: &str, chunks: &[Vec<u8>]) -> Vec<u8> {
    let mut body = kind.as_bytes().to_vec();
    for c in chunks {
        body.extend_from_slice(c);
    }
    chunk("LIST", &body)
}
