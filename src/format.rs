// --- Zone Parameter Formatting ---
//
// Turns one zone into `opcode=value` lines. Attribute-sourced lines come
// first, generator-sourced lines after; an opcode already written in the
// block is never written twice.

use std::collections::HashSet;

use crate::bank::{Attribute, AttributeValue, Zone};
use crate::generator::Operator;
use crate::mapping::{
    ATTRIBUTE_OPCODES, AttributeMapping, DEFAULT_FILTER_TYPE, DUPLICATED_OPCODES, FILTER_OPCODES,
    GENERATOR_OPCODES, GeneratorMapping, Opcodes,
};

/// MIDI channel drum zones are pinned to.
pub const DRUM_CHANNEL: u8 = 10;

/// The tables a zone is formatted against.
#[derive(Debug, Clone, Copy)]
pub struct MappingTables {
    pub attributes: &'static [AttributeMapping],
    pub generators: &'static [GeneratorMapping],
    pub duplicates: &'static [(Operator, &'static str)],
}

impl MappingTables {
    pub fn standard() -> Self {
        MappingTables {
            attributes: ATTRIBUTE_OPCODES,
            generators: GENERATOR_OPCODES,
            duplicates: DUPLICATED_OPCODES,
        }
    }

    /// Every opcode `operator` writes, primary first.
    pub fn opcodes_for(&self, operator: Operator) -> impl Iterator<Item = &'static str> {
        let primary = self
            .generators
            .iter()
            .filter(move |mapping| mapping.operator == operator)
            .map(|mapping| mapping.opcode);
        let duplicates = self
            .duplicates
            .iter()
            .filter(move |(op, _)| *op == operator)
            .map(|(_, opcode)| *opcode);
        primary.chain(duplicates)
    }
}

impl Default for MappingTables {
    fn default() -> Self {
        MappingTables::standard()
    }
}

/// Formats a number the way SFZ files usually carry them: integers without
/// a fractional part, everything else at full precision.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{value}")
}

#[derive(Default)]
struct Block {
    lines: Vec<String>,
    written: HashSet<&'static str>,
    filter_typed: bool,
}

impl Block {
    fn push(&mut self, opcodes: &[(&'static str, String)]) {
        let fresh: Vec<&(&'static str, String)> = opcodes
            .iter()
            .filter(|(name, _)| !self.written.contains(name))
            .collect();
        if fresh.is_empty() {
            return;
        }

        if !self.filter_typed && fresh.iter().any(|(name, _)| FILTER_OPCODES.contains(name)) {
            self.lines.push(DEFAULT_FILTER_TYPE.to_string());
            self.written.insert("fil_type");
            self.filter_typed = true;
        }

        let line = fresh
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(" ");
        self.written.extend(fresh.iter().map(|(name, _)| *name));
        self.lines.push(line);
    }

    fn finish(self) -> String {
        if self.lines.is_empty() {
            return String::new();
        }
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

/// Formats one zone against `tables`. Returns an empty string when the zone
/// produces no opcodes.
pub fn format_zone(zone: &Zone, tables: &MappingTables) -> String {
    let mut block = Block::default();

    for mapping in tables.attributes {
        let Some(value) = zone.attribute(mapping.attribute) else {
            continue;
        };
        match (mapping.opcodes, value) {
            (Opcodes::Pair(..), AttributeValue::Pair(key, high))
                if mapping.attribute == Attribute::KeyRange && key == high =>
            {
                // Single-key zones are drum hits.
                let channel = DRUM_CHANNEL.to_string();
                block.push(&[
                    ("key", key.to_string()),
                    ("lochan", channel.clone()),
                    ("hichan", channel),
                ]);
            }
            (Opcodes::Pair(low_name, high_name), AttributeValue::Pair(low, high)) => {
                block.push(&[(low_name, low.to_string()), (high_name, high.to_string())]);
            }
            (Opcodes::Single(name), AttributeValue::Number(number)) => {
                block.push(&[(name, format_number(mapping.transform.apply(number)))]);
            }
            _ => {}
        }
    }

    for mapping in tables.generators {
        let Some(number) = zone
            .generator(mapping.operator)
            .and_then(|record| record.resolve())
            .and_then(|value| value.as_f64())
        else {
            continue;
        };
        let text = format_number(mapping.transform.apply(number));
        for opcode in tables.opcodes_for(mapping.operator) {
            block.push(&[(opcode, text.clone())]);
        }
    }

    block.finish()
}
