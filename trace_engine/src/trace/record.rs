//! Trace line schema and parser.
//!
//! Each trace line is a `|`-delimited snapshot of one executed instruction:
//!
//! ```text
//! step(hex) | address | offset | "instruction" | x0 .. x28 | x29 | x30 | sp | pc
//! ```

use std::num::ParseIntError;

use serde::Serialize;

use super::error::{ParseError, TraceField};

/// Number of `|`-delimited fields in a trace line.
pub const FIELD_COUNT: usize = 37;

/// General purpose registers x0..x30.
pub const GPR_COUNT: usize = 31;

/// GPRs plus SP and PC.
pub const TRACKED_REGISTER_COUNT: usize = GPR_COUNT + 2;

pub const SP_INDEX: usize = 31;
pub const PC_INDEX: usize = 32;

const FIRST_REGISTER_FIELD: usize = 4;
const SP_FIELD: usize = 35;
const PC_FIELD: usize = 36;

/// One executed instruction and the register state captured with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceRecord {
    pub step: u32,
    pub address: u64,
    pub offset: u64,
    pub instruction: String,
    pub regs: [u64; GPR_COUNT],
    pub sp: u64,
    pub pc: u64,
}

impl TraceRecord {
    /// Register values in tracker order: x0..x30, SP, PC.
    pub fn register_snapshot(&self) -> [u64; TRACKED_REGISTER_COUNT] {
        let mut snapshot = [0u64; TRACKED_REGISTER_COUNT];
        snapshot[..GPR_COUNT].copy_from_slice(&self.regs);
        snapshot[SP_INDEX] = self.sp;
        snapshot[PC_INDEX] = self.pc;
        snapshot
    }
}

/// Parse a single trace line.
///
/// Only classifies the line. Callers scanning a file are expected to skip
/// lines that fail and keep going.
pub fn parse_line(raw: &str) -> Result<TraceRecord, ParseError> {
    let fields: Vec<&str> = raw.split('|').map(str::trim).collect();
    if fields.len() != FIELD_COUNT {
        return Err(ParseError::FieldCount {
            expected: FIELD_COUNT,
            found: fields.len(),
        });
    }

    let step = u32::from_str_radix(fields[0], 16).map_err(|source| ParseError::Field {
        field: TraceField::Step,
        value: fields[0].to_string(),
        source,
    })?;
    let address = numeric_field(fields[1], TraceField::Address)?;
    let offset = numeric_field(fields[2], TraceField::Offset)?;
    let instruction = strip_quotes(fields[3]).to_string();

    let mut regs = [0u64; GPR_COUNT];
    for (index, reg) in regs.iter_mut().enumerate() {
        *reg = numeric_field(
            fields[FIRST_REGISTER_FIELD + index],
            TraceField::Register(index as u8),
        )?;
    }

    let sp = numeric_field(fields[SP_FIELD], TraceField::Sp)?;
    let pc = numeric_field(fields[PC_FIELD], TraceField::Pc)?;

    Ok(TraceRecord {
        step,
        address,
        offset,
        instruction,
        regs,
        sp,
        pc,
    })
}

/// Parse an unsigned value written either as `0x`-prefixed hex or decimal.
pub(crate) fn parse_numeric(value: &str) -> Result<u64, ParseIntError> {
    match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse::<u64>(),
    }
}

fn numeric_field(value: &str, field: TraceField) -> Result<u64, ParseError> {
    parse_numeric(value).map_err(|source| ParseError::Field {
        field,
        value: value.to_string(),
        source,
    })
}

fn strip_quotes(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(text)
}
