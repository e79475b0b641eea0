use std::fmt;

use serde::Serialize;

use super::error::HeaderError;
use super::{LogEntry, LogFormat};
use crate::trace::record::parse_numeric;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessKind {
    Read,
    Write,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessKind::Read => f.write_str("r"),
            AccessKind::Write => f.write_str("w"),
        }
    }
}

/// A memory access event: `1: (w)(0x7fda1a4210+0x8)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryLogEntry {
    pub step: u64,
    pub raw: String,
    pub kind: AccessKind,
    pub address: u64,
    pub offset: Option<u64>,
    pub dump: Vec<String>,
}

impl LogEntry for MemoryLogEntry {
    fn step(&self) -> u64 {
        self.step
    }

    fn raw(&self) -> &str {
        &self.raw
    }

    fn dump(&self) -> &[String] {
        &self.dump
    }
}

pub(crate) struct MemoryLog;

impl LogFormat for MemoryLog {
    type Entry = MemoryLogEntry;

    const NAME: &'static str = "memory";

    fn is_header(line: &str) -> bool {
        (line.contains("(r)") || line.contains("(w)")) && line.contains(':')
    }

    fn parse_header(line: &str) -> Result<MemoryLogEntry, HeaderError> {
        parse_memory_header(line)
    }

    fn push_dump_row(entry: &mut MemoryLogEntry, row: String) {
        entry.dump.push(row);
    }
}

/// Parse `<step>: (r|w)(<address>[+<offset>])`.
pub fn parse_memory_header(line: &str) -> Result<MemoryLogEntry, HeaderError> {
    let (step_text, rest) = line.split_once(':').ok_or(HeaderError::MissingStep)?;
    let step_text = step_text.trim();
    let step = step_text.parse::<u64>().map_err(|source| HeaderError::Step {
        value: step_text.to_string(),
        source,
    })?;

    let rest = rest.trim();
    let (kind, rest) = if let Some(rest) = rest.strip_prefix("(r)") {
        (AccessKind::Read, rest)
    } else if let Some(rest) = rest.strip_prefix("(w)") {
        (AccessKind::Write, rest)
    } else {
        return Err(HeaderError::Shape("expected (r) or (w) access kind"));
    };

    let location = rest
        .trim_start()
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
        .ok_or(HeaderError::Shape("expected (<address>[+<offset>])"))?;

    let (address_text, offset_text) = match location.split_once('+') {
        Some((address, offset)) => (address.trim(), Some(offset.trim())),
        None => (location.trim(), None),
    };

    let address = parse_numeric(address_text).map_err(|source| HeaderError::Address {
        value: address_text.to_string(),
        source,
    })?;
    let offset = offset_text
        .map(|text| {
            parse_numeric(text).map_err(|source| HeaderError::Offset {
                value: text.to_string(),
                source,
            })
        })
        .transpose()?;

    Ok(MemoryLogEntry {
        step,
        raw: line.to_string(),
        kind,
        address,
        offset,
        dump: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    #[test]
    fn parse_memory_header__write_with_offset__then_fields_extracted() {
        let entry = parse_memory_header("1: (w)(0x7fda1a4210+0x8)").unwrap();

        assert_eq!(entry.step, 1);
        assert_eq!(entry.kind, AccessKind::Write);
        assert_eq!(entry.address, 0x7fda1a4210);
        assert_eq!(entry.offset, Some(8));
        assert_eq!(entry.raw(), "1: (w)(0x7fda1a4210+0x8)");
    }

    #[test]
    fn parse_memory_header__read_without_offset__then_offset_absent() {
        let entry = parse_memory_header("42: (r)(0x1000)").unwrap();

        assert_eq!(entry.kind, AccessKind::Read);
        assert_eq!(entry.address, 0x1000);
        assert_eq!(entry.offset, None);
    }

    #[test]
    fn parse_memory_header__unknown_kind__then_shape_error() {
        assert!(matches!(
            parse_memory_header("1: (x)(0x10)"),
            Err(HeaderError::Shape(_))
        ));
    }

    #[test]
    fn parse_memory_header__bad_offset__then_offset_error() {
        assert!(matches!(
            parse_memory_header("1: (r)(0x10+zz)"),
            Err(HeaderError::Offset { .. })
        ));
    }

    #[test]
    fn parse_memory_header__missing_location__then_shape_error() {
        assert!(matches!(
            parse_memory_header("1: (r)"),
            Err(HeaderError::Shape(_))
        ));
    }

    #[test]
    fn access_kind__display__then_single_letter() {
        assert_eq!(AccessKind::Read.to_string(), "r");
        assert_eq!(AccessKind::Write.to_string(), "w");
    }

    #[test]
    fn is_header__requires_kind_and_colon() {
        assert!(MemoryLog::is_header("9: (r)(0x10)"));
        assert!(!MemoryLog::is_header("(r)(0x10)"));
        assert!(!MemoryLog::is_header("00 11 22 | ..."));
    }
}
