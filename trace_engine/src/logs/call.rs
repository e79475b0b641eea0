use serde::Serialize;

use super::error::HeaderError;
use super::{LogEntry, LogFormat};
use crate::trace::record::parse_numeric;

/// A branch or call event: `19584: [0x7fda1a4240][0]: __memset_chk`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallLogEntry {
    pub step: u64,
    pub raw: String,
    pub target: u64,
    pub function: Option<String>,
    pub dump: Vec<String>,
}

impl LogEntry for CallLogEntry {
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

pub(crate) struct CallLog;

impl LogFormat for CallLog {
    type Entry = CallLogEntry;

    const NAME: &'static str = "call";

    fn is_header(line: &str) -> bool {
        line.contains("[0x") && line.contains("]:")
    }

    fn parse_header(line: &str) -> Result<CallLogEntry, HeaderError> {
        parse_call_header(line)
    }

    fn push_dump_row(entry: &mut CallLogEntry, row: String) {
        entry.dump.push(row);
    }
}

/// Parse `<step>: [<address>]...: <function>`.
///
/// The function name follows the first `]:`, so names containing `::`
/// survive intact. An empty name is recorded as absent.
pub fn parse_call_header(line: &str) -> Result<CallLogEntry, HeaderError> {
    let (step_text, rest) = line.split_once(':').ok_or(HeaderError::MissingStep)?;
    let step_text = step_text.trim();
    let step = step_text.parse::<u64>().map_err(|source| HeaderError::Step {
        value: step_text.to_string(),
        source,
    })?;

    let brackets = rest
        .trim_start()
        .strip_prefix('[')
        .ok_or(HeaderError::Shape("expected '[' before call target"))?;
    let (address_text, _) = brackets
        .split_once(']')
        .ok_or(HeaderError::Shape("unterminated call target"))?;
    let address_text = address_text.trim();
    let target = parse_numeric(address_text).map_err(|source| HeaderError::Address {
        value: address_text.to_string(),
        source,
    })?;

    let (_, function) = brackets
        .split_once("]:")
        .ok_or(HeaderError::Shape("missing ']:' before function name"))?;
    let function = function.trim();

    Ok(CallLogEntry {
        step,
        raw: line.to_string(),
        target,
        function: (!function.is_empty()).then(|| function.to_string()),
        dump: Vec::new(),
    })
}
