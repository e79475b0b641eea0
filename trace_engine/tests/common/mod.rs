#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// A well-formed trace line whose registers are `base + index`.
pub fn trace_line(step: u32, base: u64) -> String {
    let pc = 0x4000_0000u64 + u64::from(step) * 4;
    let mut fields = vec![
        format!("{step:x}"),
        format!("0x{pc:x}"),
        format!("0x{:x}", u64::from(step) * 4),
        "\"add x0, x0, #1\"".to_string(),
    ];
    fields.extend((0..31u64).map(|index| format!("0x{:x}", base + index)));
    fields.push("0x7ffff000".to_string());
    fields.push(format!("0x{pc:x}"));
    fields.join("|")
}

/// Lines whose step equals their zero-based line number.
pub fn sequential_lines(count: u32) -> Vec<String> {
    (0..count).map(|step| trace_line(step, u64::from(step))).collect()
}

pub fn write_trace(dir: &Path, lines: &[String]) -> PathBuf {
    let path = dir.join("code.log");
    let mut body = lines.join("\n");
    body.push('\n');
    fs::write(&path, body).expect("write trace");
    path
}
