//! Register change detection between consecutive steps.

use std::fmt;

use crate::trace::record::{TraceRecord, GPR_COUNT, PC_INDEX, SP_INDEX, TRACKED_REGISTER_COUNT};

/// Display name for a tracked register index: `x0`..`x30`, `SP`, `PC`.
pub fn register_name(index: usize) -> Option<String> {
    match index {
        i if i < GPR_COUNT => Some(format!("x{i}")),
        SP_INDEX => Some("SP".to_string()),
        PC_INDEX => Some("PC".to_string()),
        _ => None,
    }
}

/// Set of tracked register indices (0–30 GPRs, 31 SP, 32 PC).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ChangedRegisters(u64);

impl ChangedRegisters {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, index: usize) {
        debug_assert!(index < TRACKED_REGISTER_COUNT);
        self.0 |= 1 << index;
    }

    pub fn contains(&self, index: usize) -> bool {
        index < TRACKED_REGISTER_COUNT && self.0 & (1 << index) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..TRACKED_REGISTER_COUNT).filter(move |&index| self.contains(index))
    }
}

impl FromIterator<usize> for ChangedRegisters {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = Self::empty();
        for index in iter {
            set.insert(index);
        }
        set
    }
}

impl fmt::Display for ChangedRegisters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for index in self.iter() {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            if let Some(name) = register_name(index) {
                f.write_str(&name)?;
            }
        }
        Ok(())
    }
}

/// Remembers the previous register snapshot and reports what changed.
///
/// Reset whenever a different trace is opened.
#[derive(Debug, Clone, Default)]
pub struct RegisterChangeTracker {
    last: Option<[u64; TRACKED_REGISTER_COUNT]>,
}

impl RegisterChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff `record` against the previous snapshot, then store it.
    ///
    /// The first call after construction or [`reset`](Self::reset) only seeds
    /// the baseline and returns an empty set.
    pub fn update(&mut self, record: &TraceRecord) -> ChangedRegisters {
        let current = record.register_snapshot();
        let changed = match &self.last {
            Some(previous) => previous
                .iter()
                .zip(current.iter())
                .enumerate()
                .filter(|(_, (before, after))| before != after)
                .map(|(index, _)| index)
                .collect(),
            None => ChangedRegisters::empty(),
        };
        self.last = Some(current);
        changed
    }

    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn has_baseline(&self) -> bool {
        self.last.is_some()
    }
}
