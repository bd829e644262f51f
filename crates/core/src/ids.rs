//! Identifier allocation.

use chrono::Utc;

/// Largest id ever issued or accepted from storage. Stored ids are JSON
/// numbers, so they stay within the range a double represents exactly.
pub const MAX_ID: u64 = (1 << 53) - 1;

/// Source of the current time in milliseconds.
pub type Clock = fn() -> i64;

fn wall_clock() -> i64 {
    Utc::now().timestamp_millis()
}

/// Hands out timestamp-shaped ids that never repeat.
///
/// Each id is the current millisecond unless that would not exceed the last
/// issued id, in which case the next integer is used instead. Callers may
/// additionally report ids that are already taken; those are skipped.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    last: u64,
    clock: Clock,
}

impl IdGenerator {
    /// Generator that will only issue ids greater than `floor`.
    pub fn new(floor: u64) -> Self {
        Self::with_clock(floor, wall_clock)
    }

    /// Same as [`IdGenerator::new`] with an explicit time source.
    pub fn with_clock(floor: u64, clock: Clock) -> Self {
        Self { last: floor, clock }
    }

    /// Largest id issued so far (or the initial floor).
    pub fn last(&self) -> u64 {
        self.last
    }

    /// Time source in use.
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Issue a fresh id, skipping any value for which `taken` returns true.
    ///
    /// Returns `None` once no id up to [`MAX_ID`] is left.
    pub fn next(&mut self, taken: impl Fn(u64) -> bool) -> Option<u64> {
        let now = u64::try_from((self.clock)()).unwrap_or(0);
        let mut candidate = now.max(self.last.checked_add(1)?);
        loop {
            if candidate > MAX_ID {
                return None;
            }
            if !taken(candidate) {
                break;
            }
            candidate += 1;
        }
        self.last = candidate;
        Some(candidate)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(0)
    }
}
