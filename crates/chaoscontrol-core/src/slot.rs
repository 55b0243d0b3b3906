//! Slot finder: locate a free span of minutes within a workday.
//!
//! Existing placed intervals are inflated by the buffer on both sides; the
//! candidate span itself is not, so two neighbors end up exactly one buffer
//! apart. Ties break toward the earliest start (or latest, when walking
//! backward).

use serde::{Deserialize, Serialize};

/// Half-open minute-of-day interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: u32,
    pub end: u32,
}

impl Interval {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Two intervals conflict iff `s1 < e2 && s2 < e1`.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Widen by `buffer` minutes on both sides (clamped at zero).
    pub fn inflate(&self, buffer: u32) -> Interval {
        Interval::new(self.start.saturating_sub(buffer), self.end + buffer)
    }
}

/// Which end of the workday to prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    PreferEarly,
    PreferLate,
}

/// Sorted, buffer-inflated, merged busy spans for one day.
fn blocked_spans(existing: &[Interval], buffer: u32) -> Vec<Interval> {
    let mut spans: Vec<Interval> = existing.iter().map(|iv| iv.inflate(buffer)).collect();
    spans.sort_by_key(|iv| (iv.start, iv.end));
    let mut merged: Vec<Interval> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
            _ => merged.push(span),
        }
    }
    merged
}

/// Find the earliest (or latest) start of a `duration`-minute span inside
/// `[work_start, work_end)` that clears every existing interval's buffer.
pub fn find_slot(
    duration: u32,
    existing: &[Interval],
    work_start: u32,
    work_end: u32,
    buffer: u32,
    direction: Direction,
) -> Option<u32> {
    if duration == 0 || work_start + duration > work_end {
        return None;
    }
    let blocked = blocked_spans(existing, buffer);

    match direction {
        Direction::PreferEarly => {
            let mut candidate = work_start;
            for span in &blocked {
                if span.end <= candidate {
                    continue;
                }
                if candidate + duration <= span.start.min(work_end) {
                    return Some(candidate);
                }
                candidate = candidate.max(span.end);
            }
            (candidate + duration <= work_end).then_some(candidate)
        }
        Direction::PreferLate => {
            let mut candidate_end = work_end;
            for span in blocked.iter().rev() {
                if span.start >= candidate_end {
                    continue;
                }
                if span.end.max(work_start) + duration <= candidate_end {
                    return Some(candidate_end - duration);
                }
                candidate_end = candidate_end.min(span.start);
            }
            (work_start + duration <= candidate_end).then_some(candidate_end - duration)
        }
    }
}

/// Whether a span starting at `start` fits without touching any existing
/// interval's buffer, inside the workday bounds.
pub fn fits_at(
    start: u32,
    duration: u32,
    existing: &[Interval],
    work_start: u32,
    work_end: u32,
    buffer: u32,
) -> bool {
    if start < work_start || start + duration > work_end {
        return false;
    }
    let candidate = Interval::new(start, start + duration);
    !existing
        .iter()
        .any(|iv| iv.inflate(buffer).overlaps(&candidate))
}
