//! Detection interval merging.
//!
//! Each detection frame index is widened to
//! `[index - pad_before, index + pad_after]` (start saturating at 0), the
//! windows are sorted by start, and a window is folded into the previous
//! interval when `window.start <= previous.end + adjacency_tolerance`.
//! The output is sorted, disjoint and cannot be merged any further.

use crate::config::IntervalPolicy;

use std::fmt;

/// Inclusive frame range, `end >= start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    pub start: u64,
    pub end: u64,
}

impl Interval {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(end >= start, "interval end {end} before start {start}");
        Self { start, end }
    }

    /// Number of frames covered.
    pub fn frame_count(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn contains(&self, frame: u64) -> bool {
        (self.start..=self.end).contains(&frame)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// The padded window around one detection.
pub fn detection_window(frame_index: u64, policy: &IntervalPolicy) -> Interval {
    Interval::new(
        frame_index.saturating_sub(policy.pad_before),
        frame_index.saturating_add(policy.pad_after),
    )
}

/// Merges arbitrary windows into the minimal sorted list of disjoint intervals.
pub fn merge_intervals(
    windows: impl IntoIterator<Item = Interval>,
    adjacency_tolerance: u64,
) -> Vec<Interval> {
    let mut windows: Vec<Interval> = windows.into_iter().collect();
    windows.sort_unstable();

    let mut merged: Vec<Interval> = Vec::with_capacity(windows.len());
    for window in windows {
        match merged.last_mut() {
            Some(last) if window.start <= last.end.saturating_add(adjacency_tolerance) => {
                last.end = last.end.max(window.end);
            }
            _ => merged.push(window),
        }
    }
    merged
}

/// Pads every detection (in any order, duplicates allowed) and merges.
pub fn merge_detections(frame_indices: &[u64], policy: &IntervalPolicy) -> Vec<Interval> {
    merge_intervals(
        frame_indices
            .iter()
            .map(|&index| detection_window(index, policy)),
        policy.adjacency_tolerance,
    )
}
