#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Aggregation of capacity-clamp events for diagnostic reporting.
//!
//! The tracker is purely additive and never feeds back into the simulation.

use std::collections::BTreeMap;

use patient_world_core::{CapacityEvent, CellCoord, Layer};
use serde::Serialize;

/// Number of hotspots reported by default.
pub const DEFAULT_TOP_CELLS: usize = 3;

/// Running counts of capacity clamps across one or many ticks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CapacityTracker {
    total_events: u64,
    cell_counts: BTreeMap<CellCoord, u64>,
    layer_counts: BTreeMap<Layer, u64>,
    day_counts: BTreeMap<u64, u64>,
}

impl CapacityTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a batch of events to the running counts.
    pub fn ingest<'a>(&mut self, events: impl IntoIterator<Item = &'a CapacityEvent>) {
        for event in events {
            self.total_events += 1;
            *self.cell_counts.entry(event.cell).or_insert(0) += 1;
            *self.layer_counts.entry(event.layer).or_insert(0) += 1;
            *self.day_counts.entry(event.day).or_insert(0) += 1;
        }
    }

    /// Reports whether any event has been ingested.
    #[must_use]
    pub fn has_events(&self) -> bool {
        self.total_events > 0
    }

    /// Total number of events ingested.
    #[must_use]
    pub fn total_events(&self) -> u64 {
        self.total_events
    }

    /// Summary with the `top_n` busiest cells, or `None` before any event.
    #[must_use]
    pub fn snapshot(&self, top_n: usize) -> Option<CapacitySummary> {
        if !self.has_events() {
            return None;
        }
        Some(CapacitySummary {
            total_events: self.total_events,
            unique_cells: self.cell_counts.len(),
            active_days: self.day_counts.len(),
            layer_totals: self.layer_counts.clone(),
            top_cells: self.hotspots(top_n),
        })
    }

    /// Cells ordered by event count, busiest first; ties keep coordinate order.
    #[must_use]
    pub fn hotspots(&self, top_n: usize) -> Vec<Hotspot> {
        let mut cells: Vec<Hotspot> = self
            .cell_counts
            .iter()
            .map(|(cell, events)| Hotspot {
                cell: *cell,
                events: *events,
            })
            .collect();
        cells.sort_by(|left, right| right.events.cmp(&left.events));
        cells.truncate(top_n);
        cells
    }
}

/// Point-in-time view of a [`CapacityTracker`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CapacitySummary {
    /// Events ingested.
    pub total_events: u64,
    /// Distinct cells that hit a cap.
    pub unique_cells: usize,
    /// Distinct days on which a cap was hit.
    pub active_days: usize,
    /// Events per layer.
    pub layer_totals: BTreeMap<Layer, u64>,
    /// Busiest cells.
    pub top_cells: Vec<Hotspot>,
}

/// Cell that hit its cap repeatedly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Hotspot {
    /// Location of the cell.
    pub cell: CellCoord,
    /// Number of clamps recorded for it.
    pub events: u64,
}

/// Hotspot preview of a single batch of events.
#[must_use]
pub fn summarize(events: &[CapacityEvent], top_n: usize) -> Option<CapacitySummary> {
    let mut tracker = CapacityTracker::new();
    tracker.ingest(events);
    tracker.snapshot(top_n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(day: u64, x: u32, y: u32, layer: Layer) -> CapacityEvent {
        CapacityEvent {
            day,
            cell: CellCoord::new(x, y),
            layer,
            total: 120,
            capacity: 100,
        }
    }

    #[test]
    fn empty_tracker_has_no_snapshot() {
        let tracker = CapacityTracker::new();
        assert!(!tracker.has_events());
        assert_eq!(tracker.snapshot(DEFAULT_TOP_CELLS), None);
    }

    #[test]
    fn hotspot_ties_fall_back_to_coordinate_order() {
        let summary = summarize(
            &[
                event(1, 4, 0, Layer::Ground),
                event(1, 2, 0, Layer::Ground),
                event(2, 4, 0, Layer::Canopy),
                event(2, 2, 0, Layer::Canopy),
                event(2, 3, 0, Layer::Canopy),
            ],
            2,
        )
        .expect("events present");

        assert_eq!(
            summary.top_cells,
            vec![
                Hotspot {
                    cell: CellCoord::new(2, 0),
                    events: 2
                },
                Hotspot {
                    cell: CellCoord::new(4, 0),
                    events: 2
                },
            ]
        );
    }
}
