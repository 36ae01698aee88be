// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Interactive trim selection over a waveform view.
//!
//! Holds the rendered view window and the start/end trim bounds, and applies
//! encoder deltas to whichever edge is active. Selection increments scale
//! with the view range, so zooming in gives finer control. Zooming keeps the
//! active handle visually fixed and shifts (never truncates) the window when
//! it would leave the signal.

use tracing::debug;

/// Smallest view range, in samples, that zoom will reach on signals at
/// least this long.
pub const MIN_VIEW_RANGE: usize = 500;

const BASE_INCREMENT_DIVISOR: usize = 100;
const MIN_INCREMENT: usize = 1;
const ZOOM_IN_FACTOR: f32 = 0.9;
const ZOOM_OUT_FACTOR: f32 = 1.11;

/// Which trim handle responds to selection updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveEdge {
    Start,
    End,
}

/// A confirmed trim region, in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRegion {
    pub start: u32,
    pub end: u32,
}

/// View/selection state machine for trim editing.
pub struct TrimSelector {
    total_samples: usize,
    view_start: usize,
    view_end: usize,
    select_start: usize,
    select_end: usize,
    active_edge: ActiveEdge,
}

impl TrimSelector {
    /// Creates a selector over a signal, viewing and selecting all of it.
    pub fn new(total_samples: usize) -> TrimSelector {
        TrimSelector {
            total_samples,
            view_start: 0,
            view_end: total_samples,
            select_start: 0,
            select_end: total_samples,
            active_edge: ActiveEdge::Start,
        }
    }

    /// Moves the active edge by one increment in the given direction.
    ///
    /// The increment is `max(1, view_range / 100)`: it scales with zoom, so
    /// a tighter view moves the handle in finer steps. The start edge stays
    /// within `[view_start, select_end - increment]`, the end edge within
    /// `[select_start + increment, total_samples]`.
    pub fn update_selection(&mut self, delta: i32) {
        if self.total_samples == 0 || delta == 0 {
            return;
        }

        let increment = self.increment();
        match self.active_edge {
            ActiveEdge::Start => {
                if delta > 0 {
                    let limit = self.select_end.saturating_sub(increment);
                    self.select_start = limit.min(self.select_start + increment);
                } else {
                    // The view can sit entirely right of the selection after
                    // zooming around the other edge; the end bound still wins.
                    self.select_start = self
                        .view_start
                        .max(self.select_start.saturating_sub(increment))
                        .min(self.select_end);
                }
            }
            ActiveEdge::End => {
                if delta > 0 {
                    self.select_end = self.total_samples.min(self.select_end + increment);
                } else {
                    let limit = self.select_start + increment;
                    self.select_end = self
                        .total_samples
                        .min(limit.max(self.select_end.saturating_sub(increment)));
                }
            }
        }
    }

    /// Zooms the view in (`direction > 0`) or out (`direction < 0`) around
    /// the active edge, keeping the point under that handle visually fixed.
    pub fn zoom(&mut self, direction: i32) {
        if self.total_samples == 0 || direction == 0 {
            return;
        }

        let total = self.total_samples as i64;
        let current_range = (self.view_end - self.view_start) as i64;
        let factor = if direction > 0 {
            ZOOM_IN_FACTOR
        } else {
            ZOOM_OUT_FACTOR
        };
        let new_range = ((current_range as f32 * factor) as i64)
            .max(MIN_VIEW_RANGE as i64)
            .min(total);

        let anchor = match self.active_edge {
            ActiveEdge::Start => self.select_start,
            ActiveEdge::End => self.select_end,
        } as i64;
        let anchor_ratio = (anchor - self.view_start as i64) as f32 / current_range as f32;
        let range_before_anchor = (new_range as f32 * anchor_ratio) as i64;

        let mut view_start = anchor - range_before_anchor;
        let mut view_end = view_start + new_range;

        // Shift the window back into the signal instead of truncating it.
        if view_start < 0 {
            view_end += -view_start;
            view_start = 0;
        }
        if view_end > total {
            view_start = (view_start - (view_end - total)).max(0);
            view_end = total;
        }
        if view_end <= view_start {
            view_end = (view_start + MIN_VIEW_RANGE as i64).min(total);
            view_start = (view_end - MIN_VIEW_RANGE as i64).max(0);
        }

        self.view_start = view_start as usize;
        self.view_end = view_end as usize;
    }

    /// Toggles which trim handle responds to selection updates.
    pub fn change_active_edge(&mut self) {
        self.active_edge = match self.active_edge {
            ActiveEdge::Start => ActiveEdge::End,
            ActiveEdge::End => ActiveEdge::Start,
        };
    }

    /// Snaps the view back to the whole signal.
    pub fn reset_zoom(&mut self) {
        if self.total_samples == 0 {
            return;
        }
        self.view_start = 0;
        self.view_end = self.total_samples;
    }

    /// Confirms the current trim bounds.
    pub fn confirm(&self) -> SelectionRegion {
        let region = SelectionRegion {
            start: self.select_start as u32,
            end: self.select_end as u32,
        };
        debug!(start = region.start, end = region.end, "Trim confirmed.");
        region
    }

    pub fn total_samples(&self) -> usize {
        self.total_samples
    }

    pub fn view_start(&self) -> usize {
        self.view_start
    }

    pub fn view_end(&self) -> usize {
        self.view_end
    }

    pub fn select_start(&self) -> usize {
        self.select_start
    }

    pub fn select_end(&self) -> usize {
        self.select_end
    }

    pub fn active_edge(&self) -> ActiveEdge {
        self.active_edge
    }

    fn increment(&self) -> usize {
        MIN_INCREMENT.max((self.view_end - self.view_start) / BASE_INCREMENT_DIVISOR)
    }
}
