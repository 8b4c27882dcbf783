//! Quality negotiation between the engine and the widget
//!
//! Engine to widget: once the manifest is known, the widget's quality menu is
//! replaced by the heights the engine can actually deliver.
//! Widget to engine: a picked height becomes the engine's requested rendition when
//! a rendition of exactly that height exists; otherwise nothing changes.

use crate::engine::{Rendition, StreamingEngine};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Ladder shown before the manifest is known
pub const FALLBACK_LADDER: [u32; 6] = [2160, 1440, 1080, 720, 480, 360];

/// Default display quality
pub const DEFAULT_QUALITY: u32 = 720;

/// Distinct rendition heights, highest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualityLadder(Vec<u32>);

impl QualityLadder {
    /// Build a ladder from arbitrary heights
    pub fn new(heights: impl IntoIterator<Item = u32>) -> Self {
        let mut heights: Vec<u32> = heights.into_iter().collect();
        heights.sort_unstable_by(|a, b| b.cmp(a));
        heights.dedup();
        Self(heights)
    }

    pub fn from_renditions(renditions: &[Rendition]) -> Self {
        Self::new(renditions.iter().map(|r| r.height))
    }

    pub fn fallback() -> Self {
        Self(FALLBACK_LADDER.to_vec())
    }

    pub fn heights(&self) -> &[u32] {
        &self.0
    }

    pub fn contains(&self, height: u32) -> bool {
        self.0.contains(&height)
    }

    pub fn highest(&self) -> Option<u32> {
        self.0.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Default for QualityLadder {
    fn default() -> Self {
        Self::fallback()
    }
}

/// Outcome of a widget quality pick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualitySelection {
    /// The engine is pinned to the rendition at this index
    Switched(usize),
    /// No rendition has this height; the engine was left alone
    Unavailable,
}

/// Keeps engine rendition and widget quality in agreement
#[derive(Debug, Default)]
pub struct QualityBridge;

impl QualityBridge {
    pub fn new() -> Self {
        Self
    }

    /// Index of the first rendition with exactly this height
    pub fn find_rendition(renditions: &[Rendition], height: u32) -> Option<usize> {
        renditions.iter().position(|r| r.height == height)
    }

    /// Widget to engine. A match is always written to the engine, even when it is
    /// the rendition already playing, so automatic switching stops.
    pub fn select<E: StreamingEngine + ?Sized>(&self, engine: &mut E, height: u32) -> QualitySelection {
        let Some(index) = Self::find_rendition(&engine.renditions(), height) else {
            debug!(height, "No rendition matches selected quality, ignoring");
            return QualitySelection::Unavailable;
        };

        engine.set_active_rendition(index);
        info!(height, index, "Quality switched");
        QualitySelection::Switched(index)
    }

    /// Engine to widget. An empty manifest ladder keeps the current one.
    pub fn negotiate(&self, current: &QualityLadder, renditions: &[Rendition]) -> QualityLadder {
        let ladder = QualityLadder::from_renditions(renditions);
        if ladder.is_empty() {
            debug!("Manifest reported no renditions, keeping quality ladder");
            return current.clone();
        }
        ladder
    }
}
