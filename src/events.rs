//! Events emitted toward the chart/animation layer.
//!
//! Delivery is push-based: the engine drains each listener's confirmation
//! synchronously after every frame and hands it to every registered sink.
//! At most one event per completed hold/stroke cycle (the dial's scrub mode
//! streams its tracking ratio by definition).

use serde::Serialize;

use crate::geom::{Point, Rect};

/// Shape payload of a foreshadow event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ForeshadowShape {
    /// Rectangle spanned by two held fingertips.
    Rect,
    /// Horizontal interval, e.g. a time range on the x axis.
    Range { lo: f32, hi: f32 },
    /// A free-form stroke matched against the template library.
    Sketch { template: String },
}

/// Continuous playback tracking payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TrackingValue {
    /// Normalized dial angle in `[0, 1]`, for scrubbing.
    Ratio { value: f32 },
    /// One pulse per completed rotation, for stepping a counter.
    Pulse,
}

/// Intensity category derived from stroke geometry (fitted circle radius).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AffectLevel {
    Subtle,
    Moderate,
    Strong,
}

/// A confirmed, discrete interaction event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartEvent {
    /// A dwell-confirmed point selection.
    Select { anchor: Point },
    /// Preview of a future chart state via a drawn/held area.
    Foreshadow { shape: ForeshadowShape, bounds: Rect },
    /// Playback position or step.
    Playback { value: TrackingValue },
    /// Animation intensity change.
    Emphasis { level: AffectLevel },
    /// A user stroke was enrolled as a new template.
    TemplateEnrolled { name: String },
}

/// An event paired with its source listener and frame timestamp, as handed
/// to sinks and returned from the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Emitted {
    pub t_ms: u64,
    pub listener: &'static str,
    #[serde(flatten)]
    pub event: ChartEvent,
}

/// Registry of chart-layer callbacks.
#[derive(Default)]
pub struct SinkRegistry {
    sinks: Vec<Box<dyn FnMut(&Emitted)>>,
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, sink: impl FnMut(&Emitted) + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn publish(&mut self, event: &Emitted) {
        for sink in &mut self.sinks {
            sink(event);
        }
    }
}

impl std::fmt::Debug for SinkRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkRegistry")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}
