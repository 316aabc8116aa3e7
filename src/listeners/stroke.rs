//! Stroke-triggered recognition listener.
//!
//! Touching both thumbs together toggles recording (edge-detected, so the
//! thumbs can stay together without retriggering). While recording, the
//! dominant hand's index tip traces a stroke inside the region. The second
//! toggle closes the stroke: too short is discarded, enrollment mode
//! registers it as a new template, otherwise it is matched against the
//! template library. A match on the configured affect template is run
//! through the circle fitter so one circular stroke carries both the
//! trigger and an intensity level (radius band).

use log::debug;

use super::GestureListener;
use crate::circle;
use crate::events::{AffectLevel, ChartEvent, ForeshadowShape};
use crate::frame::{Hand, LandmarkFrame, landmark};
use crate::geom::{self, Point, Region};
use crate::hold::HoldError;
use crate::unistroke::{RecognitionMode, Recognizer};

/// What to do with a completed stroke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrokeMode {
    /// Match against the template library.
    Recognize,
    /// Register the stroke as a new template under this name.
    Enroll { name: String },
}

#[derive(Debug, Clone)]
pub struct StrokeConfig {
    pub region: Region,
    /// Hand whose index tip draws the stroke.
    pub hand: Hand,
    /// Thumb-tip distance at or under which the trigger is "on".
    pub touch_px: f32,
    /// Strokes shorter than this never reach the recognizer.
    pub min_points: usize,
    /// Minimum score for a match to count.
    pub accept_score: f32,
    /// Template whose match is converted to an emphasis level via circle fit.
    pub affect_template: String,
    /// Radius band edges splitting subtle / moderate / strong.
    pub affect_bands: [f32; 2],
    pub mode: StrokeMode,
    pub recognition: RecognitionMode,
}

impl StrokeConfig {
    pub fn for_region(region: Region) -> Self {
        Self {
            region,
            hand: Hand::Right,
            touch_px: 20.0,
            min_points: 5,
            accept_score: 0.8,
            affect_template: "circle".to_string(),
            affect_bands: [60.0, 120.0],
            mode: StrokeMode::Recognize,
            recognition: RecognitionMode::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StrokePhase {
    Idle,
    Recording,
}

pub struct StrokeTrigger {
    cfg: StrokeConfig,
    recognizer: Recognizer,
    phase: StrokePhase,
    buffer: Vec<Point>,
    trigger_was_on: bool,
    last_event: Option<ChartEvent>,
}

impl StrokeTrigger {
    pub fn new(cfg: StrokeConfig) -> Self {
        let recognizer = Recognizer::new(cfg.recognition);
        Self {
            cfg,
            recognizer,
            phase: StrokePhase::Idle,
            buffer: Vec::new(),
            trigger_was_on: false,
            last_event: None,
        }
    }

    /// Swap recognize/enroll behavior for the next completed stroke.
    pub fn set_mode(&mut self, mode: StrokeMode) {
        self.cfg.mode = mode;
    }

    pub fn recognizer(&self) -> &Recognizer {
        &self.recognizer
    }

    /// Both thumb tips visible and touching.
    fn trigger_on(&self, frame: &LandmarkFrame) -> bool {
        let left = frame.landmark(Hand::Left, landmark::THUMB_TIP).resolved();
        let right = frame.landmark(Hand::Right, landmark::THUMB_TIP).resolved();
        match (left, right) {
            (Some(a), Some(b)) => geom::distance(a, b) <= self.cfg.touch_px,
            _ => false,
        }
    }

    fn level_for_radius(&self, radius: f32) -> AffectLevel {
        if radius < self.cfg.affect_bands[0] {
            AffectLevel::Subtle
        } else if radius < self.cfg.affect_bands[1] {
            AffectLevel::Moderate
        } else {
            AffectLevel::Strong
        }
    }

    /// Close the recording cycle. The buffer is consumed no matter what.
    fn finish(&mut self) -> Option<ChartEvent> {
        let stroke = std::mem::take(&mut self.buffer);
        self.phase = StrokePhase::Idle;

        if stroke.len() < self.cfg.min_points {
            debug!("stroke: {} points, too short, discarded", stroke.len());
            return None;
        }

        if let StrokeMode::Enroll { name } = &self.cfg.mode {
            let name = name.clone();
            return match self.recognizer.add_template(&name, &stroke) {
                Some(n) => {
                    debug!("stroke: enrolled '{}' ({} total)", name, n);
                    Some(ChartEvent::TemplateEnrolled { name })
                }
                None => {
                    debug!("stroke: enrollment stroke degenerate, dropped");
                    None
                }
            };
        }

        let m = self.recognizer.recognize(&stroke)?;
        if m.score < self.cfg.accept_score {
            debug!("stroke: best '{}' at {:.2}, below threshold", m.name, m.score);
            return None;
        }

        if m.name == self.cfg.affect_template {
            let fit = circle::fit(&stroke);
            if fit.success {
                let level = self.level_for_radius(fit.radius);
                debug!(
                    "stroke: '{}' r={:.1} -> {:?} (score {:.2})",
                    m.name, fit.radius, level, m.score
                );
                return Some(ChartEvent::Emphasis { level });
            }
        }

        let bounds = geom::bounding_box(&stroke)?;
        debug!("stroke: matched '{}' at {:.2}", m.name, m.score);
        Some(ChartEvent::Foreshadow {
            shape: ForeshadowShape::Sketch { template: m.name },
            bounds,
        })
    }
}

impl GestureListener for StrokeTrigger {
    fn name(&self) -> &'static str {
        "stroke"
    }

    fn process_frame(
        &mut self,
        frame: &LandmarkFrame,
        _now_ms: u64,
    ) -> Result<Option<ChartEvent>, HoldError> {
        let on = self.trigger_on(frame);
        let rising = on && !self.trigger_was_on;
        self.trigger_was_on = on;

        let mut event = None;
        if rising {
            match self.phase {
                StrokePhase::Idle => {
                    self.buffer.clear();
                    self.phase = StrokePhase::Recording;
                    debug!("stroke: recording started");
                }
                StrokePhase::Recording => {
                    event = self.finish();
                }
            }
        } else if self.phase == StrokePhase::Recording {
            let tip = frame.landmark(self.cfg.hand, landmark::INDEX_TIP);
            if let Some(p) = tip.resolved() {
                if self.cfg.region.contains(p) {
                    self.buffer.push(p);
                }
            }
        }

        if let Some(e) = &event {
            self.last_event = Some(e.clone());
        }
        Ok(event)
    }

    fn reset(&mut self) {
        self.phase = StrokePhase::Idle;
        self.buffer.clear();
        self.trigger_was_on = false;
        self.last_event = None;
    }

    fn current_event(&self) -> Option<&ChartEvent> {
        self.last_event.as_ref()
    }
}
