//! Two-hand rectangle-pose listener: hold two fingertips as opposite
//! corners to foreshadow a rectangular area.

use log::debug;

use super::{GestureListener, pose_sample_both};
use crate::events::{ChartEvent, ForeshadowShape};
use crate::frame::{GestureLabel, LandmarkFrame, landmark};
use crate::geom::{Rect, Region};
use crate::hold::{HoldError, HoldSettings, PoseHold};

#[derive(Debug, Clone)]
pub struct RectPoseConfig {
    pub region: Region,
    /// Landmark tracked on each hand (the two become opposite corners).
    pub landmark: usize,
    pub label: Option<GestureLabel>,
    pub hold: HoldSettings,
}

impl RectPoseConfig {
    pub fn for_region(region: Region) -> Self {
        Self {
            region,
            landmark: landmark::INDEX_TIP,
            label: None,
            hold: HoldSettings::default(),
        }
    }
}

pub struct RectPose {
    cfg: RectPoseConfig,
    hold: PoseHold,
    last_event: Option<ChartEvent>,
}

impl RectPose {
    pub fn new(cfg: RectPoseConfig) -> Self {
        let hold = PoseHold::new(cfg.hold);
        Self {
            cfg,
            hold,
            last_event: None,
        }
    }
}

impl GestureListener for RectPose {
    fn name(&self) -> &'static str {
        "rect"
    }

    fn process_frame(
        &mut self,
        frame: &LandmarkFrame,
        now_ms: u64,
    ) -> Result<Option<ChartEvent>, HoldError> {
        let sample = pose_sample_both(frame, self.cfg.landmark, &self.cfg.region, self.cfg.label);
        let Some(confirm) = self.hold.observe(sample, now_ms)? else {
            return Ok(None);
        };
        let corners = confirm.last.points("rect corners")?;
        let bounds = Rect::spanning(corners[0], corners[1]);
        debug!(
            "rect: confirmed {}x{} at ({:.1}, {:.1})",
            bounds.w, bounds.h, bounds.x, bounds.y
        );
        let event = ChartEvent::Foreshadow {
            shape: ForeshadowShape::Rect,
            bounds,
        };
        self.last_event = Some(event.clone());
        Ok(Some(event))
    }

    fn reset(&mut self) {
        self.hold.reset();
        self.last_event = None;
    }

    fn current_event(&self) -> Option<&ChartEvent> {
        self.last_event.as_ref()
    }
}
