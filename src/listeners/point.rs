//! Single-hand point-pose listener: dwell on a chart location to select it.

use log::debug;

use super::{GestureListener, pose_sample_one};
use crate::events::ChartEvent;
use crate::frame::{GestureLabel, Hand, LandmarkFrame, landmark};
use crate::geom::Region;
use crate::hold::{HoldError, HoldSettings, PoseHold};

#[derive(Debug, Clone)]
pub struct PointPoseConfig {
    pub region: Region,
    pub hand: Hand,
    pub landmark: usize,
    /// Classifier label the hand must carry for a hold to arm.
    pub label: Option<GestureLabel>,
    pub hold: HoldSettings,
}

impl PointPoseConfig {
    pub fn for_region(region: Region) -> Self {
        Self {
            region,
            hand: Hand::Right,
            landmark: landmark::INDEX_TIP,
            label: Some(GestureLabel::Pointing),
            hold: HoldSettings::default(),
        }
    }
}

pub struct PointPose {
    cfg: PointPoseConfig,
    hold: PoseHold,
    last_event: Option<ChartEvent>,
}

impl PointPose {
    pub fn new(cfg: PointPoseConfig) -> Self {
        let hold = PoseHold::new(cfg.hold);
        Self {
            cfg,
            hold,
            last_event: None,
        }
    }
}

impl GestureListener for PointPose {
    fn name(&self) -> &'static str {
        "point"
    }

    fn process_frame(
        &mut self,
        frame: &LandmarkFrame,
        now_ms: u64,
    ) -> Result<Option<ChartEvent>, HoldError> {
        let sample = pose_sample_one(
            frame,
            self.cfg.hand,
            self.cfg.landmark,
            &self.cfg.region,
            self.cfg.label,
        );
        let Some(confirm) = self.hold.observe(sample, now_ms)? else {
            return Ok(None);
        };
        let anchor = confirm.last.points("point selection")?[0];
        debug!("point: selection confirmed at ({:.1}, {:.1})", anchor.x, anchor.y);
        let event = ChartEvent::Select { anchor };
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
