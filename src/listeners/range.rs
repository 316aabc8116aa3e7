//! Two-hand range-pose listener: hold two fingertips apart to foreshadow a
//! horizontal interval (e.g. a time window on the x axis).

use log::debug;

use super::{GestureListener, pose_sample_both};
use crate::events::{ChartEvent, ForeshadowShape};
use crate::frame::{GestureLabel, LandmarkFrame, landmark};
use crate::geom::{Rect, Region};
use crate::hold::{HoldError, HoldSettings, PoseHold};

#[derive(Debug, Clone)]
pub struct RangePoseConfig {
    pub region: Region,
    pub landmark: usize,
    pub label: Option<GestureLabel>,
    pub hold: HoldSettings,
}

impl RangePoseConfig {
    pub fn for_region(region: Region) -> Self {
        Self {
            region,
            landmark: landmark::INDEX_TIP,
            label: None,
            hold: HoldSettings::default(),
        }
    }
}

pub struct RangePose {
    cfg: RangePoseConfig,
    hold: PoseHold,
    last_event: Option<ChartEvent>,
}

impl RangePose {
    pub fn new(cfg: RangePoseConfig) -> Self {
        let hold = PoseHold::new(cfg.hold);
        Self {
            cfg,
            hold,
            last_event: None,
        }
    }
}

impl GestureListener for RangePose {
    fn name(&self) -> &'static str {
        "range"
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
        let ends = confirm.last.points("range endpoints")?;
        let lo = ends[0].x.min(ends[1].x);
        let hi = ends[0].x.max(ends[1].x);
        debug!("range: confirmed [{:.1}, {:.1}]", lo, hi);
        let event = ChartEvent::Foreshadow {
            shape: ForeshadowShape::Range { lo, hi },
            bounds: Rect::spanning(ends[0], ends[1]),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Hand;
    use crate::listeners::testutil::{frame_with, place};

    fn listener() -> RangePose {
        RangePose::new(RangePoseConfig {
            region: Region::Rect {
                x: 0.0,
                y: 300.0,
                w: 800.0,
                h: 100.0,
            },
            landmark: landmark::INDEX_TIP,
            label: None,
            hold: HoldSettings::default(),
        })
    }

    fn both(t_ms: u64, lx: f32, rx: f32) -> LandmarkFrame {
        let mut frame = frame_with(t_ms, Hand::Left, landmark::INDEX_TIP, lx, 350.0, None);
        place(&mut frame, Hand::Right, landmark::INDEX_TIP, rx, 350.0);
        frame
    }

    #[test]
    fn test_range_is_ordered_regardless_of_hands() {
        let mut l = listener();
        // left hand on the right side of the axis
        l.process_frame(&both(0, 600.0, 150.0), 0).unwrap();
        let e = l
            .process_frame(&both(1000, 600.0, 150.0), 1000)
            .unwrap()
            .unwrap();
        match e {
            ChartEvent::Foreshadow {
                shape: ForeshadowShape::Range { lo, hi },
                ..
            } => {
                assert_eq!(lo, 150.0);
                assert_eq!(hi, 600.0);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_outside_region_never_arms() {
        let mut l = listener();
        // y = 100 is above the axis strip
        let mut frame = frame_with(0, Hand::Left, landmark::INDEX_TIP, 100.0, 100.0, None);
        place(&mut frame, Hand::Right, landmark::INDEX_TIP, 500.0, 100.0);
        for t in [0u64, 500, 1000, 1500] {
            assert!(l.process_frame(&frame, t).unwrap().is_none());
        }
    }
}
