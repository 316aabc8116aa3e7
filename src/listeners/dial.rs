//! Radial/rotational accumulator: a fingertip circling the region center
//! drives playback.
//!
//! The circle is split into four 90° quadrants. A lap counts only when the
//! quadrant sequence advances monotonically through all four in one
//! direction; a skipped quadrant or a direction flip restarts the lap.
//! `count` mode pulses once per lap, `scrub` mode streams the normalized
//! angle once at least one lap has been completed.

use log::debug;

use super::GestureListener;
use crate::events::{ChartEvent, TrackingValue};
use crate::frame::{Hand, LandmarkFrame, landmark};
use crate::geom::Region;
use crate::hold::HoldError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialMode {
    /// Stream `Ratio(angle/360)` after the first completed rotation.
    Scrub,
    /// Emit one `Pulse` per completed rotation.
    Count,
}

#[derive(Debug, Clone)]
pub struct DialConfig {
    pub region: Region,
    pub hand: Hand,
    pub landmark: usize,
    pub mode: DialMode,
    /// With no rotational progress for this long, the lap state clears.
    pub idle_ms: u64,
}

impl DialConfig {
    pub fn for_region(region: Region, mode: DialMode) -> Self {
        Self {
            region,
            hand: Hand::Right,
            landmark: landmark::INDEX_TIP,
            mode,
            idle_ms: 3000,
        }
    }
}

pub struct Dial {
    cfg: DialConfig,
    /// Last angle observed per visited quadrant, oldest first (max 4).
    stack: Vec<f32>,
    /// +1 counter-clockwise, -1 clockwise; unset until two quadrants seen.
    direction: Option<i8>,
    laps: u32,
    last_progress_ms: Option<u64>,
    last_angle: Option<f32>,
    last_event: Option<ChartEvent>,
}

impl Dial {
    pub fn new(cfg: DialConfig) -> Self {
        Self {
            cfg,
            stack: Vec::with_capacity(4),
            direction: None,
            laps: 0,
            last_progress_ms: None,
            last_angle: None,
            last_event: None,
        }
    }

    pub fn laps(&self) -> u32 {
        self.laps
    }

    fn clear_rotation(&mut self) {
        self.stack.clear();
        self.direction = None;
        self.laps = 0;
        self.last_progress_ms = None;
        self.last_angle = None;
    }

    fn quadrant(angle_deg: f32) -> usize {
        ((angle_deg / 90.0) as usize).min(3)
    }

    /// Advance the quadrant stack with a new in-bounds angle; true when a
    /// full lap just completed.
    fn advance(&mut self, angle_deg: f32, now_ms: u64) -> bool {
        let q = Self::quadrant(angle_deg);
        let Some(&last_angle) = self.stack.last() else {
            self.stack.push(angle_deg);
            self.last_progress_ms = Some(now_ms);
            return false;
        };
        let last_q = Self::quadrant(last_angle);
        let step = ((q as i32 - last_q as i32).rem_euclid(4)) as u8;

        match step {
            0 => {
                // wandering inside the same quadrant
                *self.stack.last_mut().expect("non-empty stack") = angle_deg;
                false
            }
            1 | 3 => {
                let dir: i8 = if step == 1 { 1 } else { -1 };
                match self.direction {
                    Some(d) if d != dir => {
                        // direction flip: restart from here
                        self.stack.clear();
                        self.stack.push(angle_deg);
                        self.direction = None;
                        self.last_progress_ms = Some(now_ms);
                        false
                    }
                    _ => {
                        self.direction = Some(dir);
                        self.last_progress_ms = Some(now_ms);
                        if self.stack.len() == 4 {
                            // fifth quadrant in sequence closes the lap
                            self.laps += 1;
                            self.stack.clear();
                            self.stack.push(angle_deg);
                            debug!("dial: lap {} complete", self.laps);
                            true
                        } else {
                            self.stack.push(angle_deg);
                            false
                        }
                    }
                }
            }
            _ => {
                // skipped a quadrant: too fast or tracking glitch, restart
                self.stack.clear();
                self.stack.push(angle_deg);
                self.direction = None;
                self.last_progress_ms = Some(now_ms);
                false
            }
        }
    }
}

impl GestureListener for Dial {
    fn name(&self) -> &'static str {
        "dial"
    }

    fn process_frame(
        &mut self,
        frame: &LandmarkFrame,
        now_ms: u64,
    ) -> Result<Option<ChartEvent>, HoldError> {
        // idle reset applies whether or not the fingertip is visible
        if let Some(t0) = self.last_progress_ms {
            if now_ms.saturating_sub(t0) > self.cfg.idle_ms {
                debug!("dial: idle for {}ms, clearing", now_ms - t0);
                self.clear_rotation();
            }
        }

        let tip = frame.landmark(self.cfg.hand, self.cfg.landmark);
        let Some(p) = tip.resolved() else {
            return Ok(None);
        };
        if !self.cfg.region.contains(p) {
            return Ok(None);
        }

        let center = self.cfg.region.center();
        let mut angle = (p.y - center.y).atan2(p.x - center.x).to_degrees();
        if angle < 0.0 {
            angle += 360.0;
        }

        // any noticeable movement counts as progress for the idle timer
        if let Some(prev) = self.last_angle {
            if (angle - prev).abs() >= 1.0 {
                self.last_progress_ms = Some(now_ms);
            }
        }
        self.last_angle = Some(angle);

        let lap_done = self.advance(angle, now_ms);

        let event = match self.cfg.mode {
            DialMode::Count => lap_done.then_some(ChartEvent::Playback {
                value: TrackingValue::Pulse,
            }),
            DialMode::Scrub => (self.laps >= 1).then_some(ChartEvent::Playback {
                value: TrackingValue::Ratio {
                    value: angle / 360.0,
                },
            }),
        };
        if let Some(e) = &event {
            self.last_event = Some(e.clone());
        }
        Ok(event)
    }

    fn reset(&mut self) {
        self.clear_rotation();
        self.last_event = None;
    }

    fn current_event(&self) -> Option<&ChartEvent> {
        self.last_event.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listeners::testutil::frame_with;

    const REGION: Region = Region::Circle {
        x: 500.0,
        y: 500.0,
        radius: 300.0,
    };

    fn dial(mode: DialMode) -> Dial {
        Dial::new(DialConfig::for_region(REGION, mode))
    }

    fn at_angle(t_ms: u64, deg: f32) -> LandmarkFrame {
        let rad = deg.to_radians();
        frame_with(
            t_ms,
            Hand::Right,
            landmark::INDEX_TIP,
            500.0 + 200.0 * rad.cos(),
            500.0 + 200.0 * rad.sin(),
            None,
        )
    }

    /// Feed a sweep of angles at 40ms spacing, returning emitted events.
    fn sweep(d: &mut Dial, start_t: u64, degs: &[f32]) -> Vec<ChartEvent> {
        let mut out = Vec::new();
        for (i, &deg) in degs.iter().enumerate() {
            let t = start_t + i as u64 * 40;
            if let Some(e) = d.process_frame(&at_angle(t, deg), t).unwrap() {
                out.push(e);
            }
        }
        out
    }

    fn full_lap() -> Vec<f32> {
        (0..=12).map(|i| i as f32 * 30.0 % 360.0).collect()
    }

    #[test]
    fn test_count_mode_pulses_once_per_lap() {
        let mut d = dial(DialMode::Count);
        let events = sweep(&mut d, 0, &full_lap());
        assert_eq!(
            events,
            vec![ChartEvent::Playback {
                value: TrackingValue::Pulse
            }]
        );
        assert_eq!(d.laps(), 1);
    }

    #[test]
    fn test_two_laps_two_pulses() {
        let mut d = dial(DialMode::Count);
        let mut degs = full_lap();
        degs.extend(full_lap().iter().skip(1));
        let events = sweep(&mut d, 0, &degs);
        assert_eq!(events.len(), 2);
        assert_eq!(d.laps(), 2);
    }

    #[test]
    fn test_scrub_streams_after_first_lap() {
        let mut d = dial(DialMode::Scrub);
        let events = sweep(&mut d, 0, &full_lap());
        // nothing until the lap closes, then a ratio per frame
        assert_eq!(events.len(), 1);
        let more = sweep(&mut d, 1000, &[45.0, 50.0, 55.0]);
        assert_eq!(more.len(), 3);
        match more[0] {
            ChartEvent::Playback {
                value: TrackingValue::Ratio { value },
            } => assert!((value - 0.125).abs() < 0.01),
            ref other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_direction_flip_restarts_lap() {
        let mut d = dial(DialMode::Count);
        // three quadrants forward, then back the other way
        let events = sweep(&mut d, 0, &[10.0, 100.0, 190.0, 100.0, 10.0, 280.0, 190.0]);
        assert!(events.is_empty());
        assert_eq!(d.laps(), 0);
    }

    #[test]
    fn test_quadrant_skip_restarts_lap() {
        let mut d = dial(DialMode::Count);
        // 10 -> 100 -> 280 jumps two quadrants
        let events = sweep(&mut d, 0, &[10.0, 100.0, 280.0, 10.0, 100.0, 190.0]);
        assert!(events.is_empty());
    }

    #[test]
    fn test_idle_timeout_clears() {
        let mut d = dial(DialMode::Count);
        sweep(&mut d, 0, &[10.0, 100.0, 190.0]);
        assert_eq!(d.stack.len(), 3);
        // long gap with the fingertip parked
        let t = 8000;
        d.process_frame(&at_angle(t, 190.0), t).unwrap();
        assert_eq!(d.stack.len(), 1);
        assert_eq!(d.laps(), 0);
    }

    #[test]
    fn test_clockwise_lap_also_counts() {
        let mut d = dial(DialMode::Count);
        let degs: Vec<f32> = (0..=12).map(|i| (360.0 - i as f32 * 30.0) % 360.0).collect();
        let events = sweep(&mut d, 0, &degs);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_fingertip_missing_is_silent() {
        let mut d = dial(DialMode::Scrub);
        let empty = LandmarkFrame::default();
        assert!(d.process_frame(&empty, 0).unwrap().is_none());
    }
}
