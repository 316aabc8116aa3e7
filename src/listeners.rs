//! Gesture listeners: state machines that turn per-frame landmark samples
//! into confirmed chart events.
//!
//! Each listener owns its region, its tracked landmark set, and whatever
//! hold/stroke state its variant needs. Listeners never share state; the
//! engine feeds every frame to each of them in turn.

pub mod dial;
pub mod point;
pub mod range;
pub mod rect;
pub mod stroke;

use crate::events::ChartEvent;
use crate::frame::{GestureLabel, Hand, LandmarkFrame};
use crate::geom::Region;
use crate::hold::{HoldError, PosePosition};

pub trait GestureListener {
    fn name(&self) -> &'static str;

    /// Consume one frame. `now_ms` is the frame timestamp; it is the only
    /// clock listeners ever see. Returns a confirmed event at most once per
    /// completed cycle. Errors are contract violations, not user noise.
    fn process_frame(
        &mut self,
        frame: &LandmarkFrame,
        now_ms: u64,
    ) -> Result<Option<ChartEvent>, HoldError>;

    /// Abandon any in-flight cycle: snapshot, buffer, and timer together.
    fn reset(&mut self);

    /// Last confirmed event, if any.
    fn current_event(&self) -> Option<&ChartEvent>;
}

/// Build a one-hand hold sample: the landmark must be visible, inside the
/// region, and the hand must carry the required label (when one is set).
/// Anything less is "no sample" — expected incompleteness, never an error.
pub(crate) fn pose_sample_one(
    frame: &LandmarkFrame,
    hand: Hand,
    landmark: usize,
    region: &Region,
    label: Option<GestureLabel>,
) -> Option<PosePosition> {
    let hf = frame.hand(hand)?;
    if let Some(required) = label {
        if !hf.has_label(required) {
            return None;
        }
    }
    let tp = hf.landmark(landmark);
    if region.contains_tracked(&tp) != Some(true) {
        return None;
    }
    let mut sample = PosePosition::new();
    sample.push(hand, landmark, tp);
    Some(sample)
}

/// Build a two-hand hold sample: the corresponding landmark on **both**
/// hands must pass the same checks simultaneously.
pub(crate) fn pose_sample_both(
    frame: &LandmarkFrame,
    landmark: usize,
    region: &Region,
    label: Option<GestureLabel>,
) -> Option<PosePosition> {
    let mut sample = PosePosition::new();
    for hand in [Hand::Left, Hand::Right] {
        let one = pose_sample_one(frame, hand, landmark, region, label)?;
        let tp = one.get(hand, landmark)?;
        sample.push(hand, landmark, tp);
    }
    Some(sample)
}

#[cfg(test)]
pub(crate) mod testutil {
    use crate::frame::{GestureLabel, Hand, HandFrame, LandmarkFrame, landmark};
    use crate::geom::TrackedPoint;

    /// A frame with one hand present and a single landmark placed.
    pub fn frame_with(
        t_ms: u64,
        hand: Hand,
        id: usize,
        x: f32,
        y: f32,
        label: Option<GestureLabel>,
    ) -> LandmarkFrame {
        let mut hf = HandFrame {
            label,
            landmarks: vec![TrackedPoint::missing(); landmark::COUNT],
        };
        hf.landmarks[id] = TrackedPoint::at(x, y);
        let mut frame = LandmarkFrame {
            t_ms,
            ..Default::default()
        };
        match hand {
            Hand::Left => frame.left = Some(hf),
            Hand::Right => frame.right = Some(hf),
        }
        frame
    }

    /// Place one landmark on an already-built frame's hand (adding the hand
    /// if absent).
    pub fn place(frame: &mut LandmarkFrame, hand: Hand, id: usize, x: f32, y: f32) {
        let slot = match hand {
            Hand::Left => &mut frame.left,
            Hand::Right => &mut frame.right,
        };
        let hf = slot.get_or_insert_with(|| HandFrame {
            label: None,
            landmarks: vec![TrackedPoint::missing(); landmark::COUNT],
        });
        hf.landmarks[id] = TrackedPoint::at(x, y);
    }

    pub fn set_label(frame: &mut LandmarkFrame, hand: Hand, label: GestureLabel) {
        let slot = match hand {
            Hand::Left => &mut frame.left,
            Hand::Right => &mut frame.right,
        };
        if let Some(hf) = slot {
            hf.label = Some(label);
        }
    }
}
