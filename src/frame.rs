//! Per-frame landmark input from the external hand-tracking classifier.
//!
//! One [`LandmarkFrame`] arrives per video frame and is processed to
//! completion before the next. The engine never sees raw video; it gets 2D
//! landmark positions (21 per hand, MediaPipe numbering) plus the
//! classifier's best discrete label per hand.

use serde::{Deserialize, Serialize};

use crate::geom::TrackedPoint;

/// MediaPipe hand landmark indices.
pub mod landmark {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_DIP: usize = 7;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_DIP: usize = 15;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;

    pub const COUNT: usize = 21;

    /// Parse a config-file landmark name.
    pub fn from_name(name: &str) -> Option<usize> {
        let id = match name {
            "wrist" => WRIST,
            "thumb_cmc" => THUMB_CMC,
            "thumb_mcp" => THUMB_MCP,
            "thumb_ip" => THUMB_IP,
            "thumb_tip" => THUMB_TIP,
            "index_mcp" => INDEX_MCP,
            "index_pip" => INDEX_PIP,
            "index_dip" => INDEX_DIP,
            "index_tip" => INDEX_TIP,
            "middle_mcp" => MIDDLE_MCP,
            "middle_pip" => MIDDLE_PIP,
            "middle_dip" => MIDDLE_DIP,
            "middle_tip" => MIDDLE_TIP,
            "ring_mcp" => RING_MCP,
            "ring_pip" => RING_PIP,
            "ring_dip" => RING_DIP,
            "ring_tip" => RING_TIP,
            "pinky_mcp" => PINKY_MCP,
            "pinky_pip" => PINKY_PIP,
            "pinky_dip" => PINKY_DIP,
            "pinky_tip" => PINKY_TIP,
            _ => return None,
        };
        Some(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    pub fn other(&self) -> Hand {
        match self {
            Self::Left => Hand::Right,
            Self::Right => Hand::Left,
        }
    }
}

/// Discrete pose label the upstream classifier attaches to a hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GestureLabel {
    Pointing,
    OpenHand,
    Fist,
    ThumbsUp,
}

impl GestureLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pointing => "pointing",
            Self::OpenHand => "open-hand",
            Self::Fist => "fist",
            Self::ThumbsUp => "thumbs-up",
        }
    }
}

/// One hand's landmarks for a single frame. Landmarks the tracker lost are
/// present as [`TrackedPoint::missing`] entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandFrame {
    #[serde(default)]
    pub label: Option<GestureLabel>,
    #[serde(default)]
    pub landmarks: Vec<TrackedPoint>,
}

impl HandFrame {
    /// Position of one landmark; out-of-range ids read as missing.
    pub fn landmark(&self, id: usize) -> TrackedPoint {
        self.landmarks.get(id).copied().unwrap_or_default()
    }

    pub fn has_label(&self, label: GestureLabel) -> bool {
        self.label == Some(label)
    }
}

/// The per-frame bundle handed to the engine: both hands (either may be
/// absent) and the frame timestamp used to advance listener timers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Milliseconds since an arbitrary session start.
    pub t_ms: u64,
    #[serde(default)]
    pub left: Option<HandFrame>,
    #[serde(default)]
    pub right: Option<HandFrame>,
}

impl LandmarkFrame {
    pub fn hand(&self, hand: Hand) -> Option<&HandFrame> {
        match hand {
            Hand::Left => self.left.as_ref(),
            Hand::Right => self.right.as_ref(),
        }
    }

    /// Landmark position for (hand, id); missing when the hand itself is
    /// absent this frame.
    pub fn landmark(&self, hand: Hand, id: usize) -> TrackedPoint {
        self.hand(hand)
            .map(|h| h.landmark(id))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_names_round_trip() {
        assert_eq!(landmark::from_name("index_tip"), Some(landmark::INDEX_TIP));
        assert_eq!(landmark::from_name("wrist"), Some(0));
        assert_eq!(landmark::from_name("palm"), None);
    }

    #[test]
    fn test_missing_hand_reads_as_missing_landmark() {
        let frame = LandmarkFrame::default();
        assert_eq!(
            frame.landmark(Hand::Left, landmark::INDEX_TIP).resolved(),
            None
        );
    }

    #[test]
    fn test_out_of_range_landmark_is_missing() {
        let hf = HandFrame {
            label: None,
            landmarks: vec![TrackedPoint::at(1.0, 2.0)],
        };
        assert!(hf.landmark(0).resolved().is_some());
        assert!(hf.landmark(landmark::PINKY_TIP).resolved().is_none());
    }

    #[test]
    fn test_frame_json_shape() {
        let json = r#"{
            "t_ms": 42,
            "right": {
                "label": "pointing",
                "landmarks": [{"x": 1.0, "y": 2.0}, {"x": null, "y": 3.0}]
            }
        }"#;
        let frame: LandmarkFrame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.t_ms, 42);
        assert!(frame.left.is_none());
        let right = frame.right.unwrap();
        assert_eq!(right.label, Some(GestureLabel::Pointing));
        assert!(right.landmark(0).resolved().is_some());
        assert!(right.landmark(1).resolved().is_none());
    }
}
