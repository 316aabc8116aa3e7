//! The frame-driven engine: owns every listener, feeds each incoming frame
//! to all of them synchronously, and pushes confirmed events to the
//! registered sinks.
//!
//! Single-threaded by design. A frame is processed to completion before the
//! next one is accepted; there is no queueing and no shared mutable state
//! between listeners.

use anyhow::{Context, Result};
use log::{debug, warn};

use crate::config::{ListenerDecl, Profile, Thresholds};
use crate::events::{Emitted, SinkRegistry};
use crate::frame::{Hand, LandmarkFrame, landmark};
use crate::hold::HoldSettings;
use crate::listeners::GestureListener;
use crate::listeners::dial::{Dial, DialConfig, DialMode};
use crate::listeners::point::{PointPose, PointPoseConfig};
use crate::listeners::range::{RangePose, RangePoseConfig};
use crate::listeners::rect::{RectPose, RectPoseConfig};
use crate::listeners::stroke::{StrokeConfig, StrokeMode, StrokeTrigger};

pub struct Engine {
    listeners: Vec<Box<dyn GestureListener>>,
    sinks: SinkRegistry,
    frames_seen: u64,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            sinks: SinkRegistry::new(),
            frames_seen: 0,
        }
    }

    /// Instantiate every listener a profile declares.
    pub fn from_profile(profile: &Profile) -> Result<Self> {
        let mut engine = Self::new();
        for (i, decl) in profile.listeners.iter().enumerate() {
            let listener = build_listener(decl, &profile.thresholds)
                .with_context(|| format!("listener #{i} ({})", decl.kind))?;
            engine.add_listener(listener);
        }
        debug!("engine: {} listeners", engine.listeners.len());
        Ok(engine)
    }

    pub fn add_listener(&mut self, listener: Box<dyn GestureListener>) {
        self.listeners.push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// Register a chart-layer callback; every confirmed event is pushed to
    /// every sink, in registration order, before `process` returns.
    pub fn subscribe(&mut self, sink: impl FnMut(&Emitted) + 'static) {
        self.sinks.subscribe(sink);
    }

    /// Run one frame through every listener and drain confirmations.
    pub fn process(&mut self, frame: &LandmarkFrame) -> Result<Vec<Emitted>> {
        self.frames_seen += 1;
        let now_ms = frame.t_ms;
        let mut out = Vec::new();
        for listener in &mut self.listeners {
            let confirmed = listener
                .process_frame(frame, now_ms)
                .with_context(|| format!("{} listener, frame t={}ms", listener.name(), now_ms))?;
            if let Some(event) = confirmed {
                out.push(Emitted {
                    t_ms: now_ms,
                    listener: listener.name(),
                    event,
                });
            }
        }
        for e in &out {
            self.sinks.publish(e);
        }
        Ok(out)
    }

    /// Cancel every in-flight cycle (pending timers, snapshots, buffers).
    pub fn reset(&mut self) {
        for listener in &mut self.listeners {
            listener.reset();
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

fn hold_settings(th: &Thresholds) -> HoldSettings {
    HoldSettings {
        hold_ms: th.hold_ms,
        cooldown_ms: th.cooldown_ms,
        tolerance_px: th.tolerance_px,
    }
}

fn landmark_id(decl: &ListenerDecl) -> usize {
    decl.landmark
        .as_deref()
        .and_then(landmark::from_name)
        .unwrap_or(landmark::INDEX_TIP)
}

fn build_listener(decl: &ListenerDecl, th: &Thresholds) -> Result<Box<dyn GestureListener>> {
    let hand = decl.hand.unwrap_or(Hand::Right);
    let listener: Box<dyn GestureListener> = match decl.kind.as_str() {
        "point" => Box::new(PointPose::new(PointPoseConfig {
            region: decl.region,
            hand,
            landmark: landmark_id(decl),
            label: decl.label,
            hold: hold_settings(th),
        })),
        "rect" => Box::new(RectPose::new(RectPoseConfig {
            region: decl.region,
            landmark: landmark_id(decl),
            label: decl.label,
            hold: hold_settings(th),
        })),
        "range" => Box::new(RangePose::new(RangePoseConfig {
            region: decl.region,
            landmark: landmark_id(decl),
            label: decl.label,
            hold: hold_settings(th),
        })),
        "stroke" => {
            let mode = match decl.mode.as_deref() {
                Some("enroll") => StrokeMode::Enroll {
                    name: decl
                        .enroll_name
                        .clone()
                        .context("enroll mode requires enroll_name")?,
                },
                _ => StrokeMode::Recognize,
            };
            let mut cfg = StrokeConfig::for_region(decl.region);
            cfg.hand = hand;
            cfg.touch_px = th.touch_px;
            cfg.min_points = th.min_stroke_points;
            cfg.accept_score = th.accept_score;
            cfg.mode = mode;
            if let Some(t) = &decl.affect_template {
                cfg.affect_template = t.clone();
            }
            if let Some(r) = decl.recognition {
                cfg.recognition = r;
            }
            Box::new(StrokeTrigger::new(cfg))
        }
        "dial" => {
            let mode = match decl.mode.as_deref() {
                Some("count") => DialMode::Count,
                _ => DialMode::Scrub,
            };
            let mut cfg = DialConfig::for_region(decl.region, mode);
            cfg.hand = hand;
            cfg.landmark = landmark_id(decl);
            cfg.idle_ms = th.dial_idle_ms;
            Box::new(Dial::new(cfg))
        }
        other => {
            // validation screens kinds; reaching this is a programming error
            warn!("engine: unknown listener kind '{other}' survived validation");
            anyhow::bail!("unknown listener kind '{other}'");
        }
    };
    Ok(listener)
}
