use anyhow::{Result, anyhow};
use directories::UserDirs;
use log::info;
use serde::Deserialize;
use std::{fs, io::Write, path::PathBuf};

use crate::frame::{GestureLabel, Hand, landmark};
use crate::geom::Region;
use crate::unistroke::RecognitionMode;

#[derive(Debug, Clone, Deserialize)]
pub struct Meta {
    pub name: Option<String>,
    /// Gate for stroke-enrollment listeners (writing to the template set).
    #[serde(default)]
    pub allow_enroll: bool,
}

/// Every tunable of the hold/stroke/dial protocols. The shipped defaults
/// (hold 1000ms, 30px drift, 20px thumb touch) suit a 1280x720 canvas;
/// scale the pixel tolerances with your layout.
#[derive(Debug, Clone, Deserialize)]
pub struct Thresholds {
    pub hold_ms: u64,
    pub cooldown_ms: u64,
    pub tolerance_px: f32,
    pub touch_px: f32,
    pub min_stroke_points: usize,
    pub accept_score: f32,
    pub dial_idle_ms: u64,
}

/// One `[[listener]]` table. Kind-specific fields are optional here and
/// checked during validation; the engine converts each declaration into the
/// matching typed listener config.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenerDecl {
    pub kind: String,
    pub region: Region,
    #[serde(default)]
    pub hand: Option<Hand>,
    #[serde(default)]
    pub landmark: Option<String>,
    #[serde(default)]
    pub label: Option<GestureLabel>,
    /// `scrub`/`count` for dial, `recognize`/`enroll` for stroke.
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub enroll_name: Option<String>,
    #[serde(default)]
    pub affect_template: Option<String>,
    #[serde(default)]
    pub recognition: Option<RecognitionMode>,
}

pub const LISTENER_KINDS: [&str; 5] = ["point", "rect", "range", "stroke", "dial"];

#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub meta: Meta,
    pub thresholds: Thresholds,
    #[serde(default, rename = "listener")]
    pub listeners: Vec<ListenerDecl>,
}

impl Profile {
    pub fn parse(text: &str) -> Result<Self> {
        let profile: Profile =
            toml::from_str(text).map_err(|e| anyhow!("failed to parse profile: {e}"))?;
        validate_profile(&profile)?;
        Ok(profile)
    }

    pub fn from_path(path: &std::path::Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
        Self::parse(&text).map_err(|e| anyhow!("{}: {e}", path.display()))
    }
}

#[derive(Debug, Clone)]
pub struct ConfigState {
    pub active_name: String,
    pub profile: Profile,
    pub config_dir: PathBuf,
    pub profiles_dir: PathBuf,
}

fn config_dir() -> PathBuf {
    let home = UserDirs::new()
        .map(|u| u.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".config").join("handcue")
}

fn profiles_dir() -> PathBuf {
    config_dir().join("profiles")
}

fn default_profile_text() -> &'static str {
    include_str!("../profiles/default.toml")
}

impl ConfigState {
    /// Load the default profile, installing the embedded copy on first run.
    pub fn load_or_install_default() -> Result<Self> {
        let cfgdir = config_dir();
        let profdir = profiles_dir();
        fs::create_dir_all(&profdir)?;

        let def_path = profdir.join("default.toml");
        if !def_path.exists() {
            let mut f = fs::File::create(&def_path)?;
            f.write_all(default_profile_text().as_bytes())?;
            info!("installed default profile at {}", def_path.display());
        }

        let profile = Profile::from_path(&def_path)?;
        Ok(Self {
            active_name: "default".to_string(),
            profile,
            config_dir: cfgdir,
            profiles_dir: profdir,
        })
    }

    pub fn load_named(name: &str) -> Result<Self> {
        let mut st = Self::load_or_install_default()?;
        if name != "default" {
            let path = st.profiles_dir.join(format!("{name}.toml"));
            st.profile = Profile::from_path(&path)?;
            st.active_name = name.to_string();
        }
        Ok(st)
    }

    pub fn list_profiles(&self) -> Vec<String> {
        let mut v = Vec::new();
        if let Ok(rd) = fs::read_dir(&self.profiles_dir) {
            for e in rd.flatten() {
                if e.path().extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) = e.path().file_stem().and_then(|s| s.to_str()) {
                        v.push(stem.to_string());
                    }
                }
            }
        }
        v.sort();
        v
    }

    pub fn check_report(&self) -> serde_json::Value {
        let kinds: Vec<&str> = self
            .profile
            .listeners
            .iter()
            .map(|l| l.kind.as_str())
            .collect();
        serde_json::json!({
            "active_profile": self.active_name,
            "profiles_dir": self.profiles_dir,
            "profiles": self.list_profiles(),
            "listeners": kinds,
            "thresholds": {
                "hold_ms": self.profile.thresholds.hold_ms,
                "cooldown_ms": self.profile.thresholds.cooldown_ms,
                "tolerance_px": self.profile.thresholds.tolerance_px,
                "touch_px": self.profile.thresholds.touch_px,
            },
            "allow_enroll": self.profile.meta.allow_enroll,
        })
    }
}

fn validate_profile(p: &Profile) -> Result<()> {
    let th = &p.thresholds;
    if th.hold_ms == 0 || th.cooldown_ms == 0 || th.dial_idle_ms == 0 {
        return Err(anyhow!("thresholds must be positive durations"));
    }
    if !(th.tolerance_px > 0.0 && th.tolerance_px <= 500.0) {
        return Err(anyhow!("thresholds.tolerance_px must be in (0, 500]"));
    }
    if th.touch_px <= 0.0 {
        return Err(anyhow!("thresholds.touch_px must be positive"));
    }
    if !(th.accept_score > 0.0 && th.accept_score <= 1.0) {
        return Err(anyhow!("thresholds.accept_score must be in (0, 1]"));
    }
    if th.min_stroke_points < 2 {
        return Err(anyhow!("thresholds.min_stroke_points must be at least 2"));
    }

    if p.listeners.is_empty() {
        return Err(anyhow!("profile declares no listeners"));
    }
    for (i, l) in p.listeners.iter().enumerate() {
        if !LISTENER_KINDS.contains(&l.kind.as_str()) {
            return Err(anyhow!("listener #{i} has unknown kind '{}'", l.kind));
        }
        if let Some(name) = &l.landmark {
            if landmark::from_name(name).is_none() {
                return Err(anyhow!("listener #{i} has unknown landmark '{name}'"));
            }
        }
        match l.kind.as_str() {
            "dial" => {
                let mode = l.mode.as_deref().unwrap_or("scrub");
                if !matches!(mode, "scrub" | "count") {
                    return Err(anyhow!("listener #{i}: dial mode must be scrub or count"));
                }
            }
            "stroke" => {
                let mode = l.mode.as_deref().unwrap_or("recognize");
                match mode {
                    "recognize" => {}
                    "enroll" => {
                        if l.enroll_name.as_deref().is_none_or(str::is_empty) {
                            return Err(anyhow!(
                                "listener #{i}: enroll mode requires enroll_name"
                            ));
                        }
                        if !p.meta.allow_enroll {
                            return Err(anyhow!(
                                "listener #{i} uses enroll but allow_enroll=false"
                            ));
                        }
                    }
                    other => {
                        return Err(anyhow!(
                            "listener #{i}: stroke mode must be recognize or enroll, got '{other}'"
                        ));
                    }
                }
            }
            _ => {
                if l.mode.is_some() {
                    return Err(anyhow!(
                        "listener #{i}: mode is only valid for stroke and dial listeners"
                    ));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_toml() -> String {
        r#"
            [meta]
            name = "test"
            allow_enroll = false

            [thresholds]
            hold_ms = 1000
            cooldown_ms = 1000
            tolerance_px = 30.0
            touch_px = 20.0
            min_stroke_points = 5
            accept_score = 0.8
            dial_idle_ms = 3000

            [[listener]]
            kind = "point"
            region = { x = 0.0, y = 0.0, w = 800.0, h = 600.0 }
            hand = "right"
            landmark = "index_tip"
            label = "pointing"
        "#
        .to_string()
    }

    #[test]
    fn test_default_profile_parses() {
        let p = Profile::parse(default_profile_text()).unwrap();
        assert!(!p.listeners.is_empty());
    }

    #[test]
    fn test_valid_profile() {
        let p = Profile::parse(&base_toml()).unwrap();
        assert_eq!(p.thresholds.hold_ms, 1000);
        assert_eq!(p.listeners.len(), 1);
        assert_eq!(p.listeners[0].label, Some(GestureLabel::Pointing));
        assert_eq!(p.listeners[0].hand, Some(Hand::Right));
    }

    #[test]
    fn test_zero_duration_rejected() {
        let text = base_toml().replace("hold_ms = 1000", "hold_ms = 0");
        assert!(Profile::parse(&text).is_err());
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let text = base_toml().replace("kind = \"point\"", "kind = \"wave\"");
        assert!(Profile::parse(&text).is_err());
    }

    #[test]
    fn test_unknown_landmark_rejected() {
        let text = base_toml().replace("index_tip", "palm_center");
        assert!(Profile::parse(&text).is_err());
    }

    #[test]
    fn test_enroll_gated_by_meta() {
        let listener = r#"
            [[listener]]
            kind = "stroke"
            region = { x = 0.0, y = 0.0, w = 800.0, h = 600.0 }
            mode = "enroll"
            enroll_name = "lasso"
        "#;
        let text = base_toml() + listener;
        assert!(Profile::parse(&text).is_err());
        let allowed = text.replace("allow_enroll = false", "allow_enroll = true");
        assert!(Profile::parse(&allowed).is_ok());
    }

    #[test]
    fn test_circle_region_parses() {
        let text = base_toml().replace(
            "region = { x = 0.0, y = 0.0, w = 800.0, h = 600.0 }",
            "region = { x = 400.0, y = 300.0, radius = 250.0 }",
        );
        let p = Profile::parse(&text).unwrap();
        assert!(matches!(p.listeners[0].region, Region::Circle { .. }));
    }

    #[test]
    fn test_mode_on_pose_listener_rejected() {
        let text = base_toml() + "mode = \"scrub\"\n";
        assert!(Profile::parse(&text).is_err());
    }
}
