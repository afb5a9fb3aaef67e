//! Viewer settings with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. Built-in defaults
//! 2. An optional JSON settings file (`--settings`)
//! 3. Environment variables: `CONTIG_VIEW_*` (e.g. `CONTIG_VIEW_LINK_DISTANCE=40`)

use std::ops::Deref;
use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use serde::{Deserialize, Serialize};

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColorMode {
    #[default]
    Depth,
    Length,
    Random,
    Uniform,
}

impl ColorMode {
    pub const ALL: [Self; 4] = [Self::Depth, Self::Length, Self::Random, Self::Uniform];

    pub fn label(self) -> &'static str {
        match self {
            Self::Depth => "Depth",
            Self::Length => "Length",
            Self::Random => "Random",
            Self::Uniform => "Uniform",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundTheme {
    #[default]
    Dark,
    Light,
}

/// Everything the host UI can tune. Geometry fields force a segment graph
/// rebuild, force fields only retune the running simulation, and the rest is
/// presentation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Segment stroke width in pixels.
    pub node_width_scale: f32,
    /// Multiplier applied to every contig's visual length.
    pub node_length_scale: f32,
    /// Target distance of link springs.
    pub link_distance: f32,
    /// Many-body strength; negative values repel.
    pub charge_strength: f32,
    /// Minimum spacing kept between segment endpoints.
    pub collision_radius: f32,
    /// Components with fewer contigs than this are not rendered.
    pub min_nodes_to_render: usize,
    /// Upper bound on integration steps per frame.
    pub steps_per_frame: usize,
    pub color_mode: ColorMode,
    pub show_labels: bool,
    pub show_arrows: bool,
    pub label_outline: bool,
    pub background: BackgroundTheme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            node_width_scale: 5.0,
            node_length_scale: 1.0,
            link_distance: 30.0,
            charge_strength: -60.0,
            collision_radius: 4.0,
            min_nodes_to_render: 0,
            steps_per_frame: 1,
            color_mode: ColorMode::Depth,
            show_labels: false,
            show_arrows: true,
            label_outline: true,
            background: BackgroundTheme::Dark,
        }
    }
}

/// What the engine has to redo after a settings change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SettingsImpact {
    pub rebuild: bool,
    pub forces: bool,
}

impl SettingsImpact {
    pub fn is_cosmetic(self) -> bool {
        !self.rebuild && !self.forces
    }
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(path) = path {
            figment = figment.merge(Json::file(path));
        }
        figment = figment
            .merge(Env::prefixed("CONTIG_VIEW_").map(|key| snake_to_camel(key.as_str()).into()));

        let settings: Settings = figment.extract()?;
        Ok(settings.sanitized())
    }

    pub fn sanitized(mut self) -> Self {
        self.node_width_scale = finite_or(self.node_width_scale, 5.0).clamp(0.5, 60.0);
        self.node_length_scale = finite_or(self.node_length_scale, 1.0).clamp(0.05, 20.0);
        self.link_distance = finite_or(self.link_distance, 30.0).clamp(1.0, 600.0);
        self.charge_strength = finite_or(self.charge_strength, -60.0).clamp(-2000.0, 0.0);
        self.collision_radius = finite_or(self.collision_radius, 4.0).clamp(0.0, 80.0);
        self.steps_per_frame = self.steps_per_frame.clamp(1, 16);
        self
    }

    pub fn impact(&self, next: &Settings) -> SettingsImpact {
        SettingsImpact {
            rebuild: self.min_nodes_to_render != next.min_nodes_to_render
                || self.node_width_scale != next.node_width_scale
                || self.node_length_scale != next.node_length_scale,
            forces: self.link_distance != next.link_distance
                || self.charge_strength != next.charge_strength
                || self.collision_radius != next.collision_radius,
        }
    }
}

fn snake_to_camel(key: &str) -> String {
    let mut camel = String::with_capacity(key.len());
    let mut upper_next = false;
    for ch in key.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            camel.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            camel.push(ch.to_ascii_lowercase());
        }
    }
    camel
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosmetic_changes_touch_nothing_physical() {
        let base = Settings::default();
        let next = Settings {
            color_mode: ColorMode::Random,
            show_labels: true,
            show_arrows: false,
            label_outline: false,
            background: BackgroundTheme::Light,
            ..base.clone()
        };
        assert!(base.impact(&next).is_cosmetic());
    }

    #[test]
    fn geometry_and_force_changes_are_classified() {
        let base = Settings::default();

        let wider = Settings {
            node_width_scale: 9.0,
            ..base.clone()
        };
        assert_eq!(
            base.impact(&wider),
            SettingsImpact {
                rebuild: true,
                forces: false
            }
        );

        let stronger = Settings {
            charge_strength: -200.0,
            ..base.clone()
        };
        assert_eq!(
            base.impact(&stronger),
            SettingsImpact {
                rebuild: false,
                forces: true
            }
        );
    }

    #[test]
    fn sanitizing_clamps_out_of_range_values() {
        let settings = Settings {
            node_length_scale: 0.0,
            charge_strength: 50.0,
            link_distance: f32::NAN,
            steps_per_frame: 0,
            ..Settings::default()
        }
        .sanitized();

        assert!(settings.node_length_scale > 0.0);
        assert_eq!(settings.charge_strength, 0.0);
        assert_eq!(settings.link_distance, 30.0);
        assert_eq!(settings.steps_per_frame, 1);
    }

    #[test]
    fn env_keys_map_to_camel_case_fields() {
        assert_eq!(snake_to_camel("link_distance"), "linkDistance");
        assert_eq!(snake_to_camel("MIN_NODES_TO_RENDER"), "minNodesToRender");
        assert_eq!(snake_to_camel("background"), "background");
    }

    #[test]
    fn json_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"linkDistance": 55.0, "colorMode": "LENGTH", "minNodesToRender": 3}"#,
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.link_distance, 55.0);
        assert_eq!(settings.color_mode, ColorMode::Length);
        assert_eq!(settings.min_nodes_to_render, 3);
        assert_eq!(settings.charge_strength, Settings::default().charge_strength);
    }
}
