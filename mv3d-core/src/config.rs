//! Viewer configuration.
//!
//! The configuration is a JSON document in which every field is optional. It is read from an
//! explicit path, or from `<config dir>/mineview3d/config.json` when that file exists, and falls
//! back to built-in defaults otherwise.

use std::{
    fs,
    path::{Path, PathBuf},
};

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::{
    camera::Camera,
    error::{Error, Result},
    mesh::{IndexBase, LoadOptions},
};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub mesh: MeshConfig,
    pub camera: CameraConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "3D Model Viewer".to_string(),
            width: 1280,
            height: 960,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    pub path: PathBuf,
    pub index_base: IndexBase,
    pub strict: bool,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./gopher.obj"),
            index_base: IndexBase::OneBased,
            strict: false,
        }
    }
}

impl MeshConfig {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            index_base: self.index_base,
            strict: self.strict,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub eye: [f32; 3],
    pub target: [f32; 3],
    pub up: [f32; 3],
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: [0.0, 10.0, 10.0],
            target: [0.0, 3.0, 0.0],
            up: [0.0, 1.0, 0.0],
            fov_degrees: 45.0,
            near: 1.0,
            far: 10000.0,
        }
    }
}

impl CameraConfig {
    /// Builds a camera for a viewport of the given size.
    pub fn camera(&self, width: u32, height: u32) -> Camera {
        let mut camera = Camera {
            eye: Vec3::from(self.eye),
            target: Vec3::from(self.target),
            up: Vec3::from(self.up),
            fov_y_rad: self.fov_degrees.to_radians(),
            aspect: 1.0,
            z_near: self.near,
            z_far: self.far,
        };
        camera.set_viewport(width, height);
        camera
    }
}

/// Primitive topology used to interpret the index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    #[default]
    Triangles,
    TriangleFan,
}

/// Where fragment colors come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSource {
    #[default]
    PerVertex,
    Constant,
}

/// Named render presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Camera and projection uniforms, triangle list, per-vertex color.
    Perspective,
    /// Pre-transformed positions, triangle fan, per-vertex color.
    Flat,
    /// Pre-transformed positions, triangle fan, one constant color.
    Constant,
}

impl std::str::FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "perspective" => Ok(Variant::Perspective),
            "flat" => Ok(Variant::Flat),
            "constant" => Ok(Variant::Constant),
            other => Err(Error::Usage(format!(
                "unknown variant '{other}' (expected perspective, flat or constant)"
            ))),
        }
    }
}

/// Everything that changes between the viewer's program variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub camera_uniforms: bool,
    pub topology: Topology,
    pub color_source: ColorSource,
    /// Radians per second.
    pub rotation_speed: f64,
    pub clear_color: [f32; 4],
    /// Used when `color_source` is [`ColorSource::Constant`].
    pub flat_color: [f32; 4],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::preset(Variant::Perspective)
    }
}

impl RenderConfig {
    pub fn preset(variant: Variant) -> Self {
        let (camera_uniforms, topology, color_source) = match variant {
            Variant::Perspective => (true, Topology::Triangles, ColorSource::PerVertex),
            Variant::Flat => (false, Topology::TriangleFan, ColorSource::PerVertex),
            Variant::Constant => (false, Topology::TriangleFan, ColorSource::Constant),
        };

        Self {
            camera_uniforms,
            topology,
            color_source,
            rotation_speed: 1.0,
            clear_color: [0.0, 0.0, 1.0, 1.0],
            flat_color: [1.0, 1.0, 1.0, 1.0],
        }
    }

    /// Switches to a preset while keeping speed and colors.
    pub fn apply(&mut self, variant: Variant) {
        let preset = Self::preset(variant);
        self.camera_uniforms = preset.camera_uniforms;
        self.topology = preset.topology;
        self.color_source = preset.color_source;
    }

    pub fn clear_color(&self) -> Vec4 {
        Vec4::from(self.clear_color)
    }

    pub fn flat_color(&self) -> Vec4 {
        Vec4::from(self.flat_color)
    }
}

impl ViewerConfig {
    /// Location of the per-user configuration file, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mineview3d").join("config.json"))
    }

    /// Reads and parses a configuration file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|e| match e {
            Error::Config { reason, .. } => Error::Config {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Config {
            path: PathBuf::from("<string>"),
            reason: e.to_string(),
        })
    }

    /// Resolves the configuration: an explicit path must exist, the per-user file is used when
    /// present, and defaults apply otherwise.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            log::info!("Using configuration {}", path.display());
            return Self::from_path(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => {
                log::info!("Using configuration {}", path.display());
                Self::from_path(&path)
            }
            _ => {
                log::debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn to_json(&self) -> String {
        // Serializing plain data with string keys cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_stock_viewer() {
        let config = ViewerConfig::default();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 960);
        assert_eq!(config.mesh.index_base, IndexBase::OneBased);
        assert!(config.render.camera_uniforms);
        assert_eq!(config.render.topology, Topology::Triangles);
        assert_eq!(config.render.clear_color, [0.0, 0.0, 1.0, 1.0]);

        let camera = config.camera.camera(1280, 960);
        assert_eq!(camera.eye, Vec3::new(0.0, 10.0, 10.0));
        assert!((camera.aspect - 4.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = ViewerConfig::from_json(
            r#"{ "mesh": { "path": "teapot.obj", "index_base": "raw" },
                 "render": { "topology": "triangle_fan", "rotation_speed": 2.5 } }"#,
        )
        .unwrap();
        assert_eq!(config.mesh.path, PathBuf::from("teapot.obj"));
        assert_eq!(config.mesh.index_base, IndexBase::Raw);
        assert!(!config.mesh.strict);
        assert_eq!(config.render.topology, Topology::TriangleFan);
        assert_eq!(config.render.rotation_speed, 2.5);
        assert!(config.render.camera_uniforms);
        assert_eq!(config.window, WindowConfig::default());
    }

    #[test]
    fn json_round_trips() {
        let mut config = ViewerConfig::default();
        config.render.apply(Variant::Constant);
        let parsed = ViewerConfig::from_json(&config.to_json()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn bad_json_is_a_config_error() {
        assert!(matches!(
            ViewerConfig::from_json("{ \"window\": 3 }"),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn missing_explicit_file_is_an_io_error() {
        assert!(matches!(
            ViewerConfig::resolve(Some(Path::new("no/such/config.json"))),
            Err(Error::Io { .. })
        ));
    }

    #[test]
    fn presets() {
        let flat = RenderConfig::preset(Variant::Flat);
        assert!(!flat.camera_uniforms);
        assert_eq!(flat.topology, Topology::TriangleFan);
        assert_eq!(flat.color_source, ColorSource::PerVertex);

        assert_eq!("Constant".parse::<Variant>().unwrap(), Variant::Constant);
        assert!(matches!("wire".parse::<Variant>(), Err(Error::Usage(_))));
    }
}
