//! # AR Configuration
//!
//! Groups the tracking-session, rendering and diagnostics settings for an
//! [`ArRenderer`](crate::session::ArRenderer). Every value is fixed once the
//! renderer is created; the single exception is the world-alignment mode,
//! which fault recovery may switch to [`WorldAlignment::Gravity`].
//!
//! ## Defaults
//!
//! | Setting                         | Default                    |
//! |---------------------------------|----------------------------|
//! | plane detection                 | horizontal + vertical      |
//! | world alignment                 | gravity and heading        |
//! | depth/stencil format            | 32-bit float depth         |
//! | preferred frames per second     | 120                        |
//! | camera near / far               | 0.01 / 100.0               |
//! | clear color                     | transparent black          |

use ash::vk;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};

bitflags! {
    /// Kinds of planar surfaces the tracking service should detect
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct PlaneDetection: u32 {
        /// Floors, tables and other horizontal surfaces
        const HORIZONTAL = 1 << 0;
        /// Walls and other vertical surfaces
        const VERTICAL = 1 << 1;
    }
}

impl Default for PlaneDetection {
    fn default() -> Self {
        Self::HORIZONTAL | Self::VERTICAL
    }
}

/// How the tracking service orients its world coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldAlignment {
    /// Y axis parallel to gravity, origin and heading from the initial device pose
    Gravity,
    /// Y axis parallel to gravity, -Z pointing to true north
    #[default]
    GravityAndHeading,
    /// World space locked to the camera's orientation
    Camera,
}

/// Settings handed to the tracking service on every `run`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfiguration {
    /// Surfaces to detect
    pub plane_detection: PlaneDetection,
    /// World coordinate alignment
    pub world_alignment: WorldAlignment,
}

/// Depth/stencil attachment formats the renderer can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthFormat {
    /// 32-bit float depth, no stencil
    #[default]
    Depth32Float,
    /// 24-bit depth with 8-bit stencil
    Depth24Stencil8,
}

impl DepthFormat {
    /// Vulkan format for the attachment
    pub fn to_vk(self) -> vk::Format {
        match self {
            Self::Depth32Float => vk::Format::D32_SFLOAT,
            Self::Depth24Stencil8 => vk::Format::D24_UNORM_S8_UINT,
        }
    }
}

/// Rendering settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Depth/stencil attachment format
    pub depth_format: DepthFormat,
    /// MSAA sample count of the main pass
    pub sample_count: u32,
    /// Target tick rate
    pub preferred_frames_per_second: u32,
    /// Near clipping plane in meters
    pub near: f32,
    /// Far clipping plane in meters
    pub far: f32,
    /// Clear color of the scene pass (RGBA)
    pub clear_color: [f32; 4],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            depth_format: DepthFormat::default(),
            sample_count: 1,
            preferred_frames_per_second: 120,
            near: 0.01,
            far: 100.0,
            clear_color: [0.0, 0.0, 0.0, 0.0],
        }
    }
}

/// Logging and fault telemetry settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Session restarts within one minute before an error is logged
    pub restart_warning_threshold: u32,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            restart_warning_threshold: 5,
        }
    }
}

/// Complete AR renderer configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArConfig {
    /// Tracking session settings
    pub session: SessionConfiguration,
    /// Rendering settings
    pub render: RenderConfig,
    /// Diagnostics settings
    pub diagnostics: DiagnosticsConfig,
}

impl Config for ArConfig {}

impl ArConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let render = &self.render;
        if render.near <= 0.0 {
            return Err(ConfigError::Invalid(format!("near plane must be positive, got {}", render.near)));
        }
        if render.far <= render.near {
            return Err(ConfigError::Invalid(format!(
                "far plane ({}) must be beyond near plane ({})",
                render.far, render.near
            )));
        }
        if render.preferred_frames_per_second == 0 {
            return Err(ConfigError::Invalid("preferred frames per second must be at least 1".to_string()));
        }
        if render.sample_count == 0 {
            return Err(ConfigError::Invalid("sample count must be at least 1".to_string()));
        }
        if self.session.plane_detection.is_empty() {
            return Err(ConfigError::Invalid("at least one plane detection kind is required".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFormat;

    #[test]
    fn test_defaults_match_fixed_constants() {
        let config = ArConfig::default();
        assert_eq!(config.session.plane_detection, PlaneDetection::HORIZONTAL | PlaneDetection::VERTICAL);
        assert_eq!(config.render.depth_format.to_vk(), vk::Format::D32_SFLOAT);
        assert_eq!(config.render.preferred_frames_per_second, 120);
        assert!((config.render.near - 0.01).abs() < f32::EPSILON);
        assert!((config.render.far - 100.0).abs() < f32::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_clip_planes_rejected() {
        let mut config = ArConfig::default();
        config.render.far = 0.001;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.render.far = 100.0;
        config.render.near = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_empty_plane_detection_rejected() {
        let mut config = ArConfig::default();
        config.session.plane_detection = PlaneDetection::empty();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_overrides_keep_other_defaults() {
        let text = r#"
            [session]
            world_alignment = "gravity"

            [render]
            preferred_frames_per_second = 60
        "#;
        let config = ArConfig::parse(text, ConfigFormat::Toml).unwrap();
        assert_eq!(config.session.world_alignment, WorldAlignment::Gravity);
        assert_eq!(config.render.preferred_frames_per_second, 60);
        assert_eq!(config.session.plane_detection, PlaneDetection::default());
        assert_eq!(config.diagnostics, DiagnosticsConfig::default());
    }

    #[test]
    fn test_ron_round_trip_preserves_alignment() {
        let mut config = ArConfig::default();
        config.session.world_alignment = WorldAlignment::Camera;
        let text = config.to_text(ConfigFormat::Ron).unwrap();
        let parsed = ArConfig::parse(&text, ConfigFormat::Ron).unwrap();
        assert_eq!(parsed, config);
    }
}
