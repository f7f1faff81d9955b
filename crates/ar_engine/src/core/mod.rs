//! Core engine configuration

pub mod config;

pub use config::{
    ArConfig, DepthFormat, DiagnosticsConfig, PlaneDetection, RenderConfig, SessionConfiguration,
    WorldAlignment,
};
