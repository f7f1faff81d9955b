//! # AR Engine
//!
//! Camera-feed augmentation core: renders a live camera image as the
//! background and anchors virtual content to detected real-world surfaces.
//!
//! ## Features
//!
//! - **Planar texture bridging**: luma and chroma planes of each camera frame
//!   become a GPU texture pair through an explicitly owned texture cache
//! - **Display-aware background**: the camera image is rotated for the
//!   interface orientation and aspect-fills any viewport
//! - **Tracked camera math**: view and projection follow the tracking
//!   service's camera and match the background exactly
//! - **Anchored placement**: a single-finger touch ray-casts against
//!   detected planes and binds the content to a tracked anchor
//! - **Fault recovery**: failed sessions are reconfigured and restarted
//!
//! The tracking service and the GPU device are external collaborators
//! behind [`TrackingSession`](tracking::TrackingSession) and
//! [`GpuBackend`](render::GpuBackend). A simulated session and a headless
//! backend are included.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ar_engine::prelude::*;
//!
//! fn main() -> Result<(), ArError> {
//!     let mut renderer = ArRenderer::new(ArConfig::default(), SimulatedSession::new(), HeadlessGpu::new())?;
//!     renderer.resize(1170, 2532);
//!     renderer.set_orientation(Some(InterfaceOrientation::Portrait));
//!
//!     renderer.session_mut().capture_frame();
//!     renderer.update();
//!     renderer.draw(&RenderTarget::new(1170, 2532));
//!
//!     renderer.touches_began(&[TouchPoint::new(1, 195.0, 422.0)], Vec2::new(390.0, 844.0));
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod core;
pub mod foundation;
pub mod input;
pub mod physics;
pub mod render;
pub mod scene;
pub mod session;
pub mod tracking;

mod error;

pub use error::ArError;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        ArError,
        config::Config,
        core::config::{ArConfig, PlaneDetection, SessionConfiguration, WorldAlignment},
        foundation::math::{Mat4, Vec2, Vec3},
        input::{PlacementOutcome, PlacementState, TouchOrigin, TouchPoint},
        render::{
            Camera, GpuBackend, HeadlessGpu, InterfaceOrientation, RenderTarget, TextureCache,
        },
        scene::ArScene,
        session::{ArRenderer, TickReport},
        tracking::{SessionObserver, SimulatedSession, TrackingFailure, TrackingSession},
    };
}
