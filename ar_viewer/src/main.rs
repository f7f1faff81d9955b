//! Headless AR viewer
//!
//! Drives the AR engine with the simulated tracking session and the
//! headless GPU backend: frames arrive at the camera's own rate, the render
//! tick runs at the configured rate, and a scripted sequence of touches,
//! rotations and a tracking failure exercises the whole pipeline.
//!
//! Usage: `ar_viewer [config.toml|config.ron] [--ticks N] [--snapshot out.png]`

use std::error::Error;
use std::path::PathBuf;

use ar_engine::foundation::logging;
use ar_engine::foundation::math::{Vec2, Vec3};
use ar_engine::foundation::time::FixedStep;
use ar_engine::prelude::*;
use ar_engine::render::ycbcr::preview_image;
use rand::Rng;

const PORTRAIT: (u32, u32) = (1170, 2532);

struct Options {
    config: Option<PathBuf>,
    ticks: u32,
    snapshot: Option<PathBuf>,
}

impl Options {
    fn from_args() -> Result<Self, Box<dyn Error>> {
        let mut options = Self { config: None, ticks: 240, snapshot: None };
        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--ticks" => {
                    let value = args.next().ok_or("--ticks needs a value")?;
                    options.ticks = value.parse()?;
                }
                "--snapshot" => {
                    options.snapshot = Some(args.next().ok_or("--snapshot needs a path")?.into());
                }
                _ => options.config = Some(arg.into()),
            }
        }
        Ok(options)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let options = Options::from_args()?;

    let config = match &options.config {
        Some(path) => ArConfig::load_from_file(path)?,
        None => ArConfig::default(),
    };
    logging::init(&config.diagnostics.log_level);
    log::info!("Starting AR viewer ({} ticks)", options.ticks);

    let mut session = SimulatedSession::new().with_resolution(1920, 1440).with_capture_rate(60.0);
    session.set_anchor_drift(Vec3::new(0.002, 0.0, 0.0));

    let fps = config.render.preferred_frames_per_second;
    let mut renderer = ArRenderer::new(config, session, HeadlessGpu::new())?;
    renderer.resize(PORTRAIT.0, PORTRAIT.1);
    renderer.set_orientation(Some(InterfaceOrientation::Portrait));

    let mut step = FixedStep::new(fps);
    let dt = step.interval().as_secs_f64();
    let mut rng = rand::thread_rng();
    let mut target = RenderTarget::new(PORTRAIT.0, PORTRAIT.1);
    let mut draws = 0u32;

    for tick in 0..options.ticks {
        renderer.session_mut().advance(dt);
        renderer.update();
        if renderer.draw(&target) {
            draws += 1;
        }
        renderer.gpu_mut().take_passes();

        match tick {
            30 => {
                let view = Vec2::new(target.extent.width as f32, target.extent.height as f32);
                let jitter = Vec2::new(rng.gen_range(-20.0..20.0), rng.gen_range(-20.0..20.0));
                let touch = TouchPoint::new(1, view.x * 0.5 + jitter.x, view.y * 0.5 + jitter.y);
                let outcome = renderer.touches_began(&[touch], view);
                log::info!("Touch at ({:.0}, {:.0}): {:?}", touch.location.x, touch.location.y, outcome);
            }
            60 => {
                let touches = [TouchPoint::new(1, 100.0, 100.0), TouchPoint::new(2, 200.0, 200.0)];
                let outcome = renderer.touches_began(&touches, Vec2::new(PORTRAIT.0 as f32, PORTRAIT.1 as f32));
                log::info!("Two-finger touch: {:?}", outcome);
            }
            90 => {
                log::info!("Rotating to landscape");
                target = RenderTarget::new(PORTRAIT.1, PORTRAIT.0);
                renderer.resize(PORTRAIT.1, PORTRAIT.0);
                renderer.set_orientation(Some(InterfaceOrientation::LandscapeRight));
            }
            120 => {
                log::info!("Injecting tracking failure");
                renderer.session_mut().inject_failure(TrackingFailure::GravityAlignmentIncompatible);
            }
            _ => {}
        }

        step.wait();
    }

    log::info!(
        "Finished: {} draws, {} frames consumed, {} dropped, {} restarts, placement {:?}",
        draws,
        renderer.frames_consumed(),
        renderer.frames_dropped(),
        renderer.restart_count(),
        renderer.placement_state()
    );

    if let Some(path) = &options.snapshot {
        match renderer.session().current_frame().and_then(|frame| preview_image(&frame.captured_image)) {
            Some(preview) => {
                preview.save(path)?;
                log::info!("Saved camera snapshot to {}", path.display());
            }
            None => log::warn!("No camera frame to snapshot"),
        }
    }

    renderer.teardown();
    Ok(())
}
