use std::path::PathBuf;

use crate::affinity::RenderPermit;
use crate::config::{self, EncoderKind};
use crate::encode::container::RawContainerSink;
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::VignetteResult;
use crate::render::raster::circle_frame;
use crate::scene::model::Scene;

/// Counters observable after a render returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Playbacks rendered to completion.
    pub plays: u32,
    /// Frames pushed to the sink.
    pub frames: u64,
}

/// Reference to a finished artifact.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Artifact {
    /// Artifact location (the output file configured at render time).
    pub path: PathBuf,
    /// Total frames written.
    pub frames: u64,
    /// Play count accumulated while rendering.
    pub plays: u32,
}

/// Renders one scene into the configured output under a [`RenderPermit`].
///
/// A session must run inside an active scoped configuration: the output path
/// and encoder are read from the process-wide configuration when the render
/// starts.
pub struct RenderSession {
    scene: Scene,
    stats: RenderStats,
}

impl RenderSession {
    /// Create a session over a validated scene.
    pub fn new(scene: Scene) -> Self {
        Self {
            scene,
            stats: RenderStats::default(),
        }
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Render every queued playback into the configured output file.
    ///
    /// Reads the process-wide configuration once, streams frames in strictly
    /// increasing index order, and bumps the play counter after each
    /// completed playback.
    #[tracing::instrument(skip(self, permit), fields(identity = permit.identity()))]
    pub fn render(&mut self, permit: &RenderPermit) -> VignetteResult<Artifact> {
        let cfg = config::snapshot();
        let mut sink: Box<dyn FrameSink> = match cfg.encoder {
            EncoderKind::Raw => Box::new(RawContainerSink::new(
                cfg.output_file.clone(),
                cfg.overwrite,
            )),
            EncoderKind::Mp4 => Box::new(FfmpegSink::new(FfmpegSinkOpts::new(
                cfg.output_file.clone(),
                cfg.overwrite,
            ))),
        };
        let stats = self.render_into(permit, sink.as_mut())?;
        tracing::debug!(
            out = %cfg.output_file.display(),
            frames = stats.frames,
            plays = stats.plays,
            "render finished"
        );
        Ok(Artifact {
            path: cfg.output_file,
            frames: stats.frames,
            plays: stats.plays,
        })
    }

    /// Render every queued playback into an explicit sink.
    ///
    /// The permit is the proof of admission; it is consumed as a capability
    /// and not consulted further.
    pub fn render_into(
        &mut self,
        _permit: &RenderPermit,
        sink: &mut dyn FrameSink,
    ) -> VignetteResult<RenderStats> {
        let spec = self.scene.spec().clone();
        sink.begin(SinkConfig {
            canvas: spec.canvas,
            fps: spec.fps,
        })?;
        let mut next = FrameIndex(0);
        for play in &spec.plays {
            let frames = play.frames();
            for local in 0..frames {
                let t = if frames <= 1 {
                    1.0
                } else {
                    local as f64 / (frames - 1) as f64
                };
                let (center, radius, color) = play.sample(t);
                let frame = circle_frame(spec.canvas, center, radius, color, spec.background);
                sink.push_frame(next, &frame)?;
                next.0 += 1;
            }
            self.stats.plays += 1;
        }
        sink.end()?;
        self.stats.frames = next.0;
        Ok(self.stats)
    }
}
