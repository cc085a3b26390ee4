use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::animation::ease::Ease;
use crate::foundation::core::{Canvas, Fps, FrameIndex, Rgba8};
use crate::foundation::error::{VignetteError, VignetteResult};
use crate::render::raster::{Frame, circle_frame};

/// One queued animation. Rendering a playback to completion counts as one
/// play against the session's counters.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Playback {
    /// A circle growing from `radius_from` to `radius_to`.
    GrowCircle {
        center: (f64, f64),
        radius_from: f64,
        radius_to: f64,
        color: Rgba8,
        frames: u64,
        #[serde(default)]
        ease: Ease,
    },
    /// A circle fading out at a fixed radius.
    FadeCircle {
        center: (f64, f64),
        radius: f64,
        color: Rgba8,
        frames: u64,
        #[serde(default)]
        ease: Ease,
    },
}

impl Playback {
    /// Frame count of this playback.
    pub fn frames(&self) -> u64 {
        match self {
            Self::GrowCircle { frames, .. } | Self::FadeCircle { frames, .. } => *frames,
        }
    }

    /// Circle parameters at normalized progress `t`: center, radius, color.
    pub(crate) fn sample(&self, t: f64) -> ((f64, f64), f64, Rgba8) {
        match self {
            Self::GrowCircle {
                center,
                radius_from,
                radius_to,
                color,
                ease,
                ..
            } => {
                let k = ease.apply(t);
                (*center, radius_from + (radius_to - radius_from) * k, *color)
            }
            Self::FadeCircle {
                center,
                radius,
                color,
                ease,
                ..
            } => {
                let k = ease.apply(t);
                (*center, *radius, color.with_alpha_scaled(1.0 - k))
            }
        }
    }

    fn validate(&self) -> VignetteResult<()> {
        if self.frames() == 0 {
            return Err(VignetteError::validation(
                "playback must be at least one frame long",
            ));
        }
        let radii: &[f64] = match self {
            Self::GrowCircle {
                radius_from,
                radius_to,
                ..
            } => &[*radius_from, *radius_to],
            Self::FadeCircle { radius, .. } => &[*radius],
        };
        for r in radii {
            if !r.is_finite() || *r < 0.0 {
                return Err(VignetteError::validation(format!(
                    "playback radius must be finite and non-negative, got {r}"
                )));
            }
        }
        Ok(())
    }
}

fn default_background() -> Rgba8 {
    Rgba8::opaque(18, 18, 24)
}

/// JSON-facing scene description.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SceneSpec {
    /// Output canvas dimensions.
    pub canvas: Canvas,
    /// Timeline frame rate.
    pub fps: Fps,
    /// Background color every frame starts from.
    #[serde(default = "default_background")]
    pub background: Rgba8,
    /// Playbacks rendered back-to-back, in order.
    pub plays: Vec<Playback>,
}

/// A validated scene ready to render.
#[derive(Clone, Debug)]
pub struct Scene {
    spec: SceneSpec,
}

impl Scene {
    /// Validate `spec` and wrap it.
    pub fn from_spec(spec: SceneSpec) -> VignetteResult<Self> {
        if spec.canvas.width == 0 || spec.canvas.height == 0 {
            return Err(VignetteError::validation(
                "scene canvas dimensions must be non-zero",
            ));
        }
        Fps::new(spec.fps.num, spec.fps.den)?;
        if spec.plays.is_empty() {
            return Err(VignetteError::validation(
                "scene must contain at least one playback",
            ));
        }
        for play in &spec.plays {
            play.validate()?;
        }
        Ok(Self { spec })
    }

    /// Parse a scene from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> VignetteResult<Self> {
        let spec: SceneSpec = serde_json::from_reader(r)
            .map_err(|e| VignetteError::validation(format!("parse scene JSON: {e}")))?;
        Self::from_spec(spec)
    }

    /// Parse a scene from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> VignetteResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            VignetteError::validation(format!("open scene JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// The built-in demo content: a circle grows into view, then fades out.
    pub fn circle_reveal() -> Self {
        let color = Rgba8::opaque(235, 110, 70);
        Self {
            spec: SceneSpec {
                canvas: Canvas {
                    width: 128,
                    height: 72,
                },
                fps: Fps { num: 30, den: 1 },
                background: default_background(),
                plays: vec![
                    Playback::GrowCircle {
                        center: (64.0, 36.0),
                        radius_from: 2.0,
                        radius_to: 28.0,
                        color,
                        frames: 16,
                        ease: Ease::Smooth,
                    },
                    Playback::FadeCircle {
                        center: (64.0, 36.0),
                        radius: 28.0,
                        color,
                        frames: 8,
                        ease: Ease::Out,
                    },
                ],
            },
        }
    }

    /// Borrow the underlying spec.
    pub fn spec(&self) -> &SceneSpec {
        &self.spec
    }

    /// Total timeline length in frames.
    pub fn total_frames(&self) -> u64 {
        self.spec.plays.iter().map(Playback::frames).sum()
    }

    /// Rasterize a single timeline frame, bypassing the artifact pipeline.
    ///
    /// This is the preview path used by the CLI `frame` subcommand; it writes
    /// nothing and needs no render permit.
    pub fn still_frame(&self, index: FrameIndex) -> VignetteResult<Frame> {
        let mut remaining = index.0;
        for play in &self.spec.plays {
            let frames = play.frames();
            if remaining < frames {
                let t = if frames <= 1 {
                    1.0
                } else {
                    remaining as f64 / (frames - 1) as f64
                };
                let (center, radius, color) = play.sample(t);
                return Ok(circle_frame(
                    self.spec.canvas,
                    center,
                    radius,
                    color,
                    self.spec.background,
                ));
            }
            remaining -= frames;
        }
        Err(VignetteError::validation(format!(
            "frame index {} out of range (scene has {} frames)",
            index.0,
            self.total_frames()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_reveal_is_valid_and_multi_play() {
        let scene = Scene::circle_reveal();
        assert!(scene.spec().plays.len() >= 2);
        assert!(scene.total_frames() > 1);
        Scene::from_spec(scene.spec().clone()).unwrap();
    }

    #[test]
    fn rejects_empty_scene() {
        let spec = SceneSpec {
            plays: vec![],
            ..Scene::circle_reveal().spec.clone()
        };
        assert!(matches!(
            Scene::from_spec(spec),
            Err(VignetteError::Validation(_))
        ));
    }

    #[test]
    fn rejects_zero_frame_playback() {
        let mut spec = Scene::circle_reveal().spec;
        spec.plays.push(Playback::FadeCircle {
            center: (0.0, 0.0),
            radius: 4.0,
            color: Rgba8::opaque(1, 2, 3),
            frames: 0,
            ease: Ease::Linear,
        });
        assert!(Scene::from_spec(spec).is_err());
    }

    #[test]
    fn rejects_zero_canvas() {
        let mut spec = Scene::circle_reveal().spec;
        spec.canvas.width = 0;
        assert!(Scene::from_spec(spec).is_err());
    }

    #[test]
    fn grow_samples_interpolate_radius() {
        let play = Playback::GrowCircle {
            center: (0.0, 0.0),
            radius_from: 10.0,
            radius_to: 20.0,
            color: Rgba8::opaque(0, 0, 0),
            frames: 5,
            ease: Ease::Linear,
        };
        let (_, r0, _) = play.sample(0.0);
        let (_, r1, _) = play.sample(1.0);
        assert_eq!(r0, 10.0);
        assert_eq!(r1, 20.0);
    }

    #[test]
    fn fade_samples_scale_alpha_down() {
        let play = Playback::FadeCircle {
            center: (0.0, 0.0),
            radius: 5.0,
            color: Rgba8::opaque(9, 9, 9),
            frames: 5,
            ease: Ease::Linear,
        };
        let (_, _, start) = play.sample(0.0);
        let (_, _, end) = play.sample(1.0);
        assert_eq!(start.a, 255);
        assert_eq!(end.a, 0);
    }

    #[test]
    fn spec_json_round_trips() {
        let spec = Scene::circle_reveal().spec;
        let json = serde_json::to_string(&spec).unwrap();
        let scene = Scene::from_reader(json.as_bytes()).unwrap();
        assert_eq!(scene.total_frames(), 24);
    }

    #[test]
    fn still_frame_rejects_out_of_range_index() {
        let scene = Scene::circle_reveal();
        let last = scene.total_frames() - 1;
        assert!(scene.still_frame(FrameIndex(last)).is_ok());
        assert!(scene.still_frame(FrameIndex(last + 1)).is_err());
    }
}
