use std::io::Read;
use std::path::PathBuf;

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{VignetteError, VignetteResult};
use crate::render::raster::Frame;
use std::process::{Child, ChildStdin, Command, Stdio};

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output MP4 file path.
    pub out_path: PathBuf,
    /// Overwrite the output file if it already exists.
    pub overwrite: bool,
    /// Background color used to flatten alpha (RGB8).
    pub bg_rgb: [u8; 3],
}

impl FfmpegSinkOpts {
    /// Create options for outputting an MP4 to `out_path`.
    pub fn new(out_path: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite,
            bg_rgb: [0, 0, 0],
        }
    }
}

/// Sink that spawns the system `ffmpeg` and streams raw frames to its stdin.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    /// Create a new sink that streams into `ffmpeg`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> VignetteResult<()> {
        if cfg.canvas.width == 0 || cfg.canvas.height == 0 {
            return Err(VignetteError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if cfg.canvas.width % 2 != 0 || cfg.canvas.height % 2 != 0 {
            return Err(VignetteError::validation(
                "ffmpeg sink width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(VignetteError::validation("fps must be non-zero"));
        }

        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(VignetteError::encode(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(VignetteError::encode(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        cmd.arg(if self.opts.overwrite { "-y" } else { "-n" });

        // Input: raw opaque RGBA8 frames; alpha is flattened over the
        // configured background before writing to stdin.
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.canvas.width, cfg.canvas.height),
            "-r",
            &format!("{}/{}", cfg.fps.num, cfg.fps.den),
            "-i",
            "pipe:0",
        ]);

        // Output: h264 + yuv420p for broad compatibility.
        cmd.args([
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ]);
        cmd.arg(&self.opts.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            VignetteError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| VignetteError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| VignetteError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.scratch = vec![0u8; cfg.canvas.frame_bytes()];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> VignetteResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| VignetteError::encode("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx {
            if idx.0 <= last.0 {
                return Err(VignetteError::encode(
                    "ffmpeg sink received out-of-order frame index",
                ));
            }
        }
        if frame.width != cfg.canvas.width || frame.height != cfg.canvas.height {
            return Err(VignetteError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.canvas.width, cfg.canvas.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(VignetteError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }

        flatten_over_bg_to_opaque_rgba8(&mut self.scratch, &frame.data, self.opts.bg_rgb)?;
        self.last_idx = Some(idx);

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(VignetteError::encode("ffmpeg sink is already finalized"));
        };
        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            VignetteError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> VignetteResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| VignetteError::encode("ffmpeg sink not started"))?;

        let status = child
            .wait()
            .map_err(|e| VignetteError::encode(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| VignetteError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| VignetteError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(VignetteError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        self.cfg = None;
        Ok(())
    }
}

/// Flatten straight-alpha RGBA8 over an opaque background color.
fn flatten_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src: &[u8],
    bg_rgb: [u8; 3],
) -> VignetteResult<()> {
    if dst.len() != src.len() || dst.len() % 4 != 0 {
        return Err(VignetteError::validation(
            "flatten_over_bg_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255 - a;
        for c in 0..3 {
            let blended = u16::from(s[c]) * a + u16::from(bg_rgb[c]) * inv;
            d[c] = ((blended + 127) / 255) as u8;
        }
        d[3] = 255;
    }

    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
