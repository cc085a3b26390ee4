//! Raw multi-frame container (`.vgc`).
//!
//! Layout: magic, canvas, fps, frame count, then tightly packed RGBA8
//! frames. The frame count is backfilled when the sink ends, so a truncated
//! or single-frame write is detectable by reading the header back.

use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{VignetteError, VignetteResult};
use crate::render::raster::Frame;

const MAGIC: &[u8; 4] = b"VGC1";
const HEADER_LEN: usize = 28;
const FRAME_COUNT_OFFSET: u64 = 20;

/// Parsed container header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Frame dimensions.
    pub canvas: Canvas,
    /// Timeline frame rate.
    pub fps: Fps,
    /// Number of frames stored after the header.
    pub frame_count: u64,
}

/// Read and validate a container header.
pub fn read_header(path: &Path) -> VignetteResult<ContainerHeader> {
    let mut f = File::open(path)
        .with_context(|| format!("failed to open container '{}'", path.display()))?;
    let mut buf = [0u8; HEADER_LEN];
    f.read_exact(&mut buf)
        .with_context(|| format!("failed to read container header '{}'", path.display()))?;
    if buf[0..4] != *MAGIC {
        return Err(VignetteError::encode(format!(
            "'{}' is not a vignette container",
            path.display()
        )));
    }
    let u32_at = |o: usize| u32::from_le_bytes([buf[o], buf[o + 1], buf[o + 2], buf[o + 3]]);
    let mut count = [0u8; 8];
    count.copy_from_slice(&buf[20..28]);
    Ok(ContainerHeader {
        canvas: Canvas {
            width: u32_at(4),
            height: u32_at(8),
        },
        fps: Fps {
            num: u32_at(12),
            den: u32_at(16),
        },
        frame_count: u64::from_le_bytes(count),
    })
}

/// Sink writing the raw container format to disk.
pub struct RawContainerSink {
    out_path: PathBuf,
    overwrite: bool,
    writer: Option<BufWriter<File>>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
    frames_written: u64,
}

impl RawContainerSink {
    /// Create a sink that writes to `out_path` on `begin`.
    pub fn new(out_path: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite,
            writer: None,
            cfg: None,
            last_idx: None,
            frames_written: 0,
        }
    }
}

impl FrameSink for RawContainerSink {
    fn begin(&mut self, cfg: SinkConfig) -> VignetteResult<()> {
        if cfg.canvas.width == 0 || cfg.canvas.height == 0 {
            return Err(VignetteError::validation(
                "container sink canvas dimensions must be non-zero",
            ));
        }
        if !self.overwrite && self.out_path.exists() {
            return Err(VignetteError::encode(format!(
                "output file '{}' already exists",
                self.out_path.display()
            )));
        }

        let f = File::create(&self.out_path)
            .with_context(|| format!("failed to create output '{}'", self.out_path.display()))?;
        let mut writer = BufWriter::new(f);
        let mut header = Vec::with_capacity(HEADER_LEN);
        header.extend_from_slice(MAGIC);
        header.extend_from_slice(&cfg.canvas.width.to_le_bytes());
        header.extend_from_slice(&cfg.canvas.height.to_le_bytes());
        header.extend_from_slice(&cfg.fps.num.to_le_bytes());
        header.extend_from_slice(&cfg.fps.den.to_le_bytes());
        header.extend_from_slice(&0u64.to_le_bytes());
        writer.write_all(&header).with_context(|| {
            format!(
                "failed to write container header '{}'",
                self.out_path.display()
            )
        })?;

        self.writer = Some(writer);
        self.cfg = Some(cfg);
        self.last_idx = None;
        self.frames_written = 0;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> VignetteResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| VignetteError::encode("container sink not started"))?;
        if let Some(last) = self.last_idx {
            if idx.0 <= last.0 {
                return Err(VignetteError::encode(
                    "container sink received out-of-order frame index",
                ));
            }
        }
        if frame.width != cfg.canvas.width || frame.height != cfg.canvas.height {
            return Err(VignetteError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.canvas.width, cfg.canvas.height
            )));
        }
        if frame.data.len() != cfg.canvas.frame_bytes() {
            return Err(VignetteError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| VignetteError::encode("container sink is already finalized"))?;
        writer
            .write_all(&frame.data)
            .with_context(|| format!("failed to write frame to '{}'", self.out_path.display()))?;
        self.last_idx = Some(idx);
        self.frames_written += 1;
        Ok(())
    }

    fn end(&mut self) -> VignetteResult<()> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| VignetteError::encode("container sink not started"))?;
        let mut f = writer.into_inner().map_err(|e| {
            VignetteError::encode(format!(
                "failed to flush container '{}': {e}",
                self.out_path.display()
            ))
        })?;
        f.seek(SeekFrom::Start(FRAME_COUNT_OFFSET))
            .with_context(|| {
                format!(
                    "failed to finalize container '{}'",
                    self.out_path.display()
                )
            })?;
        f.write_all(&self.frames_written.to_le_bytes())
            .with_context(|| {
                format!(
                    "failed to backfill frame count in '{}'",
                    self.out_path.display()
                )
            })?;
        self.cfg = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::fs;

    fn sink_config(width: u32, height: u32) -> SinkConfig {
        SinkConfig {
            canvas: Canvas { width, height },
            fps: Fps { num: 24, den: 1 },
        }
    }

    fn test_path(name: &str) -> PathBuf {
        let dir = Path::new("target").join("container-tests");
        fs::ensure_dir(&dir).unwrap();
        dir.join(format!("{}-{}.vgc", name, std::process::id()))
    }

    fn frame(width: u32, height: u32, fill: u8) -> Frame {
        Frame {
            width,
            height,
            data: vec![fill; (width * height * 4) as usize],
        }
    }

    #[test]
    fn header_round_trips_through_sink() {
        let path = test_path("roundtrip");
        let mut sink = RawContainerSink::new(&*path, true);
        sink.begin(sink_config(8, 4)).unwrap();
        for i in 0..3u64 {
            sink.push_frame(FrameIndex(i), &frame(8, 4, i as u8)).unwrap();
        }
        sink.end().unwrap();

        let header = read_header(&path).unwrap();
        assert_eq!(header.canvas, Canvas {
            width: 8,
            height: 4
        });
        assert_eq!(header.fps, Fps { num: 24, den: 1 });
        assert_eq!(header.frame_count, 3);
    }

    #[test]
    fn rejects_out_of_order_frames() {
        let path = test_path("out-of-order");
        let mut sink = RawContainerSink::new(&*path, true);
        sink.begin(sink_config(4, 4)).unwrap();
        sink.push_frame(FrameIndex(1), &frame(4, 4, 0)).unwrap();
        let err = sink.push_frame(FrameIndex(1), &frame(4, 4, 0)).unwrap_err();
        assert!(matches!(err, VignetteError::Encode(_)));
    }

    #[test]
    fn rejects_push_before_begin() {
        let path = test_path("not-started");
        let mut sink = RawContainerSink::new(&*path, true);
        assert!(sink.push_frame(FrameIndex(0), &frame(4, 4, 0)).is_err());
        assert!(sink.end().is_err());
    }

    #[test]
    fn rejects_mismatched_frame_size() {
        let path = test_path("size-mismatch");
        let mut sink = RawContainerSink::new(&*path, true);
        sink.begin(sink_config(4, 4)).unwrap();
        assert!(sink.push_frame(FrameIndex(0), &frame(8, 8, 0)).is_err());
    }

    #[test]
    fn refuses_existing_output_without_overwrite() {
        let path = test_path("no-overwrite");
        std::fs::write(&path, b"occupied").unwrap();
        let mut sink = RawContainerSink::new(&*path, false);
        let err = sink.begin(sink_config(4, 4)).unwrap_err();
        assert!(matches!(err, VignetteError::Encode(_)));
    }

    #[test]
    fn read_header_rejects_foreign_files() {
        let path = test_path("foreign");
        std::fs::write(&path, b"definitely not a container").unwrap();
        let err = read_header(&path).unwrap_err();
        assert!(matches!(err, VignetteError::Encode(_)));
    }
}
