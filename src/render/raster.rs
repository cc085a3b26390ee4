use rayon::prelude::*;

use crate::foundation::core::{Canvas, Rgba8};

/// A rendered frame as straight-alpha RGBA8 pixels, tightly packed,
/// row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes.
    pub data: Vec<u8>,
}

impl Frame {
    /// A solid frame filled with `color`.
    pub fn solid(canvas: Canvas, color: Rgba8) -> Self {
        let mut data = Vec::with_capacity(canvas.frame_bytes());
        for _ in 0..(canvas.width as usize * canvas.height as usize) {
            data.extend_from_slice(&[color.r, color.g, color.b, color.a]);
        }
        Self {
            width: canvas.width,
            height: canvas.height,
            data,
        }
    }
}

/// Rasterize a filled circle composited over `background`.
///
/// Edge coverage falls off linearly across one pixel, giving a smooth rim.
/// Rows are filled in parallel.
pub fn circle_frame(
    canvas: Canvas,
    center: (f64, f64),
    radius: f64,
    color: Rgba8,
    background: Rgba8,
) -> Frame {
    let width = canvas.width as usize;
    let mut data = vec![0u8; canvas.frame_bytes()];
    data.par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width {
                let dx = x as f64 + 0.5 - center.0;
                let dy = y as f64 + 0.5 - center.1;
                let dist = (dx * dx + dy * dy).sqrt();
                let coverage = (radius + 0.5 - dist).clamp(0.0, 1.0);
                let px = over(background, color, coverage);
                row[x * 4..x * 4 + 4].copy_from_slice(&[px.r, px.g, px.b, px.a]);
            }
        });
    Frame {
        width: canvas.width,
        height: canvas.height,
        data,
    }
}

/// Source-over compositing with the source alpha scaled by `coverage`.
fn over(bg: Rgba8, fg: Rgba8, coverage: f64) -> Rgba8 {
    let a = f64::from(fg.a) / 255.0 * coverage.clamp(0.0, 1.0);
    let mix = |b: u8, f: u8| -> u8 {
        (f64::from(b) * (1.0 - a) + f64::from(f) * a)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    let bg_a = f64::from(bg.a) / 255.0;
    let out_a = a + bg_a * (1.0 - a);
    Rgba8 {
        r: mix(bg.r, fg.r),
        g: mix(bg.g, fg.g),
        b: mix(bg.b, fg.b),
        a: (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANVAS: Canvas = Canvas {
        width: 32,
        height: 32,
    };

    fn pixel(frame: &Frame, x: usize, y: usize) -> [u8; 4] {
        let i = (y * frame.width as usize + x) * 4;
        [
            frame.data[i],
            frame.data[i + 1],
            frame.data[i + 2],
            frame.data[i + 3],
        ]
    }

    #[test]
    fn center_pixel_is_the_circle_color() {
        let fg = Rgba8::opaque(200, 50, 25);
        let bg = Rgba8::opaque(0, 0, 0);
        let frame = circle_frame(CANVAS, (16.0, 16.0), 8.0, fg, bg);
        assert_eq!(pixel(&frame, 16, 16), [200, 50, 25, 255]);
    }

    #[test]
    fn far_corner_is_the_background() {
        let fg = Rgba8::opaque(200, 50, 25);
        let bg = Rgba8::opaque(10, 20, 30);
        let frame = circle_frame(CANVAS, (16.0, 16.0), 4.0, fg, bg);
        assert_eq!(pixel(&frame, 0, 0), [10, 20, 30, 255]);
    }

    #[test]
    fn zero_radius_leaves_the_background_everywhere() {
        let bg = Rgba8::opaque(7, 7, 7);
        let frame = circle_frame(CANVAS, (16.0, 16.0), 0.0, Rgba8::opaque(255, 0, 0), bg);
        assert_eq!(frame, Frame::solid(CANVAS, bg));
    }

    #[test]
    fn frame_length_matches_canvas() {
        let frame = circle_frame(
            CANVAS,
            (0.0, 0.0),
            1.0,
            Rgba8::opaque(1, 1, 1),
            Rgba8::opaque(0, 0, 0),
        );
        assert_eq!(frame.data.len(), CANVAS.frame_bytes());
    }
}
