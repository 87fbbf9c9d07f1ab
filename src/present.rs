use rayon::{
    iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

use crate::frame::Frame;

/// Source taps and weight for one destination coordinate.
#[derive(Clone, Copy, Debug)]
struct Tap {
    lo: usize,
    hi: usize,
    w: u32, // weight of `hi`, fixed-point 8.8
}

/// Precomputed mapping from window pixels to frame pixels.
#[derive(Clone, Debug, Default)]
pub struct ScaleLut {
    size: [usize; 4], // dst_w, dst_h, src_w, src_h
    xs: Vec<Tap>,
    ys: Vec<Tap>,
}

fn taps(dst: usize, src: usize) -> Vec<Tap> {
    let scale = src as f32 / dst as f32;
    let last = src.saturating_sub(1);
    (0..dst)
        .map(|d| {
            let f = d as f32 * scale;
            let lo = (f.floor() as usize).min(last);
            Tap {
                lo,
                hi: (lo + 1).min(last),
                w: ((f - lo as f32) * 256.0).round().clamp(0.0, 256.0) as u32,
            }
        })
        .collect()
}

impl ScaleLut {
    pub fn new(dst_w: usize, dst_h: usize, src_w: usize, src_h: usize) -> Self {
        Self {
            size: [dst_w, dst_h, src_w, src_h],
            xs: taps(dst_w, src_w),
            ys: taps(dst_h, src_h),
        }
    }

    /// Whether this table was built for these window and frame sizes.
    pub fn matches(&self, dst_w: usize, dst_h: usize, src_w: usize, src_h: usize) -> bool {
        self.size == [dst_w, dst_h, src_w, src_h]
    }
}

#[inline]
fn lerp_color(a: u32, b: u32, w256: u32) -> u32 {
    let inv = 256 - w256;
    // red and blue share one multiply, green gets its own
    let rb = (((a & 0x00FF_00FF) * inv + (b & 0x00FF_00FF) * w256) >> 8) & 0x00FF_00FF;
    let g = (((a & 0x0000_FF00) * inv + (b & 0x0000_FF00) * w256) >> 8) & 0x0000_FF00;
    rb | g
}

/// Bilinearly stretches the column-major `frame` into the row-major window
/// buffer `dst`. Window rows are filled in parallel.
pub fn present(dst: &mut [u32], frame: &Frame, lut: &ScaleLut) {
    let [dw, _, sw, sh] = lut.size;
    debug_assert_eq!((sw, sh), (frame.width(), frame.height()));
    if dw == 0 || sw == 0 || sh == 0 {
        return;
    }
    let src = frame.pixels();
    dst.par_chunks_mut(dw)
        .zip(lut.ys.par_iter())
        .for_each(|(row, ty)| {
            for (px, tx) in row.iter_mut().zip(&lut.xs) {
                let c00 = src[tx.lo * sh + ty.lo];
                let c10 = src[tx.hi * sh + ty.lo];
                let c01 = src[tx.lo * sh + ty.hi];
                let c11 = src[tx.hi * sh + ty.hi];
                let top = lerp_color(c00, c10, tx.w);
                let bot = lerp_color(c01, c11, tx.w);
                *px = lerp_color(top, bot, ty.w);
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::pack_rgb;

    #[test]
    fn lerp_endpoints_and_midpoint() {
        let a = pack_rgb(0, 100, 200);
        let b = pack_rgb(200, 0, 100);
        assert_eq!(lerp_color(a, b, 0), a);
        assert_eq!(lerp_color(a, b, 256), b);
        assert_eq!(lerp_color(a, b, 128), pack_rgb(100, 50, 150));
    }

    #[test]
    fn identity_scale_transposes_columns_to_rows() {
        let mut frame = Frame::new(3, 2, 0);
        for (i, px) in frame.pixels_mut().iter_mut().enumerate() {
            *px = pack_rgb(i as u8 * 40, 0, 0);
        }

        let lut = ScaleLut::new(3, 2, 3, 2);
        let mut dst = vec![0u32; 6];
        present(&mut dst, &frame, &lut);
        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(dst[y * 3 + x], frame.pixel(x, y), "({x}, {y})");
            }
        }
    }

    #[test]
    fn upscaled_flat_frame_stays_flat() {
        let frame = Frame::new(40, 30, pack_rgb(129, 138, 145));
        let lut = ScaleLut::new(123, 77, 40, 30);
        let mut dst = vec![0u32; 123 * 77];
        present(&mut dst, &frame, &lut);
        assert!(dst.iter().all(|&c| c == pack_rgb(129, 138, 145)));
    }

    #[test]
    fn taps_stay_inside_source() {
        for (dst, src) in [(800, 400), (400, 800), (7, 1), (1, 7)] {
            for t in taps(dst, src) {
                assert!(t.lo < src && t.hi < src && t.w <= 256);
            }
        }
    }

    #[test]
    fn lut_tracks_sizes() {
        let lut = ScaleLut::new(800, 600, 400, 400);
        assert!(lut.matches(800, 600, 400, 400));
        assert!(!lut.matches(800, 600, 200, 400));
        assert!(!ScaleLut::default().matches(800, 600, 400, 400));
    }
}
