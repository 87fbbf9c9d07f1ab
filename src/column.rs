use crate::raycaster::{DIVISION_EPSILON, RayHit, Side};
use crate::texture::Texture;

/// Vertical extent of one wall strip on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Span {
    pub line_height: f32,
    /// First row drawn, before truncation. Texture stepping starts here.
    pub top: f32,
    pub draw_start: usize,
    /// One past the last row drawn.
    pub draw_end: usize,
}

impl Span {
    pub fn new(perp_dist: f32, screen_height: usize) -> Self {
        let h = screen_height as f32;
        let last = (screen_height.max(1) - 1) as f32;
        let line_height = h / (perp_dist + DIVISION_EPSILON);
        let top = (0.5 * h - 0.5 * line_height).clamp(0.0, last);
        let bottom = (0.5 * h + 0.5 * line_height).clamp(0.0, last);
        Self {
            line_height,
            top,
            draw_start: top as usize,
            draw_end: bottom as usize,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.draw_end - self.draw_start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.draw_end == self.draw_start
    }
}

/// Texture column for a hit. Faces are mirrored where needed so every wall
/// reads the same way round whichever side it is seen from.
#[inline]
pub fn texture_x(hit: &RayHit, tex_width: usize) -> usize {
    let tex_x = ((hit.wall_fraction * tex_width as f32) as usize).min(tex_width - 1);
    let mirrored = match hit.side {
        Side::X => hit.ray_dir[1] > 0.0,
        Side::Y => hit.ray_dir[1] < 0.0,
    };
    if mirrored {
        tex_width - tex_x - 1
    } else {
        tex_x
    }
}

/// Texture rows sampled for each screen row of `span`, top to bottom.
pub fn texture_rows(
    span: &Span,
    screen_height: usize,
    tex_height: usize,
) -> impl Iterator<Item = usize> + use<> {
    let step = tex_height as f32 / span.line_height;
    let start = (span.top - 0.5 * screen_height as f32 + 0.5 * span.line_height) * step;
    let mask = tex_height - 1;
    (0..span.len()).map(move |i| (start + i as f32 * step) as usize & mask)
}

/// Halves every channel. The mask drops the bit each channel would
/// otherwise shift into its neighbour.
#[inline]
pub fn shade(color: u32) -> u32 {
    (color >> 1) & 0x007F_7F7F
}

/// Draws the strip for `hit` into `column`, one pixel per screen row.
/// Rows outside the span keep whatever they held.
pub fn draw_column(column: &mut [u32], hit: &RayHit, texture: &Texture) -> Span {
    let screen_height = column.len();
    let span = Span::new(hit.perp_dist, screen_height);
    let tex_x = texture_x(hit, texture.width());
    let dark = hit.side == Side::Y;

    let rows = &mut column[span.draw_start..span.draw_end];
    for (px, tex_y) in rows
        .iter_mut()
        .zip(texture_rows(&span, screen_height, texture.height()))
    {
        let color = texture.texel(tex_x, tex_y);
        *px = if dark { shade(color) } else { color };
    }
    span
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::{pack_rgb, unpack_rgb};
    use std::num::NonZeroU16;

    fn hit(perp_dist: f32, side: Side, wall_fraction: f32, ray_dir: [f32; 2]) -> RayHit {
        RayHit {
            cell: [0, 0],
            texture: NonZeroU16::MIN,
            perp_dist,
            side,
            wall_fraction,
            ray_dir,
        }
    }

    #[test]
    fn span_is_centred_and_shrinks_with_distance() {
        let near = Span::new(1.0, 400);
        assert_eq!((near.draw_start, near.draw_end), (0, 399));
        let far = Span::new(4.0, 400);
        assert_eq!((far.draw_start, far.draw_end), (150, 250));
        assert!((far.line_height - 100.0).abs() < 1e-3);
    }

    #[test]
    fn span_survives_zero_distance() {
        let s = Span::new(0.0, 200);
        assert!(s.line_height.is_finite());
        assert_eq!((s.draw_start, s.draw_end), (0, 199));
    }

    #[test]
    fn mirroring_rules() {
        let w = 32;
        // quarter of the way along the face
        assert_eq!(texture_x(&hit(1.0, Side::X, 0.25, [1.0, -0.2]), w), 8);
        assert_eq!(texture_x(&hit(1.0, Side::X, 0.25, [1.0, 0.2]), w), 23);
        assert_eq!(texture_x(&hit(1.0, Side::Y, 0.25, [0.2, 1.0]), w), 8);
        assert_eq!(texture_x(&hit(1.0, Side::Y, 0.25, [0.2, -1.0]), w), 23);
    }

    #[test]
    fn texture_x_stays_in_range_at_face_edges() {
        for frac in [0.0, 0.999_999, f32::from_bits(0x3F7F_FFFF)] {
            for dir in [[1.0, 1.0], [1.0, -1.0]] {
                assert!(texture_x(&hit(1.0, Side::X, frac, dir), 32) < 32);
                assert!(texture_x(&hit(1.0, Side::Y, frac, dir), 32) < 32);
            }
        }
    }

    #[test]
    fn full_height_strip_walks_the_whole_texture() {
        // line height equals screen height: one texel row per two screen rows
        let span = Span::new(1.0, 64);
        let rows: Vec<usize> = texture_rows(&span, 64, 32).collect();
        assert_eq!(rows.len(), 63);
        assert_eq!(rows[0], 0);
        assert_eq!(rows[1], 0);
        assert_eq!(rows[2], 1);
        assert_eq!(rows[62], 31);
    }

    #[test]
    fn close_wall_starts_mid_texture() {
        // wall taller than the screen: the top rows of the texture are cut
        // off, the first visible row is 16 - 16 * 0.45 = 8.8
        let span = Span::new(0.45, 64);
        assert_eq!(span.draw_start, 0);
        let first = texture_rows(&span, 64, 32).next().unwrap();
        assert_eq!(first, 8);
    }

    #[test]
    fn shade_halves_without_bleed() {
        assert_eq!(shade(pack_rgb(255, 255, 255)), pack_rgb(127, 127, 127));
        assert_eq!(shade(pack_rgb(1, 3, 200)), pack_rgb(0, 1, 100));
        for c in [0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0x0081_8A91] {
            let [r, g, b] = unpack_rgb(c);
            let [sr, sg, sb] = unpack_rgb(shade(c));
            assert!(sr <= r && sg <= g && sb <= b);
            assert_eq!([sr, sg, sb], [r >> 1, g >> 1, b >> 1]);
        }
    }

    #[test]
    fn draws_only_inside_span() {
        let tex = Texture::from_fn(4, 4, |_, _| pack_rgb(200, 100, 50)).unwrap();
        let mut column = vec![7u32; 40];
        let span = draw_column(&mut column, &hit(2.0, Side::X, 0.5, [1.0, 0.0]), &tex);
        assert_eq!((span.draw_start, span.draw_end), (10, 30));
        assert!(column[..10].iter().all(|&c| c == 7));
        assert!(column[10..30].iter().all(|&c| c == pack_rgb(200, 100, 50)));
        assert!(column[30..].iter().all(|&c| c == 7));
    }

    #[test]
    fn y_side_strip_is_darker() {
        let tex = Texture::from_fn(4, 4, |x, y| pack_rgb(60 * x as u8, 60 * y as u8, 255)).unwrap();
        let mut lit = vec![0u32; 16];
        let mut dark = vec![0u32; 16];
        draw_column(&mut lit, &hit(1.0, Side::X, 0.3, [1.0, -0.1]), &tex);
        draw_column(&mut dark, &hit(1.0, Side::Y, 0.3, [0.1, 1.0]), &tex);
        for (a, b) in lit.iter().zip(&dark) {
            assert_eq!(*b, shade(*a));
        }
    }
}
