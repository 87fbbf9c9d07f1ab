use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

use crate::camera::Camera;
use crate::column::{Span, draw_column};
use crate::error::EngineError;
use crate::raycaster::{RayHit, cast_ray};
use crate::texture::TextureAtlas;
use crate::world::WorldMap;

/// Read-only inputs for one frame. The camera is a snapshot, so movement
/// applied while a frame is in flight cannot reach it.
///
/// Only [`FrameContext::new`] builds one, so every context has an atlas that
/// covers the map and a camera standing in an open cell.
#[derive(Clone, Copy, Debug)]
pub struct FrameContext<'a> {
    map: &'a WorldMap,
    atlas: &'a TextureAtlas,
    camera: Camera,
}

impl<'a> FrameContext<'a> {
    /// Fails if a wall in `map` names a texture `atlas` does not have, or if
    /// the camera is off the grid or inside a wall.
    pub fn new(
        map: &'a WorldMap,
        atlas: &'a TextureAtlas,
        camera: Camera,
    ) -> Result<Self, EngineError> {
        atlas.check_covers(map)?;
        map.check_start(camera.pos)?;
        Ok(Self { map, atlas, camera })
    }

    #[inline]
    pub fn map(&self) -> &'a WorldMap {
        self.map
    }

    #[inline]
    pub fn atlas(&self) -> &'a TextureAtlas {
        self.atlas
    }

    #[inline]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    /// Casts and draws screen column `index` of a `screen_width` wide frame
    /// into `column`.
    pub fn render_column(
        &self,
        index: usize,
        screen_width: usize,
        column: &mut [u32],
    ) -> (RayHit, Option<Span>) {
        let hit = cast_ray(&self.camera, self.map, index, screen_width);
        let span = self
            .atlas
            .get(hit.texture)
            .map(|texture| draw_column(column, &hit, texture));
        (hit, span)
    }
}

/// Software frame buffer, stored column by column so each screen column is
/// one contiguous slice that a worker can own outright.
pub struct Frame {
    width: usize,
    height: usize,
    background: u32,
    pixels: Vec<u32>,
}

impl Frame {
    pub fn new(width: usize, height: usize, background: u32) -> Self {
        Self {
            width,
            height,
            background,
            pixels: vec![background; width * height],
        }
    }

    /// Reallocates if the size changed.
    pub fn resize(&mut self, width: usize, height: usize) {
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.pixels = vec![self.background; width * height];
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn background(&self) -> u32 {
        self.background
    }

    /// Column-major pixels: column `x` is `pixels()[x * height..(x + 1) * height]`.
    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    #[cfg(test)]
    pub(crate) fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    #[inline]
    pub fn column(&self, x: usize) -> &[u32] {
        &self.pixels[x * self.height..(x + 1) * self.height]
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.pixels[x * self.height + y]
    }

    /// Clears to the background and draws every column, spread across the
    /// rayon pool.
    pub fn render(&mut self, ctx: &FrameContext<'_>) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let (width, background) = (self.width, self.background);
        self.pixels
            .par_chunks_mut(self.height)
            .enumerate()
            .for_each(|(x, column)| {
                column.fill(background);
                ctx.render_column(x, width, column);
            });
    }

    /// Same output as [`Frame::render`], one column at a time from the left.
    pub fn render_serial(&mut self, ctx: &FrameContext<'_>) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        self.pixels.fill(self.background);
        let width = self.width;
        for (x, column) in self.pixels.chunks_mut(self.height).enumerate() {
            ctx.render_column(x, width, column);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MapError, TextureError};
    use crate::texture::pack_rgb;

    const SKY: u32 = 0x0012_3456;

    fn scene() -> (WorldMap, TextureAtlas) {
        (WorldMap::demo(), TextureAtlas::procedural(5, 32).unwrap())
    }

    #[test]
    fn context_rejects_atlas_missing_ids() {
        let map = WorldMap::demo();
        let atlas = TextureAtlas::procedural(3, 32).unwrap();
        let cam = Camera::new([8.0, 5.0], [-1.0, 0.0], [0.0, 0.66]);
        assert!(matches!(
            FrameContext::new(&map, &atlas, cam),
            Err(EngineError::Texture(TextureError::MissingId { id: 5, available: 3 }))
        ));
    }

    #[test]
    fn context_rejects_camera_off_the_map_or_in_a_wall() {
        let small = WorldMap::new(vec![
            vec![1, 1, 1, 1, 1],
            vec![1, 0, 0, 0, 1],
            vec![1, 0, 0, 0, 1],
            vec![1, 1, 1, 1, 1],
        ])
        .unwrap();
        let atlas = TextureAtlas::procedural(1, 32).unwrap();
        let off_grid = Camera::with_fov([8.0, 5.0], [-1.0, 1.0], 66.0);
        assert!(matches!(
            FrameContext::new(&small, &atlas, off_grid),
            Err(EngineError::Map(MapError::BlockedStart { x: 8, y: 5 }))
        ));

        let (map, atlas) = scene();
        let in_wall = Camera::with_fov([2.5, 2.5], [1.0, 0.0], 66.0);
        assert!(matches!(
            FrameContext::new(&map, &atlas, in_wall),
            Err(EngineError::Map(MapError::BlockedStart { x: 2, y: 2 }))
        ));
    }

    #[test]
    fn parallel_and_serial_agree() {
        let (map, atlas) = scene();
        let cam = Camera::with_fov([8.0, 5.0], [-1.0, 1.0], 66.0);
        let ctx = FrameContext::new(&map, &atlas, cam).unwrap();
        assert_eq!(ctx.camera(), cam);
        assert_eq!(ctx.map().width(), 20);
        assert_eq!(ctx.atlas().len(), 5);

        let mut a = Frame::new(160, 120, SKY);
        let mut b = Frame::new(160, 120, SKY);
        a.render(&ctx);
        b.render_serial(&ctx);
        assert!(a.pixels() == b.pixels());
    }

    #[test]
    fn previous_frame_is_cleared() {
        let (map, atlas) = scene();
        let near = Camera::with_fov([1.2, 1.5], [-1.0, 0.0], 66.0);
        let far = Camera::with_fov([18.5, 1.5], [-1.0, 0.0], 66.0);

        let mut frame = Frame::new(64, 48, SKY);
        frame.render(&FrameContext::new(&map, &atlas, near).unwrap());
        frame.render(&FrameContext::new(&map, &atlas, far).unwrap());

        let mut fresh = Frame::new(64, 48, SKY);
        fresh.render(&FrameContext::new(&map, &atlas, far).unwrap());
        assert!(frame.pixels() == fresh.pixels());
    }

    #[test]
    fn rows_outside_spans_keep_background() {
        let (map, atlas) = scene();
        let cam = Camera::with_fov([8.5, 5.5], [0.0, 1.0], 66.0);
        let ctx = FrameContext::new(&map, &atlas, cam).unwrap();
        let mut frame = Frame::new(32, 100, SKY);
        frame.render(&ctx);
        for x in 0..32 {
            let mut column = vec![SKY; 100];
            let (_, span) = ctx.render_column(x, 32, &mut column);
            let span = span.unwrap();
            for y in (0..span.draw_start).chain(span.draw_end..100) {
                assert_eq!(frame.pixel(x, y), SKY, "({x}, {y})");
            }
            assert_eq!(frame.column(x), &column[..]);
        }
    }

    #[test]
    fn resize_reallocates_and_clears() {
        let mut frame = Frame::new(4, 4, pack_rgb(1, 2, 3));
        frame.resize(8, 2);
        assert_eq!((frame.width(), frame.height()), (8, 2));
        assert_eq!(frame.pixels().len(), 16);
        assert!(frame.pixels().iter().all(|&c| c == frame.background()));
    }

    #[test]
    fn empty_frame_renders_nothing() {
        let (map, atlas) = scene();
        let cam = Camera::with_fov([8.5, 5.5], [0.0, 1.0], 66.0);
        let ctx = FrameContext::new(&map, &atlas, cam).unwrap();
        let mut frame = Frame::new(0, 10, SKY);
        frame.render(&ctx);
        frame.render_serial(&ctx);
        assert!(frame.pixels().is_empty());
    }
}
