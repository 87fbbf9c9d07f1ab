use std::path::Path;

use crate::error::TextureError;
use crate::world::{TextureId, WorldMap};

/// Packs 8-bit channels as `0x00RRGGBB`, the layout softbuffer presents.
#[inline]
pub const fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}

#[inline]
pub const fn unpack_rgb(c: u32) -> [u8; 3] {
    [(c >> 16) as u8, (c >> 8) as u8, c as u8]
}

/// A power-of-two sized block of packed RGB pixels, stored row by row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Texture {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl Texture {
    pub fn new(width: usize, height: usize, pixels: Vec<u32>) -> Result<Self, TextureError> {
        if !width.is_power_of_two() || !height.is_power_of_two() {
            return Err(TextureError::NotPowerOfTwo { width, height });
        }
        if pixels.len() != width * height {
            return Err(TextureError::PixelCount {
                actual: pixels.len(),
                expected: width * height,
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Builds a texture by evaluating `f(x, y)` for every texel.
    pub fn from_fn(
        width: usize,
        height: usize,
        f: impl Fn(usize, usize) -> u32,
    ) -> Result<Self, TextureError> {
        let pixels = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Self::new(width, height, pixels)
    }

    /// Decodes an image file. The result must still be a power-of-two size.
    pub fn load(path: &Path) -> Result<Self, TextureError> {
        let img = image::open(path)
            .map_err(|source| TextureError::Decode {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgb8();
        let (w, h) = (img.width() as usize, img.height() as usize);
        let pixels = img.pixels().map(|p| pack_rgb(p[0], p[1], p[2])).collect();
        Self::new(w, h, pixels)
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
    pub fn texel(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }
}

/// Procedural stand-ins used when an image file is not available. Sizes
/// that are not a power of two are rejected like any other texture.
pub mod procedural {
    use super::{Texture, TextureError, pack_rgb};

    fn build(size: usize, f: impl Fn(usize, usize) -> u32) -> Result<Texture, TextureError> {
        Texture::from_fn(size, size, f)
    }

    pub fn bricks(size: usize) -> Result<Texture, TextureError> {
        let row_h = (size / 4).max(1);
        let brick_w = (size / 2).max(1);
        build(size, |x, y| {
            let row = y / row_h;
            let shifted = (x + (row % 2) * brick_w / 2) % size;
            if y % row_h == 0 || shifted % brick_w == 0 {
                pack_rgb(200, 200, 190)
            } else {
                pack_rgb(150, 60 + (row as u8 % 3) * 10, 45)
            }
        })
    }

    pub fn checker(size: usize, a: u32, b: u32) -> Result<Texture, TextureError> {
        let cell = (size / 4).max(1);
        build(size, |x, y| if (x / cell + y / cell) % 2 == 0 { a } else { b })
    }

    pub fn stripes(size: usize, a: u32, b: u32) -> Result<Texture, TextureError> {
        let band = (size / 8).max(1);
        build(size, |_, y| if (y / band) % 2 == 0 { a } else { b })
    }

    pub fn rings(size: usize, a: u32, b: u32) -> Result<Texture, TextureError> {
        let c = size as isize / 2;
        build(size, |x, y| {
            let d = (x as isize - c).abs().max((y as isize - c).abs());
            if d % 4 < 2 { a } else { b }
        })
    }

    /// Placeholder for texture slot `id`, distinct per slot.
    pub fn for_slot(id: usize, size: usize) -> Result<Texture, TextureError> {
        match id % 5 {
            1 => bricks(size),
            2 => checker(size, pack_rgb(120, 85, 60), pack_rgb(95, 65, 45)),
            3 => stripes(size, pack_rgb(90, 160, 60), pack_rgb(120, 85, 60)),
            4 => checker(size, pack_rgb(128, 128, 128), pack_rgb(96, 96, 100)),
            _ => rings(size, pack_rgb(70, 20, 25), pack_rgb(45, 12, 15)),
        }
    }
}

/// Wall textures addressed by [`TextureId`]. Id 0 is never stored: slot `n`
/// of the atlas holds the texture for id `n + 1`.
#[derive(Clone, Debug)]
pub struct TextureAtlas {
    size: usize,
    textures: Vec<Texture>,
}

impl TextureAtlas {
    /// Creates an empty atlas of `size`x`size` textures.
    pub fn new(size: usize) -> Result<Self, TextureError> {
        if !size.is_power_of_two() {
            return Err(TextureError::NotPowerOfTwo {
                width: size,
                height: size,
            });
        }
        Ok(Self {
            size,
            textures: Vec::new(),
        })
    }

    /// Appends a texture and returns the id it is reachable under. Fails
    /// once every id up to `u16::MAX` is taken.
    pub fn push(&mut self, texture: Texture) -> Result<TextureId, TextureError> {
        if texture.width != self.size || texture.height != self.size {
            return Err(TextureError::SizeMismatch {
                width: texture.width,
                height: texture.height,
                expected: self.size,
            });
        }
        let id = u16::try_from(self.textures.len() + 1)
            .ok()
            .and_then(TextureId::new)
            .ok_or(TextureError::AtlasFull { max: u16::MAX })?;
        self.textures.push(texture);
        Ok(id)
    }

    /// Loads one texture per path, in id order. Paths that do not exist get a
    /// procedural placeholder so a bare checkout still renders.
    pub fn load<P: AsRef<Path>>(paths: &[P], size: usize) -> Result<Self, TextureError> {
        let mut atlas = Self::new(size)?;
        for (slot, path) in paths.iter().enumerate() {
            let path = path.as_ref();
            let texture = if path.exists() {
                let t = Texture::load(path)?;
                log::debug!("loaded texture {} from {}", slot + 1, path.display());
                t
            } else {
                log::warn!(
                    "texture {} not found at {}, using placeholder",
                    slot + 1,
                    path.display()
                );
                procedural::for_slot(slot + 1, size)?
            };
            atlas.push(texture)?;
        }
        Ok(atlas)
    }

    /// Atlas of `count` placeholder textures.
    pub fn procedural(count: usize, size: usize) -> Result<Self, TextureError> {
        let mut atlas = Self::new(size)?;
        for id in 1..=count {
            atlas.push(procedural::for_slot(id, size)?)?;
        }
        Ok(atlas)
    }

    #[inline]
    pub fn texture_size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn get(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(usize::from(id.get()) - 1)
    }

    /// Fails if the map references an id this atlas does not hold.
    pub fn check_covers(&self, map: &WorldMap) -> Result<(), TextureError> {
        match map.max_texture_id() {
            Some(id) if usize::from(id.get()) > self.textures.len() => {
                Err(TextureError::MissingId {
                    id: id.get(),
                    available: self.textures.len(),
                })
            }
            _ => Ok(()),
        }
    }
}
