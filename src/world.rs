use std::num::NonZeroU16;
use std::path::Path;

use crate::error::{ConfigError, EngineError, MapError};

/// Index into the texture atlas. Zero is reserved for empty space, so every
/// wall carries a non-zero id.
pub type TextureId = NonZeroU16;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Wall(TextureId),
}

impl Cell {
    #[inline]
    pub fn from_raw(raw: u16) -> Self {
        match NonZeroU16::new(raw) {
            Some(id) => Cell::Wall(id),
            None => Cell::Empty,
        }
    }

    #[inline]
    pub fn is_solid(self) -> bool {
        matches!(self, Cell::Wall(_))
    }

    #[inline]
    pub fn texture(self) -> Option<TextureId> {
        match self {
            Cell::Wall(id) => Some(id),
            Cell::Empty => None,
        }
    }
}

/// Rectangular grid of cells indexed `[x][y]`.
///
/// Construction guarantees the outer ring of cells is solid, which is what
/// lets a ray walk terminate without bounds checks of its own.
#[derive(Clone, Debug)]
pub struct WorldMap {
    width: usize,
    height: usize,
    cells: Vec<Cell>, // x-major: cells[x * height + y]
}

impl WorldMap {
    /// Builds a map from raw ids where `grid[x][y]` is the cell at (x, y) and
    /// `0` means empty.
    pub fn new(grid: Vec<Vec<u16>>) -> Result<Self, MapError> {
        let width = grid.len();
        let height = grid.first().map_or(0, Vec::len);
        if width == 0 || height == 0 {
            return Err(MapError::Empty);
        }

        let mut cells = Vec::with_capacity(width * height);
        for (x, column) in grid.iter().enumerate() {
            if column.len() != height {
                return Err(MapError::Ragged {
                    column: x,
                    len: column.len(),
                    expected: height,
                });
            }
            cells.extend(column.iter().copied().map(Cell::from_raw));
        }

        let map = Self {
            width,
            height,
            cells,
        };
        map.check_border()?;
        Ok(map)
    }

    fn check_border(&self) -> Result<(), MapError> {
        let (w, h) = (self.width, self.height);
        let border = (0..w)
            .flat_map(|x| [(x, 0), (x, h - 1)])
            .chain((0..h).flat_map(|y| [(0, y), (w - 1, y)]));
        for (x, y) in border {
            if !self.cell(x, y).is_solid() {
                return Err(MapError::OpenBorder { x, y });
            }
        }
        Ok(())
    }

    /// Reads a JSON array of columns (`[[1, 1, 1], [1, 0, 1], ...]`).
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let grid: Vec<Vec<u16>> =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let map = Self::new(grid)?;
        log::debug!(
            "loaded {}x{} map from {}",
            map.width,
            map.height,
            path.display()
        );
        Ok(map)
    }

    /// The 20x20 level the engine ships with, using texture ids 1 through 5.
    pub fn demo() -> Self {
        let (width, height) = (DEMO_MAP.len(), DEMO_MAP[0].len());
        let cells = DEMO_MAP
            .iter()
            .flat_map(|column| column.iter().copied().map(Cell::from_raw))
            .collect();
        Self {
            width,
            height,
            cells,
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

    /// Panics when (x, y) lies outside the grid.
    #[inline]
    pub fn cell(&self, x: usize, y: usize) -> Cell {
        assert!(x < self.width && y < self.height, "cell ({x}, {y}) outside map");
        self.cells[x * self.height + y]
    }

    /// Whether the cell containing world point (x, y) blocks movement.
    /// Points off the grid count as blocked.
    pub fn is_blocked(&self, x: f32, y: f32) -> bool {
        let (cx, cy) = (x.floor(), y.floor());
        if cx < 0.0 || cy < 0.0 {
            return true;
        }
        let (cx, cy) = (cx as usize, cy as usize);
        if cx >= self.width || cy >= self.height {
            return true;
        }
        self.cell(cx, cy).is_solid()
    }

    /// Fails unless world point `pos` lies in an open cell of this map.
    pub fn check_start(&self, pos: [f32; 2]) -> Result<(), MapError> {
        if self.is_blocked(pos[0], pos[1]) {
            return Err(MapError::BlockedStart {
                x: pos[0].floor() as i64,
                y: pos[1].floor() as i64,
            });
        }
        Ok(())
    }

    /// Highest texture id referenced by any wall, if the map has walls.
    pub fn max_texture_id(&self) -> Option<TextureId> {
        self.cells.iter().filter_map(|c| c.texture()).max()
    }
}

#[rustfmt::skip]
const DEMO_MAP: [[u16; 20]; 20] = [
    [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 1, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0, 5, 5, 5, 5, 0, 0, 1],
    [1, 0, 1, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 4, 4, 0, 0, 4, 0, 0, 0, 3, 3, 3, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 3, 3, 3, 0, 0, 5, 5, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 3, 3, 3, 0, 0, 5, 5, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 3, 3, 3, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 1, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 1, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 0, 1],
    [1, 0, 0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1, 0, 0, 1],
    [1, 4, 4, 0, 0, 4, 0, 0, 5, 5, 5, 5, 0, 1, 0, 0, 1, 0, 1, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 1, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 1, 1, 0, 1, 1, 0, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 1],
    [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
];
