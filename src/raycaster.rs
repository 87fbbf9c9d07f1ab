use crate::camera::Camera;
use crate::world::{Cell, TextureId, WorldMap};

/// Substituted for a zero ray component or a zero wall distance before
/// dividing, so the reciprocal is huge but finite.
pub const DIVISION_EPSILON: f32 = 1e-7;

/// Which family of grid lines the ray crossed last before hitting a wall.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// Crossed a vertical line (constant x): an east or west face.
    X,
    /// Crossed a horizontal line (constant y): a north or south face.
    Y,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub cell: [i32; 2],
    pub texture: TextureId,
    /// Distance along the view direction, not the ray length.
    pub perp_dist: f32,
    pub side: Side,
    /// Where along the struck face the ray landed, in `[0, 1)`.
    pub wall_fraction: f32,
    pub ray_dir: [f32; 2],
}

/// Ray length between two successive grid lines of one axis.
#[inline]
fn delta_dist(component: f32) -> f32 {
    let d = if component == 0.0 {
        DIVISION_EPSILON
    } else {
        component
    };
    (1.0 / d).abs()
}

/// Casts the ray for screen column `column` and walks the grid until it
/// enters a wall cell.
///
/// The map's solid border guarantees termination. When both axes reach their
/// next grid line at exactly the same distance the step goes along Y.
pub fn cast_ray(camera: &Camera, map: &WorldMap, column: usize, screen_width: usize) -> RayHit {
    let ray_dir = camera.ray_dir(column, screen_width);
    cast(camera.pos, ray_dir, map)
}

/// DDA walk from `pos` along `ray_dir`.
pub fn cast(pos: [f32; 2], ray_dir: [f32; 2], map: &WorldMap) -> RayHit {
    let mut cell = [pos[0].floor() as i32, pos[1].floor() as i32];
    let delta = [delta_dist(ray_dir[0]), delta_dist(ray_dir[1])];

    let mut step = [0i32; 2];
    let mut side_dist = [0f32; 2];
    for axis in 0..2 {
        if ray_dir[axis] < 0.0 {
            step[axis] = -1;
            side_dist[axis] = (pos[axis] - cell[axis] as f32) * delta[axis];
        } else {
            step[axis] = 1;
            side_dist[axis] = (cell[axis] as f32 + 1.0 - pos[axis]) * delta[axis];
        }
    }

    let (side, texture) = loop {
        let side = if side_dist[0] < side_dist[1] {
            side_dist[0] += delta[0];
            cell[0] += step[0];
            Side::X
        } else {
            side_dist[1] += delta[1];
            cell[1] += step[1];
            Side::Y
        };
        if let Cell::Wall(id) = map.cell(cell[0] as usize, cell[1] as usize) {
            break (side, id);
        }
    };

    // Back off the final step: that is the distance to the face we crossed.
    let axis = match side {
        Side::X => 0,
        Side::Y => 1,
    };
    let perp_dist = side_dist[axis] - delta[axis];

    let along = match side {
        Side::X => pos[1] + perp_dist * ray_dir[1],
        Side::Y => pos[0] + perp_dist * ray_dir[0],
    };
    let mut wall_fraction = along - along.floor();
    if wall_fraction >= 1.0 {
        // along was a hair below an integer and the subtraction rounded up
        wall_fraction = 0.0;
    }

    RayHit {
        cell,
        texture,
        perp_dist,
        side,
        wall_fraction,
        ray_dir,
    }
}
