use crate::world::WorldMap;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub pos: [f32; 2],   // (x, y) position in map cells
    pub dir: [f32; 2],   // facing direction
    pub plane: [f32; 2], // camera plane, perpendicular to dir; its length sets the FOV
}

#[inline]
fn rotate_vec(v: [f32; 2], c: f32, s: f32) -> [f32; 2] {
    let [x, y] = v;
    [x * c - y * s, x * s + y * c]
}

impl Camera {
    pub fn new(pos: [f32; 2], dir: [f32; 2], plane: [f32; 2]) -> Self {
        Self { pos, dir, plane }
    }

    /// Camera whose plane is perpendicular to `dir` (to its right) and
    /// scaled for the given horizontal field of view.
    pub fn with_fov(pos: [f32; 2], dir: [f32; 2], fov_x_deg: f32) -> Self {
        let half = (0.5 * fov_x_deg.to_radians()).tan();
        let plane = [dir[1] * half, -dir[0] * half];
        Self { pos, dir, plane }
    }

    /// Horizontal field of view implied by the dir/plane lengths.
    pub fn fov_degrees(&self) -> f32 {
        let dir_len = self.dir[0].hypot(self.dir[1]);
        let plane_len = self.plane[0].hypot(self.plane[1]);
        2.0 * (plane_len / dir_len).atan().to_degrees()
    }

    /// Turns dir and plane together by `angle` radians (positive is
    /// counter-clockwise in map space).
    pub fn rotate(&mut self, angle: f32) {
        let (s, c) = angle.sin_cos();
        self.dir = rotate_vec(self.dir, c, s);
        self.plane = rotate_vec(self.plane, c, s);
    }

    /// Moves along dir by `delta` (negative walks backwards). X is tested
    /// and applied first, then Y from wherever X ended up, so a blocked axis
    /// doesn't stop the other one and the camera slides along walls.
    pub fn try_move(&mut self, map: &WorldMap, delta: f32) {
        let nx = self.pos[0] + self.dir[0] * delta;
        if !map.is_blocked(nx, self.pos[1]) {
            self.pos[0] = nx;
        }
        let ny = self.pos[1] + self.dir[1] * delta;
        if !map.is_blocked(self.pos[0], ny) {
            self.pos[1] = ny;
        }
    }

    /// Direction of the ray through column `column` of a `width` wide screen.
    #[inline]
    pub fn ray_dir(&self, column: usize, width: usize) -> [f32; 2] {
        let camera_x = 2.0 * column as f32 / width as f32 - 1.0;
        [
            self.dir[0] + self.plane[0] * camera_x,
            self.dir[1] + self.plane[1] * camera_x,
        ]
    }
}
