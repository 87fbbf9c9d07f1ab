use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::error::ConfigError;
use crate::texture::pack_rgb;

/// Engine settings. Every field has a default, so a config file only needs
/// the keys it wants to change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Internal render resolution; the window stretches it.
    pub screen_width: usize,
    pub screen_height: usize,
    /// Edge length of every wall texture. Must be a power of two.
    pub texture_size: usize,
    /// Radians turned per tick while a turn key is held.
    pub rot_speed: f32,
    /// Cells moved per tick while a move key is held. This is also the
    /// look-ahead used for wall collision, so it sets how close the camera
    /// can get to a wall.
    pub move_speed: f32,
    /// Input ticks per second.
    pub tick_rate: u32,
    pub start_pos: [f32; 2],
    pub start_dir: [f32; 2],
    pub fov_degrees: f32,
    pub background: [u8; 3],
    /// Image files for texture ids 1, 2, ... in order.
    pub textures: Vec<PathBuf>,
    /// JSON map file; the built-in level is used when unset.
    pub map: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let textures = [
            "bricks.png",
            "dirt.png",
            "grass_block_side.png",
            "cobblestone.png",
            "chiseled_nether_bricks.png",
        ]
        .iter()
        .map(|name| Path::new("textures").join(name))
        .collect();

        Self {
            screen_width: 400,
            screen_height: 400,
            texture_size: 32,
            rot_speed: 0.01,
            move_speed: 0.01,
            tick_rate: 100,
            start_pos: [8.0, 5.0],
            start_dir: [-1.0, 1.0],
            fov_degrees: 66.0,
            background: [129, 138, 145],
            textures,
            map: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn camera(&self) -> Camera {
        Camera::with_fov(self.start_pos, self.start_dir, self.fov_degrees)
    }

    pub fn background_color(&self) -> u32 {
        let [r, g, b] = self.background;
        pack_rgb(r, g, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "screen_width": 320, "move_speed": 0.05 }"#).unwrap();
        assert_eq!(config.screen_width, 320);
        assert_eq!(config.move_speed, 0.05);
        assert_eq!(config.screen_height, 400);
        assert_eq!(config.textures.len(), 5);
        assert!(config.map.is_none());
    }

    #[test]
    fn defaults_round_trip_through_json() {
        let json = serde_json::to_string_pretty(&Config::default()).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Config::default());
    }

    #[test]
    fn start_camera_is_inside_the_demo_map() {
        let config = Config::default();
        let cam = config.camera();
        let map = crate::world::WorldMap::demo();
        assert!(!map.is_blocked(cam.pos[0], cam.pos[1]));
        assert!((cam.fov_degrees() - 66.0).abs() < 1e-3);
        assert_eq!(config.background_color(), pack_rgb(129, 138, 145));
    }

    #[test]
    fn load_reports_path_on_error() {
        let missing = Path::new("/nonexistent/raycaster.json");
        let err = Config::load(missing).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/raycaster.json"));

        let dir = std::env::temp_dir().join("grid_raycaster_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let bad = dir.join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(Config::load(&bad), Err(ConfigError::Parse { .. })));
    }
}
