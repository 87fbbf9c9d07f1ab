//! Textured grid raycaster: casts one ray per screen column through a tile
//! map and draws the wall strip it hits.

pub mod camera;
pub mod column;
pub mod config;
pub mod error;
pub mod frame;
pub mod present;
pub mod raycaster;
pub mod texture;
pub mod world;

pub use camera::Camera;
pub use config::Config;
pub use error::EngineError;
pub use frame::{Frame, FrameContext};
pub use raycaster::{RayHit, Side, cast_ray};
pub use texture::{Texture, TextureAtlas};
pub use world::{Cell, TextureId, WorldMap};
