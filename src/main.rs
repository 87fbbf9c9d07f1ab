use std::collections::HashSet;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::rc::Rc;
use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use grid_raycaster::present::{ScaleLut, present};
use grid_raycaster::{Camera, Config, Frame, FrameContext, TextureAtlas, WorldMap};

/// Textured grid raycaster.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// JSON config file; missing keys fall back to defaults.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// JSON map file (array of columns), replaces the built-in level.
    #[arg(short, long, value_name = "FILE")]
    map: Option<PathBuf>,
    /// Directory the configured texture file names are looked up in.
    #[arg(short, long, value_name = "DIR")]
    textures: Option<PathBuf>,
    /// Internal render resolution as WIDTHxHEIGHT (for example 320x200).
    #[arg(short, long, value_name = "WIDTHxHEIGHT")]
    size: Option<SizeArg>,
}

#[derive(Clone, Copy, Debug)]
struct SizeArg {
    width: usize,
    height: usize,
}

impl FromStr for SizeArg {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (width, height) = value
            .split_once(['x', 'X'])
            .ok_or_else(|| "expected format WIDTHxHEIGHT".to_string())?;
        let width = width
            .trim()
            .parse::<usize>()
            .map_err(|error| format!("invalid width: {error}"))?;
        let height = height
            .trim()
            .parse::<usize>()
            .map_err(|error| format!("invalid height: {error}"))?;
        if width == 0 || height == 0 {
            return Err("size must be positive".to_string());
        }
        Ok(Self { width, height })
    }
}

struct App {
    window: Option<Rc<Window>>,
    surface: Option<softbuffer::Surface<Rc<Window>, Rc<Window>>>,
    map: WorldMap,
    atlas: TextureAtlas,
    camera: Camera,

    // HUD
    frame_counter: u32,
    last_fps_print: Instant,

    // Internal frame at the configured resolution, stretched to the window
    frame: Frame,
    scale_lut: ScaleLut,

    // Input and movement, applied in fixed ticks between frames
    keys_down: HashSet<KeyCode>,
    last_tick: Instant,
    tick_len: Duration,
    pending: Duration,
    move_speed: f32,
    rot_speed: f32,
}

impl App {
    fn new(config: &Config, map: WorldMap, atlas: TextureAtlas) -> Self {
        Self {
            window: None,
            surface: None,
            map,
            atlas,
            camera: config.camera(),

            frame_counter: 0,
            last_fps_print: Instant::now(),

            frame: Frame::new(
                config.screen_width,
                config.screen_height,
                config.background_color(),
            ),
            scale_lut: ScaleLut::default(),

            keys_down: HashSet::new(),
            last_tick: Instant::now(),
            tick_len: Duration::from_secs(1) / config.tick_rate.max(1),
            pending: Duration::ZERO,
            move_speed: config.move_speed,
            rot_speed: config.rot_speed,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let attributes = Window::default_attributes()
            .with_title("Grid Raycaster")
            .with_inner_size(LogicalSize::new(
                self.frame.width() as f64,
                self.frame.height() as f64,
            ));

        let window = Rc::new(event_loop.create_window(attributes).expect("create window"));

        let context = softbuffer::Context::new(window.clone()).expect("softbuffer context");
        let surface =
            softbuffer::Surface::new(&context, window.clone()).expect("softbuffer surface");

        self.surface = Some(surface);
        self.window = Some(window.clone());

        self.last_tick = Instant::now();
        window.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("close requested, stopping");
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => match state {
                ElementState::Pressed => {
                    if matches!(code, KeyCode::KeyQ | KeyCode::Escape) {
                        log::info!("quit key pressed, stopping");
                        event_loop.exit();
                        return;
                    }
                    self.keys_down.insert(code);
                }
                ElementState::Released => {
                    self.keys_down.remove(&code);
                }
            },

            WindowEvent::RedrawRequested => {
                self.tick();

                let (window, surface) = match (&self.window, &mut self.surface) {
                    (Some(w), Some(s)) if w.id() == id => (w, s),
                    _ => return,
                };

                let size = window.inner_size();
                let (Some(dw), Some(dh)) =
                    (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
                else {
                    return; // minimized
                };
                if let Err(e) = surface.resize(dw, dh) {
                    log::error!("surface resize failed: {e}");
                    return;
                }

                let ctx = match FrameContext::new(&self.map, &self.atlas, self.camera) {
                    Ok(ctx) => ctx,
                    Err(e) => {
                        log::error!("cannot render: {e}");
                        event_loop.exit();
                        return;
                    }
                };
                self.frame.render(&ctx);

                let (dw, dh) = (dw.get() as usize, dh.get() as usize);
                let (fw, fh) = (self.frame.width(), self.frame.height());
                if !self.scale_lut.matches(dw, dh, fw, fh) {
                    self.scale_lut = ScaleLut::new(dw, dh, fw, fh);
                }

                let mut buf = match surface.buffer_mut() {
                    Ok(buf) => buf,
                    Err(e) => {
                        log::error!("no surface buffer: {e}");
                        return;
                    }
                };
                present(&mut buf, &self.frame, &self.scale_lut);
                if let Err(e) = buf.present() {
                    log::error!("present failed: {e}");
                }

                self.frame_counter += 1;
                let now = Instant::now();
                let elapsed = now.duration_since(self.last_fps_print).as_secs_f32();
                if elapsed >= 1.0 {
                    log::info!("FPS: {:.1}", self.frame_counter as f32 / elapsed);
                    self.frame_counter = 0;
                    self.last_fps_print = now;
                }

                window.request_redraw();
            }

            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl App {
    /// Applies held keys once per elapsed tick. Runs before rendering, so a
    /// frame always sees one settled camera.
    fn tick(&mut self) {
        let now = Instant::now();
        // cap catch-up after a stall so the camera doesn't jump
        self.pending += now.duration_since(self.last_tick).min(Duration::from_millis(100));
        self.last_tick = now;

        while self.pending >= self.tick_len {
            self.pending -= self.tick_len;

            if self.keys_down.contains(&KeyCode::ArrowLeft) {
                self.camera.rotate(self.rot_speed);
            }
            if self.keys_down.contains(&KeyCode::ArrowRight) {
                self.camera.rotate(-self.rot_speed);
            }
            if self.keys_down.contains(&KeyCode::ArrowUp) {
                self.camera.try_move(&self.map, self.move_speed);
            }
            if self.keys_down.contains(&KeyCode::ArrowDown) {
                self.camera.try_move(&self.map, -self.move_speed);
            }
        }
    }
}

fn load_config(args: &CliArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(map) = &args.map {
        config.map = Some(map.clone());
    }
    if let Some(dir) = &args.textures {
        for path in &mut config.textures {
            if let Some(name) = path.file_name() {
                *path = dir.join(name);
            }
        }
    }
    if let Some(size) = args.size {
        config.screen_width = size.width;
        config.screen_height = size.height;
    }
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = CliArgs::parse();
    let config = load_config(&args)?;

    let map = match &config.map {
        Some(path) => WorldMap::load(path)
            .with_context(|| format!("loading map {}", path.display()))?,
        None => WorldMap::demo(),
    };
    let atlas = TextureAtlas::load(config.textures.as_slice(), config.texture_size)
        .context("loading wall textures")?;
    let camera = config.camera();
    FrameContext::new(&map, &atlas, camera).with_context(|| {
        format!(
            "cannot start at ({}, {}) with this map and these textures",
            camera.pos[0], camera.pos[1]
        )
    })?;
    log::info!(
        "{}x{} map, {} textures, rendering at {}x{}",
        map.width(),
        map.height(),
        atlas.len(),
        config.screen_width,
        config.screen_height
    );

    let event_loop = EventLoop::new().context("creating event loop")?;
    // Held keys are sampled every frame, so keep the loop spinning.
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(&config, map, atlas);
    event_loop.run_app(&mut app).context("event loop")?;
    Ok(())
}
