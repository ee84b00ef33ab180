//! Headless scene viewer
//!
//! Seeds the reference scene (four primitives, a water surface over a sandy
//! floor, a skybox that doubles as the environment map), runs a few frames
//! through the frame sequencer on the recording backend and picks what lies
//! under the cursor.
//!
//! Shader sources and textures are read from the paths in the renderer
//! configuration and from `assets/textures`. Anything that fails to load is
//! replaced by a placeholder so the viewer also runs from a bare checkout.
//!
//! Usage: `viewer [renderer.toml | renderer.ron]`

mod spin;

use scene_renderer::ecs::components::TransformFactory;
use scene_renderer::foundation::logging;
use scene_renderer::foundation::math::constants::PI;
use scene_renderer::prelude::*;
use scene_renderer::render::{MeshData, PixelFormat, TextureImage};

use spin::SpinSystem;

// Configuration constants
const WINDOW_WIDTH: u32 = 800;
const WINDOW_HEIGHT: u32 = 800;
const FRAMES: u32 = 3;
const SPIN_DEGREES_PER_FRAME: f32 = 1.0;
const SKYBOX_SCALE: f32 = 50.0;

const DEFAULT_TEXTURE: &str = "assets/textures/default.png";
const TRANSPARENT_TEXTURE: &str = "assets/textures/transparent.png";
const WATER_TEXTURE: &str = "assets/textures/water.png";
const FLOOR_TEXTURE: &str = "assets/textures/dessert-floor.png";
const SKYBOX_FACES: [&str; 6] = [
    "assets/textures/skybox/right.jpg",
    "assets/textures/skybox/left.jpg",
    "assets/textures/skybox/top.jpg",
    "assets/textures/skybox/bottom.jpg",
    "assets/textures/skybox/back.jpg",
    "assets/textures/skybox/front.jpg",
];

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Programs the scene draws with
struct Shaders {
    default: ProgramHandle,
    outline: ProgramHandle,
    water: ProgramHandle,
    skybox: ProgramHandle,
}

/// Resource loading with placeholders for anything missing on disk
struct Loader {
    backend: RecordingBackend,
    registry: ResourceRegistry,
}

impl Loader {
    fn new(config: &RendererConfig) -> Self {
        Self {
            backend: RecordingBackend::new(WINDOW_WIDTH, WINDOW_HEIGHT),
            registry: ResourceRegistry::new(config.shaders.clone()),
        }
    }

    fn shader(&mut self, kind: ShaderKind) -> AppResult<ProgramHandle> {
        match self.registry.shader(&mut self.backend, kind) {
            Ok(program) => Ok(program),
            Err(e) => {
                log::warn!("{:?} shader unavailable ({}), using a placeholder program", kind, e);
                Ok(self.backend.create_program(&ShaderSource::new("", ""))?)
            }
        }
    }

    fn texture(&mut self, path: &str) -> AppResult<TextureHandle> {
        match self.registry.texture(&mut self.backend, path) {
            Ok(texture) => Ok(texture),
            Err(e) => {
                log::warn!("Texture {} unavailable ({}), using a placeholder", path, e);
                Ok(self.backend.create_texture_2d(&TextureImage {
                    width: 1,
                    height: 1,
                    format: PixelFormat::Rgba8,
                    pixels: vec![255, 255, 255, 255],
                })?)
            }
        }
    }

    fn cube_map(&mut self, faces: &[&str]) -> AppResult<TextureHandle> {
        match self.registry.cube_map(&mut self.backend, faces) {
            Ok(texture) => Ok(texture),
            Err(e) => {
                log::warn!("Skybox unavailable ({}), using a placeholder cube map", e);
                let face = TextureImage { width: 1, height: 1, format: PixelFormat::Rgb8, pixels: vec![128, 160, 200] };
                Ok(self.backend.create_cube_map(&std::array::from_fn(|_| face.clone()))?)
            }
        }
    }

    fn shaders(&mut self) -> AppResult<Shaders> {
        Ok(Shaders {
            default: self.shader(ShaderKind::Default)?,
            outline: self.shader(ShaderKind::Outline)?,
            water: self.shader(ShaderKind::Water)?,
            skybox: self.shader(ShaderKind::Skybox)?,
        })
    }

    /// Create a renderable entity
    fn spawn(
        &mut self,
        scene: &mut Scene,
        mesh: MeshData,
        transform: Mat4,
        material: MaterialComponent,
    ) -> AppResult<Entity> {
        let entity = scene.create_entity();
        scene.set_transform(entity, transform)?;
        scene.set_mesh(entity, MeshComponent::upload(&mut self.backend, mesh)?)?;
        scene.set_material(entity, material)?;
        Ok(entity)
    }
}

/// Horizontal 100 x 100 plane at height `y`
fn ground_plane(y: f32) -> Mat4 {
    Mat4::new_translation(&Vec3::new(0.0, y, 0.0))
        * Mat4::from_axis_angle(&Vec3::x_axis(), -PI / 2.0)
        * Mat4::new_scaling(100.0)
}

struct ViewerApp {
    scene: Scene,
    sequencer: FrameSequencer,
}

impl ViewerApp {
    fn new(config: RendererConfig) -> AppResult<Self> {
        let mut loader = Loader::new(&config);
        let shaders = loader.shaders()?;
        let mut scene = Scene::new();

        let default_texture = loader.texture(DEFAULT_TEXTURE)?;
        let transparent_texture = loader.texture(TRANSPARENT_TEXTURE)?;

        let sphere = loader.spawn(
            &mut scene,
            MeshData::sphere(32, 16),
            TransformFactory::at(Vec3::new(-1.5, 1.5, 0.0)),
            MaterialComponent::new(shaders.default, default_texture),
        )?;

        let cube = loader.spawn(
            &mut scene,
            MeshData::cube(),
            TransformFactory::at(Vec3::new(1.5, 1.5, 0.0)) * Mat4::from_axis_angle(&Vec3::x_axis(), -PI / 16.0),
            MaterialComponent::new(shaders.default, transparent_texture).with_outline().transparent(),
        )?;

        let cylinder = loader.spawn(
            &mut scene,
            MeshData::cylinder(0.5, 1.5, 32),
            TransformFactory::at(Vec3::new(-1.5, -1.5, 0.0)) * Mat4::from_axis_angle(&Vec3::z_axis(), PI / 4.0),
            MaterialComponent::new(shaders.default, default_texture),
        )?;

        let pyramid = loader.spawn(
            &mut scene,
            MeshData::pyramid(),
            TransformFactory::at(Vec3::new(1.5, -1.5, 0.0)),
            MaterialComponent::new(shaders.default, transparent_texture).transparent(),
        )?;

        for entity in [sphere, cube, cylinder, pyramid] {
            scene.add_logic(entity)?;
        }

        let water_texture = loader.texture(WATER_TEXTURE)?;
        loader.spawn(
            &mut scene,
            MeshData::quad(),
            ground_plane(-4.0),
            MaterialComponent::new(shaders.water, water_texture).transparent().with_metallicness(0.5),
        )?;

        let floor_texture = loader.texture(FLOOR_TEXTURE)?;
        loader.spawn(
            &mut scene,
            MeshData::quad(),
            ground_plane(-6.0),
            MaterialComponent::new(shaders.default, floor_texture).with_metallicness(0.0),
        )?;

        // Depth tested but never written, so it only fills what the opaque pass left empty
        let skybox_texture = loader.cube_map(&SKYBOX_FACES)?;
        let skybox = loader.spawn(
            &mut scene,
            MeshData::cube(),
            Mat4::new_scaling(SKYBOX_SCALE),
            MaterialComponent::new(shaders.skybox, skybox_texture)
                .with_texture_kind(TextureKind::CubeMap)
                .without_depth(),
        )?;

        let camera = scene.create_entity();
        scene.set_transform(camera, TransformFactory::camera_looking_at(Vec3::new(0.0, 0.0, 6.0), Vec3::zeros(), Vec3::y()))?;

        log::info!(
            "Scene seeded with {} entities ({} programs, {} textures loaded from disk)",
            scene.entity_count(),
            loader.registry.shaders().len(),
            loader.registry.textures().len()
        );

        let mut renderer = RenderSystem::new(Box::new(loader.backend), config, shaders.outline)?;
        renderer.set_camera(&scene, camera)?;
        renderer.set_environment_map(&scene, skybox)?;

        let mut sequencer = FrameSequencer::new();
        sequencer.add_system(SpinSystem::new(SPIN_DEGREES_PER_FRAME));
        sequencer.add_system(renderer);

        Ok(Self { scene, sequencer })
    }

    fn run(&mut self) -> AppResult<()> {
        for _ in 0..FRAMES {
            let report = self.sequencer.run_frame(&mut self.scene)?;
            log::info!(
                "Frame {}: visited {} entities, {} faults",
                report.frame,
                report.entities_visited,
                report.faults.len()
            );
            for fault in &report.faults {
                log::warn!("  {:?}", fault);
            }
        }

        let renderer = self
            .sequencer
            .system_mut::<RenderSystem>()
            .ok_or("render system is not registered")?;

        if let Some(backend) = renderer.backend_as::<RecordingBackend>() {
            log::info!(
                "Recorded {} draws and {} presents",
                backend.count_calls(|call| matches!(call, BackendCall::DrawIndexed { .. })),
                backend.count_calls(|call| matches!(call, BackendCall::Present))
            );
        }

        let (width, height) = renderer.backend().framebuffer_size();
        let sphere_on_screen = CursorPosition::new(f64::from(width) * 0.284, f64::from(height) * 0.284);
        for (label, cursor) in [("centre", CursorPosition::center_of(width, height)), ("sphere", sphere_on_screen)] {
            let report = renderer.pick_detailed(&self.scene, cursor)?;
            match report.hit {
                Some(hit) => log::info!(
                    "Pick at {} ({:.0}, {:.0}): {} triangle {} at distance {:.3}",
                    label, cursor.x, cursor.y, hit.entity, hit.triangle, hit.distance
                ),
                None => log::info!("Pick at {} ({:.0}, {:.0}): nothing", label, cursor.x, cursor.y),
            }
        }

        Ok(())
    }
}

fn load_config() -> AppResult<RendererConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading renderer configuration from {}", path);
            Ok(RendererConfig::load_from_file(&path)?)
        }
        None => Ok(RendererConfig::default()),
    }
}

fn main() -> AppResult<()> {
    logging::init();

    log::info!("Starting headless scene viewer");

    let config = load_config()?;
    let mut app = ViewerApp::new(config)?;

    match app.run() {
        Ok(()) => {
            log::info!("Viewer finished");
            Ok(())
        }
        Err(e) => {
            log::error!("Viewer failed: {}", e);
            Err(e)
        }
    }
}
