//! # Rendering System
//!
//! Draws every renderable entity once per frame through a [`RenderBackend`].
//!
//! ## Frame
//!
//! `begin_frame → update(entity)* → end_frame`:
//!
//! - **begin**: clear colour, depth and stencil; capture the camera position;
//!   empty the transparency queue
//! - **update**: skip entities without mesh and material; queue transparent
//!   entities; draw the rest immediately
//! - **end**: draw queued entities farthest first with alpha blending, then
//!   present
//!
//! ## Draws
//!
//! Every draw resolves its fixed-function state from the material and an
//! explicit [`DrawPass`], binds program, textures and both uniform blocks,
//! and issues one indexed draw. An outline owner is followed by a second
//! draw of the same geometry with the outline program, scaled about the
//! model origin and stencil-masked to the area outside the owner's
//! silhouette; the stencil buffer is cleared afterwards. Component storage is
//! never modified.

use std::any::Any;

use crate::core::config::RendererConfig;
use crate::ecs::components::TextureKind;
use crate::ecs::{Entity, Renderable, Scene, System, SystemError};
use crate::foundation::logging::{debug, info, trace, warn};
use crate::foundation::math::{Mat4, Mat4Ext};
use crate::input::CursorPosition;
use crate::render::backend::{BufferHandle, ClearFlags, ProgramHandle, RenderBackend, TextureHandle};
use crate::render::draw_state::{DrawPass, DrawRole, DrawState};
use crate::render::primitives::Projection;
use crate::render::transparency::TransparencyQueue;
use crate::render::uniforms::{
    ShaderParams, UniformFormat, ENVIRONMENT_SAMPLER_UNIFORM, ENVIRONMENT_TEXTURE_UNIT, MATERIAL_TEXTURE_UNIT,
    SAMPLER_UNIFORM, SHADER_PARAMS_BINDING_POINT, SHADER_PARAMS_BLOCK_NAME, UNIFORMS_BINDING_POINT,
    UNIFORMS_BLOCK_NAME,
};
use crate::render::{RenderError, RenderResult};

use super::picking_system::{cursor_ray, PickReport, Picker};

/// The render pipeline as a frame-sequenced system
pub struct RenderSystem {
    backend: Box<dyn RenderBackend>,
    config: RendererConfig,
    projection: Projection,
    picker: Picker,
    outline_shader: ProgramHandle,
    uniforms_buffer: BufferHandle,
    shader_params_buffer: BufferHandle,
    camera: Option<Entity>,
    environment_map: Option<TextureHandle>,
    transparency: TransparencyQueue,
}

impl RenderSystem {
    /// Create the pipeline on `backend`
    ///
    /// Allocates both uniform buffers, enables seamless cube-map filtering
    /// and sets the clear colour. `outline_shader` is the program used for
    /// every outline copy.
    pub fn new(
        mut backend: Box<dyn RenderBackend>,
        config: RendererConfig,
        outline_shader: ProgramHandle,
    ) -> RenderResult<Self> {
        config.validate()?;

        let uniforms_buffer = backend.create_uniform_buffer(std::mem::size_of::<UniformFormat>())?;
        let shader_params_buffer = backend.create_uniform_buffer(std::mem::size_of::<ShaderParams>())?;
        backend.enable_seamless_cube_maps();
        backend.set_clear_color(config.clear_color);

        let (width, height) = backend.framebuffer_size();
        info!("Render system created for a {}x{} framebuffer", width, height);

        Ok(Self {
            backend,
            projection: Projection::from_config(&config.projection),
            picker: Picker::from_config(&config.picking),
            config,
            outline_shader,
            uniforms_buffer,
            shader_params_buffer,
            camera: None,
            environment_map: None,
            transparency: TransparencyQueue::new(),
        })
    }

    /// Make `entity` the active camera
    ///
    /// Its transform is read as the camera's world transform every time a
    /// frame starts, a draw is issued or a pick is made.
    pub fn set_camera(&mut self, scene: &Scene, entity: Entity) -> RenderResult<()> {
        if scene.transform(entity).is_none() {
            return Err(RenderError::InvalidCamera(entity));
        }
        self.camera = Some(entity);
        debug!("Active camera is now {}", entity);
        Ok(())
    }

    /// Active camera, if any
    pub const fn camera(&self) -> Option<Entity> {
        self.camera
    }

    /// Use the cube map of `entity`'s material as the environment map
    pub fn set_environment_map(&mut self, scene: &Scene, entity: Entity) -> RenderResult<()> {
        let material = scene.material(entity).ok_or_else(|| RenderError::EnvironmentMapInvalid {
            entity,
            reason: "no material".to_string(),
        })?;
        if material.texture_kind != TextureKind::CubeMap {
            return Err(RenderError::EnvironmentMapInvalid {
                entity,
                reason: "material texture is not a cube map".to_string(),
            });
        }
        self.environment_map = Some(material.texture);
        debug!("Environment map is now {:?} from {}", material.texture, entity);
        Ok(())
    }

    /// Stop binding an environment map
    pub fn clear_environment_map(&mut self) {
        self.environment_map = None;
    }

    /// Bound environment cube map, if any
    pub const fn environment_map(&self) -> Option<TextureHandle> {
        self.environment_map
    }

    /// Active configuration
    pub const fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Entities waiting for the transparency flush
    pub fn deferred_count(&self) -> usize {
        self.transparency.len()
    }

    /// The backend draws are issued to
    pub fn backend(&self) -> &dyn RenderBackend {
        self.backend.as_ref()
    }

    /// Mutable access to the backend, e.g. for resource creation
    pub fn backend_mut(&mut self) -> &mut dyn RenderBackend {
        self.backend.as_mut()
    }

    /// The backend as its concrete type
    pub fn backend_as<T: RenderBackend + 'static>(&self) -> Option<&T> {
        self.backend.as_any().downcast_ref::<T>()
    }

    /// The backend as its concrete type, mutably
    pub fn backend_as_mut<T: RenderBackend + 'static>(&mut self) -> Option<&mut T> {
        self.backend.as_any_mut().downcast_mut::<T>()
    }

    /// Start a frame
    pub fn begin_frame(&mut self, scene: &Scene) -> RenderResult<()> {
        let camera_position = self.camera_transform(scene)?.translation_part();
        self.backend.clear(ClearFlags::all());
        self.transparency.reset(camera_position);
        trace!("Frame started, camera at {:?}", camera_position);
        Ok(())
    }

    /// Draw or defer `entity`
    ///
    /// Entities without both mesh and material are skipped without touching
    /// the backend.
    pub fn update(&mut self, scene: &Scene, entity: Entity) -> RenderResult<()> {
        let Some(renderable) = self.renderable(scene, entity)? else {
            return Ok(());
        };

        if renderable.material.is_transparent {
            self.transparency.push(entity, renderable.model.translation_part());
            trace!("Deferred transparent {}", entity);
            return Ok(());
        }

        self.draw(scene, entity, renderable, renderable.model, DrawPass::immediate())
    }

    /// Flush deferred transparency back to front and present
    ///
    /// A deferred entity whose components became inconsistent since it was
    /// queued is logged and skipped; the queue is always empty afterwards.
    pub fn end_frame(&mut self, scene: &Scene) -> RenderResult<()> {
        let deferred = self.transparency.drain_back_to_front();
        debug!("Flushing {} transparent entities", deferred.len());

        for entity in deferred {
            match self.renderable(scene, entity) {
                Ok(Some(renderable)) => {
                    self.draw(scene, entity, renderable, renderable.model, DrawPass::deferred())?;
                }
                Ok(None) => {}
                Err(error) if error.is_per_entity() => warn!("Skipped deferred draw: {}", error),
                Err(error) => return Err(error),
            }
        }

        self.backend.present()?;
        Ok(())
    }

    /// Entity under `cursor`, if any
    pub fn mouse_pick(&self, scene: &Scene, cursor: CursorPosition) -> RenderResult<Option<Entity>> {
        Ok(self.pick_detailed(scene, cursor)?.entity())
    }

    /// Pick with the full hit record and skipped-geometry diagnostics
    pub fn pick_detailed(&self, scene: &Scene, cursor: CursorPosition) -> RenderResult<PickReport> {
        let camera = self.camera_transform(scene)?;
        let ray = cursor_ray(&camera, &self.projection, cursor, self.backend.framebuffer_size())?;
        let report = self.picker.cast(scene, &ray);

        for diagnostic in &report.diagnostics {
            warn!("Picking skipped geometry: {:?}", diagnostic);
        }
        if let Some(hit) = report.hit {
            debug!("Picked {} at distance {}", hit.entity, hit.distance);
        }
        Ok(report)
    }

    fn camera_transform(&self, scene: &Scene) -> RenderResult<Mat4> {
        let camera = self.camera.ok_or(RenderError::CameraNotSet)?;
        scene.transform(camera).copied().ok_or(RenderError::InvalidCamera(camera))
    }

    fn renderable<'a>(&self, scene: &'a Scene, entity: Entity) -> RenderResult<Option<Renderable<'a>>> {
        scene.renderable(entity).map_err(|source| RenderError::MalformedEntity { entity, source })
    }

    fn draw(
        &mut self,
        scene: &Scene,
        entity: Entity,
        renderable: Renderable<'_>,
        model: Mat4,
        pass: DrawPass,
    ) -> RenderResult<()> {
        let material = renderable.material;
        let state = DrawState::resolve(material, pass, self.config.outline.stencil_reference);
        self.backend.apply_depth_state(&state.depth);
        self.backend.apply_stencil_state(&state.stencil);
        self.backend.apply_blend_state(&state.blend);

        let program = match pass.role {
            DrawRole::Primary => material.shader,
            DrawRole::Outline => self.outline_shader,
        };
        self.backend.use_program(program);

        self.backend.set_sampler(program, SAMPLER_UNIFORM, MATERIAL_TEXTURE_UNIT);
        self.backend.bind_texture(MATERIAL_TEXTURE_UNIT, material.texture_kind, material.texture);
        if let Some(environment_map) = self.environment_map {
            self.backend.set_sampler(program, ENVIRONMENT_SAMPLER_UNIFORM, ENVIRONMENT_TEXTURE_UNIT);
            self.backend.bind_texture(ENVIRONMENT_TEXTURE_UNIT, TextureKind::CubeMap, environment_map);
        }

        self.backend.bind_uniform_block(
            program,
            SHADER_PARAMS_BLOCK_NAME,
            SHADER_PARAMS_BINDING_POINT,
            self.shader_params_buffer,
        );
        self.backend.update_uniform_buffer(self.shader_params_buffer, bytemuck::bytes_of(&material.shader_params));

        let (width, height) = self.backend.framebuffer_size();
        let aspect = Projection::aspect_ratio(width, height)?;
        let camera = self.camera_transform(scene)?;
        let view = camera.try_inverse().ok_or(RenderError::SingularMatrix("camera"))?;
        let uniforms = UniformFormat::new(&model, &view, &self.projection.matrix(aspect), &camera.translation_part());
        self.backend.bind_uniform_block(program, UNIFORMS_BLOCK_NAME, UNIFORMS_BINDING_POINT, self.uniforms_buffer);
        self.backend.update_uniform_buffer(self.uniforms_buffer, bytemuck::bytes_of(&uniforms));

        self.backend.bind_vertex_array(renderable.mesh.vertex_array);
        self.backend.draw_indexed(renderable.mesh.index_count)?;
        trace!("Drew {} ({:?}, {} indices)", entity, pass.role, renderable.mesh.index_count);

        if pass.role == DrawRole::Primary && material.has_outline {
            let outline_model = model * Mat4::new_scaling(self.config.outline.scale);
            self.draw(scene, entity, renderable, outline_model, pass.outline_copy())?;
            self.backend.clear(ClearFlags::STENCIL);
        }

        Ok(())
    }
}

impl System for RenderSystem {
    fn begin_frame(&mut self, scene: &mut Scene) -> Result<(), SystemError> {
        Self::begin_frame(self, scene).map_err(SystemError::from)
    }

    fn update(&mut self, scene: &mut Scene, entity: Entity) -> Result<(), SystemError> {
        Self::update(self, scene, entity).map_err(SystemError::from)
    }

    fn end_frame(&mut self, scene: &mut Scene) -> Result<(), SystemError> {
        Self::end_frame(self, scene).map_err(SystemError::from)
    }

    fn name(&self) -> &'static str {
        "render"
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{MaterialComponent, MeshComponent, TransformFactory};
    use crate::render::backend::StencilState;
    use crate::render::primitives::MeshData;
    use crate::foundation::math::Vec3;
    use crate::render::recording::{BackendCall, RecordingBackend};
    use approx::assert_relative_eq;

    fn renderer_with_camera(scene: &mut Scene) -> RenderSystem {
        let camera = scene.create_entity();
        scene.set_transform(camera, Mat4::new_translation(&Vec3::new(0.0, 0.0, 6.0))).unwrap();
        let mut renderer =
            RenderSystem::new(Box::new(RecordingBackend::new(800, 800)), RendererConfig::default(), ProgramHandle(99))
                .unwrap();
        renderer.set_camera(scene, camera).unwrap();
        renderer
    }

    fn add_cube(renderer: &mut RenderSystem, scene: &mut Scene, material: MaterialComponent) -> Entity {
        let entity = scene.create_entity();
        scene.set_transform(entity, TransformFactory::at(Vec3::zeros())).unwrap();
        let mesh = MeshComponent::upload(renderer.backend_mut(), MeshData::cube()).unwrap();
        scene.set_mesh(entity, mesh).unwrap();
        scene.set_material(entity, material).unwrap();
        entity
    }

    fn recording(renderer: &RenderSystem) -> &RecordingBackend {
        renderer.backend_as::<RecordingBackend>().unwrap()
    }

    #[test]
    fn test_new_prepares_backend() {
        let mut scene = Scene::new();
        let renderer = renderer_with_camera(&mut scene);
        let calls = recording(&renderer).calls();
        assert_eq!(
            recording(&renderer).count_calls(|call| matches!(call, BackendCall::CreateUniformBuffer { .. })),
            2
        );
        assert!(calls.contains(&BackendCall::EnableSeamlessCubeMaps));
        assert!(calls.contains(&BackendCall::SetClearColor([0.2, 0.3, 0.3, 1.0])));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = RendererConfig::default();
        config.outline.scale = 0.0;
        let result = RenderSystem::new(Box::new(RecordingBackend::default()), config, ProgramHandle(1));
        assert!(matches!(result, Err(RenderError::InvalidConfig(_))));
    }

    #[test]
    fn test_camera_must_have_transform() {
        let mut scene = Scene::new();
        let mut renderer = renderer_with_camera(&mut scene);
        let bare = scene.create_entity();
        assert!(matches!(renderer.set_camera(&scene, bare), Err(RenderError::InvalidCamera(e)) if e == bare));
    }

    #[test]
    fn test_begin_frame_without_camera_fails() {
        let scene = Scene::new();
        let mut renderer =
            RenderSystem::new(Box::new(RecordingBackend::default()), RendererConfig::default(), ProgramHandle(1))
                .unwrap();
        assert!(matches!(renderer.begin_frame(&scene), Err(RenderError::CameraNotSet)));
        assert!(matches!(
            renderer.mouse_pick(&scene, CursorPosition::default()),
            Err(RenderError::CameraNotSet)
        ));
    }

    #[test]
    fn test_begin_frame_clears_everything() {
        let mut scene = Scene::new();
        let mut renderer = renderer_with_camera(&mut scene);
        renderer.begin_frame(&scene).unwrap();
        assert_eq!(recording(&renderer).calls().last(), Some(&BackendCall::Clear(ClearFlags::all())));
    }

    #[test]
    fn test_environment_map_requires_cube_map() {
        let mut scene = Scene::new();
        let mut renderer = renderer_with_camera(&mut scene);
        let flat = add_cube(&mut renderer, &mut scene, MaterialComponent::new(ProgramHandle(1), TextureHandle(5)));
        let sky = add_cube(
            &mut renderer,
            &mut scene,
            MaterialComponent::new(ProgramHandle(1), TextureHandle(6)).with_texture_kind(TextureKind::CubeMap),
        );

        assert!(matches!(
            renderer.set_environment_map(&scene, flat),
            Err(RenderError::EnvironmentMapInvalid { .. })
        ));
        renderer.set_environment_map(&scene, sky).unwrap();
        assert_eq!(renderer.environment_map(), Some(TextureHandle(6)));
    }

    #[test]
    fn test_draw_binds_material_and_environment() {
        let mut scene = Scene::new();
        let mut renderer = renderer_with_camera(&mut scene);
        let sky = add_cube(
            &mut renderer,
            &mut scene,
            MaterialComponent::new(ProgramHandle(3), TextureHandle(6)).with_texture_kind(TextureKind::CubeMap),
        );
        renderer.set_environment_map(&scene, sky).unwrap();

        renderer.begin_frame(&scene).unwrap();
        renderer.update(&scene, sky).unwrap();

        let calls = recording(&renderer).calls();
        assert!(calls.contains(&BackendCall::SetSampler { program: ProgramHandle(3), name: "sampler".to_string(), unit: 0 }));
        assert!(calls.contains(&BackendCall::SetSampler {
            program: ProgramHandle(3),
            name: "environmentSampler".to_string(),
            unit: 1
        }));
        assert!(calls.contains(&BackendCall::BindTexture { unit: 1, kind: TextureKind::CubeMap, texture: TextureHandle(6) }));
        assert_eq!(
            recording(&renderer).count_calls(|call| matches!(call, BackendCall::UpdateUniformBuffer { .. })),
            2
        );
    }

    #[test]
    fn test_draw_without_environment_map_skips_unit_one() {
        let mut scene = Scene::new();
        let mut renderer = renderer_with_camera(&mut scene);
        let sky = add_cube(
            &mut renderer,
            &mut scene,
            MaterialComponent::new(ProgramHandle(3), TextureHandle(6)).with_texture_kind(TextureKind::CubeMap),
        );
        let touches_environment = |call: &BackendCall| {
            matches!(call, BackendCall::BindTexture { unit: 1, .. })
                || matches!(call, BackendCall::SetSampler { name, .. } if name == "environmentSampler")
        };

        renderer.begin_frame(&scene).unwrap();
        renderer.update(&scene, sky).unwrap();
        let calls = recording(&renderer).calls();
        assert!(calls.contains(&BackendCall::BindTexture { unit: 0, kind: TextureKind::CubeMap, texture: TextureHandle(6) }));
        assert!(!calls.iter().any(touches_environment));

        renderer.set_environment_map(&scene, sky).unwrap();
        renderer.clear_environment_map();
        assert_eq!(renderer.environment_map(), None);
        let mark = recording(&renderer).calls().len();

        renderer.begin_frame(&scene).unwrap();
        renderer.update(&scene, sky).unwrap();
        let calls = &recording(&renderer).calls()[mark..];
        assert!(calls.iter().any(|call| matches!(call, BackendCall::DrawIndexed { .. })));
        assert!(!calls.iter().any(touches_environment));
    }

    #[test]
    fn test_draw_uploads_camera_uniforms() {
        let mut scene = Scene::new();
        let mut renderer = renderer_with_camera(&mut scene);
        let cube = add_cube(&mut renderer, &mut scene, MaterialComponent::new(ProgramHandle(1), TextureHandle(1)));
        scene.set_transform(cube, TransformFactory::at(Vec3::new(1.0, 2.0, 3.0))).unwrap();

        renderer.begin_frame(&scene).unwrap();
        renderer.update(&scene, cube).unwrap();

        let draws = recording(&renderer).draws();
        let uniforms = draws[0].uniforms.unwrap();
        assert_eq!(uniforms.model_matrix(), TransformFactory::at(Vec3::new(1.0, 2.0, 3.0)));
        assert_relative_eq!(Mat4::from(uniforms.view), Mat4::new_translation(&Vec3::new(0.0, 0.0, -6.0)));
        assert_eq!(uniforms.camera_pos, [0.0, 0.0, 6.0, 1.0]);
        assert_eq!(draws[0].index_count, 36);
        assert_eq!(draws[0].stencil, Some(StencilState::Disabled));
    }

    #[test]
    fn test_model_defaults_to_identity_without_transform() {
        let mut scene = Scene::new();
        let mut renderer = renderer_with_camera(&mut scene);
        let cube = add_cube(&mut renderer, &mut scene, MaterialComponent::new(ProgramHandle(1), TextureHandle(1)));
        scene.remove_components(cube, crate::ecs::ComponentMask::TRANSFORM).unwrap();

        renderer.begin_frame(&scene).unwrap();
        renderer.update(&scene, cube).unwrap();

        assert_eq!(recording(&renderer).draws()[0].uniforms.unwrap().model_matrix(), Mat4::identity());
    }

    #[test]
    fn test_zero_sized_framebuffer_fails_draw() {
        let mut scene = Scene::new();
        let mut renderer = renderer_with_camera(&mut scene);
        let cube = add_cube(&mut renderer, &mut scene, MaterialComponent::new(ProgramHandle(1), TextureHandle(1)));
        renderer.backend_as_mut::<RecordingBackend>().unwrap().set_framebuffer_size(0, 600);

        renderer.begin_frame(&scene).unwrap();
        assert!(matches!(renderer.update(&scene, cube), Err(RenderError::DegenerateViewport { .. })));
    }

    #[test]
    fn test_present_failure_is_reported_after_flush() {
        let mut scene = Scene::new();
        let mut renderer = renderer_with_camera(&mut scene);
        let glass = add_cube(
            &mut renderer,
            &mut scene,
            MaterialComponent::new(ProgramHandle(1), TextureHandle(1)).transparent(),
        );
        renderer.backend_as_mut::<RecordingBackend>().unwrap().set_fail_present(true);

        renderer.begin_frame(&scene).unwrap();
        renderer.update(&scene, glass).unwrap();
        assert!(matches!(renderer.end_frame(&scene), Err(RenderError::Backend(_))));
        assert_eq!(renderer.deferred_count(), 0);
        assert_eq!(recording(&renderer).draws().len(), 1);
    }
}
