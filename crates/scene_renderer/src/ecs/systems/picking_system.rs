//! Ray picking against scene geometry
//!
//! Orchestrates the picking pipeline: cursor → camera ray → per-triangle
//! Möller–Trumbore tests over every renderable entity.
//!
//! The cursor ray is reconstructed with the same [`Projection`] the render
//! pipeline draws with: NDC at the far plane (`w = 1`) is taken through the
//! inverse projection, its `w` is zeroed so the result is a direction, and the
//! camera's world transform carries it into world space. The ray starts at
//! the camera's translation.
//!
//! Picking only reads the scene. Triangles that cannot be tested (zero area,
//! indices past the vertex list, a trailing partial triangle) are skipped and
//! reported in the [`PickReport`] instead of failing the pick.

use crate::core::config::PickingConfig;
use crate::ecs::{Entity, Scene, SceneError};
use crate::foundation::math::{Mat4, Mat4Ext, Point3, Vec3, Vec4};
use crate::input::CursorPosition;
use crate::physics::{Ray, Triangle, TriangleTest};
use crate::render::primitives::Projection;
use crate::render::{RenderError, RenderResult};

pub use crate::core::config::PickMode;

/// The triangle a pick ray selected
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    /// Entity owning the triangle
    pub entity: Entity,
    /// Triangle index within the entity's index list
    pub triangle: usize,
    /// Distance from the ray origin
    pub distance: f32,
    /// Barycentric weight of the triangle's second vertex
    pub u: f32,
    /// Barycentric weight of the triangle's third vertex
    pub v: f32,
    /// World-space intersection point
    pub point: Vec3,
}

/// Why part of an entity was left out of a pick
#[derive(Debug, Clone, PartialEq)]
pub enum PickDiagnostic {
    /// The triangle has no area
    DegenerateTriangle {
        /// Owning entity
        entity: Entity,
        /// Triangle index
        triangle: usize,
    },
    /// A triangle index points past the vertex list
    IndexOutOfRange {
        /// Owning entity
        entity: Entity,
        /// Triangle index
        triangle: usize,
        /// Offending vertex index
        index: u32,
    },
    /// The index count is not a multiple of three; the tail was ignored
    IncompleteTriangle {
        /// Owning entity
        entity: Entity,
        /// Number of indices drawn
        index_count: usize,
    },
    /// The entity's components are inconsistent; it was not tested
    MalformedEntity(SceneError),
}

/// Outcome of one pick with everything that was skipped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickReport {
    /// Selected triangle, if any
    pub hit: Option<PickHit>,
    /// Triangles actually tested
    pub triangles_tested: usize,
    /// Geometry left out of the test
    pub diagnostics: Vec<PickDiagnostic>,
}

impl PickReport {
    /// Entity that was hit
    pub fn entity(&self) -> Option<Entity> {
        self.hit.map(|hit| hit.entity)
    }
}

/// Reconstruct the world-space ray under `cursor`
///
/// `camera` is the camera's world transform, `framebuffer` the current
/// framebuffer size in pixels.
pub fn cursor_ray(
    camera: &Mat4,
    projection: &Projection,
    cursor: CursorPosition,
    framebuffer: (u32, u32),
) -> RenderResult<Ray> {
    let (width, height) = framebuffer;
    let aspect = Projection::aspect_ratio(width, height)?;
    let ndc = cursor.to_ndc(width, height)?;

    let clip = Vec4::new(ndc.x, ndc.y, 1.0, 1.0);
    let mut view = projection.inverse_matrix(aspect) * clip;
    view.w = 0.0;
    let world = camera * view;

    Ray::new(camera.translation_part(), world.xyz()).ok_or(RenderError::SingularMatrix("camera"))
}

/// Ray/triangle scan over a scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Picker {
    /// Hit selection policy
    pub mode: PickMode,
    /// Determinant and minimum distance threshold
    pub epsilon: f32,
}

impl Picker {
    /// Build from configuration
    pub const fn from_config(config: &PickingConfig) -> Self {
        Self { mode: config.mode, epsilon: config.epsilon }
    }

    /// Test `ray` against every renderable entity in id order
    pub fn cast(&self, scene: &Scene, ray: &Ray) -> PickReport {
        let mut report = PickReport::default();

        for entity in scene.entities() {
            let renderable = match scene.renderable(entity) {
                Ok(Some(renderable)) => renderable,
                Ok(None) => continue,
                Err(error) => {
                    report.diagnostics.push(PickDiagnostic::MalformedEntity(error));
                    continue;
                }
            };

            let mesh = renderable.mesh;
            let indices = &mesh.indices[..mesh.index_count as usize];
            if indices.len() % 3 != 0 {
                report.diagnostics.push(PickDiagnostic::IncompleteTriangle { entity, index_count: indices.len() });
            }

            for (triangle, corners) in indices.chunks_exact(3).enumerate() {
                let mut world = [Vec3::zeros(); 3];
                let mut in_range = true;
                for (slot, &index) in world.iter_mut().zip(corners) {
                    match mesh.vertices.get(index as usize) {
                        Some(vertex) => {
                            *slot = renderable.model.transform_point(&Point3::from(vertex.position)).coords;
                        }
                        None => {
                            report.diagnostics.push(PickDiagnostic::IndexOutOfRange { entity, triangle, index });
                            in_range = false;
                            break;
                        }
                    }
                }
                if !in_range {
                    continue;
                }

                report.triangles_tested += 1;
                match Triangle::new(world[0], world[1], world[2]).intersect_ray(ray, self.epsilon) {
                    TriangleTest::Hit(hit) => {
                        if report.hit.map_or(true, |best| hit.t < best.distance) {
                            report.hit = Some(PickHit {
                                entity,
                                triangle,
                                distance: hit.t,
                                u: hit.u,
                                v: hit.v,
                                point: ray.point_at(hit.t),
                            });
                        }
                        if self.mode == PickMode::FirstHit {
                            return report;
                        }
                    }
                    TriangleTest::Degenerate => {
                        report.diagnostics.push(PickDiagnostic::DegenerateTriangle { entity, triangle });
                    }
                    TriangleTest::Miss | TriangleTest::Parallel => {}
                }
            }
        }

        report
    }
}

impl Default for Picker {
    fn default() -> Self {
        Self::from_config(&PickingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{MaterialComponent, MeshComponent};
    use crate::ecs::ComponentMask;
    use crate::render::backend::{ProgramHandle, TextureHandle};
    use crate::render::primitives::{MeshData, Vertex};
    use crate::render::recording::RecordingBackend;
    use approx::assert_relative_eq;

    fn add_mesh(scene: &mut Scene, backend: &mut RecordingBackend, data: MeshData, model: Mat4) -> Entity {
        let entity = scene.create_entity();
        scene.set_transform(entity, model).unwrap();
        scene.set_mesh(entity, MeshComponent::upload(backend, data).unwrap()).unwrap();
        scene.set_material(entity, MaterialComponent::new(ProgramHandle(1), TextureHandle(1))).unwrap();
        entity
    }

    fn facing_triangle() -> MeshData {
        let n = [0.0, 0.0, 1.0];
        MeshData::new(
            vec![
                Vertex::new([-1.0, -1.0, 0.0], n, [0.0, 0.0]),
                Vertex::new([1.0, -1.0, 0.0], n, [1.0, 0.0]),
                Vertex::new([0.0, 1.0, 0.0], n, [0.5, 1.0]),
            ],
            vec![0, 1, 2],
        )
    }

    fn down_z() -> Ray {
        Ray::new(Vec3::new(0.0, 0.0, 6.0), -Vec3::z()).unwrap()
    }

    #[test]
    fn test_center_cursor_ray_is_camera_forward() {
        let camera = Mat4::new_translation(&Vec3::new(0.0, 0.0, 6.0));
        let ray = cursor_ray(&camera, &Projection::default(), CursorPosition::center_of(800, 600), (800, 600)).unwrap();
        assert_eq!(ray.origin, Vec3::new(0.0, 0.0, 6.0));
        assert_relative_eq!(ray.direction, -Vec3::z());
    }

    #[test]
    fn test_cursor_ray_follows_camera_rotation() {
        let camera = Mat4::camera_looking_at(Vec3::new(6.0, 0.0, 0.0), Vec3::zeros(), Vec3::y());
        let ray = cursor_ray(&camera, &Projection::default(), CursorPosition::center_of(640, 480), (640, 480)).unwrap();
        assert_relative_eq!(ray.origin, Vec3::new(6.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(ray.direction, -Vec3::x(), epsilon = 1e-5);
    }

    #[test]
    fn test_cursor_ray_rejects_empty_window() {
        let result = cursor_ray(&Mat4::identity(), &Projection::default(), CursorPosition::default(), (0, 0));
        assert!(matches!(result, Err(RenderError::DegenerateViewport { .. })));
    }

    #[test]
    fn test_nearest_and_first_hit_disagree_on_overlap() {
        let mut backend = RecordingBackend::default();
        let mut scene = Scene::new();
        let far = add_mesh(&mut scene, &mut backend, facing_triangle(), Mat4::new_translation(&Vec3::new(0.0, 0.0, -2.0)));
        let near = add_mesh(&mut scene, &mut backend, facing_triangle(), Mat4::new_translation(&Vec3::new(0.0, 0.0, 1.0)));

        let nearest = Picker { mode: PickMode::Nearest, epsilon: 1e-7 }.cast(&scene, &down_z());
        let first = Picker { mode: PickMode::FirstHit, epsilon: 1e-7 }.cast(&scene, &down_z());

        assert_eq!(nearest.entity(), Some(near));
        assert_relative_eq!(nearest.hit.unwrap().distance, 5.0, epsilon = 1e-5);
        assert_eq!(first.entity(), Some(far));
        assert_eq!(first.triangles_tested, 1);
    }

    #[test]
    fn test_hit_point_lies_on_triangle() {
        let mut backend = RecordingBackend::default();
        let mut scene = Scene::new();
        add_mesh(&mut scene, &mut backend, facing_triangle(), Mat4::identity());

        let hit = Picker::default().cast(&scene, &down_z()).hit.unwrap();
        assert_relative_eq!(hit.point, Vec3::zeros(), epsilon = 1e-5);
        assert!(hit.u >= 0.0 && hit.v >= 0.0 && hit.u + hit.v <= 1.0);
    }

    #[test]
    fn test_non_renderable_entities_are_ignored() {
        let mut backend = RecordingBackend::default();
        let mut scene = Scene::new();
        let entity = add_mesh(&mut scene, &mut backend, facing_triangle(), Mat4::identity());
        scene.remove_components(entity, ComponentMask::MATERIAL).unwrap();

        let report = Picker::default().cast(&scene, &down_z());
        assert_eq!(report.hit, None);
        assert_eq!(report.triangles_tested, 0);
    }

    #[test]
    fn test_degenerate_triangle_is_skipped_and_reported() {
        let mut backend = RecordingBackend::default();
        let mut scene = Scene::new();
        let n = [0.0, 0.0, 1.0];
        let sliver = MeshData::new(
            vec![
                Vertex::new([-1.0, 0.0, 0.0], n, [0.0, 0.0]),
                Vertex::new([0.0, 0.0, 0.0], n, [0.0, 0.0]),
                Vertex::new([1.0, 0.0, 0.0], n, [0.0, 0.0]),
            ],
            vec![0, 1, 2],
        );
        let entity = add_mesh(&mut scene, &mut backend, sliver, Mat4::identity());
        let behind = add_mesh(&mut scene, &mut backend, facing_triangle(), Mat4::new_translation(&Vec3::new(0.0, 0.0, -1.0)));

        let report = Picker::default().cast(&scene, &down_z());
        assert_eq!(report.entity(), Some(behind));
        assert_eq!(report.diagnostics, vec![PickDiagnostic::DegenerateTriangle { entity, triangle: 0 }]);
    }

    #[test]
    fn test_bad_indices_are_reported() {
        let mut backend = RecordingBackend::default();
        let mut scene = Scene::new();
        let mut data = facing_triangle();
        data.indices = vec![0, 1, 7, 0, 1, 2, 0];
        let entity = add_mesh(&mut scene, &mut backend, data, Mat4::identity());

        let report = Picker::default().cast(&scene, &down_z());
        assert_eq!(report.entity(), Some(entity));
        assert_eq!(report.hit.unwrap().triangle, 1);
        assert!(report.diagnostics.contains(&PickDiagnostic::IncompleteTriangle { entity, index_count: 7 }));
        assert!(report.diagnostics.contains(&PickDiagnostic::IndexOutOfRange { entity, triangle: 0, index: 7 }));
    }
}
