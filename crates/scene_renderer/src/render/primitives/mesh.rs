//! Mesh representation for 3D models
//!
//! Vertex definition, the vertex layout contract shared with shader programs,
//! and a few primitive shapes used by scene setup and tests.
//!
//! ## Vertex Layout Contract
//!
//! Every program drawn by the pipeline reads vertices through fixed attribute
//! locations; there is no reflection step:
//!
//! | location | attribute   | components | byte offset |
//! |----------|-------------|------------|-------------|
//! | 0        | `position`  | 3 × f32    | 0           |
//! | 1        | `normal`    | 3 × f32    | 12          |
//! | 2        | `tex_coord` | 2 × f32    | 24          |
//!
//! Stride is 32 bytes. Backends must configure vertex arrays from
//! [`VertexLayout::ATTRIBUTES`].

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::Vec3;

/// Vertex data structure for 3D rendering with position, normal, and texture coordinates.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    /// Model-space position
    pub position: [f32; 3],
    /// Model-space normal
    pub normal: [f32; 3],
    /// Texture coordinate
    pub tex_coord: [f32; 2],
}

impl Vertex {
    /// Create a new vertex
    pub const fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self { position, normal, tex_coord }
    }

    /// Position as a vector
    pub fn position_vec(&self) -> Vec3 {
        Vec3::from(self.position)
    }
}

/// One vertex attribute binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader input location
    pub location: u32,
    /// Number of f32 components
    pub components: u32,
    /// Byte offset inside [`Vertex`]
    pub offset: usize,
}

/// Attribute layout of [`Vertex`]
pub struct VertexLayout;

impl VertexLayout {
    /// Position attribute location
    pub const POSITION_LOCATION: u32 = 0;
    /// Normal attribute location
    pub const NORMAL_LOCATION: u32 = 1;
    /// Texture coordinate attribute location
    pub const TEX_COORD_LOCATION: u32 = 2;

    /// Byte distance between consecutive vertices
    pub const STRIDE: usize = std::mem::size_of::<Vertex>();

    /// All attributes in location order
    pub const ATTRIBUTES: [VertexAttribute; 3] = [
        VertexAttribute { location: Self::POSITION_LOCATION, components: 3, offset: 0 },
        VertexAttribute { location: Self::NORMAL_LOCATION, components: 3, offset: 12 },
        VertexAttribute { location: Self::TEX_COORD_LOCATION, components: 2, offset: 24 },
    ];
}

/// CPU-side geometry before upload
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    /// Vertex list
    pub vertices: Vec<Vertex>,
    /// Triangle list indices into `vertices`
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Create mesh data from vertices and indices
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Axis-aligned unit cube centred at the origin, outward counter-clockwise faces
    pub fn cube() -> Self {
        let x = Vec3::x();
        let y = Vec3::y();
        let z = Vec3::z();
        // (normal, u, v) with u × v = normal
        let faces = [
            (z, x, y),
            (-z, -x, y),
            (x, -z, y),
            (-x, z, y),
            (y, x, -z),
            (-y, x, z),
        ];

        let mut mesh = Self::default();
        for (normal, u, v) in faces {
            mesh.push_face(normal * 0.5, normal, u * 0.5, v * 0.5);
        }
        mesh
    }

    /// Unit quad in the XY plane facing +Z
    pub fn quad() -> Self {
        let mut mesh = Self::default();
        mesh.push_face(Vec3::zeros(), Vec3::z(), Vec3::x() * 0.5, Vec3::y() * 0.5);
        mesh
    }

    /// Square-based pyramid with its base at y = -0.5 and apex at y = 0.5
    pub fn pyramid() -> Self {
        let apex = Vec3::new(0.0, 0.5, 0.0);
        let corners = [
            Vec3::new(-0.5, -0.5, 0.5),
            Vec3::new(0.5, -0.5, 0.5),
            Vec3::new(0.5, -0.5, -0.5),
            Vec3::new(-0.5, -0.5, -0.5),
        ];

        let mut mesh = Self::default();
        for i in 0..corners.len() {
            let a = corners[i];
            let b = corners[(i + 1) % corners.len()];
            let normal = (b - a).cross(&(apex - a)).normalize();
            let base = u32::try_from(mesh.vertices.len()).unwrap_or(u32::MAX);
            mesh.vertices.push(Vertex::new(a.into(), normal.into(), [0.0, 0.0]));
            mesh.vertices.push(Vertex::new(b.into(), normal.into(), [1.0, 0.0]));
            mesh.vertices.push(Vertex::new(apex.into(), normal.into(), [0.5, 1.0]));
            mesh.indices.extend_from_slice(&[base, base + 1, base + 2]);
        }
        mesh.push_face(Vec3::new(0.0, -0.5, 0.0), -Vec3::y(), Vec3::x() * 0.5, Vec3::z() * 0.5);
        mesh
    }

    /// UV sphere of radius 0.5 centred at the origin
    ///
    /// `segments` slices around Y and `rings` stacks from pole to pole; both
    /// are clamped to at least 3 and 2.
    pub fn sphere(segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut mesh = Self::default();

        for ring in 0..=rings {
            let v = ring as f32 / rings as f32;
            let phi = v * std::f32::consts::PI;
            for segment in 0..=segments {
                let u = segment as f32 / segments as f32;
                let theta = u * std::f32::consts::TAU;
                let normal = Vec3::new(phi.sin() * theta.cos(), phi.cos(), -phi.sin() * theta.sin());
                mesh.vertices.push(Vertex::new((normal * 0.5).into(), normal.into(), [u, 1.0 - v]));
            }
        }

        // Pole rings collapse to a point, so each pole quad is a single triangle
        let row = segments + 1;
        for ring in 0..rings {
            for segment in 0..segments {
                let a = ring * row + segment;
                let b = a + row;
                if ring != 0 {
                    mesh.indices.extend_from_slice(&[a, b, a + 1]);
                }
                if ring != rings - 1 {
                    mesh.indices.extend_from_slice(&[a + 1, b, b + 1]);
                }
            }
        }
        mesh
    }

    /// Closed cylinder along Y centred at the origin
    pub fn cylinder(radius: f32, height: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let half = height * 0.5;
        let mut mesh = Self::default();

        for segment in 0..=segments {
            let u = segment as f32 / segments as f32;
            let theta = u * std::f32::consts::TAU;
            let normal = Vec3::new(theta.cos(), 0.0, -theta.sin());
            let rim = normal * radius;
            mesh.vertices.push(Vertex::new((rim - Vec3::y() * half).into(), normal.into(), [u, 0.0]));
            mesh.vertices.push(Vertex::new((rim + Vec3::y() * half).into(), normal.into(), [u, 1.0]));
        }
        for segment in 0..segments {
            let a = segment * 2;
            mesh.indices.extend_from_slice(&[a, a + 2, a + 1, a + 1, a + 2, a + 3]);
        }

        for (y, normal) in [(half, Vec3::y()), (-half, -Vec3::y())] {
            let center = u32::try_from(mesh.vertices.len()).unwrap_or(u32::MAX);
            mesh.vertices.push(Vertex::new([0.0, y, 0.0], normal.into(), [0.5, 0.5]));
            for segment in 0..=segments {
                let theta = segment as f32 / segments as f32 * std::f32::consts::TAU;
                let (sin, cos) = theta.sin_cos();
                let position = Vec3::new(cos * radius, y, -sin * radius);
                mesh.vertices.push(Vertex::new(position.into(), normal.into(), [0.5 + cos * 0.5, 0.5 + sin * 0.5]));
            }
            for segment in 0..segments {
                let a = center + 1 + segment;
                if normal.y > 0.0 {
                    mesh.indices.extend_from_slice(&[center, a, a + 1]);
                } else {
                    mesh.indices.extend_from_slice(&[center, a + 1, a]);
                }
            }
        }
        mesh
    }

    /// Number of whole triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Append a quad centred at `center` spanning `±u` and `±v`, wound so
    /// that `u × v` points along `normal`
    fn push_face(&mut self, center: Vec3, normal: Vec3, u: Vec3, v: Vec3) {
        let base = u32::try_from(self.vertices.len()).unwrap_or(u32::MAX);
        let corners = [
            (center - u - v, [0.0, 0.0]),
            (center + u - v, [1.0, 0.0]),
            (center + u + v, [1.0, 1.0]),
            (center - u + v, [0.0, 1.0]),
        ];
        for (position, tex_coord) in corners {
            self.vertices.push(Vertex::new(position.into(), normal.into(), tex_coord));
        }
        self.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}
