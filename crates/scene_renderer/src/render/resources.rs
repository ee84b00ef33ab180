//! # Resource Registry
//!
//! Memoised shader programs and textures for one graphics context. A program
//! is compiled once per (vertex path, fragment path) pair and a texture is
//! decoded and uploaded once per path; later requests return the cached
//! handle.
//!
//! The registry is an ordinary value owned by whoever owns the context, so
//! independent contexts (and tests) never share cached handles.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use thiserror::Error;

use crate::core::config::{ShaderConfig, ShaderSetConfig};
use crate::foundation::logging::{debug, info};
use crate::render::backend::{
    BackendError, PixelFormat, ProgramHandle, RenderBackend, ShaderSource, TextureHandle, TextureImage,
};

/// Resource loading errors
#[derive(Error, Debug)]
pub enum ResourceError {
    /// A source or image file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// An image file could not be decoded
    #[error("Failed to decode {}: {source}", path.display())]
    Decode {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: image::ImageError,
    },

    /// The backend rejected the upload or compilation
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// A cube map needs exactly six faces
    #[error("Cube map needs 6 faces, got {0}")]
    FaceCount(usize),

    /// Cube map faces must be square and share one size
    #[error("Cube map face {} is {width}x{height}, expected {expected}x{expected}", path.display())]
    FaceSize {
        /// Offending face
        path: PathBuf,
        /// Face width
        width: u32,
        /// Face height
        height: u32,
        /// Size of the first face
        expected: u32,
    },
}

/// Programs the renderer and scene setup select from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    /// Lit, textured, environment-reflective
    Default,
    /// Flat colour for outline copies
    Outline,
    /// Animated reflective water
    Water,
    /// Alpha-threshold cut-out
    Threshold,
    /// Cube-map skybox
    Skybox,
}

impl ShaderKind {
    /// Every kind, in declaration order
    pub const ALL: [Self; 5] = [Self::Default, Self::Outline, Self::Water, Self::Threshold, Self::Skybox];

    /// Source paths of this kind in `shaders`
    pub const fn config(self, shaders: &ShaderSetConfig) -> &ShaderConfig {
        match self {
            Self::Default => &shaders.default,
            Self::Outline => &shaders.outline,
            Self::Water => &shaders.water,
            Self::Threshold => &shaders.threshold,
            Self::Skybox => &shaders.skybox,
        }
    }
}

/// Compiled programs keyed by source paths
#[derive(Debug, Default)]
pub struct ShaderLibrary {
    programs: HashMap<(PathBuf, PathBuf), ProgramHandle>,
}

impl ShaderLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Program for the given source files, compiling on first use
    pub fn load(
        &mut self,
        backend: &mut dyn RenderBackend,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<ProgramHandle, ResourceError> {
        let key = (vertex_path.as_ref().to_path_buf(), fragment_path.as_ref().to_path_buf());
        if let Some(program) = self.programs.get(&key) {
            return Ok(*program);
        }

        let source = ShaderSource::new(read_source(&key.0)?, read_source(&key.1)?);
        let program = backend.create_program(&source)?;
        info!("Compiled shader program {:?} from {:?} + {:?}", program, key.0, key.1);
        self.programs.insert(key, program);
        Ok(program)
    }

    /// Number of distinct programs compiled
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    /// Whether nothing has been compiled
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

/// Uploaded textures keyed by file path
#[derive(Debug, Default)]
pub struct TextureCache {
    textures: HashMap<PathBuf, TextureHandle>,
    cube_maps: HashMap<[PathBuf; 6], TextureHandle>,
}

impl TextureCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// 2D texture for `path`, decoding and uploading on first use
    ///
    /// One to four channel images keep their channel count (R, RG, RGB,
    /// RGBA); anything else is converted to RGBA.
    pub fn load_texture(
        &mut self,
        backend: &mut dyn RenderBackend,
        path: impl AsRef<Path>,
    ) -> Result<TextureHandle, ResourceError> {
        let path = path.as_ref();
        if let Some(texture) = self.textures.get(path) {
            return Ok(*texture);
        }

        let image = texture_image(decode(path)?);
        let texture = backend.create_texture_2d(&image)?;
        debug!("Loaded texture {:?} ({}x{} {:?})", path, image.width, image.height, image.format);
        self.textures.insert(path.to_path_buf(), texture);
        Ok(texture)
    }

    /// Cube map from six face images, ordered +X, -X, +Y, -Y, +Z, -Z
    ///
    /// Faces are uploaded as RGB.
    pub fn load_cube_map<P: AsRef<Path>>(
        &mut self,
        backend: &mut dyn RenderBackend,
        faces: &[P],
    ) -> Result<TextureHandle, ResourceError> {
        let paths: [PathBuf; 6] = faces
            .iter()
            .map(|face| face.as_ref().to_path_buf())
            .collect::<Vec<_>>()
            .try_into()
            .map_err(|_| ResourceError::FaceCount(faces.len()))?;
        if let Some(texture) = self.cube_maps.get(&paths) {
            return Ok(*texture);
        }

        let mut images = Vec::with_capacity(6);
        for path in &paths {
            let rgb = decode(path)?.into_rgb8();
            let (width, height) = rgb.dimensions();
            let expected = images.first().map_or(width, |first: &TextureImage| first.width);
            if width != height || width != expected {
                return Err(ResourceError::FaceSize { path: path.clone(), width, height, expected });
            }
            images.push(TextureImage { width, height, format: PixelFormat::Rgb8, pixels: rgb.into_raw() });
        }
        let faces: [TextureImage; 6] = images
            .try_into()
            .map_err(|images: Vec<TextureImage>| ResourceError::FaceCount(images.len()))?;

        let texture = backend.create_cube_map(&faces)?;
        info!("Loaded cube map {:?} from {:?}", texture, paths[0].parent().unwrap_or(paths[0].as_path()));
        self.cube_maps.insert(paths, texture);
        Ok(texture)
    }

    /// Number of distinct textures and cube maps uploaded
    pub fn len(&self) -> usize {
        self.textures.len() + self.cube_maps.len()
    }

    /// Whether nothing has been uploaded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shader and texture caches for one context
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    shader_paths: ShaderSetConfig,
    shaders: ShaderLibrary,
    textures: TextureCache,
}

impl ResourceRegistry {
    /// Create a registry resolving [`ShaderKind`]s through `shader_paths`
    pub fn new(shader_paths: ShaderSetConfig) -> Self {
        Self {
            shader_paths,
            shaders: ShaderLibrary::new(),
            textures: TextureCache::new(),
        }
    }

    /// Program of a known kind
    pub fn shader(&mut self, backend: &mut dyn RenderBackend, kind: ShaderKind) -> Result<ProgramHandle, ResourceError> {
        let config = kind.config(&self.shader_paths);
        self.shaders.load(backend, &config.vertex_shader_path, &config.fragment_shader_path)
    }

    /// Program from explicit source paths
    pub fn shader_from_paths(
        &mut self,
        backend: &mut dyn RenderBackend,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<ProgramHandle, ResourceError> {
        self.shaders.load(backend, vertex_path, fragment_path)
    }

    /// 2D texture by path
    pub fn texture(&mut self, backend: &mut dyn RenderBackend, path: impl AsRef<Path>) -> Result<TextureHandle, ResourceError> {
        self.textures.load_texture(backend, path)
    }

    /// Cube map by face paths
    pub fn cube_map<P: AsRef<Path>>(
        &mut self,
        backend: &mut dyn RenderBackend,
        faces: &[P],
    ) -> Result<TextureHandle, ResourceError> {
        self.textures.load_cube_map(backend, faces)
    }

    /// Compiled program cache
    pub const fn shaders(&self) -> &ShaderLibrary {
        &self.shaders
    }

    /// Texture cache
    pub const fn textures(&self) -> &TextureCache {
        &self.textures
    }
}

fn read_source(path: &Path) -> Result<String, ResourceError> {
    std::fs::read_to_string(path).map_err(|source| ResourceError::Io { path: path.to_path_buf(), source })
}

fn decode(path: &Path) -> Result<DynamicImage, ResourceError> {
    image::open(path).map_err(|source| match source {
        image::ImageError::IoError(source) => ResourceError::Io { path: path.to_path_buf(), source },
        source => ResourceError::Decode { path: path.to_path_buf(), source },
    })
}

fn texture_image(image: DynamicImage) -> TextureImage {
    let (width, height) = (image.width(), image.height());
    let (format, pixels) = match image {
        DynamicImage::ImageLuma8(buffer) => (PixelFormat::R8, buffer.into_raw()),
        DynamicImage::ImageLumaA8(buffer) => (PixelFormat::Rg8, buffer.into_raw()),
        DynamicImage::ImageRgb8(buffer) => (PixelFormat::Rgb8, buffer.into_raw()),
        DynamicImage::ImageRgba8(buffer) => (PixelFormat::Rgba8, buffer.into_raw()),
        other => (PixelFormat::Rgba8, other.into_rgba8().into_raw()),
    };
    TextureImage { width, height, format, pixels }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::TextureKind;
    use crate::render::recording::{BackendCall, RecordingBackend};
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("scene_renderer_{}_{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn created_textures(backend: &RecordingBackend) -> usize {
        backend.count_calls(|call| matches!(call, BackendCall::CreateTexture { .. }))
    }

    #[test]
    fn test_texture_is_uploaded_once() {
        let dir = temp_dir("texture_once");
        let path = dir.join("crate.png");
        RgbaImage::from_pixel(4, 2, Rgba([10, 20, 30, 40])).save(&path).unwrap();

        let mut backend = RecordingBackend::default();
        let mut cache = TextureCache::new();
        let first = cache.load_texture(&mut backend, &path).unwrap();
        let second = cache.load_texture(&mut backend, &path).unwrap();

        assert_eq!(first, second);
        assert_eq!(created_textures(&backend), 1);
        let image = &backend.texture_images(first).unwrap()[0];
        assert_eq!((image.width, image.height, image.format), (4, 2, PixelFormat::Rgba8));
        assert_eq!(&image.pixels[..4], &[10, 20, 30, 40]);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_channel_count_selects_format() {
        let dir = temp_dir("texture_format");
        let gray = dir.join("gray.png");
        let rgb = dir.join("rgb.png");
        GrayImage::from_pixel(2, 2, Luma([7])).save(&gray).unwrap();
        RgbImage::from_pixel(2, 2, Rgb([1, 2, 3])).save(&rgb).unwrap();

        let mut backend = RecordingBackend::default();
        let mut cache = TextureCache::new();
        let gray = cache.load_texture(&mut backend, &gray).unwrap();
        let rgb = cache.load_texture(&mut backend, &rgb).unwrap();

        assert_eq!(backend.texture_images(gray).unwrap()[0].format, PixelFormat::R8);
        assert_eq!(backend.texture_images(rgb).unwrap()[0].format, PixelFormat::Rgb8);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_cube_map_faces_in_order() {
        let dir = temp_dir("cube_map");
        let paths: Vec<PathBuf> = (0..6u8)
            .map(|i| {
                let path = dir.join(format!("face{i}.png"));
                RgbaImage::from_pixel(2, 2, Rgba([i, 0, 0, 255])).save(&path).unwrap();
                path
            })
            .collect();

        let mut backend = RecordingBackend::default();
        let mut cache = TextureCache::new();
        let cube = cache.load_cube_map(&mut backend, &paths).unwrap();
        assert_eq!(cache.load_cube_map(&mut backend, &paths).unwrap(), cube);

        let faces = backend.texture_images(cube).unwrap();
        assert_eq!(faces.len(), 6);
        for (i, face) in faces.iter().enumerate() {
            assert_eq!(face.format, PixelFormat::Rgb8);
            assert_eq!(face.pixels[0], u8::try_from(i).unwrap());
        }
        assert!(backend.calls().contains(&BackendCall::CreateTexture { texture: cube, kind: TextureKind::CubeMap }));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_cube_map_rejects_wrong_face_count() {
        let mut backend = RecordingBackend::default();
        let result = TextureCache::new().load_cube_map(&mut backend, &["a.png", "b.png"]);
        assert!(matches!(result, Err(ResourceError::FaceCount(2))));
    }

    #[test]
    fn test_missing_texture_is_io_error() {
        let mut backend = RecordingBackend::default();
        let result = TextureCache::new().load_texture(&mut backend, "does/not/exist.png");
        assert!(matches!(result, Err(ResourceError::Io { .. })));
        assert_eq!(created_textures(&backend), 0);
    }

    #[test]
    fn test_shader_kinds_share_vertex_source() {
        let dir = temp_dir("shaders");
        let vert = dir.join("default_vert.glsl");
        let frag = dir.join("default_frag.glsl");
        let outline = dir.join("outline_frag.glsl");
        std::fs::write(&vert, "void main() {}").unwrap();
        std::fs::write(&frag, "void main() {}").unwrap();
        std::fs::write(&outline, "void main() {}").unwrap();

        let path = |p: &PathBuf| p.to_string_lossy().to_string();
        let mut shaders = ShaderSetConfig::default();
        shaders.default = ShaderConfig::new(path(&vert), path(&frag));
        shaders.outline = ShaderConfig::new(path(&vert), path(&outline));

        let mut backend = RecordingBackend::default();
        let mut registry = ResourceRegistry::new(shaders);
        let default = registry.shader(&mut backend, ShaderKind::Default).unwrap();
        let outline_program = registry.shader(&mut backend, ShaderKind::Outline).unwrap();
        let again = registry.shader_from_paths(&mut backend, &vert, &frag).unwrap();

        assert_ne!(default, outline_program);
        assert_eq!(default, again);
        assert_eq!(registry.shaders().len(), 2);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_registries_are_independent() {
        let dir = temp_dir("independent");
        let path = dir.join("t.png");
        RgbImage::from_pixel(1, 1, Rgb([0, 0, 0])).save(&path).unwrap();

        let mut backend = RecordingBackend::default();
        let mut a = ResourceRegistry::default();
        let mut b = ResourceRegistry::default();
        a.texture(&mut backend, &path).unwrap();
        b.texture(&mut backend, &path).unwrap();

        assert_eq!(created_textures(&backend), 2);
        assert_eq!(a.textures().len(), 1);
        let _ = std::fs::remove_dir_all(dir);
    }
}
