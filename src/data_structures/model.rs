//! Geometry, materials and render proxies.
//!
//! A loaded asset is made of plain [`Renderable`]s (geometry + the material
//! the file shipped with). For rendering, the world substitutes one
//! [`MeshWrapper`] per renderable: a proxy that shares the renderable's
//! geometry but owns an enhanced [`ShadedMaterial`] fed by the shared uniform
//! table and the active environment map.
//!
//! GPU handles are optional everywhere so the lifecycle can run headless;
//! `upload` calls realise them on demand and `dispose` releases them. Every
//! `dispose` is idempotent: the first call frees, later calls are no-ops.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use wgpu::util::DeviceExt;

use crate::data_structures::{lock, texture::CubeTexture, uniforms::SharedUniforms};

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

/// GPU half of a [`Geometry`]: vertex and index buffers.
#[derive(Debug)]
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

/// Mesh geometry with optional GPU buffers.
///
/// Geometry is shared between a plain renderable and its mesh wrapper via
/// `Arc`; ownership for disposal purposes stays with the renderable the file
/// defined. A wrapper must never free geometry it did not allocate.
#[derive(Debug)]
pub struct Geometry {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    gpu: Mutex<Option<GpuMesh>>,
    disposed: AtomicBool,
}

impl Geometry {
    pub fn new(name: impl Into<String>, vertices: Vec<ModelVertex>, indices: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            vertices,
            indices,
            gpu: Mutex::new(None),
            disposed: AtomicBool::new(false),
        }
    }

    /// Create the vertex/index buffers for this geometry if they don't exist yet.
    pub fn upload(&self, device: &wgpu::Device) {
        if self.is_disposed() {
            log::warn!("upload on disposed geometry {:?} skipped", self.name);
            return;
        }
        let mut gpu = lock(&self.gpu);
        if gpu.is_some() {
            return;
        }
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", self.name)),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", self.name)),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        *gpu = Some(GpuMesh {
            vertex_buffer,
            index_buffer,
            num_elements: self.indices.len() as u32,
        });
    }

    /// Run `f` against the GPU buffers, if they have been uploaded.
    pub fn with_gpu<R>(&self, f: impl FnOnce(&GpuMesh) -> R) -> Option<R> {
        lock(&self.gpu).as_ref().map(f)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Release the GPU buffers. Returns `true` if this call actually freed
    /// them, `false` if the geometry was already disposed.
    pub fn dispose(&self) -> bool {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Some(gpu) = lock(&self.gpu).take() {
            gpu.vertex_buffer.destroy();
            gpu.index_buffer.destroy();
        }
        true
    }
}

/// PBR factors read from the asset file, used to build shader materials.
#[derive(Clone, Debug)]
pub struct PbrParams {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
}

/// Fixed-function material. Owns no GPU resources, so disposal skips it.
#[derive(Clone, Debug)]
pub struct BasicMaterial {
    pub name: String,
    pub color: [f32; 4],
}

impl Default for BasicMaterial {
    fn default() -> Self {
        Self {
            name: "basic".to_string(),
            color: [0.5, 0.5, 0.5, 1.0],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct ShaderMaterialRaw {
    base_color: [f32; 4],
    metallic: f32,
    roughness: f32,
    _pad: [f32; 2],
}

/// Shader-backed material attached to a plain renderable. Owns an optional
/// uniform buffer that disposal must release.
#[derive(Debug)]
pub struct ShaderMaterial {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    gpu: Mutex<Option<wgpu::Buffer>>,
    disposed: AtomicBool,
}

impl ShaderMaterial {
    pub fn from_params(params: &PbrParams) -> Self {
        Self {
            name: params.name.clone(),
            base_color: params.base_color,
            metallic: params.metallic,
            roughness: params.roughness,
            gpu: Mutex::new(None),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn upload(&self, device: &wgpu::Device) {
        if self.is_disposed() {
            log::warn!("upload on disposed material {:?} skipped", self.name);
            return;
        }
        let mut gpu = lock(&self.gpu);
        if gpu.is_some() {
            return;
        }
        let raw = ShaderMaterialRaw {
            base_color: self.base_color,
            metallic: self.metallic,
            roughness: self.roughness,
            _pad: [0.0; 2],
        };
        *gpu = Some(
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Material Buffer", self.name)),
                contents: bytemuck::cast_slice(&[raw]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            }),
        );
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub fn dispose(&self) -> bool {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Some(buffer) = lock(&self.gpu).take() {
            buffer.destroy();
        }
        true
    }
}

/// Material attached to a plain renderable.
///
/// Disposal dispatches on the variant: only the `Shader` branch owns GPU
/// resources that must be released with the asset.
#[derive(Debug)]
pub enum Material {
    Basic(BasicMaterial),
    Shader(ShaderMaterial),
}

impl Material {
    pub fn name(&self) -> &str {
        match self {
            Material::Basic(basic) => &basic.name,
            Material::Shader(shader) => &shader.name,
        }
    }
}

/// Enhanced material owned by a mesh wrapper: shared uniform table plus an
/// environment-map slot for reflection lookup.
#[derive(Debug)]
pub struct ShadedMaterial {
    uniforms: Arc<SharedUniforms>,
    env_map: Mutex<Option<Arc<CubeTexture>>>,
    gpu: Mutex<Option<wgpu::Buffer>>,
    disposed: AtomicBool,
}

impl ShadedMaterial {
    pub fn new(uniforms: Arc<SharedUniforms>, env_map: Option<Arc<CubeTexture>>) -> Self {
        Self {
            uniforms,
            env_map: Mutex::new(env_map),
            gpu: Mutex::new(None),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn uniforms(&self) -> &Arc<SharedUniforms> {
        &self.uniforms
    }

    pub fn env_map(&self) -> Option<Arc<CubeTexture>> {
        lock(&self.env_map).clone()
    }

    /// Swap the environment map used for reflections. A disposed material
    /// silently drops the update.
    pub fn update_env_map(&self, env_map: Option<Arc<CubeTexture>>) {
        if self.is_disposed() {
            return;
        }
        *lock(&self.env_map) = env_map;
    }

    pub fn upload(&self, device: &wgpu::Device) {
        if self.is_disposed() {
            log::warn!("upload on disposed shaded material skipped");
            return;
        }
        let mut gpu = lock(&self.gpu);
        if gpu.is_some() {
            return;
        }
        // Uniform buffers want 16-byte aligned sizes.
        let mut floats = self.uniforms.to_floats();
        while floats.is_empty() || floats.len() % 4 != 0 {
            floats.push(0.0);
        }
        *gpu = Some(
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Shaded Material Buffer"),
                contents: bytemuck::cast_slice(&floats),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            }),
        );
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub fn dispose(&self) -> bool {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Some(buffer) = lock(&self.gpu).take() {
            buffer.destroy();
        }
        *lock(&self.env_map) = None;
        true
    }
}

/// Geometry + material pair attached to a scene node.
///
/// Immutable once loaded except for visibility and the shadow flags, which
/// the substitution step toggles.
#[derive(Debug)]
pub struct Renderable {
    pub geometry: Arc<Geometry>,
    pub material: Material,
    pub visible: bool,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Renderable {
    pub fn new(geometry: Arc<Geometry>, material: Material) -> Self {
        Self {
            geometry,
            material,
            visible: true,
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}

/// Render proxy substituted for a plain renderable at load time.
///
/// Shares the source geometry (never copies, never frees it) and owns a
/// freshly constructed shaded material. Exactly one wrapper exists per
/// eligible renderable, and no wrapper outlives the asset it was built from.
#[derive(Debug)]
pub struct MeshWrapper {
    geometry: Arc<Geometry>,
    material: ShadedMaterial,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    disposed: AtomicBool,
}

impl MeshWrapper {
    pub fn new(
        geometry: Arc<Geometry>,
        uniforms: Arc<SharedUniforms>,
        env_map: Option<Arc<CubeTexture>>,
    ) -> Self {
        Self {
            geometry,
            material: ShadedMaterial::new(uniforms, env_map),
            cast_shadow: true,
            receive_shadow: true,
            disposed: AtomicBool::new(false),
        }
    }

    pub fn geometry(&self) -> &Arc<Geometry> {
        &self.geometry
    }

    pub fn material(&self) -> &ShadedMaterial {
        &self.material
    }

    pub fn env_map(&self) -> Option<Arc<CubeTexture>> {
        self.material.env_map()
    }

    pub fn update_env_map(&self, env_map: Option<Arc<CubeTexture>>) {
        self.material.update_env_map(env_map);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Release the owned shaded material and wrapper-specific GPU resources.
    /// The shared geometry is left alone; the source renderable owns it.
    pub fn dispose(&self) -> bool {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.material.dispose();
        true
    }
}
