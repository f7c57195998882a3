//! Environment cube textures.
//!
//! A [`CubeTexture`] holds six decoded RGBA faces in the fixed order
//! `px, nx, py, ny, pz, nz` plus an optional GPU cube texture. It doubles as
//! the scene backdrop and as the reflection source for shaded materials, so
//! at most one is active per world at a time.

use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use anyhow::{Context, Result, ensure};

use crate::data_structures::lock;

/// Face suffix order for resolving a logical environment name.
pub const FACE_ORDER: [&str; 6] = ["px", "nx", "py", "ny", "pz", "nz"];

/// GPU half of a [`CubeTexture`]: the texture, a cube view and a sampler.
#[derive(Debug)]
pub struct GpuCubeTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

#[derive(Debug)]
pub struct CubeTexture {
    pub name: String,
    faces: [image::RgbaImage; 6],
    size: u32,
    gpu: Mutex<Option<GpuCubeTexture>>,
    disposed: AtomicBool,
}

impl CubeTexture {
    /// Decode six face images from raw file bytes, in `FACE_ORDER`.
    ///
    /// All-or-nothing: any face that fails to decode or does not match the
    /// first face's square dimensions fails the whole cubemap.
    pub fn from_face_bytes(name: impl Into<String>, face_bytes: &[Vec<u8>; 6]) -> Result<Self> {
        let name = name.into();
        let mut faces = Vec::with_capacity(6);
        for (idx, bytes) in face_bytes.iter().enumerate() {
            let img = image::load_from_memory(bytes)
                .with_context(|| format!("decoding face {} of cubemap {}", FACE_ORDER[idx], name))?;
            faces.push(img.to_rgba8());
        }
        let faces: [image::RgbaImage; 6] = faces
            .try_into()
            .expect("exactly six faces were decoded above");
        Self::from_images(name, faces)
    }

    pub fn from_images(name: impl Into<String>, faces: [image::RgbaImage; 6]) -> Result<Self> {
        let name = name.into();
        let size = faces[0].width();
        for (idx, face) in faces.iter().enumerate() {
            ensure!(
                face.width() == size && face.height() == size,
                "cubemap {} face {} is {}x{}, expected {}x{}",
                name,
                FACE_ORDER[idx],
                face.width(),
                face.height(),
                size,
                size
            );
        }
        Ok(Self {
            name,
            faces,
            size,
            gpu: Mutex::new(None),
            disposed: AtomicBool::new(false),
        })
    }

    /// A 1x1 cubemap with every face set to `rgba`. Handy as a placeholder
    /// backdrop and in tests.
    pub fn solid_color(name: impl Into<String>, rgba: [u8; 4]) -> Self {
        let face = image::RgbaImage::from_pixel(1, 1, image::Rgba(rgba));
        Self {
            name: name.into(),
            faces: [
                face.clone(),
                face.clone(),
                face.clone(),
                face.clone(),
                face.clone(),
                face,
            ],
            size: 1,
            gpu: Mutex::new(None),
            disposed: AtomicBool::new(false),
        }
    }

    /// Edge length of each (square) face in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn faces(&self) -> &[image::RgbaImage; 6] {
        &self.faces
    }

    /// Create the GPU cube texture and write all six faces, if not present yet.
    pub fn upload(&self, device: &wgpu::Device, queue: &wgpu::Queue) {
        if self.is_disposed() {
            log::warn!("upload on disposed cubemap {:?} skipped", self.name);
            return;
        }
        let mut gpu = lock(&self.gpu);
        if gpu.is_some() {
            return;
        }
        let size = wgpu::Extent3d {
            width: self.size,
            height: self.size,
            depth_or_array_layers: 6,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&self.name),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        for (layer, face) in self.faces.iter().enumerate() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: 0,
                        y: 0,
                        z: layer as u32,
                    },
                },
                face,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * self.size),
                    rows_per_image: Some(self.size),
                },
                wgpu::Extent3d {
                    width: self.size,
                    height: self.size,
                    depth_or_array_layers: 1,
                },
            );
        }
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });
        *gpu = Some(GpuCubeTexture {
            texture,
            view,
            sampler,
        });
    }

    /// Run `f` against the GPU texture, if it has been uploaded.
    pub fn with_gpu<R>(&self, f: impl FnOnce(&GpuCubeTexture) -> R) -> Option<R> {
        lock(&self.gpu).as_ref().map(f)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Release the GPU texture. Returns `true` if this call actually freed
    /// it, `false` if the cubemap was already disposed.
    pub fn dispose(&self) -> bool {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Some(gpu) = lock(&self.gpu).take() {
            gpu.texture.destroy();
        }
        true
    }
}
