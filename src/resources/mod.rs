//! Loading collaborators: fetch model and cubemap data from asset files.
//!
//! This module contains the shipped implementations of the world's source
//! traits: [`GltfAssetSource`] parses a glTF/GLB file into a scene-node
//! hierarchy, and [`texture::CubemapDirSource`] fetches six cubemap faces
//! from an asset directory. Both resolve file names relative to the `assets`
//! directory (over HTTP on wasm).

pub mod texture;

use std::io::{BufReader, Cursor};

use anyhow::{Context, Result};

use crate::{
    data_structures::{
        model::PbrParams,
        scene_graph::{SceneNode, to_scene_node},
        transform::Transform,
    },
    resources::texture::load_binary,
    world::AssetSource,
};

/// Asset source backed by glTF files (`.gltf` with external buffers or
/// binary `.glb`).
#[derive(Clone, Copy, Debug, Default)]
pub struct GltfAssetSource;

impl AssetSource for GltfAssetSource {
    async fn fetch_asset(&self, source: &str) -> Result<SceneNode> {
        load_model_gltf(source).await
    }
}

/// Parse a glTF file into an owned scene-node hierarchy.
///
/// Geometry and material parameters stay CPU-side; the hosting renderer
/// uploads them on demand. Texture maps referenced by materials are not
/// resolved here.
pub async fn load_model_gltf(file_name: &str) -> Result<SceneNode> {
    let gltf_bytes = load_binary(file_name).await?;
    let gltf_cursor = Cursor::new(gltf_bytes);
    let gltf_reader = BufReader::new(gltf_cursor);
    let gltf = gltf::Gltf::from_reader(gltf_reader)
        .with_context(|| format!("failed to parse glTF {file_name:?}"))?;

    // Load buffers
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                if let Some(blob) = gltf.blob.as_deref() {
                    buffer_data.push(blob.into());
                }
            }
            gltf::buffer::Source::Uri(uri) => {
                let bin = load_binary(uri).await?;
                buffer_data.push(bin);
            }
        }
    }

    // Material parameters, indexed like the document's material list
    let mut materials = Vec::new();
    for material in gltf.materials() {
        let pbr = material.pbr_metallic_roughness();
        materials.push(PbrParams {
            name: material.name().unwrap_or("material").to_string(),
            base_color: pbr.base_color_factor(),
            metallic: pbr.metallic_factor(),
            roughness: pbr.roughness_factor(),
        });
    }

    let mut roots = Vec::new();
    for scene in gltf.scenes() {
        for node in scene.nodes() {
            roots.push(to_scene_node(node, &buffer_data, &materials));
        }
    }

    let root = if roots.len() == 1 {
        roots.into_iter().next().expect("one root was just counted")
    } else {
        let mut root = SceneNode::group(file_name, Transform::default());
        root.children = roots;
        root
    };

    Ok(root)
}
