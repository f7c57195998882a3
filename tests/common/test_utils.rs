//! Shared helpers: stub sources, scene builders, and a recording rig.

use std::sync::Arc;

use anyhow::{Result, bail};
use modelstage::{
    camera::CameraRig,
    data_structures::{
        model::{Geometry, Material, ModelVertex, PbrParams, Renderable, ShaderMaterial},
        scene_graph::SceneNode,
        texture::CubeTexture,
        transform::Transform,
    },
    world::{AssetSource, CubemapSource},
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Axis-aligned cube geometry centred at the origin (8 corners, 12 tris).
pub fn cube_geometry(name: &str, half_extent: f32) -> Arc<Geometry> {
    let h = half_extent;
    let corners = [
        [-h, -h, -h],
        [h, -h, -h],
        [h, h, -h],
        [-h, h, -h],
        [-h, -h, h],
        [h, -h, h],
        [h, h, h],
        [-h, h, h],
    ];
    let vertices = corners
        .iter()
        .map(|&position| ModelVertex {
            position,
            ..Default::default()
        })
        .collect();
    let indices = vec![
        0, 1, 2, 0, 2, 3, 4, 6, 5, 4, 7, 6, 0, 4, 5, 0, 5, 1, 3, 2, 6, 3, 6, 7, 0, 3, 7, 0, 7, 4,
        1, 5, 6, 1, 6, 2,
    ];
    Arc::new(Geometry::new(name, vertices, indices))
}

pub fn shader_material(name: &str) -> Material {
    Material::Shader(ShaderMaterial::from_params(&PbrParams {
        name: name.to_string(),
        base_color: [1.0, 1.0, 1.0, 1.0],
        metallic: 0.0,
        roughness: 0.8,
    }))
}

/// A root group with `count` renderable cube children.
pub fn multi_mesh_model(count: usize) -> SceneNode {
    let mut root = SceneNode::group("root", Transform::default());
    for idx in 0..count {
        let geometry = cube_geometry(&format!("cube{idx}"), 0.5);
        root.children.push(SceneNode::renderable(
            format!("mesh{idx}"),
            Transform::from(cgmath::Vector3::new(idx as f32 * 2.0, 0.0, 0.0)),
            Renderable::new(geometry, shader_material(&format!("mat{idx}"))),
        ));
    }
    root
}

/// A unit cube centred at the origin under a single root group.
pub fn unit_cube_model() -> SceneNode {
    let mut root = SceneNode::group("root", Transform::default());
    root.children.push(SceneNode::renderable(
        "cube",
        Transform::default(),
        Renderable::new(cube_geometry("cube", 0.5), shader_material("mat")),
    ));
    root
}

/// A hierarchy with no geometry at all: zero-size bounding box.
pub fn empty_model() -> SceneNode {
    let mut root = SceneNode::group("root", Transform::default());
    root.children
        .push(SceneNode::group("child", Transform::default()));
    root
}

/// Asset source that builds a fresh hierarchy per fetch.
pub struct StubAssetSource<F: Fn() -> SceneNode>(pub F);

impl<F: Fn() -> SceneNode> AssetSource for StubAssetSource<F> {
    async fn fetch_asset(&self, _source: &str) -> Result<SceneNode> {
        Ok((self.0)())
    }
}

pub struct FailingAssetSource;

impl AssetSource for FailingAssetSource {
    async fn fetch_asset(&self, source: &str) -> Result<SceneNode> {
        bail!("asset {source} unavailable")
    }
}

/// Cubemap source delivering a solid-colour 1x1 cubemap named after the
/// face identifiers' directory.
pub struct StubCubemapSource(pub [u8; 4]);

impl CubemapSource for StubCubemapSource {
    async fn fetch_cubemap(&self, faces: &[String; 6]) -> Result<CubeTexture> {
        let name = faces[0]
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .unwrap_or("env");
        Ok(CubeTexture::solid_color(name, self.0))
    }
}

pub struct FailingCubemapSource;

impl CubemapSource for FailingCubemapSource {
    async fn fetch_cubemap(&self, faces: &[String; 6]) -> Result<CubeTexture> {
        bail!("cubemap face {} unavailable", faces[0])
    }
}

/// Rig that records what the fit computation drives it to.
#[derive(Debug, Default)]
pub struct RecordingRig {
    pub target: Option<(f32, f32, f32)>,
    pub position: Option<(f32, f32, f32)>,
}

impl CameraRig for RecordingRig {
    fn set_target(&mut self, x: f32, y: f32, z: f32) {
        self.target = Some((x, y, z));
    }

    fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = Some((x, y, z));
    }
}

/// Count nodes in a tree matching `pred`.
pub fn count_nodes(root: &SceneNode, pred: impl Fn(&SceneNode) -> bool) -> usize {
    let mut count = 0;
    root.traverse(&mut |node| {
        if pred(node) {
            count += 1;
        }
    });
    count
}
