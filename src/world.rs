//! Asset world: model lifecycle, environment maps and camera framing.
//!
//! [`AssetWorld`] is the single owner of the currently loaded asset. It
//! replaces models atomically (the previous asset and all of its wrappers are
//! fully disposed before the new one attaches), substitutes a shaded
//! [`MeshWrapper`] for every renderable, swaps the environment cubemap
//! all-or-nothing, and computes a camera configuration that frames the
//! current model.
//!
//! Completion of the future returned by [`AssetWorld::load_model`] is the
//! "model updated" notification: when it resolves `Ok`, the hierarchy is
//! attached and all wrappers exist, so a caller typically follows up with
//! [`AssetWorld::fit`]. Because both async operations take `&mut self`, a
//! second load cannot start while one is in flight on the same world; callers
//! serialize, and the most recent completed load wins.

use std::sync::Arc;

use anyhow::{Context, Result};
use cgmath::{InnerSpace, Vector3, Zero};
use log::{debug, warn};

use crate::{
    camera::{Camera, CameraRig},
    data_structures::{
        model::{Material, MeshWrapper, Renderable},
        scene_graph::{NodeKind, SceneNode},
        texture::{CubeTexture, FACE_ORDER},
        transform::Transform,
        uniforms::SharedUniforms,
    },
};

/// Backdrop colour used before any environment is loaded and after one is
/// torn down (a neutral `#CCC` grey).
pub const DEFAULT_BACKDROP_COLOR: [f32; 4] = [0.8, 0.8, 0.8, 1.0];

/// Camera offset direction used by [`AssetWorld::fit`] when none is given.
pub const DEFAULT_CAMERA_OFFSET: Vector3<f32> = Vector3 {
    x: 2.0,
    y: 1.0,
    z: 2.0,
};

/// Slack factor applied to the fitting distance so the model doesn't touch
/// the viewport edges.
const FIT_OFFSET: f32 = 1.5;

/// Asset fetch/parse collaborator. Produces a fully built node hierarchy;
/// the world never validates formats itself.
pub trait AssetSource {
    fn fetch_asset(
        &self,
        source: &str,
    ) -> impl Future<Output = Result<SceneNode>>;
}

/// Cubemap fetch collaborator. Receives the six resolved face identifiers in
/// `px, nx, py, ny, pz, nz` order and must deliver all faces or fail.
pub trait CubemapSource {
    fn fetch_cubemap(
        &self,
        faces: &[String; 6],
    ) -> impl Future<Output = Result<CubeTexture>>;
}

/// Resolve a logical environment name to its six face identifiers, in the
/// fixed `<name>/<face>.png` convention.
pub fn environment_faces(name: &str) -> [String; 6] {
    FACE_ORDER.map(|face| format!("{name}/{face}.png"))
}

/// What the hosting renderer should paint behind the scene.
#[derive(Clone, Debug)]
pub enum Backdrop {
    Color([f32; 4]),
    Environment(Arc<CubeTexture>),
}

/// Owner of the active asset, its mesh wrappers, and the environment map.
#[derive(Debug)]
pub struct AssetWorld {
    model: Option<SceneNode>,
    wrappers: Vec<Arc<MeshWrapper>>,
    env_map: Option<Arc<CubeTexture>>,
    backdrop: Backdrop,
    uniforms: Arc<SharedUniforms>,
}

impl AssetWorld {
    /// Create an empty world. `parent_uniforms` is the hosting scene's
    /// uniform table; it is merged into the world's own scope and passed,
    /// read-only, to every shaded material built during substitution.
    pub fn new(parent_uniforms: &SharedUniforms) -> Self {
        let uniforms = Arc::new(SharedUniforms::merged(parent_uniforms, []));
        Self {
            model: None,
            wrappers: Vec::new(),
            env_map: None,
            backdrop: Backdrop::Color(DEFAULT_BACKDROP_COLOR),
            uniforms,
        }
    }

    /// The currently attached asset root, if any.
    pub fn model(&self) -> Option<&SceneNode> {
        self.model.as_ref()
    }

    /// Active mesh wrappers, in load-traversal order.
    pub fn wrappers(&self) -> &[Arc<MeshWrapper>] {
        &self.wrappers
    }

    /// The active environment cubemap, if any.
    pub fn environment(&self) -> Option<&Arc<CubeTexture>> {
        self.env_map.as_ref()
    }

    pub fn backdrop(&self) -> &Backdrop {
        &self.backdrop
    }

    pub fn uniforms(&self) -> &Arc<SharedUniforms> {
        &self.uniforms
    }

    /// Fetch a model and make it the active asset.
    ///
    /// On fetch failure the previously active asset stays attached,
    /// untouched. On success the previous asset (hierarchy, wrappers, GPU
    /// resources) is disposed first, then the new hierarchy is traversed
    /// once: every renderable node is hidden and re-parented behind a fresh
    /// shaded wrapper. The future resolving `Ok` is the completion signal.
    pub async fn load_model(&mut self, source: &str, loader: &impl AssetSource) -> Result<()> {
        let mut root = loader
            .fetch_asset(source)
            .await
            .with_context(|| format!("failed to fetch asset {source:?}"))?;

        if let Some(old) = self.model.take() {
            self.dispose_asset(old);
        }

        let mut wrappers = Vec::new();
        if let NodeKind::Renderable(renderable) = &mut root.kind {
            // A renderable root has no parent slot, so its wrapper becomes
            // its own child. Identity transform: the root's transform already
            // applies on the way down.
            let wrapper = wrap(renderable, &self.uniforms, self.env_map.as_ref());
            wrappers.push(Arc::clone(&wrapper));
            let name = format!("{}.shaded", root.name);
            root.children
                .push(SceneNode::wrapper(name, Transform::default(), wrapper));
        }
        substitute_children(&mut root, &self.uniforms, self.env_map.as_ref(), &mut wrappers);

        debug!(
            "loaded asset {:?}: {} wrapped meshes",
            source,
            wrappers.len()
        );
        self.wrappers = wrappers;
        self.model = Some(root);
        Ok(())
    }

    /// Fetch a six-face environment cubemap and install it as the scene
    /// backdrop and reflection source.
    ///
    /// All-or-nothing: on fetch failure the previous environment and
    /// backdrop stay active. On success the previous cubemap is released and
    /// the backdrop cleared before the new one is installed, and every
    /// active wrapper receives the new reference before this returns.
    /// Wrappers created by later loads pick it up at creation time.
    pub async fn load_environment(
        &mut self,
        name: &str,
        loader: &impl CubemapSource,
    ) -> Result<()> {
        let faces = environment_faces(name);
        let texture = loader
            .fetch_cubemap(&faces)
            .await
            .with_context(|| format!("failed to fetch environment {name:?}"))?;

        if let Some(old) = self.env_map.take() {
            self.backdrop = Backdrop::Color(DEFAULT_BACKDROP_COLOR);
            old.dispose();
        }

        let texture = Arc::new(texture);
        self.backdrop = Backdrop::Environment(Arc::clone(&texture));
        for wrapper in &self.wrappers {
            wrapper.update_env_map(Some(Arc::clone(&texture)));
        }
        debug!(
            "environment {:?} installed, pushed to {} wrappers",
            name,
            self.wrappers.len()
        );
        self.env_map = Some(texture);
        Ok(())
    }

    /// Frame the current model: orbit target, camera distance and clip
    /// planes. A no-op when no model is active.
    ///
    /// The distance formula is load-bearing for hosts that tune fits by
    /// hand: it feeds the field of view in degrees straight into `atan` and
    /// must not be "corrected".
    /// A zero-size bounding box yields distance 0 and places the camera at
    /// the centre; it never panics.
    pub fn fit(
        &self,
        camera: &mut Camera,
        rig: &mut impl CameraRig,
        offset: Option<Vector3<f32>>,
    ) {
        let Some(model) = &self.model else {
            return;
        };
        let offset = offset.unwrap_or(DEFAULT_CAMERA_OFFSET);

        let bounds = model.bounds();
        let center = bounds.center();
        let size = bounds.size();

        rig.set_target(center.x, center.y, center.z);

        let max_size = size.x.max(size.y).max(size.z);
        let fit_height_distance =
            max_size / (2.0 * (std::f32::consts::PI * camera.fov / 360.0).atan());
        let fit_width_distance = fit_height_distance / camera.aspect;
        let distance = FIT_OFFSET * fit_height_distance.max(fit_width_distance);

        let to_camera = center - (center + offset);
        let direction = if to_camera.magnitude2() > 0.0 {
            to_camera.normalize() * distance
        } else {
            Vector3::zero()
        };

        camera.near = distance / 100.0;
        camera.far = distance * 100.0;
        camera.update_projection();

        let position = center - direction;
        rig.set_position(position.x, position.y, position.z);
    }

    /// Explicit teardown of the active asset and its wrappers.
    pub fn clear_model(&mut self) {
        if let Some(old) = self.model.take() {
            self.dispose_asset(old);
        }
    }

    /// Explicit teardown of the active environment; the backdrop falls back
    /// to the default colour.
    pub fn clear_environment(&mut self) {
        if let Some(old) = self.env_map.take() {
            self.backdrop = Backdrop::Color(DEFAULT_BACKDROP_COLOR);
            old.dispose();
        }
    }

    /// Dispose an asset: wrappers release their shaded materials, plain
    /// renderables release their geometry and any shader-backed material,
    /// and the root detaches last. Best-effort and idempotent throughout --
    /// a partially constructed asset must not panic here.
    fn dispose_asset(&mut self, root: SceneNode) {
        dispose_node(&root);
        self.wrappers.clear();
        // `root` drops here, detaching the hierarchy after its resources
        // have been released.
    }
}

impl Drop for AssetWorld {
    fn drop(&mut self) {
        self.clear_model();
        self.clear_environment();
    }
}

/// Build the shaded wrapper for one renderable and hide the source.
///
/// The source stays in the hierarchy (invisible) so transform animation and
/// later traversals keep working; it is also flagged as a shadow caster so
/// shadow passes can keep using the original geometry.
fn wrap(
    renderable: &mut Renderable,
    uniforms: &Arc<SharedUniforms>,
    env_map: Option<&Arc<CubeTexture>>,
) -> Arc<MeshWrapper> {
    renderable.cast_shadow = true;
    renderable.receive_shadow = true;
    renderable.visible = false;
    Arc::new(MeshWrapper::new(
        Arc::clone(&renderable.geometry),
        Arc::clone(uniforms),
        env_map.map(Arc::clone),
    ))
}

/// Walk `node`'s subtree in load order; every renderable child gets exactly
/// one wrapper, appended to the same parent's child list so hierarchy depth
/// is preserved. The wrapper node copies the source node's transform at
/// creation time.
fn substitute_children(
    node: &mut SceneNode,
    uniforms: &Arc<SharedUniforms>,
    env_map: Option<&Arc<CubeTexture>>,
    out: &mut Vec<Arc<MeshWrapper>>,
) {
    let mut added = Vec::new();
    for child in &mut node.children {
        if let NodeKind::Renderable(renderable) = &mut child.kind {
            let wrapper = wrap(renderable, uniforms, env_map);
            out.push(Arc::clone(&wrapper));
            added.push(SceneNode::wrapper(
                format!("{}.shaded", child.name),
                child.transform.clone(),
                wrapper,
            ));
        }
        substitute_children(child, uniforms, env_map, out);
    }
    node.children.append(&mut added);
}

fn dispose_node(node: &SceneNode) {
    match &node.kind {
        NodeKind::Wrapper(wrapper) => {
            if !wrapper.dispose() {
                warn!("wrapper under {:?} was already disposed", node.name);
            }
        }
        NodeKind::Renderable(renderable) => {
            renderable.geometry.dispose();
            if let Material::Shader(material) = &renderable.material {
                material.dispose();
            }
        }
        NodeKind::Group => {}
    }
    for child in &node.children {
        dispose_node(child);
    }
}
