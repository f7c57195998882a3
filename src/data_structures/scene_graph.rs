//! Scene graph and hierarchical asset organization.
//!
//! A loaded asset is an owned tree of [`SceneNode`]s. Each node carries a
//! local transform and a [`NodeKind`] tag; traversal dispatches on the tag to
//! tell a plain renderable from the shaded wrapper substituted for it. The
//! tree also knows how to compute its world-space bounding box, which feeds
//! the camera-fit computation.

use std::sync::Arc;

use crate::data_structures::{
    model::{BasicMaterial, Geometry, Material, MeshWrapper, ModelVertex, PbrParams, Renderable,
            ShaderMaterial},
    transform::Transform,
};

/// Payload of a scene node, with an explicit discriminant per node kind.
#[derive(Debug)]
pub enum NodeKind {
    /// Pure hierarchy/transform node.
    Group,
    /// Geometry + material as defined by the asset file.
    Renderable(Renderable),
    /// Shaded render proxy substituted for a renderable at load time.
    Wrapper(Arc<MeshWrapper>),
}

/// A node in a loaded asset's hierarchy. Owned by the asset root and
/// destroyed with it.
#[derive(Debug)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub kind: NodeKind,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, transform: Transform, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            transform,
            kind,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>, transform: Transform) -> Self {
        Self::new(name, transform, NodeKind::Group)
    }

    pub fn renderable(
        name: impl Into<String>,
        transform: Transform,
        renderable: Renderable,
    ) -> Self {
        Self::new(name, transform, NodeKind::Renderable(renderable))
    }

    pub fn wrapper(
        name: impl Into<String>,
        transform: Transform,
        wrapper: Arc<MeshWrapper>,
    ) -> Self {
        Self::new(name, transform, NodeKind::Wrapper(wrapper))
    }

    /// Visit this node and all descendants, parents before children.
    pub fn traverse(&self, visit: &mut dyn FnMut(&SceneNode)) {
        visit(self);
        for child in &self.children {
            child.traverse(visit);
        }
    }

    pub fn traverse_mut(&mut self, visit: &mut dyn FnMut(&mut SceneNode)) {
        visit(self);
        for child in &mut self.children {
            child.traverse_mut(visit);
        }
    }

    /// World-space axis-aligned bounding box of this node and its subtree.
    ///
    /// Both plain renderables and wrappers contribute their (shared)
    /// geometry; hidden nodes still count, so wrappers and their hidden
    /// sources frame identically.
    pub fn bounds(&self) -> Aabb {
        let mut aabb = Aabb::empty();
        self.grow_bounds(&Transform::default(), &mut aabb);
        aabb
    }

    fn grow_bounds(&self, parent: &Transform, aabb: &mut Aabb) {
        let world = parent * &self.transform;
        let geometry = match &self.kind {
            NodeKind::Renderable(renderable) => Some(&renderable.geometry),
            NodeKind::Wrapper(wrapper) => Some(wrapper.geometry()),
            NodeKind::Group => None,
        };
        if let Some(geometry) = geometry {
            let matrix = world.to_matrix();
            for vertex in &geometry.vertices {
                let p = matrix
                    * cgmath::Vector4::new(
                        vertex.position[0],
                        vertex.position[1],
                        vertex.position[2],
                        1.0,
                    );
                aabb.include(cgmath::Vector3::new(p.x, p.y, p.z));
            }
        }
        for child in &self.children {
            child.grow_bounds(&world, aabb);
        }
    }
}

/// Axis-aligned bounding box. The empty box has zero size and a centre at
/// the origin, so a model without geometry yields a defined (degenerate)
/// camera fit instead of an error.
#[derive(Clone, Copy, Debug)]
pub struct Aabb {
    pub min: cgmath::Vector3<f32>,
    pub max: cgmath::Vector3<f32>,
}

impl Aabb {
    pub fn empty() -> Self {
        Self {
            min: cgmath::Vector3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: cgmath::Vector3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    pub fn include(&mut self, point: cgmath::Vector3<f32>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    pub fn center(&self) -> cgmath::Vector3<f32> {
        if self.is_empty() {
            return cgmath::Vector3::new(0.0, 0.0, 0.0);
        }
        (self.min + self.max) / 2.0
    }

    pub fn size(&self) -> cgmath::Vector3<f32> {
        if self.is_empty() {
            return cgmath::Vector3::new(0.0, 0.0, 0.0);
        }
        self.max - self.min
    }
}

/// Convert one glTF node (and its subtree) into an owned scene node.
///
/// A mesh with a single primitive becomes a renderable node; a mesh with
/// several primitives becomes a group with one renderable child per
/// primitive, so each primitive keeps its own geometry and material.
pub fn to_scene_node(node: gltf::scene::Node, buf: &[Vec<u8>], materials: &[PbrParams]) -> SceneNode {
    let decomposed = node.transform().decomposed();
    let transform = Transform {
        position: decomposed.0.into(),
        rotation: decomposed.1.into(),
        scale: decomposed.2.into(),
    };
    let name = node.name().unwrap_or("node").to_string();

    let mut scene_node = match node.mesh() {
        Some(mesh) => {
            let mut renderables = Vec::new();
            for (prim_idx, primitive) in mesh.primitives().enumerate() {
                let reader = primitive.reader(|buffer| Some(&buf[buffer.index()]));

                let mut vertices = Vec::new();
                if let Some(positions) = reader.read_positions() {
                    positions.for_each(|position| {
                        vertices.push(ModelVertex {
                            position,
                            ..Default::default()
                        })
                    });
                }
                if let Some(normals) = reader.read_normals() {
                    for (idx, normal) in normals.enumerate() {
                        vertices[idx].normal = normal;
                    }
                }
                if let Some(tex_coords) = reader.read_tex_coords(0).map(|v| v.into_f32()) {
                    for (idx, tex_coord) in tex_coords.enumerate() {
                        vertices[idx].tex_coords = tex_coord;
                    }
                }
                if let Some(tangents) = reader.read_tangents() {
                    for (idx, tangent) in tangents.enumerate() {
                        // glTF tangents are vec4; the 4th component gives the
                        // bitangent its handedness.
                        let tangent: cgmath::Vector4<f32> = tangent.into();
                        vertices[idx].tangent = tangent.truncate().into();
                        let normal: cgmath::Vector3<f32> = vertices[idx].normal.into();
                        let bitangent = normal.cross(tangent.truncate()) * tangent[3];
                        vertices[idx].bitangent = bitangent.into();
                    }
                }

                let mut indices = Vec::new();
                if let Some(indices_raw) = reader.read_indices() {
                    indices.append(&mut indices_raw.into_u32().collect::<Vec<u32>>());
                }

                let geometry = Arc::new(Geometry::new(
                    format!("{}.{}", mesh.name().unwrap_or(&name), prim_idx),
                    vertices,
                    indices,
                ));
                let material = primitive
                    .material()
                    .index()
                    .and_then(|idx| materials.get(idx))
                    .map(|params| Material::Shader(ShaderMaterial::from_params(params)))
                    .unwrap_or_else(|| Material::Basic(BasicMaterial::default()));
                renderables.push(Renderable::new(geometry, material));
            }

            if renderables.len() == 1 {
                let renderable = renderables
                    .pop()
                    .expect("a single renderable was just counted");
                SceneNode::renderable(name.clone(), transform, renderable)
            } else {
                let mut group = SceneNode::group(name.clone(), transform);
                for (idx, renderable) in renderables.into_iter().enumerate() {
                    group.children.push(SceneNode::renderable(
                        format!("{name}.{idx}"),
                        Transform::default(),
                        renderable,
                    ));
                }
                group
            }
        }
        None => SceneNode::group(name, transform),
    };

    for child in node.children() {
        scene_node.children.push(to_scene_node(child, buf, materials));
    }

    scene_node
}
