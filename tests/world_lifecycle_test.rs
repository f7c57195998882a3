mod common;

use common::test_utils::{
    FailingAssetSource, StubAssetSource, count_nodes, cube_geometry, init_logger,
    multi_mesh_model, shader_material, unit_cube_model,
};
use futures::executor::block_on;
use modelstage::{
    data_structures::{
        model::Renderable,
        scene_graph::{NodeKind, SceneNode},
        transform::Transform,
        uniforms::SharedUniforms,
    },
    world::AssetWorld,
};

#[test]
fn single_active_asset_after_repeated_loads() {
    init_logger();
    let mut world = AssetWorld::new(&SharedUniforms::new());

    block_on(world.load_model("a.glb", &StubAssetSource(|| multi_mesh_model(3)))).unwrap();
    assert_eq!(world.wrappers().len(), 3);

    block_on(world.load_model("b.glb", &StubAssetSource(|| multi_mesh_model(2)))).unwrap();
    assert_eq!(world.wrappers().len(), 2);

    let root = world.model().expect("model attached");
    assert_eq!(
        count_nodes(root, |n| matches!(n.kind, NodeKind::Renderable(_))),
        2
    );
    assert_eq!(
        count_nodes(root, |n| matches!(n.kind, NodeKind::Wrapper(_))),
        2
    );
}

#[test]
fn wrapper_inserted_once_as_sibling_and_source_hidden() {
    init_logger();
    let mut world = AssetWorld::new(&SharedUniforms::new());
    block_on(world.load_model("a.glb", &StubAssetSource(|| multi_mesh_model(2)))).unwrap();

    let root = world.model().expect("model attached");
    // two renderables plus exactly one wrapper each, all under the same parent
    assert_eq!(root.children.len(), 4);
    for child in &root.children {
        match &child.kind {
            NodeKind::Renderable(renderable) => {
                assert!(!renderable.visible);
                assert!(renderable.cast_shadow);
                assert!(renderable.receive_shadow);
            }
            NodeKind::Wrapper(wrapper) => {
                assert!(wrapper.cast_shadow);
                assert!(wrapper.receive_shadow);
            }
            NodeKind::Group => panic!("unexpected group under root"),
        }
    }

    // the wrapper copies the source node's transform
    let source = root
        .children
        .iter()
        .find(|n| n.name == "mesh1")
        .expect("source node");
    let shaded = root
        .children
        .iter()
        .find(|n| n.name == "mesh1.shaded")
        .expect("wrapper node");
    assert_eq!(shaded.transform.position, source.transform.position);
}

#[test]
fn failed_load_keeps_previous_asset() {
    init_logger();
    let mut world = AssetWorld::new(&SharedUniforms::new());
    block_on(world.load_model("a.glb", &StubAssetSource(|| multi_mesh_model(3)))).unwrap();
    let wrappers_before = world.wrappers().to_vec();

    let result = block_on(world.load_model("missing.glb", &FailingAssetSource));
    assert!(result.is_err());

    assert!(world.model().is_some());
    assert_eq!(world.wrappers().len(), 3);
    for wrapper in &wrappers_before {
        assert!(!wrapper.is_disposed());
        assert!(!wrapper.geometry().is_disposed());
    }
}

#[test]
fn replacement_disposes_previous_wrappers_and_geometry() {
    init_logger();
    let mut world = AssetWorld::new(&SharedUniforms::new());
    block_on(world.load_model("a.glb", &StubAssetSource(|| multi_mesh_model(3)))).unwrap();
    let old_wrappers = world.wrappers().to_vec();

    block_on(world.load_model("b.glb", &StubAssetSource(unit_cube_model))).unwrap();

    for wrapper in &old_wrappers {
        assert!(wrapper.is_disposed());
        assert!(wrapper.geometry().is_disposed());
        assert!(wrapper.material().is_disposed());
    }
    for wrapper in world.wrappers() {
        assert!(!wrapper.is_disposed());
        assert!(!wrapper.geometry().is_disposed());
    }
}

#[test]
fn geometry_released_exactly_once_despite_shared_reference() {
    init_logger();
    let mut world = AssetWorld::new(&SharedUniforms::new());
    block_on(world.load_model("a.glb", &StubAssetSource(unit_cube_model))).unwrap();
    let geometry = world.wrappers()[0].geometry().clone();

    block_on(world.load_model("b.glb", &StubAssetSource(unit_cube_model))).unwrap();

    assert!(geometry.is_disposed());
    // the first disposal already released the buffers; this is the no-op path
    assert!(!geometry.dispose());
}

#[test]
fn clear_model_tears_down_asset_and_wrappers() {
    init_logger();
    let mut world = AssetWorld::new(&SharedUniforms::new());
    block_on(world.load_model("a.glb", &StubAssetSource(|| multi_mesh_model(2)))).unwrap();
    let wrappers = world.wrappers().to_vec();

    world.clear_model();
    assert!(world.model().is_none());
    assert!(world.wrappers().is_empty());
    for wrapper in &wrappers {
        assert!(wrapper.is_disposed());
    }

    // teardown without an active asset is a no-op
    world.clear_model();
}

#[test]
fn renderable_root_gets_wrapper_child() {
    init_logger();
    let mut world = AssetWorld::new(&SharedUniforms::new());
    let loader = StubAssetSource(|| {
        SceneNode::renderable(
            "solo",
            Transform::default(),
            Renderable::new(cube_geometry("solo", 0.5), shader_material("solo-mat")),
        )
    });
    block_on(world.load_model("solo.glb", &loader)).unwrap();

    assert_eq!(world.wrappers().len(), 1);
    let root = world.model().expect("model attached");
    match &root.kind {
        NodeKind::Renderable(renderable) => assert!(!renderable.visible),
        other => panic!("expected renderable root, got {other:?}"),
    }
    assert_eq!(root.children.len(), 1);
    assert!(matches!(root.children[0].kind, NodeKind::Wrapper(_)));
}
