//! modelstage
//!
//! The asset lifecycle core of an interactive model viewer. This crate owns
//! loading and replacing a 3D model hierarchy, substituting a shaded render
//! proxy for every plain mesh, managing the environment cubemap used as both
//! backdrop and reflection source, and computing a camera configuration that
//! frames the current model. Scene composition, render passes, input handling
//! and UI remain with the hosting application.
//!
//! High-level modules
//! - `camera`: perspective camera and the camera-rig seam driven by fitting
//! - `data_structures`: scene nodes, geometry, materials, cube textures
//! - `resources`: helpers to fetch model/cubemap data from asset files
//! - `world`: the `AssetWorld` lifecycle component itself
//!

pub mod camera;
pub mod data_structures;
pub mod resources;
pub mod world;

// Re-exports commonly used types for convenience in downstream code.
pub use camera::{Camera, CameraRig, OrbitRig};
pub use cgmath::{Deg, Matrix4, Point3, Quaternion, Vector3, Vector4};
pub use world::{AssetSource, AssetWorld, Backdrop, CubemapSource};
