//! Engine data structures: scene graphs, geometry, materials, and textures.
//!
//! This module contains the core data types for scene representation:
//!
//! - `model` contains geometry, material and render-proxy definitions
//! - `scene_graph` is the hierarchical asset representation and its bounds
//! - `texture` contains the six-face environment cube texture
//! - `transform` holds per-node position/rotation/scale data
//! - `uniforms` is the shared uniform table threaded into shaded materials

pub mod model;
pub mod scene_graph;
pub mod texture;
pub mod transform;
pub mod uniforms;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks a slot that never holds a guard across a panic-relevant section.
pub(crate) fn lock<T>(slot: &Mutex<T>) -> MutexGuard<'_, T> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
