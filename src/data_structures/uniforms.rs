//! Shared uniform table passed into shaded materials.
//!
//! The hosting scene owns a table of uniform values (lighting, time, and so
//! on) and hands it down when a world is constructed. The world treats the
//! table as opaque pass-through data: every shaded material built during mesh
//! substitution receives the same read-only table.

use std::collections::BTreeMap;

/// A single uniform value. The core never interprets these; they only travel
/// into material uniform buffers.
#[derive(Clone, Debug, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2(cgmath::Vector2<f32>),
    Vec3(cgmath::Vector3<f32>),
    Vec4(cgmath::Vector4<f32>),
}

impl UniformValue {
    fn write_floats(&self, out: &mut Vec<f32>) {
        match self {
            UniformValue::Float(v) => out.push(*v),
            UniformValue::Vec2(v) => out.extend([v.x, v.y]),
            UniformValue::Vec3(v) => out.extend([v.x, v.y, v.z]),
            UniformValue::Vec4(v) => out.extend([v.x, v.y, v.z, v.w]),
        }
    }
}

/// Read-only uniform table, merged from a parent scope at construction.
///
/// Keys are ordered so [`to_floats`](Self::to_floats) packs deterministically.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SharedUniforms {
    values: BTreeMap<String, UniformValue>,
}

impl SharedUniforms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a parent scope with additional entries; later entries win on
    /// key collision.
    pub fn merged(
        parent: &SharedUniforms,
        extra: impl IntoIterator<Item = (String, UniformValue)>,
    ) -> Self {
        let mut values = parent.values.clone();
        values.extend(extra);
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&UniformValue> {
        self.values.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Pack all values into a flat float list in key order, ready for a GPU
    /// uniform buffer upload.
    pub fn to_floats(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.values.len() * 4);
        for value in self.values.values() {
            value.write_floats(&mut out);
        }
        out
    }
}

impl FromIterator<(String, UniformValue)> for SharedUniforms {
    fn from_iter<T: IntoIterator<Item = (String, UniformValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
