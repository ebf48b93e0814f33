//! Named per-point attribute arrays
//!
//! An attribute stores one tuple of `components` floats per mesh point. Scalars
//! have one component, normals and vectors three. Colour mapping always reads
//! component 0 of each tuple.

use crate::{Error, Result, Vector3f};
use serde::{Deserialize, Serialize};

/// Name given to per-point normal vectors by every parser
pub const NORMALS: &str = "Normals";

/// A named array holding one fixed-size tuple per point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointAttribute {
    name: String,
    components: usize,
    values: Vec<f32>,
}

impl PointAttribute {
    /// Create an attribute from flat tuple storage
    pub fn new(name: impl Into<String>, components: usize, values: Vec<f32>) -> Result<Self> {
        let name = name.into();
        if components == 0 || values.len() % components != 0 {
            return Err(Error::AttributeComponents { name, components });
        }
        Ok(Self {
            name,
            components,
            values,
        })
    }

    /// Create a single-component attribute
    pub fn scalars(name: impl Into<String>, values: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            components: 1,
            values,
        }
    }

    /// Create a three-component attribute from vectors
    pub fn vectors(name: impl Into<String>, vectors: &[Vector3f]) -> Self {
        Self {
            name: name.into(),
            components: 3,
            values: vectors.iter().flat_map(|v| [v.x, v.y, v.z]).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn components(&self) -> usize {
        self.components
    }

    /// Flat tuple storage, `tuple_count() * components()` long
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Number of tuples (one per point)
    pub fn tuple_count(&self) -> usize {
        self.values.len() / self.components
    }

    /// Get the tuple for a point
    pub fn tuple(&self, index: usize) -> Option<&[f32]> {
        let start = index.checked_mul(self.components)?;
        self.values.get(start..start + self.components)
    }

    /// Value used for colour mapping at a point (component 0)
    pub fn scalar(&self, index: usize) -> Option<f32> {
        self.tuple(index).map(|t| t[0])
    }

    /// Iterate over the colour-mapped value of every point
    pub fn scalar_values(&self) -> impl Iterator<Item = f32> + '_ {
        self.values.chunks_exact(self.components).map(|t| t[0])
    }

    /// Min/max of the colour-mapped component, ignoring NaN
    ///
    /// Returns `None` when the attribute holds no finite-comparable value.
    pub fn range(&self) -> Option<(f32, f32)> {
        self.scalar_values()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Interpret a three-component attribute as vectors
    pub fn as_vectors(&self) -> Option<Vec<Vector3f>> {
        if self.components != 3 {
            return None;
        }
        Some(
            self.values
                .chunks_exact(3)
                .map(|c| Vector3f::new(c[0], c[1], c[2]))
                .collect(),
        )
    }
}

/// The ordered set of attributes attached to one mesh
///
/// Names are unique; inserting an existing name replaces the old array in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointData {
    attributes: Vec<PointAttribute>,
}

impl PointData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PointAttribute> {
        self.attributes.iter()
    }

    /// Attribute names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|a| a.name())
    }

    pub fn get(&self, name: &str) -> Option<&PointAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Attach an attribute whose tuple count must equal `point_count`
    pub fn insert(&mut self, attribute: PointAttribute, point_count: usize) -> Result<()> {
        let actual = attribute.tuple_count();
        if actual != point_count {
            return Err(Error::AttributeLength {
                name: attribute.name,
                expected: point_count,
                actual,
            });
        }
        match self.attributes.iter_mut().find(|a| a.name == attribute.name) {
            Some(existing) => *existing = attribute,
            None => self.attributes.push(attribute),
        }
        Ok(())
    }
}
