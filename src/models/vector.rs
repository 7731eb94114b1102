use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sparse weight vector over the tag vocabulary
///
/// Dimensions are tag vocabulary indices; weights are IDF-scaled tag scores.
/// Stored sorted by dimension so dot products run as a linear merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector(Vec<(u32, f32)>);

impl SparseVector {
    /// Builds a vector from unsorted (dimension, weight) pairs.
    /// Duplicate dimensions are summed.
    pub fn from_pairs(pairs: Vec<(u32, f32)>) -> Self {
        let mut merged: HashMap<u32, f32> = HashMap::with_capacity(pairs.len());
        for (dim, weight) in pairs {
            *merged.entry(dim).or_insert(0.0) += weight;
        }
        let mut entries: Vec<(u32, f32)> = merged.into_iter().collect();
        entries.sort_unstable_by_key(|&(dim, _)| dim);
        Self(entries)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.0.iter().copied()
    }

    /// Dot product via linear merge over the sorted entries
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let mut sum = 0.0;
        let (mut i, mut j) = (0, 0);
        while i < self.0.len() && j < other.0.len() {
            match self.0[i].0.cmp(&other.0[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.0[i].1 * other.0[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    pub fn norm(&self) -> f32 {
        self.0.iter().map(|&(_, w)| w * w).sum::<f32>().sqrt()
    }

    /// Returns the vector scaled to unit L2 norm (unchanged if zero)
    pub fn l2_normalized(mut self) -> Self {
        let norm = self.norm();
        if norm > 0.0 {
            for entry in &mut self.0 {
                entry.1 /= norm;
            }
        }
        self
    }

    pub fn scaled(mut self, factor: f32) -> Self {
        for entry in &mut self.0 {
            entry.1 *= factor;
        }
        self
    }
}

/// Accumulator for building a weighted sum of sparse vectors
#[derive(Debug, Default)]
pub struct SparseAccumulator {
    weights: HashMap<u32, f32>,
}

impl SparseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `weight * vector` to the accumulator
    pub fn add_scaled(&mut self, vector: &SparseVector, weight: f32) {
        for (dim, value) in vector.iter() {
            *self.weights.entry(dim).or_insert(0.0) += value * weight;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn into_vector(self) -> SparseVector {
        SparseVector::from_pairs(self.weights.into_iter().collect())
    }
}
