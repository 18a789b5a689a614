//! Draw ranges into merged batches

use serde::{Deserialize, Serialize};

/// Contiguous range `[start, start + count)` of a merged batch
///
/// For mesh batches the unit is indices, for line batches it is vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GeometryGroup {
    /// First element of the range
    pub start: u32,
    /// Number of elements in the range
    pub count: u32,
    /// Optional material slot
    pub material_index: Option<u32>,
}

impl GeometryGroup {
    /// Create a range without a material slot
    pub fn new(start: u32, count: u32) -> Self {
        Self {
            start,
            count,
            material_index: None,
        }
    }

    /// One past the last element
    pub fn end(&self) -> u32 {
        self.start + self.count
    }

    /// Check if the range covers nothing
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether this range overlaps another
    pub fn overlaps(&self, other: &GeometryGroup) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

/// Merge adjacent contiguous ranges that share a material slot
///
/// Input is sorted by `start` first, so the result is sorted and never
/// contains two ranges where one ends exactly where the next begins with the
/// same material.
pub fn compact(groups: &[GeometryGroup]) -> Vec<GeometryGroup> {
    let mut sorted = groups.to_vec();
    sorted.sort_by_key(|g| g.start);

    let mut result: Vec<GeometryGroup> = Vec::with_capacity(sorted.len());
    for group in sorted {
        if let Some(last) = result.last_mut()
            && last.end() == group.start
            && last.material_index == group.material_index
        {
            last.count += group.count;
            continue;
        }
        result.push(group);
    }
    result
}
