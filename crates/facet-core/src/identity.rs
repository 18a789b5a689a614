//! Identity encoding
//!
//! Maps `(kind, parent item, local index)` to a stable name and to a 64-bit
//! pick id. Pick ids are what the GPU picking pass writes per pixel (as two
//! `u32` words of an `Rg32Uint` target), so the encoding is dense and
//! reversible.
//!
//! ```text
//!  63   61 60            29 28           0
//! +-------+----------------+--------------+
//! |  tag  |  parent name   |    index     |
//! +-------+----------------+--------------+
//! ```
//!
//! The parent field holds any [`SimpleName`]. Tag 0 is reserved for
//! "nothing under the cursor".

use std::fmt;

use facet_kernel::ItemType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kernel-assigned name of a top-level item
pub type SimpleName = u32;

const TAG_BITS: u32 = 3;
const PARENT_BITS: u32 = SimpleName::BITS;
const INDEX_BITS: u32 = 29;

/// Largest parent name that fits in a pick id
pub const MAX_PARENT: SimpleName = SimpleName::MAX;
/// Largest local index that fits in a pick id
pub const MAX_INDEX: u32 = (1 << INDEX_BITS) - 1;

const TAG_ITEM: u64 = 5;

/// Identity encoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Local index does not fit in the index field
    #[error("Local index {0} exceeds {MAX_INDEX}")]
    IndexOutOfRange(u32),
}

/// Kind of a topology item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TopologyKind {
    /// Face of a solid
    Face,
    /// Edge of a solid
    Edge,
    /// Segment of a space curve
    CurveSegment,
    /// Control point of a space curve
    ControlPoint,
}

impl TopologyKind {
    /// Prefix used in topology names
    pub fn prefix(self) -> &'static str {
        match self {
            TopologyKind::Face => "face",
            TopologyKind::Edge => "edge",
            TopologyKind::CurveSegment => "curve-segment",
            TopologyKind::ControlPoint => "control-point",
        }
    }

    fn tag(self) -> u64 {
        match self {
            TopologyKind::Face => 1,
            TopologyKind::Edge => 2,
            TopologyKind::CurveSegment => 3,
            TopologyKind::ControlPoint => 4,
        }
    }

    fn from_tag(tag: u64) -> Option<Self> {
        match tag {
            1 => Some(TopologyKind::Face),
            2 => Some(TopologyKind::Edge),
            3 => Some(TopologyKind::CurveSegment),
            4 => Some(TopologyKind::ControlPoint),
            _ => None,
        }
    }
}

/// Kind of a top-level scene item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// B-rep solid
    Solid,
    /// Space curve instance
    Curve,
    /// Surface instance
    Surface,
    /// Planar region instance
    Region,
}

impl ItemKind {
    /// Prefix used in item names
    pub fn prefix(self) -> &'static str {
        match self {
            ItemKind::Solid => "solid",
            ItemKind::Curve => "curve",
            ItemKind::Surface => "surface",
            ItemKind::Region => "region",
        }
    }

    fn code(self) -> u32 {
        match self {
            ItemKind::Solid => 0,
            ItemKind::Curve => 1,
            ItemKind::Surface => 2,
            ItemKind::Region => 3,
        }
    }

    fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(ItemKind::Solid),
            1 => Some(ItemKind::Curve),
            2 => Some(ItemKind::Surface),
            3 => Some(ItemKind::Region),
            _ => None,
        }
    }
}

impl From<ItemType> for ItemKind {
    fn from(item_type: ItemType) -> Self {
        match item_type {
            ItemType::Solid => ItemKind::Solid,
            ItemType::Curve => ItemKind::Curve,
            ItemType::Surface => ItemKind::Surface,
            ItemType::Region => ItemKind::Region,
        }
    }
}

/// Identity of a topology item within its parent item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Topology kind
    pub kind: TopologyKind,
    /// Name of the owning item
    pub parent: SimpleName,
    /// Index within the owning item
    pub index: u32,
}

impl Identity {
    /// Create a new identity
    pub fn new(kind: TopologyKind, parent: SimpleName, index: u32) -> Self {
        Self {
            kind,
            parent,
            index,
        }
    }

    /// Pick id of this identity
    ///
    /// # Panics
    /// If the index is out of range.
    pub fn pick_id(&self) -> PickId {
        encode(self.kind, self.parent, self.index)
    }

    /// Stable topology name, e.g. `face,12,3`
    pub fn name(&self) -> String {
        name(self.kind, self.parent, self.index)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.kind.prefix(), self.parent, self.index)
    }
}

/// Integer id written into the pick buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct PickId(pub u64);

impl PickId {
    /// Background / nothing picked
    pub const NONE: PickId = PickId(0);

    /// Check if this is the background id
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Split into an `Rg32Uint` texel, low word first
    pub fn to_words(self) -> [u32; 2] {
        [self.0 as u32, (self.0 >> 32) as u32]
    }

    /// Join an `Rg32Uint` texel read back from the pick buffer
    pub fn from_words(words: [u32; 2]) -> Self {
        PickId(u64::from(words[0]) | (u64::from(words[1]) << 32))
    }
}

/// What a decoded pick id refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickTarget {
    /// A face, edge, curve segment or control point
    Topology(Identity),
    /// A whole item picked without sub-element resolution
    Item {
        /// Item kind
        kind: ItemKind,
        /// Item name
        parent: SimpleName,
    },
}

fn pack(tag: u64, parent: SimpleName, index: u32) -> Result<PickId, IdentityError> {
    if index > MAX_INDEX {
        return Err(IdentityError::IndexOutOfRange(index));
    }
    Ok(PickId(
        (tag << (PARENT_BITS + INDEX_BITS)) | (u64::from(parent) << INDEX_BITS) | u64::from(index),
    ))
}

/// Encode a topology identity, reporting an out-of-range index
pub fn try_encode(
    kind: TopologyKind,
    parent: SimpleName,
    index: u32,
) -> Result<PickId, IdentityError> {
    pack(kind.tag(), parent, index)
}

/// Encode a topology identity
///
/// # Panics
/// If `index` exceeds [`MAX_INDEX`].
pub fn encode(kind: TopologyKind, parent: SimpleName, index: u32) -> PickId {
    match try_encode(kind, parent, index) {
        Ok(id) => id,
        Err(e) => panic!("cannot encode {} {}/{}: {}", kind.prefix(), parent, index, e),
    }
}

/// Encode a whole-item pick id
///
/// Every item name fits, so this cannot fail; the `Result` mirrors
/// [`try_encode`] for callers that build both kinds of id.
pub fn try_encode_item(kind: ItemKind, parent: SimpleName) -> Result<PickId, IdentityError> {
    pack(TAG_ITEM, parent, kind.code())
}

/// Encode a whole-item pick id
pub fn encode_item(kind: ItemKind, parent: SimpleName) -> PickId {
    let tag = TAG_ITEM << (PARENT_BITS + INDEX_BITS);
    PickId(tag | (u64::from(parent) << INDEX_BITS) | u64::from(kind.code()))
}

/// Stable topology name
pub fn name(kind: TopologyKind, parent: SimpleName, index: u32) -> String {
    format!("{},{},{}", kind.prefix(), parent, index)
}

/// Decode a pick id read back from the pick buffer
pub fn decode(id: PickId) -> Option<PickTarget> {
    let tag = id.0 >> (PARENT_BITS + INDEX_BITS);
    let parent = ((id.0 >> INDEX_BITS) & u64::from(MAX_PARENT)) as SimpleName;
    let index = (id.0 & u64::from(MAX_INDEX)) as u32;

    if tag == TAG_ITEM {
        return ItemKind::from_code(index).map(|kind| PickTarget::Item { kind, parent });
    }
    TopologyKind::from_tag(tag).map(|kind| PickTarget::Topology(Identity::new(kind, parent, index)))
}

const _: () = assert!(TAG_BITS + PARENT_BITS + INDEX_BITS == u64::BITS);
