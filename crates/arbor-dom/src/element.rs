//! Element payload: tag name, attributes, class bloom signature.
//!
//! Attribute storage is inline for up to four attributes and spills to a
//! heap vector past that; most elements never allocate. All names and
//! values are `StrId`s into the owning document's region.
//!
//! The class bloom is one 64-bit word with two bits set per class token.
//! It can report a class the element does not have (harmless, the exact
//! check follows) but never misses one it does have.

use crate::region::{Region, StrId};

/// A single attribute. Lookup by qualified name matches the first entry
/// irrespective of namespace.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Attr {
    pub(crate) name: StrId,
    pub(crate) namespace: Option<StrId>,
    pub(crate) value: StrId,
}

/// Inline attribute threshold before spilling to the heap.
const INLINE_ATTRS: usize = 4;

/// Attribute list preserving insertion order.
#[derive(Debug)]
pub(crate) enum AttrList {
    /// Inline storage, no heap allocation.
    Inline {
        data: [Option<Attr>; INLINE_ATTRS],
        len: u8,
    },
    /// Heap storage once the inline capacity is exceeded.
    Heap(Vec<Attr>),
}

impl AttrList {
    pub(crate) fn new() -> Self {
        Self::Inline {
            data: [None; INLINE_ATTRS],
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Inline { len, .. } => *len as usize,
            Self::Heap(attrs) => attrs.len(),
        }
    }

    pub(crate) fn push(&mut self, attr: Attr) {
        match self {
            Self::Inline { data, len } => {
                if (*len as usize) < INLINE_ATTRS {
                    data[*len as usize] = Some(attr);
                    *len += 1;
                } else {
                    let mut spilled = Vec::with_capacity(INLINE_ATTRS * 2);
                    for slot in data.iter_mut() {
                        if let Some(existing) = slot.take() {
                            spilled.push(existing);
                        }
                    }
                    spilled.push(attr);
                    *self = Self::Heap(spilled);
                }
            }
            Self::Heap(attrs) => attrs.push(attr),
        }
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Attr> {
        match self {
            Self::Inline { data, len } => {
                if index < *len as usize {
                    data[index].as_ref()
                } else {
                    None
                }
            }
            Self::Heap(attrs) => attrs.get(index),
        }
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Attr> {
        match self {
            Self::Inline { data, len } => {
                if index < *len as usize {
                    data[index].as_mut()
                } else {
                    None
                }
            }
            Self::Heap(attrs) => attrs.get_mut(index),
        }
    }

    /// Remove by index, preserving the order of later entries.
    pub(crate) fn remove(&mut self, index: usize) -> Option<Attr> {
        match self {
            Self::Inline { data, len } => {
                if index >= *len as usize {
                    return None;
                }
                let removed = data[index].take();
                for i in index..(*len as usize - 1) {
                    data[i] = data[i + 1].take();
                }
                *len -= 1;
                removed
            }
            Self::Heap(attrs) => {
                if index < attrs.len() {
                    Some(attrs.remove(index))
                } else {
                    None
                }
            }
        }
    }

    pub(crate) fn iter(&self) -> AttrIter<'_> {
        AttrIter {
            list: self,
            index: 0,
        }
    }
}

pub(crate) struct AttrIter<'a> {
    list: &'a AttrList,
    index: usize,
}

impl<'a> Iterator for AttrIter<'a> {
    type Item = &'a Attr;

    fn next(&mut self) -> Option<Self::Item> {
        let attr = self.list.get(self.index)?;
        self.index += 1;
        Some(attr)
    }
}

/// Element-specific node payload.
#[derive(Debug)]
pub struct ElementData {
    /// Tag name, stored in the document region.
    pub(crate) name: StrId,
    /// Attributes in insertion order.
    pub(crate) attrs: AttrList,
    /// Bloom signature over current class tokens.
    pub(crate) class_bloom: u64,
}

impl ElementData {
    pub(crate) fn new(name: StrId) -> Self {
        Self {
            name,
            attrs: AttrList::new(),
            class_bloom: 0,
        }
    }

    /// Tag name as stored (original case).
    pub(crate) fn tag_name<'r>(&self, region: &'r Region) -> &'r str {
        region.resolve(self.name)
    }

    /// Index of the first attribute with this qualified name, ignoring
    /// namespaces. First-match lookup is a spec-compliance requirement.
    pub(crate) fn find_attr(&self, region: &Region, name: &str) -> Option<usize> {
        self.attrs
            .iter()
            .position(|attr| region.resolve(attr.name) == name)
    }

    /// Value of the first attribute with this qualified name.
    pub(crate) fn attr_value<'r>(&self, region: &'r Region, name: &str) -> Option<&'r str> {
        let index = self.find_attr(region, name)?;
        self.attrs.get(index).map(|attr| region.resolve(attr.value))
    }

    /// The `id` attribute value, if any.
    pub(crate) fn id<'r>(&self, region: &'r Region) -> Option<&'r str> {
        self.attr_value(region, "id")
    }

    /// The raw `class` attribute value, if any.
    pub(crate) fn class_name<'r>(&self, region: &'r Region) -> Option<&'r str> {
        self.attr_value(region, "class")
    }

    /// Exact class membership check, bloom-gated.
    ///
    /// The bloom test rejects most non-members with a single AND; only a
    /// bloom hit walks the live token list.
    pub(crate) fn has_class(&self, region: &Region, token: &str) -> bool {
        let mask = bloom_mask(token);
        if self.class_bloom & mask != mask {
            return false;
        }
        self.class_name(region)
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == token))
    }

    /// Recompute the bloom signature from the current class attribute.
    /// Called whenever the class attribute changes.
    pub(crate) fn recompute_bloom(&mut self, region: &Region) {
        let mut bloom = 0u64;
        if let Some(classes) = self.class_name(region) {
            for token in classes.split_ascii_whitespace() {
                bloom |= bloom_mask(token);
            }
        }
        self.class_bloom = bloom;
    }
}

/// Two-bit bloom mask for a class token (FNV-1a halves).
pub(crate) fn bloom_mask(token: &str) -> u64 {
    let hash = fnv1a(token);
    (1u64 << (hash & 63)) | (1u64 << ((hash >> 32) & 63))
}

fn fnv1a(text: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in text.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
