//! Hierarchical NDN names.

use std::{fmt, str::FromStr, sync::Arc};

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use super::{Component, PacketError};
use crate::tlv::{Block, TlvWriter, types};

/// An immutable sequence of [`Component`]s.
///
/// Components live behind an `Arc` so names can be cloned into spawned
/// request tasks cheaply.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name {
    components: Arc<[Component]>,
}

impl Name {
    /// The empty name `/`.
    #[must_use]
    pub fn root() -> Self { Self::default() }

    /// Build a name from components.
    #[must_use]
    pub fn from_components(components: Vec<Component>) -> Self {
        Self {
            components: components.into(),
        }
    }

    /// Number of components.
    #[must_use]
    pub fn len(&self) -> usize { self.components.len() }

    /// Whether this is the root name.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.components.is_empty() }

    /// Component at `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Component> { self.components.get(index) }

    /// Last component, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Component> { self.components.last() }

    /// Iterate over the components.
    pub fn iter(&self) -> impl Iterator<Item = &Component> { self.components.iter() }

    /// Return a new name with `component` appended.
    #[must_use]
    pub fn append(&self, component: Component) -> Self {
        let mut components = self.components.to_vec();
        components.push(component);
        Self::from_components(components)
    }

    /// Return the first `len` components as a new name.
    #[must_use]
    pub fn prefix(&self, len: usize) -> Self {
        let len = len.min(self.len());
        Self::from_components(self.components[..len].to_vec())
    }

    /// Whether `self` is a (non-strict) prefix of `other`.
    #[must_use]
    pub fn is_prefix_of(&self, other: &Name) -> bool {
        self.len() <= other.len()
            && self
                .components
                .iter()
                .zip(other.components.iter())
                .all(|(a, b)| a == b)
    }

    /// Decode a Name element.
    ///
    /// # Errors
    ///
    /// Returns an error when the block is not a Name or a component is malformed.
    pub fn from_block(block: &Block) -> Result<Self, PacketError> {
        if block.typ() != types::NAME {
            return Err(PacketError::UnexpectedType {
                expected: types::NAME,
                found: block.typ(),
            });
        }
        let components = block
            .children()?
            .iter()
            .map(Component::from_block)
            .collect();
        Ok(Self::from_components(components))
    }

    /// Encode as a Name element.
    #[must_use]
    pub fn to_block(&self) -> Block {
        let mut writer = TlvWriter::new();
        for component in self.iter() {
            writer.put_block(&component.to_block());
        }
        writer.into_block(types::NAME)
    }

    /// Wire encoding of the Name element.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes { self.to_block().to_bytes() }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("/");
        }
        for component in self.iter() {
            write!(f, "/{component}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Name({self})") }
}

impl FromStr for Name {
    type Err = PacketError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.strip_prefix("ndn:").unwrap_or(text);
        let Some(path) = trimmed.strip_prefix('/') else {
            return Err(PacketError::InvalidUri(text.to_owned()));
        };
        let components = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<Component>, _>>()?;
        Ok(Self::from_components(components))
    }
}

/// Names travel to the backend in URI form.
impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}
