//! Wire labels and ordered wire collections.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};

/// An opaque, hashable label denoting a qubit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Wire {
    /// Integer label.
    Int(i64),
    /// String label.
    Label(String),
}

impl fmt::Display for Wire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Wire::Int(i) => write!(f, "{i}"),
            Wire::Label(s) => write!(f, "'{s}'"),
        }
    }
}

impl From<i64> for Wire {
    fn from(id: i64) -> Self {
        Wire::Int(id)
    }
}

impl From<i32> for Wire {
    fn from(id: i32) -> Self {
        Wire::Int(i64::from(id))
    }
}

impl From<u32> for Wire {
    fn from(id: u32) -> Self {
        Wire::Int(i64::from(id))
    }
}

impl From<usize> for Wire {
    fn from(id: usize) -> Self {
        Wire::Int(i64::try_from(id).unwrap_or(i64::MAX))
    }
}

impl From<&str> for Wire {
    fn from(label: &str) -> Self {
        Wire::Label(label.to_string())
    }
}

impl From<String> for Wire {
    fn from(label: String) -> Self {
        Wire::Label(label)
    }
}

impl From<&Wire> for Wire {
    fn from(wire: &Wire) -> Self {
        wire.clone()
    }
}

/// An ordered sequence of wires an operator acts on.
///
/// Order matters: for a controlled gate the control wires come first, and
/// matrices are laid out with the first wire as the most significant bit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wires(Vec<Wire>);

impl Wires {
    /// Create a wire sequence from anything convertible to wires.
    pub fn new<W: Into<Wire>>(wires: impl IntoIterator<Item = W>) -> Self {
        Wires(wires.into_iter().map(Into::into).collect())
    }

    /// An empty wire sequence.
    pub fn empty() -> Self {
        Wires(Vec::new())
    }

    /// Number of wires.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no wires.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the wires in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Wire> {
        self.0.iter()
    }

    /// The wires as a slice.
    pub fn as_slice(&self) -> &[Wire] {
        &self.0
    }

    /// Wire at position `i`.
    pub fn get(&self, i: usize) -> Option<&Wire> {
        self.0.get(i)
    }

    /// Whether `wire` is one of these wires.
    pub fn contains(&self, wire: &Wire) -> bool {
        self.0.contains(wire)
    }

    /// Position of `wire` in this sequence.
    pub fn index_of(&self, wire: &Wire) -> Option<usize> {
        self.0.iter().position(|w| w == wire)
    }

    /// Whether no wire is shared with `other`.
    pub fn is_disjoint(&self, other: &Wires) -> bool {
        !self.0.iter().any(|w| other.contains(w))
    }

    /// Wires of `self` that also appear in `other`, in `self`'s order.
    pub fn shared(&self, other: &Wires) -> Wires {
        Wires(
            self.0
                .iter()
                .filter(|w| other.contains(w))
                .cloned()
                .collect(),
        )
    }

    /// `self` followed by the wires of `other` not already present.
    pub fn union(&self, other: &Wires) -> Wires {
        let mut out = self.0.clone();
        for w in &other.0 {
            if !out.contains(w) {
                out.push(w.clone());
            }
        }
        Wires(out)
    }

    /// Whether both sequences contain the same wires, ignoring order.
    pub fn same_set(&self, other: &Wires) -> bool {
        self.len() == other.len() && self.0.iter().all(|w| other.contains(w))
    }

    /// Sub-sequence `range` of the wires.
    pub fn slice(&self, range: std::ops::Range<usize>) -> Wires {
        Wires(self.0[range].to_vec())
    }

    /// Fail with [`IrError::DuplicateWire`] if a wire repeats.
    pub fn ensure_unique(&self, name: &str) -> IrResult<()> {
        let mut seen = FxHashSet::default();
        for w in &self.0 {
            if !seen.insert(w) {
                return Err(IrError::DuplicateWire {
                    wire: w.clone(),
                    name: Some(name.to_string()),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for Wires {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, w) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{w}")?;
        }
        write!(f, "]")
    }
}

impl<'a> IntoIterator for &'a Wires {
    type Item = &'a Wire;
    type IntoIter = std::slice::Iter<'a, Wire>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Wire> for Wires {
    fn from_iter<I: IntoIterator<Item = Wire>>(iter: I) -> Self {
        Wires(iter.into_iter().collect())
    }
}

impl From<Vec<Wire>> for Wires {
    fn from(wires: Vec<Wire>) -> Self {
        Wires(wires)
    }
}
