//! Index newtypes.
//!
//! `NodeId` addresses the road graph's node arena and `AgentId` the
//! population vector.  Both are plain `u32` slots: ids are never reused while
//! the owning collection lives, so a stale id misses instead of aliasing.

use std::fmt;

macro_rules! typed_id {
    ($(#[$attr:meta])* $name:ident, $label:literal) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub u32);

        impl $name {
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, " {}"), self.0)
            }
        }

        /// Fails once the arena outgrows `u32`.
        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<Self, Self::Error> {
                u32::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Position of an evacuee in the population.
    AgentId, "agent"
}

typed_id! {
    /// Slot of a road node.  Removing other nodes leaves it valid.
    NodeId, "node"
}
