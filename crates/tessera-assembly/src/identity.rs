//! Assembly identities and the allocator that hands them out.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity shared by every piece of one connected assembly.
///
/// Zero is the "unassigned" sentinel carried by freshly authored pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct AssemblyId(pub u64);

impl AssemblyId {
    /// The unassigned sentinel.
    pub const UNASSIGNED: Self = Self(0);

    /// Whether this identity has been allocated.
    pub fn is_assigned(self) -> bool {
        self != Self::UNASSIGNED
    }
}

impl fmt::Display for AssemblyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic source of assembly identities.
///
/// Owned by a [`Board`](crate::Board); every board numbers its own
/// assemblies. Identities start above the sentinel and are never reused.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Allocator whose first identity is 1.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Hand out the next identity.
    pub fn allocate(&mut self) -> AssemblyId {
        let id = AssemblyId(self.next);
        // never wraps back to the sentinel
        self.next = self.next.saturating_add(1);
        id
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_strictly_increasing() {
        let mut ids = IdAllocator::new();
        let a = ids.allocate();
        let b = ids.allocate();
        let c = ids.allocate();
        assert!(a.is_assigned());
        assert!(a < b && b < c);
        assert_eq!(ids.allocate(), AssemblyId(4));
    }

    #[test]
    fn test_unassigned_sentinel() {
        assert!(!AssemblyId::default().is_assigned());
        assert_eq!(AssemblyId::UNASSIGNED.to_string(), "#0");
    }
}
