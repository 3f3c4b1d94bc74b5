//! Agent identity and allocation.
//!
//! An [`AgentId`] is a plain `u64`. Identities are handed out in creation
//! order starting at zero and are never reused while a session lasts; the
//! allocator is reset only when the flock is stopped.

use serde::{Deserialize, Serialize};

/// A unique agent identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u64);

impl AgentId {
    /// Create an identity from a raw `u64`.
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Agent {}", self.0)
    }
}

/// Allocates monotonically increasing agent identities, starting at 0.
#[derive(Debug, Default)]
pub struct AgentIdAllocator {
    next_id: u64,
}

impl AgentIdAllocator {
    /// Creates a new allocator whose first identity is `AgentId(0)`.
    #[must_use]
    pub fn new() -> Self {
        Self { next_id: 0 }
    }

    /// Allocates a fresh identity.
    pub fn allocate(&mut self) -> AgentId {
        let id = self.next_id;
        self.next_id += 1;
        AgentId(id)
    }

    /// The identity the next call to [`allocate`](Self::allocate) returns.
    #[must_use]
    pub fn peek(&self) -> AgentId {
        AgentId(self.next_id)
    }

    /// Restart numbering at zero.
    pub fn reset(&mut self) {
        self.next_id = 0;
    }
}
