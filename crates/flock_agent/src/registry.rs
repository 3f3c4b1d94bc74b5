//! Agent registry: owns every live agent of a flock.
//!
//! Agents live in generational slots. Each occupied slot carries `prev`/`next`
//! links so that walking from the head visits agents in exactly the order they
//! were appended, and an identity index gives constant-time lookup and
//! removal. Freed slots are recycled with a bumped generation, so an
//! [`AgentHandle`] held across a removal never resolves to a different agent.

use std::collections::HashMap;

use crate::agent::Agent;
use crate::id::AgentId;

/// Stable reference to a registry slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgentHandle {
    index: u32,
    generation: u32,
}

#[derive(Debug)]
struct Node {
    agent: Agent,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Insertion-ordered collection of all live agents.
///
/// Invariants:
///
/// - Walking `next` links from `head` visits every live agent exactly once
///   and ends at `tail`.
/// - `index` maps each live agent's identity to its slot.
#[derive(Debug, Default)]
pub struct AgentRegistry {
    slots: Vec<Slot>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    index: HashMap<AgentId, usize>,
}

impl AgentRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with room for `capacity` agents.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Returns the number of live agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if no agents are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Add an agent after the current tail.
    ///
    /// Identities are expected to be fresh; the controller draws them from an
    /// [`AgentIdAllocator`](crate::AgentIdAllocator).
    pub fn append(&mut self, agent: Agent) -> AgentHandle {
        debug_assert!(
            !self.index.contains_key(&agent.id()),
            "{} is already registered",
            agent.id()
        );

        let id = agent.id();
        let node = Node {
            agent,
            prev: self.tail,
            next: None,
        };

        let slot_idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx].node = Some(node);
                idx
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                self.slots.len() - 1
            }
        };

        match self.tail {
            Some(tail) => {
                if let Some(tail_node) = self.slots[tail].node.as_mut() {
                    tail_node.next = Some(slot_idx);
                }
            }
            None => self.head = Some(slot_idx),
        }
        self.tail = Some(slot_idx);
        self.index.insert(id, slot_idx);

        self.handle_at(slot_idx)
    }

    /// Returns `true` if an agent with `id` is registered.
    #[must_use]
    pub fn contains(&self, id: AgentId) -> bool {
        self.index.contains_key(&id)
    }

    /// Look up an agent by identity.
    #[must_use]
    pub fn find(&self, id: AgentId) -> Option<&Agent> {
        let idx = *self.index.get(&id)?;
        self.slots[idx].node.as_ref().map(|n| &n.agent)
    }

    /// Look up an agent by identity for mutation.
    #[must_use]
    pub fn find_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        let idx = *self.index.get(&id)?;
        self.slots[idx].node.as_mut().map(|n| &mut n.agent)
    }

    /// Returns the current handle for an identity.
    #[must_use]
    pub fn handle_of(&self, id: AgentId) -> Option<AgentHandle> {
        self.index.get(&id).map(|&idx| self.handle_at(idx))
    }

    /// Resolve a handle. Stale handles resolve to `None`.
    #[must_use]
    pub fn get(&self, handle: AgentHandle) -> Option<&Agent> {
        self.node(handle).map(|n| &n.agent)
    }

    /// Resolve a handle for mutation. Stale handles resolve to `None`.
    #[must_use]
    pub fn get_mut(&mut self, handle: AgentHandle) -> Option<&mut Agent> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.node.as_mut().map(|n| &mut n.agent)
    }

    /// Handle of the first agent in registration order.
    #[must_use]
    pub fn head_handle(&self) -> Option<AgentHandle> {
        self.head.map(|idx| self.handle_at(idx))
    }

    /// Handle of the agent registered after `handle`.
    #[must_use]
    pub fn next_handle(&self, handle: AgentHandle) -> Option<AgentHandle> {
        let next = self.node(handle)?.next?;
        Some(self.handle_at(next))
    }

    /// The first agent in registration order.
    #[must_use]
    pub fn first(&self) -> Option<&Agent> {
        self.head
            .and_then(|idx| self.slots[idx].node.as_ref())
            .map(|n| &n.agent)
    }

    /// Remove the agent with `id`, returning `true` if one was removed.
    ///
    /// Removing an unknown identity is a no-op.
    pub fn delete(&mut self, id: AgentId) -> bool {
        self.remove(id).is_some()
    }

    /// Remove and return the agent with `id`.
    pub fn remove(&mut self, id: AgentId) -> Option<Agent> {
        let idx = self.index.remove(&id)?;
        let node = self.slots[idx].node.take()?;

        match node.prev {
            Some(prev) => {
                if let Some(prev_node) = self.slots[prev].node.as_mut() {
                    prev_node.next = node.next;
                }
            }
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => {
                if let Some(next_node) = self.slots[next].node.as_mut() {
                    next_node.prev = node.prev;
                }
            }
            None => self.tail = node.prev,
        }

        let slot = &mut self.slots[idx];
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(idx);

        Some(node.agent)
    }

    /// Drop every agent. Outstanding handles become stale.
    pub fn clear(&mut self) {
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(idx);
            }
        }
        self.head = None;
        self.tail = None;
        self.index.clear();
    }

    /// Materialise the registry as a random-access snapshot in registration
    /// order.
    #[must_use]
    pub fn to_sequence(&self) -> Vec<&Agent> {
        let mut sequence = Vec::with_capacity(self.len());
        sequence.extend(self.iter());
        sequence
    }

    /// Identities in registration order.
    #[must_use]
    pub fn ids(&self) -> Vec<AgentId> {
        self.iter().map(Agent::id).collect()
    }

    /// Iterate agents in registration order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            registry: self,
            cursor: self.head,
        }
    }

    /// Visit every agent in registration order with mutable access.
    pub fn for_each_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Agent),
    {
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            let Some(node) = self.slots[idx].node.as_mut() else {
                break;
            };
            f(&mut node.agent);
            cursor = node.next;
        }
    }

    fn node(&self, handle: AgentHandle) -> Option<&Node> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn handle_at(&self, idx: usize) -> AgentHandle {
        AgentHandle {
            index: idx as u32,
            generation: self.slots[idx].generation,
        }
    }
}

/// Registration-order iterator over an [`AgentRegistry`].
#[derive(Debug)]
pub struct Iter<'a> {
    registry: &'a AgentRegistry,
    cursor: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Agent;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        let node = self.registry.slots[idx].node.as_ref()?;
        self.cursor = node.next;
        Some(&node.agent)
    }
}

impl<'a> IntoIterator for &'a AgentRegistry {
    type Item = &'a Agent;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use flock_math::Pose2D;

    use super::*;
    use crate::agent::Shade;

    fn agent(id: u64) -> Agent {
        Agent::new(AgentId(id), Pose2D::IDENTITY, id as f32)
    }

    fn registry_with(ids: &[u64]) -> AgentRegistry {
        let mut registry = AgentRegistry::new();
        for &id in ids {
            registry.append(agent(id));
        }
        registry
    }

    fn raw_ids(registry: &AgentRegistry) -> Vec<u64> {
        registry.to_sequence().iter().map(|a| a.id().0).collect()
    }

    #[test]
    fn test_empty_registry() {
        let registry = AgentRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.head_handle().is_none());
        assert!(registry.first().is_none());
        assert!(registry.to_sequence().is_empty());
    }

    #[test]
    fn test_append_preserves_registration_order() {
        let registry = registry_with(&[4, 1, 7, 0, 3]);
        assert_eq!(raw_ids(&registry), vec![4, 1, 7, 0, 3]);
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn test_find_by_id() {
        let registry = registry_with(&[0, 1, 2]);
        assert_eq!(registry.find(AgentId(1)).map(Agent::id), Some(AgentId(1)));
        assert!(registry.find(AgentId(9)).is_none());
    }

    #[test]
    fn test_delete_head_middle_tail() {
        let mut registry = registry_with(&[0, 1, 2, 3, 4]);
        assert!(registry.delete(AgentId(0)));
        assert_eq!(raw_ids(&registry), vec![1, 2, 3, 4]);
        assert!(registry.delete(AgentId(2)));
        assert_eq!(raw_ids(&registry), vec![1, 3, 4]);
        assert!(registry.delete(AgentId(4)));
        assert_eq!(raw_ids(&registry), vec![1, 3]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let mut registry = registry_with(&[0, 1, 2]);
        assert!(!registry.delete(AgentId(42)));
        assert_eq!(raw_ids(&registry), vec![0, 1, 2]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_delete_then_find_reports_not_found() {
        let mut registry = registry_with(&[0, 1, 2]);
        assert!(registry.delete(AgentId(1)));
        assert!(registry.find(AgentId(1)).is_none());
        assert!(!registry.contains(AgentId(1)));
        assert!(!registry.delete(AgentId(1)));
    }

    #[test]
    fn test_delete_only_agent_empties_registry() {
        let mut registry = registry_with(&[5]);
        assert!(registry.delete(AgentId(5)));
        assert!(registry.is_empty());
        assert!(registry.head_handle().is_none());
        registry.append(agent(6));
        assert_eq!(raw_ids(&registry), vec![6]);
    }

    #[test]
    fn test_append_after_delete_goes_to_tail() {
        let mut registry = registry_with(&[0, 1, 2]);
        registry.delete(AgentId(0));
        registry.append(agent(3));
        registry.append(agent(4));
        assert_eq!(raw_ids(&registry), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_sequence_length_tracks_appends_minus_deletes() {
        let mut registry = AgentRegistry::new();
        let mut expected = Vec::new();
        for id in 0..20u64 {
            registry.append(agent(id));
            expected.push(id);
            if id % 3 == 2 {
                let victim = id - 1;
                assert!(registry.delete(AgentId(victim)));
                expected.retain(|&e| e != victim);
            }
        }
        assert_eq!(raw_ids(&registry), expected);
        assert_eq!(registry.len(), expected.len());
    }

    #[test]
    fn test_stale_handle_does_not_resolve() {
        let mut registry = registry_with(&[0]);
        let handle = registry.handle_of(AgentId(0)).unwrap();
        registry.delete(AgentId(0));
        registry.append(agent(1));
        assert!(registry.get(handle).is_none());
        assert!(registry.get_mut(handle).is_none());
    }

    #[test]
    fn test_cursor_walk_matches_iter() {
        let registry = registry_with(&[2, 0, 1]);
        let mut walked = Vec::new();
        let mut cursor = registry.head_handle();
        while let Some(handle) = cursor {
            walked.push(registry.get(handle).unwrap().id().0);
            cursor = registry.next_handle(handle);
        }
        assert_eq!(walked, vec![2, 0, 1]);
    }

    #[test]
    fn test_for_each_mut_visits_all() {
        let mut registry = registry_with(&[0, 1, 2]);
        registry.for_each_mut(|a| a.shade = Shade::Warm);
        assert!(registry.iter().all(|a| a.shade == Shade::Warm));
    }

    #[test]
    fn test_clear() {
        let mut registry = registry_with(&[0, 1, 2]);
        let handle = registry.head_handle().unwrap();
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.get(handle).is_none());
        registry.append(agent(0));
        assert_eq!(raw_ids(&registry), vec![0]);
    }
}
