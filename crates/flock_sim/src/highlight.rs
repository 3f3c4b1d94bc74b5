//! Operator highlight.
//!
//! Finding an agent is a plain registry lookup; this module owns the visual
//! side: at most one agent wears [`Shade::Highlighted`], and every other
//! agent is reset to [`Shade::Default`] whenever the highlight changes.

use flock_agent::{AgentId, AgentRegistry, Shade};

/// Reset all shades, then highlight `target` if it is registered.
///
/// Returns the identity that ended up highlighted.
pub fn apply_highlight(registry: &mut AgentRegistry, target: Option<AgentId>) -> Option<AgentId> {
    registry.for_each_mut(|agent| agent.shade = Shade::Default);

    let id = target?;
    let agent = registry.find_mut(id)?;
    agent.shade = Shade::Highlighted;
    Some(id)
}
