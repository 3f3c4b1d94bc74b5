//! Temperature partition pass.
//!
//! Once per tick every agent except the highlighted one is shaded
//! [`Shade::Cool`] or [`Shade::Warm`] by comparing its temperature with a
//! pivot: the temperature of the first agent in the tick's materialised
//! sequence. This is the partition step of a quicksort used purely for
//! classification. Registry order is never touched and steering never reads
//! the result.

use flock_agent::{Agent, AgentId, AgentRegistry, Shade};

/// Counts from one partition pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartitionSummary {
    /// Agents at or below the pivot.
    pub low: usize,
    /// Agents above the pivot.
    pub high: usize,
    /// Agents left alone because they are highlighted.
    pub skipped: usize,
}

/// Pivot temperature for a materialised sequence, `None` when it is empty.
#[must_use]
pub fn pivot_temperature(sequence: &[&Agent]) -> Option<f32> {
    sequence.first().map(|agent| agent.temperature)
}

/// Shade every agent except `highlighted` by comparing against `pivot`.
pub fn classify_by_temperature(
    registry: &mut AgentRegistry,
    pivot: f32,
    highlighted: Option<AgentId>,
) -> PartitionSummary {
    let mut summary = PartitionSummary::default();
    registry.for_each_mut(|agent| {
        if highlighted == Some(agent.id()) {
            summary.skipped += 1;
            return;
        }
        if agent.temperature <= pivot {
            agent.shade = Shade::Cool;
            summary.low += 1;
        } else {
            agent.shade = Shade::Warm;
            summary.high += 1;
        }
    });
    summary
}

#[cfg(test)]
mod tests {
    use flock_math::Pose2D;

    use super::*;

    fn registry_with_temperatures(temperatures: &[f32]) -> AgentRegistry {
        let mut registry = AgentRegistry::new();
        for (i, &t) in temperatures.iter().enumerate() {
            registry.append(Agent::new(AgentId(i as u64), Pose2D::IDENTITY, t));
        }
        registry
    }

    fn shades(registry: &AgentRegistry) -> Vec<Shade> {
        registry.iter().map(|a| a.shade).collect()
    }

    #[test]
    fn test_pivot_is_first_element() {
        let registry = registry_with_temperatures(&[5.0, 3.0, 8.0]);
        assert_eq!(pivot_temperature(&registry.to_sequence()), Some(5.0));
        assert_eq!(pivot_temperature(&[]), None);
    }

    #[test]
    fn test_partition_known_temperatures() {
        let mut registry = registry_with_temperatures(&[5.0, 3.0, 8.0, 1.0, 9.0]);
        let pivot = pivot_temperature(&registry.to_sequence()).unwrap();
        let summary = classify_by_temperature(&mut registry, pivot, None);

        assert_eq!(
            shades(&registry),
            vec![Shade::Cool, Shade::Cool, Shade::Warm, Shade::Cool, Shade::Warm]
        );
        assert_eq!(
            summary,
            PartitionSummary {
                low: 3,
                high: 2,
                skipped: 0
            }
        );
    }

    #[test]
    fn test_partition_skips_highlighted() {
        let mut registry = registry_with_temperatures(&[5.0, 3.0, 8.0, 1.0, 9.0]);
        registry.find_mut(AgentId(2)).unwrap().shade = Shade::Highlighted;
        let summary = classify_by_temperature(&mut registry, 5.0, Some(AgentId(2)));

        assert_eq!(
            shades(&registry),
            vec![Shade::Cool, Shade::Cool, Shade::Highlighted, Shade::Cool, Shade::Warm]
        );
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn test_partition_does_not_reorder() {
        let mut registry = registry_with_temperatures(&[9.0, 1.0, 5.0, 3.0]);
        let before = registry.ids();
        classify_by_temperature(&mut registry, 4.0, None);
        assert_eq!(registry.ids(), before);
    }
}
