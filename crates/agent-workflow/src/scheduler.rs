//! Level scheduling
//!
//! Kahn-style topological leveling: every level holds the roles whose
//! dependencies all sit in earlier levels, so the roles of one level can run
//! concurrently. Within a level roles keep their declaration order.

use crate::graph::DependencyGraph;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Result of leveling a dependency graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelPlan {
    /// Levels in execution order
    pub levels: Vec<Vec<String>>,
    /// Roles that could not be leveled because of a cycle; each was placed
    /// in its own trailing level, in declaration order
    pub cyclic_roles: Vec<String>,
}

impl LevelPlan {
    /// Level index of a role
    pub fn level_of(&self, role: &str) -> Option<usize> {
        self.levels
            .iter()
            .position(|level| level.iter().any(|r| r == role))
    }

    /// Total number of roles across all levels
    pub fn role_count(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    /// Whether the graph contained a cycle
    pub fn has_cycle(&self) -> bool {
        !self.cyclic_roles.is_empty()
    }
}

/// Compute execution levels for a dependency graph
pub fn compute_levels(graph: &DependencyGraph) -> LevelPlan {
    let mut remaining = graph.dependency_counts();
    let mut placed: HashSet<&str> = HashSet::new();
    let mut plan = LevelPlan::default();

    let mut ready: Vec<&String> = graph
        .roles()
        .iter()
        .filter(|role| remaining.get(role.as_str()).copied() == Some(0))
        .collect();

    while !ready.is_empty() {
        let level: Vec<String> = ready.iter().map(|r| (*r).clone()).collect();
        debug!("Level {}: {:?}", plan.levels.len(), level);

        let mut unlocked: HashSet<&str> = HashSet::new();
        for role in &ready {
            placed.insert(role.as_str());
            for dependent in graph.dependents_of(role) {
                if let Some(count) = remaining.get_mut(dependent.as_str()) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        unlocked.insert(dependent.as_str());
                    }
                }
            }
        }

        plan.levels.push(level);

        // Next level follows declaration order, not unlock order
        ready = graph
            .roles()
            .iter()
            .filter(|role| unlocked.contains(role.as_str()))
            .collect();
    }

    let stuck: Vec<String> = graph
        .roles()
        .iter()
        .filter(|role| !placed.contains(role.as_str()))
        .cloned()
        .collect();

    if !stuck.is_empty() {
        warn!(
            "Dependency cycle among {:?}; running them one per level in declaration order",
            stuck
        );
        for role in &stuck {
            plan.levels.push(vec![role.clone()]);
        }
        plan.cyclic_roles = stuck;
    }

    plan
}
