//! Dependency graph construction
//!
//! Turns the flat registry plus declared dependencies into an adjacency
//! structure. Dangling edges are dropped with a warning, and a registry
//! without any declared dependency becomes a linear chain in declaration
//! order so that older configurations keep their sequential behavior.

use crate::descriptor::TaskRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

/// A directed edge: `to` depends on `from`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Upstream role
    pub from: String,
    /// Downstream role
    pub to: String,
}

/// Dependency graph of one workflow
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Roles in declaration order
    roles: Vec<String>,
    /// Resolved dependencies of each role, in declaration order
    dependencies: HashMap<String, Vec<String>>,
    /// `dependents[role]` lists the roles that depend on `role`
    dependents: HashMap<String, Vec<String>>,
    /// Problems found while building the graph
    warnings: Vec<String>,
    linear_fallback: bool,
}

impl DependencyGraph {
    /// Build the graph from a task registry
    pub fn build(registry: &TaskRegistry) -> Self {
        let roles: Vec<String> = registry.roles().into_iter().map(String::from).collect();
        let mut graph = Self {
            dependencies: roles.iter().map(|r| (r.clone(), Vec::new())).collect(),
            dependents: roles.iter().map(|r| (r.clone(), Vec::new())).collect(),
            roles,
            warnings: Vec::new(),
            linear_fallback: false,
        };

        let declares_any = registry.iter().any(|d| !d.dependencies.is_empty());

        if !declares_any {
            if graph.roles.len() > 1 {
                info!(
                    "No dependencies declared, chaining {} roles in declaration order",
                    graph.roles.len()
                );
            }
            graph.linear_fallback = true;
            let chain: Vec<(String, String)> = graph
                .roles
                .windows(2)
                .map(|pair| (pair[0].clone(), pair[1].clone()))
                .collect();
            for (from, to) in chain {
                graph.add_edge(&from, &to);
            }
            return graph;
        }

        for descriptor in registry.iter() {
            for dep in &descriptor.dependencies {
                if dep == &descriptor.role {
                    graph.warn(format!(
                        "Role '{}' depends on itself; dependency dropped",
                        descriptor.role
                    ));
                } else if !registry.contains(dep) {
                    graph.warn(format!(
                        "Role '{}' depends on unknown role '{}'; dependency dropped",
                        descriptor.role, dep
                    ));
                } else {
                    graph.add_edge(dep, &descriptor.role);
                }
            }
        }

        graph
    }

    fn add_edge(&mut self, from: &str, to: &str) {
        if let Some(deps) = self.dependencies.get_mut(to) {
            deps.push(from.to_string());
        }
        if let Some(dependents) = self.dependents.get_mut(from) {
            dependents.push(to.to_string());
        }
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }

    /// Roles in declaration order
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Resolved dependencies of a role
    pub fn dependencies_of(&self, role: &str) -> &[String] {
        self.dependencies.get(role).map_or(&[], Vec::as_slice)
    }

    /// Roles that depend on a role
    pub fn dependents_of(&self, role: &str) -> &[String] {
        self.dependents.get(role).map_or(&[], Vec::as_slice)
    }

    /// Number of resolved dependencies of every role
    pub fn dependency_counts(&self) -> HashMap<String, usize> {
        self.dependencies
            .iter()
            .map(|(role, deps)| (role.clone(), deps.len()))
            .collect()
    }

    /// All edges, ordered by downstream role then dependency declaration order
    pub fn edges(&self) -> Vec<Edge> {
        self.roles
            .iter()
            .flat_map(|to| {
                self.dependencies_of(to).iter().map(move |from| Edge {
                    from: from.clone(),
                    to: to.clone(),
                })
            })
            .collect()
    }

    /// Warnings collected while building the graph
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Whether the linear chain was synthesized because nothing declared dependencies
    pub fn is_linear_fallback(&self) -> bool {
        self.linear_fallback
    }
}
