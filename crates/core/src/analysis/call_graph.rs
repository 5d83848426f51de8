//! Whole-pass call graph: one node per decoded method, one edge per distinct
//! `(caller, statically declared target)` pair.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::{ClassArena, FieldAccess, LineRange, MethodId, MethodModel};

/// Multiplicity of one edge. Direct invocations and lambda captures are counted apart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEdge {
    pub invocations: u32,
    pub closures: u32,
}

impl CallEdge {
    pub fn is_closure_only(&self) -> bool {
        self.invocations == 0 && self.closures > 0
    }
}

/// Per-method facts carried over from the decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodNode {
    pub field_accesses: BTreeSet<FieldAccess>,
    pub line_range: Option<LineRange>,
}

#[derive(Debug, Default, Clone)]
pub struct CallGraph {
    nodes: BTreeMap<MethodId, MethodNode>,
    edges: BTreeMap<MethodId, BTreeMap<MethodId, CallEdge>>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph over every method of the arena.
    pub fn build(arena: &ClassArena) -> Self {
        let mut graph = CallGraph::new();
        for method in arena.methods() {
            graph.add_method(method);
        }
        graph
    }

    /// Fold one method's facts into the graph. Adding the same method twice sums its counts.
    pub fn add_method(&mut self, method: &MethodModel) {
        let node = self.nodes.entry(method.id.clone()).or_default();
        node.field_accesses.extend(method.field_accesses.iter().cloned());
        node.line_range = match (node.line_range, method.line_range) {
            (Some(existing), Some(range)) => Some(existing.include(range.start).include(range.end)),
            (existing, range) => existing.or(range),
        };

        let out = self.edges.entry(method.id.clone()).or_default();
        for (target, count) in &method.called_methods {
            out.entry(target.clone()).or_default().invocations += count;
        }
        for lambda in &method.lambda_implementations {
            out.entry(lambda.implementation.clone()).or_default().closures += 1;
        }
    }

    pub fn node(&self, id: &MethodId) -> Option<&MethodNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &MethodId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Outgoing edges of `id`, ordered by target.
    pub fn callees<'g>(&'g self, id: &MethodId) -> impl Iterator<Item = (&'g MethodId, &'g CallEdge)> + 'g {
        self.edges.get(id).into_iter().flat_map(|targets| targets.iter())
    }

    /// Every edge as `(caller, target, edge)`, ordered by caller then target.
    pub fn edges(&self) -> impl Iterator<Item = (&MethodId, &MethodId, &CallEdge)> {
        self.edges
            .iter()
            .flat_map(|(from, targets)| targets.iter().map(move |(to, edge)| (from, to, edge)))
    }

    /// Field accesses a method performs on fields named with `owner` as their class.
    pub fn accesses_on<'g>(
        &'g self,
        id: &MethodId,
        owner: &'g str,
    ) -> impl Iterator<Item = &'g FieldAccess> + 'g {
        self.nodes
            .get(id)
            .into_iter()
            .flat_map(|node| node.field_accesses.iter())
            .filter(move |access| access.owner == owner)
    }

    pub fn line_range(&self, id: &MethodId) -> Option<LineRange> {
        self.nodes.get(id)?.line_range
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeMap::len).sum()
    }
}
