//! Field Requirement Resolver.
//!
//! For every call-graph edge into a method of a resolved repository, collect
//! the fields of that repository's aggregate root reachable from the calling
//! method. Two walks are involved:
//!
//! - inside the aggregate: from an aggregate method, follow only edges whose
//!   target is owned by the aggregate. Results are memoized per method.
//! - from the caller: follow every edge (helpers and lambda bodies included).
//!   Each edge that crosses into the aggregate is an entry point and
//!   contributes its memoized subset.
//!
//! Both walks keep a visited set, so cycles terminate. The caller walk is
//! breadth-first, so `max_call_depth` counts the shortest helper chain.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::call_graph::CallGraph;
use crate::domain::RepositoryIndex;
use crate::model::{ClassArena, LineRange, MethodId};

/// One aggregate method reached from a caller, with the fields it needs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CalledAggregateMethod {
    pub method: MethodId,
    pub required_fields: BTreeSet<String>,
}

/// Result for one `(caller, repository class, repository method)` call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredFieldsRecord {
    pub caller: MethodId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_lines: Option<LineRange>,
    pub repository: String,
    pub repository_method: MethodId,
    pub aggregate_root: String,
    /// Sorted by method name, then descriptor.
    pub called_aggregate_root_methods: Vec<CalledAggregateMethod>,
    pub required_fields: BTreeSet<String>,
}

/// What a caller needs from one aggregate root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerRequirements {
    pub entry_points: BTreeMap<MethodId, BTreeSet<String>>,
    pub required_fields: BTreeSet<String>,
}

pub struct RequirementResolver<'a> {
    graph: &'a CallGraph,
    arena: &'a ClassArena,
    repositories: &'a RepositoryIndex,
    max_call_depth: Option<u32>,
    /// Keyed by aggregate root, then method.
    memo: BTreeMap<String, BTreeMap<MethodId, BTreeSet<String>>>,
}

impl<'a> RequirementResolver<'a> {
    pub fn new(graph: &'a CallGraph, arena: &'a ClassArena, repositories: &'a RepositoryIndex) -> Self {
        Self { graph, arena, repositories, max_call_depth: None, memo: BTreeMap::new() }
    }

    /// Bound the number of non-aggregate helper hops followed from a caller.
    pub fn with_max_call_depth(mut self, depth: Option<u32>) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Produce one record per repository call site, ordered by caller then repository method.
    pub fn resolve_all(&mut self) -> Vec<RequiredFieldsRecord> {
        let graph = self.graph;
        let repositories = self.repositories;
        let mut per_caller: BTreeMap<(MethodId, String), CallerRequirements> = BTreeMap::new();
        let mut records = Vec::new();

        for (caller, target, _) in graph.edges() {
            let Some(aggregate) = repositories.target_of(&target.owner) else {
                continue;
            };
            if repositories.is_repository(&caller.owner) {
                debug!(caller = %caller, "skipping call site inside a repository");
                continue;
            }

            let key = (caller.clone(), aggregate.to_string());
            if !per_caller.contains_key(&key) {
                let requirements = self.caller_requirements(caller, aggregate);
                per_caller.insert(key.clone(), requirements);
            }
            let Some(requirements) = per_caller.get(&key) else {
                continue;
            };

            let mut called: Vec<CalledAggregateMethod> = requirements
                .entry_points
                .iter()
                .map(|(method, fields)| CalledAggregateMethod {
                    method: method.clone(),
                    required_fields: fields.clone(),
                })
                .collect();
            called.sort_by(|a, b| {
                (&a.method.name, &a.method.descriptor).cmp(&(&b.method.name, &b.method.descriptor))
            });

            records.push(RequiredFieldsRecord {
                caller: caller.clone(),
                caller_lines: graph.line_range(caller),
                repository: target.owner.clone(),
                repository_method: target.clone(),
                aggregate_root: aggregate.to_string(),
                called_aggregate_root_methods: called,
                required_fields: requirements.required_fields.clone(),
            });
        }
        records
    }

    /// Walk everything reachable from `caller` and gather what it needs from `aggregate`.
    pub fn caller_requirements(&mut self, caller: &MethodId, aggregate: &str) -> CallerRequirements {
        let graph = self.graph;
        let mut result = CallerRequirements::default();
        let mut visited: BTreeSet<&MethodId> = BTreeSet::new();
        let mut queue: VecDeque<(&MethodId, u32)> = VecDeque::from([(caller, 0)]);
        visited.insert(caller);

        while let Some((node, depth)) = queue.pop_front() {
            for access in graph.accesses_on(node, aggregate) {
                if self.is_instance_field(aggregate, &access.name) {
                    result.required_fields.insert(access.name.clone());
                }
            }

            for (target, _) in graph.callees(node) {
                if target.is_owned_by(aggregate) {
                    if !result.entry_points.contains_key(target) {
                        let fields = self.aggregate_method_fields(target, aggregate);
                        result.required_fields.extend(fields.iter().cloned());
                        result.entry_points.insert(target.clone(), fields);
                    }
                    continue;
                }
                if self.repositories.is_repository(&target.owner) {
                    continue;
                }
                if self.max_call_depth.is_some_and(|max| depth >= max) {
                    continue;
                }
                if visited.insert(target) {
                    queue.push_back((target, depth + 1));
                }
            }
        }
        result
    }

    /// Fields of `aggregate` needed by `method` and the aggregate methods it calls.
    pub fn aggregate_method_fields(&mut self, method: &MethodId, aggregate: &str) -> BTreeSet<String> {
        if let Some(cached) = self.cached(aggregate, method) {
            return cached.clone();
        }

        let graph = self.graph;
        let mut fields = BTreeSet::new();
        let mut visited: BTreeSet<&MethodId> = BTreeSet::new();
        let mut stack = vec![method];
        visited.insert(method);

        while let Some(node) = stack.pop() {
            if node != method {
                if let Some(cached) = self.cached(aggregate, node) {
                    fields.extend(cached.iter().cloned());
                    continue;
                }
            }
            for access in graph.accesses_on(node, aggregate) {
                if self.is_instance_field(aggregate, &access.name) {
                    fields.insert(access.name.clone());
                }
            }
            for (target, _) in graph.callees(node) {
                if target.is_owned_by(aggregate) && visited.insert(target) {
                    stack.push(target);
                }
            }
        }

        self.memo.entry(aggregate.to_string()).or_default().insert(method.clone(), fields.clone());
        fields
    }

    fn cached(&self, aggregate: &str, method: &MethodId) -> Option<&BTreeSet<String>> {
        self.memo.get(aggregate).and_then(|methods| methods.get(method))
    }

    /// Static fields are never required. Fields the aggregate does not declare
    /// (inherited ones) are kept.
    fn is_instance_field(&self, aggregate: &str, field: &str) -> bool {
        self.arena
            .get(aggregate)
            .and_then(|class| class.field(field))
            .map_or(true, |declared| !declared.is_static())
    }
}
