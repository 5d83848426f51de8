//! Repository detection (three independent tiers) and resolution to the
//! managed Aggregate Root.
//!
//! Detection keeps the evidence of every tier that matched; priority is only
//! applied in [`RepositoryIndex::resolve`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::classifier::DomainIndex;
use super::naming::naming_candidates;
use crate::classfile::signature::parse_class_signature;
use crate::config::{matches_any, DomainConventions};
use crate::model::{simple_name, ClassArena, ClassKind, ClassModel};

/// How a type was recognised as a repository. Declaration order is priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdentificationMethod {
    GenericInterface,
    Annotation,
    NamingConvention,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryEvidence {
    pub method: IdentificationMethod,
    /// Candidate aggregate classes in trial order.
    pub candidates: Vec<String>,
    /// Derived simple names, used by the simple-name fallback.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub base_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub class_name: String,
    /// Matched tiers, sorted by priority.
    pub evidence: Vec<RepositoryEvidence>,
    pub target_aggregate_root: Option<String>,
    pub resolved_by: Option<IdentificationMethod>,
}

impl RepositoryInfo {
    /// Highest-priority tier that identified this repository.
    pub fn identification_method(&self) -> IdentificationMethod {
        self.evidence.first().map(|e| e.method).unwrap_or(IdentificationMethod::NamingConvention)
    }
}

/// Run the three detection tiers against one class.
pub fn detect_repository(class: &ClassModel, conventions: &DomainConventions) -> Option<RepositoryInfo> {
    if matches!(class.kind, ClassKind::Annotation | ClassKind::Module)
        || matches_any(&conventions.generic_repository_interfaces, &class.name)
    {
        return None;
    }

    let mut evidence = Vec::new();

    if let Some(signature) = &class.generic_signature {
        match parse_class_signature(signature) {
            Ok(parsed) => {
                let candidates: Vec<String> = parsed
                    .interfaces
                    .iter()
                    .filter(|i| matches_any(&conventions.generic_repository_interfaces, &i.name))
                    .filter(|i| i.type_arguments.len() == 1)
                    .filter_map(|i| i.type_arguments[0].concrete_class().map(str::to_string))
                    .collect();
                if !candidates.is_empty() {
                    evidence.push(RepositoryEvidence {
                        method: IdentificationMethod::GenericInterface,
                        candidates,
                        base_names: Vec::new(),
                    });
                }
            }
            Err(err) => warn!(class = %class.name, error = %err, "unreadable generic signature"),
        }
    }

    let repository_annotations: Vec<_> = class
        .annotations
        .iter()
        .filter(|a| matches_any(&conventions.repository_annotations, &a.type_name))
        .collect();
    if !repository_annotations.is_empty() {
        let candidates = repository_annotations
            .iter()
            .flat_map(|a| {
                conventions
                    .repository_target_elements
                    .iter()
                    .filter_map(move |element| a.class_element(element))
            })
            .map(str::to_string)
            .collect();
        evidence.push(RepositoryEvidence {
            method: IdentificationMethod::Annotation,
            candidates,
            base_names: Vec::new(),
        });
    }

    if let Some(naming) = naming_candidates(&class.name, conventions) {
        evidence.push(RepositoryEvidence {
            method: IdentificationMethod::NamingConvention,
            candidates: naming.candidates,
            base_names: naming.base_names,
        });
    }

    if evidence.is_empty() {
        return None;
    }
    Some(RepositoryInfo {
        class_name: class.name.clone(),
        evidence,
        target_aggregate_root: None,
        resolved_by: None,
    })
}

/// All repositories of a pass, keyed by class name.
#[derive(Debug, Default, Clone)]
pub struct RepositoryIndex {
    repositories: BTreeMap<String, RepositoryInfo>,
}

impl RepositoryIndex {
    pub fn detect(arena: &ClassArena, conventions: &DomainConventions) -> Self {
        let repositories = arena
            .iter()
            .filter_map(|class| detect_repository(class, conventions))
            .map(|info| (info.class_name.clone(), info))
            .collect();
        Self { repositories }
    }

    /// Resolve every repository to an aggregate root, in strict tier priority.
    pub fn resolve(&mut self, domain: &DomainIndex, conventions: &DomainConventions) {
        for info in self.repositories.values_mut() {
            match resolve_target(info, domain, conventions) {
                Some((target, method)) => {
                    debug!(repository = %info.class_name, aggregate = %target, ?method, "resolved repository");
                    info.target_aggregate_root = Some(target);
                    info.resolved_by = Some(method);
                }
                None => {
                    info!(repository = %info.class_name, "no aggregate root matched; repository skipped");
                }
            }
        }
    }

    pub fn get(&self, class_name: &str) -> Option<&RepositoryInfo> {
        self.repositories.get(class_name)
    }

    pub fn is_repository(&self, class_name: &str) -> bool {
        self.repositories.contains_key(class_name)
    }

    /// Aggregate root managed by a repository class, if resolved.
    pub fn target_of(&self, class_name: &str) -> Option<&str> {
        self.repositories.get(class_name)?.target_aggregate_root.as_deref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RepositoryInfo> {
        self.repositories.values()
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    pub fn resolved_count(&self) -> usize {
        self.repositories.values().filter(|r| r.target_aggregate_root.is_some()).count()
    }
}

fn resolve_target(
    info: &RepositoryInfo,
    domain: &DomainIndex,
    conventions: &DomainConventions,
) -> Option<(String, IdentificationMethod)> {
    let mut evidence: Vec<&RepositoryEvidence> = info.evidence.iter().collect();
    evidence.sort_by_key(|e| e.method);

    for tier in evidence {
        if let Some(found) = tier.candidates.iter().find(|c| domain.is_aggregate_root(c)) {
            return Some((found.clone(), tier.method));
        }
        if tier.method == IdentificationMethod::NamingConvention && conventions.simple_name_fallback {
            for base in &tier.base_names {
                let mut matches = domain.aggregate_roots().filter(|root| simple_name(root) == base);
                if let (Some(only), None) = (matches.next(), matches.next()) {
                    return Some((only.to_string(), tier.method));
                }
            }
        }
    }
    None
}
