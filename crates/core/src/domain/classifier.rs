use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{matches_any, DomainConventions};
use crate::model::{ClassArena, ClassModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DomainTypeTag {
    AggregateRoot,
    DomainEntity,
    ValueObject,
}

/// Outcome of scanning one class for marker annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Untagged,
    Tagged(DomainTypeTag),
    /// More than one distinct marker; the class is left unclassified.
    Ambiguous(Vec<DomainTypeTag>),
}

pub fn classify_class(class: &ClassModel, conventions: &DomainConventions) -> Classification {
    let mut found = BTreeSet::new();
    for annotation in &class.annotations {
        let name = &annotation.type_name;
        if matches_any(&conventions.aggregate_root_annotations, name) {
            found.insert(DomainTypeTag::AggregateRoot);
        }
        if matches_any(&conventions.domain_entity_annotations, name) {
            found.insert(DomainTypeTag::DomainEntity);
        }
        if matches_any(&conventions.value_object_annotations, name) {
            found.insert(DomainTypeTag::ValueObject);
        }
    }
    if found.len() > 1 {
        return Classification::Ambiguous(found.into_iter().collect());
    }
    found.into_iter().next().map_or(Classification::Untagged, Classification::Tagged)
}

/// Domain tags for every class of a pass.
#[derive(Debug, Default, Clone)]
pub struct DomainIndex {
    tags: BTreeMap<String, DomainTypeTag>,
    ambiguous: BTreeMap<String, Vec<DomainTypeTag>>,
}

impl DomainIndex {
    pub fn classify(arena: &ClassArena, conventions: &DomainConventions) -> Self {
        let mut index = DomainIndex::default();
        for class in arena.iter() {
            match classify_class(class, conventions) {
                Classification::Untagged => {}
                Classification::Tagged(tag) => {
                    index.tags.insert(class.name.clone(), tag);
                }
                Classification::Ambiguous(tags) => {
                    warn!(class = %class.name, ?tags, "class carries several domain markers; ignoring it");
                    index.ambiguous.insert(class.name.clone(), tags);
                }
            }
        }
        index
    }

    pub fn tag_of(&self, class_name: &str) -> Option<DomainTypeTag> {
        self.tags.get(class_name).copied()
    }

    pub fn is_aggregate_root(&self, class_name: &str) -> bool {
        self.tag_of(class_name) == Some(DomainTypeTag::AggregateRoot)
    }

    pub fn aggregate_roots(&self) -> impl Iterator<Item = &str> {
        self.tags
            .iter()
            .filter(|(_, tag)| **tag == DomainTypeTag::AggregateRoot)
            .map(|(name, _)| name.as_str())
    }

    pub fn count(&self, tag: DomainTypeTag) -> usize {
        self.tags.values().filter(|t| **t == tag).count()
    }

    pub fn ambiguous(&self) -> impl Iterator<Item = (&str, &[DomainTypeTag])> {
        self.ambiguous.iter().map(|(name, tags)| (name.as_str(), tags.as_slice()))
    }

    pub fn is_ambiguous(&self, class_name: &str) -> bool {
        self.ambiguous.contains_key(class_name)
    }
}
