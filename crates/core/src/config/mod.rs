//! Analyzer configuration.
//!
//! Loaded from YAML (`.yaml`/`.yml`) or JSON (`.json`); every field has a
//! default so an empty file is a valid configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::simple_name;

pub const DEFAULT_REPORT_PATH: &str = "build/fieldscope/required-fields.json";
pub const DEFAULT_MAX_CLASSES: usize = 100_000;

/// Top-level configuration for one analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Directory trees holding compiled `.class` files.
    pub class_dirs: Vec<PathBuf>,
    /// Where the report is written (and read from for incremental merges).
    pub report_path: PathBuf,
    /// Merge into an existing report instead of replacing it.
    pub merge_existing: bool,
    /// Abort the pass when more class files than this are discovered.
    pub max_classes: usize,
    /// Optional bound on helper-call depth when walking from a caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_call_depth: Option<u32>,
    /// Decode worker threads; `None` uses the rayon default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
    pub conventions: DomainConventions,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            class_dirs: Vec::new(),
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
            merge_existing: true,
            max_classes: DEFAULT_MAX_CLASSES,
            max_call_depth: None,
            threads: None,
            conventions: DomainConventions::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Make relative paths relative to `base` (typically the config file's directory).
    pub fn resolve_paths(&mut self, base: &Path) {
        for dir in &mut self.class_dirs {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
        if self.report_path.is_relative() {
            self.report_path = base.join(&self.report_path);
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration")
    }
}

/// Names and rules used to recognise domain types and repositories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainConventions {
    pub aggregate_root_annotations: Vec<String>,
    pub domain_entity_annotations: Vec<String>,
    pub value_object_annotations: Vec<String>,
    pub repository_annotations: Vec<String>,
    /// Repository annotation elements that may name the target aggregate class.
    pub repository_target_elements: Vec<String>,
    /// Generic interfaces whose single type argument is the managed aggregate.
    pub generic_repository_interfaces: Vec<String>,
    /// Name suffixes, tried in order; keep longer suffixes first.
    pub repository_suffixes: Vec<String>,
    /// Interface prefix stripped before suffix matching (`IOrderRepository`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface_prefix: Option<String>,
    pub package_rewrites: Vec<PackageRewrite>,
    /// Fall back to the unique aggregate root with the derived simple name.
    pub simple_name_fallback: bool,
}

impl Default for DomainConventions {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            aggregate_root_annotations: strings(&["AggregateRoot"]),
            domain_entity_annotations: strings(&["DomainEntity"]),
            value_object_annotations: strings(&["ValueObject"]),
            repository_annotations: strings(&["Repository", "DomainRepository"]),
            repository_target_elements: strings(&["aggregateRoot", "value"]),
            generic_repository_interfaces: strings(&["DomainRepository"]),
            repository_suffixes: strings(&["RepositoryImpl", "Repository", "Repo"]),
            interface_prefix: Some("I".to_string()),
            package_rewrites: ["repository", "repositories", "repo", "admin"]
                .iter()
                .map(|segment| PackageRewrite::new(*segment, "domain"))
                .collect(),
            simple_name_fallback: true,
        }
    }
}

/// Replace a package segment when deriving aggregate candidates from a repository name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRewrite {
    pub segment: String,
    pub replacement: String,
}

impl PackageRewrite {
    pub fn new(segment: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self { segment: segment.into(), replacement: replacement.into() }
    }
}

/// A configured type name matches either the full dotted name or, when it
/// carries no package, the simple name.
pub fn type_name_matches(configured: &str, type_name: &str) -> bool {
    if configured.contains('.') {
        configured == type_name
    } else {
        simple_name(type_name) == configured
    }
}

pub fn matches_any(configured: &[String], type_name: &str) -> bool {
    configured.iter().any(|c| type_name_matches(c, type_name))
}

/// Load a configuration file, choosing the format by extension, and resolve
/// relative paths against the file's directory.
pub fn load_config(path: &Path) -> Result<AnalyzerConfig> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration at {}", path.display()))?;
    let mut config: AnalyzerConfig = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse JSON configuration {}", path.display()))?,
        _ => {
            if body.trim().is_empty() {
                AnalyzerConfig::default()
            } else {
                serde_yaml::from_str(&body).with_context(|| {
                    format!("Failed to parse YAML configuration {}", path.display())
                })?
            }
        }
    };
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    config.resolve_paths(base);
    Ok(config)
}
