use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::analysis::{CallGraph, RequiredFieldsRecord, RequirementResolver};
use crate::classfile::{decode_class, ClassFileError};
use crate::config::AnalyzerConfig;
use crate::domain::{DomainIndex, DomainTypeTag, RepositoryIndex};
use crate::model::{ClassArena, ClassModel};
use crate::report::{format_timestamp, load_report, write_report, Report, ReportError};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Pass aborted: {found} class files exceed the limit of {limit}")]
    TooManyClasses { found: usize, limit: usize },
    #[error("Class directory not found: {0}")]
    MissingClassDir(PathBuf),
    #[error("Failed to walk {path}: {source}")]
    Walk { path: PathBuf, source: walkdir::Error },
    #[error("Failed to build decode thread pool: {0}")]
    ThreadPool(String),
    #[error(transparent)]
    Report(#[from] ReportError),
}

/// One class file waiting to be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassEntry {
    File(PathBuf),
    Bytes { origin: String, bytes: Vec<u8> },
}

impl ClassEntry {
    pub fn origin(&self) -> String {
        match self {
            ClassEntry::File(path) => path.display().to_string(),
            ClassEntry::Bytes { origin, .. } => origin.clone(),
        }
    }
}

/// Where a pass finds its class files.
pub trait ClassSource: Send + Sync {
    /// Entries in a stable order. Discovery only; nothing is read yet.
    fn entries(&self) -> Result<Vec<ClassEntry>, AnalysisError>;
    fn describe(&self) -> String;
}

/// Every `*.class` file below a directory, sorted by path.
pub struct DirectorySource {
    pub root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ClassSource for DirectorySource {
    fn entries(&self) -> Result<Vec<ClassEntry>, AnalysisError> {
        if !self.root.is_dir() {
            return Err(AnalysisError::MissingClassDir(self.root.clone()));
        }
        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry =
                entry.map_err(|source| AnalysisError::Walk { path: self.root.clone(), source })?;
            let is_class = entry.path().extension().is_some_and(|ext| ext == "class");
            if entry.file_type().is_file() && is_class {
                entries.push(ClassEntry::File(entry.into_path()));
            }
        }
        Ok(entries)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Class bytes already in memory (tests, embedding frontends).
#[derive(Default)]
pub struct MemorySource {
    entries: Vec<ClassEntry>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, origin: impl Into<String>, bytes: Vec<u8>) -> &mut Self {
        self.entries.push(ClassEntry::Bytes { origin: origin.into(), bytes });
        self
    }
}

impl ClassSource for MemorySource {
    fn entries(&self) -> Result<Vec<ClassEntry>, AnalysisError> {
        Ok(self.entries.clone())
    }

    fn describe(&self) -> String {
        format!("memory ({} classes)", self.entries.len())
    }
}

/// Counters reported at the end of a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassSummary {
    pub classes_discovered: usize,
    pub classes_decoded: usize,
    pub classes_skipped: usize,
    pub aggregate_roots: usize,
    pub domain_entities: usize,
    pub value_objects: usize,
    pub ambiguous_classes: usize,
    pub repositories: usize,
    pub repositories_resolved: usize,
    pub call_graph_nodes: usize,
    pub call_graph_edges: usize,
    pub records: usize,
    pub report_callers: usize,
}

/// Everything a pass produced.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub report: Report,
    pub records: Vec<RequiredFieldsRecord>,
    pub decoded_classes: BTreeSet<String>,
    pub summary: PassSummary,
}

/// Request for one full pass.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub config: AnalyzerConfig,
    /// Fixed report timestamp; `None` uses the current time.
    pub timestamp: Option<DateTime<Utc>>,
}

/// Decoded classes plus per-file failures, after the barrier.
pub struct DecodedBatch {
    pub arena: ClassArena,
    pub discovered: usize,
    pub skipped: usize,
}

/// Coordinator that runs decode, classification, resolution and reporting.
pub struct AnalysisRunner<'a> {
    pub config: &'a AnalyzerConfig,
    pub sources: Vec<&'a dyn ClassSource>,
}

impl<'a> AnalysisRunner<'a> {
    pub fn new(config: &'a AnalyzerConfig) -> Self {
        Self { config, sources: Vec::new() }
    }

    pub fn with_source(mut self, source: &'a dyn ClassSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Discover, check the size limit, read and decode in parallel.
    pub fn decode(&self) -> Result<DecodedBatch, AnalysisError> {
        let mut entries = Vec::new();
        for source in &self.sources {
            let found = source.entries()?;
            debug!(source = %source.describe(), classes = found.len(), "discovered class files");
            entries.extend(found);
        }
        let discovered = entries.len();
        if discovered > self.config.max_classes {
            return Err(AnalysisError::TooManyClasses {
                found: discovered,
                limit: self.config.max_classes,
            });
        }

        let inputs: Vec<(String, Vec<u8>)> = entries
            .into_iter()
            .filter_map(|entry| match entry {
                ClassEntry::File(path) => match fs::read(&path) {
                    Ok(bytes) => Some((path.display().to_string(), bytes)),
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "skipping unreadable class file");
                        None
                    }
                },
                ClassEntry::Bytes { origin, bytes } => Some((origin, bytes)),
            })
            .collect();
        let unreadable = discovered - inputs.len();

        let decoded = self.in_pool(|| {
            inputs
                .par_iter()
                .map(|(origin, bytes)| (origin, decode_class(bytes)))
                .collect::<Vec<(&String, Result<ClassModel, ClassFileError>)>>()
        })?;

        let mut arena = ClassArena::new();
        let mut skipped = unreadable;
        for (origin, result) in decoded {
            match result {
                Ok(class) => {
                    let name = class.name.clone();
                    if !arena.insert(class) {
                        warn!(class = %name, origin = %origin, "duplicate class; keeping the first definition");
                        skipped += 1;
                    }
                }
                Err(err) => {
                    warn!(origin = %origin, error = %err, "skipping class file that failed to decode");
                    skipped += 1;
                }
            }
        }
        Ok(DecodedBatch { arena, discovered, skipped })
    }

    fn in_pool<T: Send>(&self, work: impl FnOnce() -> T + Send) -> Result<T, AnalysisError> {
        match self.config.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|err| AnalysisError::ThreadPool(err.to_string()))?;
                Ok(pool.install(work))
            }
            None => Ok(work()),
        }
    }

    /// Run a pass and merge with the previous report, without writing anything.
    pub fn run(&self, timestamp: Option<DateTime<Utc>>) -> Result<AnalysisOutcome, AnalysisError> {
        let batch = self.decode()?;
        let (records, mut summary) = analyze_arena(&batch.arena, self.config);
        summary.classes_discovered = batch.discovered;
        summary.classes_decoded = batch.arena.len();
        summary.classes_skipped = batch.skipped;

        let decoded_classes: BTreeSet<String> = batch.arena.names().map(str::to_string).collect();
        let stamp = format_timestamp(timestamp.unwrap_or_else(Utc::now));
        let fresh = Report::from_records(&records, stamp);

        let previous = if self.config.merge_existing {
            load_report(&self.config.report_path)?
        } else {
            None
        };
        let report = match previous {
            Some(previous) => Report::merge(previous, fresh, &decoded_classes),
            None => fresh,
        };
        summary.report_callers = report.caller_count();

        info!(
            decoded = summary.classes_decoded,
            skipped = summary.classes_skipped,
            aggregate_roots = summary.aggregate_roots,
            repositories = summary.repositories,
            resolved = summary.repositories_resolved,
            records = summary.records,
            "analysis pass finished"
        );
        Ok(AnalysisOutcome { report, records, decoded_classes, summary })
    }
}

/// Classify, resolve repositories, build the call graph and resolve records
/// over an already decoded arena.
pub fn analyze_arena(
    arena: &ClassArena,
    config: &AnalyzerConfig,
) -> (Vec<RequiredFieldsRecord>, PassSummary) {
    let conventions = &config.conventions;
    let domain = DomainIndex::classify(arena, conventions);
    let mut repositories = RepositoryIndex::detect(arena, conventions);
    repositories.resolve(&domain, conventions);
    let graph = CallGraph::build(arena);

    let records = RequirementResolver::new(&graph, arena, &repositories)
        .with_max_call_depth(config.max_call_depth)
        .resolve_all();

    let summary = PassSummary {
        aggregate_roots: domain.count(DomainTypeTag::AggregateRoot),
        domain_entities: domain.count(DomainTypeTag::DomainEntity),
        value_objects: domain.count(DomainTypeTag::ValueObject),
        ambiguous_classes: domain.ambiguous().count(),
        repositories: repositories.len(),
        repositories_resolved: repositories.resolved_count(),
        call_graph_nodes: graph.node_count(),
        call_graph_edges: graph.edge_count(),
        records: records.len(),
        ..PassSummary::default()
    };
    (records, summary)
}

/// Run a full pass over the configured class directories and write the report.
pub fn run_analysis(request: &AnalysisRequest) -> Result<AnalysisOutcome, AnalysisError> {
    let config = &request.config;
    let directories: Vec<DirectorySource> =
        config.class_dirs.iter().map(|dir| DirectorySource::new(dir.as_path())).collect();
    let mut runner = AnalysisRunner::new(config);
    for directory in &directories {
        runner = runner.with_source(directory);
    }
    let outcome = runner.run(request.timestamp)?;
    write_report(&config.report_path, &outcome.report)?;
    info!(path = %config.report_path.display(), callers = outcome.summary.report_callers, "report written");
    Ok(outcome)
}

/// Decode a single class file, for inspection.
pub fn inspect_class(path: &Path) -> Result<ClassModel, ClassFileError> {
    crate::classfile::decode_file(path)
}
