//! Canonical JSON report: schema, conversion from records, incremental merge,
//! and load/write.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::analysis::RequiredFieldsRecord;
use crate::model::simple_name;

pub const REPORT_VERSION: &str = "1.0";

/// Placeholder for callers without line information.
pub const UNKNOWN_LINES: &str = "0-0";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to read report {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("Existing report {path} is not valid JSON: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write report {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub version: String,
    pub timestamp: String,
    pub call_graph: BTreeMap<String, AggregateEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateEntry {
    pub repository_methods: BTreeMap<String, RepositoryMethodEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryMethodEntry {
    pub method_descriptor: String,
    pub callers: BTreeMap<String, CallerEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerEntry {
    pub method_class: String,
    pub method: String,
    pub method_descriptor: String,
    pub source_lines: String,
    pub repository: String,
    pub repository_method: String,
    pub repository_method_descriptor: String,
    pub aggregate_root: String,
    pub called_aggregate_root_methods: Vec<CalledMethodEntry>,
    pub required_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalledMethodEntry {
    pub aggregate_root_method: String,
    pub aggregate_root_method_descriptor: String,
    pub required_fields: Vec<String>,
}

/// Key of a caller inside `callers`: `Class.method:start-end`, or
/// `Class.method(descriptor)` when the method has no line table.
pub fn caller_key(record: &RequiredFieldsRecord) -> String {
    let caller = &record.caller;
    match record.caller_lines {
        Some(lines) => format!("{}.{}:{}", caller.owner, caller.name, lines),
        None => format!("{}.{}{}", caller.owner, caller.name, caller.descriptor),
    }
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl CallerEntry {
    pub fn from_record(record: &RequiredFieldsRecord) -> Self {
        Self {
            method_class: record.caller.owner.clone(),
            method: record.caller.name.clone(),
            method_descriptor: record.caller.descriptor.clone(),
            source_lines: record
                .caller_lines
                .map(|lines| lines.to_string())
                .unwrap_or_else(|| UNKNOWN_LINES.to_string()),
            repository: record.repository.clone(),
            repository_method: record.repository_method.name.clone(),
            repository_method_descriptor: record.repository_method.descriptor.clone(),
            aggregate_root: record.aggregate_root.clone(),
            called_aggregate_root_methods: record
                .called_aggregate_root_methods
                .iter()
                .map(|called| CalledMethodEntry {
                    aggregate_root_method: called.method.name.clone(),
                    aggregate_root_method_descriptor: called.method.descriptor.clone(),
                    required_fields: called.required_fields.iter().cloned().collect(),
                })
                .collect(),
            required_fields: record.required_fields.iter().cloned().collect(),
        }
    }
}

impl Report {
    pub fn empty(timestamp: impl Into<String>) -> Self {
        Self { version: REPORT_VERSION.to_string(), timestamp: timestamp.into(), call_graph: BTreeMap::new() }
    }

    pub fn from_records(records: &[RequiredFieldsRecord], timestamp: impl Into<String>) -> Self {
        let mut report = Report::empty(timestamp);
        for record in records {
            report.insert(record);
        }
        report
    }

    /// Insert one record, replacing any caller of the same repository stored
    /// under the same key. When the key already belongs to another repository
    /// of the same aggregate, the repository's simple name is appended
    /// (`Class.method:10-12@OrderArchiveRepository`).
    pub fn insert(&mut self, record: &RequiredFieldsRecord) {
        let method = self
            .call_graph
            .entry(record.aggregate_root.clone())
            .or_default()
            .repository_methods
            .entry(record.repository_method.signature_key())
            .or_default();
        method.method_descriptor = record.repository_method.descriptor.clone();

        let mut key = caller_key(record);
        if method.callers.get(&key).is_some_and(|existing| existing.repository != record.repository) {
            key = format!("{key}@{}", simple_name(&record.repository));
            debug!(key = %key, "caller shares a repository method with another repository");
        }
        method.callers.insert(key, CallerEntry::from_record(record));
    }

    /// Drop every caller whose class is in `classes`, then empty containers.
    /// Returns the number of callers removed.
    pub fn prune_callers_of(&mut self, classes: &BTreeSet<String>) -> usize {
        let mut removed = 0;
        for aggregate in self.call_graph.values_mut() {
            for method in aggregate.repository_methods.values_mut() {
                let before = method.callers.len();
                method.callers.retain(|_, caller| !classes.contains(&caller.method_class));
                removed += before - method.callers.len();
            }
            aggregate.repository_methods.retain(|_, method| !method.callers.is_empty());
        }
        self.call_graph.retain(|_, aggregate| !aggregate.repository_methods.is_empty());
        removed
    }

    /// Merge a fresh pass into a previous report.
    ///
    /// Callers of re-scanned classes are dropped from `previous` first; fresh
    /// callers then win on key collision. If the merged call graph equals the
    /// previous one, the previous timestamp is kept.
    pub fn merge(previous: Report, fresh: Report, rescanned: &BTreeSet<String>) -> Report {
        let previous_graph = previous.call_graph.clone();
        let previous_timestamp = previous.timestamp.clone();

        let mut merged = previous;
        let pruned = merged.prune_callers_of(rescanned);
        debug!(pruned, "dropped callers of re-scanned classes");

        for (aggregate, entry) in fresh.call_graph {
            let target = merged.call_graph.entry(aggregate).or_default();
            for (key, method) in entry.repository_methods {
                let slot = target.repository_methods.entry(key).or_default();
                slot.method_descriptor = method.method_descriptor;
                slot.callers.extend(method.callers);
            }
        }

        merged.version = REPORT_VERSION.to_string();
        merged.timestamp =
            if merged.call_graph == previous_graph { previous_timestamp } else { fresh.timestamp };
        merged
    }

    pub fn caller_count(&self) -> usize {
        self.call_graph
            .values()
            .flat_map(|a| a.repository_methods.values())
            .map(|m| m.callers.len())
            .sum()
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String, ReportError> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }
}

/// Read a previous report. A missing file, or one written with another
/// version, yields `None`; unparsable content is an error.
pub fn load_report(path: &Path) -> Result<Option<Report>, ReportError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(ReportError::Read { path: path.to_path_buf(), source }),
    };
    let report: Report = serde_json::from_str(&text)
        .map_err(|source| ReportError::Parse { path: path.to_path_buf(), source })?;
    if report.version != REPORT_VERSION {
        warn!(
            path = %path.display(),
            found = %report.version,
            expected = REPORT_VERSION,
            "discarding report written with a different version"
        );
        return Ok(None);
    }
    Ok(Some(report))
}

/// Write the report through a sibling temporary file renamed into place.
pub fn write_report(path: &Path, report: &Report) -> Result<(), ReportError> {
    let write_err = |source: io::Error| ReportError::Write { path: path.to_path_buf(), source };
    let text = report.to_json()?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(text.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|err| write_err(err.error))?;
    Ok(())
}
