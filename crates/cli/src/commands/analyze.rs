use std::path::PathBuf;

use anyhow::{Context, Result};
use fieldscope_core::config::{load_config, AnalyzerConfig};
use fieldscope_core::services::analysis::{run_analysis, AnalysisRequest, PassSummary};
use serde::Serialize;

use crate::{canonicalize_or_current, sha256_file, timestamp_from_env};

/// Command-line overrides applied on top of the configuration file.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeArgs {
    pub config: Option<PathBuf>,
    pub classes: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub no_merge: bool,
    pub max_classes: Option<usize>,
    pub max_call_depth: Option<u32>,
    pub threads: Option<usize>,
    pub json: bool,
}

#[derive(Serialize)]
pub struct AnalyzeSnapshot {
    pub report_path: String,
    pub report_sha256: String,
    pub timestamp: String,
    pub summary: PassSummary,
}

/// Resolve the effective configuration: file (if any), then flags.
pub fn effective_config(args: &AnalyzeArgs) -> Result<AnalyzerConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => {
            let mut config = AnalyzerConfig::default();
            config.resolve_paths(&canonicalize_or_current(".")?);
            config
        }
    };
    if !args.classes.is_empty() {
        config.class_dirs = args
            .classes
            .iter()
            .map(|dir| canonicalize_or_current(&dir.to_string_lossy()))
            .collect::<Result<_>>()?;
    }
    if let Some(output) = &args.output {
        config.report_path = canonicalize_or_current(&output.to_string_lossy())?;
    }
    if args.no_merge {
        config.merge_existing = false;
    }
    if let Some(limit) = args.max_classes {
        config.max_classes = limit;
    }
    if args.max_call_depth.is_some() {
        config.max_call_depth = args.max_call_depth;
    }
    if args.threads.is_some() {
        config.threads = args.threads;
    }
    Ok(config)
}

/// Run one analysis pass and write the report.
pub fn analyze_command(args: &AnalyzeArgs) -> Result<()> {
    let config = effective_config(args)?;
    if config.class_dirs.is_empty() {
        anyhow::bail!("No class directories given; pass --classes DIR or set class_dirs in the config");
    }
    let request = AnalysisRequest { config, timestamp: timestamp_from_env()? };
    let outcome = run_analysis(&request).context("Analysis pass failed")?;

    let report_path = &request.config.report_path;
    let snapshot = AnalyzeSnapshot {
        report_path: report_path.display().to_string(),
        report_sha256: sha256_file(report_path)?,
        timestamp: outcome.report.timestamp.clone(),
        summary: outcome.summary,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let summary = &snapshot.summary;
    println!("fieldscope v{}", fieldscope_core::version());
    println!("Report: {}", snapshot.report_path);
    println!("  SHA-256: {}", snapshot.report_sha256);
    println!("  Timestamp: {}", snapshot.timestamp);
    println!(
        "Classes: {} discovered, {} decoded, {} skipped",
        summary.classes_discovered, summary.classes_decoded, summary.classes_skipped
    );
    println!(
        "Domain: {} aggregate roots, {} entities, {} value objects, {} ambiguous",
        summary.aggregate_roots, summary.domain_entities, summary.value_objects, summary.ambiguous_classes
    );
    println!("Repositories: {} found, {} resolved", summary.repositories, summary.repositories_resolved);
    println!("Call graph: {} methods, {} edges", summary.call_graph_nodes, summary.call_graph_edges);
    println!("Call sites: {} this pass, {} in report", summary.records, summary.report_callers);
    Ok(())
}
