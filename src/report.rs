//! Text, JSON and CSV rendering of command results

use crate::batch::ProjectOutcome;
use crate::catalog::EventId;
use crate::cli::OutputFormat;
use crate::compare::ComparisonReport;
use crate::identifiers::StatementStats;
use crate::log_graph::{to_record, LogGraph, LogPath, LogStatement};
use crate::pipeline::FileSegments;
use anyhow::Result;
use serde::Serialize;
use std::fmt::Write as _;

/// Escape a CSV field (commas, quotes, newlines)
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn join_ids(ids: &[EventId], separator: &str) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

fn event_ids(statements: Vec<&LogStatement>) -> Vec<EventId> {
    statements.iter().map(|s| s.event_id).collect()
}

#[derive(Serialize)]
struct GraphSummary<'a> {
    statements: Vec<&'a LogStatement>,
    edges: Vec<(EventId, EventId)>,
    roots: Vec<EventId>,
    leafs: Vec<EventId>,
    paths: Vec<LogPath>,
}

/// Analyzer `output` row for one statement of `graph`
fn statement_record(graph: &LogGraph, statement: &LogStatement) -> String {
    let idom = graph
        .idom(statement.event_id)
        .map(|s| s.event_id.to_string())
        .unwrap_or_default();
    let (file_name, line_number) = match statement.loc() {
        Some(loc) => (loc.file_name.clone(), loc.line_number.to_string()),
        None => (String::new(), String::new()),
    };
    to_record(&[
        idom,
        statement.event_id.to_string(),
        file_name,
        statement.package.join("."),
        statement.class_name.clone(),
        statement.method_name.clone(),
        line_number,
        statement.level.clone(),
        statement.template.clone(),
    ])
}

pub fn render_graph(graph: &LogGraph, format: OutputFormat) -> Result<String> {
    let mut out = String::new();
    match format {
        OutputFormat::Text => {
            writeln!(
                out,
                "{} statements, {} edges",
                graph.node_count(),
                graph.edge_count()
            )?;
            for statement in graph.iter() {
                let idom = graph
                    .idom(statement.event_id)
                    .map(|s| s.event_id.to_string())
                    .unwrap_or_else(|| "-".to_string());
                let loc = statement
                    .loc()
                    .map(|loc| loc.to_string())
                    .unwrap_or_else(|| "?".to_string());
                writeln!(
                    out,
                    "  {:>5} <- {:>5}  {} {} {:?}",
                    statement.event_id, idom, loc, statement.level, statement.template
                )?;
            }
            writeln!(out, "roots: {}", join_ids(&event_ids(graph.roots()), " "))?;
            writeln!(out, "leafs: {}", join_ids(&event_ids(graph.leafs()), " "))?;
            let paths = graph.paths();
            writeln!(out, "paths: {}", paths.len())?;
            for path in &paths {
                writeln!(out, "  {}", join_ids(path, " -> "))?;
            }
        }
        OutputFormat::Json => {
            let summary = GraphSummary {
                statements: graph.iter().collect(),
                edges: graph.edges().collect(),
                roots: event_ids(graph.roots()),
                leafs: event_ids(graph.leafs()),
                paths: graph.paths(),
            };
            out = serde_json::to_string_pretty(&summary)?;
            out.push('\n');
        }
        OutputFormat::Csv => {
            for statement in graph.iter() {
                out.push_str(&statement_record(graph, statement));
                out.push('\n');
            }
        }
    }
    Ok(out)
}

pub fn render_comparison(report: &ComparisonReport, format: OutputFormat) -> Result<String> {
    let mut out = String::new();
    match format {
        OutputFormat::Text => {
            writeln!(out, "source statements:   {}", report.source_statements)?;
            writeln!(out, "source paths:        {}", report.source_paths)?;
            writeln!(out, "sequences:           {}", report.sequences)?;
            writeln!(out, "min support:         {}", report.min_support)?;
            writeln!(out, "patterns:            {}", report.patterns)?;
            writeln!(out, "pattern paths:       {}", report.pattern_paths)?;
            writeln!(out, "matching paths:      {}", report.overlap.matching_paths)?;
            writeln!(out, "all paths:           {}", report.overlap.all_paths)?;
            writeln!(
                out,
                "similar paths:       {} (> {})",
                report.similar_paths, report.similarity_threshold
            )?;
            writeln!(
                out,
                "beam-matched paths:  {} (d = {})",
                report.beam_matched_paths, report.max_divergence
            )?;
        }
        OutputFormat::Json => {
            out = serde_json::to_string_pretty(report)?;
            out.push('\n');
        }
        OutputFormat::Csv => {
            writeln!(
                out,
                "source_statements,source_paths,sequences,min_support,patterns,pattern_paths,\
                 matching_paths,all_paths,similarity_threshold,similar_paths,max_divergence,\
                 beam_matched_paths"
            )?;
            writeln!(
                out,
                "{},{},{},{},{},{},{},{},{},{},{},{}",
                report.source_statements,
                report.source_paths,
                report.sequences,
                report.min_support,
                report.patterns,
                report.pattern_paths,
                report.overlap.matching_paths,
                report.overlap.all_paths,
                report.similarity_threshold,
                report.similar_paths,
                report.max_divergence,
                report.beam_matched_paths
            )?;
        }
    }
    Ok(out)
}

#[derive(Serialize)]
struct StatsEntry {
    project: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<StatementStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn render_stats(
    outcomes: &[ProjectOutcome<StatementStats>],
    format: OutputFormat,
) -> Result<String> {
    let entries: Vec<StatsEntry> = outcomes
        .iter()
        .map(|outcome| {
            let (stats, error) = match &outcome.result {
                Ok(stats) => (Some(*stats), None),
                Err(e) => (None, Some(format!("{:#}", e))),
            };
            StatsEntry {
                project: outcome.project.display().to_string(),
                stats,
                error,
            }
        })
        .collect();

    let mut out = String::new();
    match format {
        OutputFormat::Text => {
            for entry in &entries {
                match (&entry.stats, &entry.error) {
                    (Some(stats), _) => writeln!(
                        out,
                        "{}: {} statements, {} with id, {} injection opportunities",
                        entry.project,
                        stats.stmt_count,
                        stats.stmt_with_id_count,
                        stats.stmt_with_injection_count
                    )?,
                    (None, error) => writeln!(
                        out,
                        "{}: FAILED: {}",
                        entry.project,
                        error.as_deref().unwrap_or("unknown error")
                    )?,
                }
            }
        }
        OutputFormat::Json => {
            out = serde_json::to_string_pretty(&entries)?;
            out.push('\n');
        }
        OutputFormat::Csv => {
            writeln!(
                out,
                "project,stmt_count,stmt_with_id_count,stmt_with_injection_count,error"
            )?;
            for entry in &entries {
                let counts = entry
                    .stats
                    .map(|s| {
                        format!(
                            "{},{},{}",
                            s.stmt_count, s.stmt_with_id_count, s.stmt_with_injection_count
                        )
                    })
                    .unwrap_or_else(|| ",,".to_string());
                writeln!(
                    out,
                    "{},{},{}",
                    escape_field(&entry.project),
                    counts,
                    escape_field(entry.error.as_deref().unwrap_or(""))
                )?;
            }
        }
    }
    Ok(out)
}

pub fn render_segments(segments: &[FileSegments], format: OutputFormat) -> Result<String> {
    let mut out = String::new();
    match format {
        OutputFormat::Text => {
            for file in segments {
                writeln!(out, "{}: {} runs", file.file.display(), file.runs.len())?;
                for run in &file.runs {
                    writeln!(out, "  [{}]", join_ids(run, ", "))?;
                }
            }
        }
        OutputFormat::Json => {
            out = serde_json::to_string_pretty(segments)?;
            out.push('\n');
        }
        OutputFormat::Csv => {
            writeln!(out, "file,run,events")?;
            for file in segments {
                let name = file.file.display().to_string();
                for (index, run) in file.runs.iter().enumerate() {
                    writeln!(out, "{},{},{}", escape_field(&name), index, join_ids(run, " "))?;
                }
            }
        }
    }
    Ok(out)
}
