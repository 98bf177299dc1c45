//! End-to-end comparison pipeline
//!
//! ```text
//! source tree ──analyzer──▶ LogGraph (source) ──catalog──┐
//!                                                        ▼
//! log files ──parse──▶ sort ──window──▶ sequences ──mine──▶ PatternTrie
//!                                                        │
//!                     LogGraph (patterns) ◀──────────────┘
//!                                │
//!                                ▼
//!                       ComparisonReport
//! ```
//!
//! Log lines are resolved against the catalog of the source graph so both
//! graphs share one event id namespace.

use crate::catalog::{EventCatalog, EventId};
use crate::compare::{
    beam_matched_count, path_overlap, similar_path_count, ComparisonReport,
};
use crate::config::PipelineConfig;
use crate::log_graph::{Analyzer, LogGraph};
use crate::log_parser::LogLineParser;
use crate::matching::TrieSegmenter;
use crate::mining::{PrefixSpan, SequenceMiner};
use crate::trie::PatternTrie;
use crate::windowing::{sort_by_time, Sequence, SequenceWindower, TimedEvent};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Greedy segmentation of one log file's event stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSegments {
    pub file: PathBuf,
    pub runs: Vec<Vec<EventId>>,
}

/// Mined patterns together with the support they were mined at
#[derive(Debug, Clone)]
pub struct MinedPatterns {
    pub sequences: usize,
    pub min_support: usize,
    pub trie: PatternTrie<EventId>,
}

pub struct Pipeline<M = PrefixSpan> {
    config: PipelineConfig,
    analyzer: Analyzer,
    parser: LogLineParser,
    miner: M,
}

impl Pipeline<PrefixSpan> {
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_miner(config, PrefixSpan::default())
    }
}

impl<M: SequenceMiner> Pipeline<M> {
    pub fn with_miner(config: PipelineConfig, miner: M) -> Self {
        let analyzer = Analyzer::new(config.analyzer.clone());
        Self {
            config,
            analyzer,
            parser: LogLineParser::new(),
            miner,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the analyzer over `source`
    pub fn source_graph(&self, source: &Path) -> Result<LogGraph> {
        let graph = LogGraph::from_source(source, &self.analyzer)
            .with_context(|| format!("Failed to build log graph for {}", source.display()))?;
        info!(
            "source log graph: {} statements, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Time-sorted events of one log file
    pub fn events(&self, log_file: &Path, catalog: &EventCatalog) -> Result<Vec<TimedEvent>> {
        let file = File::open(log_file)
            .with_context(|| format!("Failed to open log file {}", log_file.display()))?;
        let mut events = self.parser.parse_reader(BufReader::new(file), catalog);
        sort_by_time(&mut events);
        Ok(events)
    }

    fn windower(&self) -> SequenceWindower {
        SequenceWindower::new(self.config.window_ms)
            .with_bounds(
                self.config.min_sequence_length,
                self.config.max_sequence_length,
            )
            .with_max_windows(self.config.max_dataset_size)
    }

    /// Windowed sequences of every log file, in file order
    ///
    /// A file that cannot be read is logged and left out; the others still
    /// contribute.
    pub fn dataset(&self, log_files: &[PathBuf], catalog: &EventCatalog) -> Vec<Sequence> {
        let windower = self.windower();
        let mut dataset = Vec::new();

        for log_file in log_files {
            let events = match self.events(log_file, catalog) {
                Ok(events) => events,
                Err(e) => {
                    warn!("skipping log file: {:#}", e);
                    continue;
                }
            };
            if events.is_empty() {
                debug!("no recognized log lines in {}", log_file.display());
                continue;
            }
            let sequences = windower.windows(&events);
            debug!(
                "{}: {} events, {} sequences",
                log_file.display(),
                events.len(),
                sequences.len()
            );
            dataset.extend(sequences);
        }

        info!(
            "dataset: {} sequences from {} log files",
            dataset.len(),
            log_files.len()
        );
        dataset
    }

    pub fn mine(&self, sequences: &[Sequence]) -> MinedPatterns {
        let min_support = self.config.min_support.resolve(sequences.len());
        let trie = self.miner.mine(sequences, min_support);
        info!(
            "mined {} patterns at min support {}",
            trie.len(),
            min_support
        );
        MinedPatterns {
            sequences: sequences.len(),
            min_support,
            trie,
        }
    }

    /// Compare a source graph with the patterns mined from `log_files`
    pub fn compare_graph(
        &self,
        source_graph: &LogGraph,
        log_files: &[PathBuf],
    ) -> Result<ComparisonReport> {
        let sequences = self.dataset(log_files, &source_graph.catalog());
        let mined = self.mine(&sequences);
        let pattern_graph = LogGraph::from_patterns(&mined.trie);

        let source_paths = source_graph.paths();
        let pattern_paths = pattern_graph.paths();
        let overlap = path_overlap(source_graph, &pattern_graph);
        let similar_paths = similar_path_count(
            &source_paths,
            &pattern_paths,
            self.config.similarity_threshold,
        );
        let beam_matched_paths =
            beam_matched_count(&source_paths, &mined.trie, self.config.max_divergence);

        info!(
            "{} of {} paths match exactly, {} similar, {} beam-matched",
            overlap.matching_paths, overlap.all_paths, similar_paths, beam_matched_paths
        );

        Ok(ComparisonReport {
            source_statements: source_graph.node_count(),
            source_paths: source_paths.len(),
            sequences: mined.sequences,
            min_support: mined.min_support,
            patterns: mined.trie.len(),
            pattern_paths: pattern_paths.len(),
            overlap,
            similarity_threshold: self.config.similarity_threshold,
            similar_paths,
            max_divergence: self.config.max_divergence,
            beam_matched_paths,
        })
    }

    pub fn compare(&self, source: &Path, log_files: &[PathBuf]) -> Result<ComparisonReport> {
        let source_graph = self.source_graph(source)?;
        self.compare_graph(&source_graph, log_files)
    }

    /// Mine patterns over all `log_files`, then split each file's event stream
    ///
    /// Unreadable files are logged and have no entry in the result.
    pub fn segment_graph(
        &self,
        source_graph: &LogGraph,
        log_files: &[PathBuf],
    ) -> Vec<FileSegments> {
        let catalog = source_graph.catalog();
        let sequences = self.dataset(log_files, &catalog);
        let mined = self.mine(&sequences);
        let segmenter = TrieSegmenter::new(&mined.trie);

        log_files
            .iter()
            .filter_map(|log_file| {
                let events = match self.events(log_file, &catalog) {
                    Ok(events) => events,
                    Err(e) => {
                        warn!("skipping log file: {:#}", e);
                        return None;
                    }
                };
                let runs = segmenter.segment(events, |(_, id)| *id);
                Some(FileSegments {
                    file: log_file.clone(),
                    runs: runs
                        .into_iter()
                        .map(|run| run.into_iter().map(|(_, id)| id).collect())
                        .collect(),
                })
            })
            .collect()
    }

    pub fn segment(&self, source: &Path, log_files: &[PathBuf]) -> Result<Vec<FileSegments>> {
        let source_graph = self.source_graph(source)?;
        Ok(self.segment_graph(&source_graph, log_files))
    }
}
