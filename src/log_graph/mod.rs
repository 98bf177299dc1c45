//! Log graphs: log statements connected by dominance or pattern order
//!
//! # Edge convention
//!
//! Every edge points from a statement to the statement that precedes it:
//!
//! - [`LogGraph::from_source`]: statement → its immediate dominator
//! - [`LogGraph::from_patterns`]: next event → the pattern prefix event it extends
//!
//! Both factories use the same direction so that roots (out-degree 0) are the
//! statements that execute first and leafs (in-degree 0) those that execute
//! last, and paths read in execution order in either graph. That is what makes
//! path sets from the two sources comparable.
//!
//! ```text
//!   source rows                 graph                    paths
//!   idom  id                    0 ◄── 1 ◄── 2            [0, 1, 2]
//!    -1   0                           ▲                  [0, 1, 3]
//!     0   1                           └── 3
//!     1   2
//!     1   3
//! ```
//!
//! Nodes are stored in an id-keyed table next to a `petgraph` `DiGraphMap`,
//! so dominator lookups and "who do I dominate" queries are both map lookups
//! without any owning parent/child pointers.

mod analyzer;
mod rows;
mod statement;

pub use analyzer::{AnalysisError, Analyzer, AnalyzerConfig, CLASSPATH_ENV};
pub use rows::{to_record, AnalyzerCommand, AnalyzerRow, RecordReader};
pub use statement::LogStatement;

use crate::catalog::{EventCatalog, EventId};
use crate::trie::PatternTrie;
use petgraph::algo::{astar, toposort};
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors raised by log graph construction and queries
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("no path from event {from} to event {to}")]
    NoPath { from: EventId, to: EventId },

    #[error("event {event_id} referenced by {referenced_by} is not in the graph")]
    UnknownEvent {
        event_id: EventId,
        referenced_by: String,
    },

    #[error("dominator relation is cyclic at event {event_id}")]
    DominatorCycle { event_id: EventId },

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Result type for log graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

/// Root-to-leaf sequence of event ids
pub type LogPath = Vec<EventId>;

/// Directed graph of log statements
#[derive(Debug, Clone, Default)]
pub struct LogGraph {
    graph: DiGraphMap<EventId, ()>,
    statements: BTreeMap<EventId, LogStatement>,
}

impl LogGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the dominator graph of a source tree with the external analyzer
    pub fn from_source(source: &Path, analyzer: &Analyzer) -> Result<Self> {
        Self::from_source_with(source, analyzer, AnalyzerCommand::Output)
    }

    /// Like [`LogGraph::from_source`] with an explicit analyzer command
    pub fn from_source_with(
        source: &Path,
        analyzer: &Analyzer,
        command: AnalyzerCommand,
    ) -> Result<Self> {
        let rows = analyzer.rows(source, command)?;
        let graph = Self::from_rows(&rows)?;
        debug!(
            "built source log graph for {}: {} statements, {} dominator edges",
            source.display(),
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Build a dominator graph from analyzer rows
    ///
    /// One node per distinct event id (the first row wins), one edge per
    /// distinct event id with a dominator; later rows repeating an id are
    /// ignored, edge included. A dominator id without its own row is a data
    /// inconsistency and fails with [`GraphError::UnknownEvent`]; a cyclic
    /// dominator relation fails with [`GraphError::DominatorCycle`].
    pub fn from_rows(rows: &[AnalyzerRow]) -> Result<Self> {
        let mut log_graph = Self::new();
        for row in rows {
            log_graph.add_statement(LogStatement::from_row(row));
        }

        let mut wired = HashSet::new();
        for row in rows {
            if !wired.insert(row.event_id) {
                debug!("ignoring repeated row for event {}", row.event_id);
                continue;
            }
            if let Some(idom) = row.immediate_dominator {
                if !log_graph.contains(idom) {
                    return Err(GraphError::UnknownEvent {
                        event_id: idom,
                        referenced_by: format!("dominator of event {}", row.event_id),
                    });
                }
                log_graph.graph.add_edge(row.event_id, idom, ());
            }
        }

        if let Err(cycle) = toposort(&log_graph.graph, None) {
            return Err(GraphError::DominatorCycle {
                event_id: cycle.node_id(),
            });
        }

        Ok(log_graph)
    }

    /// Build a pattern-successor graph from a mined trie
    ///
    /// Each trie edge `prefix event → next event` becomes the graph edge
    /// `next event → prefix event`. The same event id can sit at many depths
    /// of the trie; every trie path contributes its own edges and the graph
    /// merges them. A repeat of the same event (`a → a`) adds no edge.
    pub fn from_patterns(trie: &PatternTrie<EventId>) -> Self {
        let mut log_graph = Self::new();
        let mut stack: Vec<(Option<EventId>, &PatternTrie<EventId>)> = vec![(None, trie)];

        while let Some((parent, node)) = stack.pop() {
            for (&event_id, child) in node.children() {
                if !log_graph.contains(event_id) {
                    log_graph.add_statement(LogStatement::bare(event_id));
                }
                if let Some(parent) = parent.filter(|&parent| parent != event_id) {
                    log_graph.graph.add_edge(event_id, parent, ());
                }
                stack.push((Some(event_id), child));
            }
        }

        log_graph
    }

    /// Insert a statement, keeping any richer metadata already present
    pub fn add_statement(&mut self, statement: LogStatement) {
        let event_id = statement.event_id;
        match self.statements.get(&event_id) {
            Some(existing) if !existing.is_bare() || statement.is_bare() => {}
            _ => {
                self.statements.insert(event_id, statement);
            }
        }
        self.graph.add_node(event_id);
    }

    /// Merge another graph into this one
    ///
    /// Colliding event ids denote the same statement.
    pub fn union(&mut self, other: &LogGraph) {
        for statement in other.statements.values() {
            self.add_statement(statement.clone());
        }
        for (from, to, _) in other.graph.all_edges() {
            self.graph.add_edge(from, to, ());
        }
    }

    pub fn contains(&self, event_id: EventId) -> bool {
        self.statements.contains_key(&event_id)
    }

    pub fn statement(&self, event_id: EventId) -> Option<&LogStatement> {
        self.statements.get(&event_id)
    }

    /// Statements in event id order
    pub fn iter(&self) -> impl Iterator<Item = &LogStatement> {
        self.statements.values()
    }

    pub fn node_count(&self) -> usize {
        self.statements.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Edges as `(statement, predecessor)` pairs
    pub fn edges(&self) -> impl Iterator<Item = (EventId, EventId)> + '_ {
        self.graph.all_edges().map(|(from, to, _)| (from, to))
    }

    /// The statement `event_id` points at: its immediate dominator or pattern prefix
    pub fn idom(&self, event_id: EventId) -> Option<&LogStatement> {
        self.graph
            .neighbors_directed(event_id, Direction::Outgoing)
            .next()
            .and_then(|idom| self.statement(idom))
    }

    /// Statements directly preceded by `event_id`
    pub fn dominated(&self, event_id: EventId) -> Vec<EventId> {
        let mut ids: Vec<_> = self
            .graph
            .neighbors_directed(event_id, Direction::Incoming)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Dominator chain of `event_id`, nearest first, excluding itself
    ///
    /// Stops at a root, or at the first repeat if the data is inconsistent.
    pub fn dominators(&self, event_id: EventId) -> Vec<&LogStatement> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([event_id]);
        let mut current = event_id;
        while let Some(idom) = self.idom(current) {
            if !seen.insert(idom.event_id) {
                break;
            }
            chain.push(idom);
            current = idom.event_id;
        }
        chain
    }

    /// Statements with no predecessor (out-degree 0)
    pub fn roots(&self) -> Vec<&LogStatement> {
        self.statements
            .values()
            .filter(|s| {
                self.graph
                    .neighbors_directed(s.event_id, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .collect()
    }

    /// Statements nothing follows (in-degree 0)
    pub fn leafs(&self) -> Vec<&LogStatement> {
        self.statements
            .values()
            .filter(|s| {
                self.graph
                    .neighbors_directed(s.event_id, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect()
    }

    /// Every root-to-leaf path
    ///
    /// Walks from each leaf towards its predecessors, never revisiting a node
    /// already on the current path, and records the path (reversed into
    /// execution order) when no unvisited predecessor remains. For an acyclic
    /// graph this is exactly the set of root-to-leaf paths; for inconsistent
    /// data it still terminates and every leaf ends at least one path.
    pub fn paths(&self) -> Vec<LogPath> {
        let mut paths = Vec::new();

        for leaf in self.leafs() {
            let mut stack: Vec<LogPath> = vec![vec![leaf.event_id]];
            while let Some(walk) = stack.pop() {
                let Some(&current) = walk.last() else {
                    continue;
                };
                let mut predecessors: Vec<_> = self
                    .graph
                    .neighbors_directed(current, Direction::Outgoing)
                    .filter(|next| !walk.contains(next))
                    .collect();

                if predecessors.is_empty() {
                    let mut path = walk;
                    path.reverse();
                    paths.push(path);
                    continue;
                }

                predecessors.sort_unstable_by(|a, b| b.cmp(a));
                for next in predecessors {
                    let mut extended = walk.clone();
                    extended.push(next);
                    stack.push(extended);
                }
            }
        }

        paths
    }

    /// Paths as statements instead of ids
    pub fn statement_paths(&self) -> Vec<Vec<&LogStatement>> {
        self.paths()
            .into_iter()
            .map(|path| path.iter().filter_map(|id| self.statement(*id)).collect())
            .collect()
    }

    /// Fewest-edge path from `from` to `to` following edge direction
    pub fn shortest_path(&self, from: EventId, to: EventId) -> Result<LogPath> {
        for (event_id, role) in [(from, "path start"), (to, "path end")] {
            if !self.contains(event_id) {
                return Err(GraphError::UnknownEvent {
                    event_id,
                    referenced_by: role.to_string(),
                });
            }
        }

        astar(&self.graph, from, |node| node == to, |_| 1usize, |_| 0)
            .map(|(_, path)| path)
            .ok_or(GraphError::NoPath { from, to })
    }

    /// Location → event id table for resolving log lines against this graph
    pub fn catalog(&self) -> EventCatalog {
        EventCatalog::from_assigned(
            self.statements
                .values()
                .filter_map(|s| s.location.clone().map(|loc| (loc, s.event_id))),
        )
    }
}
