//! Fan-out over many projects
//!
//! Projects are independent: each one gets its own analyzer run and its own
//! graph, nothing is shared. Workers pull project indices from a lock-free
//! queue and send results back over a channel; results are reordered to
//! match the input. A failing (or panicking) project is logged and reported
//! in its outcome without affecting the others.

use anyhow::{anyhow, Context, Result};
use crossbeam::channel;
use crossbeam::queue::ArrayQueue;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{info, warn};

/// Result of the batch task for one project
#[derive(Debug)]
pub struct ProjectOutcome<T> {
    pub project: PathBuf,
    pub result: Result<T>,
}

/// Immediate subdirectories of `root`, sorted by path
pub fn discover_projects(root: &Path) -> Result<Vec<PathBuf>> {
    let mut projects = Vec::new();
    for entry in std::fs::read_dir(root)
        .with_context(|| format!("Failed to list projects in {}", root.display()))?
    {
        let path = entry?.path();
        if path.is_dir() {
            projects.push(path);
        }
    }
    projects.sort();
    Ok(projects)
}

/// Run `task` once per project on a pool of scoped worker threads
pub fn run_batch<T, F>(projects: &[PathBuf], task: F) -> Vec<ProjectOutcome<T>>
where
    T: Send,
    F: Fn(&Path) -> Result<T> + Sync,
{
    if projects.is_empty() {
        return Vec::new();
    }

    let workers = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(projects.len());

    let jobs = ArrayQueue::new(projects.len());
    for index in 0..projects.len() {
        // capacity equals the job count, so this never fails
        let _ = jobs.push(index);
    }
    let (sender, receiver) = channel::unbounded();

    let scoped = crossbeam::scope(|scope| {
        for _ in 0..workers {
            let sender = sender.clone();
            let jobs = &jobs;
            let task = &task;
            scope.spawn(move |_| {
                while let Some(index) = jobs.pop() {
                    let project = &projects[index];
                    let result = panic::catch_unwind(AssertUnwindSafe(|| task(project)))
                        .unwrap_or_else(|_| {
                            Err(anyhow!("task panicked for {}", project.display()))
                        });
                    if sender.send((index, result)).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(sender);
    if scoped.is_err() {
        warn!("a batch worker thread panicked");
    }

    let mut slots: Vec<Option<Result<T>>> = projects.iter().map(|_| None).collect();
    for (index, result) in receiver.try_iter() {
        slots[index] = Some(result);
    }

    let outcomes: Vec<ProjectOutcome<T>> = projects
        .iter()
        .zip(slots)
        .map(|(project, slot)| {
            let result = slot.unwrap_or_else(|| {
                Err(anyhow!("no result produced for {}", project.display()))
            });
            if let Err(e) = &result {
                warn!("{}: {:#}", project.display(), e);
            }
            ProjectOutcome {
                project: project.clone(),
                result,
            }
        })
        .collect();

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    info!(
        "batch finished: {} projects, {} failed",
        outcomes.len(),
        failed
    );
    outcomes
}
