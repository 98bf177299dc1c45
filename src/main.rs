use anyhow::{Context, Result};
use clap::Parser;
use loggraph::batch::{discover_projects, run_batch};
use loggraph::cli::{Cli, Commands};
use loggraph::config::PipelineConfig;
use loggraph::identifiers::StatementStats;
use loggraph::log_graph::{Analyzer, LogGraph};
use loggraph::pipeline::Pipeline;
use loggraph::report;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber; `--debug` forces TRACE
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_toml(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let mut config = load_config(args.config.as_deref())?;

    let output = match args.command {
        Commands::Graph { source, format } => {
            let analyzer = Analyzer::new(config.analyzer.clone());
            let graph = LogGraph::from_source(&source, &analyzer)
                .with_context(|| format!("Failed to build log graph for {}", source.display()))?;
            report::render_graph(&graph, format)?
        }
        Commands::Compare {
            source,
            logs,
            pipeline,
            format,
        } => {
            pipeline.apply(&mut config);
            config.validate()?;
            let report = Pipeline::new(config).compare(&source, &logs)?;
            report::render_comparison(&report, format)?
        }
        Commands::Stats { path, format } => {
            let projects = discover_projects(&path)?;
            let analyzer = Analyzer::new(config.analyzer.clone());
            let outcomes = run_batch(&projects, |project| {
                let graph = LogGraph::from_source(project, &analyzer)?;
                Ok(StatementStats::from_graph(&graph))
            });
            report::render_stats(&outcomes, format)?
        }
        Commands::Segment {
            source,
            logs,
            pipeline,
            format,
        } => {
            pipeline.apply(&mut config);
            config.validate()?;
            let segments = Pipeline::new(config).segment(&source, &logs)?;
            report::render_segments(&segments, format)?
        }
    };

    print!("{}", output);
    Ok(())
}
