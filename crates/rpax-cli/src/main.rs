//! `rpax` — the command-line driver for the RPA project analyzer
//! (spec.md §6). Out of scope for the library crates by design; this
//! binary is the thin edge that wires config/logging/diagnostics around
//! `rpax-core`/`rpax-parser`/`rpax-graph`/`rpax-lake`.

mod http;
mod lake_read;
mod logging;
mod pipeline;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rpax_core::config::{OutputSchema, RpaxConfig};
use rpax_core::diagnostics::{make_run_id, DiagnosticsCollector};
use rpax_lake::validate::{validate, LakeView, RuleStatus};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rpax")]
#[command(about = "Analyze RPA projects into a content-addressed artifact lake", long_about = None)]
#[command(version)]
struct Cli {
    /// Lake output directory (overrides `.rpax.json`'s `output.dir`).
    #[arg(long, global = true)]
    lake: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemaArg {
    Legacy,
    V0,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Table,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline for one or more project paths and write artifacts.
    Parse {
        /// Project root directories (each must contain `project.json`).
        paths: Vec<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, value_enum)]
        schema: Option<SchemaArg>,
    },

    /// Read-only lookups in the lake.
    List {
        #[command(subcommand)]
        what: ListTarget,
    },

    /// Emit pseudocode from the lake.
    Pseudocode {
        #[arg(long)]
        project: Option<String>,
        /// Render every workflow's pseudocode.
        #[arg(long)]
        all: bool,
        /// A specific workflow ID to render.
        workflow: Option<String>,
    },

    /// Run the validation framework. Exit 0 on pass/warn, 1 on fail.
    Validate {
        #[arg(long)]
        project: Option<String>,
    },

    /// List projects in a multi-project lake.
    Projects,

    /// Destructive. Dry-run by default; `--force` required to delete.
    Clear {
        #[arg(value_enum)]
        target: ClearTarget,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        force: bool,
    },

    /// Start the loopback-only read-only HTTP status endpoint.
    Serve {
        #[arg(long, default_value = "127.0.0.1:4411")]
        bind: String,
    },
}

#[derive(Subcommand)]
enum ListTarget {
    Workflows {
        #[arg(long)]
        project: Option<String>,
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    Roots {
        #[arg(long)]
        project: Option<String>,
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    Activities {
        #[arg(long)]
        project: Option<String>,
        workflow: String,
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ClearTarget {
    Artifacts,
    Project,
    Lake,
}

fn lake_root(cli: &Cli, config: &RpaxConfig) -> PathBuf {
    cli.lake.clone().unwrap_or_else(|| config.output.dir.clone())
}

fn load_config(explicit_root: Option<&Path>) -> Result<RpaxConfig> {
    let start = explicit_root
        .map(Path::to_path_buf)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    match RpaxConfig::discover(&start).context("reading .rpax.json")? {
        Some((_, config)) => Ok(config),
        None => Ok(RpaxConfig::default()),
    }
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Parse { paths, out, schema } => run_parse(&cli, paths, out.as_deref(), *schema),
        Commands::List { what } => run_list(&cli, what),
        Commands::Pseudocode { project, all, workflow } => run_pseudocode(&cli, project.as_deref(), *all, workflow.as_deref()),
        Commands::Validate { project } => run_validate(&cli, project.as_deref()),
        Commands::Projects => run_projects(&cli),
        Commands::Clear { target, project, force } => run_clear(&cli, *target, project.as_deref(), *force),
        Commands::Serve { bind } => run_serve(&cli, bind),
    }
}

fn run_parse(cli: &Cli, paths: &[PathBuf], out: Option<&std::path::Path>, schema: Option<SchemaArg>) -> Result<()> {
    if paths.is_empty() {
        anyhow::bail!("parse requires at least one project path");
    }

    let run_suffix = uuid::Uuid::new_v4().simple().to_string();
    let run_id = make_run_id(chrono::Utc::now(), &run_suffix[..8]);
    let diagnostics = DiagnosticsCollector::new(run_id.clone());

    let mut exit_code = 0;
    for path in paths {
        let mut config = load_config(Some(path))?;
        if let Some(out) = out {
            config.output.dir = out.to_path_buf();
        }
        if let Some(schema) = schema {
            config.output.schema = match schema {
                SchemaArg::Legacy => OutputSchema::Legacy,
                SchemaArg::V0 => OutputSchema::V0,
            };
        }
        let lake = lake_root(cli, &config);

        match pipeline::run_project(path, &lake, &config, &diagnostics) {
            Ok(outcome) => {
                println!(
                    "{} {}: {} workflows, {} cycles -> {}",
                    "parsed".green().bold(),
                    outcome.project_slug,
                    outcome.index.total_workflows,
                    outcome.call_graph.metrics.cycles_detected,
                    outcome.project_dir.display()
                );
            }
            Err(e) => {
                eprintln!("{} failed to parse {}: {e}", "error:".red().bold(), path.display());
                exit_code = 1;
            }
        }

        let lake_for_flush = lake;
        if let Err(e) = rpax_lake::flush_diagnostics(&lake_for_flush, &run_id, &diagnostics.snapshot()) {
            eprintln!("{} failed to flush diagnostics: {e}", "warning:".yellow().bold());
        }
    }

    if diagnostics.has_critical() {
        eprintln!(
            "{} critical diagnostics were recorded; see _errors/{run_id}.json",
            "error:".red().bold()
        );
        exit_code = 1;
    }

    std::process::exit(exit_code);
}

fn print_rows(format: OutputFormat, headers: &[&str], rows: Vec<Vec<String>>) {
    match format {
        OutputFormat::Json => {
            let objs: Vec<_> = rows
                .iter()
                .map(|row| {
                    headers
                        .iter()
                        .zip(row.iter())
                        .map(|(h, v)| (h.to_string(), v.clone()))
                        .collect::<serde_json::Map<_, _>>()
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&objs).unwrap());
        }
        OutputFormat::Table => {
            println!("{}", headers.join(" | "));
            for row in rows {
                println!("{}", row.join(" | "));
            }
        }
    }
}

fn run_list(cli: &Cli, what: &ListTarget) -> Result<()> {
    let config = load_config(None)?;
    let lake = lake_root(cli, &config);

    match what {
        ListTarget::Workflows { project, format } => {
            let slug = lake_read::resolve_project_slug(&lake, project.as_deref())?;
            let index = lake_read::read_workflow_index(&lake, &slug)?;
            let rows = index
                .workflows
                .iter()
                .map(|w| {
                    vec![
                        w.workflow_id.clone(),
                        format!("{:?}", w.kind),
                        w.parse_successful.to_string(),
                        w.composite_id.clone(),
                    ]
                })
                .collect();
            print_rows(*format, &["workflow_id", "kind", "parsed", "composite_id"], rows);
        }
        ListTarget::Roots { project, format } => {
            let slug = lake_read::resolve_project_slug(&lake, project.as_deref())?;
            let graph = lake_read::read_call_graph(&lake, &slug)?;
            let rows = graph
                .nodes
                .iter()
                .filter(|n| n.is_entry_point)
                .map(|n| vec![n.workflow_id.clone(), n.relative_path.clone(), n.call_depth.to_string()])
                .collect();
            print_rows(*format, &["workflow_id", "relative_path", "call_depth"], rows);
        }
        ListTarget::Activities { project, workflow, format } => {
            let slug = lake_read::resolve_project_slug(&lake, project.as_deref())?;
            let path = lake.join(&slug).join("activities").join(format!("{workflow}.json"));
            let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
            let tree: rpax_core::activity::ActivityTree = serde_json::from_str(&raw)?;
            let rows = tree
                .nodes
                .iter()
                .map(|n| {
                    vec![
                        n.node_id.clone(),
                        n.activity_type.clone(),
                        n.display_name.clone().unwrap_or_default(),
                        n.depth.to_string(),
                    ]
                })
                .collect();
            print_rows(*format, &["node_id", "type", "display_name", "depth"], rows);
        }
    }
    Ok(())
}

fn run_pseudocode(cli: &Cli, project: Option<&str>, all: bool, workflow: Option<&str>) -> Result<()> {
    let config = load_config(None)?;
    let lake = lake_root(cli, &config);
    let slug = lake_read::resolve_project_slug(&lake, project)?;

    let ids: Vec<String> = if all || workflow.is_none() {
        lake_read::read_pseudocode_index(&lake, &slug)?
    } else {
        vec![workflow.unwrap().to_string()]
    };

    for id in ids {
        let doc = lake_read::read_pseudocode(&lake, &slug, &id)?;
        println!("# {}", doc.workflow_id);
        println!("{}", doc.expanded.as_ref().unwrap_or(&doc.pseudocode));
        println!();
    }
    Ok(())
}

fn run_validate(cli: &Cli, project: Option<&str>) -> Result<()> {
    let config = load_config(None)?;
    let lake = lake_root(cli, &config);
    let slug = lake_read::resolve_project_slug(&lake, project)?;

    let manifest = lake_read::read_manifest(&lake, &slug)?;
    let project_descriptor = lake_read::read_project_descriptor(&manifest)?;
    let index = lake_read::read_workflow_index(&lake, &slug)?;
    let call_graph = lake_read::read_call_graph(&lake, &slug)?;

    let view = LakeView {
        project: &project_descriptor,
        index: &index,
        call_graph: &call_graph,
        manifest_has_provenance: !manifest.schema_version.is_empty() && !manifest.generator_version.is_empty(),
    };
    let result = validate(&view, &config);

    for issue in &result.issues {
        let tag = format!("{:?}", issue.severity);
        let tag = match issue.severity {
            RuleStatus::Fail => tag.red().bold(),
            RuleStatus::Warn => tag.yellow().bold(),
            RuleStatus::Pass => tag.normal(),
        };
        println!("[{tag}] {}: {}", issue.rule_name, issue.message);
    }
    let status = result.overall_status();
    let status_str = format!("{status:?}");
    let status_str = match status {
        RuleStatus::Pass => status_str.green().bold(),
        RuleStatus::Warn => status_str.yellow().bold(),
        RuleStatus::Fail => status_str.red().bold(),
    };
    println!("overall: {status_str}");
    std::process::exit(result.exit_code());
}

fn run_projects(cli: &Cli) -> Result<()> {
    let config = load_config(None)?;
    let lake = lake_root(cli, &config);
    let index = lake_read::read_projects_index(&lake)?;
    for entry in &index.projects {
        println!("{}  {}  ({} workflows)", entry.project_slug, entry.project_name, entry.total_workflows);
    }
    Ok(())
}

fn run_clear(cli: &Cli, target: ClearTarget, project: Option<&str>, force: bool) -> Result<()> {
    let config = load_config(None)?;
    let lake = lake_root(cli, &config);

    let victim = match target {
        ClearTarget::Lake => lake.clone(),
        ClearTarget::Project => {
            let slug = lake_read::resolve_project_slug(&lake, project)?;
            lake.join(slug)
        }
        ClearTarget::Artifacts => {
            let slug = lake_read::resolve_project_slug(&lake, project)?;
            lake.join(slug)
        }
    };

    if !force {
        println!("{} would remove {}", "dry run:".yellow().bold(), victim.display());
        println!("pass --force to actually delete");
        return Ok(());
    }

    if victim.exists() {
        std::fs::remove_dir_all(&victim).with_context(|| format!("removing {}", victim.display()))?;
    }
    println!("{} {}", "removed".red().bold(), victim.display());
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn run_serve_async(bind: std::net::SocketAddr, lake: PathBuf, project_count: usize) -> Result<()> {
    http::serve(
        bind,
        http::StatusState {
            lake_root: lake,
            project_count,
            started_at: std::time::Instant::now(),
        },
    )
    .await
}

fn run_serve(cli: &Cli, bind: &str) -> Result<()> {
    let config = load_config(None)?;
    let lake = lake_root(cli, &config);
    let addr = http::parse_loopback_addr(bind)?;
    let project_count = lake_read::read_projects_index(&lake).map(|i| i.projects.len()).unwrap_or(0);
    run_serve_async(addr, lake, project_count)
}
