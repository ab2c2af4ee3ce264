use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use navrewrite::config::{CliConfig, RewriterConfig, SizeAccessorPolicy};
use navrewrite::debug_print;
use navrewrite::entity_catalog::EntityCatalogConfig;
use navrewrite::query_planner::logical_expr::visitors::{walk_expression, ExpressionVisitor};
use navrewrite::query_planner::logical_expr::{ExprRef, LogicalExpr, ParameterExpr};
use navrewrite::query_planner::navigation::AliasTables;
use navrewrite::rewrite_navigations;

/// navrewrite - rewrite collection navigations in a query expression into correlated subqueries
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Entity catalog YAML
    #[arg(long)]
    model: PathBuf,

    /// Expression tree JSON
    #[arg(long)]
    expr: PathBuf,

    /// Root parameter the alias tables refer to (defaults to the first
    /// parameter of a top-level lambda, else the first parameter found)
    #[arg(long)]
    root: Option<String>,

    /// Alias tables JSON
    #[arg(long)]
    aliases: Option<PathBuf>,

    /// Rewriter configuration YAML (defaults to NAVREWRITE_* environment variables)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Collection member rewritten to Count (repeatable)
    #[arg(long = "size-accessor")]
    size_accessors: Vec<String>,

    /// What to do with unknown size accessors: fail or pass_through
    #[arg(long)]
    size_accessor_policy: Option<SizeAccessorPolicy>,

    /// Maximum expression nesting depth
    #[arg(long)]
    max_depth: Option<u32>,

    /// Print the rewritten tree as JSON instead of its compact text form
    #[arg(long)]
    json: bool,
}

impl From<&Cli> for CliConfig {
    fn from(cli: &Cli) -> Self {
        CliConfig {
            size_accessors: cli.size_accessors.clone(),
            unsupported_size_accessor: cli.size_accessor_policy,
            max_depth: cli.max_depth,
        }
    }
}

/// Finds the first parameter node, optionally by name.
struct FindParameter<'a> {
    name: Option<&'a str>,
    found: Option<ParameterExpr>,
}

impl ExpressionVisitor for FindParameter<'_> {
    type Output = ();

    fn visit_parameter(&mut self, param: &ParameterExpr) {
        if self.found.is_none() && self.name.is_none_or(|name| name == param.name) {
            self.found = Some(param.clone());
        }
    }
}

fn resolve_root(expr: &LogicalExpr, name: Option<&str>) -> Result<ParameterExpr> {
    if name.is_none() {
        if let Some(param) = expr.as_lambda().and_then(|l| l.params.first()) {
            return Ok(param.clone());
        }
    }
    let mut finder = FindParameter { name, found: None };
    walk_expression(expr, &mut finder);
    finder.found.ok_or_else(|| match name {
        Some(name) => anyhow!("Root parameter `{}` does not occur in the expression", name),
        None => anyhow!("Expression has no parameters to root the rewrite at"),
    })
}

fn load_config(path: Option<&Path>, cli: CliConfig) -> Result<RewriterConfig> {
    let mut config = match path {
        Some(path) => RewriterConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load rewriter config {}", path.display()))?,
        None => RewriterConfig::from_env().context("Invalid NAVREWRITE_* environment")?,
    };
    config.merge(cli).context("Invalid command line configuration")?;
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let catalog = EntityCatalogConfig::from_yaml_file(&cli.model)
        .and_then(|config| config.to_catalog())
        .with_context(|| format!("Failed to load entity catalog {}", cli.model.display()))?;
    log::info!(
        "Loaded catalog with entity types: {}",
        catalog.entity_names().join(", ")
    );

    let expr_json = fs::read_to_string(&cli.expr)
        .with_context(|| format!("Failed to read {}", cli.expr.display()))?;
    let expr: ExprRef = Arc::new(
        serde_json::from_str(&expr_json)
            .with_context(|| format!("Failed to parse expression {}", cli.expr.display()))?,
    );

    let (aliases, found_paths) = match &cli.aliases {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let tables: AliasTables = serde_json::from_str(&json)
                .with_context(|| format!("Failed to parse alias tables {}", path.display()))?;
            tables.resolve(&catalog)?
        }
        None => AliasTables::default().resolve(&catalog)?,
    };

    let config = load_config(cli.config.as_deref(), CliConfig::from(&cli))?;
    let root = resolve_root(&expr, cli.root.as_deref())?;
    debug_print!("navrewrite: root={} config={:?}", root.name, config);

    let rewritten = rewrite_navigations(&expr, &catalog, root, &aliases, &found_paths, &config)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(rewritten.as_ref())?);
    } else {
        println!("{}", rewritten);
    }
    Ok(())
}

fn main() {
    // Initialize logger - defaults to WARN level, can be overridden with RUST_LOG env var
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
