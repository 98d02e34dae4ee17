use anyhow::{Context, Result, bail};
use clap::Parser;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Instant;

use facet_filter::config::{OutputConfig, OutputFormat, RequestsConfig};
use facet_filter::dsl::parse_filter_expression;
use facet_filter::pipeline::compile_requests;
use facet_filter::query::{Query, SearchRequest, Terms, compile_query, filter_text};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Full-text query (repeat to join terms with a space)
    #[arg(short, long)]
    pub query: Vec<String>,

    /// Filter expression (repeat to OR alternatives together)
    #[arg(short, long)]
    pub filters: Vec<String>,

    /// YAML file of named requests to compile as a batch
    #[arg(short, long, conflicts_with_all = ["query", "filters", "cst"])]
    pub requests: Option<PathBuf>,

    /// Output encoding (default: json)
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Emit search-index tokens instead of canonical queries
    #[arg(long)]
    pub token: bool,

    /// Flatten nested AND/OR chains into single nodes
    #[arg(long)]
    pub flatten: bool,

    /// Print the parse tree of the filters instead of compiling them
    #[arg(long, conflicts_with_all = ["token", "flatten"])]
    pub cst: bool,

    /// Output file (stdout if omitted or "-")
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of threads for batch compilation (default: all cores)
    #[arg(short, long, env = "FACET_FILTER_THREADS")]
    pub threads: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn run(cli: &Cli) -> Result<()> {
    match &cli.requests {
        Some(path) => run_batch(cli, path),
        None if cli.cst => run_cst(cli),
        None => run_single(cli),
    }
}

/// Repeated CLI values as request terms; a single value stays as-is.
pub fn terms(values: &[String]) -> Option<Terms> {
    match values {
        [] => None,
        [one] => Some(Terms::One(one.clone())),
        many => Some(Terms::Many(many.to_vec())),
    }
}

pub fn request_from_cli(cli: &Cli) -> SearchRequest {
    SearchRequest {
        query: terms(&cli.query),
        filters: terms(&cli.filters),
    }
}

/// CLI flags take precedence over the batch file's output section.
pub fn resolve_output(cli: &Cli, config: &OutputConfig) -> OutputConfig {
    OutputConfig {
        format: cli.format.or(config.format),
        token: cli.token || config.token,
        flatten: cli.flatten || config.flatten,
    }
}

pub fn render_query(query: &Query, output: &OutputConfig) -> Result<Value> {
    if output.token {
        return Ok(query.to_token());
    }
    serde_json::to_value(query).context("Output: Failed to serialize query")
}

pub fn encode(value: &Value, format: Option<OutputFormat>) -> Result<String> {
    match format.unwrap_or_default() {
        OutputFormat::Json => {
            let mut text =
                serde_json::to_string_pretty(value).context("Output: Failed to encode JSON")?;
            text.push('\n');
            Ok(text)
        }
        OutputFormat::Yaml => serde_yaml::to_string(value).context("Output: Failed to encode YAML"),
    }
}

pub fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(path) if path != Path::new("-") => {
            tracing::info!("Output: writing {} bytes to {:?}", contents.len(), path);
            std::fs::write(path, contents)
                .with_context(|| format!("Output: Failed to write {:?}", path))
        }
        _ => {
            print!("{}", contents);
            Ok(())
        }
    }
}

fn run_single(cli: &Cli) -> Result<()> {
    let request = request_from_cli(cli);
    let output = resolve_output(cli, &OutputConfig::default());

    let mut query = compile_query(&request).context("Compile: Failed to compile request")?;
    if output.flatten {
        query = query.flatten();
    }

    let value = render_query(&query, &output)?;
    write_output(cli.output.as_deref(), &encode(&value, output.format)?)
}

fn run_cst(cli: &Cli) -> Result<()> {
    let Some(filters) = terms(&cli.filters) else {
        bail!("CLI: --cst needs at least one --filters value");
    };

    let text = filter_text(&filters);
    let node = parse_filter_expression(&text).context("Parse: Failed to parse filters")?;
    write_output(cli.output.as_deref(), &format!("{}\n", node))
}

fn run_batch(cli: &Cli, path: &Path) -> Result<()> {
    let config = RequestsConfig::load(path)
        .with_context(|| format!("Config: Failed to load requests from {:?}", path))?;
    let output = resolve_output(cli, &config.output);
    let total = config.requests.len();
    tracing::info!("Requests: {} loaded from {:?}", total, path);

    let start = Instant::now();
    let compiled = compile_requests(&config.requests, output.flatten);

    let mut rendered = Map::new();
    let mut failed = 0usize;
    for entry in compiled {
        match entry.result {
            Ok(query) => {
                rendered.insert(entry.name, render_query(&query, &output)?);
            }
            Err(_) => failed += 1,
        }
    }

    write_output(
        cli.output.as_deref(),
        &encode(&Value::Object(rendered), output.format)?,
    )?;

    tracing::info!(
        "Done! Compiled {} of {} requests in {:.2}ms",
        total - failed,
        total,
        start.elapsed().as_secs_f64() * 1000.0
    );

    if failed > 0 {
        bail!("Batch: {} of {} requests failed", failed, total);
    }
    Ok(())
}
