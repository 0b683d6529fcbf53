use wordflow_core::config::{PayloadConfig, SourceConfig, WordflowConfig};
use wordflow_core::pipeline::build_pipeline;
use wordflow_core::registry::EncoderRegistry;
use wordflow_core::source::{SourceIter, WordSource};
use wordflow_core::tuple::{Slot, ZipDriver};
use wordflow_core::word::{Word, WordTuple};

use anyhow::Context;
use clap::Parser;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_FILE: &str = "wordflow.toml";

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(short, long, value_parser)]
    config_file: Option<PathBuf>,
    /// Adds a payload reading one word per line from this file.
    #[clap(short, long)]
    wordlist: Option<PathBuf>,
    /// Adds a payload counting from START to END, e.g. `0-100`.
    #[clap(short, long)]
    range: Option<String>,
    /// Adds a payload of comma separated literal values.
    #[clap(long, value_delimiter = ',')]
    values: Option<Vec<String>>,
    /// Encoder token applied to command-line payloads, e.g. `md5` or `base64@urlencode`.
    #[clap(short = 'e', long = "encoder")]
    encoders: Vec<String>,
    #[clap(short, long)]
    limit: Option<u64>,
    #[clap(long)]
    seed: Option<u64>,
    /// Prints each payload tuple as a JSON array of words.
    #[clap(long)]
    json: bool,
    #[clap(long)]
    list_encoders: bool,
}

fn parse_range(range: &str) -> Result<(i64, i64), anyhow::Error> {
    let (start, end) = range
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == '-')
        .map(|(idx, _)| (&range[..idx], &range[idx + 1..]))
        .ok_or_else(|| anyhow::anyhow!("Range {range:?} must look like START-END"))?;
    let start = start
        .parse()
        .with_context(|| format!("Invalid range start in {range:?}"))?;
    let end = end
        .parse()
        .with_context(|| format!("Invalid range end in {range:?}"))?;
    Ok((start, end))
}

fn load_config(cli: &Cli) -> Result<WordflowConfig, anyhow::Error> {
    let mut config = match &cli.config_file {
        Some(config_path) => WordflowConfig::load_from_file(config_path)?,
        None => {
            let default_config_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_config_path.exists() {
                WordflowConfig::load_from_file(&default_config_path)?
            } else {
                WordflowConfig::default()
            }
        }
    };

    if let Some(seed) = cli.seed {
        config.generator.seed = seed;
    }
    if let Some(limit) = cli.limit {
        config.generator.limit = Some(limit);
    }

    let mut extra_sources = Vec::new();
    if let Some(path) = &cli.wordlist {
        extra_sources.push(SourceConfig::File { path: path.clone() });
    }
    if let Some(range) = &cli.range {
        let (start, end) = parse_range(range)?;
        extra_sources.push(SourceConfig::Range {
            start,
            end,
            width: 0,
        });
    }
    if let Some(values) = &cli.values {
        extra_sources.push(SourceConfig::List {
            values: values.clone(),
        });
    }
    config
        .payloads
        .extend(extra_sources.into_iter().map(|source| PayloadConfig {
            source,
            encoders: cli.encoders.clone(),
        }));

    Ok(config)
}

fn init_tracing(default_level: &str) -> Result<(), anyhow::Error> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))
}

fn print_encoders(registry: &EncoderRegistry) -> Result<(), anyhow::Error> {
    let mut out = BufWriter::new(std::io::stdout().lock());
    writeln!(out, "{:<18} {:<20} DESCRIPTION", "NAME", "CATEGORIES")?;
    for encoder in registry.encoders() {
        writeln!(
            out,
            "{:<18} {:<20} {}",
            encoder.name(),
            encoder.categories().join(","),
            encoder.description()
        )?;
    }
    out.flush()?;
    Ok(())
}

fn format_tuple(tuple: &WordTuple, json: bool) -> Result<String, anyhow::Error> {
    if json {
        return Ok(serde_json::to_string(tuple)?);
    }
    Ok(tuple.iter().map(Word::content).collect::<Vec<_>>().join("\t"))
}

fn emit(pipeline: &mut ZipDriver, limit: Option<u64>, json: bool) -> Result<u64, anyhow::Error> {
    let mut out = BufWriter::new(std::io::stdout().lock());
    let max = limit.map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
    let mut produced = 0u64;
    for tuple in SourceIter::new(pipeline).take(max) {
        let tuple = tuple?;
        writeln!(out, "{}", format_tuple(&tuple, json)?)?;
        produced += 1;
    }
    out.flush()?;
    Ok(produced)
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config.generator.log_level)?;
    debug!(?config, "effective configuration");

    let registry = EncoderRegistry::with_defaults(config.generator.seed);
    if cli.list_encoders {
        return print_encoders(&registry);
    }

    config.validate()?;
    let mut pipeline = build_pipeline(&config, Arc::new(registry))?;
    info!(
        payloads = config.payloads.len(),
        width = pipeline.width(),
        total = %pipeline.count(),
        "starting payload generation"
    );

    let start_time = Instant::now();
    let result = emit(&mut pipeline, config.generator.limit, cli.json);
    pipeline.cleanup();

    let produced = result?;
    info!(
        produced,
        elapsed = ?start_time.elapsed(),
        "payload generation finished"
    );
    Ok(())
}
