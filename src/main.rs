use anyhow::{Context, Result, bail};
use chunkwise::logging::init_logging;
use chunkwise::{
    Chunk, ChunkMetadata, HfLoader, Settings, Strategy, Tokenizer, TokenizerProvider, score_chunks,
    segment,
};
use clap::Parser;
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Split text into embedding-sized chunks and grade each one
#[derive(Parser, Debug)]
#[command(name = "chunkwise", version)]
struct Cli {
    /// Text file to chunk (reads stdin when omitted)
    input: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// tokens, paragraph, sentence or hybrid
    #[arg(short, long)]
    strategy: Option<Strategy>,

    /// Token budget per chunk
    #[arg(short, long)]
    max_tokens: Option<usize>,

    /// Tokens shared between consecutive fixed-token chunks
    #[arg(short, long)]
    overlap: Option<usize>,

    /// Tokenizer id for exact counts (see --list-tokenizers)
    #[arg(short, long)]
    tokenizer: Option<String>,

    /// Directory holding <model>/tokenizer.json files
    #[arg(long)]
    tokenizer_dir: Option<PathBuf>,

    /// Print chunks and metadata as JSON
    #[arg(long)]
    json: bool,

    /// List configured tokenizers and exit
    #[arg(long)]
    list_tokenizers: bool,

    /// List chunking strategies and exit
    #[arg(long)]
    list_strategies: bool,
}

#[derive(Serialize)]
struct ChunkReport<'a> {
    index: usize,
    #[serde(flatten)]
    chunk: &'a Chunk,
    metadata: &'a ChunkMetadata,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings =
        Settings::extract(cli.config.as_deref()).context("Failed to load configuration")?;
    apply_overrides(&mut settings, &cli);
    settings.validate().context("Invalid settings")?;

    init_logging(&settings.logging).context("Failed to initialise logging")?;

    let mut loader = HfLoader::new();
    if let Some(dir) = &settings.tokenizer_dir {
        loader = loader.with_local_dir(dir);
    }
    let provider = TokenizerProvider::new(settings.registry()?, loader);

    if cli.list_tokenizers {
        for config in provider.configs() {
            println!(
                "{:<16} {:>6} tokens  {}  ({})",
                config.id, config.context_window, config.name, config.description
            );
        }
        return Ok(());
    }

    if cli.list_strategies {
        for strategy in Strategy::ALL {
            println!(
                "{:<10} {:<13} {}",
                strategy.id(),
                strategy.name(),
                strategy.description()
            );
        }
        return Ok(());
    }

    let text = read_input(cli.input.as_ref())?;
    let chunking = &settings.chunking;
    let options = chunking.options();

    let tokenizer: Option<Arc<dyn Tokenizer>> = match &chunking.tokenizer {
        Some(id) => Some(
            provider
                .load(id)
                .await
                .with_context(|| format!("Failed to load tokenizer {}", id))?,
        ),
        None => None,
    };

    let started = Instant::now();
    let chunks = segment(&text, chunking.strategy, &options, tokenizer.as_deref());
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    let scores = score_chunks(&texts, chunking.strategy, &options, tokenizer.as_deref());
    let elapsed = started.elapsed();

    let reports: Vec<ChunkReport> = chunks
        .iter()
        .enumerate()
        .filter_map(|(index, chunk)| {
            scores.get(&index).map(|metadata| ChunkReport {
                index,
                chunk,
                metadata,
            })
        })
        .collect();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        let meta = report.metadata;
        println!(
            "#{:<3} {:>5} tokens{} {:>4}%  {:<9} {} words, {} sentences",
            report.index,
            meta.token_count,
            if meta.estimated { "~" } else { " " },
            meta.utilization,
            meta.quality,
            meta.word_count,
            meta.sentence_count
        );
        println!("     {}", preview(&report.chunk.text, 72));
    }

    println!(
        "\n✓ {} chunks ({} strategy, max {} tokens, overlap {}) [{:.3}s]",
        reports.len(),
        chunking.strategy,
        options.max_tokens,
        options.overlap,
        elapsed.as_secs_f64()
    );

    Ok(())
}

/// Command-line flags win over file and environment settings
fn apply_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(strategy) = cli.strategy {
        settings.chunking.strategy = strategy;
    }
    if let Some(max_tokens) = cli.max_tokens {
        settings.chunking.max_tokens = max_tokens;
    }
    if let Some(overlap) = cli.overlap {
        settings.chunking.overlap = overlap;
    }
    if let Some(tokenizer) = &cli.tokenizer {
        settings.chunking.tokenizer = Some(tokenizer.clone());
    }
    if let Some(dir) = &cli.tokenizer_dir {
        settings.tokenizer_dir = Some(dir.clone());
    }
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    if text.trim().is_empty() {
        bail!("No input text");
    }
    Ok(text)
}

/// First line of `text`, cut to `width` characters
fn preview(text: &str, width: usize) -> String {
    let line = text.trim().lines().next().unwrap_or("");
    if line.chars().count() <= width {
        return line.to_string();
    }
    let cut: String = line.chars().take(width.saturating_sub(1)).collect();
    format!("{}…", cut)
}
