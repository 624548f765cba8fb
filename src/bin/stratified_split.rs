use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;

use review_topics::{stratified_split, Config};

/// Split a labeled TSV file (`label<TAB>text` per line) into train and test
/// files that keep the label proportions.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    input: PathBuf,
    train_output: PathBuf,
    test_output: PathBuf,
    #[clap(long)]
    test_size: Option<f64>,
    #[clap(long)]
    n_splits: Option<usize>,
    #[clap(long)]
    seed: Option<u64>,
    #[clap(short, long, help = "JSON configuration file")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("review_topics=info")),
        )
        .init();

    let args = Args::parse();
    let mut split_config = Config::load(args.config.as_deref())
        .context("Failed to load configuration")?
        .split;
    if let Some(test_size) = args.test_size {
        split_config.test_size = test_size;
    }
    if let Some(n_splits) = args.n_splits {
        split_config.n_splits = n_splits;
    }
    if let Some(seed) = args.seed {
        split_config.random_state = seed;
    }

    let (labels, texts) = read_labeled(&args.input)?;
    println!("Read {} labeled rows from {}", labels.len(), args.input.display());

    let split = stratified_split(&texts, &labels, &split_config)?;

    write_labeled(&args.train_output, &split.train_labels, &split.train_features)?;
    write_labeled(&args.test_output, &split.test_labels, &split.test_features)?;

    println!(
        "Train: {} rows -> {}",
        split.train_labels.len(),
        args.train_output.display()
    );
    println!(
        "Test:  {} rows -> {}",
        split.test_labels.len(),
        args.test_output.display()
    );
    for (label, (train, test)) in class_counts(&split.train_labels, &split.test_labels) {
        println!("   {:<20} train {:<8} test {}", label, train, test);
    }

    Ok(())
}

fn read_labeled(path: &Path) -> Result<(Vec<String>, Vec<String>)> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let mut labels = Vec::new();
    let mut texts = Vec::new();
    for (number, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let Some((label, text)) = line.split_once('\t') else {
            bail!("{}:{}: expected `label<TAB>text`", path.display(), number + 1);
        };
        labels.push(label.trim().to_string());
        texts.push(text.to_string());
    }
    Ok((labels, texts))
}

fn write_labeled(path: &Path, labels: &[String], texts: &[String]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for (label, text) in labels.iter().zip(texts) {
        writeln!(writer, "{}\t{}", label, text)?;
    }
    writer.flush()?;
    Ok(())
}

fn class_counts<'a>(train: &'a [String], test: &'a [String]) -> BTreeMap<&'a str, (usize, usize)> {
    let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for label in train {
        counts.entry(label).or_default().0 += 1;
    }
    for label in test {
        counts.entry(label).or_default().1 += 1;
    }
    counts
}
