use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use review_topics::{Config, Dictionary, LdaModel, TopicModeling};

#[derive(Parser, Debug)]
#[command(version, about = "Topic modeling for review text", long_about = None)]
struct Args {
    #[clap(short, long, global = true, help = "JSON configuration file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean raw reviews (one per line) and append them to a processed corpus
    Process {
        input: PathBuf,
        output: PathBuf,
    },
    /// Build, filter and save a dictionary from a processed corpus
    Dictionary {
        corpus: PathBuf,
        output: PathBuf,
        #[clap(long)]
        no_below: Option<usize>,
        #[clap(long)]
        no_above: Option<f64>,
        #[clap(long, help = "Also write the plain-text dictionary next to the JSON one")]
        text: bool,
    },
    /// Fit an LDA model on a processed corpus
    Train {
        corpus: PathBuf,
        #[clap(short, long)]
        dictionary: PathBuf,
        #[clap(short, long)]
        output: PathBuf,
        #[clap(short, long)]
        topics: Option<usize>,
        #[clap(short, long)]
        workers: Option<usize>,
        #[clap(long)]
        iterations: Option<usize>,
        #[clap(long)]
        seed: Option<u64>,
    },
    /// Print the top terms of one topic, or of all topics
    Topics {
        model: PathBuf,
        #[clap(short, long)]
        topic: Option<usize>,
        #[clap(long, default_value_t = 10)]
        topn: usize,
    },
    /// Assign topics to a new review
    Assign {
        #[clap(short, long)]
        dictionary: PathBuf,
        #[clap(short, long)]
        model: PathBuf,
        #[clap(long)]
        topics_returned: Option<usize>,
        #[clap(long)]
        min_top_freq: Option<f64>,
        text: Vec<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("review_topics=info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;

    match args.command {
        Command::Process { input, output } => {
            let reviews = read_reviews(&input)?;
            let mut modeling = TopicModeling::with_config(reviews, config);
            let written = modeling.process_training_data(&output, None)?;
            println!("Appended {} processed reviews to {}", written, output.display());
        }
        Command::Dictionary {
            corpus,
            output,
            no_below,
            no_above,
            text,
        } => {
            let modeling = TopicModeling::with_config(Vec::new(), config);
            let filter = &modeling.config().filter;
            let no_below = no_below.unwrap_or(filter.no_below);
            let no_above = no_above.unwrap_or(filter.no_above);

            let sentences = modeling.load_line_sentence(&corpus);
            let mut dictionary = modeling.create_dictionary(sentences.iter()?)?;
            let before = dictionary.len();
            modeling.filter_dictionary(&mut dictionary, no_below, no_above);
            modeling.save_dictionary(&dictionary, &output)?;
            if text {
                dictionary.save_as_text(&output.with_extension("txt"))?;
            }

            println!(
                "Dictionary: {} of {} tokens kept (no_below={}, no_above={})",
                dictionary.len(),
                before,
                no_below,
                no_above
            );
            for (token, count) in dictionary.most_common(10) {
                println!("   {:<20} {}", token, count);
            }
        }
        Command::Train {
            corpus,
            dictionary,
            output,
            topics,
            workers,
            iterations,
            seed,
        } => {
            let mut config = config;
            if let Some(iterations) = iterations {
                config.lda.iterations = iterations;
            }
            if let Some(seed) = seed {
                config.lda.random_seed = Some(seed);
            }
            let topics = topics.unwrap_or(config.lda.num_topics);
            let workers = workers.unwrap_or(config.lda.workers);

            let modeling = TopicModeling::with_config(Vec::new(), config);
            let dictionary = Dictionary::load(&dictionary)
                .with_context(|| format!("Failed to load dictionary {}", dictionary.display()))?;
            let bows = modeling.unigram_bow_generator(&dictionary, &corpus)?;
            let model = modeling.create_lda_model(bows, &dictionary, topics, workers)?;
            modeling.save_model(&model, &output)?;

            let bound = model.log_perplexity(modeling.unigram_bow_generator(&dictionary, &corpus)?);
            match bound {
                Ok(bound) => println!("Per-word likelihood bound: {:.3}", bound),
                Err(e) => info!("Skipping likelihood bound: {}", e),
            }
            println!("Saved {}-topic model to {}", model.num_topics(), output.display());
            for (topic, terms) in model.show_topics(5)? {
                let words: Vec<&str> = terms.iter().map(|(term, _)| term.as_str()).collect();
                println!("   {:<8} {}", topic, words.join(" "));
            }
        }
        Command::Topics { model, topic, topn } => {
            let modeling = TopicModeling::with_config(Vec::new(), config);
            let model = load_model(&model)?;
            println!(
                "{} topics over {} terms from {} documents (alpha={:.3}, eta={:.3}, seed={}, minimum probability={}, trained {})\n",
                model.num_topics(),
                model.num_terms(),
                model.num_documents(),
                model.alpha(),
                model.eta(),
                model.seed(),
                model.minimum_probability(),
                model.trained_at().format("%Y-%m-%d %H:%M:%S")
            );
            let topics: Vec<usize> = match topic {
                Some(topic) => vec![topic],
                None => (0..model.num_topics()).collect(),
            };
            for topic in topics {
                println!("Topic {}", topic);
                modeling.explore_topic(&model, topic, topn)?;
                println!();
            }
        }
        Command::Assign {
            dictionary,
            model,
            topics_returned,
            min_top_freq,
            text,
        } => {
            let modeling = TopicModeling::with_config(Vec::new(), config);
            let assign = &modeling.config().assign;
            let topics_returned = topics_returned.unwrap_or(assign.topics_returned);
            let min_top_freq = min_top_freq.unwrap_or(assign.min_top_freq);

            let dictionary = Dictionary::load(&dictionary)
                .with_context(|| format!("Failed to load dictionary {}", dictionary.display()))?;
            let model = load_model(&model)?;
            let review = modeling.process_document(&text.join(" "));
            let topics = modeling.assign_topic(&dictionary, &model, &review, topics_returned, min_top_freq)?;

            if topics.is_empty() {
                println!("No topic above {:.3}", min_top_freq);
            }
            for (topic, weight) in topics {
                println!("{:<8} {:.3}", topic, weight);
            }
        }
    }

    Ok(())
}

fn read_reviews(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read reviews from {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn load_model(path: &Path) -> Result<LdaModel> {
    LdaModel::load(path).with_context(|| format!("Failed to load model {}", path.display()))
}
