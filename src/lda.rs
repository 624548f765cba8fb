//! Latent Dirichlet Allocation.
//!
//! Fitting uses collapsed Gibbs sampling. With more than one worker the
//! documents are split into shards that are swept in parallel against a
//! snapshot of the topic-term counts; the shards' count changes are merged
//! after every sweep (approximate distributed LDA). Each shard samples from
//! its own seeded RNG, so a given seed and worker count always give the same
//! model.
//!
//! Topic mixtures of new documents are inferred by a deterministic
//! fixed-point iteration with the topic-term distributions held fixed.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dictionary::{Bow, Dictionary};
use crate::error::{Error, Result};

/// Physical parallelism minus one, never less than one.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
        .saturating_sub(1)
        .max(1)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LdaConfig {
    pub num_topics: usize,
    /// Parallel sampling shards
    pub workers: usize,
    /// Gibbs sweeps over the corpus
    pub iterations: usize,
    /// Document-topic prior, `1 / num_topics` when unset
    pub alpha: Option<f64>,
    /// Topic-term prior, `1 / num_topics` when unset
    pub eta: Option<f64>,
    pub random_seed: Option<u64>,
    /// Topics weighted below this are dropped from document mixtures
    pub minimum_probability: f64,
    pub inference_iterations: usize,
    /// Inference stops once the mean change of the topic weights falls below this
    pub gamma_threshold: f64,
}

impl Default for LdaConfig {
    fn default() -> Self {
        LdaConfig {
            num_topics: 10,
            workers: default_workers(),
            iterations: 100,
            alpha: None,
            eta: None,
            random_seed: None,
            minimum_probability: 0.01,
            inference_iterations: 50,
            gamma_threshold: 0.001,
        }
    }
}

impl LdaConfig {
    pub fn new(num_topics: usize) -> Self {
        LdaConfig {
            num_topics,
            ..Default::default()
        }
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn eta(mut self, eta: f64) -> Self {
        self.eta = Some(eta);
        self
    }

    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }
}

/// Topic assignment counts, stored term-major so that all topics of one
/// term sit next to each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TopicTermCounts {
    num_topics: usize,
    num_terms: usize,
    term_topic: Vec<u64>,
    topic_totals: Vec<u64>,
}

impl TopicTermCounts {
    fn new(num_topics: usize, num_terms: usize) -> Self {
        TopicTermCounts {
            num_topics,
            num_terms,
            term_topic: vec![0; num_topics * num_terms],
            topic_totals: vec![0; num_topics],
        }
    }

    fn get(&self, topic: usize, term: usize) -> u64 {
        self.term_topic[term * self.num_topics + topic]
    }

    fn add(&mut self, topic: usize, term: usize) {
        self.term_topic[term * self.num_topics + topic] += 1;
        self.topic_totals[topic] += 1;
    }

    fn remove(&mut self, topic: usize, term: usize) {
        self.term_topic[term * self.num_topics + topic] -= 1;
        self.topic_totals[topic] -= 1;
    }

    /// Fold the changes a shard made relative to `snapshot` into `self`.
    fn absorb(&mut self, local: &TopicTermCounts, snapshot: &TopicTermCounts) {
        for ((merged, &after), &before) in self
            .term_topic
            .iter_mut()
            .zip(&local.term_topic)
            .zip(&snapshot.term_topic)
        {
            *merged = *merged + after - before;
        }
        for ((merged, &after), &before) in self
            .topic_totals
            .iter_mut()
            .zip(&local.topic_totals)
            .zip(&snapshot.topic_totals)
        {
            *merged = *merged + after - before;
        }
    }
}

struct DocumentState {
    terms: Vec<usize>,
    topics: Vec<usize>,
    topic_counts: Vec<u64>,
}

struct Priors {
    alpha: f64,
    eta: f64,
    eta_sum: f64,
}

struct Shard {
    documents: Vec<DocumentState>,
    rng: ChaCha8Rng,
}

impl Shard {
    /// One Gibbs sweep over this shard's tokens, starting from `snapshot`.
    /// Returns the shard's view of the counts afterwards.
    fn sweep(&mut self, snapshot: &TopicTermCounts, priors: &Priors) -> TopicTermCounts {
        let mut local = snapshot.clone();
        let num_topics = local.num_topics;
        let mut cumulative = vec![0.0; num_topics];

        for document in &mut self.documents {
            for (position, &term) in document.terms.iter().enumerate() {
                let old_topic = document.topics[position];
                local.remove(old_topic, term);
                document.topic_counts[old_topic] -= 1;

                let mut total = 0.0;
                for topic in 0..num_topics {
                    let weight = (document.topic_counts[topic] as f64 + priors.alpha)
                        * (local.get(topic, term) as f64 + priors.eta)
                        / (local.topic_totals[topic] as f64 + priors.eta_sum);
                    total += weight;
                    cumulative[topic] = total;
                }

                let threshold = self.rng.gen::<f64>() * total;
                let new_topic = cumulative
                    .iter()
                    .position(|&c| c >= threshold)
                    .unwrap_or(num_topics - 1);

                local.add(new_topic, term);
                document.topic_counts[new_topic] += 1;
                document.topics[position] = new_topic;
            }
        }

        local
    }
}

/// A fitted LDA topic model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdaModel {
    num_topics: usize,
    alpha: f64,
    eta: f64,
    workers: usize,
    iterations: usize,
    seed: u64,
    minimum_probability: f64,
    inference_iterations: usize,
    gamma_threshold: f64,
    num_documents: usize,
    terms: Vec<String>,
    counts: TopicTermCounts,
    trained_at: DateTime<Utc>,
}

impl LdaModel {
    /// Fit a model on a bag-of-words corpus encoded with `dictionary`.
    pub fn fit<I>(corpus: I, dictionary: &Dictionary, config: &LdaConfig) -> Result<Self>
    where
        I: IntoIterator<Item = Result<Bow>>,
    {
        let num_topics = config.num_topics;
        if num_topics == 0 {
            return Err(Error::InvalidTopicCount);
        }
        if dictionary.is_empty() {
            return Err(Error::EmptyDictionary);
        }

        let alpha = config.alpha.unwrap_or(1.0 / num_topics as f64);
        let eta = config.eta.unwrap_or(1.0 / num_topics as f64);
        if alpha <= 0.0 {
            return Err(Error::InvalidParameter("alpha must be positive".into()));
        }
        if eta <= 0.0 {
            return Err(Error::InvalidParameter("eta must be positive".into()));
        }
        let workers = if config.workers == 0 {
            debug!("workers set to 0, fitting with a single worker");
            1
        } else {
            config.workers
        };
        let seed = config.random_seed.unwrap_or_else(|| thread_rng().gen());

        let terms = dictionary.terms();
        let num_terms = terms.len();
        let mut counts = TopicTermCounts::new(num_topics, num_terms);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        // Random initial topic for every token
        let mut documents = Vec::new();
        for bow in corpus {
            let bow = bow?;
            let mut document = DocumentState {
                terms: Vec::new(),
                topics: Vec::new(),
                topic_counts: vec![0; num_topics],
            };
            for (term, count) in bow {
                if term >= num_terms {
                    return Err(Error::TokenOutOfRange {
                        id: term,
                        vocab_size: num_terms,
                    });
                }
                for _ in 0..count {
                    let topic = rng.gen_range(0..num_topics);
                    document.terms.push(term);
                    document.topics.push(topic);
                    document.topic_counts[topic] += 1;
                    counts.add(topic, term);
                }
            }
            documents.push(document);
        }

        let num_documents = documents.len();
        let num_tokens: usize = documents.iter().map(|d| d.terms.len()).sum();
        if num_tokens == 0 {
            debug!(num_documents, "Corpus has no in-vocabulary tokens, topics stay at their priors");
        }
        debug!(
            num_documents,
            num_tokens,
            num_terms,
            num_topics,
            workers,
            iterations = config.iterations,
            "Fitting LDA model"
        );

        let shard_size = ((num_documents + workers - 1) / workers).max(1);
        let mut remaining = documents.into_iter();
        let mut shards = Vec::with_capacity(workers);
        for index in 0..workers {
            let chunk: Vec<DocumentState> = remaining.by_ref().take(shard_size).collect();
            if chunk.is_empty() {
                break;
            }
            shards.push(Shard {
                documents: chunk,
                rng: ChaCha8Rng::seed_from_u64(seed.wrapping_add(index as u64 + 1)),
            });
        }

        let priors = Priors {
            alpha,
            eta,
            eta_sum: eta * num_terms as f64,
        };
        let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;

        for iteration in 0..config.iterations {
            let snapshot = &counts;
            let locals: Vec<TopicTermCounts> = pool.install(|| {
                shards
                    .par_iter_mut()
                    .map(|shard| shard.sweep(snapshot, &priors))
                    .collect()
            });

            let mut merged = counts.clone();
            for local in &locals {
                merged.absorb(local, &counts);
            }
            counts = merged;

            debug!(iteration, "Gibbs sweep finished");
        }

        Ok(LdaModel {
            num_topics,
            alpha,
            eta,
            workers,
            iterations: config.iterations,
            seed,
            minimum_probability: config.minimum_probability,
            inference_iterations: config.inference_iterations,
            gamma_threshold: config.gamma_threshold,
            num_documents,
            terms,
            counts,
            trained_at: Utc::now(),
        })
    }

    pub fn num_topics(&self) -> usize {
        self.num_topics
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn num_documents(&self) -> usize {
        self.num_documents
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn eta(&self) -> f64 {
        self.eta
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn minimum_probability(&self) -> f64 {
        self.minimum_probability
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    fn check_topic(&self, topic: usize) -> Result<()> {
        if topic >= self.num_topics {
            return Err(Error::UnknownTopic {
                topic,
                num_topics: self.num_topics,
            });
        }
        Ok(())
    }

    fn term_probability(&self, topic: usize, term: usize) -> f64 {
        let eta_sum = self.eta * self.num_terms() as f64;
        (self.counts.get(topic, term) as f64 + self.eta)
            / (self.counts.topic_totals[topic] as f64 + eta_sum)
    }

    /// Probability of every term under `topic`, indexed by term id.
    pub fn topic_term_distribution(&self, topic: usize) -> Result<Vec<f64>> {
        self.check_topic(topic)?;
        Ok((0..self.num_terms())
            .map(|term| self.term_probability(topic, term))
            .collect())
    }

    /// The `topn` most probable term ids of `topic`.
    pub fn get_topic_terms(&self, topic: usize, topn: usize) -> Result<Vec<(usize, f64)>> {
        let mut ranked: Vec<(usize, f64)> = self
            .topic_term_distribution(topic)?
            .into_iter()
            .enumerate()
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(topn);
        Ok(ranked)
    }

    /// The `topn` most probable terms of `topic`.
    pub fn show_topic(&self, topic: usize, topn: usize) -> Result<Vec<(String, f64)>> {
        Ok(self
            .get_topic_terms(topic, topn)?
            .into_iter()
            .map(|(term, probability)| (self.terms[term].clone(), probability))
            .collect())
    }

    pub fn show_topics(&self, num_words: usize) -> Result<Vec<(usize, Vec<(String, f64)>)>> {
        (0..self.num_topics)
            .map(|topic| Ok((topic, self.show_topic(topic, num_words)?)))
            .collect()
    }

    /// Topic mixture of a document, one weight per topic, summing to 1.
    pub fn inference(&self, bow: &[(usize, usize)]) -> Result<Vec<f64>> {
        for &(term, _) in bow {
            if term >= self.num_terms() {
                return Err(Error::TokenOutOfRange {
                    id: term,
                    vocab_size: self.num_terms(),
                });
            }
        }

        let num_topics = self.num_topics;
        let length: usize = bow.iter().map(|&(_, count)| count).sum();
        let mut gamma = vec![self.alpha + length as f64 / num_topics as f64; num_topics];
        let mut theta = vec![1.0 / num_topics as f64; num_topics];
        let mut weights = vec![0.0; num_topics];

        for _ in 0..self.inference_iterations {
            let mut expected = vec![0.0; num_topics];
            for &(term, count) in bow {
                let mut norm = 0.0;
                for topic in 0..num_topics {
                    weights[topic] = theta[topic] * self.term_probability(topic, term);
                    norm += weights[topic];
                }
                if norm <= 0.0 {
                    continue;
                }
                for topic in 0..num_topics {
                    expected[topic] += count as f64 * weights[topic] / norm;
                }
            }

            let new_gamma: Vec<f64> = expected.iter().map(|e| self.alpha + e).collect();
            let mean_change = new_gamma
                .iter()
                .zip(&gamma)
                .map(|(new, old)| (new - old).abs())
                .sum::<f64>()
                / num_topics as f64;
            gamma = new_gamma;

            let total: f64 = gamma.iter().sum();
            for (t, g) in theta.iter_mut().zip(&gamma) {
                *t = g / total;
            }
            if mean_change < self.gamma_threshold {
                break;
            }
        }

        let total: f64 = gamma.iter().sum();
        Ok(gamma.into_iter().map(|g| g / total).collect())
    }

    /// `(topic, weight)` pairs of a document with weight at least
    /// `minimum_probability` (the model's default when `None`).
    pub fn get_document_topics(
        &self,
        bow: &[(usize, usize)],
        minimum_probability: Option<f64>,
    ) -> Result<Vec<(usize, f64)>> {
        let minimum = minimum_probability
            .unwrap_or(self.minimum_probability)
            .max(1e-8);
        Ok(self
            .inference(bow)?
            .into_iter()
            .enumerate()
            .filter(|&(_, weight)| weight >= minimum)
            .collect())
    }

    /// Per-token log-likelihood of a corpus under the model.
    pub fn log_perplexity<I>(&self, corpus: I) -> Result<f64>
    where
        I: IntoIterator<Item = Result<Bow>>,
    {
        let mut log_likelihood = 0.0;
        let mut num_tokens = 0usize;

        for bow in corpus {
            let bow = bow?;
            let theta = self.inference(&bow)?;
            for (term, count) in bow {
                let probability: f64 = theta
                    .iter()
                    .enumerate()
                    .map(|(topic, weight)| weight * self.term_probability(topic, term))
                    .sum();
                log_likelihood += count as f64 * probability.ln();
                num_tokens += count;
            }
        }

        if num_tokens == 0 {
            return Err(Error::InvalidParameter(
                "cannot compute perplexity of a corpus without tokens".into(),
            ));
        }
        let bound = log_likelihood / num_tokens as f64;
        info!(
            bound,
            perplexity = (-bound).exp2(),
            num_tokens,
            "Computed per-word likelihood bound"
        );
        Ok(bound)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush().map_err(|e| Error::io(path, e))
    }

    /// Load a saved model, rejecting files whose count tables don't match
    /// the recorded topic and term counts.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let model: LdaModel = serde_json::from_reader(BufReader::new(file))?;
        model.check_shape().map_err(|reason| Error::CorruptModel {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(model)
    }

    fn check_shape(&self) -> std::result::Result<(), String> {
        if self.num_topics == 0 {
            return Err("model has no topics".into());
        }
        if !(self.alpha > 0.0 && self.eta > 0.0) {
            return Err(format!("priors must be positive, got alpha={} eta={}", self.alpha, self.eta));
        }
        let counts = &self.counts;
        if counts.num_topics != self.num_topics || counts.num_terms != self.terms.len() {
            return Err(format!(
                "count table is {}x{}, model has {} topics and {} terms",
                counts.num_topics,
                counts.num_terms,
                self.num_topics,
                self.terms.len()
            ));
        }
        let cells = self.num_topics.checked_mul(self.terms.len());
        if cells != Some(counts.term_topic.len()) {
            return Err(format!(
                "expected {} topic-term counts, found {}",
                self.num_topics.saturating_mul(self.terms.len()),
                counts.term_topic.len()
            ));
        }
        if counts.topic_totals.len() != self.num_topics {
            return Err(format!(
                "expected {} topic totals, found {}",
                self.num_topics,
                counts.topic_totals.len()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_theme_corpus() -> (Dictionary, Vec<Bow>) {
        let mut documents: Vec<Vec<String>> = Vec::new();
        for i in 0..20 {
            let text = if i % 2 == 0 {
                "pizza pasta sauce pizza cheese pasta"
            } else {
                "hotel room bed room staff hotel"
            };
            documents.push(text.split_whitespace().map(str::to_string).collect());
        }
        let dictionary = Dictionary::from_documents(&documents).unwrap();
        let bows = documents.iter().map(|d| dictionary.doc2bow(d)).collect();
        (dictionary, bows)
    }

    fn fit(bows: &[Bow], dictionary: &Dictionary, workers: usize) -> LdaModel {
        let config = LdaConfig::new(2)
            .workers(workers)
            .iterations(150)
            .random_seed(42);
        LdaModel::fit(bows.iter().cloned().map(Ok), dictionary, &config).unwrap()
    }

    fn dominant(model: &LdaModel, bow: &Bow) -> usize {
        let theta = model.inference(bow).unwrap();
        theta
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(topic, _)| topic)
            .unwrap()
    }

    #[test]
    fn test_rejects_zero_topics() {
        let (dictionary, bows) = two_theme_corpus();
        let result = LdaModel::fit(bows.into_iter().map(Ok), &dictionary, &LdaConfig::new(0));
        assert!(matches!(result, Err(Error::InvalidTopicCount)));
    }

    #[test]
    fn test_rejects_empty_dictionary() {
        let result = LdaModel::fit(Vec::<Result<Bow>>::new(), &Dictionary::new(), &LdaConfig::new(2));
        assert!(matches!(result, Err(Error::EmptyDictionary)));
    }

    #[test]
    fn test_rejects_foreign_token_ids() {
        let (dictionary, _) = two_theme_corpus();
        let corpus = vec![Ok(vec![(99, 1)])];
        let result = LdaModel::fit(corpus, &dictionary, &LdaConfig::new(2).random_seed(1));
        assert!(matches!(result, Err(Error::TokenOutOfRange { id: 99, .. })));
    }

    #[test]
    fn test_separates_themes() {
        let (dictionary, bows) = two_theme_corpus();
        for workers in [1, 3] {
            let model = fit(&bows, &dictionary, workers);
            assert_eq!(dominant(&model, &bows[0]), dominant(&model, &bows[2]));
            assert_eq!(dominant(&model, &bows[1]), dominant(&model, &bows[3]));
            assert_ne!(dominant(&model, &bows[0]), dominant(&model, &bows[1]));
        }
    }

    #[test]
    fn test_fit_is_reproducible() {
        let (dictionary, bows) = two_theme_corpus();
        let a = fit(&bows, &dictionary, 2);
        let b = fit(&bows, &dictionary, 2);
        for topic in 0..2 {
            assert_eq!(
                a.topic_term_distribution(topic).unwrap(),
                b.topic_term_distribution(topic).unwrap()
            );
        }
    }

    #[test]
    fn test_topic_distributions_sum_to_one() {
        let (dictionary, bows) = two_theme_corpus();
        let model = fit(&bows, &dictionary, 1);
        for topic in 0..model.num_topics() {
            let total: f64 = model.topic_term_distribution(topic).unwrap().iter().sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
        let theta = model.inference(&bows[0]).unwrap();
        assert!((theta.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_show_topic_orders_by_probability() {
        let (dictionary, bows) = two_theme_corpus();
        let model = fit(&bows, &dictionary, 1);
        let top = model.show_topic(0, 3).unwrap();
        assert_eq!(top.len(), 3);
        assert!(top.windows(2).all(|pair| pair[0].1 >= pair[1].1));
        assert!(matches!(model.show_topic(2, 3), Err(Error::UnknownTopic { topic: 2, .. })));
    }

    #[test]
    fn test_empty_document_gets_uniform_mixture() {
        let (dictionary, bows) = two_theme_corpus();
        let model = fit(&bows, &dictionary, 1);
        assert_eq!(model.inference(&[]).unwrap(), vec![0.5, 0.5]);
    }

    #[test]
    fn test_log_perplexity_is_negative() {
        let (dictionary, bows) = two_theme_corpus();
        let model = fit(&bows, &dictionary, 1);
        let bound = model.log_perplexity(bows.into_iter().map(Ok)).unwrap();
        assert!(bound < 0.0);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.lda");
        let (dictionary, bows) = two_theme_corpus();
        let model = fit(&bows, &dictionary, 1);

        model.save(&path).unwrap();
        let loaded = LdaModel::load(&path).unwrap();
        assert_eq!(loaded.num_topics(), 2);
        assert_eq!(loaded.show_topic(1, 4).unwrap(), model.show_topic(1, 4).unwrap());
        assert_eq!(loaded.trained_at(), model.trained_at());
        assert_eq!(loaded.seed(), 42);
        assert_eq!(loaded.alpha(), model.alpha());
        assert_eq!(loaded.eta(), model.eta());
        assert_eq!(loaded.minimum_probability(), 0.01);
    }

    #[test]
    fn test_load_rejects_truncated_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.lda");
        let (dictionary, bows) = two_theme_corpus();
        fit(&bows, &dictionary, 1).save(&path).unwrap();

        let mut saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        saved["counts"]["term_topic"] = serde_json::json!([0]);
        std::fs::write(&path, saved.to_string()).unwrap();
        assert!(matches!(LdaModel::load(&path), Err(Error::CorruptModel { .. })));

        saved["counts"]["term_topic"] = serde_json::json!(vec![0; 2 * dictionary.len()]);
        saved["counts"]["topic_totals"] = serde_json::json!([0]);
        std::fs::write(&path, saved.to_string()).unwrap();
        assert!(matches!(LdaModel::load(&path), Err(Error::CorruptModel { .. })));

        saved["counts"]["topic_totals"] = serde_json::json!([0, 0]);
        saved["num_topics"] = serde_json::json!(0);
        std::fs::write(&path, saved.to_string()).unwrap();
        assert!(matches!(LdaModel::load(&path), Err(Error::CorruptModel { .. })));
    }

    #[test]
    fn test_show_topics_lists_every_topic() {
        let (dictionary, bows) = two_theme_corpus();
        let model = fit(&bows, &dictionary, 1);
        let topics = model.show_topics(2).unwrap();
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[1].0, 1);
        assert!(topics.iter().all(|(_, terms)| terms.len() == 2));
    }

    #[test]
    fn test_fit_is_quiet_at_info_level() {
        use std::io;
        use std::sync::{Arc, Mutex};

        #[derive(Clone)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let (dictionary, _) = two_theme_corpus();
        let captured = Captured(Arc::new(Mutex::new(Vec::new())));
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("review_topics=info"))
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let corpus = vec![Ok(Vec::new()), Ok(Vec::new())];
            let config = LdaConfig::new(2).workers(0).iterations(3).random_seed(1);
            let model = LdaModel::fit(corpus, &dictionary, &config).unwrap();
            assert_eq!(model.workers(), 1);
        });

        let output = captured.0.lock().unwrap();
        assert!(output.is_empty(), "{}", String::from_utf8_lossy(&output));
    }
}
