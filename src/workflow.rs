//! Topic-modeling workflow over a collection of reviews.
//!
//! The steps run in a fixed order: clean the raw reviews into a processed
//! corpus file, build and prune a dictionary from that file, stream the
//! corpus as bags of words into an LDA fit, then inspect topics or assign
//! topics to new reviews. The dictionary and the model are plain values
//! handed from one step to the next; a document must be encoded with the same
//! dictionary the model was fitted with.

use std::io::{self, Write};
use std::path::Path;

use tracing::info;

use crate::config::Config;
use crate::corpus::{append_lines, BowCorpus, LineSentence};
use crate::dictionary::{Bow, Dictionary};
use crate::error::{Error, Result};
use crate::lda::LdaModel;
use crate::text::TextCleaner;

pub struct TopicModeling {
    documents: Vec<String>,
    cleaner: TextCleaner,
    config: Config,
}

impl TopicModeling {
    pub fn new(documents: Vec<String>) -> Self {
        TopicModeling::with_config(documents, Config::default())
    }

    pub fn with_config(documents: Vec<String>, config: Config) -> Self {
        TopicModeling {
            documents,
            cleaner: TextCleaner::new(config.cleaner.clone()),
            config,
        }
    }

    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Clean one raw review into the tokens the model expects.
    pub fn process_document(&self, text: &str) -> Vec<String> {
        self.cleaner
            .clean(text)
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    /// Strip punctuation and stopwords from every review and append one line
    /// per review to `path`.
    ///
    /// A non-empty `training_data` replaces the reviews held by the helper.
    /// The file is appended to, never truncated. Returns the number of lines
    /// written.
    pub fn process_training_data(
        &mut self,
        path: &Path,
        training_data: Option<Vec<String>>,
    ) -> Result<usize> {
        if let Some(training_data) = training_data.filter(|data| !data.is_empty()) {
            self.documents = training_data;
        }

        let cleaner = &self.cleaner;
        let written = append_lines(path, self.documents.iter().map(|review| cleaner.clean(review)))?;

        info!(reviews = written, path = %path.display(), "Wrote processed corpus");
        Ok(written)
    }

    pub fn load_line_sentence(&self, path: &Path) -> LineSentence {
        LineSentence::new(path)
    }

    /// Build a dictionary from every token list in `documents`.
    pub fn create_dictionary<I>(&self, documents: I) -> Result<Dictionary>
    where
        I: IntoIterator<Item = Result<Vec<String>>>,
    {
        let mut dictionary = Dictionary::new();
        for document in documents {
            dictionary.add_document(&document?);
        }
        if dictionary.num_docs() == 0 {
            return Err(Error::NoDocuments);
        }

        info!(
            unique_tokens = dictionary.len(),
            documents = dictionary.num_docs(),
            "Built dictionary"
        );
        Ok(dictionary)
    }

    /// Drop rare and overly common tokens, then compactify the ids.
    pub fn filter_dictionary(&self, dictionary: &mut Dictionary, no_below: usize, no_above: f64) {
        dictionary.filter_extremes(no_below, no_above, self.config.filter.keep_n);
    }

    pub fn save_dictionary(&self, dictionary: &Dictionary, path: &Path) -> Result<()> {
        dictionary.save(path)?;
        info!(path = %path.display(), tokens = dictionary.len(), "Saved dictionary");
        Ok(())
    }

    /// Stream the processed corpus at `path` as bags of words. Call again to
    /// start over.
    pub fn unigram_bow_generator<'a>(
        &self,
        dictionary: &'a Dictionary,
        path: &Path,
    ) -> Result<impl Iterator<Item = Result<Bow>> + 'a> {
        BowCorpus::new(dictionary, self.load_line_sentence(path)).iter()
    }

    /// Fit an LDA model with `topics` topics on `workers` parallel workers.
    /// The remaining model settings come from the helper's configuration.
    pub fn create_lda_model<I>(
        &self,
        bow_corpus: I,
        dictionary: &Dictionary,
        topics: usize,
        workers: usize,
    ) -> Result<LdaModel>
    where
        I: IntoIterator<Item = Result<Bow>>,
    {
        let mut lda_config = self.config.lda.clone();
        lda_config.num_topics = topics;
        lda_config.workers = workers;
        LdaModel::fit(bow_corpus, dictionary, &lda_config)
    }

    pub fn save_model(&self, model: &LdaModel, path: &Path) -> Result<()> {
        model.save(path)?;
        info!(path = %path.display(), topics = model.num_topics(), "Saved LDA model");
        Ok(())
    }

    /// Print the `topn` heaviest terms of a topic to stdout.
    pub fn explore_topic(&self, model: &LdaModel, topic_number: usize, topn: usize) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        write_topic(&mut out, model, topic_number, topn)
    }

    /// Topics of a processed review, lowest topic id first, at most
    /// `topics_returned` of them.
    ///
    /// Topics weighted below `min_top_freq` or below the model's minimum
    /// probability are left out.
    pub fn assign_topic<S: AsRef<str>>(
        &self,
        dictionary: &Dictionary,
        model: &LdaModel,
        processed_review: &[S],
        topics_returned: usize,
        min_top_freq: f64,
    ) -> Result<Vec<(usize, f64)>> {
        let review_bow = dictionary.doc2bow(processed_review);
        let mut review_lda: Vec<(usize, f64)> = model
            .get_document_topics(&review_bow, None)?
            .into_iter()
            .filter(|&(_, weight)| weight >= min_top_freq)
            .collect();

        review_lda.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.total_cmp(&a.1)));
        review_lda.truncate(topics_returned);
        Ok(review_lda)
    }
}

/// Write the term/frequency report for one topic.
pub fn write_topic<W: Write>(out: &mut W, model: &LdaModel, topic_number: usize, topn: usize) -> Result<()> {
    let terms = model.show_topic(topic_number, topn)?;

    writeln!(out, "{:20} {}\n", "term", "frequency").map_err(Error::Report)?;
    for (term, frequency) in terms {
        writeln!(out, "{:20} {:.3}", term, frequency).map_err(Error::Report)?;
    }
    Ok(())
}
