//! Review topic modeling: stratified train/test splitting of labeled reviews
//! and an LDA workflow from raw text to topic assignments.
//!
//! The workflow steps, in order:
//!
//! 1. [`TopicModeling::process_training_data`] cleans raw reviews into a
//!    processed corpus file, one review per line.
//! 2. [`TopicModeling::create_dictionary`] and
//!    [`TopicModeling::filter_dictionary`] build and prune the vocabulary.
//! 3. [`TopicModeling::unigram_bow_generator`] streams the corpus as bags of
//!    words into [`TopicModeling::create_lda_model`].
//! 4. [`TopicModeling::explore_topic`] and [`TopicModeling::assign_topic`]
//!    inspect the fitted model.

pub mod config;
pub mod corpus;
pub mod dictionary;
pub mod error;
pub mod lda;
pub mod split;
pub mod text;
pub mod workflow;

pub use config::{AssignConfig, Config, FilterConfig};
pub use corpus::{BowCorpus, LineSentence};
pub use dictionary::{Bow, Dictionary};
pub use error::{Error, Result};
pub use lda::{default_workers, LdaConfig, LdaModel};
pub use split::{stratified_split, SplitConfig, StratifiedShuffleSplit, TrainTestSplit};
pub use text::{CleanerConfig, TextCleaner};
pub use workflow::TopicModeling;
