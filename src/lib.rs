//! Bigram hidden Markov model tagger.
//!
//! [`ModelTrainer`] counts tag transitions and word emissions over aligned
//! tag/word sentences and normalizes them into an [`HmmModel`] of
//! log-probabilities. [`ViterbiDecoder`] then finds the most likely tag
//! sequence for a new sentence.
//!
//! ```
//! use hmmtagger::{ModelTrainer, ViterbiDecoder};
//!
//! let model = ModelTrainer::train([("DET N V DET N", "the dog sees the cat")]).unwrap();
//! let decoder = ViterbiDecoder::new(&model, -10.0).unwrap();
//! let decoding = decoder.decode_line("the dog sees a cat").unwrap();
//! assert_eq!(decoding.labels(), ["DET", "N", "V", "DET", "N"]);
//! ```

pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod hmm;
pub mod session;

pub use crate::dataset::{read_sentences, CorpusReader, LinePair};
pub use crate::error::{Error, Result};
pub use crate::evaluation::{evaluate_corpus, Estimation, Evaluation, LineOutcome};
pub use crate::hmm::{
    model::HmmModel,
    shared::SharedModel,
    table::{EmissionTable, TransitionTable},
    tag::{Tag, Word},
    tagger::Tagger,
    trainer::ModelTrainer,
    viterbi::{Decoding, ViterbiDecoder, DEFAULT_BATCH_PENALTY, DEFAULT_SESSION_PENALTY},
};
pub use crate::session::InteractiveSession;
