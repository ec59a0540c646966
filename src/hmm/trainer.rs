use std::{iter::zip, time::Instant};

use super::{
    model::HmmModel,
    table::{CountTable, EmissionTable, TransitionTable},
    tag::{tokenize_tags, tokenize_words, Tag, Word, START},
};
use crate::error::{Error, Result};

/// Accumulates transition and emission counts from tagged sentences.
///
/// The counts never leave the trainer: [`ModelTrainer::finish`] consumes it
/// and hands back a finalized [`HmmModel`].
#[derive(Debug, Default)]
pub struct ModelTrainer {
    transitions: CountTable<Tag>,
    emissions: CountTable<Word>,
    /// Number of `append*` calls so far, blank pairs included.
    num_lines: usize,
    num_examples: usize,
    num_items: usize,
}

impl ModelTrainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trains a model from `(tag line, word line)` pairs.
    ///
    /// Stops at the first malformed pair.
    pub fn train<I, T, W>(pairs: I) -> Result<HmmModel>
    where
        I: IntoIterator<Item = (T, W)>,
        T: AsRef<str>,
        W: AsRef<str>,
    {
        let mut trainer = Self::new();
        for (tags, words) in pairs {
            trainer.append(tags.as_ref(), words.as_ref())?;
        }
        trainer.finish()
    }

    /// Adds one sentence given as whitespace-delimited tag and word lines.
    pub fn append(&mut self, tags: &str, words: &str) -> Result<()> {
        self.append_sequence(&tokenize_tags(tags), &tokenize_words(words))
    }

    /// Adds one sentence. Nothing is counted unless the whole sentence is valid.
    pub fn append_sequence(&mut self, tags: &[Tag], words: &[Word]) -> Result<()> {
        self.num_lines += 1;
        if tags.len() != words.len() {
            return Err(Error::MalformedCorpusLine {
                line: self.num_lines,
                tags: tags.len(),
                words: words.len(),
            });
        }
        if tags.is_empty() {
            log::warn!("skipping blank example at line {}", self.num_lines);
            return Ok(());
        }
        if tags.iter().any(Tag::is_start) {
            return Err(Error::invalid_argument(
                "tags",
                format!("line {} uses the start tag", self.num_lines),
            ));
        }

        let mut prev = &START;
        for (tag, word) in zip(tags, words) {
            self.transitions.add(prev, tag);
            self.emissions.add(tag, word);
            prev = tag;
        }
        self.num_examples += 1;
        self.num_items += tags.len();
        Ok(())
    }

    pub fn num_examples(&self) -> usize {
        self.num_examples
    }

    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// Normalizes the counts into log-probabilities.
    pub fn finish(self) -> Result<HmmModel> {
        if self.num_examples == 0 {
            return Err(Error::EmptyModel);
        }
        let begin = Instant::now();
        log::info!(
            "finalize (examples: {}, items: {}, transition rows: {}, emission rows: {})",
            self.num_examples,
            self.num_items,
            self.transitions.num_rows(),
            self.emissions.num_rows()
        );
        let transitions = TransitionTable::new(self.transitions.finalize())?;
        let emissions = EmissionTable::new(self.emissions.finalize())?;
        let model = HmmModel::new(transitions, emissions)?;
        log::info!(
            "tags: {}, vocabulary: {}, time cost: {:?}",
            model.num_tags(),
            model.vocabulary_size(),
            begin.elapsed()
        );
        Ok(model)
    }
}
