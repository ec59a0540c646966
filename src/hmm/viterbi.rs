//! Most-likely tag sequence for a sentence under an [`HmmModel`].
//!
//! The decoder walks the sentence left to right keeping a *frontier*: every
//! tag reachable at the current word together with the best cumulative
//! log-score of any path ending there. For each word it also records one row
//! of backpointers (tag -> predecessor on its best path), and once the last
//! word is scored it follows those rows back from the best final tag.
//!
//! Only tags that own a transition row can extend a path, so the frontier
//! tracks the sparsity of the model rather than the full tag set.

use std::collections::BTreeMap;

use super::{
    model::HmmModel,
    tag::{tokenize_words, Tag, Word},
    tagger::Tagger,
};
use crate::error::{Error, Result};

/// Penalty used by the interactive session.
pub const DEFAULT_SESSION_PENALTY: f64 = -10.0;
/// Penalty used for batch tagging and evaluation.
pub const DEFAULT_BATCH_PENALTY: f64 = -15.0;

/// Result of decoding one sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoding {
    /// One tag per input word.
    pub tags: Vec<Tag>,
    /// Cumulative log-score of the returned path.
    pub score: f64,
    /// Input words that no tag in the model emits.
    pub unseen_words: usize,
}

impl Decoding {
    pub fn labels(&self) -> Vec<&str> {
        self.tags.iter().filter_map(Tag::label).collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ViterbiDecoder<'a> {
    model: &'a HmmModel,
    unseen_word_penalty: f64,
}

type Frontier<'a> = BTreeMap<&'a Tag, f64>;
type Backpointers<'a> = BTreeMap<&'a Tag, &'a Tag>;

impl<'a> ViterbiDecoder<'a> {
    /// `unseen_word_penalty` replaces the emission score of a word the
    /// candidate tag never emitted. It must be finite and not positive.
    pub fn new(model: &'a HmmModel, unseen_word_penalty: f64) -> Result<Self> {
        if !unseen_word_penalty.is_finite() || unseen_word_penalty > 0.0 {
            return Err(Error::invalid_argument(
                "unseen_word_penalty",
                format!("{unseen_word_penalty} is not a finite non-positive number"),
            ));
        }
        Ok(Self {
            model,
            unseen_word_penalty,
        })
    }

    /// Normalizes and splits `line`, then decodes it.
    pub fn decode_line(&self, line: &str) -> Result<Decoding> {
        self.decode(&tokenize_words(line))
    }

    pub fn decode(&self, words: &[Word]) -> Result<Decoding> {
        let model = self.model;
        let mut frontier: Frontier<'a> = BTreeMap::new();
        frontier.insert(model.start_tag(), 0.0);
        let mut backpointers: Vec<Backpointers<'a>> = Vec::with_capacity(words.len());
        let mut unseen_words = 0;

        for (position, word) in words.iter().enumerate() {
            if !model.knows_word(word) {
                log::debug!("unseen word at {position}: {word}");
                unseen_words += 1;
            }
            let (next, back) = self.step(&frontier, word);
            if next.is_empty() {
                return Err(Error::NoPathFound { position });
            }
            frontier = next;
            backpointers.push(back);
        }

        // Ascending iteration plus a strict comparison keeps the smallest tag
        // on exact ties.
        let mut best: Option<(&'a Tag, f64)> = None;
        for (&tag, &score) in &frontier {
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((tag, score));
            }
        }
        let Some((end, score)) = best else {
            return Err(Error::NoPathFound { position: 0 });
        };
        if words.is_empty() {
            return Ok(Decoding {
                tags: Vec::new(),
                score,
                unseen_words,
            });
        }

        let mut tags = Vec::with_capacity(words.len());
        let mut cur = end;
        for (position, back) in backpointers.iter().enumerate().rev() {
            tags.push(cur.clone());
            cur = back
                .get(cur)
                .copied()
                .ok_or(Error::NoPathFound { position })?;
        }
        tags.reverse();
        Ok(Decoding {
            tags,
            score,
            unseen_words,
        })
    }

    /// Scores every successor of the frontier against `word`.
    fn step(&self, frontier: &Frontier<'a>, word: &Word) -> (Frontier<'a>, Backpointers<'a>) {
        let model = self.model;
        let mut next: Frontier<'a> = BTreeMap::new();
        let mut back: Backpointers<'a> = BTreeMap::new();
        for (&cur, &score) in frontier {
            let Some(successors) = model.successors(cur) else {
                continue;
            };
            for (tag, &transition) in successors {
                let emission = model
                    .emission_score(tag, word)
                    .unwrap_or(self.unseen_word_penalty);
                let candidate = score + transition + emission;
                match next.get_mut(tag) {
                    // `cur` only grows within this loop, so an exact tie keeps
                    // the smaller predecessor already recorded.
                    Some(best) if candidate > *best => {
                        *best = candidate;
                        back.insert(tag, cur);
                    }
                    Some(_) => {}
                    None => {
                        next.insert(tag, candidate);
                        back.insert(tag, cur);
                    }
                }
            }
        }
        (next, back)
    }
}

impl Tagger for ViterbiDecoder<'_> {
    fn tag(&self, words: &[Word]) -> Result<Decoding> {
        self.decode(words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hmm::trainer::ModelTrainer;

    #[test]
    fn single_sentence() {
        let model = ModelTrainer::train([("N V", "dog runs")]).unwrap();
        let decoder = ViterbiDecoder::new(&model, DEFAULT_SESSION_PENALTY).unwrap();
        let d = decoder.decode_line("dog runs").unwrap();
        assert_eq!(d.labels(), ["N", "V"]);
        assert_eq!(d.score, 0.0);
        assert_eq!(d.unseen_words, 0);
    }

    #[test]
    fn unseen_word_follows_transitions() {
        let model = ModelTrainer::train([
            ("DET N V DET N", "the dog sees the cat"),
            ("DET N V DET N", "the dog sees the cat"),
        ])
        .unwrap();
        let decoder = ViterbiDecoder::new(&model, -10.0).unwrap();
        let d = decoder.decode_line("the dog sees a cat").unwrap();
        assert_eq!(d.labels(), ["DET", "N", "V", "DET", "N"]);
        assert_eq!(d.unseen_words, 1);
    }

    #[test]
    fn ties_pick_smallest_predecessor() {
        // A and B both reach C with equal scores; A is lexicographically smaller.
        let model = ModelTrainer::train([("A C", "x y"), ("B C", "x y")]).unwrap();
        let decoder = ViterbiDecoder::new(&model, -10.0).unwrap();
        let d = decoder.decode_line("x y").unwrap();
        assert_eq!(d.labels(), ["A", "C"]);
    }

    #[test]
    fn ties_pick_smallest_end_state() {
        let model = ModelTrainer::train([("B", "x"), ("A", "x")]).unwrap();
        let decoder = ViterbiDecoder::new(&model, -10.0).unwrap();
        assert_eq!(decoder.decode_line("x").unwrap().labels(), ["A"]);
    }

    #[test]
    fn frontier_exhausted() {
        let model = ModelTrainer::train([("N V", "dog runs")]).unwrap();
        let decoder = ViterbiDecoder::new(&model, -10.0).unwrap();
        let r = decoder.decode_line("dog runs fast");
        assert!(matches!(r, Err(Error::NoPathFound { position: 2 })));
    }

    #[test]
    fn empty_input() {
        let model = ModelTrainer::train([("N V", "dog runs")]).unwrap();
        let decoder = ViterbiDecoder::new(&model, -10.0).unwrap();
        let d = decoder.decode_line("   ").unwrap();
        assert!(d.tags.is_empty());
        assert_eq!(d.score, 0.0);
    }

    #[test]
    fn rejects_bad_penalty() {
        let model = ModelTrainer::train([("N", "dog")]).unwrap();
        for p in [1.0, f64::NAN, f64::NEG_INFINITY] {
            assert!(matches!(
                ViterbiDecoder::new(&model, p),
                Err(Error::InvalidArgument { .. })
            ));
        }
        assert!(ViterbiDecoder::new(&model, 0.0).is_ok());
    }

    #[test]
    fn deterministic() {
        let model = ModelTrainer::train([
            ("DET N V", "the dog runs"),
            ("DET ADJ N V", "the old dog runs"),
            ("N V ADV", "dogs run fast"),
        ])
        .unwrap();
        let decoder = ViterbiDecoder::new(&model, -15.0).unwrap();
        let a = decoder.decode_line("the old cat runs fast").unwrap();
        let b = decoder.decode_line("the old cat runs fast").unwrap();
        assert_eq!(a.tags, b.tags);
        assert_eq!(a.score.to_bits(), b.score.to_bits());
        assert_eq!(a.tags.len(), 5);
    }
}
