use super::{tag::Word, viterbi::Decoding};
use crate::error::Result;

/// Anything that can assign one tag per word.
///
/// The evaluator and the interactive session only need this much, which also
/// lets them run against canned taggers in tests.
pub trait Tagger {
    fn tag(&self, words: &[Word]) -> Result<Decoding>;
}

impl<T: Tagger + ?Sized> Tagger for &T {
    fn tag(&self, words: &[Word]) -> Result<Decoding> {
        (**self).tag(words)
    }
}
