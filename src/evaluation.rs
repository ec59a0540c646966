use std::{collections::BTreeMap, fmt::Display, iter::zip};

use crate::{
    dataset::LinePair,
    error::{Error, Result},
    hmm::{
        tag::{tokenize_tags, tokenize_words, Tag},
        tagger::Tagger,
    },
};

/// Label-wise performance values.
#[derive(Debug, Default, Clone)]
struct LabelMeasure {
    /// Number of correct predictions.
    num_correct: usize,
    /// Number of occurrences of the label in the gold-standard data.
    num_observation: usize,
    /// Number of predictions.
    num_prediction: usize,
    precision: f64,
    recall: f64,
    fmeasure: f64,
}

/// What happened to one evaluated line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Scored { matched: usize, total: usize },
    /// The reference is blank or the prediction disagrees with it in length;
    /// nothing was counted.
    Skipped,
    /// The tagger returned an error for this line.
    Failed,
}

/// Tagging accuracy over a reference corpus.
#[derive(Debug, Default)]
pub struct Evaluation {
    tbl: BTreeMap<Tag, LabelMeasure>,

    /// Number of correctly predicted items.
    item_total_correct: usize,
    /// Total number of items.
    item_total_num: usize,
    item_accuracy: f64,

    /// Number of correctly predicted sentences.
    inst_total_correct: usize,
    /// Total number of scored sentences.
    inst_total_num: usize,
    inst_accuracy: f64,

    /// Blank reference lines and lines whose prediction length differed.
    skipped_lines: usize,
    /// Lines the tagger could not decode.
    failed_lines: usize,

    macro_precision: f64,
    macro_recall: f64,
    macro_fmeasure: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimation {
    pub precision: f64,
    pub recall: f64,
    pub fmeasure: f64,
    pub item_accuracy: f64,
    pub sequence_accuracy: f64,
}

impl Evaluation {
    pub fn accumulate(&mut self, reference: &[Tag], prediction: &[Tag]) -> LineOutcome {
        if reference.is_empty() {
            log::warn!("skipping blank reference line");
            self.skipped_lines += 1;
            return LineOutcome::Skipped;
        }
        if reference.len() != prediction.len() {
            log::warn!(
                "skipping line: {} reference tags, {} predicted",
                reference.len(),
                prediction.len()
            );
            self.skipped_lines += 1;
            return LineOutcome::Skipped;
        }
        let mut matched = 0;
        for (r, p) in zip(reference, prediction) {
            self.tbl.entry(r.clone()).or_default().num_observation += 1;
            self.tbl.entry(p.clone()).or_default().num_prediction += 1;
            if r == p {
                self.tbl.entry(r.clone()).or_default().num_correct += 1;
                matched += 1;
            }
            self.item_total_num += 1;
            self.item_total_correct += usize::from(r == p);
        }

        if matched == prediction.len() {
            self.inst_total_correct += 1;
        }
        self.inst_total_num += 1;
        LineOutcome::Scored {
            matched,
            total: prediction.len(),
        }
    }

    pub fn record_failure(&mut self) -> LineOutcome {
        self.failed_lines += 1;
        LineOutcome::Failed
    }

    pub fn item_total_correct(&self) -> usize {
        self.item_total_correct
    }

    pub fn item_total_incorrect(&self) -> usize {
        self.item_total_num - self.item_total_correct
    }

    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    pub fn failed_lines(&self) -> usize {
        self.failed_lines
    }

    pub fn evaluate(&mut self) -> Estimation {
        self.macro_precision = 0.0;
        self.macro_recall = 0.0;
        self.macro_fmeasure = 0.0;
        let mut num_labels = 0;
        for lev in self.tbl.values_mut() {
            lev.precision = 0.0;
            lev.recall = 0.0;
            lev.fmeasure = 0.0;

            if lev.num_prediction > 0 {
                lev.precision = lev.num_correct as f64 / lev.num_prediction as f64;
            }
            if lev.num_observation > 0 {
                lev.recall = lev.num_correct as f64 / lev.num_observation as f64;
            }
            if lev.precision + lev.recall > 0.0 {
                lev.fmeasure = lev.precision * lev.recall * 2.0 / (lev.precision + lev.recall);
            }
            if lev.num_observation == 0 {
                continue;
            }
            num_labels += 1;
            self.macro_precision += lev.precision;
            self.macro_recall += lev.recall;
            self.macro_fmeasure += lev.fmeasure;
        }

        if num_labels > 0 {
            self.macro_precision /= num_labels as f64;
            self.macro_recall /= num_labels as f64;
            self.macro_fmeasure /= num_labels as f64;
        }
        if self.item_total_num > 0 {
            self.item_accuracy = self.item_total_correct as f64 / self.item_total_num as f64;
        }
        if self.inst_total_num > 0 {
            self.inst_accuracy = self.inst_total_correct as f64 / self.inst_total_num as f64;
        }
        Estimation {
            precision: self.macro_precision,
            recall: self.macro_recall,
            fmeasure: self.macro_fmeasure,
            item_accuracy: self.item_accuracy,
            sequence_accuracy: self.inst_accuracy,
        }
    }
}

/// Tags every sentence of `pairs` and scores it against the paired tag line.
///
/// Decode failures and length mismatches are counted, not fatal; reader
/// errors abort.
pub fn evaluate_corpus<T, I>(tagger: &T, pairs: I) -> Result<Evaluation>
where
    T: Tagger + ?Sized,
    I: IntoIterator<Item = Result<LinePair>>,
{
    let mut evaluation = Evaluation::default();
    for pair in pairs {
        let pair = pair?;
        let reference = tokenize_tags(&pair.tags);
        match tagger.tag(&tokenize_words(&pair.words)) {
            Ok(decoding) => {
                evaluation.accumulate(&reference, &decoding.tags);
            }
            Err(e @ Error::NoPathFound { .. }) => {
                log::warn!("line {}: {e}", pair.number);
                evaluation.record_failure();
            }
            Err(e) => return Err(e),
        }
    }
    let est = evaluation.evaluate();
    log::info!(
        "evaluated {} items: accuracy {:.4}",
        evaluation.item_total_num,
        est.item_accuracy
    );
    Ok(evaluation)
}

impl Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Performance by label (#match, #model, #ref) (precision, recall, F1):")?;
        for (label, lev) in &self.tbl {
            if lev.num_observation == 0 {
                writeln!(
                    f,
                    "\t{}: ({}, {}, {}) (******, ******, ******)",
                    label, lev.num_correct, lev.num_prediction, lev.num_observation
                )?;
            } else {
                writeln!(
                    f,
                    "\t{}: ({}, {}, {}) ({:.4}, {:.4}, {:.4})",
                    label,
                    lev.num_correct,
                    lev.num_prediction,
                    lev.num_observation,
                    lev.precision,
                    lev.recall,
                    lev.fmeasure
                )?;
            }
        }
        writeln!(
            f,
            "Macro-average precision, recall, F1: ({:.4}, {:.4}, {:.4})",
            self.macro_precision, self.macro_recall, self.macro_fmeasure
        )?;
        writeln!(
            f,
            "Item accuracy: {}/{} => {:.4} ({} wrong)",
            self.item_total_correct,
            self.item_total_num,
            self.item_accuracy,
            self.item_total_num - self.item_total_correct
        )?;
        writeln!(
            f,
            "Sequence accuracy: {}/{} => {:.4}",
            self.inst_total_correct, self.inst_total_num, self.inst_accuracy
        )?;
        writeln!(f, "Skipped lines (blank or length mismatch): {}", self.skipped_lines)?;
        writeln!(f, "Failed lines (no path): {}", self.failed_lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hmm::{tag::Word, viterbi::Decoding};

    fn tags(s: &str) -> Vec<Tag> {
        tokenize_tags(s)
    }

    #[test]
    fn accumulate() {
        let mut e = Evaluation::default();
        assert_eq!(
            e.accumulate(&tags("DET N V"), &tags("DET N V")),
            LineOutcome::Scored { matched: 3, total: 3 }
        );
        assert_eq!(
            e.accumulate(&tags("DET N"), &tags("DET V")),
            LineOutcome::Scored { matched: 1, total: 2 }
        );
        assert_eq!(e.accumulate(&tags("DET N"), &tags("DET")), LineOutcome::Skipped);
        e.record_failure();

        let est = e.evaluate();
        assert_eq!(e.item_total_correct(), 4);
        assert_eq!(e.item_total_incorrect(), 1);
        assert_eq!(e.skipped_lines(), 1);
        assert_eq!(e.failed_lines(), 1);
        assert!((est.item_accuracy - 0.8).abs() < 1e-12);
        assert!((est.sequence_accuracy - 0.5).abs() < 1e-12);
        // DET: p=1 r=1, N: p=1 r=0.5, V: p=0.5 r=1
        assert!((est.precision - 2.5 / 3.0).abs() < 1e-12);
        assert!((est.recall - 2.5 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn report() {
        let mut e = Evaluation::default();
        e.accumulate(&tags("N V"), &tags("N N"));
        e.accumulate(&tags("N"), &tags("N V"));
        e.evaluate();
        let s = e.to_string();
        assert!(s.contains("\tN: (1, 2, 1)"), "{s}");
        assert!(s.contains("Item accuracy: 1/2"), "{s}");
        assert!(s.contains("Skipped lines (blank or length mismatch): 1"), "{s}");
        assert!(s.contains("Failed lines (no path): 0"), "{s}");
    }

    fn pair(number: usize, tags: &str, words: &str) -> LinePair {
        LinePair {
            number,
            tags: tags.to_string(),
            words: words.to_string(),
        }
    }

    struct Echo;

    impl Tagger for Echo {
        fn tag(&self, words: &[Word]) -> Result<Decoding> {
            if words.iter().any(|w| w.as_str() == "boom") {
                return Err(Error::NoPathFound { position: 0 });
            }
            Ok(Decoding {
                tags: words.iter().map(|w| Tag::new(w.as_str())).collect(),
                score: 0.0,
                unseen_words: 0,
            })
        }
    }

    #[test]
    fn corpus() {
        let pairs = vec![
            Ok(pair(1, "a b", "a b")),
            Ok(pair(2, "a b", "a c")),
            Ok(pair(3, "a", "boom")),
            Ok(pair(4, "a", "a b")),
        ];
        let e = evaluate_corpus(&Echo, pairs).unwrap();
        assert_eq!(e.item_total_correct(), 3);
        assert_eq!(e.item_total_incorrect(), 1);
        assert_eq!(e.failed_lines(), 1);
        assert_eq!(e.skipped_lines(), 1);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let mut e = Evaluation::default();
        assert_eq!(e.accumulate(&[], &[]), LineOutcome::Skipped);
        e.evaluate();
        assert_eq!(e.skipped_lines(), 1);
        assert_eq!(e.inst_total_num, 0);
        assert_eq!(e.item_total_num, 0);
    }

    #[test]
    fn blank_pair_does_not_inflate_sequence_accuracy() {
        let model = crate::hmm::trainer::ModelTrainer::train([("N V", "dog runs")]).unwrap();
        let decoder = crate::hmm::viterbi::ViterbiDecoder::new(&model, -15.0).unwrap();
        let pairs = vec![Ok(pair(1, "V N", "dog runs")), Ok(pair(2, "", ""))];
        let mut e = evaluate_corpus(&decoder, pairs).unwrap();
        let est = e.evaluate();
        assert_eq!(e.item_total_correct(), 0);
        assert_eq!(e.item_total_incorrect(), 2);
        assert_eq!(e.skipped_lines(), 1);
        assert_eq!(est.sequence_accuracy, 0.0);
        assert!(e.to_string().contains("Sequence accuracy: 0/1"));
    }

    #[test]
    fn corpus_reader_error_aborts() {
        let pairs = vec![Err(Error::UnalignedCorpus { line: 1 })];
        assert!(matches!(
            evaluate_corpus(&Echo, pairs),
            Err(Error::UnalignedCorpus { line: 1 })
        ));
    }
}
