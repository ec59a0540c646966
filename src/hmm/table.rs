//! Count accumulation and the finalized log-probability tables.
//!
//! Counting happens in a [`CountTable`] owned by the trainer. Finalizing it
//! produces a [`LogProbTable`], and the model only ever holds finalized
//! tables wrapped as [`TransitionTable`] and [`EmissionTable`]. Every row of
//! a finalized table is a probability distribution in the log domain.

use std::collections::BTreeMap;

use super::tag::{Tag, Word};
use crate::error::{Error, Result};

/// Tolerance used when checking rows read from outside the trainer.
pub(crate) const ROW_SUM_TOLERANCE: f64 = 1e-6;

pub type Row<O> = BTreeMap<O, f64>;

#[derive(Debug)]
pub(crate) struct CountTable<O> {
    rows: BTreeMap<Tag, BTreeMap<O, u64>>,
}

impl<O> Default for CountTable<O> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<O: Ord + Clone> CountTable<O> {
    pub(crate) fn add(&mut self, state: &Tag, symbol: &O) {
        *self
            .rows
            .entry(state.clone())
            .or_default()
            .entry(symbol.clone())
            .or_insert(0) += 1;
    }

    pub(crate) fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Turns each row of counts into log(count / row total).
    ///
    /// Integer counts keep the result independent of the order in which
    /// they were accumulated. Rows with a zero total are dropped.
    pub(crate) fn finalize(self) -> LogProbTable<O> {
        let rows = self
            .rows
            .into_iter()
            .filter_map(|(state, counts)| {
                let total: u64 = counts.values().sum();
                if total == 0 {
                    return None;
                }
                let total = total as f64;
                let row = counts
                    .into_iter()
                    .map(|(symbol, n)| (symbol, (n as f64 / total).ln()))
                    .collect::<Row<O>>();
                Some((state, row))
            })
            .collect();
        LogProbTable { rows }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LogProbTable<O> {
    rows: BTreeMap<Tag, Row<O>>,
}

impl<O: Ord> LogProbTable<O> {
    /// Builds a table from rows that did not come out of [`CountTable::finalize`].
    pub(crate) fn from_rows(rows: BTreeMap<Tag, Row<O>>) -> Result<Self> {
        for (state, row) in &rows {
            check_row(state, row)?;
        }
        Ok(Self { rows })
    }

    pub(crate) fn row(&self, state: &Tag) -> Option<&Row<O>> {
        self.rows.get(state)
    }

    pub(crate) fn score(&self, state: &Tag, symbol: &O) -> Option<f64> {
        self.rows.get(state)?.get(symbol).copied()
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = (&Tag, &Row<O>)> {
        self.rows.iter()
    }
}

fn check_row<O>(state: &Tag, row: &Row<O>) -> Result<()> {
    if row.is_empty() {
        return Err(Error::invalid_model(format!("empty row for {state}")));
    }
    let mut sum = 0.0;
    for &score in row.values() {
        if !score.is_finite() || score > ROW_SUM_TOLERANCE {
            return Err(Error::invalid_model(format!(
                "row {state} holds {score}, not a log-probability"
            )));
        }
        sum += score.exp();
    }
    if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
        return Err(Error::invalid_model(format!(
            "row {state} sums to {sum} instead of 1"
        )));
    }
    Ok(())
}

/// Log-probabilities of moving from one tag to the next.
///
/// The row keyed by [`Tag::Start`] holds the distribution over sentence-initial
/// tags. A tag without a row has no known successors, which is not the same as
/// a successor with probability zero.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionTable {
    table: LogProbTable<Tag>,
}

impl TransitionTable {
    pub(crate) fn new(table: LogProbTable<Tag>) -> Result<Self> {
        for (state, row) in table.rows() {
            if row.keys().any(Tag::is_start) {
                return Err(Error::invalid_model(format!(
                    "row {state} transitions into the start tag"
                )));
            }
        }
        Ok(Self { table })
    }

    pub fn score(&self, from: &Tag, to: &Tag) -> Option<f64> {
        self.table.score(from, to)
    }

    /// Successors of `from` with their log-probabilities, in tag order.
    pub fn successors(&self, from: &Tag) -> Option<&Row<Tag>> {
        self.table.row(from)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&Tag, &Row<Tag>)> {
        self.table.rows()
    }
}

/// Log-probabilities of a tag emitting a word. The start tag has no row.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionTable {
    table: LogProbTable<Word>,
}

impl EmissionTable {
    pub(crate) fn new(table: LogProbTable<Word>) -> Result<Self> {
        if table.row(&Tag::Start).is_some() {
            return Err(Error::invalid_model("the start tag cannot emit words"));
        }
        Ok(Self { table })
    }

    pub fn score(&self, tag: &Tag, word: &Word) -> Option<f64> {
        self.table.score(tag, word)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&Tag, &Row<Word>)> {
        self.table.rows()
    }
}
