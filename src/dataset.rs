use std::{
    fs::File,
    io::{BufRead, BufReader, Lines},
    path::Path,
};

use crate::error::{Error, Result};

/// Lines of an untagged sentence file, for batch tagging.
pub fn read_sentences<P: AsRef<Path>>(path: P) -> Result<Lines<BufReader<File>>> {
    Ok(BufReader::new(File::open(path)?).lines())
}

/// One aligned line of a tag file and its sentence file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinePair {
    /// 1-based line number in both files.
    pub number: usize,
    pub tags: String,
    pub words: String,
}

/// Reads a tag file and a sentence file side by side.
///
/// Lines are handed out raw; tokenizing and case folding happen in the
/// trainer and decoder. When one file runs out before the other the reader
/// yields [`Error::UnalignedCorpus`] once and then stops.
pub struct CorpusReader<T, W> {
    tags: Lines<T>,
    words: Lines<W>,
    number: usize,
    done: bool,
}

impl CorpusReader<BufReader<File>, BufReader<File>> {
    pub fn open<P: AsRef<Path>, Q: AsRef<Path>>(tags: P, words: Q) -> Result<Self> {
        let tags = BufReader::new(File::open(tags)?);
        let words = BufReader::new(File::open(words)?);
        Ok(Self::new(tags, words))
    }
}

impl<T: BufRead, W: BufRead> CorpusReader<T, W> {
    pub fn new(tags: T, words: W) -> Self {
        Self {
            tags: tags.lines(),
            words: words.lines(),
            number: 0,
            done: false,
        }
    }
}

impl<T: BufRead, W: BufRead> Iterator for CorpusReader<T, W> {
    type Item = Result<LinePair>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.number += 1;
        let item = match (self.tags.next(), self.words.next()) {
            (None, None) => None,
            (Some(Ok(tags)), Some(Ok(words))) => {
                return Some(Ok(LinePair {
                    number: self.number,
                    tags,
                    words,
                }))
            }
            (Some(Err(e)), _) | (_, Some(Err(e))) => Some(Err(Error::Io(e))),
            (Some(_), None) | (None, Some(_)) => {
                log::warn!("corpus files diverge at line {}", self.number);
                Some(Err(Error::UnalignedCorpus { line: self.number }))
            }
        };
        self.done = true;
        item
    }
}
