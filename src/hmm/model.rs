use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};

use super::{
    table::{EmissionTable, LogProbTable, Row, TransitionTable},
    tag::{Tag, Word, START},
};
use crate::error::{Error, Result};

/// A finalized bigram HMM.
///
/// Built by [`ModelTrainer`](super::trainer::ModelTrainer) or loaded from
/// JSON, and read-only afterwards, so one model can serve any number of
/// decoders at once.
#[derive(Debug, Clone, PartialEq)]
pub struct HmmModel {
    transitions: TransitionTable,
    emissions: EmissionTable,
    tags: BTreeSet<Tag>,
    vocabulary: BTreeSet<Word>,
}

impl HmmModel {
    pub(crate) fn new(transitions: TransitionTable, emissions: EmissionTable) -> Result<Self> {
        if transitions.successors(&Tag::Start).is_none() {
            return Err(Error::EmptyModel);
        }
        let mut tags = BTreeSet::new();
        for (from, row) in transitions.rows() {
            tags.insert(from.clone());
            tags.extend(row.keys().cloned());
        }
        for (tag, _) in emissions.rows() {
            tags.insert(tag.clone());
        }
        tags.remove(&Tag::Start);
        let vocabulary = emissions
            .rows()
            .flat_map(|(_, row)| row.keys().cloned())
            .collect();
        Ok(Self {
            transitions,
            emissions,
            tags,
            vocabulary,
        })
    }

    pub fn transition_score(&self, tag: &Tag, next: &Tag) -> Option<f64> {
        self.transitions.score(tag, next)
    }

    pub fn emission_score(&self, tag: &Tag, word: &Word) -> Option<f64> {
        self.emissions.score(tag, word)
    }

    pub fn successors(&self, tag: &Tag) -> Option<&Row<Tag>> {
        self.transitions.successors(tag)
    }

    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    pub fn emissions(&self) -> &EmissionTable {
        &self.emissions
    }

    /// Known tags in lexicographic order. The start tag is not listed.
    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    pub fn num_tags(&self) -> usize {
        self.tags.len()
    }

    pub fn start_tag(&self) -> &'static Tag {
        &START
    }

    pub fn knows_word(&self, word: &Word) -> bool {
        self.vocabulary.contains(word)
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let file: ModelFile = serde_json::from_reader(reader)?;
        Self::try_from(file)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, &ModelFile::from(self))?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(path)?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        self.to_writer(&mut w)?;
        w.flush()?;
        Ok(())
    }
}

/// On-disk layout. The start row is kept apart from the tag rows so no tag
/// string is reserved for the sentinel.
#[derive(Debug, Serialize, Deserialize)]
struct ModelFile {
    start: BTreeMap<String, f64>,
    transitions: BTreeMap<String, BTreeMap<String, f64>>,
    emissions: BTreeMap<String, BTreeMap<String, f64>>,
}

fn label_of(tag: &Tag) -> String {
    tag.label().unwrap_or_default().to_string()
}

impl From<&HmmModel> for ModelFile {
    fn from(model: &HmmModel) -> Self {
        let mut start = BTreeMap::new();
        let mut transitions = BTreeMap::new();
        for (from, row) in model.transitions.rows() {
            let row: BTreeMap<String, f64> =
                row.iter().map(|(to, &p)| (label_of(to), p)).collect();
            if from.is_start() {
                start = row;
            } else {
                transitions.insert(label_of(from), row);
            }
        }
        let emissions = model
            .emissions
            .rows()
            .map(|(tag, row)| {
                let row: BTreeMap<String, f64> =
                    row.iter().map(|(w, &p)| (w.to_string(), p)).collect();
                (label_of(tag), row)
            })
            .collect();
        Self {
            start,
            transitions,
            emissions,
        }
    }
}

/// Normalizes the keys of a JSON map, rejecting keys that tokenizing could
/// never produce and keys that collide once case is folded.
fn normalize_keys<K, V, F>(what: &str, map: BTreeMap<String, V>, key: F) -> Result<BTreeMap<K, V>>
where
    K: Ord,
    F: Fn(&str) -> K,
{
    let mut out = BTreeMap::new();
    for (k, v) in map {
        if k.is_empty() || k.chars().any(char::is_whitespace) {
            return Err(Error::invalid_model(format!("invalid {what} key {k:?}")));
        }
        if out.insert(key(&k), v).is_some() {
            return Err(Error::invalid_model(format!("duplicate {what} key {k:?}")));
        }
    }
    Ok(out)
}

impl TryFrom<ModelFile> for HmmModel {
    type Error = Error;

    fn try_from(file: ModelFile) -> Result<Self> {
        if file.start.is_empty() {
            return Err(Error::EmptyModel);
        }
        let mut transitions = normalize_keys("tag", file.transitions, Tag::new)?
            .into_iter()
            .map(|(from, row)| Ok((from, normalize_keys("tag", row, Tag::new)?)))
            .collect::<Result<BTreeMap<Tag, Row<Tag>>>>()?;
        transitions.insert(Tag::Start, normalize_keys("tag", file.start, Tag::new)?);
        let emissions = normalize_keys("tag", file.emissions, Tag::new)?
            .into_iter()
            .map(|(tag, row)| Ok((tag, normalize_keys("word", row, Word::new)?)))
            .collect::<Result<BTreeMap<Tag, Row<Word>>>>()?;
        let transitions = TransitionTable::new(LogProbTable::from_rows(transitions)?)?;
        let emissions = EmissionTable::new(LogProbTable::from_rows(emissions)?)?;
        Self::new(transitions, emissions)
    }
}
