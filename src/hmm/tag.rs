use std::fmt::Display;

/// A hidden state.
///
/// `Start` is the state every sentence begins in. It owns a transition row
/// but never emits a word and is never produced by the decoder. Labels are
/// stored uppercased, so `det` and `DET` are the same state.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tag {
    Start,
    Label(String),
}

pub(crate) static START: Tag = Tag::Start;

impl Tag {
    pub fn new(s: &str) -> Self {
        Self::Label(s.to_uppercase())
    }

    pub fn is_start(&self) -> bool {
        matches!(self, Self::Start)
    }

    /// The label text, or `None` for the start sentinel.
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Start => None,
            Self::Label(s) => Some(s),
        }
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => f.write_str("<start>"),
            Self::Label(s) => f.write_str(s),
        }
    }
}

/// An observed token, stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Word(String);

impl Word {
    pub fn new(s: &str) -> Self {
        Self(s.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Splits a whitespace-delimited tag line into normalized tags.
pub fn tokenize_tags(line: &str) -> Vec<Tag> {
    line.split_whitespace().map(Tag::new).collect()
}

/// Splits a whitespace-delimited sentence into normalized words.
pub fn tokenize_words(line: &str) -> Vec<Word> {
    line.split_whitespace().map(Word::new).collect()
}
