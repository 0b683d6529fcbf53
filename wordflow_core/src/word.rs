use serde::Serialize;
use std::fmt;

/// Semantic tag carried by every [`Word`].
///
/// Stages in this crate only ever manufacture [`WordKind::Plain`]. The other
/// variants are produced by callers and are carried through untouched by any
/// stage that does not rebuild the word.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WordKind {
    #[default]
    Plain,
    /// A reference to a previously obtained fuzz result rather than literal payload text.
    FuzzResult,
    Custom(String),
}

/// A single payload value flowing through the pipeline.
///
/// Words are immutable once built; stages that transform content create a new word.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Word {
    content: String,
    kind: WordKind,
}

impl Word {
    pub fn new(content: impl Into<String>, kind: WordKind) -> Self {
        Self {
            content: content.into(),
            kind,
        }
    }

    pub fn plain(content: impl Into<String>) -> Self {
        Self::new(content, WordKind::Plain)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn kind(&self) -> &WordKind {
        &self.kind
    }

    pub fn into_content(self) -> String {
        self.content
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}

/// An ordered group of words filling one or more combination slots.
pub type WordTuple = Vec<Word>;
