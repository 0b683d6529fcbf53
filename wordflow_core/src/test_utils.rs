use crate::encoder::Encoder;
use crate::source::{Count, SourceError, WordSource};
use crate::word::Word;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared counters observing a [`VecSource`] after it has been moved into a stage.
#[derive(Debug, Default)]
pub struct SourceProbe {
    pub pulls: AtomicUsize,
    pub close_calls: AtomicUsize,
    pub releases: AtomicUsize,
}

impl SourceProbe {
    pub fn pulls(&self) -> usize {
        self.pulls.load(Ordering::SeqCst)
    }
    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

/// Leaf source over a fixed list of words with a known count.
#[derive(Debug)]
pub struct VecSource {
    words: VecDeque<Word>,
    total: u64,
    closed: bool,
    probe: Arc<SourceProbe>,
}

impl VecSource {
    pub fn new(contents: &[&str]) -> Self {
        Self::from_words(contents.iter().map(|c| Word::plain(*c)).collect())
    }

    pub fn from_words(words: Vec<Word>) -> Self {
        Self {
            total: words.len() as u64,
            words: words.into(),
            closed: false,
            probe: Arc::new(SourceProbe::default()),
        }
    }

    pub fn probe(&self) -> Arc<SourceProbe> {
        Arc::clone(&self.probe)
    }
}

impl WordSource for VecSource {
    type Item = Word;

    fn count(&self) -> Count {
        Count::Known(self.total)
    }

    fn next_word(&mut self) -> Result<Option<Word>, SourceError> {
        self.probe.pulls.fetch_add(1, Ordering::SeqCst);
        if self.closed {
            return Ok(None);
        }
        Ok(self.words.pop_front())
    }

    fn close(&mut self) {
        self.probe.close_calls.fetch_add(1, Ordering::SeqCst);
        if !self.closed {
            self.closed = true;
            self.words.clear();
            self.probe.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Leaf source whose first pull fails; later pulls report exhaustion.
#[derive(Debug)]
pub struct FailingSource {
    error: Option<SourceError>,
}

impl FailingSource {
    pub fn new(error: SourceError) -> Self {
        Self { error: Some(error) }
    }
}

impl WordSource for FailingSource {
    type Item = Word;

    fn count(&self) -> Count {
        Count::Unknown
    }

    fn next_word(&mut self) -> Result<Option<Word>, SourceError> {
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

/// Misbehaving leaf that reports exhaustion once and then produces a word again.
#[derive(Debug, Default)]
pub struct ResurrectingSource {
    pulls: usize,
}

impl WordSource for ResurrectingSource {
    type Item = Word;

    fn count(&self) -> Count {
        Count::Unknown
    }

    fn next_word(&mut self) -> Result<Option<Word>, SourceError> {
        self.pulls += 1;
        match self.pulls {
            1 => Ok(Some(Word::plain("first"))),
            2 => Ok(None),
            _ => Ok(Some(Word::plain("zombie"))),
        }
    }
}

/// Encoder built from a closure, for registries assembled inside tests.
pub struct FnEncoder {
    name: &'static str,
    categories: &'static [&'static str],
    func: fn(&str) -> String,
}

impl FnEncoder {
    pub fn new(
        name: &'static str,
        categories: &'static [&'static str],
        func: fn(&str) -> String,
    ) -> Self {
        Self {
            name,
            categories,
            func,
        }
    }
}

impl Encoder for FnEncoder {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        "test encoder"
    }

    fn categories(&self) -> &'static [&'static str] {
        self.categories
    }

    fn encode(&self, content: &str) -> String {
        (self.func)(content)
    }
}
