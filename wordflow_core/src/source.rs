use crate::word::Word;
use std::fmt;
use thiserror::Error;

/// Errors surfaced by a [`WordSource`] while producing items.
///
/// Running out of items is not an error: it is reported as `Ok(None)` from
/// [`WordSource::next_word`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// An encoder token (or one segment of a chained token) resolved to no encoder.
    ///
    /// `name` is the unresolved encoder, `token` the configured token containing it.
    #[error(
        "{name} encoder does not exist in token '{token}' (use --list-encoders for a list of available encoders)"
    )]
    PluginNotFound { name: String, token: String },

    /// The pipeline was configured with something it cannot run, such as a malformed token.
    #[error("Bad options: {0}")]
    BadOptions(String),

    /// An I/O error raised by a leaf source while reading its backing storage.
    #[error("Source I/O error: {0}")]
    Io(String),

    /// A failure reported by a foreign producer wrapped into the pipeline.
    #[error("Source error: {0}")]
    Source(String),
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        SourceError::Io(err.to_string())
    }
}

/// Number of items a source will produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Count {
    Known(u64),
    /// The total cannot be known without consuming the source.
    Unknown,
}

impl Count {
    /// Integer sentinel used by the unknown count in progress displays.
    pub const UNKNOWN_SENTINEL: i64 = -1;

    /// Returns the count as an integer, or [`Count::UNKNOWN_SENTINEL`] when unknown.
    pub fn as_sentinel(&self) -> i64 {
        match self {
            Count::Known(n) => i64::try_from(*n).unwrap_or(i64::MAX),
            Count::Unknown => Self::UNKNOWN_SENTINEL,
        }
    }

    pub fn known(&self) -> Option<u64> {
        match self {
            Count::Known(n) => Some(*n),
            Count::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Count::Known(_))
    }

    /// Multiplies a known count by `factor`; an unknown count stays unknown.
    pub fn scale(self, factor: usize) -> Count {
        match self {
            Count::Known(n) => Count::Known(n.saturating_mul(factor as u64)),
            Count::Unknown => Count::Unknown,
        }
    }
}

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Count::Known(n) => write!(f, "{n}"),
            Count::Unknown => f.write_str("unknown"),
        }
    }
}

/// A single-pass, pull-based producer of payload items.
///
/// Every pipeline stage implements this trait, whether it is a leaf that owns
/// a resource or a decorator that owns exactly one upstream source.
///
/// Implementations must uphold the following:
/// * Exhaustion is terminal. Once `next_word` returned `Ok(None)` it keeps
///   returning `Ok(None)`.
/// * `count` is a side-effect free query.
/// * `close` is safe to call any number of times, including after an error.
///
/// # Type Parameters
/// * `Item`: [`Word`] for plain sources, [`crate::word::WordTuple`] for combination slots.
pub trait WordSource {
    type Item;

    /// Returns the total number of items this source produces, if it is known up front.
    fn count(&self) -> Count;

    /// Advances the source by one item.
    ///
    /// # Returns
    /// * `Ok(Some(item))`: the next produced item.
    /// * `Ok(None)`: the source is exhausted.
    /// * `Err(error)`: production failed; the error is never retried internally.
    fn next_word(&mut self) -> Result<Option<Self::Item>, SourceError>;

    /// Releases any resource held by this source and by every source it wraps.
    fn close(&mut self) {}
}

impl<S: WordSource + ?Sized> WordSource for Box<S> {
    type Item = S::Item;

    fn count(&self) -> Count {
        (**self).count()
    }

    fn next_word(&mut self) -> Result<Option<Self::Item>, SourceError> {
        (**self).next_word()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// A type-erased word source, used to stack stages without naming the inner type.
pub type BoxedSource = Box<dyn WordSource<Item = Word> + Send>;

/// Exposes a [`WordSource`] as a std [`Iterator`].
///
/// Iteration ends after the first error has been yielded.
pub struct SourceIter<'a, S: WordSource + ?Sized> {
    source: &'a mut S,
    failed: bool,
}

impl<'a, S: WordSource + ?Sized> SourceIter<'a, S> {
    pub fn new(source: &'a mut S) -> Self {
        Self {
            source,
            failed: false,
        }
    }
}

impl<S: WordSource + ?Sized> Iterator for SourceIter<'_, S> {
    type Item = Result<S::Item, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.source.next_word() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
