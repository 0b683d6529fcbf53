use crate::source::{Count, SourceError, WordSource};
use crate::word::Word;
use std::fmt::Display;
use std::iter::Fuse;
use tracing::trace;

/// Lifts any iterator of displayable values into a [`WordSource`].
///
/// Each element becomes a plain word holding its `Display` form. The length of
/// a foreign iterator is never assumed, so the count is always unknown.
pub struct AdapterStage<I: Iterator> {
    inner: Option<Fuse<I>>,
}

impl<I> AdapterStage<I>
where
    I: Iterator,
    I::Item: Display,
{
    pub fn new<T>(values: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            inner: Some(values.into_iter().fuse()),
        }
    }
}

impl<I> WordSource for AdapterStage<I>
where
    I: Iterator,
    I::Item: Display,
{
    type Item = Word;

    fn count(&self) -> Count {
        Count::Unknown
    }

    fn next_word(&mut self) -> Result<Option<Word>, SourceError> {
        Ok(self
            .inner
            .as_mut()
            .and_then(Iterator::next)
            .map(|value| Word::plain(value.to_string())))
    }

    /// Drops the wrapped iterator, releasing whatever it owns.
    fn close(&mut self) {
        if self.inner.take().is_some() {
            trace!("released adapted iterator");
        }
    }
}

/// Lifts an iterator of fallible values, such as lines read from a file.
///
/// The first error is returned to the caller and ends the source.
pub struct TryAdapterStage<I: Iterator> {
    inner: Option<Fuse<I>>,
}

impl<I, V, E> TryAdapterStage<I>
where
    I: Iterator<Item = Result<V, E>>,
    V: Display,
    E: Into<SourceError>,
{
    pub fn new<T>(values: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            inner: Some(values.into_iter().fuse()),
        }
    }
}

impl<I, V, E> WordSource for TryAdapterStage<I>
where
    I: Iterator<Item = Result<V, E>>,
    V: Display,
    E: Into<SourceError>,
{
    type Item = Word;

    fn count(&self) -> Count {
        Count::Unknown
    }

    fn next_word(&mut self) -> Result<Option<Word>, SourceError> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(None);
        };
        match inner.next() {
            Some(Ok(value)) => Ok(Some(Word::plain(value.to_string()))),
            Some(Err(e)) => {
                self.inner = None;
                Err(e.into())
            }
            None => Ok(None),
        }
    }

    fn close(&mut self) {
        if self.inner.take().is_some() {
            trace!("released adapted iterator");
        }
    }
}
