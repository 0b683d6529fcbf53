use crate::source::{Count, SourceError, WordSource};
use crate::word::{Word, WordTuple};
use tracing::trace;

/// A `Slot` is one participant of a multi-payload combination.
///
/// A combination driver uses `width` to know how many positions a slot fills
/// and `payloads` to reach every leaf source it must eventually close.
pub trait Slot {
    /// Number of words each produced tuple contributes.
    fn width(&self) -> usize;

    /// The word sources feeding this slot.
    fn payloads(&self) -> Vec<&dyn WordSource<Item = Word>>;

    /// Mutable access to the same sources returned by [`Slot::payloads`].
    fn payloads_mut(&mut self) -> Vec<&mut dyn WordSource<Item = Word>>;

    /// Closes every payload. Safe to call more than once.
    fn cleanup(&mut self) {
        for payload in self.payloads_mut() {
            payload.close();
        }
    }
}

/// A tuple-producing source that can also be combined as a slot.
pub trait TupleSource: WordSource<Item = WordTuple> + Slot {}

impl<T: WordSource<Item = WordTuple> + Slot + ?Sized> TupleSource for T {}

/// Adapts a single word source into a width-1 slot.
///
/// Once the wrapped source reports exhaustion or fails, the stage stays exhausted.
pub struct TupleStage<S: WordSource<Item = Word>> {
    parent: S,
    finished: bool,
}

impl<S: WordSource<Item = Word>> TupleStage<S> {
    pub fn new(parent: S) -> Self {
        Self {
            parent,
            finished: false,
        }
    }

    pub fn into_inner(self) -> S {
        self.parent
    }
}

impl<S: WordSource<Item = Word>> WordSource for TupleStage<S> {
    type Item = WordTuple;

    fn count(&self) -> Count {
        self.parent.count()
    }

    fn next_word(&mut self) -> Result<Option<WordTuple>, SourceError> {
        if self.finished {
            return Ok(None);
        }
        match self.parent.next_word() {
            Ok(Some(word)) => Ok(Some(vec![word])),
            Ok(None) => {
                self.finished = true;
                Ok(None)
            }
            Err(e) => {
                self.finished = true;
                Err(e)
            }
        }
    }

    fn close(&mut self) {
        self.parent.close();
    }
}

impl<S: WordSource<Item = Word>> Slot for TupleStage<S> {
    fn width(&self) -> usize {
        1
    }

    fn payloads(&self) -> Vec<&dyn WordSource<Item = Word>> {
        vec![&self.parent as &dyn WordSource<Item = Word>]
    }

    fn payloads_mut(&mut self) -> Vec<&mut dyn WordSource<Item = Word>> {
        vec![&mut self.parent as &mut dyn WordSource<Item = Word>]
    }
}

/// Combines slots in lock-step, concatenating one tuple from each.
///
/// The driver is exhausted as soon as any slot is exhausted.
pub struct ZipDriver {
    slots: Vec<Box<dyn TupleSource + Send>>,
    finished: bool,
}

impl ZipDriver {
    pub fn new(slots: Vec<Box<dyn TupleSource + Send>>) -> Result<Self, SourceError> {
        if slots.is_empty() {
            return Err(SourceError::BadOptions(
                "a combination needs at least one payload".to_string(),
            ));
        }
        Ok(Self {
            slots,
            finished: false,
        })
    }
}

impl WordSource for ZipDriver {
    type Item = WordTuple;

    /// Shortest slot count; unknown as soon as any slot is unknown.
    fn count(&self) -> Count {
        self.slots
            .iter()
            .map(|slot| slot.count().known())
            .collect::<Option<Vec<u64>>>()
            .and_then(|counts| counts.into_iter().min())
            .map_or(Count::Unknown, Count::Known)
    }

    fn next_word(&mut self) -> Result<Option<WordTuple>, SourceError> {
        if self.finished {
            return Ok(None);
        }
        let mut combined = Vec::with_capacity(self.width());
        for slot in self.slots.iter_mut() {
            match slot.next_word() {
                Ok(Some(tuple)) => combined.extend(tuple),
                Ok(None) => {
                    self.finished = true;
                    return Ok(None);
                }
                Err(e) => {
                    self.finished = true;
                    return Err(e);
                }
            }
        }
        Ok(Some(combined))
    }

    fn close(&mut self) {
        trace!(slots = self.slots.len(), "closing zip driver");
        for slot in self.slots.iter_mut() {
            slot.close();
        }
    }
}

impl Slot for ZipDriver {
    fn width(&self) -> usize {
        self.slots.iter().map(|slot| slot.width()).sum()
    }

    fn payloads(&self) -> Vec<&dyn WordSource<Item = Word>> {
        self.slots.iter().flat_map(|slot| slot.payloads()).collect()
    }

    fn payloads_mut(&mut self) -> Vec<&mut dyn WordSource<Item = Word>> {
        self.slots
            .iter_mut()
            .flat_map(|slot| slot.payloads_mut())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::AdapterStage;
    use crate::source::SourceIter;
    use crate::test_utils::{FailingSource, ResurrectingSource, VecSource};

    fn slot<S>(source: S) -> Box<dyn TupleSource + Send>
    where
        S: WordSource<Item = Word> + Send + 'static,
    {
        Box::new(TupleStage::new(source))
    }

    fn contents(tuple: &WordTuple) -> Vec<&str> {
        tuple.iter().map(Word::content).collect()
    }

    #[test]
    fn tuple_stage_wraps_each_word_in_a_single_element_tuple() {
        let mut stage = TupleStage::new(VecSource::new(&["a", "b"]));
        assert_eq!(stage.count(), Count::Known(2));
        assert_eq!(stage.next_word().unwrap(), Some(vec![Word::plain("a")]));
        assert_eq!(stage.next_word().unwrap(), Some(vec![Word::plain("b")]));
        assert_eq!(stage.next_word().unwrap(), None);
    }

    #[test]
    fn tuple_stage_exhaustion_is_terminal_even_if_upstream_resurrects() {
        let mut stage = TupleStage::new(ResurrectingSource::default());
        assert_eq!(stage.next_word().unwrap(), Some(vec![Word::plain("first")]));
        assert_eq!(stage.next_word().unwrap(), None);
        assert_eq!(
            stage.next_word().unwrap(),
            None,
            "A stage that reported exhaustion must not produce again"
        );
    }

    #[test]
    fn tuple_stage_error_ends_the_stage() {
        let mut stage = TupleStage::new(FailingSource::new(SourceError::Source("gone".into())));
        assert_eq!(
            stage.next_word(),
            Err(SourceError::Source("gone".to_string()))
        );
        assert_eq!(stage.next_word().unwrap(), None);
    }

    #[test]
    fn tuple_stage_count_is_the_wrapped_count_unmodified() {
        let stage = TupleStage::new(AdapterStage::new(["x"]));
        assert_eq!(stage.count(), Count::Unknown);
    }

    #[test]
    fn tuple_stage_is_a_width_one_slot_over_the_wrapped_source() {
        let stage = TupleStage::new(VecSource::new(&["a"]));
        assert_eq!(stage.width(), 1);
        let payloads = stage.payloads();
        assert_eq!(payloads.len(), 1);
        assert!(
            std::ptr::addr_eq(payloads[0], &stage.parent),
            "The only payload must be the wrapped source itself"
        );
    }

    #[test]
    fn cleanup_closes_payloads_and_is_idempotent() {
        let upstream = VecSource::new(&["a"]);
        let probe = upstream.probe();
        let mut stage = TupleStage::new(upstream);
        stage.cleanup();
        stage.cleanup();
        assert_eq!(probe.close_calls(), 2);
        assert_eq!(probe.releases(), 1);
        assert_eq!(stage.next_word().unwrap(), None);
    }

    #[test]
    fn zip_driver_combines_slots_until_the_shortest_is_exhausted() {
        let mut driver = ZipDriver::new(vec![
            slot(VecSource::new(&["a", "b", "c"])),
            slot(VecSource::new(&["1", "2"])),
        ])
        .unwrap();

        assert_eq!(driver.width(), 2);
        assert_eq!(driver.count(), Count::Known(2));
        assert_eq!(contents(&driver.next_word().unwrap().unwrap()), vec!["a", "1"]);
        assert_eq!(contents(&driver.next_word().unwrap().unwrap()), vec!["b", "2"]);
        assert_eq!(driver.next_word().unwrap(), None);
        assert_eq!(driver.next_word().unwrap(), None);
    }

    #[test]
    fn zip_driver_count_is_unknown_when_any_slot_is_unknown() {
        let mut mixed = ZipDriver::new(vec![
            slot(AdapterStage::new(0..1)),
            slot(VecSource::new(&["a", "b", "c"])),
        ])
        .unwrap();
        assert_eq!(
            mixed.count(),
            Count::Unknown,
            "An unknown slot may be the shortest, so no total can be promised"
        );
        let produced = SourceIter::new(&mut mixed).count();
        assert_eq!(produced, 1);

        let unknown = ZipDriver::new(vec![slot(AdapterStage::new(0..3))])
            .unwrap();
        assert_eq!(unknown.count(), Count::Unknown);
    }

    #[test]
    fn zip_driver_cleanup_reaches_every_leaf() {
        let first = VecSource::new(&["a"]);
        let second = VecSource::new(&["b"]);
        let (first_probe, second_probe) = (first.probe(), second.probe());
        let mut driver = ZipDriver::new(vec![
            slot(first),
            slot(second),
        ])
        .unwrap();

        assert_eq!(driver.payloads().len(), 2);
        driver.cleanup();
        driver.close();
        assert_eq!(first_probe.releases(), 1);
        assert_eq!(second_probe.releases(), 1);
        assert_eq!(first_probe.close_calls(), 2);
    }

    #[test]
    fn zip_driver_requires_at_least_one_slot() {
        assert!(matches!(
            ZipDriver::new(Vec::new()),
            Err(SourceError::BadOptions(_))
        ));
    }
}
