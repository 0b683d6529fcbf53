use crate::encoder::{Encoder, default_encoders};
use crate::source::SourceError;
use std::fmt;
use std::sync::Arc;

/// Resolves encoder names to encoder implementations.
///
/// Stages hold a lookup rather than concrete encoders so that names are only
/// resolved when a word is actually produced.
pub trait EncoderLookup: Send + Sync {
    /// Returns the single encoder registered under exactly `name`.
    ///
    /// Returns `Err(SourceError::PluginNotFound)` when no encoder has that name.
    fn get_plugin(&self, name: &str) -> Result<Arc<dyn Encoder>, SourceError>;

    /// Returns every encoder whose name equals `name` or whose categories contain it,
    /// in registration order. An empty vector means nothing matched.
    fn get_plugins(&self, name: &str) -> Vec<Arc<dyn Encoder>>;
}

/// An in-memory [`EncoderLookup`] keeping encoders in registration order.
#[derive(Default, Clone)]
pub struct EncoderRegistry {
    encoders: Vec<Arc<dyn Encoder>>,
}

impl EncoderRegistry {
    pub fn new() -> Self {
        Self {
            encoders: Vec::new(),
        }
    }

    /// Creates a registry holding the built-in encoder family.
    pub fn with_defaults(seed: u64) -> Self {
        Self {
            encoders: default_encoders(seed),
        }
    }

    /// Adds an encoder. Names are unique within a registry.
    pub fn register(&mut self, encoder: Arc<dyn Encoder>) -> Result<(), SourceError> {
        if self.encoders.iter().any(|e| e.name() == encoder.name()) {
            return Err(SourceError::BadOptions(format!(
                "encoder '{}' is already registered",
                encoder.name()
            )));
        }
        self.encoders.push(encoder);
        Ok(())
    }

    pub fn encoders(&self) -> &[Arc<dyn Encoder>] {
        &self.encoders
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }
}

impl fmt::Debug for EncoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.encoders.iter().map(|e| e.name()))
            .finish()
    }
}

impl EncoderLookup for EncoderRegistry {
    fn get_plugin(&self, name: &str) -> Result<Arc<dyn Encoder>, SourceError> {
        self.encoders
            .iter()
            .find(|e| e.name() == name)
            .cloned()
            .ok_or_else(|| SourceError::PluginNotFound {
                name: name.to_string(),
                token: name.to_string(),
            })
    }

    fn get_plugins(&self, name: &str) -> Vec<Arc<dyn Encoder>> {
        self.encoders
            .iter()
            .filter(|e| e.name() == name || e.categories().iter().any(|c| *c == name))
            .cloned()
            .collect()
    }
}
