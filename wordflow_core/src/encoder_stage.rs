use crate::encoder::Encoder;
use crate::registry::EncoderLookup;
use crate::source::{Count, SourceError, WordSource};
use crate::word::Word;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Separator joining encoder names inside a chained token, e.g. `"md5@base64"`.
pub const CHAIN_SEPARATOR: char = '@';

/// One parsed entry of an encoder configuration list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderToken {
    /// Names applied right to left, each feeding the previous one. Produces one word.
    Chain(Vec<String>),
    /// A name or category resolved to any number of encoders. Produces one word per encoder.
    Group(String),
}

impl EncoderToken {
    /// Parses a configuration token.
    ///
    /// A token is a chain only when the separator appears after its first character;
    /// a leading separator leaves the whole token as a group name.
    pub fn parse(token: &str) -> Result<Self, SourceError> {
        if token.is_empty() {
            return Err(SourceError::BadOptions(
                "encoder token must not be empty".to_string(),
            ));
        }
        match token.find(CHAIN_SEPARATOR) {
            Some(pos) if pos > 0 => {
                let names: Vec<String> = token.split(CHAIN_SEPARATOR).map(str::to_string).collect();
                if names.iter().any(String::is_empty) {
                    return Err(SourceError::BadOptions(format!(
                        "malformed encoder chain '{token}': empty encoder name"
                    )));
                }
                Ok(EncoderToken::Chain(names))
            }
            _ => Ok(EncoderToken::Group(token.to_string())),
        }
    }
}

impl fmt::Display for EncoderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncoderToken::Chain(names) => {
                f.write_str(&names.join(CHAIN_SEPARATOR.to_string().as_str()))
            }
            EncoderToken::Group(name) => f.write_str(name),
        }
    }
}

/// Applies a chain token to `content`: the last-listed encoder runs first.
fn concatenate(
    registry: &dyn EncoderLookup,
    names: &[String],
    content: &str,
) -> Result<String, SourceError> {
    names
        .iter()
        .rev()
        .try_fold(content.to_string(), |acc, name| {
            let plugin = registry.get_plugin(name).map_err(|e| match e {
                SourceError::PluginNotFound { name, .. } => {
                    let token = names.join(CHAIN_SEPARATOR.to_string().as_str());
                    warn!(encoder = %name, %token, "encoder chain references an unknown encoder");
                    SourceError::PluginNotFound { name, token }
                }
                other => other,
            })?;
            Ok(plugin.encode(&acc))
        })
}

/// Decorates a word source, expanding every upstream word through an ordered
/// list of encoder tokens.
///
/// For each upstream word the tokens are visited in order. A chain token emits
/// exactly one word; a group token emits one word per encoder the registry
/// returns for it. All expansions of a word are emitted before the next
/// upstream word is drawn.
///
/// Encoder names are resolved lazily, when the first word for a token is
/// produced, so an unknown name only fails the pipeline once it is reached.
pub struct EncoderStage<S: WordSource<Item = Word>> {
    parent: S,
    tokens: Vec<EncoderToken>,
    registry: Arc<dyn EncoderLookup>,
    /// Upstream word currently being expanded.
    current: Option<Word>,
    token_idx: usize,
    /// Encoders resolved for the group token at `token_idx`.
    resolved: Option<Vec<Arc<dyn Encoder>>>,
    plugin_idx: usize,
    finished: bool,
}

impl<S: WordSource<Item = Word>> EncoderStage<S> {
    /// Wraps `parent` with the given encoder tokens.
    ///
    /// Only token syntax is checked here; names are resolved while producing words.
    /// An empty token list is rejected, since such a stage would never produce a word.
    pub fn new<T: AsRef<str>>(
        parent: S,
        tokens: &[T],
        registry: Arc<dyn EncoderLookup>,
    ) -> Result<Self, SourceError> {
        if tokens.is_empty() {
            return Err(SourceError::BadOptions(
                "an encoder stage needs at least one encoder token".to_string(),
            ));
        }
        let tokens = tokens
            .iter()
            .map(|t| EncoderToken::parse(t.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            parent,
            tokens,
            registry,
            current: None,
            token_idx: 0,
            resolved: None,
            plugin_idx: 0,
            finished: false,
        })
    }

    pub fn tokens(&self) -> &[EncoderToken] {
        &self.tokens
    }

    fn advance(&mut self) -> Result<Option<Word>, SourceError> {
        loop {
            if self.current.is_none() {
                match self.parent.next_word()? {
                    Some(word) => {
                        self.current = Some(word);
                        self.token_idx = 0;
                    }
                    None => return Ok(None),
                }
            }

            if self.token_idx >= self.tokens.len() {
                self.current = None;
                continue;
            }
            let Some(word) = &self.current else {
                continue;
            };

            match &self.tokens[self.token_idx] {
                EncoderToken::Chain(names) => {
                    let encoded = concatenate(self.registry.as_ref(), names, word.content())?;
                    self.token_idx += 1;
                    return Ok(Some(Word::plain(encoded)));
                }
                EncoderToken::Group(name) => {
                    if self.resolved.is_none() {
                        let plugins = self.registry.get_plugins(name);
                        if plugins.is_empty() {
                            warn!(encoder = %name, "encoder token resolved to no encoder");
                            return Err(SourceError::PluginNotFound {
                                name: name.clone(),
                                token: name.clone(),
                            });
                        }
                        debug!(encoder = %name, resolved = plugins.len(), "resolved encoder token");
                        self.resolved = Some(plugins);
                        self.plugin_idx = 0;
                    }

                    let next_plugin = self
                        .resolved
                        .as_ref()
                        .and_then(|plugins| plugins.get(self.plugin_idx))
                        .cloned();
                    match next_plugin {
                        Some(plugin) => {
                            self.plugin_idx += 1;
                            return Ok(Some(Word::plain(plugin.encode(word.content()))));
                        }
                        None => {
                            self.resolved = None;
                            self.token_idx += 1;
                        }
                    }
                }
            }
        }
    }
}

impl<S: WordSource<Item = Word>> WordSource for EncoderStage<S> {
    type Item = Word;

    /// Upstream count times the number of tokens.
    ///
    /// Group tokens resolving to several encoders make the real output larger;
    /// progress displays rely on this nominal figure.
    fn count(&self) -> Count {
        self.parent.count().scale(self.tokens.len())
    }

    fn next_word(&mut self) -> Result<Option<Word>, SourceError> {
        if self.finished {
            return Ok(None);
        }
        match self.advance() {
            Ok(Some(word)) => Ok(Some(word)),
            Ok(None) => {
                self.finished = true;
                Ok(None)
            }
            Err(e) => {
                self.finished = true;
                self.current = None;
                self.resolved = None;
                Err(e)
            }
        }
    }

    fn close(&mut self) {
        trace!("closing encoder stage");
        self.current = None;
        self.resolved = None;
        self.parent.close();
    }
}
