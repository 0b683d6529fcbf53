use crate::encoder_stage::{CHAIN_SEPARATOR, EncoderToken};
use crate::source::SourceError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Where a payload draws its words from.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum SourceConfig {
    /// Literal values, in order.
    List { values: Vec<String> },
    /// Every integer in `start..=end`, zero-padded to `width` digits when `width > 0`.
    Range {
        start: i64,
        end: i64,
        #[serde(default)]
        width: usize,
    },
    /// One word per line of a text file.
    File { path: PathBuf },
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct PayloadConfig {
    pub source: SourceConfig,
    #[serde(default)]
    pub encoders: Vec<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct GeneratorSettings {
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

pub fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            limit: None,
            log_level: default_log_level(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct WordflowConfig {
    #[serde(default)]
    pub generator: GeneratorSettings,
    #[serde(default)]
    pub payloads: Vec<PayloadConfig>,
}

impl WordflowConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, anyhow::Error> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file at {:?}: {}", path, e))?;

        Self::from_toml_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse TOML from config file {:?}: {}", path, e)
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Checks everything that can be checked without producing a word.
    ///
    /// Encoder names are not resolved here; an unknown name surfaces when the
    /// pipeline reaches it.
    pub fn validate(&self) -> Result<(), SourceError> {
        if self.payloads.is_empty() {
            return Err(SourceError::BadOptions(
                "at least one payload must be configured".to_string(),
            ));
        }
        for (idx, payload) in self.payloads.iter().enumerate() {
            for token in &payload.encoders {
                if token.starts_with(CHAIN_SEPARATOR) {
                    return Err(SourceError::BadOptions(format!(
                        "payload {idx}: encoder token '{token}' starts with '{CHAIN_SEPARATOR}'"
                    )));
                }
                EncoderToken::parse(token).map_err(|e| match e {
                    SourceError::BadOptions(msg) => {
                        SourceError::BadOptions(format!("payload {idx}: {msg}"))
                    }
                    other => other,
                })?;
            }
            if let SourceConfig::Range { start, end, .. } = payload.source {
                if start > end {
                    return Err(SourceError::BadOptions(format!(
                        "payload {idx}: range start {start} is greater than end {end}"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[generator]
seed = 7
limit = 25

[[payloads]]
encoders = ["md5", "base64@rot13"]
source = { type = "range", start = 0, end = 10, width = 3 }

[[payloads]]
source = { type = "list", values = ["admin", "root"] }
"#;

    #[test]
    fn parses_full_config() {
        let config = WordflowConfig::from_toml_str(SAMPLE).expect("sample config should parse");
        assert_eq!(config.generator.seed, 7);
        assert_eq!(config.generator.limit, Some(25));
        assert_eq!(config.generator.log_level, "warn");
        assert_eq!(config.payloads.len(), 2);
        assert_eq!(
            config.payloads[0].source,
            SourceConfig::Range {
                start: 0,
                end: 10,
                width: 3
            }
        );
        assert_eq!(config.payloads[0].encoders, vec!["md5", "base64@rot13"]);
        assert!(config.payloads[1].encoders.is_empty());
        config.validate().expect("sample config should be valid");
    }

    #[test]
    fn rejects_unknown_fields() {
        let result = WordflowConfig::from_toml_str("[generator]\nthreads = 4\n");
        assert!(result.is_err(), "Unknown generator keys should be rejected");
    }

    #[test]
    fn validate_rejects_malformed_encoder_tokens() {
        for token in ["@md5", "md5@@base64", "md5@", ""] {
            let config = WordflowConfig {
                generator: GeneratorSettings::default(),
                payloads: vec![PayloadConfig {
                    source: SourceConfig::List {
                        values: vec!["a".to_string()],
                    },
                    encoders: vec![token.to_string()],
                }],
            };
            assert!(
                matches!(config.validate(), Err(SourceError::BadOptions(_))),
                "Token {token:?} should fail validation"
            );
        }
    }

    #[test]
    fn validate_accepts_unknown_encoder_names() {
        let config = WordflowConfig {
            generator: GeneratorSettings::default(),
            payloads: vec![PayloadConfig {
                source: SourceConfig::List { values: vec![] },
                encoders: vec!["not_registered_anywhere".to_string()],
            }],
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_payloads_and_inverted_ranges() {
        assert!(WordflowConfig::default().validate().is_err());

        let inverted = WordflowConfig {
            generator: GeneratorSettings::default(),
            payloads: vec![PayloadConfig {
                source: SourceConfig::Range {
                    start: 5,
                    end: 1,
                    width: 0,
                },
                encoders: vec![],
            }],
        };
        assert!(matches!(
            inverted.validate(),
            Err(SourceError::BadOptions(_))
        ));
    }

    #[test]
    fn load_from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = WordflowConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.payloads.len(), 2);

        let missing = WordflowConfig::load_from_file(Path::new("/definitely/not/here.toml"));
        assert!(missing.is_err());
    }
}
