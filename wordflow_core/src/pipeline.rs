use crate::adapter::{AdapterStage, TryAdapterStage};
use crate::config::{PayloadConfig, SourceConfig, WordflowConfig};
use crate::encoder_stage::EncoderStage;
use crate::registry::EncoderLookup;
use crate::source::{BoxedSource, SourceError};
use crate::tuple::{Slot, TupleSource, TupleStage, ZipDriver};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::sync::Arc;
use tracing::debug;

type BoxedLines = Box<dyn Iterator<Item = std::io::Result<String>> + Send>;

fn file_lines(path: &std::path::Path) -> Result<BoxedLines, SourceError> {
    let file = File::open(path)
        .map_err(|e| SourceError::Io(format!("Failed to open wordlist {path:?}: {e}")))?;
    let lines = BufReader::new(file)
        .lines()
        .map(|line| line.map(|l| l.trim_end_matches('\r').to_string()))
        .filter(|line| !matches!(line, Ok(l) if l.is_empty()));
    Ok(Box::new(lines))
}

/// Builds the leaf source for one payload. Every source goes through an adapter stage.
pub fn build_source(source: &SourceConfig) -> Result<BoxedSource, SourceError> {
    let built: BoxedSource = match source {
        SourceConfig::List { values } => Box::new(AdapterStage::new(values.clone())),
        SourceConfig::Range { start, end, width } => {
            let width = *width;
            Box::new(AdapterStage::new(
                (*start..=*end).map(move |n| format!("{n:0width$}")),
            ))
        }
        SourceConfig::File { path } => Box::new(TryAdapterStage::new(file_lines(path)?)),
    };
    Ok(built)
}

/// Builds one combination slot: leaf source, optional encoder stage, tuple stage.
pub fn build_payload(
    payload: &PayloadConfig,
    registry: Arc<dyn EncoderLookup>,
) -> Result<Box<dyn TupleSource + Send>, SourceError> {
    let mut source = build_source(&payload.source)?;
    if !payload.encoders.is_empty() {
        source = Box::new(EncoderStage::new(source, &payload.encoders, registry)?);
    }
    Ok(Box::new(TupleStage::new(source)))
}

/// Builds the full pipeline for a validated configuration.
///
/// Slots built before a failure are cleaned up before the error is returned.
pub fn build_pipeline(
    config: &WordflowConfig,
    registry: Arc<dyn EncoderLookup>,
) -> Result<ZipDriver, SourceError> {
    let mut slots: Vec<Box<dyn TupleSource + Send>> = Vec::with_capacity(config.payloads.len());
    for payload in &config.payloads {
        match build_payload(payload, Arc::clone(&registry)) {
            Ok(slot) => slots.push(slot),
            Err(e) => {
                for slot in slots.iter_mut() {
                    slot.cleanup();
                }
                return Err(e);
            }
        }
    }
    debug!(payloads = slots.len(), "built payload pipeline");
    ZipDriver::new(slots)
}
