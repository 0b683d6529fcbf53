pub mod adapter;
pub mod config;
pub mod encoder;
pub mod encoder_stage;
pub mod pipeline;
pub mod registry;
pub mod source;
pub mod tuple;
pub mod word;

#[cfg(test)]
pub(crate) mod test_utils;

pub use adapter::{AdapterStage, TryAdapterStage};
pub use config::{GeneratorSettings, PayloadConfig, SourceConfig, WordflowConfig};
pub use encoder::Encoder;
pub use encoder_stage::{CHAIN_SEPARATOR, EncoderStage, EncoderToken};
pub use pipeline::{build_payload, build_pipeline, build_source};
pub use registry::{EncoderLookup, EncoderRegistry};
pub use source::{BoxedSource, Count, SourceError, SourceIter, WordSource};
pub use tuple::{Slot, TupleSource, TupleStage, ZipDriver};
pub use word::{Word, WordKind, WordTuple};
