pub mod codec;
pub mod pipeline;

use thiserror::Error;

pub use codec::{BinaryCodec, CodecError, DictionaryCodec};
pub use pipeline::{Job, PipelineError, WritePipeline};

/// Failure inside a background persistence task.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
