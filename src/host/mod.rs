pub mod decoder;
pub mod plugin;

pub use decoder::{DecodeError, JsonLinesDecoder, RecordDecoder, VecDecoder};
pub use plugin::{BlockingOutput, BucketOutput, OutputPlugin, PluginError};
