pub mod lines;
pub mod normalize;

pub use lines::{BatchEncoder, EncodeError};
pub use normalize::{normalize, NormalizeError, Normalizer};
