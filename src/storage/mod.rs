pub mod bucket;
pub mod key;
pub mod traits;

pub use bucket::BucketStore;
pub use key::ObjectKey;
pub use traits::{ObjectWriter, StoreBuildError, WriteError};
