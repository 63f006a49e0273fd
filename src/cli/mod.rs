pub mod config;
pub mod flush;
