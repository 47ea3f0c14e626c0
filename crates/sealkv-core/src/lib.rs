//! sealkv-core: shared types and configuration for the sealkv workspace

pub mod config;
pub mod error;
pub mod types;

pub use config::StoreConfig;
pub use error::{ConfigError, ConfigResult};
pub use types::{CodecKind, ListPair, StreamSuite};
