pub mod cli;
pub mod config;
pub mod debug;
pub mod error;
pub mod filter;
pub mod generator;
pub mod resolve;
pub mod schema;
pub mod writer;

pub use cli::{Cli, Commands};
pub use config::GeneratorConfig;
pub use error::{GenerateError, SchemaError};
pub use generator::{GenerationReport, Pipeline};
