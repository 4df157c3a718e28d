pub mod provider;
pub mod representative;
pub mod sqlite;
pub mod types;

pub use provider::*;
pub use representative::*;
pub use sqlite::*;
pub use types::*;
