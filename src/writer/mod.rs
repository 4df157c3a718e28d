pub mod artifact;
pub mod yaml;

pub use artifact::*;
pub use yaml::*;
