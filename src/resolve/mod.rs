//! Field type classification, override merging and variable resolution

pub mod field_type;
pub mod merge;
pub mod variables;

pub use field_type::{classify, FieldKind, SqlKeyword};
pub use merge::{merge, merge_all, merge_concat};
pub use variables::{block_variables, mapping_variables, resolve_str, resolve_tree, substitute_block, Variables};
