pub mod build_tree;

pub use build_tree::{handle, BuildTreeError, BuildTreeQuery, TaxonomicNode};
