pub mod queries;
pub mod routes;

pub use queries::{BuildTreeError, BuildTreeQuery, TaxonomicNode};

pub use routes::tree_routes;
