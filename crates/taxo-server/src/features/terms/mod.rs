pub mod queries;
pub mod routes;

pub use queries::{ResolveTermsError, ResolveTermsQuery, TermArgument};

pub use routes::terms_routes;
