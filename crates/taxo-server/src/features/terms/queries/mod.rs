pub mod resolve_terms;

pub use resolve_terms::{handle, ResolveTermsError, ResolveTermsQuery, TermArgument};
