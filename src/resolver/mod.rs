//! Request resolver (verb module)
//!
//! Transforms a QueryRequest into a QuerySpec by looking up catalog names.

mod resolve;
mod error;

pub use resolve::resolve_request;
pub use error::ResolveError;
