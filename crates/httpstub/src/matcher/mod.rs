//! Pure request-matching predicates.
//!
//! - `value` - compiled facet matchers (exact, pattern, absent, body)
//! - `request` - the conjunction of all facets of a descriptor over one
//!   inbound request

pub mod request;
pub mod value;

pub use request::is_match;
pub use value::{BodyMatch, CompiledPattern, HeaderMatch, ValueMatch};
