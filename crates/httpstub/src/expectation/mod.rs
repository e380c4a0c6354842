//! Expectations: descriptors, and the registry that consumes them.
//!
//! - `descriptor` - immutable request/response specifications and their
//!   builders
//! - `registry` - the ordered pending/consumed store with at-most-once
//!   consumption and the teardown verification checks

pub mod descriptor;
pub mod registry;

pub use descriptor::{
    InvalidMethod, Method, RequestDescriptor, RequestDescriptorBuilder, ResponseDescriptor,
    ResponseDescriptorBuilder,
};
pub use registry::{Expectation, ExpectationRegistry};
