//! Mapping Contract Validator
//!
//! A declarative table (`config/contract.yaml`) restricting each intent to
//! exactly one chunk shape. Invalid chunks are never dropped: they are
//! replaced in place by the standard `ErrorBlock` chunk so output order and
//! count survive.

mod predicate;
mod validator;

pub use predicate::*;
pub use validator::*;
