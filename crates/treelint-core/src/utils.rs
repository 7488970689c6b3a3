//! Utility functions for rule implementations.

pub mod allowance;

#[doc(inline)]
pub use allowance::{parse_allow_directive, AllowDirective, DirectiveScope, Suppressions};
