//! # treelint-rules
//!
//! The `standard` rule set for treelint.
//!
//! ## Available Rules
//!
//! | Id | Status | Fixable | Description |
//! |----|--------|---------|-------------|
//! | `no-var` | stable | no | Forbids `var` declarations |
//! | `no-empty-file` | stable | no | Forbids files without code |
//! | `dot-spacing` | stable | yes | Forbids spaces around `.` |
//! | `no-trailing-spaces` | stable | yes | Forbids spaces at the end of a line |
//! | `comment-spacing` | stable | yes | Requires `// text` |
//! | `no-single-line-block-comment` | experimental | yes | Turns `/* text */` at the end of a line into `// text` |
//! | `final-newline` | stable | yes | Enforces `insert_final_newline` |
//! | `max-line-length` | stable | no | Enforces `max_line_length` |
//!
//! ## Usage
//!
//! ```
//! use treelint_core::{Code, RuleEngine};
//! use treelint_rules::StandardRuleSetProvider;
//!
//! let engine = RuleEngine::builder()
//!     .rule_set(&StandardRuleSetProvider)
//!     .build()?;
//! let outcome = engine.format(&Code::from_text("val a = foo . bar"))?;
//! assert_eq!(outcome.text(), "val a = foo.bar\n");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod comment_spacing;
pub mod dot_spacing;
pub mod final_newline;
pub mod max_line_length;
pub mod no_empty_file;
pub mod no_single_line_block_comment;
pub mod no_trailing_spaces;
pub mod no_var;

mod catalog;
#[cfg(test)]
mod test_support;

pub use catalog::{all_rule_providers, StandardRuleSetProvider};
pub use comment_spacing::CommentSpacing;
pub use dot_spacing::DotSpacing;
pub use final_newline::FinalNewline;
pub use max_line_length::MaxLineLength;
pub use no_empty_file::NoEmptyFile;
pub use no_single_line_block_comment::NoSingleLineBlockComment;
pub use no_trailing_spaces::NoTrailingSpaces;
pub use no_var::NoVar;
