//! # DJC Path Language - Abstract Syntax Tree
//!
//! A path expression describes how to walk from a document node to the
//! values of interest. The parser turns its text into a [`Token`] tree which
//! the [`Evaluator`](crate::Evaluator) runs against a document.
//!
//! ## Submodules
//!
//! - **[lexeme]** - Lexical units produced by the lexer
//! - **[token]** - The parsed token tree
//! - **[index]** - Index specs (`[0]`, `[1..3]`, `[-2+]`)
//!
//! ## Quick Start
//!
//! ```text
//! customers.employees.name.first
//! ```
//!
//! Walks `customers`, distributes over each customer, then over each
//! employee, and yields the list of every first name.
//!
//! ## Operators
//!
//! From loosest to tightest binding:
//!
//! - `,` **each** - evaluate every branch, keep all results positionally
//! - `&` **all** - evaluate every branch, null unless every branch matched
//! - `|` **any** - first branch with a non-null result wins
//! - `.` **sequence** - feed each step's result into the next
//!
//! ## Atoms
//!
//! - `key` - object field; distributed over lists
//! - `key[spec]` - field, then index selection on the resulting list
//! - `*` - the whole current list (broadcast without flattening)
//! - `/regex/` - every object value whose key matches
//! - `<expr>` - lookup: `expr` yields key(s) resolved again from the root
//! - `#text` - literal text, ignores the document
//!
//! ## Examples
//!
//! ```text
//! name.first,name.last        // both names, side by side
//! boss.name.first|#N/A         // first name of the boss, or "N/A"
//! items[0,-1].price            // price of the first and last item
//! <manager_ref>.email          // follow a reference stored in the document
//! ```
pub mod index;
pub mod lexeme;
pub mod token;

pub use index::{IndexSpec, Selector};
pub use lexeme::Lexeme;
pub use token::{Pattern, Token};
