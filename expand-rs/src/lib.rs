//! Shell-style text interpolation.
//!
//! Expands `${VAR}`-style references in a string using a caller-supplied
//! lookup.  The lead and bracket characters are configurable through
//! [`Parser`].
//!
//! | Syntax        | Expands to                                          |
//! |---------------|-----------------------------------------------------|
//! | `$VAR`        | value of `VAR` (unless [`Parser::scoped_only`])      |
//! | `${VAR}`      | value of `VAR`                                      |
//! | `${VAR:-DEF}` | value of `VAR`, or `DEF` if `VAR` is undefined      |
//! | `${VAR:+DEF}` | `DEF` if `VAR` is defined, otherwise nothing        |
//! | `${VAR:/DEF}` | `DEF` if `VAR` is undefined, otherwise nothing      |
//! | `$$`          | a literal `$` (unless scoped-only)                  |
//!
//! `DEF` may itself contain expansions.  Undefined variables and empty values
//! both expand to nothing; only `:-`, `:+` and `:/` tell them apart.
//! Malformed or unterminated expansions are copied to the output unchanged.
//!
//! # Quick start
//!
//! ```rust
//! use std::collections::HashMap;
//!
//! let env: HashMap<&str, &str> = [("NAME", "Example")].into();
//! let lookup = |k: &str| env.get(k).map(|v| v.to_string());
//!
//! assert_eq!(expand::expand("Hello, ${NAME:-World}.", lookup), "Hello, Example.");
//! assert_eq!(expand::expand("${ENVIRON:-testing}", lookup), "testing");
//!
//! let parser = expand::Parser::new()
//!     .with_lead(b'%')
//!     .with_open(b'(')
//!     .with_close(b')')
//!     .scoped(true);
//! assert_eq!(parser.expand("%(NAME) %NAME", lookup), "Example %NAME");
//! ```

pub mod config;
mod lookup;
mod node;
mod parser;
pub mod var;

// Re-exports for convenience.
pub use config::{Config, ConfigError};
pub use lookup::{from_simple_lookup, Env, FnLookup, Layered, Lookup, TryFnLookup};
pub use node::{Node, Template};
pub use parser::{DelimiterError, Parser, DEFAULT_CLOSE, DEFAULT_LEAD, DEFAULT_OPEN};
pub use var::VarStore;

/// Expand `text` with the default `$`, `{`, `}` syntax.
///
/// `lookup` returns `Some(value)` for defined names and `None` otherwise.
pub fn expand<F>(text: &str, lookup: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    Parser::new().expand(text, lookup)
}

/// Expand `text` with the default syntax and a fallible lookup.
///
/// The first error returned by `lookup` aborts the expansion.
pub fn try_expand<F, E>(text: &str, lookup: F) -> Result<String, E>
where
    F: FnMut(&str) -> Result<Option<String>, E>,
{
    Parser::new().try_expand(text, lookup)
}
