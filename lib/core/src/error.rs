//! Report-carrying result alias shared across the relay crates.
//!
//! Domain errors stay hand-rolled in the crate that raises them; this alias
//! is how the worker binary collects them at its top level, where attached
//! context renders in one place on exit.

use rootcause::Report;

/// Result alias over a rootcause [`Report`].
///
/// Layers attach context with `.context()` while the error bubbles up.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
