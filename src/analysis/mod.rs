//! The symbolic analysis core: import access-path resolution and static
//! expression evaluation.
//!
//! The evaluator depends on the resolver (to recognize `path`/`url` module
//! calls), never the reverse. Both degrade to `None`/`false` on anything
//! ambiguous; neither ever panics or allocates long-lived state beyond the
//! session cache.

mod access_path;
mod static_expr;

pub use access_path::{import_access_path, AccessPath};
pub use static_expr::{is_static_expression, StaticCache};
