//! Query execution: expression binding, scalar functions and statements.

pub mod evaluator;
mod executor;
pub mod functions;

pub use evaluator::{bind, common_type, compare_values, BoundExpr, Scope, ScopeColumn};
pub use executor::execute;
pub use functions::FUNCTION_NAMES;
