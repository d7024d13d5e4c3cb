//! Tool framework for advisor-rs
//!
//! Defines the [`Tool`] trait implemented by every analysis function, the
//! [`ToolRegistry`] that maps tool names to handlers and schemas, and the
//! schema validation applied to every invocation before dispatch. The
//! registry is built once at startup and treated as immutable afterwards,
//! so the advertised schemas can never drift from their handlers.

pub mod registry;
pub mod tool;
pub mod validate;

pub use registry::ToolRegistry;
pub use tool::Tool;
pub use validate::validate_args;
