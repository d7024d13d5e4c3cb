//! Decision-model provider implementations

#[cfg(feature = "gemini")]
pub mod gemini;
