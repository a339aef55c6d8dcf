//! Generic utility primitives with zero domain knowledge.
//!
//! - `redact` - Secret masking for logs and output
//! - `shell` - Shell escaping and quoting

pub mod redact;
pub mod shell;
