//! Lace Core: the value model and iteration protocol for lazy sequences
//!
//! Key design principles:
//! - Value: What sequences carry (Int, Str, List, Record, Iterator, etc.)
//! - Step: One pull outcome - Done or a carried value
//! - ProtocolIter: The iteration protocol every source speaks
//!
//! # Modules
//!
//! - `value`: Core Value enum (dynamic, cheaply cloneable payloads)
//! - `record`: Ordered key/value rows (own keys only, exact order)
//! - `protocol`: Step type and the ProtocolIter trait
//! - `error`: Runtime error type shared by all protocol operations
//! - `serialize`: TypedValue, a serde-friendly mirror of Value

pub mod error;
pub mod protocol;
pub mod record;
pub mod serialize;
pub mod value;

// Re-export key types
pub use error::Error;
pub use protocol::{ObjRef, ProtocolIter, Step};
pub use record::Record;
pub use serialize::{SerializeError, TypedValue};
pub use value::Value;
