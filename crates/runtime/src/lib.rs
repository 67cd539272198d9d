//! Lace Runtime: lazy sequence combinators over the iteration protocol
//!
//! Key design principles:
//! - Handle: exclusive pull/close access to one underlying source
//! - Sequence: a combinator's output, itself a valid source (composability)
//! - Closing discipline: every exit path releases exactly what it owns
//!
//! # Modules
//!
//! - `handle`: Source Protocol Adapter and the built-in list/string sources
//! - `closing`: single-handle and multi-handle release rules
//! - `lazy`: per-combinator state machines and the sequence lifecycle
//! - `zip`: the joining engine (shortest/longest/strict)
//! - `sequence`: the public Sequence API
//! - `consume`: terminal consumers (reduce, to_values, for_each, some,
//!   every, find)
//! - `probe`: instrumented sources for observing protocol traffic

pub mod closing;
pub mod consume;
pub mod handle;
pub mod lazy;
pub mod probe;
pub mod sequence;
pub mod zip;

// Re-export key types
pub use lace_core::{Error, ObjRef, ProtocolIter, Record, Step, Value};

pub use closing::{abandon, close_all, close_all_quietly, close_quietly};
pub use handle::{CharSource, Handle, ListSource};
pub use lazy::Callback;
pub use sequence::Sequence;
