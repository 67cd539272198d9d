//! Closing Discipline: releasing handles on every exit path
//!
//! Two forms, shared by every combinator:
//!
//! - Single-handle: a combinator unwinding from its own body error closes
//!   its source but keeps the body error; a caller-invoked close propagates
//!   the close error. `abandon` is the unwinding form.
//! - Multi-handle: `close_all` sweeps a slot list in reverse index order,
//!   closing every still-open handle. The first close error encountered is
//!   surfaced only when the caller's pending result was a success; a pending
//!   error always wins. Close order and error priority are load-bearing.
//!
//! An iterator that itself failed a pull is never closed; the caller marks
//! its slot closed before sweeping the siblings.

use crate::handle::Handle;
use lace_core::{Error, Step};
use tracing::trace;

/// Close a handle, suppressing any close error.
///
/// Used only while already unwinding from another error, where close is a
/// cleanup action rather than a reporter.
pub fn close_quietly(handle: &Handle) {
    if let Err(err) = handle.close() {
        trace!(error = %err, "suppressed close error during unwind");
    }
}

/// Take a slot's handle, if still present, and close it quietly.
pub fn abandon(slot: &mut Option<Handle>) {
    if let Some(handle) = slot.take() {
        close_quietly(&handle);
    }
}

/// Close every open slot in reverse index order, suppressing close errors.
///
/// The construction paths use this when a validation error is already
/// unwinding and must not be displaced by a close failure.
pub fn close_all_quietly(slots: &mut [Option<Handle>]) {
    for slot in slots.iter_mut().rev() {
        abandon(slot);
    }
}

/// Close every open slot in reverse index order, then resolve `pending`.
///
/// Every slot is emptied regardless of close failures. Error priority:
/// a pending error outranks any close error; otherwise the first close
/// error (highest index) replaces the pending success.
pub fn close_all(slots: &mut [Option<Handle>], pending: Result<Step, Error>) -> Result<Step, Error> {
    let mut first_close_err: Option<Error> = None;
    for slot in slots.iter_mut().rev() {
        if let Some(handle) = slot.take() {
            if let Err(err) = handle.close() {
                trace!(error = %err, "close error during close-all sweep");
                if first_close_err.is_none() {
                    first_close_err = Some(err);
                }
            }
        }
    }
    match (pending, first_close_err) {
        (Err(pending_err), _) => Err(pending_err),
        (Ok(_), Some(close_err)) => Err(close_err),
        (ok, None) => ok,
    }
}
