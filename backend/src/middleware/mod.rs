//! Request middleware.
//!
//! [`Trace`] gives every request a trace id that handlers, error bodies and
//! log lines share.

pub mod trace;

pub use trace::Trace;
