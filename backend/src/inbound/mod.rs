//! Inbound adapters translating client traffic into driving-port calls.
//!
//! [`http`] serves page views, REST actions, media and probes; [`ws`] pushes
//! live listing snapshots. Framework types stay inside these modules.

pub mod http;
pub mod ws;
