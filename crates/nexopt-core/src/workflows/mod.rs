//! High-level entry points gluing the engine to callers.
//!
//! A [`study::Study`] wraps a configured nexus with the policy decisions a
//! driver program makes: how to treat failed evaluations, and how to turn a
//! solver's final vector into a printable report.

pub mod study;
