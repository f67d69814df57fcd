//! # Nexopt Core Library
//!
//! An optimization nexus for aircraft conceptual-design studies: maps a flat
//! optimizer vector onto nested configuration trees through dotted-path
//! aliases, runs a fixed analysis pipeline, and packs the results back into
//! the objective and constraint residuals an external solver consumes.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a
//! clear separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models: dotted
//!   paths (`TreePath`), configuration trees and the two-layer forest, the
//!   unit table, and study-definition I/O.
//!
//! - **[`engine`]: The Logic Core.** This stateful layer orchestrates an
//!   evaluation. It holds the session object (`Nexus`), alias resolution,
//!   the pipeline abstraction, the evaluation context, and the history of
//!   completed evaluations.
//!
//! - **[`workflows`]: The Public API.** This is the highest-level,
//!   user-facing layer. It builds a `Study` from a definition file and a
//!   pipeline, and exposes the black-box surface a gradient solver drives.

pub mod core;
pub mod engine;
pub mod workflows;
