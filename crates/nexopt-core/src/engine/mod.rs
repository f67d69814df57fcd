//! The evaluation engine: everything between a raw optimizer vector and a
//! packed objective.
//!
//! The [`nexus::Nexus`] is the session object. It is configured once from a
//! [`config::StudyConfig`], a configuration forest, and a
//! [`pipeline::Pipeline`], then evaluated repeatedly. Aliases are resolved
//! into typed plans up front ([`alias`]), each evaluation threads an
//! [`context::EvaluationContext`] through the pipeline steps, and every
//! completed evaluation is appended to a [`history::History`].

pub(crate) mod alias;
pub mod config;
pub mod context;
pub mod error;
pub mod history;
pub mod nexus;
pub mod pipeline;
pub mod progress;
