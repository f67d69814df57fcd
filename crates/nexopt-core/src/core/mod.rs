//! # Core Module
//!
//! Foundation types for the optimization nexus: the scalar attribute trees
//! that hold vehicle configurations, the dotted-path language used to address
//! leaves inside them, unit conversion, and study-definition I/O.
//!
//! ## Architecture
//!
//! - **Paths** ([`path`]) - Dotted paths with `*` wildcard segments
//! - **Trees** ([`tree`]) - Nested string-keyed trees of scalar leaves
//! - **Forests** ([`forest`]) - Named trees derived from one canonical base
//! - **Units** ([`units`]) - Engineering-unit factors and SI conversion
//! - **I/O** ([`io`]) - Study definition files (TOML)
//!
//! Everything here is stateless with respect to an optimization run: these
//! types know nothing about variables, constraints, or pipelines.

pub mod forest;
pub mod io;
pub mod path;
pub mod tree;
pub mod units;
