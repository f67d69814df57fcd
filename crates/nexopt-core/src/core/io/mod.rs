//! Reading study definitions from disk.
//!
//! A study is configured entirely as data: the variable/objective/constraint
//! tables, the alias rows, and the configuration forest all live in one TOML
//! file. This module holds the serde models for that file; turning them into
//! validated engine types happens in [`crate::workflows::study`].

pub mod definition;
