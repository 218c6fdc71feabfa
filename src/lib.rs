// src/lib.rs

//! statpipe: public statistics pipelines.
//!
//! Each domain run fetches indicator series, shapes them into JSON
//! artifacts, checks every artifact against its schema and the set against
//! cross-file invariants, and only then publishes.

pub mod error;
pub mod invariants;
pub mod models;
pub mod pipeline;
pub mod schema;
pub mod services;
pub mod storage;
pub mod transform;
pub mod utils;
