//! Pipeline entry points.
//!
//! - `run_domain`: fetch, shape, verify and publish one indicator domain
//! - `run_budget_check`: re-verify published union-budget artifacts
//! - `run_validate`: configuration sanity

pub mod check;
pub mod domain;
pub mod run;
pub mod validate;

pub use check::run_budget_check;
pub use domain::Domain;
pub use run::{RunOptions, RunReport, Verification, check_schemas, run_domain};
pub use validate::run_validate;
