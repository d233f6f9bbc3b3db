// Library root
// -----------
// The binary (`main.rs`) wires these modules together; everything that talks
// to the remote service goes through the traits in `api` so the run can be
// driven against an in-memory double in tests.
//
// Module responsibilities:
// - `api`: training/prediction capability traits and their HTTP clients.
// - `config`, `cli`: credentials, layered settings and command-line flags.
// - `project`, `upload`, `training`, `prediction`: the stages of a run.
// - `workflow`: runs the stages in order.
// - `ui`: terminal progress, prompt and report.
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod prediction;
pub mod progress;
pub mod project;
pub mod regions;
pub mod training;
pub mod ui;
pub mod upload;
pub mod workflow;

pub use error::{Error, Result};
pub use workflow::{RunReport, Workflow};
