//! Workflow-specific helpers.
//!
//! Workflows are not executed; the only workflow query that descends into a
//! step is `commandline(<step>)`, which is served by [`step`].

pub mod step;

pub use step::{PreparedStep, prepare_step, step_args, step_path};
