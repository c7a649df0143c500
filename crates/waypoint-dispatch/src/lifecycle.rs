//! Fixed lifecycle of a single handler instance.
//!
//! ```text
//! controller: set_params → pre_dispatch → call_action → post_dispatch
//! action:     set_params → pre_execute  → execute     → post_execute
//! ```
//!
//! The first failing step aborts the rest; its error is tagged with the
//! [`Phase`] it came from. Forwards are not handled here.

use tracing::trace;

use crate::error::{DispatchError, Phase, Result};
use crate::handler::{Action, Controller};
use crate::params::Params;

/// Runs a controller through its lifecycle.
pub fn run_controller(
    controller: &mut dyn Controller,
    unit: &str,
    action: &str,
    params: Params,
) -> Result<()> {
    controller.set_params(params);

    step(unit, Phase::PreDispatch, || controller.pre_dispatch())?;
    step(unit, Phase::Action, || controller.call_action(action))?;
    step(unit, Phase::PostDispatch, || controller.post_dispatch())
}

/// Runs a bare action through its lifecycle.
pub fn run_action(action: &mut dyn Action, unit: &str, params: Params) -> Result<()> {
    action.set_params(params);

    step(unit, Phase::PreExecute, || action.pre_execute())?;
    step(unit, Phase::Execute, || action.execute())?;
    step(unit, Phase::PostExecute, || action.post_execute())
}

fn step<F>(unit: &str, phase: Phase, f: F) -> Result<()>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    trace!(unit, %phase, "lifecycle step");
    f().map_err(|source| DispatchError::handler(unit, phase, source))
}
