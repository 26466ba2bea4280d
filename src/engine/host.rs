//! The lens evaluation host.
//!
//! The only code permitted to invoke a lens's `evaluate`. It is the single
//! translation point between "exception-style" plug-in code and the
//! engine's error-as-value contract: inputs are safe-defaulted, panics are
//! contained, and a `{ok: false}` result becomes one joined error string.
//! The host never materializes drafts - normalization happens one layer up,
//! which keeps this contract small and testable in isolation.

use std::panic::{AssertUnwindSafe, catch_unwind};

use thiserror::Error;

use crate::core::ParamMap;
use crate::lens::{EvalArgs, EvalContext, Lens, LensInput, RawLensOutput};

/// What a contained evaluation produced.
#[derive(Debug, Default)]
pub struct DraftSet {
    pub outputs: Vec<RawLensOutput>,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct EvaluationError(pub String);

/// Invoke one lens under the uniform contract.
pub fn evaluate_lens(
    lens: &dyn Lens,
    params: Option<&ParamMap>,
    input: Option<&LensInput>,
    context: EvalContext<'_>,
) -> Result<DraftSet, EvaluationError> {
    let empty_params = ParamMap::new();
    let empty_input = LensInput::default();
    let params = params.unwrap_or(&empty_params);
    let input = input.unwrap_or(&empty_input);

    let result = catch_unwind(AssertUnwindSafe(|| {
        lens.evaluate(EvalArgs {
            params,
            input,
            context,
        })
    }))
    .map_err(|payload| EvaluationError(panic_message(payload.as_ref())))?;

    if result.ok {
        return Ok(DraftSet {
            outputs: result.drafts,
            warnings: result.warnings,
        });
    }

    if result.errors.is_empty() {
        // A not-ok result with no stated errors degrades to a silent
        // empty-drafts result.
        return Ok(DraftSet {
            outputs: Vec::new(),
            warnings: result.warnings,
        });
    }

    Err(EvaluationError(result.errors.join("; ")))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("lens evaluation panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("lens evaluation panicked: {s}")
    } else {
        "lens evaluation panicked".to_string()
    }
}
