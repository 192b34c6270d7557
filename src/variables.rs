//! Environment overrides for workflow parameters
//!
//! A variable `FLOW_VAR_<NAME>` replaces the value of `with.<NAME>` when the
//! workflow already declares `<NAME>`. Undeclared names are ignored.
//!
//! A value starting with `{` or `[` is read as a JSON (or YAML flow)
//! document, so structured parameters can be overridden too. Anything else,
//! and any structured value that fails to parse, is stored as a string.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::schema::WorkflowDef;

/// Prefix read by `apply_env_overrides`
pub const DEFAULT_ENV_PREFIX: &str = "FLOW_VAR_";

/// Override declared parameters from `(name, value)` pairs
///
/// Returns the number of parameters replaced.
pub fn apply_overrides<I, K, V>(workflow: &mut WorkflowDef, prefix: &str, vars: I) -> usize
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let Some(with) = workflow.with.as_mut() else {
        return 0;
    };

    let mut applied = 0;
    for (key, value) in vars {
        let Some(name) = key.as_ref().strip_prefix(prefix) else {
            continue;
        };
        match with.get_mut(name) {
            Some(slot) => {
                info!(workflow = %workflow.id, parameter = name, "Loading environment variable");
                *slot = override_value(name, value.into());
                applied += 1;
            }
            None => debug!(parameter = name, "ignoring undeclared parameter"),
        }
    }
    applied
}

fn override_value(name: &str, raw: String) -> Value {
    let trimmed = raw.trim_start();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return Value::String(raw);
    }
    match serde_yaml::from_str::<Value>(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(parameter = name, error = %e, "keeping unparsable structured value as a string");
            Value::String(raw)
        }
    }
}

/// Override declared parameters from the process environment
pub fn apply_env_overrides(workflow: &mut WorkflowDef, prefix: &str) -> usize {
    apply_overrides(workflow, prefix, std::env::vars())
}
