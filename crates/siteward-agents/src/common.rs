// Argument helpers shared by the builtin agents
//
// Schema validation has already checked presence and JSON types by the time
// a handler runs; these helpers cover the remaining conversions (negative
// integers, list caps) with uniform in-band messages.

use siteward_core::ToolArguments;

/// Hard cap on list sizes regardless of what the caller asks for
pub(crate) const MAX_LIST_LIMIT: usize = 100;

/// Extract an id-like parameter as `u64`.
///
/// The schema admits any JSON integer, so a negative value reaches the
/// handler; it is refused here in-band.
pub(crate) fn require_u64(args: &ToolArguments, name: &str) -> Result<u64, String> {
    args.u64(name)
        .ok_or_else(|| format!("Parameter '{name}' must be a positive integer"))
}

/// Extract the `limit` parameter, clamped to `1..=MAX_LIST_LIMIT`.
///
/// The schema default has already been merged in; `fallback` only covers
/// schemas without one.
pub(crate) fn limit_arg(args: &ToolArguments, fallback: u64) -> usize {
    args.u64("limit").unwrap_or(fallback).clamp(1, MAX_LIST_LIMIT as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use siteward_core::{ParamKind, ParamSpec, ToolSchema};

    fn schema() -> ToolSchema {
        ToolSchema::new("probe", "Probe")
            .param(ParamSpec::optional("post_id", ParamKind::Integer, "Id"))
            .param(
                ParamSpec::optional("limit", ParamKind::Integer, "Limit").default_value(json!(20)),
            )
    }

    #[test]
    fn test_require_u64_rejects_negative() {
        let args = schema().check_args(&json!({ "post_id": -3 })).unwrap();
        let err = require_u64(&args, "post_id").unwrap_err();
        assert_eq!(err, "Parameter 'post_id' must be a positive integer");

        let args = schema().check_args(&json!({ "post_id": 3 })).unwrap();
        assert_eq!(require_u64(&args, "post_id").unwrap(), 3);
    }

    #[test]
    fn test_limit_arg_clamps() {
        let args = schema().check_args(&json!({})).unwrap();
        assert_eq!(limit_arg(&args, 20), 20);

        let args = schema().check_args(&json!({ "limit": 0 })).unwrap();
        assert_eq!(limit_arg(&args, 20), 1);

        let args = schema().check_args(&json!({ "limit": 5000 })).unwrap();
        assert_eq!(limit_arg(&args, 20), 100);
    }
}
