use a2ui_protocol::component::PATH;
use a2ui_protocol::pointer;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::ValidationError;

const CALL: &str = "call";
const ARGS: &str = "args";

pub const MAX_GLOBAL_DEPTH: usize = 50;
pub const MAX_FUNCTION_CALL_DEPTH: usize = 5;

/// Depth ceilings enforced by [`RecursionGuard`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecursionLimits {
    pub max_global_depth: usize,
    pub max_function_call_depth: usize,
}

impl Default for RecursionLimits {
    fn default() -> Self {
        Self {
            max_global_depth: MAX_GLOBAL_DEPTH,
            max_function_call_depth: MAX_FUNCTION_CALL_DEPTH,
        }
    }
}

/// Walks a whole message, bounding nesting depth and checking every
/// string-valued `path` against the JSON Pointer grammar on the way.
///
/// An object carrying both `call` and `args` counts as a function call;
/// only descending into its `args` raises the function-call depth.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecursionGuard {
    limits: RecursionLimits,
}

impl RecursionGuard {
    #[must_use]
    pub fn new(limits: RecursionLimits) -> Self {
        Self { limits }
    }

    #[must_use]
    pub fn limits(&self) -> RecursionLimits {
        self.limits
    }

    pub fn check(&self, message: &Value) -> Result<(), ValidationError> {
        self.traverse(message, 0, 0)
    }

    fn traverse(
        &self,
        item: &Value,
        global_depth: usize,
        function_depth: usize,
    ) -> Result<(), ValidationError> {
        if global_depth > self.limits.max_global_depth {
            return Err(ValidationError::GlobalRecursionLimitExceeded {
                limit: self.limits.max_global_depth,
            });
        }

        match item {
            Value::Array(items) => items
                .iter()
                .try_for_each(|item| self.traverse(item, global_depth + 1, function_depth)),
            Value::Object(map) => {
                if let Some(Value::String(path)) = map.get(PATH) {
                    if !pointer::is_valid(path) {
                        return Err(ValidationError::InvalidPathSyntax { path: path.clone() });
                    }
                }

                let is_call = map.contains_key(CALL) && map.contains_key(ARGS);
                if is_call && function_depth >= self.limits.max_function_call_depth {
                    return Err(ValidationError::FunctionCallDepthExceeded {
                        limit: self.limits.max_function_call_depth,
                    });
                }

                map.iter().try_for_each(|(key, value)| {
                    let function_depth = if is_call && key == ARGS {
                        function_depth + 1
                    } else {
                        function_depth
                    };
                    self.traverse(value, global_depth + 1, function_depth)
                })
            }
            _ => Ok(()),
        }
    }
}

/// Check `message` with the default ceilings.
pub fn check_recursion(message: &Value) -> Result<(), ValidationError> {
    RecursionGuard::default().check(message)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    /// `levels` nested single-element arrays around a scalar.
    fn nested_arrays(levels: usize) -> Value {
        (0..levels).fold(json!(0), |inner, _| json!([inner]))
    }

    /// `calls` function calls, each the sole argument of the previous one.
    fn nested_calls(calls: usize) -> Value {
        let innermost = json!({"call": "f", "args": {}});
        let chain = (1..calls).fold(innermost, |inner, _| {
            json!({"call": "f", "args": {"value": inner}})
        });
        json!({"functionCall": chain})
    }

    mod depth {
        use super::*;

        #[test]
        fn fifty_levels_are_accepted() {
            assert_eq!(check_recursion(&nested_arrays(50)), Ok(()));
        }

        #[test]
        fn fifty_one_levels_are_rejected() {
            assert_eq!(
                check_recursion(&nested_arrays(51)),
                Err(ValidationError::GlobalRecursionLimitExceeded { limit: 50 })
            );
        }

        #[test]
        fn objects_count_like_arrays() {
            let deep = (0..51).fold(json!("leaf"), |inner, _| json!({"k": inner}));
            assert!(matches!(
                check_recursion(&deep),
                Err(ValidationError::GlobalRecursionLimitExceeded { .. })
            ));
        }

        #[test]
        fn custom_ceiling() {
            let guard = RecursionGuard::new(RecursionLimits {
                max_global_depth: 3,
                ..RecursionLimits::default()
            });
            assert_eq!(guard.check(&nested_arrays(3)), Ok(()));
            assert!(guard.check(&nested_arrays(4)).is_err());
        }
    }

    mod function_calls {
        use super::*;

        #[test]
        fn five_nested_calls_are_accepted() {
            assert_eq!(check_recursion(&nested_calls(5)), Ok(()));
        }

        #[test]
        fn six_nested_calls_are_rejected() {
            insta::assert_snapshot!(
                check_recursion(&nested_calls(6)).unwrap_err().to_string(),
                @"Recursion limit exceeded: functionCall depth > 5"
            );
        }

        #[test]
        fn only_args_raise_function_depth() {
            let mut value = json!({"call": "f", "args": {}});
            for _ in 0..8 {
                value = json!({"call": "f", "args": {}, "meta": value});
            }
            assert_eq!(check_recursion(&value), Ok(()));
        }

        #[test]
        fn call_without_args_is_not_a_function() {
            let value = (0..10).fold(json!({"call": "f"}), |inner, _| {
                json!({"call": "f", "argsLike": inner})
            });
            assert_eq!(check_recursion(&value), Ok(()));
        }
    }

    mod paths {
        use super::*;

        #[test]
        fn valid_paths() {
            for path in ["", "/", "/a/b", "/a~0b/c~1d"] {
                assert_eq!(check_recursion(&json!({"path": path})), Ok(()), "{path}");
            }
        }

        #[test]
        fn invalid_paths() {
            for path in ["invalid//path", "/invalid/escape/~2", "/bare~", "relative"] {
                assert_eq!(
                    check_recursion(&json!({"nested": [{"path": path}]})),
                    Err(ValidationError::InvalidPathSyntax {
                        path: path.to_string()
                    }),
                    "{path}"
                );
            }
        }

        #[test]
        fn non_string_path_is_ignored() {
            assert_eq!(check_recursion(&json!({"path": 7})), Ok(()));
        }
    }
}
