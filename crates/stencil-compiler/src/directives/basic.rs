//! The built-in directive catalog.

use serde_json::Value as JsonValue;

use super::{
    InterpretedDirective, JavaSrcDirective, JsSrcDirective, PrintDirective, TargetExpr,
};
use crate::error::{CompileError, Result};
use crate::escape;

/// Prefix of runtime helpers in generated JavaScript.
pub(crate) const JS_RUNTIME: &str = "stencil";

/// Class holding runtime helpers for generated Java.
pub(crate) const JAVA_UTILS: &str = "StencilUtils";

fn js_helper(name: &str) -> String {
    format!("{}.$${}", JS_RUNTIME, name)
}

fn java_helper(name: &str) -> String {
    format!("{}.$${}", JAVA_UTILS, name)
}

/// Declares a zero-argument directive whose realizations all call the same
/// escaping function or runtime helper.
macro_rules! simple_directive {
    ($ty:ident, $name:literal, $helper:literal, $cancels:expr, $func:path) => {
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $ty;

        impl PrintDirective for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            fn valid_args_sizes(&self) -> &'static [usize] {
                &[0]
            }

            fn cancels_autoescape(&self) -> bool {
                $cancels
            }

            fn interpreted(&self) -> Option<&dyn InterpretedDirective> {
                Some(self)
            }

            fn js_src(&self) -> Option<&dyn JsSrcDirective> {
                Some(self)
            }

            fn java_src(&self) -> Option<&dyn JavaSrcDirective> {
                Some(self)
            }
        }

        impl InterpretedDirective for $ty {
            fn apply_for_interpreter(&self, value: &str, _args: &[JsonValue]) -> Result<String> {
                Ok($func(value))
            }
        }

        impl JsSrcDirective for $ty {
            fn apply_for_js_src(&self, value: &TargetExpr, _args: &[TargetExpr]) -> TargetExpr {
                TargetExpr::call(&js_helper($helper), &[value])
            }
        }

        impl JavaSrcDirective for $ty {
            fn apply_for_java_src(&self, value: &TargetExpr, _args: &[TargetExpr]) -> TargetExpr {
                TargetExpr::call(&java_helper($helper), &[value])
            }
        }
    };
}

simple_directive!(EscapeUriDirective, "|escapeUri", "escapeUri", true, escape::escape_uri);
simple_directive!(EscapeHtmlDirective, "|escapeHtml", "escapeHtml", true, escape::escape_html);
simple_directive!(
    EscapeJsStringDirective,
    "|escapeJsString",
    "escapeJsString",
    true,
    escape::escape_js_string
);
simple_directive!(
    ChangeNewlineToBrDirective,
    "|changeNewlineToBr",
    "changeNewlineToBr",
    false,
    escape::change_newline_to_br
);

/// `|noAutoescape`: leaves the value untouched and switches off the default
/// escape for its print site.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAutoescapeDirective;

impl PrintDirective for NoAutoescapeDirective {
    fn name(&self) -> &'static str {
        "|noAutoescape"
    }

    fn valid_args_sizes(&self) -> &'static [usize] {
        &[0]
    }

    fn cancels_autoescape(&self) -> bool {
        true
    }

    fn interpreted(&self) -> Option<&dyn InterpretedDirective> {
        Some(self)
    }

    fn js_src(&self) -> Option<&dyn JsSrcDirective> {
        Some(self)
    }

    fn java_src(&self) -> Option<&dyn JavaSrcDirective> {
        Some(self)
    }
}

impl InterpretedDirective for NoAutoescapeDirective {
    fn apply_for_interpreter(&self, value: &str, _args: &[JsonValue]) -> Result<String> {
        Ok(value.to_string())
    }
}

impl JsSrcDirective for NoAutoescapeDirective {
    fn apply_for_js_src(&self, value: &TargetExpr, _args: &[TargetExpr]) -> TargetExpr {
        value.clone()
    }
}

impl JavaSrcDirective for NoAutoescapeDirective {
    fn apply_for_java_src(&self, value: &TargetExpr, _args: &[TargetExpr]) -> TargetExpr {
        value.clone()
    }
}

/// `|truncate:maxLen[,addEllipsis]`. Not available to the Java backend.
///
/// `maxLen` must be a non-negative number or a numeric string. When the value
/// was HTML-escaped first, the cut never lands inside a character reference;
/// the result may then be shorter than `maxLen`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TruncateDirective;

impl PrintDirective for TruncateDirective {
    fn name(&self) -> &'static str {
        "|truncate"
    }

    fn valid_args_sizes(&self) -> &'static [usize] {
        &[1, 2]
    }

    fn cancels_autoescape(&self) -> bool {
        false
    }

    fn interpreted(&self) -> Option<&dyn InterpretedDirective> {
        Some(self)
    }

    fn js_src(&self) -> Option<&dyn JsSrcDirective> {
        Some(self)
    }
}

impl InterpretedDirective for TruncateDirective {
    fn apply_for_interpreter(&self, value: &str, args: &[JsonValue]) -> Result<String> {
        let max_len = max_len_arg(args.first())?;
        let add_ellipsis = args.get(1).map(is_truthy).unwrap_or(true);
        Ok(escape::truncate(value, max_len, add_ellipsis))
    }
}

impl JsSrcDirective for TruncateDirective {
    fn apply_for_js_src(&self, value: &TargetExpr, args: &[TargetExpr]) -> TargetExpr {
        let add_ellipsis = args
            .get(1)
            .cloned()
            .unwrap_or_else(|| TargetExpr::new("true", super::MAX_PRECEDENCE));
        let mut call_args = vec![value];
        call_args.extend(args.first());
        call_args.push(&add_ellipsis);
        TargetExpr::call(&js_helper("truncate"), &call_args)
    }
}

fn max_len_arg(arg: Option<&JsonValue>) -> Result<usize> {
    let invalid = |message: String| CompileError::InvalidDirectiveArgument {
        name: "|truncate".to_string(),
        message,
    };
    let n = match arg {
        Some(JsonValue::Number(n)) => n.as_f64(),
        Some(JsonValue::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(n) if n.is_finite() && n >= 0.0 => Ok(n as usize),
        _ => Err(invalid(format!(
            "max length must be a non-negative number, found {}",
            arg.map_or_else(|| "nothing".to_string(), JsonValue::to_string)
        ))),
    }
}

fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}
