//! Placeholder expansion for notification templates.
//!
//! Templates contain `${NAME}` placeholders that are resolved against an
//! ordered list of token providers. Expansion is a single left-to-right pass:
//! substituted values are never rescanned, so a value that itself looks like a
//! placeholder is emitted as-is.

use crate::core::{BuildContext, TokenProvider};
use regex::{Captures, Regex};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Reserved placeholder replaced by [`DEFAULT_CONTENT_VALUE`] before resolution.
pub const DEFAULT_CONTENT_KEY: &str = "${DEFAULT_CONTENT}";

/// The message used when a job asks for the default content.
pub const DEFAULT_CONTENT_VALUE: &str = "${BUILD_STATUS}  ${JOB_NAME}:${BUILD_NUMBER}  ${JOB_URL}";

static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();

fn placeholder() -> &'static Regex {
    PLACEHOLDER.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap())
}

/// Expands templates against token providers.
pub struct TemplateExpander;

impl TemplateExpander {
    /// Expands `template` for `context`.
    ///
    /// Unresolved placeholders are kept verbatim. A provider that errors or
    /// panics is logged and the next provider is tried.
    pub fn expand(template: &str, context: &BuildContext, providers: &[Arc<dyn TokenProvider>]) -> String {
        let template = Self::apply_default_content(template);

        placeholder()
            .replace_all(&template, |caps: &Captures| {
                let token = &caps[1];
                match Self::resolve(token, context, providers) {
                    Some(value) => value,
                    None => {
                        debug!(token, "No provider resolved placeholder; leaving it unexpanded");
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }

    /// Substitutes the reserved default-content marker. Applied once, not recursively.
    pub fn apply_default_content(template: &str) -> String {
        if template.contains(DEFAULT_CONTENT_KEY) {
            template.replace(DEFAULT_CONTENT_KEY, DEFAULT_CONTENT_VALUE)
        } else {
            template.to_string()
        }
    }

    fn resolve(token: &str, context: &BuildContext, providers: &[Arc<dyn TokenProvider>]) -> Option<String> {
        for provider in providers {
            let resolved = panic::catch_unwind(AssertUnwindSafe(|| provider.resolve(token, context)));
            match resolved {
                Ok(Ok(Some(value))) => return Some(value),
                Ok(Ok(None)) => continue,
                Ok(Err(e)) => {
                    warn!(provider = provider.name(), error = %e, "Token provider failed");
                }
                Err(payload) => {
                    warn!(
                        provider = provider.name(),
                        token,
                        panic = %panic_message(payload.as_ref()),
                        "Token provider panicked"
                    );
                }
            }
        }
        None
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
