//! Built-in token providers and provider discovery.
//!
//! Providers are assembled once into an ordered list. During expansion the
//! first provider that recognises a placeholder wins.

use crate::config::Config;
use crate::core::{BuildContext, TokenProvider};
use figment::providers::{Format, Toml};
use figment::Figment;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// A provider recognised a token but could not produce its value.
#[derive(Error, Debug, Clone)]
#[error("failed to resolve token {token}: {reason}")]
pub struct TokenError {
    pub token: String,
    pub reason: String,
}

impl TokenError {
    pub fn new(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            reason: reason.into(),
        }
    }
}

/// A token provider could not be loaded.
#[derive(Error, Debug)]
pub enum ProviderDiscoveryError {
    #[error("failed to read token file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse token file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: figment::Error,
    },
}

/// Resolves the standard build placeholders from the context fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuildTokens;

impl TokenProvider for BuildTokens {
    fn name(&self) -> &str {
        "build"
    }

    fn resolve(&self, token: &str, context: &BuildContext) -> Result<Option<String>, TokenError> {
        let value = match token {
            "BUILD_STATUS" => context.status.to_string(),
            "JOB_NAME" => context.job_name.clone(),
            "BUILD_NUMBER" => context.build_number.to_string(),
            "JOB_URL" => context.job_url.clone(),
            "BUILD_URL" => match &context.build_url {
                Some(url) => url.clone(),
                None => return Err(TokenError::new(token, "build has no URL")),
            },
            _ => return Ok(None),
        };
        Ok(Some(value))
    }
}

/// Resolves placeholders from the build's free-form variables.
#[derive(Debug, Default, Clone, Copy)]
pub struct VariableTokens;

impl TokenProvider for VariableTokens {
    fn name(&self) -> &str {
        "variables"
    }

    fn resolve(&self, token: &str, context: &BuildContext) -> Result<Option<String>, TokenError> {
        Ok(context.variables.get(token).cloned())
    }
}

/// A fixed table of token values.
#[derive(Debug, Clone)]
pub struct StaticTokens {
    label: String,
    values: BTreeMap<String, String>,
}

impl StaticTokens {
    pub fn new(label: impl Into<String>, values: BTreeMap<String, String>) -> Self {
        Self {
            label: label.into(),
            values,
        }
    }

    /// Loads a TOML file of `NAME = "value"` pairs.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ProviderDiscoveryError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ProviderDiscoveryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let values: BTreeMap<String, String> =
            Figment::from(Toml::string(&content))
                .extract()
                .map_err(|source| ProviderDiscoveryError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;
        Ok(Self::new(path.display().to_string(), values))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl TokenProvider for StaticTokens {
    fn name(&self) -> &str {
        &self.label
    }

    fn resolve(&self, token: &str, _context: &BuildContext) -> Result<Option<String>, TokenError> {
        Ok(self.values.get(token).cloned())
    }
}

/// Assembles the ordered provider list for a configuration.
///
/// Token files that fail to load are logged and skipped.
pub fn discover_providers(config: &Config) -> Vec<Arc<dyn TokenProvider>> {
    let mut providers: Vec<Arc<dyn TokenProvider>> = vec![Arc::new(BuildTokens), Arc::new(VariableTokens)];

    if !config.tokens.is_empty() {
        providers.push(Arc::new(StaticTokens::new("config", config.tokens.clone())));
    }

    for path in &config.token_files {
        match StaticTokens::from_file(path) {
            Ok(tokens) => {
                debug!(path = %path.display(), count = tokens.len(), "Loaded token file");
                providers.push(Arc::new(tokens));
            }
            Err(e) => {
                warn!(error = %e, "Skipping token provider that failed to load");
            }
        }
    }

    providers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BuildStatus;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn context() -> BuildContext {
        BuildContext {
            status: BuildStatus::Failure,
            job_name: "api".to_string(),
            build_number: 7,
            job_url: "http://ci/api".to_string(),
            build_url: None,
            variables: BTreeMap::from([("BRANCH".to_string(), "main".to_string())]),
        }
    }

    #[test]
    fn test_build_tokens_resolve_context_fields() {
        let ctx = context();
        assert_eq!(BuildTokens.resolve("BUILD_STATUS", &ctx).unwrap().as_deref(), Some("FAILURE"));
        assert_eq!(BuildTokens.resolve("BUILD_NUMBER", &ctx).unwrap().as_deref(), Some("7"));
        assert_eq!(BuildTokens.resolve("BRANCH", &ctx).unwrap(), None);
        assert!(BuildTokens.resolve("BUILD_URL", &ctx).is_err());
    }

    #[test]
    fn test_variable_tokens() {
        let ctx = context();
        assert_eq!(VariableTokens.resolve("BRANCH", &ctx).unwrap().as_deref(), Some("main"));
        assert_eq!(VariableTokens.resolve("JOB_NAME", &ctx).unwrap(), None);
    }

    #[test]
    fn test_discovery_skips_broken_token_files() {
        let mut good = NamedTempFile::new().unwrap();
        writeln!(good, "TEAM = \"platform\"").unwrap();

        let config = Config {
            token_files: vec![PathBuf::from("/nonexistent/tokens.toml"), good.path().to_path_buf()],
            ..Default::default()
        };

        let providers = discover_providers(&config);
        assert_eq!(providers.len(), 3);
        assert_eq!(
            providers[2].resolve("TEAM", &context()).unwrap().as_deref(),
            Some("platform")
        );
    }

    #[test]
    fn test_static_tokens_rejects_malformed_file() {
        let mut bad = NamedTempFile::new().unwrap();
        writeln!(bad, "this is = not toml =").unwrap();
        let err = StaticTokens::from_file(bad.path()).unwrap_err();
        assert!(matches!(err, ProviderDiscoveryError::Parse { .. }));
    }
}
