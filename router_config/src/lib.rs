#![forbid(unsafe_code)]

pub mod errors;

use crate::errors::RouterConfigError;
use config::{Case, Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::{env::VarError, fs, path::Path, str::FromStr};
use typed_builder::TypedBuilder;

/// Options for an active router, read from the `[router]` section of a
/// TOML file or from `ROUTER_*` environment variables.
#[derive(TypedBuilder, Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RouterOptions {
    /// Base path the routes are mounted under. It is stripped from incoming
    /// pathnames before matching and prepended to navigation targets.
    /// Defaults to `""`, the site root.
    #[builder(setter(into), default = default_root())]
    #[serde(default = "default_root")]
    pub root: String,
    /// What a navigation does when one of its listeners fails to settle.
    /// Defaults to [`ListenerErrorPolicy::Abort`].
    #[builder(default)]
    #[serde(default)]
    pub listener_errors: ListenerErrorPolicy,
}

impl Default for RouterOptions {
    fn default() -> Self {
        RouterOptions::builder().build()
    }
}

impl RouterOptions {
    /// Reads every option from the environment, falling back to the
    /// defaults for anything unset.
    pub fn try_from_env() -> Result<Self, RouterConfigError> {
        Ok(RouterOptions {
            root: env_w_default("ROUTER_ROOT", &default_root())?,
            listener_errors: env_w_default("ROUTER_LISTENER_ERRORS", "abort")?
                .parse()?,
        })
    }
}

fn default_root() -> String {
    String::new()
}

pub(crate) fn env_wo_default(
    key: &str,
) -> Result<Option<String>, RouterConfigError> {
    match std::env::var(key) {
        Ok(val) => Ok(Some(val)),
        Err(VarError::NotPresent) => Ok(None),
        Err(e) => Err(RouterConfigError::EnvVarError(format!("{key}: {e}"))),
    }
}

pub(crate) fn env_w_default(
    key: &str,
    default: &str,
) -> Result<String, RouterConfigError> {
    Ok(env_wo_default(key)?.unwrap_or_else(|| default.to_string()))
}

/// How the router treats a listener whose completion signal fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum ListenerErrorPolicy {
    /// The first failure is returned from the navigation and the barriers
    /// still outstanding in that pass are dropped.
    #[default]
    Abort,
    /// Every barrier is awaited. Failures are logged and the navigation
    /// settles successfully.
    Isolate,
}

impl FromStr for ListenerErrorPolicy {
    type Err = RouterConfigError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        policy_from_str(input)
    }
}

impl TryFrom<String> for ListenerErrorPolicy {
    type Error = RouterConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        policy_from_str(&s)
    }
}

pub(crate) fn policy_from_str(
    input: &str,
) -> Result<ListenerErrorPolicy, RouterConfigError> {
    let sanitized = input.to_lowercase();
    match sanitized.as_ref() {
        "abort" => Ok(ListenerErrorPolicy::Abort),
        "isolate" | "continue" => Ok(ListenerErrorPolicy::Isolate),
        _ => Err(RouterConfigError::ConfigError(format!(
            "{input} is not a supported listener error policy. Use 'abort' \
             or 'isolate'."
        ))),
    }
}

/// Loads [`RouterOptions`] from a TOML file, or from the environment alone
/// when no path is given.
pub fn get_configuration(
    path: Option<&str>,
) -> Result<RouterOptions, RouterConfigError> {
    match path {
        Some(path) => get_config_from_file(&path),
        None => RouterOptions::try_from_env(),
    }
}

/// Reads the `[router]` section of the TOML file at `path`.
/// Environment variables take precedence over values in the file.
pub fn get_config_from_file<P: AsRef<Path>>(
    path: &P,
) -> Result<RouterOptions, RouterConfigError> {
    let text = fs::read_to_string(path)
        .map_err(|_| RouterConfigError::ConfigNotFound)?;
    get_config_from_str(&text)
}

/// Reads the `[router]` section of a TOML document.
/// Environment variables take precedence over values in the document.
pub fn get_config_from_str(
    text: &str,
) -> Result<RouterOptions, RouterConfigError> {
    let file = Config::builder()
        .add_source(File::from_str(text, FileFormat::Toml))
        .build()?;
    let section = file
        .get_table("router")
        .map_err(|_| RouterConfigError::ConfigSectionNotFound)?;

    let mut builder = Config::builder();
    for (key, value) in section {
        builder = builder.set_default(key, value)?;
    }
    let settings = builder
        .add_source(Environment::with_prefix("ROUTER").convert_case(Case::Kebab))
        .build()?;

    settings.try_deserialize().map_err(|e| e.into())
}
