//! Configuration layering: command line > environment > JSON file > defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use economist_audio_core::{Credentials, Endpoints, SessionOptions};
use serde::Deserialize;

use crate::cli::{Cli, Command, LogLevel};

const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Info;

const USERNAME_ENV: &[&str] = &["ECONOMIST_USERNAME", "USERNAME"];
const PASSWORD_ENV: &[&str] = &["ECONOMIST_PASSWORD", "PASSWORD"];
const PROXY_URL_ENV: &[&str] = &["PROXY_URL", "HTTP_PROXY"];
const USER_AGENT_ENV: &[&str] = &["USER_AGENT"];
const LOG_LEVEL_ENV: &[&str] = &["LOG_LEVEL"];

/// JSON config file contents. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    pub(crate) username: Option<String>,
    pub(crate) password: Option<String>,
    pub(crate) proxy_url: Option<String>,
    pub(crate) user_agent: Option<String>,
    pub(crate) log_level: Option<String>,
    pub(crate) timeout_secs: Option<u64>,
    /// Content site origin override.
    pub(crate) site_url: Option<String>,
    /// SSO origin override.
    pub(crate) auth_url: Option<String>,
}

impl FileConfig {
    fn validate(&self) -> Result<()> {
        if let Some(timeout) = self.timeout_secs
            && !(1..=3600).contains(&timeout)
        {
            bail!("Invalid config value for `timeout_secs`: {timeout}. Expected range: 1..=3600");
        }
        if let Some(level) = &self.log_level {
            parse_log_level(level)
                .with_context(|| format!("Invalid config value for `log_level`: '{level}'"))?;
        }
        Ok(())
    }
}

/// Loads and validates a JSON config file.
pub(crate) fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    let config: FileConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file '{}'", path.display()))?;
    Ok(config)
}

/// Settings after layering every source.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedConfig {
    pub(crate) username: Option<String>,
    pub(crate) password: Option<String>,
    pub(crate) proxy_url: Option<String>,
    pub(crate) user_agent: Option<String>,
    pub(crate) log_level: LogLevel,
    pub(crate) timeout: Option<Duration>,
    pub(crate) site_url: Option<String>,
    pub(crate) auth_url: Option<String>,
}

impl ResolvedConfig {
    /// Credentials, or the error reported when either half is missing.
    pub(crate) fn credentials(&self) -> Result<Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => {
                Ok(Credentials::new(username.clone(), password.clone()))
            }
            _ => bail!("No username and/or password given"),
        }
    }

    /// Options for the library session.
    pub(crate) fn session_options(&self) -> Result<SessionOptions> {
        let defaults = Endpoints::default();
        let site = self
            .site_url
            .as_deref()
            .unwrap_or_else(|| defaults.site.as_str());
        let auth = self
            .auth_url
            .as_deref()
            .unwrap_or_else(|| defaults.auth.as_str());
        let endpoints = Endpoints::new(site, auth).context("Invalid site or auth URL")?;

        Ok(SessionOptions {
            user_agent: self.user_agent.clone(),
            proxy_url: self.proxy_url.clone(),
            endpoints,
            timeout: self.timeout,
            cookie_jar: None,
        })
    }
}

/// Resolves configuration from the process environment and the optional
/// config file named on the command line.
pub(crate) fn resolve_config(cli: &Cli) -> Result<ResolvedConfig> {
    let file = match &cli.config {
        Some(path) => load_file_config(path)?,
        None => FileConfig::default(),
    };
    resolve_with(cli, &file, |name| std::env::var(name).ok())
}

/// Layers `cli`, the environment seen through `env`, and `file`.
pub(crate) fn resolve_with<F>(cli: &Cli, file: &FileConfig, env: F) -> Result<ResolvedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |names: &[&str]| lookup_env(&env, names);

    let log_level = match (&cli.log_level, lookup(LOG_LEVEL_ENV), &file.log_level) {
        (Some(level), _, _) => *level,
        (None, Some(level), _) => parse_log_level(&level)
            .with_context(|| format!("Invalid LOG_LEVEL value: '{level}'"))?,
        (None, None, Some(level)) => parse_log_level(level)?,
        (None, None, None) => DEFAULT_LOG_LEVEL,
    };

    Ok(ResolvedConfig {
        username: layer(cli.username.clone(), lookup(USERNAME_ENV), file.username.as_ref()),
        password: layer(cli.password.clone(), lookup(PASSWORD_ENV), file.password.as_ref()),
        proxy_url: layer(cli.proxy_url.clone(), lookup(PROXY_URL_ENV), file.proxy_url.as_ref()),
        user_agent: layer(cli.user_agent.clone(), lookup(USER_AGENT_ENV), file.user_agent.as_ref()),
        log_level,
        timeout: cli.timeout.or(file.timeout_secs).map(Duration::from_secs),
        site_url: file.site_url.clone(),
        auth_url: file.auth_url.clone(),
    })
}

/// Log level for the subscriber, given the command being run.
///
/// `--quiet` and stdout downloads only log errors, so nothing but the
/// archive reaches stdout and the terminal stays quiet.
pub(crate) fn effective_log_level(cli: &Cli, command: &Command, configured: LogLevel) -> LogLevel {
    let stdout_download = matches!(command, Command::Download(args) if args.writes_to_stdout());
    if cli.quiet || stdout_download {
        LogLevel::Error
    } else {
        configured
    }
}

fn parse_log_level(value: &str) -> Result<LogLevel> {
    LogLevel::from_str(value.trim(), true).map_err(|reason| anyhow::anyhow!(reason))
}

fn layer(cli: Option<String>, env: Option<String>, file: Option<&String>) -> Option<String> {
    cli.or(env).or_else(|| file.cloned())
}

/// First non-empty value among `names`, each tried upper-case then lower-case.
fn lookup_env<F>(env: &F, names: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    names
        .iter()
        .flat_map(|name| [(*name).to_string(), name.to_ascii_lowercase()])
        .find_map(|name| env(&name).filter(|value| !value.trim().is_empty()))
}
