//! Command-Line Interface (CLI) argument parsing.
//!
//! Arguments describe the finished build and the notification to send. The
//! few that override configuration are merged into the `figment` stack by
//! implementing `Provider`.

use crate::core::{BuildContext, BuildStatus, NotificationRequest};
use crate::template::DEFAULT_CONTENT_KEY;
use clap::Parser;
use figment::{
    value::{Dict, Map, Tag, Value},
    Error, Metadata, Profile, Provider,
};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Posts a templated build notification to a team messaging room.
#[derive(Parser, Debug, Default, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only validate the configured rooms, then exit.
    #[arg(long)]
    pub check: bool,

    /// Name of the configured room to notify.
    #[arg(short, long, value_name = "NAME", default_value = "")]
    pub room: String,

    /// Message template. `${DEFAULT_CONTENT}` expands to the standard build line.
    #[arg(short, long, value_name = "TEXT", default_value = DEFAULT_CONTENT_KEY)]
    pub template: String,

    /// Skip the notification entirely.
    #[arg(long)]
    pub disabled: bool,

    /// Log the message instead of sending it.
    #[arg(long)]
    pub dry_run: bool,

    /// Outcome of the build.
    #[arg(long, value_name = "STATUS", default_value = "SUCCESS")]
    pub status: String,

    #[arg(long, value_name = "NAME", default_value = "")]
    pub job_name: String,

    #[arg(long, value_name = "N", default_value_t = 0)]
    pub build_number: u64,

    #[arg(long, value_name = "URL", default_value = "")]
    pub job_url: String,

    #[arg(long, value_name = "URL")]
    pub build_url: Option<String>,

    /// Extra template variable, may be repeated.
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// Override the configured log level.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Override the messaging API base URL.
    #[arg(long, value_name = "URL")]
    pub api_base_url: Option<String>,
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.trim().is_empty())
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", raw))
}

impl Cli {
    /// The notification described by the arguments.
    pub fn request(&self) -> NotificationRequest {
        NotificationRequest::new(self.room.clone(), self.template.clone()).disabled(self.disabled)
    }

    /// The build context described by the arguments.
    ///
    /// An unrecognised status is reported as an error so the caller can log it.
    pub fn build_context(&self) -> anyhow::Result<BuildContext> {
        Ok(BuildContext {
            status: self.status.parse::<BuildStatus>()?,
            job_name: self.job_name.clone(),
            build_number: self.build_number,
            job_url: self.job_url.clone(),
            build_url: self.build_url.clone(),
            variables: self.vars.iter().cloned().collect::<BTreeMap<_, _>>(),
        })
    }
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        if let Some(url) = &self.api_base_url {
            let mut publisher = Dict::new();
            publisher.insert("api_base_url".into(), Value::from(url.clone()));
            dict.insert("publisher".into(), Value::Dict(Tag::Default, publisher));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
