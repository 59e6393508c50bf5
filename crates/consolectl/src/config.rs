use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Interval at which topics and messages are refreshed, absent configuration.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    // Console API to use, or None if no API is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<Api>,
    // ID of the Kafka cluster to work with, or None if not selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kafka_id: Option<String>,
    // Interval at which topics and messages are refreshed.
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub poll_interval: Option<Duration>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Api {
    // URL endpoint of the console REST API.
    pub endpoint: url::Url,
    // Secret access token of the console API, if it requires one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl Config {
    /// Directory holding the configuration of all profiles.
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = dirs::config_dir().context("couldn't determine the user config directory")?;
        Ok(dir.join("consolectl"))
    }

    /// Directory of persisted user preferences, such as selected columns.
    pub fn preferences_dir() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("preferences"))
    }

    fn file_path(profile: &str) -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join(format!("{profile}.json")))
    }

    /// Load the configuration of `profile`, or a default one if it doesn't exist.
    pub fn load(profile: &str) -> anyhow::Result<Self> {
        let path = Self::file_path(profile)?;

        let config = match std::fs::read(&path) {
            Ok(contents) => serde_json::from_slice(&contents)
                .with_context(|| format!("failed to parse config at {}", path.display()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config found, using defaults");
                Config::default()
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read config at {}", path.display()))
            }
        };
        Ok(config)
    }

    /// Write the configuration of `profile`, replacing any existing one.
    pub fn write(&self, profile: &str) -> anyhow::Result<()> {
        let path = Self::file_path(profile)?;
        let dir = path.parent().context("config path has no parent")?;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;

        // Write to a temporary file first, so that a failure can't leave a partial config.
        let temp = path.with_extension("json.tmp");
        std::fs::write(&temp, serde_json::to_vec_pretty(self)?)
            .with_context(|| format!("failed to write config to {}", temp.display()))?;
        std::fs::rename(&temp, &path)
            .with_context(|| format!("failed to replace config at {}", path.display()))?;

        tracing::debug!(path = %path.display(), "wrote config");
        Ok(())
    }

    /// Interval between refreshes. A zero interval, as might be written
    /// by hand, is replaced by the default.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
            .filter(|interval| !interval.is_zero())
            .unwrap_or(DEFAULT_POLL_INTERVAL)
    }
}

#[derive(Debug, clap::Args)]
pub struct ConfigCmd {
    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Debug, clap::Subcommand)]
#[clap(rename_all = "kebab-case")]
pub enum Command {
    /// Show the configuration of the current profile.
    Show,
    /// Set the endpoint of the console API.
    SetEndpoint(SetEndpoint),
    /// Select the Kafka cluster to work with.
    SetKafka(SetKafka),
    /// Set the interval at which topics and messages are refreshed.
    SetPollInterval(SetPollInterval),
}

#[derive(Debug, clap::Args)]
pub struct SetEndpoint {
    /// URL of the console API, such as https://console.example.com/
    endpoint: url::Url,
    /// Access token to present to the console API.
    #[clap(long, env = "CONSOLECTL_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,
}

#[derive(Debug, clap::Args)]
pub struct SetKafka {
    /// ID of the Kafka cluster, as listed by the console.
    kafka_id: String,
}

#[derive(Debug, clap::Args)]
pub struct SetPollInterval {
    /// Interval between refreshes, such as `5s` or `1m`.
    #[clap(value_parser = parse_poll_interval)]
    interval: humantime::Duration,
}

/// Parse a human-readable poll interval, which must be greater than zero.
pub fn parse_poll_interval(s: &str) -> Result<humantime::Duration, String> {
    let interval: humantime::Duration = s.parse().map_err(|err| format!("{err}"))?;
    if interval.is_zero() {
        return Err("poll interval must be greater than zero".to_string());
    }
    Ok(interval)
}

/// Configuration of a profile, as it's shown to the user.
/// Secrets are not included.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShownConfig {
    profile: String,
    endpoint: Option<url::Url>,
    authenticated: bool,
    kafka_id: Option<String>,
    poll_interval: String,
}

impl crate::output::Rows for ShownConfig {
    type Columns = ();

    fn headers(_columns: Self::Columns) -> Vec<&'static str> {
        vec!["Profile", "Endpoint", "Authenticated", "Kafka Cluster", "Poll Interval"]
    }

    fn cells(self, _columns: Self::Columns) -> Vec<String> {
        vec![
            self.profile,
            self.endpoint.map(|e| e.to_string()).unwrap_or_default(),
            self.authenticated.to_string(),
            self.kafka_id.unwrap_or_default(),
            self.poll_interval,
        ]
    }
}

impl ConfigCmd {
    pub async fn run(&self, ctx: &mut crate::CliContext) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Show => {
                let config = ctx.config();
                let shown = ShownConfig {
                    profile: ctx.profile().to_string(),
                    endpoint: config.api.as_ref().map(|api| api.endpoint.clone()),
                    authenticated: config
                        .api
                        .as_ref()
                        .is_some_and(|api| api.access_token.is_some()),
                    kafka_id: config.kafka_id.clone(),
                    poll_interval: humantime::format_duration(config.poll_interval()).to_string(),
                };
                ctx.write_all(Some(shown), ())
            }
            Command::SetEndpoint(SetEndpoint {
                endpoint,
                access_token,
            }) => {
                ctx.config_mut().api = Some(Api {
                    endpoint: endpoint.clone(),
                    access_token: access_token.clone(),
                });
                tracing::info!(%endpoint, "configured console API endpoint");
                Ok(())
            }
            Command::SetKafka(SetKafka { kafka_id }) => {
                ctx.config_mut().kafka_id = Some(kafka_id.clone());
                Ok(())
            }
            Command::SetPollInterval(SetPollInterval { interval }) => {
                ctx.config_mut().poll_interval = Some(**interval);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn config_round_trips_with_human_intervals() {
        let config: Config = serde_json::from_value(serde_json::json!({
            "api": {"endpoint": "https://console.example/"},
            "kafka_id": "j7W3",
            "poll_interval": "1m 30s",
        }))
        .unwrap();

        assert_eq!(config.poll_interval(), Duration::from_secs(90));
        assert_eq!(config.api.as_ref().unwrap().access_token, None);

        insta::assert_json_snapshot!(config, @r###"
        {
          "api": {
            "endpoint": "https://console.example/"
          },
          "kafka_id": "j7W3",
          "poll_interval": "1m 30s"
        }
        "###);

        assert_eq!(Config::default().poll_interval(), DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn zero_poll_intervals_are_not_used() {
        assert!(parse_poll_interval("0s").is_err());
        assert!(parse_poll_interval("soon").is_err());
        assert_eq!(
            *parse_poll_interval("250ms").unwrap(),
            Duration::from_millis(250)
        );

        let config: Config =
            serde_json::from_value(serde_json::json!({"poll_interval": "0s"})).unwrap();
        assert_eq!(config.poll_interval(), DEFAULT_POLL_INTERVAL);
    }
}
