use anyhow::Context;
use clap::Parser;

pub mod browser;
mod config;
mod messages;
mod output;
mod topics;

use output::{Output, OutputType};

/// A command-line tool for browsing the topics and messages of Kafka clusters
/// through the console API.
#[derive(Debug, Parser)]
#[clap(author, about, version)]
pub struct Cli {
    /// Configuration profile to use.
    ///
    /// Profiles are distinct configurations of the `consolectl` tool, and are
    /// completely optional. Use multiple profiles to work with multiple console
    /// deployments. The "local" profile defaults to a console API at
    /// http://localhost:8080/.
    #[clap(long, default_value = "default", env = "CONSOLECTL_PROFILE")]
    profile: String,

    /// URL of the console API, overriding the configured endpoint.
    #[clap(long, global = true, env = "CONSOLECTL_ENDPOINT")]
    endpoint: Option<url::Url>,

    /// ID of the Kafka cluster to use, overriding the configured cluster.
    #[clap(long, global = true, env = "CONSOLECTL_KAFKA")]
    kafka: Option<String>,

    #[clap(subcommand)]
    cmd: Command,

    #[clap(flatten)]
    output: Output,
}

#[derive(Debug, clap::Subcommand)]
#[clap(rename_all = "kebab-case")]
pub enum Command {
    /// Work with the topics of a Kafka cluster.
    Topics(topics::Topics),
    /// List and interactively browse the messages of a topic.
    ///
    /// Messages may be listed from an offset, a timestamp, or a number of
    /// seconds since the Unix epoch, or else the latest messages are listed.
    /// The browser periodically refreshes its listing until it's paused.
    Messages(messages::Messages),
    /// View and edit the configuration of the current profile.
    Config(config::ConfigCmd),
}

#[derive(Debug)]
pub struct CliContext {
    profile: String,
    config: config::Config,
    output: output::Output,
    endpoint: Option<url::Url>,
    kafka: Option<String>,
    client: Option<console_client::Client>,
}

impl CliContext {
    /// Returns a client of the console API, creating a new one if necessary.
    /// This function returns an error if no endpoint is configured.
    pub fn client(&mut self) -> anyhow::Result<console_client::Client> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }

        let api = self.config.api.as_ref();
        let endpoint = match (&self.endpoint, api) {
            (Some(endpoint), _) => endpoint.clone(),
            (None, Some(api)) => api.endpoint.clone(),
            (None, None) if self.profile == "local" => console_client::LOCAL_API_URL.clone(),
            (None, None) => anyhow::bail!(
                "no console API endpoint is configured: run `consolectl config set-endpoint <url>` or pass --endpoint"
            ),
        };
        tracing::debug!(%endpoint, "using console API");

        let client = console_client::Client::new(&endpoint, console_client::DEFAULT_USER_AGENT)
            .with_access_token(api.and_then(|api| api.access_token.clone()));
        self.client = Some(client.clone());
        Ok(client)
    }

    /// Returns the ID of the Kafka cluster to work with.
    pub fn kafka_id(&self) -> anyhow::Result<String> {
        self.kafka
            .clone()
            .or_else(|| self.config.kafka_id.clone())
            .context("no Kafka cluster is selected: run `consolectl config set-kafka <id>` or pass --kafka")
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn config_mut(&mut self) -> &mut config::Config {
        &mut self.config
    }

    pub fn config(&self) -> &config::Config {
        &self.config
    }

    pub fn write_all<I, T>(&mut self, items: I, columns: T::Columns) -> anyhow::Result<()>
    where
        T: output::Rows,
        I: IntoIterator<Item = T>,
    {
        let output_type = self.get_output_type();
        output::write(&mut std::io::stdout().lock(), output_type, columns, items)
    }

    pub fn get_output_type(&mut self) -> OutputType {
        use crossterm::tty::IsTty;

        if let Some(ty) = self.output.output {
            ty
        } else if std::io::stdout().is_tty() {
            OutputType::Table
        } else {
            OutputType::Yaml
        }
    }
}

impl Cli {
    pub async fn run(&self) -> anyhow::Result<()> {
        let config = config::Config::load(&self.profile)?;
        let mut context = CliContext {
            profile: self.profile.clone(),
            config,
            output: self.output.clone(),
            endpoint: self.endpoint.clone(),
            kafka: self.kafka.clone(),
            client: None,
        };

        match &self.cmd {
            Command::Topics(topics) => topics.run(&mut context).await,
            Command::Messages(messages) => messages.run(&mut context).await,
            Command::Config(config) => config.run(&mut context).await,
        }?;

        context.config().write(&self.profile)?;

        Ok(())
    }
}

// new_table builds a comfy_table with UTF8 styling.
fn new_table(headers: Vec<&str>) -> comfy_table::Table {
    let mut table = comfy_table::Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .apply_modifier(comfy_table::modifiers::UTF8_SOLID_INNER_BORDERS);

    table.set_header(headers);
    table
}
