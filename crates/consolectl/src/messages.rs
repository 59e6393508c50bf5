use crate::browser::{
    columns::{self, ColumnMask},
    render, session, Column, DirPreferenceStore, FetchCoordinator, FilterMode, MessageBrowser,
    MessageQuery, TopicRecords,
};
use crate::config::Config;
use crate::output::Rows;
use anyhow::Context;
use chrono::{DateTime, Utc};
use console_models::Message;
use std::num::NonZeroU32;

#[derive(Debug, clap::Args)]
pub struct Messages {
    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// List a page of messages of a topic.
    List(Selector),
    /// Interactively browse the messages of a topic.
    ///
    /// The browser reads commands from stdin, one per line, and re-renders
    /// whenever its listing of messages changes. Type `help` for commands.
    Browse(Browse),
    /// Show or choose the columns of message tables.
    Columns(Columns),
}

/// Selector of the messages of a topic.
#[derive(Debug, clap::Args)]
pub struct Selector {
    /// Name or ID of the topic.
    topic: String,
    /// Partition to read. All partitions are read if not set.
    #[clap(long)]
    partition: Option<i32>,
    /// Maximum number of messages to list.
    #[clap(long, default_value = "50")]
    limit: NonZeroU32,
    /// List messages at or after this offset.
    #[clap(long, conflicts_with_all = ["timestamp", "epoch"])]
    offset: Option<i64>,
    /// List messages at or after this RFC 3339 timestamp.
    #[clap(long, conflicts_with = "epoch")]
    timestamp: Option<DateTime<Utc>>,
    /// List messages at or after this many seconds since the Unix epoch.
    /// Negative values are ignored.
    #[clap(long, allow_negative_numbers = true)]
    epoch: Option<i64>,
}

#[derive(Debug, clap::Args)]
pub struct Browse {
    #[clap(flatten)]
    selector: Selector,
    /// Interval between refreshes, overriding the configured poll interval.
    #[clap(long, value_parser = crate::config::parse_poll_interval)]
    interval: Option<humantime::Duration>,
}

#[derive(Debug, clap::Args)]
pub struct Columns {
    #[clap(subcommand)]
    cmd: ColumnsCommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum ColumnsCommand {
    /// Show the selected columns.
    Show,
    /// Select columns, which are shown in a fixed order.
    ///
    /// Columns are offset-partition (or offset), size, key, timestamp,
    /// timestampUTC, headers, and value.
    Set {
        #[clap(required = true)]
        columns: Vec<String>,
    },
    /// Restore the default columns.
    Reset,
}

impl Messages {
    pub async fn run(&self, ctx: &mut crate::CliContext) -> anyhow::Result<()> {
        match &self.cmd {
            Command::List(selector) => do_list(ctx, selector).await,
            Command::Browse(browse) => do_browse(ctx, browse).await,
            Command::Columns(Columns { cmd }) => do_columns(ctx, cmd),
        }
    }
}

fn preference_store() -> anyhow::Result<DirPreferenceStore> {
    Ok(DirPreferenceStore::new(Config::preferences_dir()?))
}

impl Selector {
    /// Build a MessageBrowser of the selected messages of `topic`.
    fn browser(
        &self,
        topic: &console_models::TopicSummary,
    ) -> anyhow::Result<MessageBrowser<DirPreferenceStore>> {
        let query = MessageQuery {
            partition: None,
            limit: self.limit,
            filter: FilterMode::from_parts(self.offset, self.timestamp, self.epoch),
        };
        let mut browser = MessageBrowser::new(
            topic.name().to_string(),
            topic.partition_count(),
            query,
            preference_store()?,
        );
        browser.set_partition(self.partition)?;

        Ok(browser)
    }
}

async fn do_list(ctx: &mut crate::CliContext, selector: &Selector) -> anyhow::Result<()> {
    let client = ctx.client()?;
    let kafka_id = ctx.kafka_id()?;
    let topic = crate::topics::resolve_topic(&client, &kafka_id, &selector.topic).await?;

    let browser = selector.browser(&topic)?;
    let query = browser.query();
    tracing::debug!(?query, topic = %topic.name(), "listing messages");

    let messages = client
        .list_records(&kafka_id, &topic.id, &query.to_records_query())
        .await
        .with_context(|| format!("failed to list messages of topic '{}'", topic.name()))?;

    let mask = ColumnMask::new(browser.table().selected_columns());
    ctx.write_all(messages, mask)
}

async fn do_browse(ctx: &mut crate::CliContext, args: &Browse) -> anyhow::Result<()> {
    let client = ctx.client()?;
    let kafka_id = ctx.kafka_id()?;
    let topic = crate::topics::resolve_topic(&client, &kafka_id, &args.selector.topic).await?;

    let browser = args.selector.browser(&topic)?;
    let coordinator = FetchCoordinator::new(TopicRecords {
        client,
        kafka_id,
        topic_id: topic.id.clone(),
    });
    let interval = args
        .interval
        .map(|interval| *interval)
        .unwrap_or_else(|| ctx.config().poll_interval());

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    session::run(browser, coordinator, interval, stdin).await
}

fn do_columns(ctx: &mut crate::CliContext, cmd: &ColumnsCommand) -> anyhow::Result<()> {
    let store = preference_store()?;

    match cmd {
        ColumnsCommand::Show => ctx.write_all(columns::load_columns(&store), ()),
        ColumnsCommand::Set { columns } => {
            let columns = columns::parse_columns(columns).map_err(anyhow::Error::msg)?;
            columns::save_columns(&store, &columns).context("failed to save selected columns")
        }
        ColumnsCommand::Reset => {
            columns::reset_columns(&store).context("failed to reset selected columns")
        }
    }
}

impl Rows for Message {
    type Columns = ColumnMask;

    fn headers(mask: Self::Columns) -> Vec<&'static str> {
        mask.columns().map(|column| column.header()).collect()
    }

    fn cells(self, mask: Self::Columns) -> Vec<String> {
        mask.columns()
            .map(|column| render::cell(&self, column))
            .collect()
    }
}

impl Rows for Column {
    type Columns = ();

    fn headers(_columns: Self::Columns) -> Vec<&'static str> {
        vec!["Column", "Header"]
    }

    fn cells(self, _columns: Self::Columns) -> Vec<String> {
        vec![self.id().to_string(), self.header().to_string()]
    }
}
