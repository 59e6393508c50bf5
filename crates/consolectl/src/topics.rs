use crate::output::{OutputType, Rows};
use anyhow::Context;
use chrono::{DateTime, Utc};
use console_client::topics::OffsetSpec;
use console_models::{
    BackendError, ConfigEntry, ConsumerGroup, ConsumerGroupAttributes, OrError, Partition, Topic,
    TopicSummary,
};
use serde::Serialize;

#[derive(Debug, clap::Args)]
pub struct Topics {
    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Debug, clap::Subcommand)]
#[clap(rename_all = "kebab-case")]
pub enum Command {
    /// List the topics of the Kafka cluster.
    List(List),
    /// Describe a topic, including its partitions and configuration.
    Describe(Describe),
    /// Describe a topic every poll interval, until interrupted.
    Watch(Watch),
    /// List the consumer groups of a topic.
    ConsumerGroups(TopicArg),
}

#[derive(Debug, clap::Args)]
pub struct List {
    /// Include internal topics, such as `__consumer_offsets`.
    #[clap(long)]
    include_internal: bool,
}

#[derive(Debug, clap::Args)]
pub struct TopicArg {
    /// Name or ID of the topic.
    pub topic: String,
}

#[derive(Debug, clap::Args)]
pub struct Describe {
    #[clap(flatten)]
    topic: TopicArg,
    /// Offsets to resolve for each partition: earliest, latest, maxTimestamp,
    /// or an RFC 3339 timestamp.
    #[clap(long)]
    offset_spec: Option<OffsetSpec>,
}

#[derive(Debug, clap::Args)]
pub struct Watch {
    #[clap(flatten)]
    topic: TopicArg,
    /// Interval between descriptions of the topic, overriding the configured poll interval.
    #[clap(long, value_parser = crate::config::parse_poll_interval)]
    interval: Option<humantime::Duration>,
}

impl Topics {
    pub async fn run(&self, ctx: &mut crate::CliContext) -> anyhow::Result<()> {
        match &self.cmd {
            Command::List(list) => do_list(ctx, list).await,
            Command::Describe(describe) => do_describe(ctx, describe).await,
            Command::Watch(watch) => do_watch(ctx, watch).await,
            Command::ConsumerGroups(topic) => do_consumer_groups(ctx, topic).await,
        }
    }
}

/// Resolve `topic`, which is either the ID or the name of a topic.
/// A topic having ID `topic` is preferred over one having that name.
pub async fn resolve_topic(
    client: &console_client::Client,
    kafka_id: &str,
    topic: &str,
) -> anyhow::Result<TopicSummary> {
    let mut topics = client
        .list_topics(kafka_id)
        .await
        .context("failed to list topics")?;

    let index = topics
        .iter()
        .position(|t| t.id == topic)
        .or_else(|| topics.iter().position(|t| t.name() == topic))
        .with_context(|| format!("topic '{topic}' was not found in Kafka cluster '{kafka_id}'"))?;

    Ok(topics.swap_remove(index))
}

async fn do_list(ctx: &mut crate::CliContext, List { include_internal }: &List) -> anyhow::Result<()> {
    let client = ctx.client()?;
    let kafka_id = ctx.kafka_id()?;

    let topics = client
        .list_topics(&kafka_id)
        .await
        .context("failed to list topics")?;

    let topics = topics
        .into_iter()
        .filter(|t| *include_internal || !t.attributes.internal);

    ctx.write_all(topics, ())
}

async fn do_describe(ctx: &mut crate::CliContext, args: &Describe) -> anyhow::Result<()> {
    let client = ctx.client()?;
    let kafka_id = ctx.kafka_id()?;
    let summary = resolve_topic(&client, &kafka_id, &args.topic.topic).await?;

    let topic = client
        .describe_topic(&kafka_id, &summary.id, args.offset_spec)
        .await
        .with_context(|| format!("failed to describe topic '{}'", summary.name()))?;

    if ctx.get_output_type() != OutputType::Table {
        return ctx.write_all(Some(topic), ());
    }

    let partitions = topic.attributes.partitions.clone();
    let configs = topic.attributes.configs.clone();

    ctx.write_all(Some(topic), ())?;
    println!();
    ctx.write_all(
        partitions.into_iter().map(PartitionRow),
        args.offset_spec.is_some(),
    )?;
    println!();

    match configs {
        OrError::Value(configs) => ctx.write_all(
            configs
                .into_iter()
                .map(|(name, entry)| ConfigRow { name, entry }),
            (),
        ),
        OrError::Error(err) => {
            println!("Configs: {}", unavailable(&err));
            Ok(())
        }
    }
}

async fn do_watch(ctx: &mut crate::CliContext, args: &Watch) -> anyhow::Result<()> {
    let client = ctx.client()?;
    let kafka_id = ctx.kafka_id()?;
    let summary = resolve_topic(&client, &kafka_id, &args.topic.topic).await?;

    let interval = args
        .interval
        .map(|interval| *interval)
        .unwrap_or_else(|| ctx.config().poll_interval());
    tracing::debug!(topic = %summary.name(), ?interval, "watching topic");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => (),
            _ = tokio::signal::ctrl_c() => break,
        }

        // Failures are reported, and the next tick tries again.
        match client.describe_topic(&kafka_id, &summary.id, None).await {
            Ok(topic) => ctx.write_all(Some(TopicSnapshot::new(&topic, Utc::now())), ())?,
            Err(err) => tracing::warn!(
                topic = %summary.name(),
                error = %format!("{:#}", anyhow::Error::new(err)),
                "failed to describe topic"
            ),
        }
    }
    Ok(())
}

async fn do_consumer_groups(ctx: &mut crate::CliContext, TopicArg { topic }: &TopicArg) -> anyhow::Result<()> {
    let client = ctx.client()?;
    let kafka_id = ctx.kafka_id()?;
    let summary = resolve_topic(&client, &kafka_id, topic).await?;

    let groups = client
        .list_topic_consumer_groups(&kafka_id, &summary.id)
        .await
        .context("failed to list consumer groups")?;

    ctx.write_all(groups, ())
}

// Placeholder for a field which the backend was unable to resolve.
fn unavailable(err: &BackendError) -> String {
    format!("unavailable ({})", err.title)
}

fn bytes(bytes: Option<i64>) -> String {
    bytes
        .map(|b| ::size::Size::from_bytes(b).to_string())
        .unwrap_or_default()
}

fn count(count: Option<i64>) -> String {
    count.map(|c| c.to_string()).unwrap_or_default()
}

impl Rows for TopicSummary {
    type Columns = ();

    fn headers(_columns: Self::Columns) -> Vec<&'static str> {
        vec!["Name", "ID", "Internal", "Partitions", "Records"]
    }

    fn cells(self, _columns: Self::Columns) -> Vec<String> {
        vec![
            self.name().to_string(),
            self.id.clone(),
            self.attributes.internal.to_string(),
            self.partition_count().to_string(),
            count(self.record_count()),
        ]
    }
}

impl Rows for Topic {
    type Columns = ();

    fn headers(_columns: Self::Columns) -> Vec<&'static str> {
        vec![
            "Name",
            "ID",
            "Internal",
            "Partitions",
            "Records",
            "Leader Log Size",
            "Authorized Operations",
        ]
    }

    fn cells(self, _columns: Self::Columns) -> Vec<String> {
        let operations = match &self.attributes.authorized_operations {
            OrError::Value(operations) => operations.join(", "),
            OrError::Error(err) => unavailable(err),
        };
        vec![
            self.name().to_string(),
            self.id.clone(),
            self.attributes.internal.to_string(),
            self.partition_count().to_string(),
            count(self.record_count()),
            bytes(self.attributes.total_leader_log_bytes),
            operations,
        ]
    }
}

#[derive(Serialize)]
#[serde(transparent)]
struct PartitionRow(Partition);

impl Rows for PartitionRow {
    /// Whether to include offsets resolved for an `--offset-spec`.
    type Columns = bool;

    fn headers(with_spec: Self::Columns) -> Vec<&'static str> {
        let mut headers = vec![
            "Partition",
            "Leader",
            "Replicas",
            "In Sync",
            "Records",
            "Leader Size",
            "Earliest Offset",
            "Latest Offset",
        ];
        if with_spec {
            headers.push("Resolved Offset");
        }
        headers
    }

    fn cells(self, with_spec: Self::Columns) -> Vec<String> {
        let PartitionRow(partition) = self;
        let offsets = partition.offsets.clone().unwrap_or_default();
        let offset = |info: Option<console_models::OffsetInfo>| {
            info.and_then(|info| info.offset)
                .map(|o| o.to_string())
                .unwrap_or_default()
        };

        let mut row = vec![
            partition.partition.to_string(),
            partition.leader_id.to_string(),
            replicas(&partition),
            format!("{}/{}", partition.in_sync_count(), partition.replicas.len()),
            count(partition.record_count),
            bytes(partition.leader_local_storage),
            offset(offsets.earliest),
            offset(offsets.latest),
        ];
        if with_spec {
            row.push(offset(offsets.timestamp.or(offsets.max_timestamp)));
        }
        row
    }
}

fn replicas(partition: &Partition) -> String {
    partition
        .replicas
        .iter()
        .map(|replica| {
            let mut line = replica.node_id.to_string();
            if let Some(rack) = &replica.node_rack {
                line.push_str(&format!(" ({rack})"));
            }
            line.push_str(if replica.in_sync { " in-sync" } else { " lagging" });

            match &replica.local_storage {
                Some(OrError::Value(storage)) => line.push_str(&format!(
                    " {} lag {}",
                    ::size::Size::from_bytes(storage.size),
                    storage.offset_lag
                )),
                Some(OrError::Error(err)) => {
                    line.push(' ');
                    line.push_str(&unavailable(err));
                }
                None => (),
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Serialize)]
struct ConfigRow {
    name: String,
    #[serde(flatten)]
    entry: ConfigEntry,
}

impl Rows for ConfigRow {
    type Columns = ();

    fn headers(_columns: Self::Columns) -> Vec<&'static str> {
        vec!["Config", "Value", "Source", "Read Only"]
    }

    fn cells(self, _columns: Self::Columns) -> Vec<String> {
        let value = match (self.entry.sensitive, self.entry.value) {
            (true, _) => "<sensitive>".to_string(),
            (false, value) => value.unwrap_or_default(),
        };
        vec![
            self.name,
            value,
            self.entry.source,
            self.entry.read_only.to_string(),
        ]
    }
}

impl Rows for ConsumerGroup {
    type Columns = ();

    fn headers(_columns: Self::Columns) -> Vec<&'static str> {
        vec!["Group", "State", "Simple", "Members"]
    }

    fn cells(self, _columns: Self::Columns) -> Vec<String> {
        let members = self.member_count();
        let ConsumerGroupAttributes {
            state,
            simple_consumer_group,
            ..
        } = self.attributes;
        vec![
            self.id,
            state.unwrap_or_default(),
            simple_consumer_group.map(|s| s.to_string()).unwrap_or_default(),
            members.to_string(),
        ]
    }
}

/// TopicSnapshot is a point-in-time observation of a watched topic.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct TopicSnapshot {
    observed_at: DateTime<Utc>,
    name: String,
    partitions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    record_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_leader_log_bytes: Option<i64>,
}

impl TopicSnapshot {
    fn new(topic: &Topic, observed_at: DateTime<Utc>) -> Self {
        Self {
            observed_at,
            name: topic.name().to_string(),
            partitions: topic.partition_count(),
            record_count: topic.record_count(),
            total_leader_log_bytes: topic.attributes.total_leader_log_bytes,
        }
    }
}

impl Rows for TopicSnapshot {
    type Columns = ();

    fn headers(_columns: Self::Columns) -> Vec<&'static str> {
        vec!["Observed At", "Name", "Partitions", "Records", "Leader Log Size"]
    }

    fn cells(self, _columns: Self::Columns) -> Vec<String> {
        vec![
            self.observed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            self.name,
            self.partitions.to_string(),
            count(self.record_count),
            bytes(self.total_leader_log_bytes),
        ]
    }
}
