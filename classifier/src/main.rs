use std::{io::Write, sync::Arc};

use anyhow::Context;
use classifier::{
    app_config::cfg,
    model::{DisplayRow, Record},
    observability::Progress,
    service::ComprehendService,
    session::ClassificationSession,
};
use mimalloc::MiMalloc;
use serde::{Deserialize, Serialize};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    signal,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Debug, Deserialize)]
struct EmailInput {
    id: Option<String>,
    subject: Option<String>,
    body: Option<String>,
}

#[derive(Debug, Serialize)]
struct OutputRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    source_id: Option<String>,
    #[serde(flatten)]
    row: DisplayRow,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::Layer::default()
                .with_ansi(false)
                .with_writer(std::io::stderr),
        )
        .init();

    tracing::debug!("{}", *cfg);

    let inputs = read_inputs().await?;
    if inputs.is_empty() {
        tracing::warn!("No records on stdin, nothing to classify");
        return Ok(());
    }

    let records: Vec<Record> = inputs
        .iter()
        .enumerate()
        .map(|(i, input)| {
            Record::from_email(
                i,
                &cfg.records.subject_prefix,
                input.subject.as_deref(),
                input.body.as_deref(),
            )
        })
        .collect();

    let http_client = reqwest::ClientBuilder::new().use_rustls_tls().build()?;
    let service = ComprehendService::from_env(http_client)?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                tracing::info!("Received ctrl-c, stopping after in-flight requests");
                cancel.cancel();
            }
        });
    }

    let mut session = ClassificationSession::from_env(Arc::new(service), cancel);
    let track = |p: Progress| tracing::debug!("Progress ({}): {}", p.stage, p.format_progress());

    let report = session
        .run(&cfg.endpoint.model_arn, records, Some(&track))
        .await
        .context("Classification run failed")?;

    let mut stdout = std::io::stdout().lock();
    for (record, input) in report.records.iter().zip(inputs) {
        let row = OutputRow {
            source_id: input.id,
            row: record.display_row(),
        };
        writeln!(stdout, "{}", serde_json::to_string(&row)?)?;
    }

    Ok(())
}

async fn read_inputs() -> anyhow::Result<Vec<EmailInput>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut inputs = Vec::new();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let input: EmailInput = serde_json::from_str(&line)
            .with_context(|| format!("Invalid input record {}", inputs.len() + 1))?;
        inputs.push(input);
    }

    Ok(inputs)
}
