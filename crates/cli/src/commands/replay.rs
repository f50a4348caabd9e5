// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `busline replay` - Replay recorded messages through a set of subscriptions
//!
//! Every dispatch prints `<subscription-index> <member> <path>`, with `-`
//! standing in for a missing member or path.

use anyhow::{bail, Context, Result};
use busline_adapters::{MemoryBus, TracedBusClient};
use busline_core::{handler, BusConfig, Connection, MatchHandler, Message};
use clap::Args;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args)]
pub struct ReplayArgs {
    /// JSON file holding an array of criteria objects
    #[arg(long)]
    pub criteria: PathBuf,

    /// File of JSON messages, one per line
    #[arg(long)]
    pub messages: PathBuf,
}

pub fn replay(args: ReplayArgs, config: BusConfig) -> Result<()> {
    let Value::Array(criteria) = super::read_json(&args.criteria)? else {
        bail!("{}: expected a JSON array of criteria", args.criteria.display());
    };
    let messages = read_messages(&args.messages)?;

    let bus = MemoryBus::from_config(&config);
    let conn = Connection::with_config(TracedBusClient::new(bus.clone()), config);
    let printer: Arc<dyn MatchHandler> = Arc::new(handler(|_, msg, index| {
        let mut out = std::io::stdout().lock();
        writeln!(
            out,
            "{} {} {}",
            index,
            msg.member.as_deref().unwrap_or("-"),
            msg.path.as_deref().unwrap_or("-")
        )?;
        Ok(())
    }));

    let result = subscribe_all(&conn, &criteria, &printer).and_then(|()| {
        let sender = bus.sender();
        for message in messages {
            sender.send(message).context("inbound queue closed")?;
        }
        Ok(bus.pump(&conn))
    });

    // Subscriptions anchor the connection until it is closed
    let disposed = conn.close();
    let processed = result?;
    tracing::info!(processed, disposed, "replay finished");
    Ok(())
}

fn subscribe_all(
    conn: &Connection,
    criteria: &[Value],
    printer: &Arc<dyn MatchHandler>,
) -> Result<()> {
    for (index, entry) in criteria.iter().enumerate() {
        conn.subscribe_shared(entry, Arc::clone(printer), Value::from(index))
            .with_context(|| format!("criteria {index}"))?;
    }
    Ok(())
}

fn read_messages(path: &Path) -> Result<Vec<Message>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("{}:{}: invalid message", path.display(), n + 1))
        })
        .collect()
}
