use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::sleep;

use crate::chain::normalize_state;
use crate::client::{fetch_all, join_url, LcdFetch};
use crate::errors::*;
use crate::lcd::{
    BlockResponse, ChannelResponse, ChannelSummary, ChannelsResponse, ClientStateResponse,
    ConnectionResponse, NodeInfoResponse,
};

static CHANNELS_PATH: &str = "/ibc/core/channel/v1/channels";
static CONNECTIONS_PATH: &str = "/ibc/core/connection/v1/connections";
static CLIENT_STATES_PATH: &str = "/ibc/core/client/v1/client_states";
static NODE_INFO_PATH: &str = "/cosmos/base/tendermint/v1beta1/node_info";
static LATEST_BLOCK_PATH: &str = "/cosmos/base/tendermint/v1beta1/blocks/latest";

/// Everything learned about one local channel. On a failed lookup only
/// `channel_id`, `port_id` and `error` are filled in and the rest must not
/// be trusted.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ResolvedChannel {
    pub channel_id: String,
    pub port_id: String,
    pub counterparty_channel_id: Option<String>,
    pub counterparty_port_id: Option<String>,
    pub connection_id: Option<String>,
    pub client_id: Option<String>,
    pub counterparty_chain_id: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Enumerate channels on one endpoint and chase each down to its
/// counterparty chain id. Fails only when the channel list itself cannot be
/// fetched; a single channel's failure becomes an error record and the
/// batch keeps going.
pub async fn resolve_channels(
    fetch: &dyn LcdFetch,
    base_url: &str,
    port_filter: Option<&str>,
    state_filter: Option<&str>,
    page_size: u32,
    delay_ms: u64,
) -> Result<Vec<ResolvedChannel>> {
    let summaries =
        fetch_all::<ChannelsResponse>(fetch, base_url, CHANNELS_PATH, page_size).await?;
    info!("found {} channels on {}", summaries.len(), base_url);

    let mut resolved = Vec::new();
    for (i, summary) in summaries.iter().enumerate() {
        if let Some(port) = port_filter {
            if summary.port_id != port {
                continue;
            }
        }
        if let Some(state) = state_filter {
            if normalize_state(summary.state.as_deref()) != normalize_state(Some(state)) {
                continue;
            }
        }
        debug!("channel {} of {} on {}", i + 1, summaries.len(), base_url);

        match resolve_one(fetch, base_url, summary).await {
            Ok(Some(channel)) => {
                resolved.push(channel);
                if delay_ms > 0 {
                    sleep(Duration::from_millis(delay_ms)).await;
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!("channel {} on {}: {}", summary.channel_id, base_url, e);
                resolved.push(ResolvedChannel {
                    channel_id: summary.channel_id.clone(),
                    port_id: summary.port_id.clone(),
                    error: Some(e.to_string()),
                    ..ResolvedChannel::default()
                });
            }
        }
    }
    Ok(resolved)
}

/// One channel's lookup chain: the detail for counterparty and connection
/// hops, the first hop's connection for the client id, the client state for
/// the counterparty chain id. `Ok(None)` means the channel cannot lead to a
/// counterparty yet (no hops, or a connection without a client).
async fn resolve_one(
    fetch: &dyn LcdFetch,
    base_url: &str,
    summary: &ChannelSummary,
) -> Result<Option<ResolvedChannel>> {
    let url = join_url(
        base_url,
        &format!(
            "{}/{}/ports/{}",
            CHANNELS_PATH, summary.channel_id, summary.port_id
        ),
    );
    let detail: ChannelResponse = serde_json::from_value(fetch.get_json(&url).await?)?;

    let channel = match detail.channel {
        Some(channel) => channel,
        None => {
            debug!("no channel detail for {} on {}", summary.channel_id, base_url);
            return Ok(None);
        }
    };
    let connection_id = match channel.connection_hops.first() {
        Some(id) => id.clone(),
        None => {
            // INIT/TRYOPEN channels may not have hops yet
            debug!(
                "channel {} on {} has no connection hops",
                summary.channel_id, base_url
            );
            return Ok(None);
        }
    };

    let url = join_url(base_url, &format!("{}/{}", CONNECTIONS_PATH, connection_id));
    let connection: ConnectionResponse = serde_json::from_value(fetch.get_json(&url).await?)?;
    let client_id = match connection.connection.and_then(|c| c.client_id) {
        Some(id) if !id.is_empty() => id,
        _ => {
            debug!(
                "connection {} on {} has no client id",
                connection_id, base_url
            );
            return Ok(None);
        }
    };

    let url = join_url(base_url, &format!("{}/{}", CLIENT_STATES_PATH, client_id));
    let client_state: ClientStateResponse = serde_json::from_value(fetch.get_json(&url).await?)?;

    let counterparty = channel.counterparty.unwrap_or_default();
    Ok(Some(ResolvedChannel {
        channel_id: summary.channel_id.clone(),
        port_id: summary.port_id.clone(),
        counterparty_channel_id: counterparty.channel_id,
        counterparty_port_id: counterparty.port_id,
        connection_id: Some(connection_id),
        client_id: Some(client_id),
        counterparty_chain_id: extract_chain_id(&client_state),
        state: Some(normalize_state(summary.state.as_deref())),
        error: None,
    }))
}

/// The chain id sits either directly on the client state or, when the state
/// comes wrapped as a protobuf Any, nested under `value`. First non-empty
/// form wins.
pub fn extract_chain_id(response: &ClientStateResponse) -> Option<String> {
    let state = response.client_state.as_ref()?;
    if let Some(id) = state.get("chain_id").and_then(Value::as_str) {
        if !id.is_empty() {
            return Some(id.to_string());
        }
    }
    state
        .get("value")
        .and_then(|v| v.get("chain_id"))
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// A node's own chain id: node_info first, the latest block header as a
/// fallback for older LCDs. `None` when the endpoint answers neither.
pub async fn resolve_local_identity(fetch: &dyn LcdFetch, base_url: &str) -> Option<String> {
    match fetch.get_json(&join_url(base_url, NODE_INFO_PATH)).await {
        Ok(body) => {
            let network = serde_json::from_value::<NodeInfoResponse>(body)
                .ok()
                .and_then(|info| info.default_node_info)
                .and_then(|node| node.network)
                .filter(|network| !network.is_empty());
            if network.is_some() {
                return network;
            }
        }
        Err(e) => debug!("node_info on {}: {}", base_url, e),
    }

    match fetch.get_json(&join_url(base_url, LATEST_BLOCK_PATH)).await {
        Ok(body) => serde_json::from_value::<BlockResponse>(body)
            .ok()
            .and_then(|body| body.block)
            .and_then(|block| block.header)
            .and_then(|header| header.chain_id)
            .filter(|chain_id| !chain_id.is_empty()),
        Err(e) => {
            debug!("latest block on {}: {}", base_url, e);
            None
        }
    }
}

/// Column-aligned view of resolved rows for the debug log.
pub fn format_rows(rows: &[ResolvedChannel]) -> String {
    let headers = [
        "local_channel",
        "local_port",
        "counterparty_channel",
        "counterparty_port",
        "counterparty_chain_id",
        "connection_id",
        "client_id",
    ];
    let cells: Vec<Vec<&str>> = rows
        .iter()
        .map(|r| {
            vec![
                r.channel_id.as_str(),
                r.port_id.as_str(),
                r.counterparty_channel_id.as_deref().unwrap_or(""),
                r.counterparty_port_id.as_deref().unwrap_or(""),
                r.counterparty_chain_id.as_deref().unwrap_or(""),
                r.connection_id.as_deref().unwrap_or(""),
                r.client_id.as_deref().unwrap_or(""),
            ]
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            cells
                .iter()
                .map(|row| row[i].len())
                .chain([header.len()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    let render = |row: &[&str]| -> String {
        row.iter()
            .enumerate()
            .map(|(i, cell)| format!("{:width$}", cell, width = widths[i]))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let separators: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let mut lines = vec![
        render(&headers),
        render(&separators.iter().map(String::as_str).collect::<Vec<_>>()),
    ];
    for row in &cells {
        lines.push(render(row));
    }
    lines.join("\n")
}
