use std::collections::BTreeMap;

use log::{debug, info, warn};

use crate::chain::{parse_channel_number, should_replace, ChannelMap, ChannelMapEntry, MapLeaf};
use crate::client::LcdFetch;
use crate::endpoints::Endpoint;
use crate::resolver::{format_rows, resolve_channels, resolve_local_identity};

pub static TRANSFER_PORT: &str = "transfer";

/// Queries every endpoint for its own chain id, keyed chain id to symbol.
/// Endpoints that do not answer are left out rather than guessed at.
pub async fn build_chain_id_map(
    fetch: &dyn LcdFetch,
    endpoints: &[Endpoint],
) -> BTreeMap<String, String> {
    let mut chain_ids = BTreeMap::new();
    for endpoint in endpoints {
        match resolve_local_identity(fetch, &endpoint.base_url).await {
            Some(chain_id) => {
                info!("{} identifies as {}", endpoint.symbol, chain_id);
                chain_ids.insert(chain_id, endpoint.symbol.clone());
            }
            None => warn!("could not resolve a chain id for {}", endpoint.symbol),
        }
    }
    chain_ids
}

/// The nested key for a counterparty: its configured symbol when the chain
/// id is known, the raw chain id when it is not, `UNKNOWN` when there is no
/// chain id at all.
fn counterparty_key(chain_ids: &BTreeMap<String, String>, chain_id: Option<&str>) -> String {
    match chain_id {
        Some(id) => chain_ids
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_string()),
        None => "UNKNOWN".to_string(),
    }
}

/// Collects transfer channels from every endpoint and folds them into the
/// nested symbol map. A whole-endpoint failure becomes a single `__error__`
/// leaf under that symbol; per-channel error records are logged and
/// dropped. Every configured symbol appears in the result, empty or not.
pub async fn aggregate(
    fetch: &dyn LcdFetch,
    endpoints: &[Endpoint],
    page_size: u32,
    delay_ms: u64,
) -> ChannelMap {
    let chain_ids = build_chain_id_map(fetch, endpoints).await;

    let mut result = ChannelMap::new();
    for endpoint in endpoints {
        info!("collecting transfer channels for {}", endpoint.symbol);
        let local = result.entry(endpoint.symbol.clone()).or_default();

        let rows = match resolve_channels(
            fetch,
            &endpoint.base_url,
            Some(TRANSFER_PORT),
            None,
            page_size,
            delay_ms,
        )
        .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!("{} is unreachable: {}", endpoint.symbol, e);
                local.insert(
                    "__error__".to_string(),
                    MapLeaf::Error {
                        message: e.to_string(),
                    },
                );
                continue;
            }
        };
        debug!("channels for {}:\n{}", endpoint.symbol, format_rows(&rows));

        for row in rows {
            if row.error.is_some() || row.port_id != TRANSFER_PORT {
                continue;
            }
            let key = counterparty_key(&chain_ids, row.counterparty_chain_id.as_deref());
            let candidate = ChannelMapEntry {
                source_channel: parse_channel_number(Some(row.channel_id.as_str())),
                destination_channel: parse_channel_number(row.counterparty_channel_id.as_deref()),
                state: row.state.unwrap_or_else(|| "UNKNOWN".to_string()),
            };
            match local.get(&key) {
                Some(MapLeaf::Channel(existing)) if !should_replace(existing, &candidate) => {}
                _ => {
                    local.insert(key, MapLeaf::Channel(candidate));
                }
            }
        }
    }
    result
}
