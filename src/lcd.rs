use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::Page;

/// One entry of the paginated channel list. The list is a summary; the
/// connection hops only come back from the per-channel detail query.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChannelSummary {
    pub channel_id: String,
    pub port_id: String,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct PageInfo {
    #[serde(default)]
    pub next_key: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChannelsResponse {
    #[serde(default)]
    pub channels: Vec<ChannelSummary>,
    #[serde(default)]
    pub pagination: Option<PageInfo>,
}

impl Page for ChannelsResponse {
    type Item = ChannelSummary;

    fn next_key(&self) -> Option<String> {
        self.pagination.as_ref().and_then(|p| p.next_key.clone())
    }

    fn into_items(self) -> Vec<ChannelSummary> {
        self.channels
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Counterparty {
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub port_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChannelEnd {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub counterparty: Option<Counterparty>,
    #[serde(default)]
    pub connection_hops: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChannelResponse {
    #[serde(default)]
    pub channel: Option<ChannelEnd>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ConnectionEnd {
    #[serde(default)]
    pub client_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ConnectionResponse {
    #[serde(default)]
    pub connection: Option<ConnectionEnd>,
}

/// The client state is left untyped: depending on the node it is either the
/// tendermint client state itself or a protobuf Any with the state under
/// `value`.
#[derive(Serialize, Deserialize, Debug)]
pub struct ClientStateResponse {
    #[serde(default)]
    pub client_state: Option<Value>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct NodeInfo {
    #[serde(default)]
    pub network: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct NodeInfoResponse {
    #[serde(default)]
    pub default_node_info: Option<NodeInfo>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct BlockHeader {
    #[serde(default)]
    pub chain_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Block {
    #[serde(default)]
    pub header: Option<BlockHeader>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct BlockResponse {
    #[serde(default)]
    pub block: Option<Block>,
}
