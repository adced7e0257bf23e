//! Payloads exchanged with the Estuary API.
//!
//! Field names follow the service's JSON. Missing fields take their default
//! value, so a partial response still decodes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use estuary_core::classify::ErrorBody;

/// Health status of an Estuary node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Health {
    /// Reported status, `ok` when healthy.
    pub status: String,
}

/// Aggregate storage statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PublicStats {
    /// Bytes stored.
    pub total_storage: i64,
    /// Files stored.
    #[serde(rename = "totalFiles")]
    pub total_files_stored: i64,
    /// Deals on chain.
    pub deals_on_chain: i64,
}

/// Public node information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PublicNodeInfo {
    /// Primary wallet address of the node.
    pub primary_address: String,
}

/// Result of a streamed content upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddedContent {
    /// Root CID of the stored content.
    pub cid: String,
    /// Content id assigned by the node.
    pub estuary_id: u64,
    /// Multiaddresses serving the content.
    pub providers: Vec<String>,
}

/// Pin payload of the IPFS pinning service API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpfsPin {
    /// CID to pin.
    pub cid: String,
    /// Optional name.
    pub name: String,
    /// Multiaddresses of peers known to have the content.
    pub origins: Vec<String>,
    /// Free-form metadata.
    pub meta: Map<String, Value>,
}

impl IpfsPin {
    /// Pin payload for `cid` with no name, origins or metadata.
    #[must_use]
    pub fn new(cid: impl Into<String>) -> Self {
        Self {
            cid: cid.into(),
            ..Self::default()
        }
    }
}

/// Status of a pin request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpfsPinStatus {
    /// Pin request id.
    #[serde(rename = "requestid")]
    pub request_id: String,
    /// `queued`, `pinning`, `pinned` or `failed`.
    pub status: String,
    /// Creation time.
    pub created: DateTime<Utc>,
    /// The pin.
    pub pin: IpfsPin,
    /// Multiaddresses of the pinning nodes.
    pub delegates: Vec<String>,
    /// Additional status information.
    pub info: Map<String, Value>,
}

/// Page of pin statuses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinList {
    /// Total number of matching pins.
    pub count: i64,
    /// Pins in this page.
    pub results: Vec<IpfsPinStatus>,
}

/// Content record with its deals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentInfo {
    /// The content.
    pub content: Content,
    /// Aggregate holding this content, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregated_in: Option<Content>,
    /// Storage deals for the content.
    pub deals: Vec<ContentDeal>,
}

/// Content stored on a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Content {
    /// Numeric id.
    pub id: u64,
    /// Content CID.
    pub cid: String,
    /// Name.
    pub name: String,
    /// Owner id.
    pub user_id: u64,
    /// Description.
    pub description: String,
    /// Size in bytes.
    pub size: i64,
    /// Whether the content is live.
    pub active: bool,
    /// Whether the content was offloaded.
    pub offloaded: bool,
    /// Target replication factor.
    pub replication: i64,
    /// Id of the aggregate, zero when not aggregated.
    pub aggregated_in: u64,
    /// Whether this is an aggregate.
    pub aggregate: bool,
    /// Whether pinning is in progress.
    pub pinning: bool,
    /// Raw pin metadata.
    pub pin_meta: String,
    /// Whether it failed.
    pub failed: bool,
    /// Node holding the content.
    pub location: String,
    /// Whether the DAG was split.
    pub dag_split: bool,
}

/// Storage deal for a piece of content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentDeal {
    /// Numeric id.
    pub id: u64,
    /// Content id.
    pub content: u64,
    /// Deal proposal CID.
    pub prop_cid: String,
    /// Miner address.
    pub miner: String,
    /// On-chain deal id.
    pub deal_id: i64,
    /// Whether it failed.
    pub failed: bool,
    /// Whether the deal is verified.
    pub verified: bool,
    /// Failure time.
    pub failed_at: DateTime<Utc>,
    /// Data transfer channel id.
    pub dt_chan: String,
    /// Transfer start time.
    pub transfer_started: DateTime<Utc>,
    /// Transfer end time.
    pub transfer_finished: DateTime<Utc>,
    /// Time the deal reached the chain.
    pub on_chain_at: DateTime<Utc>,
    /// Sealing time.
    pub sealed_at: DateTime<Utc>,
}

/// Statistics about a storage miner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MinerStats {
    /// Miner address.
    pub miner: String,
    /// Name.
    pub name: String,
    /// Miner software version.
    pub version: String,
    /// Whether the node makes deals with it.
    pub used_by_estuary: bool,
    /// Deals made.
    pub deal_count: i64,
    /// Failed deals.
    pub error_count: i64,
    /// Whether the miner is suspended.
    pub suspended: bool,
    /// Reason for the suspension.
    pub suspended_reason: String,
    /// On-chain information, when known.
    pub chain_info: Option<MinerChainInfo>,
}

/// On-chain information about a miner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MinerChainInfo {
    /// Libp2p peer id.
    pub peer_id: String,
    /// Multiaddresses.
    pub addresses: Vec<String>,
    /// Owner address.
    pub owner: String,
    /// Worker address.
    pub worker: String,
}

/// Deal made with a miner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MinerDeal {
    /// Numeric id.
    pub id: u64,
    /// Content id.
    pub content: u64,
    /// Deal proposal CID.
    pub prop_cid: String,
    /// Miner address.
    pub miner: String,
    /// On-chain deal id.
    pub deal_id: i64,
    /// Whether it failed.
    pub failed: bool,
    /// Whether the deal is verified.
    pub verified: bool,
    /// Failure time.
    pub failed_at: DateTime<Utc>,
    /// Data transfer channel id.
    pub dt_chan: String,
    /// Transfer start time.
    pub transfer_started: DateTime<Utc>,
    /// Transfer end time.
    pub transfer_finished: DateTime<Utc>,
    /// Time the deal reached the chain.
    pub on_chain_at: DateTime<Utc>,
    /// Sealing time.
    pub sealed_at: DateTime<Utc>,
    /// CID of the content in the deal.
    pub content_cid: String,
}

/// Failed deal attempt with a miner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MinerDealFailure {
    /// Numeric id.
    pub id: u64,
    /// Miner address.
    pub miner: String,
    /// Deal phase that failed.
    pub phase: String,
    /// Failure message.
    pub message: String,
    /// Content id.
    pub content: u64,
    /// Miner software version.
    pub miner_version: String,
}

/// Storage price asked by a miner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MinerStorageAsk {
    /// Miner address.
    pub miner: String,
    /// Price in attoFIL per GiB per epoch.
    pub price: String,
    /// Price for verified deals.
    pub verified_price: String,
    /// Minimum piece size in bytes.
    pub min_piece_size: u64,
    /// Maximum piece size in bytes.
    pub max_piece_size: u64,
}
