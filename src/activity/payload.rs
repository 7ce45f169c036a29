use serde::{Deserialize, Deserializer, Serialize};

use super::model::GatewayActivity;
use super::ActorRole;
use crate::error::PayloadError;

/// Missing and `null` both read as the default value.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PocReceipt {
    #[serde(default, deserialize_with = "null_default")]
    pub gateway: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PocWitness {
    #[serde(default, deserialize_with = "null_default")]
    pub gateway: String,
    #[serde(default, deserialize_with = "null_default")]
    pub snr: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub signal: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub channel: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub datarate: String,
    #[serde(default, deserialize_with = "null_default")]
    pub is_valid: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub location: String,
    #[serde(default, deserialize_with = "null_default")]
    pub frequency: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub invalid_reason: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PocPath {
    #[serde(default, deserialize_with = "null_default")]
    pub receipt: PocReceipt,
    #[serde(default, deserialize_with = "null_default")]
    pub witnesses: Vec<PocWitness>,
    #[serde(default, deserialize_with = "null_default")]
    pub challengee: String,
    #[serde(default, deserialize_with = "null_default")]
    pub challengee_location: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PocFields {
    #[serde(default, deserialize_with = "null_default")]
    path: Vec<PocPath>,
    #[serde(default, deserialize_with = "null_default")]
    challenger: String,
}

/// Proof-of-coverage receipt reduced to the first path element
#[derive(Debug, Clone)]
pub struct PocReport {
    pub challenger: String,
    pub path: PocPath,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardEntry {
    #[serde(rename = "type", default, deserialize_with = "null_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_default")]
    pub amount: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub account: String,
    /// Absent for account-only rewards such as securities
    #[serde(default)]
    pub gateway: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RewardsFields {
    #[serde(default, deserialize_with = "null_default")]
    pub rewards: Vec<RewardEntry>,
    #[serde(default, deserialize_with = "null_default")]
    pub start_epoch: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub end_epoch: i64,
}

impl RewardsFields {
    pub fn parse(fields: &str) -> Result<Self, PayloadError> {
        Ok(serde_json::from_str(fields)?)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateChannelSummary {
    #[serde(default, deserialize_with = "null_default")]
    pub client: String,
    #[serde(default, deserialize_with = "null_default")]
    pub num_dcs: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub location: String,
    #[serde(default, deserialize_with = "null_default")]
    pub num_packets: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateChannel {
    #[serde(default, deserialize_with = "null_default")]
    pub summaries: Vec<StateChannelSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateChannelFields {
    #[serde(default, deserialize_with = "null_default")]
    pub state_channel: StateChannel,
}

/// A transaction payload decoded according to the actor's role
#[derive(Debug, Clone)]
pub enum ActivityPayload {
    Witness(PocReport),
    Challenger(PocReport),
    Challengee(PocReport),
    Rewards(RewardsFields),
    DataPackets(StateChannelFields),
    Gateway(GatewayActivity),
}

impl ActivityPayload {
    pub fn parse(role: ActorRole, fields: &str) -> Result<Self, PayloadError> {
        let payload = match role {
            ActorRole::Witness => Self::Witness(poc_report(role, fields)?),
            ActorRole::Challenger => Self::Challenger(poc_report(role, fields)?),
            ActorRole::Challengee => Self::Challengee(poc_report(role, fields)?),
            ActorRole::RewardGateway => Self::Rewards(RewardsFields::parse(fields)?),
            ActorRole::PacketReceiver => Self::DataPackets(serde_json::from_str(fields)?),
            ActorRole::Gateway => Self::Gateway(serde_json::from_str(fields)?),
        };

        Ok(payload)
    }
}

fn poc_report(role: ActorRole, fields: &str) -> Result<PocReport, PayloadError> {
    let fields: PocFields = serde_json::from_str(fields)?;
    let path = fields
        .path
        .into_iter()
        .next()
        .ok_or(PayloadError::EmptyPath(role.as_str()))?;

    Ok(PocReport {
        challenger: fields.challenger,
        path,
    })
}
