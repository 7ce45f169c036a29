//! Hotspot activity decoding
//!
//! Transaction-actor rows carry a role and an opaque JSON payload whose shape
//! depends on that role. [`decode_activity`] turns a page of such rows into an
//! [`ActivityBundle`] of typed records.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

mod decoder;
mod model;
mod payload;

pub use decoder::decode_activity;
pub use model::{
    ActivityBundle, ChallengeActivity, DataPacketActivity, GatewayActivity, RewardActivity,
    WitnessActivity, WitnessObservation,
};
pub use payload::{
    ActivityPayload, PocPath, PocReport, PocWitness, RewardEntry, RewardsFields,
    StateChannelFields,
};

/// Role an actor played in a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorRole {
    Witness,
    Challenger,
    Challengee,
    RewardGateway,
    PacketReceiver,
    Gateway,
}

impl ActorRole {
    /// `None` for roles the explorer does not render.
    pub fn parse(role: &str) -> Option<Self> {
        match role {
            "witness" => Some(Self::Witness),
            "challenger" => Some(Self::Challenger),
            "challengee" => Some(Self::Challengee),
            "reward_gateway" => Some(Self::RewardGateway),
            "packet_receiver" => Some(Self::PacketReceiver),
            "gateway" => Some(Self::Gateway),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Witness => "witness",
            Self::Challenger => "challenger",
            Self::Challengee => "challengee",
            Self::RewardGateway => "reward_gateway",
            Self::PacketReceiver => "packet_receiver",
            Self::Gateway => "gateway",
        }
    }

    /// Roles that count as proof-of-coverage participation
    pub fn is_poc(&self) -> bool {
        matches!(self, Self::Witness | Self::Challenger | Self::Challengee)
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One transaction an actor took part in, as stored
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RawTransactionRecord {
    pub actor_role: String,
    pub hash: String,
    pub time: i64,
    pub block: i64,
    pub fields: String,
}

/// Resolved position of a hotspot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotspotLocation {
    /// Hex-grid cell index
    pub location: String,
    /// Human-readable place name
    pub place: String,
}

/// Hotspot lookups the decoder needs while resolving places and distances.
#[async_trait]
pub trait HotspotDirectory: Send + Sync {
    /// Unknown hotspots resolve to an empty location.
    async fn locate(&self, address: &str) -> HotspotLocation;
}
