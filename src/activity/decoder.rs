use tracing::{debug, warn};

use super::model::{
    ActivityBundle, ChallengeActivity, DataPacketActivity, RewardActivity, WitnessActivity,
    WitnessObservation,
};
use super::payload::{ActivityPayload, PocReport, PocWitness};
use super::{ActorRole, HotspotDirectory, RawTransactionRecord};
use crate::geo;

/// Decode a page of transaction-actor rows for `subject` into typed activity.
///
/// Rows keep their delivery order within each sequence. A row whose payload
/// cannot be decoded is logged and dropped; rows with roles the explorer does
/// not render are ignored.
pub async fn decode_activity<D>(
    rows: &[RawTransactionRecord],
    subject: &str,
    directory: &D,
) -> ActivityBundle
where
    D: HotspotDirectory + ?Sized,
{
    let mut bundle = ActivityBundle::default();

    for row in rows {
        let Some(role) = ActorRole::parse(&row.actor_role) else {
            debug!(hash = %row.hash, role = %row.actor_role, "ignoring unrendered role");
            continue;
        };

        let payload = match ActivityPayload::parse(role, &row.fields) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(hash = %row.hash, %role, error = %e, "skipping undecodable activity");
                continue;
            }
        };

        match payload {
            ActivityPayload::DataPackets(fields) => {
                let packets = fields
                    .state_channel
                    .summaries
                    .into_iter()
                    .filter(|summary| summary.client == subject)
                    .map(|summary| DataPacketActivity {
                        hash: row.hash.clone(),
                        time: row.time,
                        block: row.block,
                        num_dcs: summary.num_dcs,
                        location: summary.location,
                        num_packets: summary.num_packets,
                    });
                bundle.data_packets.extend(packets);
            }
            ActivityPayload::Rewards(fields) => {
                let rewards = fields
                    .rewards
                    .into_iter()
                    .filter(|reward| reward.gateway.as_deref() == Some(subject))
                    .map(|reward| RewardActivity {
                        hash: row.hash.clone(),
                        time: row.time,
                        block: row.block,
                        amount: reward.amount,
                    });
                bundle.rewards.extend(rewards);
            }
            ActivityPayload::Challengee(report) => {
                bundle.challengees.push(challenge(row, report, directory).await);
            }
            ActivityPayload::Challenger(report) => {
                bundle.challengers.push(challenge(row, report, directory).await);
            }
            ActivityPayload::Witness(report) => {
                bundle.witnesses.push(witness(row, report, subject, directory).await);
            }
            ActivityPayload::Gateway(mut gateway) => {
                gateway.timestamp = row.time;
                bundle.gateway_data.push(gateway);
            }
        }
    }

    bundle
}

/// Challengee and challenger records share a shape; distances are measured
/// from the beaconer's resolved location.
async fn challenge<D>(row: &RawTransactionRecord, report: PocReport, directory: &D) -> ChallengeActivity
where
    D: HotspotDirectory + ?Sized,
{
    let beaconer = report.path.receipt.gateway;
    let beaconer_at = directory.locate(&beaconer).await;
    let challenger_at = directory.locate(&report.challenger).await;

    let witnesses = observe(&report.path.witnesses, &beaconer_at.location, directory).await;
    let (valid_count, invalid_count) = tally(&witnesses);

    ChallengeActivity {
        hash: row.hash.clone(),
        time: row.time,
        block: row.block,
        challenger: report.challenger,
        challenger_location: challenger_at.place,
        beaconer,
        beaconer_location: beaconer_at.place,
        valid_count,
        invalid_count,
        witnesses,
    }
}

async fn witness<D>(
    row: &RawTransactionRecord,
    report: PocReport,
    subject: &str,
    directory: &D,
) -> WitnessActivity
where
    D: HotspotDirectory + ?Sized,
{
    let beaconer = report.path.challengee;
    let beaconer_at = directory.locate(&beaconer).await;
    let challenger_at = directory.locate(&report.challenger).await;

    let (valid, distance) = report
        .path
        .witnesses
        .iter()
        .find(|w| w.gateway == subject)
        .map(|w| (w.is_valid, meters(&beaconer_at.location, &w.location)))
        .unwrap_or((false, 0));

    let witnesses = observe(
        &report.path.witnesses,
        &report.path.challengee_location,
        directory,
    )
    .await;
    let (valid_count, invalid_count) = tally(&witnesses);

    WitnessActivity {
        hash: row.hash.clone(),
        time: row.time,
        block: row.block,
        distance,
        challenger: report.challenger,
        challenger_location: challenger_at.place,
        beaconer,
        beaconer_location: beaconer_at.place,
        valid,
        valid_count,
        invalid_count,
        witnesses,
    }
}

async fn observe<D>(witnesses: &[PocWitness], origin: &str, directory: &D) -> Vec<WitnessObservation>
where
    D: HotspotDirectory + ?Sized,
{
    let mut observations = Vec::with_capacity(witnesses.len());

    for w in witnesses {
        let place = directory.locate(&w.gateway).await.place;

        observations.push(WitnessObservation {
            gateway: w.gateway.clone(),
            distance_meters: meters(origin, &w.location),
            datarate: w.datarate.clone(),
            rssi: w.signal,
            snr: w.snr,
            frequency: w.frequency,
            is_valid: w.is_valid,
            timestamp: w.timestamp,
            channel: w.channel,
            resolved_place: place,
            invalid_reason: if w.is_valid {
                String::new()
            } else {
                w.invalid_reason.clone()
            },
        });
    }

    observations
}

fn tally(witnesses: &[WitnessObservation]) -> (usize, usize) {
    let valid = witnesses.iter().filter(|w| w.is_valid).count();
    (valid, witnesses.len() - valid)
}

fn meters(from: &str, to: &str) -> i64 {
    geo::distance_meters(from, to) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::HotspotLocation;
    use async_trait::async_trait;
    use h3o::{LatLng, Resolution};
    use serde_json::json;
    use std::collections::HashMap;

    const SUBJECT: &str = "subject";

    struct StaticDirectory(HashMap<String, HotspotLocation>);

    #[async_trait]
    impl HotspotDirectory for StaticDirectory {
        async fn locate(&self, address: &str) -> HotspotLocation {
            self.0.get(address).cloned().unwrap_or_default()
        }
    }

    fn cell(lat: f64, lng: f64) -> String {
        LatLng::new(lat, lng)
            .unwrap()
            .to_cell(Resolution::Twelve)
            .to_string()
    }

    fn directory() -> StaticDirectory {
        let entries = [
            ("beaconer", cell(37.7749, -122.4194), "San Francisco, CA, United States"),
            ("challenger", cell(40.7128, -74.0060), "New York, NY, United States"),
            ("w1", cell(37.7849, -122.4194), "San Francisco, CA, United States"),
            ("w2", cell(37.8044, -122.2712), "Oakland, CA, United States"),
            (SUBJECT, cell(37.7849, -122.4094), "San Francisco, CA, United States"),
        ];

        StaticDirectory(
            entries
                .into_iter()
                .map(|(addr, location, place)| {
                    (
                        addr.to_string(),
                        HotspotLocation {
                            location,
                            place: place.to_string(),
                        },
                    )
                })
                .collect(),
        )
    }

    fn row(role: &str, hash: &str, fields: serde_json::Value) -> RawTransactionRecord {
        RawTransactionRecord {
            actor_role: role.into(),
            hash: hash.into(),
            time: 1_650_000_000,
            block: 1_300_000,
            fields: fields.to_string(),
        }
    }

    fn poc_fields(dir: &StaticDirectory) -> serde_json::Value {
        let at = |addr: &str| dir.0[addr].location.clone();
        json!({
            "challenger": "challenger",
            "path": [{
                "receipt": {"gateway": "beaconer"},
                "challengee": "beaconer",
                "challengee_location": at("beaconer"),
                "witnesses": [
                    {"gateway": "w1", "is_valid": true, "location": at("w1"), "signal": -90,
                     "snr": 5.5, "frequency": 904.1, "channel": 2, "datarate": "SF9BW125",
                     "timestamp": 1_650_000_000_000_000_i64},
                    {"gateway": "w2", "is_valid": false, "invalid_reason": "bad_rssi",
                     "location": at("w2"), "signal": -20, "snr": 1.0, "frequency": 904.3},
                    {"gateway": SUBJECT, "is_valid": true, "location": at(SUBJECT), "signal": -100,
                     "snr": -3.0, "frequency": 904.5, "invalid_reason": "ignored when valid"}
                ]
            }]
        })
    }

    #[tokio::test]
    async fn challengee_with_bad_rssi_witness() {
        let dir = directory();
        let rows = vec![row("challengee", "tx1", poc_fields(&dir))];

        let bundle = decode_activity(&rows, "beaconer", &dir).await;

        assert_eq!(bundle.challengees.len(), 1);
        let c = &bundle.challengees[0];
        assert_eq!(c.beaconer, "beaconer");
        assert_eq!(c.beaconer_location, "San Francisco, CA, United States");
        assert_eq!(c.challenger_location, "New York, NY, United States");
        assert_eq!((c.valid_count, c.invalid_count), (2, 1));

        let bad = &c.witnesses[1];
        assert!(!bad.is_valid);
        assert_eq!(bad.invalid_reason, "bad_rssi");
        assert_eq!(bad.resolved_place, "Oakland, CA, United States");
        assert!(bad.distance_meters > 10_000);

        assert!(c.witnesses[2].invalid_reason.is_empty());
        assert!(c.witnesses[0].distance_meters > 1_000 && c.witnesses[0].distance_meters < 1_250);
    }

    #[tokio::test]
    async fn witness_record_reports_subject_validity_and_counts() {
        let dir = directory();
        let rows = vec![row("witness", "tx2", poc_fields(&dir))];

        let bundle = decode_activity(&rows, SUBJECT, &dir).await;

        let w = &bundle.witnesses[0];
        assert!(w.valid);
        assert!(w.distance > 0);
        assert_eq!(w.beaconer, "beaconer");
        assert_eq!(w.beaconer_location, "San Francisco, CA, United States");
        assert_eq!(w.challenger_location, "New York, NY, United States");
        assert_eq!(w.valid_count + w.invalid_count, w.witnesses.len());
        assert!(bundle.challengees.is_empty() && bundle.challengers.is_empty());
    }

    #[tokio::test]
    async fn witness_distances_use_separate_origins() {
        let dir = directory();
        let at = |addr: &str| dir.0[addr].location.clone();
        // Where the beacon claims to be, away from the beaconer's asserted cell
        let reported = cell(37.7000, -122.2000);
        let rows = vec![row(
            "witness",
            "tx3",
            json!({
                "challenger": "challenger",
                "path": [{
                    "challengee": "beaconer",
                    "challengee_location": reported,
                    "witnesses": [
                        {"gateway": "w1", "is_valid": true, "location": at("w1")},
                        {"gateway": SUBJECT, "is_valid": false, "location": at(SUBJECT),
                         "invalid_reason": "too_close"}
                    ]
                }]
            }),
        )];

        let bundle = decode_activity(&rows, SUBJECT, &dir).await;
        let w = &bundle.witnesses[0];

        let from_beaconer = meters(&at("beaconer"), &at(SUBJECT));
        let from_reported = meters(&reported, &at(SUBJECT));
        assert_ne!(from_beaconer, from_reported);

        assert!(!w.valid);
        assert_eq!(w.distance, from_beaconer);
        assert_eq!(w.witnesses[0].distance_meters, meters(&reported, &at("w1")));
        assert_eq!(w.witnesses[1].distance_meters, from_reported);
        assert_eq!(w.witnesses[1].invalid_reason, "too_close");
        assert_eq!((w.valid_count, w.invalid_count), (1, 1));
    }

    #[tokio::test]
    async fn lone_bad_rssi_witness_is_counted_invalid() {
        let dir = directory();
        let rows = vec![row(
            "challengee",
            "tx4",
            json!({
                "challenger": "challenger",
                "path": [{
                    "receipt": {"gateway": "beaconer"},
                    "challengee": "beaconer",
                    "witnesses": [
                        {"gateway": "w2", "is_valid": false, "invalid_reason": "bad_rssi",
                         "location": dir.0["w2"].location, "signal": -20}
                    ]
                }]
            }),
        )];

        let bundle = decode_activity(&rows, "beaconer", &dir).await;
        let c = &bundle.challengees[0];

        assert_eq!((c.valid_count, c.invalid_count), (0, 1));
        assert_eq!(c.witnesses.len(), 1);
        assert_eq!(c.witnesses[0].invalid_reason, "bad_rssi");
        assert_eq!(c.witnesses[0].rssi, -20);
        assert_eq!(
            c.witnesses[0].distance_meters,
            meters(&dir.0["beaconer"].location, &dir.0["w2"].location)
        );
    }

    #[tokio::test]
    async fn roles_land_in_their_own_sequence() {
        let dir = directory();
        let rows = vec![
            row(
                "packet_receiver",
                "tx-p",
                json!({"state_channel": {"summaries": [
                    {"client": SUBJECT, "num_dcs": 10, "num_packets": 10, "location": "abc"},
                    {"client": "someone-else", "num_dcs": 99, "num_packets": 99},
                    {"client": SUBJECT, "num_dcs": 3, "num_packets": 2}
                ]}}),
            ),
            row(
                "reward_gateway",
                "tx-r",
                json!({"rewards": [
                    {"type": "poc_witnesses", "amount": 150, "account": "owner", "gateway": SUBJECT},
                    {"type": "poc_witnesses", "amount": 7, "account": "owner", "gateway": "other"},
                    {"type": "securities", "amount": 1, "account": "owner", "gateway": null}
                ]}),
            ),
            row(
                "gateway",
                "tx-g",
                json!({"type": "assert_location_v2", "gateway": SUBJECT, "gain": 12, "elevation": 5}),
            ),
            row("challenger", "tx-c", poc_fields(&dir)),
            row("consensus_member", "tx-x", json!({})),
        ];

        let bundle = decode_activity(&rows, SUBJECT, &dir).await;

        assert_eq!(bundle.data_packets.len(), 2);
        assert_eq!(bundle.data_packets[0].num_dcs, 10);
        assert_eq!(bundle.data_packets[1].num_packets, 2);

        assert_eq!(bundle.rewards.len(), 1);
        assert_eq!(bundle.rewards[0].amount, 150);
        assert_eq!(bundle.rewards[0].hash, "tx-r");

        assert_eq!(bundle.gateway_data.len(), 1);
        assert_eq!(bundle.gateway_data[0].timestamp, 1_650_000_000);
        assert_eq!(bundle.gateway_data[0].kind, "assert_location_v2");

        assert_eq!(bundle.challengers.len(), 1);
        assert!(bundle.witnesses.is_empty());
        assert!(bundle.challengees.is_empty());
    }

    #[tokio::test]
    async fn malformed_rows_are_skipped_without_stopping() {
        let dir = directory();
        let rows = vec![
            row("challengee", "broken", json!("not an object")),
            row("challenger", "no-path", json!({"challenger": "challenger", "path": []})),
            RawTransactionRecord {
                fields: "{truncated".into(),
                ..row("gateway", "bad-json", json!({}))
            },
            row("challengee", "good", poc_fields(&dir)),
        ];

        let bundle = decode_activity(&rows, "beaconer", &dir).await;

        assert!(bundle.challengers.is_empty());
        assert!(bundle.gateway_data.is_empty());
        assert_eq!(bundle.challengees.len(), 1);
        assert_eq!(bundle.challengees[0].hash, "good");
    }

    #[tokio::test]
    async fn unknown_hotspots_resolve_to_empty_places() {
        let dir = StaticDirectory(HashMap::new());
        let rows = vec![row("challengee", "tx1", poc_fields(&directory()))];

        let bundle = decode_activity(&rows, "beaconer", &dir).await;
        let c = &bundle.challengees[0];

        assert_eq!(c.beaconer_location, "");
        assert!(c.witnesses.iter().all(|w| w.distance_meters == 0));
    }

    #[tokio::test]
    async fn bundle_serializes_every_sequence() {
        let bundle = decode_activity(&[], SUBJECT, &directory()).await;
        let value = serde_json::to_value(&bundle).unwrap();

        for key in ["witnesses", "challengers", "challengees", "rewards", "data_packets", "gateway_data"] {
            assert_eq!(value[key], json!([]), "{key}");
        }

        let restored: ActivityBundle = serde_json::from_str("{}").unwrap();
        assert_eq!(restored, ActivityBundle::default());
    }
}
