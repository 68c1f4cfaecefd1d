use rkyv::rancor::Error;
use rkyv::{Archive, Deserialize, Serialize};

use crate::roster::{Participant, Roster};

pub const ROSTER_SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct RosterSnapshot {
    pub version: u32,
    pub id_seed: u64,
    pub next_serial: u64,
    pub entries: Vec<ParticipantRecord>,
}

pub fn snapshot_roster(roster: &Roster) -> RosterSnapshot {
    RosterSnapshot {
        version: ROSTER_SNAPSHOT_VERSION,
        id_seed: roster.id_seed(),
        next_serial: roster.next_serial(),
        entries: roster
            .entries()
            .iter()
            .map(|entry| ParticipantRecord {
                id: entry.id.clone(),
                name: entry.name.clone(),
            })
            .collect(),
    }
}

// A snapshot from another version, or one whose entries break the
// unique-id invariant, restores to None.
pub fn restore_roster(snapshot: &RosterSnapshot) -> Option<Roster> {
    if snapshot.version != ROSTER_SNAPSHOT_VERSION {
        return None;
    }
    let entries = snapshot
        .entries
        .iter()
        .map(|record| Participant {
            id: record.id.clone(),
            name: record.name.clone(),
        })
        .collect();
    Roster::from_parts(snapshot.id_seed, snapshot.next_serial, entries)
}

pub fn encode_snapshot(snapshot: &RosterSnapshot) -> Option<Vec<u8>> {
    rkyv::to_bytes::<Error>(snapshot)
        .ok()
        .map(|bytes| bytes.into_vec())
}

pub fn decode_snapshot(bytes: &[u8]) -> Option<RosterSnapshot> {
    rkyv::from_bytes::<RosterSnapshot, Error>(bytes).ok()
}
