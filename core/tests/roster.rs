use std::collections::HashSet;

use kujibiki_core::{
    decode_snapshot, encode_snapshot, parse_names_text, restore_roster, snapshot_roster, Roster,
    RosterSnapshot, ROSTER_SNAPSHOT_VERSION, SAMPLE_NAMES,
};
use kujibiki_core::snapshot::ParticipantRecord;

#[test]
fn appended_entries_get_unique_ids() {
    let mut roster = Roster::new(0x5EED);
    roster.append_names((0..1000).map(|index| format!("Name {index}")));
    assert_eq!(roster.len(), 1000);
    let ids: HashSet<&str> = roster.entries().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids.len(), 1000);
}

#[test]
fn append_preserves_order_and_existing_ids() {
    let mut roster = Roster::new(1);
    roster.append_names(["甲", "乙"]);
    let first_ids: Vec<String> = roster.entries().iter().map(|p| p.id.clone()).collect();
    roster.append_names(["丙"]);
    let names: Vec<&str> = roster.entries().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["甲", "乙", "丙"]);
    assert_eq!(roster.entries()[0].id, first_ids[0]);
    assert_eq!(roster.entries()[1].id, first_ids[1]);
}

#[test]
fn remove_deletes_by_id_without_reordering() {
    let mut roster = Roster::new(2);
    roster.append_names(["A", "B", "C"]);
    let middle = roster.entries()[1].id.clone();
    assert!(roster.remove(&middle));
    assert!(!roster.remove(&middle));
    let names: Vec<&str> = roster.entries().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["A", "C"]);
}

#[test]
fn dedupe_keeps_first_occurrence_in_order() {
    let mut roster = Roster::new(3);
    roster.append_names(["A", "B", "A", "C", "B"]);
    assert!(roster.has_duplicate_names());
    assert_eq!(roster.dedupe_by_name(), 2);
    let names: Vec<&str> = roster.entries().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
    assert!(!roster.has_duplicate_names());
    // Idempotent.
    assert_eq!(roster.dedupe_by_name(), 0);
    let again: Vec<&str> = roster.entries().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(again, vec!["A", "B", "C"]);
}

#[test]
fn dedupe_is_case_sensitive() {
    let mut roster = Roster::new(4);
    roster.append_names(["ann", "Ann", "ann"]);
    assert_eq!(roster.dedupe_by_name(), 1);
    assert_eq!(roster.len(), 2);
}

#[test]
fn name_counts_track_every_change() {
    let mut roster = Roster::new(5);
    roster.append_names(["A", "B", "A"]);
    let counts = roster.name_counts();
    assert_eq!(counts.get("A"), Some(&2));
    assert_eq!(counts.get("B"), Some(&1));

    let duplicate = roster
        .entries()
        .iter()
        .rev()
        .find(|p| p.name == "A")
        .map(|p| p.id.clone())
        .expect("duplicate entry");
    roster.remove(&duplicate);
    assert_eq!(roster.name_counts().get("A"), Some(&1));

    roster.clear();
    assert!(roster.is_empty());
    assert!(roster.name_counts().is_empty());
}

#[test]
fn parse_trims_skips_blanks_and_unquotes() {
    let text = "  王小明  \n\n\"李大華\"\r\n   \n\" 陳小姐 \"\nplain\n\"\"\n";
    assert_eq!(
        parse_names_text(text),
        vec!["王小明", "李大華", "陳小姐", "plain"]
    );
}

#[test]
fn sample_roster_is_available() {
    assert_eq!(SAMPLE_NAMES.len(), 12);
    let mut roster = Roster::new(6);
    roster.append_names(SAMPLE_NAMES.iter().copied());
    assert_eq!(roster.len(), SAMPLE_NAMES.len());
}

#[test]
fn snapshot_round_trips_through_the_codec() {
    let mut roster = Roster::new(0xFACE);
    roster.append_names(["甲", "乙", "丙"]);

    let snapshot = snapshot_roster(&roster);
    assert_eq!(snapshot.version, ROSTER_SNAPSHOT_VERSION);
    let bytes = encode_snapshot(&snapshot).expect("encodes");
    let decoded = decode_snapshot(&bytes).expect("decodes");
    assert_eq!(decoded, snapshot);

    let restored = restore_roster(&decoded).expect("restores");
    assert_eq!(restored, roster);

    // Ids keep advancing from the persisted serial.
    let mut restored = restored;
    restored.append_names(["丁"]);
    let ids: HashSet<&str> = restored.entries().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids.len(), 4);
}

#[test]
fn snapshot_version_mismatch_is_rejected() {
    let mut roster = Roster::new(9);
    roster.append_names(["A"]);
    let mut snapshot = snapshot_roster(&roster);
    snapshot.version = ROSTER_SNAPSHOT_VERSION + 1;
    assert!(restore_roster(&snapshot).is_none());
}

#[test]
fn snapshot_with_duplicate_ids_is_rejected() {
    let snapshot = RosterSnapshot {
        version: ROSTER_SNAPSHOT_VERSION,
        id_seed: 0,
        next_serial: 2,
        entries: vec![
            ParticipantRecord {
                id: "dup".to_string(),
                name: "A".to_string(),
            },
            ParticipantRecord {
                id: "dup".to_string(),
                name: "B".to_string(),
            },
        ],
    };
    assert!(restore_roster(&snapshot).is_none());

    let garbage = decode_snapshot(&[0x00, 0x01, 0x02]);
    assert!(garbage.is_none());
}
