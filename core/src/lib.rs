pub mod export;
pub mod grouping;
pub mod raffle;
pub mod rng;
pub mod roster;
pub mod snapshot;

pub use export::{groups_csv, GROUP_CSV_HEADER};
pub use grouping::{default_group_name, partition_roster, Group, GroupBoard, GroupError};
pub use raffle::{
    DrawError, DrawMode, RaffleEngine, SpinPhase, DISPLAY_PLACEHOLDER, SPIN_DURATION_MS,
    SPIN_TICK_MS,
};
pub use rng::SplitMix64;
pub use roster::{parse_names_text, Participant, Roster, SAMPLE_NAMES};
pub use snapshot::{
    decode_snapshot, encode_snapshot, restore_roster, snapshot_roster, RosterSnapshot,
    ROSTER_SNAPSHOT_VERSION,
};
