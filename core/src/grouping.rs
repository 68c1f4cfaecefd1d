use std::fmt;

use crate::rng::SplitMix64;
use crate::roster::Participant;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupError {
    InvalidSize { size: usize, roster_len: usize },
}

impl fmt::Display for GroupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupError::InvalidSize { size, roster_len } => {
                write!(f, "group size {size} outside 1..={roster_len}")
            }
        }
    }
}

impl std::error::Error for GroupError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub id: usize,
    pub name: String,
    pub members: Vec<Participant>,
}

pub fn default_group_name(id: usize) -> String {
    format!("Group {}", id + 1)
}

// Uniform shuffle, then consecutive chunks of `size`; the last chunk holds
// the remainder and is never split further.
pub fn partition_roster(
    roster: &[Participant],
    size: usize,
    rng: &mut SplitMix64,
) -> Result<Vec<Group>, GroupError> {
    if size == 0 || size > roster.len() {
        return Err(GroupError::InvalidSize {
            size,
            roster_len: roster.len(),
        });
    }
    let mut shuffled = roster.to_vec();
    rng.shuffle(&mut shuffled);
    Ok(shuffled
        .chunks(size)
        .enumerate()
        .map(|(id, chunk)| Group {
            id,
            name: default_group_name(id),
            members: chunk.to_vec(),
        })
        .collect())
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct GroupBoard {
    generation: u64,
    groups: Vec<Group>,
}

impl GroupBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    // Membership is finalized here, before any naming call is attempted.
    // The returned generation tags the naming request that may follow.
    pub fn regenerate(
        &mut self,
        roster: &[Participant],
        size: usize,
        rng: &mut SplitMix64,
    ) -> Result<u64, GroupError> {
        let groups = partition_roster(roster, size, rng)?;
        self.generation += 1;
        self.groups = groups;
        Ok(self.generation)
    }

    // Positional application of service names. A response tagged with a
    // stale generation is discarded; indices past the sequence and blank
    // names keep their defaults.
    pub fn apply_names(&mut self, generation: u64, names: &[String]) -> bool {
        if generation != self.generation {
            return false;
        }
        for (group, name) in self.groups.iter_mut().zip(names) {
            let trimmed = name.trim();
            if !trimmed.is_empty() {
                group.name = trimmed.to_string();
            }
        }
        true
    }
}
