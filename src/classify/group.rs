use std::fmt;

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::Serialize;

use super::epoch::ArrayEpoch;
use super::participation::TelescopeParticipation;
use super::season::AtmosphereSeason;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum RunCategory {
    Science,
    Filter,
    ReducedHv,
    Other(String),
}

impl RunCategory {
    /// Maps the observatory `run_type` column (or a plain tag) to a category.
    pub fn from_run_type(run_type: &str) -> Self {
        let trimmed = run_type.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" | "observing" | "science" => Self::Science,
            "obsfilter" | "filter" => Self::Filter,
            "obslowhv" | "reducedhv" => Self::ReducedHv,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Science => "science",
            Self::Filter => "filter",
            Self::ReducedHv => "reducedhv",
            Self::Other(value) => value,
        }
    }
}

impl fmt::Display for RunCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<RunCategory> for String {
    fn from(value: RunCategory) -> Self {
        value.label().to_string()
    }
}

/// Everything that has to match for runs to share one effective area.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub epoch: ArrayEpoch,
    pub season: AtmosphereSeason,
    pub participation: TelescopeParticipation,
    pub category: RunCategory,
}

impl GroupKey {
    pub fn build(
        epoch: ArrayEpoch,
        season: AtmosphereSeason,
        participation: TelescopeParticipation,
        category: RunCategory,
    ) -> Self {
        Self {
            epoch,
            season,
            participation,
            category,
        }
    }

    /// `<epoch>_<season>_<participation>_<category>`, e.g.
    /// `V6_PMTUpgrade_ATM21_1234_science`.
    pub fn label(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.epoch, self.season, self.participation, self.category
        )
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Accumulates members under their key, keeping keys in first-seen order.
#[derive(Debug)]
pub struct RunGrouper<M> {
    groups: IndexMap<GroupKey, Vec<M>>,
}

impl<M> Default for RunGrouper<M> {
    fn default() -> Self {
        Self {
            groups: IndexMap::new(),
        }
    }
}

impl<M> RunGrouper<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: GroupKey, member: M) {
        match self.groups.entry(key) {
            Entry::Occupied(mut entry) => entry.get_mut().push(member),
            Entry::Vacant(entry) => {
                entry.insert(vec![member]);
            }
        }
    }

    pub fn finish(self) -> RunGroups<M> {
        RunGroups {
            groups: self.groups,
        }
    }
}

#[derive(Debug)]
pub struct RunGroups<M> {
    groups: IndexMap<GroupKey, Vec<M>>,
}

impl<M> RunGroups<M> {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn member_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Groups with their stable id (first-seen order).
    pub fn iter(&self) -> impl Iterator<Item = (usize, &GroupKey, &[M])> {
        self.groups
            .iter()
            .enumerate()
            .map(|(group_id, (key, members))| (group_id, key, members.as_slice()))
    }
}

pub fn group<M>(records: impl IntoIterator<Item = (M, GroupKey)>) -> RunGroups<M> {
    let mut grouper = RunGrouper::new();
    for (member, key) in records {
        grouper.insert(key, member);
    }
    grouper.finish()
}
