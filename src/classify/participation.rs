use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::ClassifyError;

pub const SLOT_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    Participating,
    Absent,
    Ambiguous,
}

/// Which of the four telescopes (T1..T4, in that order) contributed to a run.
///
/// The canonical token writes one character per slot: the telescope number
/// when participating, `-` when absent and `x` when the two reporting sources
/// disagree, e.g. `1-34` or `12x4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TelescopeParticipation([SlotState; SLOT_COUNT]);

impl TelescopeParticipation {
    pub const ALL_PRESENT: Self = Self([SlotState::Participating; SLOT_COUNT]);

    pub fn new(slots: [SlotState; SLOT_COUNT]) -> Self {
        Self(slots)
    }

    pub fn slots(&self) -> [SlotState; SLOT_COUNT] {
        self.0
    }

    pub fn is_all_present(&self) -> bool {
        *self == Self::ALL_PRESENT
    }

    pub fn has_ambiguous(&self) -> bool {
        self.0.iter().any(|slot| *slot == SlotState::Ambiguous)
    }

    pub fn token(&self) -> String {
        self.0
            .iter()
            .enumerate()
            .map(|(index, slot)| match slot {
                SlotState::Participating => char::from(b'1' + index as u8),
                SlotState::Absent => '-',
                SlotState::Ambiguous => 'x',
            })
            .collect()
    }

    pub fn parse_token(token: &str) -> Result<Self, ClassifyError> {
        let characters = token.chars().collect::<Vec<char>>();
        if characters.len() != SLOT_COUNT {
            return Err(ClassifyError::InvalidParticipationToken(token.to_string()));
        }

        let mut slots = [SlotState::Absent; SLOT_COUNT];
        for (index, character) in characters.into_iter().enumerate() {
            let own_number = char::from(b'1' + index as u8);
            slots[index] = match character {
                '-' => SlotState::Absent,
                'x' => SlotState::Ambiguous,
                value if value == own_number => SlotState::Participating,
                _ => return Err(ClassifyError::InvalidParticipationToken(token.to_string())),
            };
        }

        Ok(Self(slots))
    }
}

impl fmt::Display for TelescopeParticipation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

impl TryFrom<String> for TelescopeParticipation {
    type Error = ClassifyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_token(&value)
    }
}

impl From<TelescopeParticipation> for String {
    fn from(value: TelescopeParticipation) -> Self {
        value.token()
    }
}

/// Observer-reported config mask (0..=15) to participation, tabulated entry by
/// entry rather than derived from bit positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigMaskTable(Vec<TelescopeParticipation>);

impl ConfigMaskTable {
    pub const ENTRY_COUNT: usize = 16;

    /// Mask 0 means "no telescope reported", distinct from mask 15.
    pub fn standard() -> Self {
        Self(tokens_to_entries(&[
            "----", "1---", "-2--", "12--", "--3-", "1-3-", "-23-", "123-", "---4", "1--4",
            "-2-4", "12-4", "--34", "1-34", "-234", "1234",
        ]))
    }

    /// Older runlist revisions treated mask 0 as a full array. Kept for
    /// reproducing runlists produced with that convention.
    pub fn legacy_aliased() -> Self {
        Self::standard().with_zero_as_full_array()
    }

    /// Applies the legacy mask-0 convention to an existing table.
    pub fn with_zero_as_full_array(mut self) -> Self {
        if let Some(entry) = self.0.first_mut() {
            *entry = TelescopeParticipation::ALL_PRESENT;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ClassifyError> {
        if self.0.len() != Self::ENTRY_COUNT {
            return Err(ClassifyError::InvalidConfig(format!(
                "config mask table must have {} entries, found {}",
                Self::ENTRY_COUNT,
                self.0.len()
            )));
        }
        if self.0.iter().any(TelescopeParticipation::has_ambiguous) {
            return Err(ClassifyError::InvalidConfig(
                "config mask table entries cannot contain ambiguous slots".to_string(),
            ));
        }
        Ok(())
    }

    pub fn lookup(&self, config_mask: u8) -> Result<TelescopeParticipation, ClassifyError> {
        self.0
            .get(usize::from(config_mask))
            .copied()
            .ok_or(ClassifyError::ConfigMaskOutOfRange(config_mask))
    }
}

fn tokens_to_entries(tokens: &[&str]) -> Vec<TelescopeParticipation> {
    tokens
        .iter()
        .filter_map(|token| TelescopeParticipation::parse_token(token).ok())
        .collect()
}

/// DQM cut-mask values under which each telescope slot still counts as
/// participating. The sets overlap and are not complements of each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CutMaskReference([Vec<String>; SLOT_COUNT]);

impl CutMaskReference {
    pub fn standard() -> Self {
        let set = |values: &[&str]| {
            values
                .iter()
                .map(|value| value.to_string())
                .collect::<Vec<String>>()
        };
        Self([
            set(&["1", "2", "3", "4", "5", "6", "7", "NULL", "0"]),
            set(&["1", "2", "3", "8", "9", "10", "11", "NULL", "0"]),
            set(&["1", "4", "5", "8", "9", "12", "13", "NULL", "0"]),
            set(&["2", "4", "6", "8", "10", "12", "14", "NULL", "0"]),
        ])
    }

    pub fn participation_for(&self, cut_mask: &str) -> TelescopeParticipation {
        let cut_mask = cut_mask.trim();
        let mut slots = [SlotState::Absent; SLOT_COUNT];
        for (slot, reference) in slots.iter_mut().zip(self.0.iter()) {
            if reference.iter().any(|value| value == cut_mask) {
                *slot = SlotState::Participating;
            }
        }
        TelescopeParticipation::new(slots)
    }
}

/// What to report for slots where DQM and observer disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReconciliationPolicy {
    #[default]
    MarkAmbiguous,
    PreferDqm,
    PreferObserver,
}

impl ReconciliationPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MarkAmbiguous => "mark-ambiguous",
            Self::PreferDqm => "prefer-dqm",
            Self::PreferObserver => "prefer-observer",
        }
    }

    /// Name of the descriptor whose value survives in disagreeing slots.
    pub fn authority(self) -> &'static str {
        match self {
            Self::MarkAmbiguous => "neither (slots marked ambiguous)",
            Self::PreferDqm => "dqm",
            Self::PreferObserver => "observer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationSource {
    Observer,
    Agreed,
    Reconciled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParticipationMismatch {
    pub dqm: TelescopeParticipation,
    pub observer: TelescopeParticipation,
    pub policy: ReconciliationPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub participation: TelescopeParticipation,
    pub source: ParticipationSource,
    pub mismatch: Option<ParticipationMismatch>,
}

/// Normalizes a raw DQM cut-mask value: SQL NULL, blank, the literal `NULL`
/// and `0` all mean DQM asserted no exclusion for the run.
pub fn normalize_cut_mask(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() || trimmed == "0" || trimmed.eq_ignore_ascii_case("null") {
        return None;
    }
    Some(trimmed.to_string())
}

pub struct TelescopeParticipationResolver<'a> {
    config_masks: &'a ConfigMaskTable,
    cut_reference: &'a CutMaskReference,
    policy: ReconciliationPolicy,
}

impl<'a> TelescopeParticipationResolver<'a> {
    pub fn new(
        config_masks: &'a ConfigMaskTable,
        cut_reference: &'a CutMaskReference,
        policy: ReconciliationPolicy,
    ) -> Self {
        Self {
            config_masks,
            cut_reference,
            policy,
        }
    }

    pub fn resolve(
        &self,
        cut_mask: Option<&str>,
        config_mask: u8,
    ) -> Result<Resolution, ClassifyError> {
        let observer = self.config_masks.lookup(config_mask)?;

        let Some(cut_mask) = normalize_cut_mask(cut_mask) else {
            return Ok(Resolution {
                participation: observer,
                source: ParticipationSource::Observer,
                mismatch: None,
            });
        };

        let dqm = self.cut_reference.participation_for(&cut_mask);
        if dqm == observer {
            return Ok(Resolution {
                participation: dqm,
                source: ParticipationSource::Agreed,
                mismatch: None,
            });
        }

        Ok(Resolution {
            participation: reconcile(dqm, observer, self.policy),
            source: ParticipationSource::Reconciled,
            mismatch: Some(ParticipationMismatch {
                dqm,
                observer,
                policy: self.policy,
            }),
        })
    }
}

pub fn reconcile(
    dqm: TelescopeParticipation,
    observer: TelescopeParticipation,
    policy: ReconciliationPolicy,
) -> TelescopeParticipation {
    match policy {
        ReconciliationPolicy::PreferDqm => dqm,
        ReconciliationPolicy::PreferObserver => observer,
        ReconciliationPolicy::MarkAmbiguous => {
            let dqm_slots = dqm.slots();
            let observer_slots = observer.slots();
            let mut slots = dqm_slots;
            for (index, slot) in slots.iter_mut().enumerate() {
                if dqm_slots[index] != observer_slots[index] {
                    *slot = SlotState::Ambiguous;
                }
            }
            TelescopeParticipation::new(slots)
        }
    }
}
