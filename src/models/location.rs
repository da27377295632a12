//! Location selector path: state → district → court complex → court.

use serde::{Deserialize, Serialize};

use crate::error::{PortalError, Result};

/// One level of the cascading location selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorLevel {
    State,
    District,
    Complex,
    Court,
}

impl SelectorLevel {
    /// All levels in the order the portal requires them.
    pub const ALL: [SelectorLevel; 4] = [
        SelectorLevel::State,
        SelectorLevel::District,
        SelectorLevel::Complex,
        SelectorLevel::Court,
    ];

    /// Level reached after `depth` levels have been chosen.
    pub fn at_depth(depth: usize) -> Option<Self> {
        Self::ALL.get(depth).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SelectorLevel::State => "state",
            SelectorLevel::District => "district",
            SelectorLevel::Complex => "court complex",
            SelectorLevel::Court => "court",
        }
    }
}

impl std::fmt::Display for SelectorLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A partially or fully chosen location path.
///
/// Levels are filled strictly in order; a district without a state cannot be
/// expressed. Labels are matched exactly against the portal's visible option
/// text, so they are kept as given apart from trimming.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationPath {
    levels: Vec<String>,
}

impl LocationPath {
    /// Empty path (resolves to the list of states).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a path from optional level values, as they arrive from forms.
    ///
    /// Blank values count as absent. A value after an absent level is
    /// rejected: the portal cannot resolve a district without its state.
    pub fn from_optional(
        state: Option<&str>,
        district: Option<&str>,
        complex: Option<&str>,
        court: Option<&str>,
    ) -> Result<Self> {
        let raw = [state, district, complex, court];
        let mut path = Self::new();
        let mut gap: Option<SelectorLevel> = None;

        for (level, value) in SelectorLevel::ALL.iter().zip(raw) {
            match value.map(str::trim).filter(|v| !v.is_empty()) {
                Some(v) => {
                    if let Some(missing) = gap {
                        return Err(PortalError::InvalidRequest(format!(
                            "{} given without {}",
                            level, missing
                        )));
                    }
                    path.levels.push(v.to_string());
                }
                None => {
                    gap.get_or_insert(*level);
                }
            }
        }

        Ok(path)
    }

    /// Append the next level.
    pub fn push(mut self, label: impl Into<String>) -> Result<Self> {
        if self.levels.len() >= SelectorLevel::ALL.len() {
            return Err(PortalError::InvalidRequest(
                "location path already names a court".to_string(),
            ));
        }
        self.levels.push(label.into().trim().to_string());
        Ok(self)
    }

    /// Chosen levels paired with their selector level.
    pub fn chosen(&self) -> impl Iterator<Item = (SelectorLevel, &str)> {
        SelectorLevel::ALL
            .iter()
            .copied()
            .zip(self.levels.iter().map(String::as_str))
    }

    /// The level whose options this path resolves to, or `None` when complete.
    pub fn next_level(&self) -> Option<SelectorLevel> {
        SelectorLevel::at_depth(self.levels.len())
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn is_complete(&self) -> bool {
        self.next_level().is_none()
    }

    pub fn get(&self, level: SelectorLevel) -> Option<&str> {
        self.chosen()
            .find(|(l, _)| *l == level)
            .map(|(_, label)| label)
    }

    pub fn state(&self) -> Option<&str> {
        self.get(SelectorLevel::State)
    }

    pub fn district(&self) -> Option<&str> {
        self.get(SelectorLevel::District)
    }

    pub fn complex(&self) -> Option<&str> {
        self.get(SelectorLevel::Complex)
    }

    pub fn court(&self) -> Option<&str> {
        self.get(SelectorLevel::Court)
    }
}
