use crate::payload::{FieldKind, FieldValue, Location, Rgb, Scoreboard};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Latest known state of one building.
///
/// Every field is independent: each holds the value of the most recent
/// accepted update for that field, or its empty default.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntityRecord {
    /// Building identifier taken from the topic (e.g. "6")
    pub id: String,

    pub location: Option<Location>,

    pub color: Option<Rgb>,

    /// `None` until named, or after an empty name; placeholder text is the
    /// renderer's business
    pub display_name: Option<String>,

    pub team_scores: Scoreboard,

    pub user_scores: Scoreboard,
}

impl EntityRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            location: None,
            color: None,
            display_name: None,
            team_scores: Scoreboard::new(),
            user_scores: Scoreboard::new(),
        }
    }

    /// Overwrite exactly the field carried by `value`
    pub fn apply(&mut self, value: FieldValue) {
        match value {
            FieldValue::Location(location) => self.location = Some(location),
            FieldValue::Color(color) => self.color = Some(color),
            FieldValue::DisplayName(name) => self.display_name = name,
            FieldValue::TeamScores(scores) => self.team_scores = scores,
            FieldValue::UserScores(scores) => self.user_scores = scores,
        }
    }

    /// Color to render, falling back to the default when none has arrived
    pub fn color_or_default(&self) -> Rgb {
        self.color.unwrap_or(Rgb::DEFAULT)
    }

    /// Location if present and inside the coordinate bounds
    pub fn renderable_location(&self) -> Option<Location> {
        self.location.filter(Location::in_range)
    }
}

/// Change notification broadcast after an update is merged
#[derive(Clone, Debug, Serialize)]
pub struct FieldUpdate {
    pub entity_id: String,
    pub kind: FieldKind,
    pub value: FieldValue,
    /// True when this update created the record
    pub discovered: bool,
    pub timestamp: DateTime<Utc>,
}

/// Change notification broadcast when the league totals are replaced
#[derive(Clone, Debug, Serialize)]
pub struct TotalsUpdate {
    pub totals: Scoreboard,
    pub timestamp: DateTime<Utc>,
}

/// Notification broadcast after the store is cleared
#[derive(Clone, Debug, Serialize)]
pub struct StoreReset {
    pub entities_cleared: usize,
    pub timestamp: DateTime<Utc>,
}
