use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

mod validation;
#[cfg(test)]
mod tests;

pub use validation::{validate, validate_scores, validate_value, ValidationError};

/// Attribute of a building carried by a single feed message.
///
/// The set is closed: topics whose terminal segment does not map to one of
/// these variants never reach the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Location,
    Color,
    DisplayName,
    TeamScores,
    UserScores,
}

impl FieldKind {
    pub const ALL: [FieldKind; 5] = [
        FieldKind::Location,
        FieldKind::Color,
        FieldKind::DisplayName,
        FieldKind::TeamScores,
        FieldKind::UserScores,
    ];

    /// Map a topic's terminal segment to a field kind
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "coord" => Some(FieldKind::Location),
            "color" => Some(FieldKind::Color),
            "name" => Some(FieldKind::DisplayName),
            "teams" => Some(FieldKind::TeamScores),
            "users" => Some(FieldKind::UserScores),
            _ => None,
        }
    }

    /// Topic segment used on the wire for this field
    pub fn segment(&self) -> &'static str {
        match self {
            FieldKind::Location => "coord",
            FieldKind::Color => "color",
            FieldKind::DisplayName => "name",
            FieldKind::TeamScores => "teams",
            FieldKind::UserScores => "users",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

/// Geographic position as published: (latitude, longitude).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const LAT_RANGE: (f64, f64) = (-90.0, 90.0);
    pub const LNG_RANGE: (f64, f64) = (-180.0, 180.0);

    pub fn in_range(&self) -> bool {
        (Self::LAT_RANGE.0..=Self::LAT_RANGE.1).contains(&self.lat)
            && (Self::LNG_RANGE.0..=Self::LNG_RANGE.1).contains(&self.lng)
    }

    /// Pair in published order, `[lat, lng]`
    pub fn lat_lng(&self) -> [f64; 2] {
        [self.lat, self.lng]
    }

    /// Pair flipped for map widgets that expect `[lng, lat]`
    pub fn lng_lat(&self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

/// 8-bit RGB color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Color used by the rendering layer when a building has none yet.
    pub const DEFAULT: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS hex form, e.g. `#ff0000`
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Name → score mapping. Always replaced as a whole, never merged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scoreboard(BTreeMap<String, f64>);

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, score)| (name.as_str(), *score))
    }

    /// Entries ordered by score, highest first; ties by name.
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut entries: Vec<(&str, f64)> = self.iter().collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Scoreboard {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// A validated field value, tagged by the field it belongs to.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Location(Location),
    Color(Rgb),
    DisplayName(Option<String>),
    TeamScores(Scoreboard),
    UserScores(Scoreboard),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Location(_) => FieldKind::Location,
            FieldValue::Color(_) => FieldKind::Color,
            FieldValue::DisplayName(_) => FieldKind::DisplayName,
            FieldValue::TeamScores(_) => FieldKind::TeamScores,
            FieldValue::UserScores(_) => FieldKind::UserScores,
        }
    }
}
