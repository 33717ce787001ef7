// Render-ready, index-aligned view of the store

use crate::payload::Scoreboard;
use crate::state::EntityRecord;
use serde::Serialize;


/// Flat projection consumed by the map layer.
///
/// Every sequence has the same length and index `i` describes the same
/// building across all of them. Only buildings with a valid location are
/// included. Rows are sorted by building id, so the order is stable within
/// one projection; indices are not stable across projections.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Projection {
    pub ids: Vec<String>,
    /// `[lat, lng]` as published
    pub coordinates: Vec<[f64; 2]>,
    /// `#rrggbb`, default color when none has arrived
    pub colors: Vec<String>,
    /// `null` when unnamed
    pub names: Vec<Option<String>>,
    pub teams: Vec<Scoreboard>,
    pub users: Vec<Scoreboard>,
}

/// One row of a [`Projection`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectedEntity<'a> {
    pub id: &'a str,
    pub coordinate: [f64; 2],
    pub color: &'a str,
    pub name: Option<&'a str>,
    pub teams: &'a Scoreboard,
    pub users: &'a Scoreboard,
}

impl Projection {
    /// Build a projection from records, dropping those without a valid location
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a EntityRecord>,
    {
        let mut rows: Vec<&EntityRecord> = records
            .into_iter()
            .filter(|record| record.renderable_location().is_some())
            .collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));

        let mut projection = Projection::with_capacity(rows.len());
        for record in rows {
            let Some(location) = record.renderable_location() else {
                continue;
            };
            projection.ids.push(record.id.clone());
            projection.coordinates.push(location.lat_lng());
            projection.colors.push(record.color_or_default().to_hex());
            projection.names.push(record.display_name.clone());
            projection.teams.push(record.team_scores.clone());
            projection.users.push(record.user_scores.clone());
        }

        projection
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
            coordinates: Vec::with_capacity(capacity),
            colors: Vec::with_capacity(capacity),
            names: Vec::with_capacity(capacity),
            teams: Vec::with_capacity(capacity),
            users: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Row at `index`
    pub fn get(&self, index: usize) -> Option<ProjectedEntity<'_>> {
        Some(ProjectedEntity {
            id: self.ids.get(index)?,
            coordinate: *self.coordinates.get(index)?,
            color: self.colors.get(index)?,
            name: self.names.get(index)?.as_deref(),
            teams: self.teams.get(index)?,
            users: self.users.get(index)?,
        })
    }

    /// Index of a building within this projection
    pub fn position(&self, entity_id: &str) -> Option<usize> {
        self.ids.iter().position(|id| id == entity_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = ProjectedEntity<'_>> {
        (0..self.len()).filter_map(move |index| self.get(index))
    }

    /// Coordinates flipped to `[lng, lat]` for map widgets that expect it
    pub fn coordinates_lng_lat(&self) -> Vec<[f64; 2]> {
        self.coordinates.iter().map(|[lat, lng]| [*lng, *lat]).collect()
    }
}
