use crate::payload::FieldKind;
use std::fmt;


/// Default topic prefix for building updates
pub const DEFAULT_PREFIX: &str = "dom/bldg";

/// Terminal segment for the league-wide scoreboard, published directly
/// under the prefix (e.g. "dom/bldg/teams")
const TOTALS_SEGMENT: &str = "teams";

/// Where a feed message should go
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// A single field of one building
    Field { entity_id: String, kind: FieldKind },
    /// The league-wide team totals
    Totals,
}

/// Topic parsing errors
#[derive(Debug, Clone, PartialEq)]
pub enum TopicError {
    /// Empty topic
    Empty,
    /// Topic does not start with the configured prefix
    ForeignPrefix(String),
    /// Entity id segment missing or empty
    MissingEntityId(String),
}

impl fmt::Display for TopicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopicError::Empty => write!(f, "topic is empty"),
            TopicError::ForeignPrefix(topic) => {
                write!(f, "topic '{}' is outside the building namespace", topic)
            }
            TopicError::MissingEntityId(topic) => {
                write!(f, "topic '{}' has no entity id segment", topic)
            }
        }
    }
}

impl std::error::Error for TopicError {}

/// Hierarchical topic convention: `{prefix}/{entity_id}/.../{field}`.
///
/// Segments are separated by `/`. The entity id is the first segment after
/// the prefix and the field kind is the topic's last segment.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicScheme {
    prefix: Vec<String>,
}

impl TopicScheme {
    /// Build a scheme from a `/` separated prefix. Empty segments are dropped,
    /// so "dom/bldg", "/dom/bldg/" and "dom//bldg" are equivalent.
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn prefix(&self) -> String {
        self.prefix.join("/")
    }

    /// Parse a topic into a route.
    ///
    /// Returns `Ok(None)` when the topic is well-formed but its terminal
    /// segment is not a known field; such messages are ignored, not errors.
    ///
    /// # Examples
    ///
    /// ```
    /// use landmark::payload::FieldKind;
    /// use landmark::topic::{Route, TopicScheme};
    ///
    /// let scheme = TopicScheme::default();
    /// let route = scheme.parse("dom/bldg/6/coord").unwrap();
    /// assert_eq!(
    ///     route,
    ///     Some(Route::Field { entity_id: "6".to_string(), kind: FieldKind::Location })
    /// );
    ///
    /// assert_eq!(scheme.parse("dom/bldg/6/photo").unwrap(), None);
    /// ```
    pub fn parse(&self, topic: &str) -> Result<Option<Route>, TopicError> {
        if topic.is_empty() {
            return Err(TopicError::Empty);
        }

        let segments: Vec<&str> = topic.split('/').collect();

        if segments.len() < self.prefix.len()
            || segments
                .iter()
                .zip(&self.prefix)
                .any(|(segment, expected)| segment != expected)
        {
            return Err(TopicError::ForeignPrefix(topic.to_string()));
        }

        let rest = &segments[self.prefix.len()..];

        match rest {
            [] => Err(TopicError::MissingEntityId(topic.to_string())),
            [only] if *only == TOTALS_SEGMENT => Ok(Some(Route::Totals)),
            // Prefix plus one segment: no room for both an id and a field
            [_] => Ok(None),
            [entity_id, .., field] => {
                if entity_id.is_empty() {
                    return Err(TopicError::MissingEntityId(topic.to_string()));
                }
                Ok(FieldKind::from_segment(field).map(|kind| Route::Field {
                    entity_id: entity_id.to_string(),
                    kind,
                }))
            }
        }
    }

    /// Topic for a building field, inverse of [`TopicScheme::parse`]
    pub fn field_topic(&self, entity_id: &str, kind: FieldKind) -> String {
        let mut segments = self.prefix.clone();
        segments.push(entity_id.to_string());
        segments.push(kind.segment().to_string());
        segments.join("/")
    }
}

impl Default for TopicScheme {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}
