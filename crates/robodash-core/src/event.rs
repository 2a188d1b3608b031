// ── Event classification ──
//
// Turns free-text robot notifications into a set of event tags. The robot
// embeds markers such as `event:auto_mode` anywhere in its payload text;
// matching is case-insensitive substring containment against one table.

use std::fmt;

use robodash_api::NotificationMessage;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// A normalized event derived from notification text.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum EventTag {
    AutoMode,
    ManualMode,
    HeadlightsOn,
    HeadlightsOff,
    ObstacleDetected,
}

/// Marker → tag table. Row order is the order tags are applied in.
const MARKERS: [(&str, EventTag); 5] = [
    ("event:auto_mode", EventTag::AutoMode),
    ("event:manual_mode", EventTag::ManualMode),
    ("event:headlights_on", EventTag::HeadlightsOn),
    ("event:headlights_off", EventTag::HeadlightsOff),
    ("event:obstacle_detected", EventTag::ObstacleDetected),
];

impl EventTag {
    /// Every tag, in table order.
    pub const ALL: [EventTag; 5] = [
        EventTag::AutoMode,
        EventTag::ManualMode,
        EventTag::HeadlightsOn,
        EventTag::HeadlightsOff,
        EventTag::ObstacleDetected,
    ];

    /// The lower-case marker the robot embeds for this tag.
    pub fn marker(self) -> &'static str {
        MARKERS
            .iter()
            .find(|(_, tag)| *tag == self)
            .map_or("", |(marker, _)| marker)
    }

    /// Inverse of [`marker`](Self::marker), ignoring case.
    pub fn from_marker(marker: &str) -> Option<Self> {
        MARKERS
            .iter()
            .find(|(m, _)| m.eq_ignore_ascii_case(marker.trim()))
            .map(|(_, tag)| *tag)
    }

    fn bit(self) -> u8 {
        match self {
            Self::AutoMode => 1,
            Self::ManualMode => 1 << 1,
            Self::HeadlightsOn => 1 << 2,
            Self::HeadlightsOff => 1 << 3,
            Self::ObstacleDetected => 1 << 4,
        }
    }
}

/// Set of tags matched by one message.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EventTags(u8);

impl EventTags {
    pub const EMPTY: EventTags = EventTags(0);

    pub fn insert(&mut self, tag: EventTag) {
        self.0 |= tag.bit();
    }

    pub fn contains(self, tag: EventTag) -> bool {
        self.0 & tag.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.iter().count()
    }

    /// Tags in table order.
    pub fn iter(self) -> impl Iterator<Item = EventTag> {
        EventTag::ALL.into_iter().filter(move |t| self.contains(*t))
    }
}

impl From<EventTag> for EventTags {
    fn from(tag: EventTag) -> Self {
        Self(tag.bit())
    }
}

impl FromIterator<EventTag> for EventTags {
    fn from_iter<I: IntoIterator<Item = EventTag>>(iter: I) -> Self {
        let mut tags = Self::EMPTY;
        for tag in iter {
            tags.insert(tag);
        }
        tags
    }
}

impl fmt::Debug for EventTags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Serialize for EventTags {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// Classify a notification by its `text` field.
pub fn classify(message: &NotificationMessage) -> EventTags {
    classify_text(message.text())
}

/// Classify raw notification text. Unknown text yields the empty set.
pub fn classify_text(text: &str) -> EventTags {
    let lowered = text.to_lowercase();
    MARKERS
        .iter()
        .filter(|(marker, _)| lowered.contains(marker))
        .map(|(_, tag)| *tag)
        .collect()
}
