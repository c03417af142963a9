// src/types.rs

//! Event kinds and the small value types shared by every layer.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

/// The fixed set of directory event categories.
///
/// `Overflow` means the watch service lost events for a directory; its
/// relative path is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Create,
    Modify,
    Delete,
    Overflow,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::Create,
        EventKind::Modify,
        EventKind::Delete,
        EventKind::Overflow,
    ];

    fn bit(self) -> u8 {
        match self {
            EventKind::Create => 0b0001,
            EventKind::Modify => 0b0010,
            EventKind::Delete => 0b0100,
            EventKind::Overflow => 0b1000,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::Create => "create",
            EventKind::Modify => "modify",
            EventKind::Delete => "delete",
            EventKind::Overflow => "overflow",
        };
        f.write_str(s)
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "create" => Ok(EventKind::Create),
            "modify" => Ok(EventKind::Modify),
            "delete" => Ok(EventKind::Delete),
            "overflow" => Ok(EventKind::Overflow),
            other => Err(format!(
                "invalid event kind: {other} (expected create, modify, delete or overflow)"
            )),
        }
    }
}

/// A set of [`EventKind`]s, stored as a bitmask.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KindSet(u8);

impl KindSet {
    pub const EMPTY: KindSet = KindSet(0);
    pub const ALL: KindSet = KindSet(0b1111);

    pub fn of(kinds: &[EventKind]) -> Self {
        kinds.iter().copied().collect()
    }

    pub fn contains(self, kind: EventKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn with(self, kind: EventKind) -> Self {
        KindSet(self.0 | kind.bit())
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = EventKind> {
        EventKind::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

impl From<EventKind> for KindSet {
    fn from(kind: EventKind) -> Self {
        KindSet::EMPTY.with(kind)
    }
}

impl<const N: usize> From<[EventKind; N]> for KindSet {
    fn from(kinds: [EventKind; N]) -> Self {
        kinds.into_iter().collect()
    }
}

impl FromIterator<EventKind> for KindSet {
    fn from_iter<I: IntoIterator<Item = EventKind>>(iter: I) -> Self {
        iter.into_iter().fold(KindSet::EMPTY, KindSet::with)
    }
}

impl fmt::Debug for KindSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// One drained event: a path relative to the watched directory and its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub relative_path: PathBuf,
    pub kind: EventKind,
}

impl WatchEvent {
    pub fn new(relative_path: impl Into<PathBuf>, kind: EventKind) -> Self {
        Self {
            relative_path: relative_path.into(),
            kind,
        }
    }

    pub fn overflow() -> Self {
        Self::new(PathBuf::new(), EventKind::Overflow)
    }
}
