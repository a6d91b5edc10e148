use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Behaviour when the debounce timer fires while a rebuild is already in
/// flight.
///
/// - `Drop`: discard the trigger. The files it represents are still on disk,
///   so the next real change picks them up (default behaviour).
/// - `Queue`: remember that another cycle is wanted and run exactly one more
///   once the current cycle finishes, no matter how many triggers arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TriggerWhileBuildingBehaviour {
    #[default]
    Drop,
    Queue,
}

impl FromStr for TriggerWhileBuildingBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drop" => Ok(TriggerWhileBuildingBehaviour::Drop),
            "queue" => Ok(TriggerWhileBuildingBehaviour::Queue),
            other => Err(format!(
                "invalid triggered_while_building: {other} (expected \"drop\" or \"queue\")"
            )),
        }
    }
}

/// Kind of a filesystem change, collapsed from the richer `notify` event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
    Renamed,
}

impl ChangeKind {
    /// Whether this kind of change can alter the directory structure and
    /// therefore invalidate the registered watch set.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            ChangeKind::Created | ChangeKind::Removed | ChangeKind::Renamed
        )
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeKind::Created => "created",
            ChangeKind::Modified => "modified",
            ChangeKind::Removed => "removed",
            ChangeKind::Renamed => "renamed",
        };
        f.write_str(s)
    }
}

/// A single filesystem change reported by the notification layer.
///
/// Transient: produced by the watcher, consumed once by the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: std::path::PathBuf,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(path: impl Into<std::path::PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}
