//! Record identifiers.
//!
//! Ids are short BLAKE3 digests of the creation instant, a process-local
//! sequence number and the entity kind, prefixed by kind: `p-`, `s-`, `t-`
//! or `a-` (activity log entry).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

/// Hex characters kept from the digest.
const ID_HEX_LEN: usize = 12;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Which collection an id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Project,
    UserStory,
    Task,
    ActivityEntry,
}

impl EntityKind {
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Project => "p",
            Self::UserStory => "s",
            Self::Task => "t",
            Self::ActivityEntry => "a",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::UserStory => "user story",
            Self::Task => "task",
            Self::ActivityEntry => "activity log entry",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generate a fresh id for `kind`, seeded by `now`.
#[must_use]
pub fn new_id(kind: EntityKind, now: DateTime<Utc>) -> String {
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);

    let mut hasher = blake3::Hasher::new();
    hasher.update(kind.prefix().as_bytes());
    hasher.update(&now.timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
    hasher.update(&seq.to_le_bytes());
    hasher.update(&std::process::id().to_le_bytes());

    let hex = hasher.finalize().to_hex();
    format!("{}-{}", kind.prefix(), &hex[..ID_HEX_LEN])
}

#[cfg(test)]
mod tests {
    use super::{EntityKind, ID_HEX_LEN, new_id};
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;

    #[test]
    fn ids_carry_kind_prefix() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(new_id(EntityKind::Project, now).starts_with("p-"));
        assert!(new_id(EntityKind::UserStory, now).starts_with("s-"));
        assert!(new_id(EntityKind::Task, now).starts_with("t-"));
        assert!(new_id(EntityKind::ActivityEntry, now).starts_with("a-"));
        assert_eq!(new_id(EntityKind::Task, now).len(), 2 + ID_HEX_LEN);
    }

    #[test]
    fn same_instant_still_yields_distinct_ids() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let ids: HashSet<String> = (0..500).map(|_| new_id(EntityKind::Task, now)).collect();
        assert_eq!(ids.len(), 500);
    }
}
