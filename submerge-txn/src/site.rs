use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use submerge_base::Timestamp;

/// A committed version of a data item. Histories are append-only: once a
/// `VersionRecord` is pushed onto `Site::history[item]`, it is never mutated
/// or removed.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct VersionRecord {
    pub value: i64,
    pub commit_timestamp: Timestamp,
    pub tid: String,
}

/// A buffered, not-yet-committed write. Multiple entries may accumulate for
/// the same `(item, tid)` pair; only the latest is used at commit time, and
/// `persist` never prunes older ones.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct UncommittedWrite {
    pub value: i64,
    pub write_timestamp: Timestamp,
    pub tid: String,
}

const T_INIT: &str = "T_init";

/// One of the ten replica sites. Hosts the subset of items the placement
/// rule assigns it, with a committed multi-version history and a buffer of
/// writes awaiting a `persist`.
#[derive(Clone, Debug)]
pub struct Site {
    pub id: u32,
    history: BTreeMap<String, Vec<VersionRecord>>,
    uncommitted: BTreeMap<String, Vec<UncommittedWrite>>,
}

/// Parses the numeric suffix of an item id like `x12` -> `12`. `None` on a
/// malformed item id; every item id actually reaching a `Site` was produced
/// by `SiteRegistry`'s own seeding, which is always well-formed, but this
/// stays fallible rather than panicking to mirror `registry::placement`.
fn item_index(item: &str) -> Option<u32> {
    item.get(1..)?.parse().ok()
}

impl Site {
    /// Builds a site hosting exactly `hosted_items`, each seeded with the
    /// synthetic `T_init` version `(value = 10 * index, timestamp = -1)`.
    pub fn new(id: u32, hosted_items: &[&str]) -> Self {
        let mut history = BTreeMap::new();
        let uncommitted = BTreeMap::new();
        for &item in hosted_items {
            let seed = VersionRecord {
                value: 10 * item_index(item).expect("seeded item ids are always well-formed") as i64,
                commit_timestamp: Timestamp::INIT,
                tid: T_INIT.to_string(),
            };
            history.insert(item.to_string(), vec![seed]);
        }
        Site {
            id,
            history,
            uncommitted,
        }
    }

    pub fn hosts(&self, item: &str) -> bool {
        self.history.contains_key(item)
    }

    /// The newest committed value strictly before `ts`, or `None` if the
    /// item isn't hosted here or has no such version.
    pub fn snapshot_read(&self, item: &str, ts: Timestamp) -> Option<i64> {
        self.history
            .get(item)?
            .iter()
            .rev()
            .find(|v| v.commit_timestamp < ts)
            .map(|v| v.value)
    }

    /// Appends an uncommitted write. Returns `false` without effect if the
    /// item isn't hosted here.
    pub fn buffer_write(&mut self, tid: &str, item: &str, value: i64, write_ts: Timestamp) -> bool {
        if !self.hosts(item) {
            return false;
        }
        self.uncommitted
            .entry(item.to_string())
            .or_default()
            .push(UncommittedWrite {
                value,
                write_timestamp: write_ts,
                tid: tid.to_string(),
            });
        true
    }

    /// For every item hosted here, promotes the latest uncommitted write by
    /// `tid`, if any, into a new committed `VersionRecord` at `commit_ts`.
    /// Uncommitted entries are left in the buffer, inert.
    pub fn persist(&mut self, tid: &str, commit_ts: Timestamp) {
        let items: Vec<String> = self.history.keys().cloned().collect();
        for item in items {
            let Some(writes) = self.uncommitted.get(&item) else {
                continue;
            };
            let Some(latest) = writes.iter().rev().find(|w| w.tid == tid) else {
                continue;
            };
            let record = VersionRecord {
                value: latest.value,
                commit_timestamp: commit_ts,
                tid: tid.to_string(),
            };
            self.history.get_mut(&item).unwrap().push(record);
        }
    }

    /// Every committed `VersionRecord` for `item` in the order they were
    /// appended. Used by `SiteRegistry::previously_running_sites` and by the
    /// first-committer-wins check.
    pub fn committed_history(&self, item: &str) -> &[VersionRecord] {
        self.history
            .get(item)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// `site {id} - x1: v1, x2: v2, ...` in ascending item index order,
    /// listing the latest committed value of every hosted item.
    pub fn dump(&self) -> String {
        let mut items: Vec<&String> = self.history.keys().collect();
        items.sort_by_key(|item| item_index(item).expect("hosted item ids are always well-formed"));
        let body: Vec<String> = items
            .into_iter()
            .map(|item| {
                let value = self.history[item].last().unwrap().value;
                format!("{item}: {value}")
            })
            .collect();
        format!("site {} - {}", self.id, body.join(", "))
    }
}
