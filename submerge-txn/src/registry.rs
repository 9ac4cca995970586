use crate::site::Site;
use crate::transaction::Transaction;
use std::collections::{BTreeMap, BTreeSet};
use submerge_base::Timestamp;

pub const SITE_COUNT: u32 = 10;
pub const ITEM_COUNT: u32 = 20;

/// Up/down bookkeeping for one site, with a full event log.
#[derive(Clone, Debug)]
pub struct SiteStatus {
    pub up: bool,
    pub last_failure_time: Timestamp,
    pub status_log: Vec<(bool, Timestamp)>,
}

impl SiteStatus {
    fn new() -> Self {
        SiteStatus {
            up: true,
            // No failure has occurred yet; INIT sorts below every real
            // timestamp so a never-failed site never spuriously fails
            // Check A.
            last_failure_time: Timestamp::INIT,
            status_log: vec![(true, Timestamp::new(0))],
        }
    }
}

/// Owns all ten `Site`s, their up/down status, and the per-site pending
/// operation queues. The sole mutator of site status and pending state.
pub struct SiteRegistry {
    sites: BTreeMap<u32, Site>,
    status: BTreeMap<u32, SiteStatus>,
    pending_reads: BTreeMap<u32, BTreeSet<(String, String)>>,
    pending_writes: BTreeMap<u32, BTreeSet<(String, String, i64)>>,
}

/// The site ids that *could* host `item`, ignoring up/down status: every
/// site for an even-indexed item, the single site `(i mod 10) + 1` for an
/// odd-indexed item. `None` if `item` isn't a well-formed `x<number>` id —
/// item ids are opaque strings as far as the parser is concerned, so any
/// script can hand one of these in.
pub fn placement(item: &str) -> Option<Vec<u32>> {
    let i: u32 = item.get(1..)?.parse().ok()?;
    Some(if i % 2 == 0 {
        (1..=SITE_COUNT).collect()
    } else {
        vec![(i % 10) + 1]
    })
}

impl SiteRegistry {
    pub fn new() -> Self {
        let mut sites = BTreeMap::new();
        let mut status = BTreeMap::new();
        let mut pending_reads = BTreeMap::new();
        let mut pending_writes = BTreeMap::new();
        for sid in 1..=SITE_COUNT {
            let hosted: Vec<String> = (1..=ITEM_COUNT)
                .map(|i| format!("x{i}"))
                .filter(|item| {
                    placement(item)
                        .expect("seeded item ids are always well-formed")
                        .contains(&sid)
                })
                .collect();
            let hosted_refs: Vec<&str> = hosted.iter().map(String::as_str).collect();
            sites.insert(sid, Site::new(sid, &hosted_refs));
            status.insert(sid, SiteStatus::new());
            pending_reads.insert(sid, BTreeSet::new());
            pending_writes.insert(sid, BTreeSet::new());
        }
        SiteRegistry {
            sites,
            status,
            pending_reads,
            pending_writes,
        }
    }

    pub fn site(&self, sid: u32) -> &Site {
        &self.sites[&sid]
    }

    pub fn site_mut(&mut self, sid: u32) -> &mut Site {
        self.sites.get_mut(&sid).unwrap()
    }

    pub fn is_up(&self, sid: u32) -> bool {
        self.status[&sid].up
    }

    pub fn last_fail_time(&self, sid: u32) -> Timestamp {
        self.status[&sid].last_failure_time
    }

    pub fn status_log(&self, sid: u32) -> &[(bool, Timestamp)] {
        &self.status[&sid].status_log
    }

    pub fn available_sites(&self, item: &str) -> Vec<u32> {
        placement(item)
            .unwrap_or_default()
            .into_iter()
            .filter(|s| self.is_up(*s))
            .collect()
    }

    pub fn fail(&mut self, sid: u32, ts: Timestamp) {
        let status = self.status.get_mut(&sid).unwrap();
        status.up = false;
        status.last_failure_time = ts;
        status.status_log.push((false, ts));
        tracing::info!(site = sid, ts = ts.get(), "site fails");
    }

    pub fn recover(&mut self, sid: u32, ts: Timestamp) {
        let status = self.status.get_mut(&sid).unwrap();
        status.up = true;
        status.status_log.push((true, ts));
        tracing::info!(site = sid, ts = ts.get(), "site recovers");
    }

    /// The available-copies read-ready predicate: sites hosting `item` that
    /// hold a committed version from before `start_time` and have stayed up
    /// continuously from that commit until `start_time`.
    pub fn previously_running_sites(&self, item: &str, start_time: Timestamp) -> Vec<u32> {
        placement(item)
            .unwrap_or_default()
            .into_iter()
            .filter(|&sid| {
                let site = &self.sites[&sid];
                let Some(last_commit) = site
                    .committed_history(item)
                    .iter()
                    .rev()
                    .find(|v| v.commit_timestamp < start_time)
                else {
                    return false;
                };
                let stayed_up = !self.status[&sid].status_log.iter().any(|&(up, t)| {
                    !up && t > last_commit.commit_timestamp && t < start_time
                });
                stayed_up
            })
            .collect()
    }

    pub fn commit(&mut self, transaction: &Transaction, ts: Timestamp) {
        let up_sites: Vec<u32> = (1..=SITE_COUNT).filter(|&s| self.is_up(s)).collect();
        for sid in up_sites {
            self.sites.get_mut(&sid).unwrap().persist(&transaction.id, ts);
        }
    }

    pub fn add_pending_read(&mut self, sid: u32, tid: &str, item: &str) {
        self.pending_reads
            .get_mut(&sid)
            .unwrap()
            .insert((tid.to_string(), item.to_string()));
    }

    pub fn remove_pending_read(&mut self, sid: u32, tid: &str, item: &str) {
        self.pending_reads
            .get_mut(&sid)
            .unwrap()
            .remove(&(tid.to_string(), item.to_string()));
    }

    pub fn add_pending_write(&mut self, sid: u32, tid: &str, item: &str, value: i64) {
        self.pending_writes
            .get_mut(&sid)
            .unwrap()
            .insert((tid.to_string(), item.to_string(), value));
    }

    pub fn remove_pending_write(&mut self, sid: u32, tid: &str, item: &str, value: i64) {
        self.pending_writes
            .get_mut(&sid)
            .unwrap()
            .remove(&(tid.to_string(), item.to_string(), value));
    }

    pub fn pending_reads(&self, sid: u32) -> Vec<(String, String)> {
        self.pending_reads[&sid].iter().cloned().collect()
    }

    pub fn pending_writes(&self, sid: u32) -> Vec<(String, String, i64)> {
        self.pending_writes[&sid].iter().cloned().collect()
    }
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_items_replicated_at_all_sites() {
        assert_eq!(placement("x2"), Some((1..=10).collect::<Vec<_>>()));
        assert_eq!(placement("x20"), Some((1..=10).collect::<Vec<_>>()));
    }

    #[test]
    fn odd_items_live_at_one_site() {
        assert_eq!(placement("x1"), Some(vec![2]));
        assert_eq!(placement("x3"), Some(vec![4]));
        assert_eq!(placement("x11"), Some(vec![2]));
        assert_eq!(placement("x19"), Some(vec![10]));
    }

    #[test]
    fn malformed_item_id_has_no_placement() {
        assert_eq!(placement("foo"), None);
        assert_eq!(placement("x"), None);
        assert_eq!(placement(""), None);
    }

    #[test]
    fn new_registry_seeds_all_sites_up() {
        let reg = SiteRegistry::new();
        for sid in 1..=10 {
            assert!(reg.is_up(sid));
            assert_eq!(reg.status_log(sid), &[(true, Timestamp::new(0))]);
        }
    }

    #[test]
    fn fail_then_recover_updates_status_log() {
        let mut reg = SiteRegistry::new();
        reg.fail(3, Timestamp::new(5));
        assert!(!reg.is_up(3));
        assert_eq!(reg.last_fail_time(3), Timestamp::new(5));
        reg.recover(3, Timestamp::new(9));
        assert!(reg.is_up(3));
        assert_eq!(
            reg.status_log(3),
            &[
                (true, Timestamp::new(0)),
                (false, Timestamp::new(5)),
                (true, Timestamp::new(9)),
            ]
        );
    }

    #[test]
    fn previously_running_sites_excludes_site_down_since_before_start() {
        let mut reg = SiteRegistry::new();
        // x1 lives only at site 2.
        reg.fail(2, Timestamp::new(1));
        assert!(reg
            .previously_running_sites("x1", Timestamp::new(5))
            .is_empty());
    }

    #[test]
    fn previously_running_sites_includes_untouched_site() {
        let reg = SiteRegistry::new();
        assert_eq!(reg.previously_running_sites("x1", Timestamp::new(5)), vec![2]);
    }
}
