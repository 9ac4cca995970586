use crate::graph::{EdgeLabel, Graph};
use crate::registry::{placement, SiteRegistry};
use crate::transaction::{AbortKind, Operation, Transaction, TransactionStatus};
use std::collections::BTreeMap;
use submerge_base::Timestamp;

/// Outcome of a `read()` call, used by the dispatcher to decide what to
/// render and whether a value is available.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReadOutcome {
    Value { item: String, value: i64 },
    Pending,
    Aborted(AbortKind),
    Error(AbortKind),
}

/// Outcome of a `write()` call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WriteOutcome {
    Written { item: String, value: i64, sites: Vec<u32> },
    Pending,
    Error(AbortKind),
}

/// Outcome of an `end()` call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EndOutcome {
    Committed,
    Aborted(AbortKind),
    Error(AbortKind),
}

/// The coordinator: owns the transaction table and the labeled
/// serialization graph, and drives the full transaction lifecycle.
pub struct TransactionManager {
    transactions: BTreeMap<String, Transaction>,
    graph: Graph,
}

impl TransactionManager {
    pub fn new() -> Self {
        TransactionManager {
            transactions: BTreeMap::new(),
            graph: Graph::new(),
        }
    }

    pub fn transaction(&self, tid: &str) -> Option<&Transaction> {
        self.transactions.get(tid)
    }

    /// `None` if `tid` is unknown or not ACTIVE; used by every operation's
    /// first validity check.
    fn require_active(&self, tid: &str) -> Result<&Transaction, AbortKind> {
        match self.transactions.get(tid) {
            None => Err(AbortKind::UnknownTransaction),
            Some(t) if !t.is_active() => Err(AbortKind::InactiveTransaction),
            Some(t) => Ok(t),
        }
    }

    pub fn begin(&mut self, tid: &str, ts: Timestamp) -> Result<(), AbortKind> {
        if self.transactions.contains_key(tid) {
            tracing::warn!(tid, "begin on already-known transaction");
            return Err(AbortKind::UnknownTransaction);
        }
        self.transactions
            .insert(tid.to_string(), Transaction::new(tid, ts));
        self.graph.add_node(tid);
        Ok(())
    }

    pub fn read(
        &mut self,
        registry: &mut SiteRegistry,
        tid: &str,
        item: &str,
        ts: Timestamp,
        is_retry: bool,
    ) -> ReadOutcome {
        let start_time = match self.require_active(tid) {
            Ok(t) => t.start_time,
            Err(kind) => return ReadOutcome::Error(kind),
        };

        if placement(item).is_none() {
            return ReadOutcome::Error(AbortKind::UnhostedItem);
        }

        let prs = registry.previously_running_sites(item, start_time);
        if prs.is_empty() {
            self.transactions.get_mut(tid).unwrap().status = TransactionStatus::Aborted;
            return ReadOutcome::Aborted(AbortKind::ImpossibleRead);
        }

        let available: std::collections::BTreeSet<u32> =
            registry.available_sites(item).into_iter().collect();
        let ready: Vec<u32> = prs
            .iter()
            .copied()
            .filter(|s| available.contains(s))
            .collect();

        if ready.is_empty() {
            for &s in &prs {
                registry.add_pending_read(s, tid, item);
            }
            return ReadOutcome::Pending;
        }

        let value = ready
            .iter()
            .find_map(|&s| registry.site(s).snapshot_read(item, start_time).map(|v| (s, v)));

        let Some((site, value)) = value else {
            // Every read-ready site nonetheless failed to produce a value;
            // this cannot happen given `previously_running_sites`'s
            // definition, but treat it the same as "nothing to serve".
            for &s in &prs {
                registry.add_pending_read(s, tid, item);
            }
            return ReadOutcome::Pending;
        };

        let txn = self.transactions.get_mut(tid).unwrap();
        txn.reads.insert(item.to_string());
        txn.sites_accessed.push((site, Operation::Read, ts));

        if is_retry {
            for &s in &ready {
                registry.remove_pending_read(s, tid, item);
            }
        }

        ReadOutcome::Value {
            item: item.to_string(),
            value,
        }
    }

    pub fn write(
        &mut self,
        registry: &mut SiteRegistry,
        tid: &str,
        item: &str,
        value: i64,
        ts: Timestamp,
        is_retry: bool,
    ) -> WriteOutcome {
        if let Err(kind) = self.require_active(tid) {
            return WriteOutcome::Error(kind);
        }

        let Some(sites) = placement(item) else {
            return WriteOutcome::Error(AbortKind::UnhostedItem);
        };

        {
            let txn = self.transactions.get_mut(tid).unwrap();
            txn.is_read_only = false;
        }

        let avail = registry.available_sites(item);
        if avail.is_empty() {
            for s in sites {
                registry.add_pending_write(s, tid, item, value);
            }
            return WriteOutcome::Pending;
        }

        let mut touched = Vec::new();
        for &s in &avail {
            if registry.site_mut(s).buffer_write(tid, item, value, ts) {
                touched.push(s);
            }
        }

        let txn = self.transactions.get_mut(tid).unwrap();
        for &s in &touched {
            txn.sites_accessed.push((s, Operation::Write, ts));
        }
        txn.writes.insert(item.to_string());

        if is_retry {
            for s in sites {
                registry.remove_pending_write(s, tid, item, value);
            }
        }

        WriteOutcome::Written {
            item: item.to_string(),
            value,
            sites: touched,
        }
    }

    /// Check A: for a read-write transaction, every site it touched must
    /// have stayed up continuously from the moment of contact until now.
    fn check_available_copies(&self, txn: &Transaction, registry: &SiteRegistry) -> bool {
        if txn.is_read_only {
            return true;
        }
        !txn
            .sites_accessed
            .iter()
            .any(|&(s, _, t)| registry.last_fail_time(s) > t)
    }

    /// Check B, resolved per the Open Question in §9: scans committed
    /// history, not the uncommitted buffer.
    fn check_first_committer_wins(
        &self,
        txn: &Transaction,
        registry: &SiteRegistry,
        now: Timestamp,
    ) -> bool {
        if txn.is_read_only {
            return true;
        }
        for item in &txn.writes {
            for s in registry.available_sites(item) {
                let clashes = registry.site(s).committed_history(item).iter().any(|v| {
                    v.tid != txn.id && v.commit_timestamp > txn.start_time && v.commit_timestamp <= now
                });
                if clashes {
                    return false;
                }
            }
        }
        true
    }

    /// Adds one batch of same-label edges at `end(t_prime, ts_end)`, then
    /// reports whether the graph now has a dangerous structure.
    fn add_edges_and_check(
        &mut self,
        t_prime: &str,
        ts_end: Timestamp,
        label: EdgeLabel,
    ) -> bool {
        let prime = self.transactions[t_prime].clone();
        let others: Vec<Transaction> = self
            .transactions
            .values()
            .filter(|t| t.id != t_prime)
            .cloned()
            .collect();

        for t in &others {
            let add = match label {
                EdgeLabel::Ww => {
                    t.status == TransactionStatus::Committed
                        && t.commit_time < prime.start_time
                        && !t.writes.is_disjoint(&prime.writes)
                }
                EdgeLabel::Wr => {
                    t.status == TransactionStatus::Committed
                        && t.commit_time < prime.start_time
                        && !t.writes.is_disjoint(&prime.reads)
                }
                EdgeLabel::Rw => {
                    t.start_time < ts_end && !t.reads.is_disjoint(&prime.writes)
                }
            };
            if add {
                self.graph.add_edge(&t.id, t_prime, label);
            }
        }

        self.graph.has_dangerous_structure()
    }

    pub fn end(
        &mut self,
        registry: &mut SiteRegistry,
        tid: &str,
        ts: Timestamp,
    ) -> EndOutcome {
        let txn = match self.require_active(tid) {
            Ok(t) => t.clone(),
            Err(kind) => return EndOutcome::Error(kind),
        };

        if !self.check_available_copies(&txn, registry) {
            self.transactions.get_mut(tid).unwrap().status = TransactionStatus::Aborted;
            return EndOutcome::Aborted(AbortKind::SiteFailure);
        }

        if !self.check_first_committer_wins(&txn, registry, ts) {
            self.transactions.get_mut(tid).unwrap().status = TransactionStatus::Aborted;
            return EndOutcome::Aborted(AbortKind::FirstCommitterWrite);
        }

        for label in [EdgeLabel::Ww, EdgeLabel::Wr, EdgeLabel::Rw] {
            if self.add_edges_and_check(tid, ts, label) {
                self.graph.remove_node(tid);
                self.transactions.get_mut(tid).unwrap().status = TransactionStatus::Aborted;
                return EndOutcome::Aborted(AbortKind::ConsecutiveRwCycle);
            }
        }

        registry.commit(&txn, ts);
        let txn_mut = self.transactions.get_mut(tid).unwrap();
        txn_mut.status = TransactionStatus::Committed;
        txn_mut.commit_time = ts;
        EndOutcome::Committed
    }

    /// Retries every pending read and write queued at `sid`, snapshotting
    /// the queues first so operations newly (re-)enqueued during the
    /// retries aren't retried again in this same call.
    pub fn exec_pending(
        &mut self,
        registry: &mut SiteRegistry,
        sid: u32,
        ts: Timestamp,
    ) -> (Vec<(String, ReadOutcome)>, Vec<(String, WriteOutcome)>) {
        let reads = registry.pending_reads(sid);
        let writes = registry.pending_writes(sid);

        let mut read_outcomes = Vec::new();
        for (tid, item) in reads {
            let outcome = self.read(registry, &tid, &item, ts, true);
            read_outcomes.push((tid, outcome));
        }

        let mut write_outcomes = Vec::new();
        for (tid, item, value) in writes {
            let outcome = self.write(registry, &tid, &item, value, ts, true);
            write_outcomes.push((tid, outcome));
        }

        (read_outcomes, write_outcomes)
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}
