use std::collections::BTreeSet;
use submerge_base::Timestamp;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransactionStatus {
    Active,
    Committed,
    Aborted,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    Read,
    Write,
}

/// Closed taxonomy of reasons an operation or commit can fail. The first two
/// are reported, not abort-causing; the rest are `end()` abort reasons.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AbortKind {
    UnknownTransaction,
    InactiveTransaction,
    UnhostedItem,
    ImpossibleRead,
    SiteFailure,
    FirstCommitterWrite,
    ConsecutiveRwCycle,
}

impl AbortKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AbortKind::UnknownTransaction => "UNKNOWN_TRANSACTION",
            AbortKind::InactiveTransaction => "INACTIVE_TRANSACTION",
            AbortKind::UnhostedItem => "UNHOSTED_ITEM",
            AbortKind::ImpossibleRead => "IMPOSSIBLE_READ",
            AbortKind::SiteFailure => "SITE_FAILURE",
            AbortKind::FirstCommitterWrite => "FIRST_COMMITTER_WRITE",
            AbortKind::ConsecutiveRwCycle => "CONSECUTIVE_RW_CYCLE",
        }
    }
}

/// One transaction's accumulated state across its lifetime.
#[derive(Clone, Debug)]
pub struct Transaction {
    pub id: String,
    pub start_time: Timestamp,
    pub status: TransactionStatus,
    pub reads: BTreeSet<String>,
    pub writes: BTreeSet<String>,
    pub is_read_only: bool,
    pub commit_time: Timestamp,
    pub sites_accessed: Vec<(u32, Operation, Timestamp)>,
}

impl Transaction {
    pub fn new(id: impl Into<String>, start_time: Timestamp) -> Self {
        Transaction {
            id: id.into(),
            start_time,
            status: TransactionStatus::Active,
            reads: BTreeSet::new(),
            writes: BTreeSet::new(),
            is_read_only: true,
            // No commit yet; INIT sorts below every real timestamp, so the
            // WW/WR edge rules (`commit_time < other.start_time`) never
            // spuriously fire for a not-yet-committed transaction.
            commit_time: Timestamp::INIT,
            sites_accessed: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == TransactionStatus::Active
    }
}
