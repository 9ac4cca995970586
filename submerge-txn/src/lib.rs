//! The coordinator: per-site multi-version storage, the replica registry,
//! the transaction manager and its serialization graph, and the
//! instruction dispatcher that drives them.

mod dispatcher;
mod graph;
mod manager;
mod registry;
mod site;
mod transaction;

pub use dispatcher::{DispatchOutcome, InstructionDispatcher};
pub use graph::{EdgeLabel, Graph};
pub use manager::{EndOutcome, ReadOutcome, TransactionManager, WriteOutcome};
pub use registry::{placement, SiteRegistry, SiteStatus, ITEM_COUNT, SITE_COUNT};
pub use site::{Site, UncommittedWrite, VersionRecord};
pub use transaction::{AbortKind, Operation, Transaction, TransactionStatus};
