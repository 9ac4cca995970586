use crate::manager::{EndOutcome, ReadOutcome, TransactionManager, WriteOutcome};
use crate::registry::SiteRegistry;
use crate::transaction::AbortKind;
use submerge_base::Timestamp;
use submerge_lang::Instruction;

/// What happened as the result of dispatching one instruction, handed to
/// `submerge-ui` for rendering. The dispatcher itself never prints.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DispatchOutcome {
    Began {
        tid: String,
    },
    BeginFailed {
        tid: String,
        kind: AbortKind,
    },
    Read {
        tid: String,
        outcome: ReadOutcome,
    },
    Write {
        tid: String,
        outcome: WriteOutcome,
    },
    End {
        tid: String,
        outcome: EndOutcome,
    },
    SiteFailed {
        site: u32,
    },
    SiteRecovered {
        site: u32,
        retried_reads: Vec<(String, ReadOutcome)>,
        retried_writes: Vec<(String, WriteOutcome)>,
    },
    Dump(Vec<String>),
}

/// Thin router from a parsed `Instruction` to `TransactionManager`/
/// `SiteRegistry` calls, per the verb table. Owns both collaborators and
/// assigns the monotonically increasing per-line timestamp.
pub struct InstructionDispatcher {
    tm: TransactionManager,
    registry: SiteRegistry,
}

impl InstructionDispatcher {
    pub fn new() -> Self {
        InstructionDispatcher {
            tm: TransactionManager::new(),
            registry: SiteRegistry::new(),
        }
    }

    pub fn registry(&self) -> &SiteRegistry {
        &self.registry
    }

    /// `line_no` is the 1-based index of this instruction among the
    /// script's non-comment, non-blank lines; it is converted directly into
    /// the logical timestamp for this instruction.
    pub fn dispatch(&mut self, instr: &Instruction, line_no: u32) -> DispatchOutcome {
        let ts = Timestamp::new(line_no as i64);
        match instr {
            Instruction::Begin(tid) => match self.tm.begin(tid, ts) {
                Ok(()) => DispatchOutcome::Began { tid: tid.clone() },
                Err(kind) => DispatchOutcome::BeginFailed {
                    tid: tid.clone(),
                    kind,
                },
            },
            Instruction::Read(tid, item) => {
                let outcome = self.tm.read(&mut self.registry, tid, item, ts, false);
                DispatchOutcome::Read {
                    tid: tid.clone(),
                    outcome,
                }
            }
            Instruction::Write(tid, item, value) => {
                let outcome = self
                    .tm
                    .write(&mut self.registry, tid, item, *value, ts, false);
                DispatchOutcome::Write {
                    tid: tid.clone(),
                    outcome,
                }
            }
            Instruction::End(tid) => {
                let outcome = self.tm.end(&mut self.registry, tid, ts);
                DispatchOutcome::End {
                    tid: tid.clone(),
                    outcome,
                }
            }
            Instruction::Fail(sid) => {
                self.registry.fail(*sid, ts);
                DispatchOutcome::SiteFailed { site: *sid }
            }
            Instruction::Recover(sid) => {
                self.registry.recover(*sid, ts);
                let (retried_reads, retried_writes) =
                    self.tm.exec_pending(&mut self.registry, *sid, ts);
                DispatchOutcome::SiteRecovered {
                    site: *sid,
                    retried_reads,
                    retried_writes,
                }
            }
            Instruction::Dump => {
                let lines = (1..=crate::registry::SITE_COUNT)
                    .filter(|&s| self.registry.is_up(s))
                    .map(|s| self.registry.site(s).dump())
                    .collect();
                DispatchOutcome::Dump(lines)
            }
        }
    }
}

impl Default for InstructionDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
