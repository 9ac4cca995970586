use submerge_txn::{AbortKind, DispatchOutcome, EndOutcome, InstructionDispatcher, ReadOutcome, WriteOutcome};

fn dispatch_all(d: &mut InstructionDispatcher, instrs: &[submerge_lang::Instruction]) -> Vec<DispatchOutcome> {
    instrs
        .iter()
        .enumerate()
        .map(|(i, instr)| d.dispatch(instr, (i + 1) as u32))
        .collect()
}

use submerge_lang::Instruction::{Begin, Dump, End, Fail, Read, Recover, Write as W};

#[test]
fn scenario_1_basic_commit() {
    let mut d = InstructionDispatcher::new();
    let out = dispatch_all(
        &mut d,
        &[
            Begin("T1".into()),
            W("T1".into(), "x1".into(), 101),
            End("T1".into()),
            Dump,
        ],
    );
    assert_eq!(
        out[2],
        DispatchOutcome::End {
            tid: "T1".into(),
            outcome: EndOutcome::Committed
        }
    );
    let DispatchOutcome::Dump(lines) = &out[3] else {
        panic!("expected dump")
    };
    assert!(lines.contains(&"site 2 - x1: 101, x11: 110".to_string()));
    assert!(lines.contains(&"site 1 - x2: 20, x12: 120".to_string()));
}

#[test]
fn scenario_2_snapshot_read_isolates_commits() {
    let mut d = InstructionDispatcher::new();
    let out = dispatch_all(
        &mut d,
        &[
            Begin("T1".into()),
            Begin("T2".into()),
            W("T1".into(), "x2".into(), 202),
            End("T1".into()),
            Read("T2".into(), "x2".into()),
            End("T2".into()),
            Dump,
        ],
    );
    assert_eq!(
        out[4],
        DispatchOutcome::Read {
            tid: "T2".into(),
            outcome: ReadOutcome::Value {
                item: "x2".into(),
                value: 20
            }
        }
    );
    assert_eq!(
        out[3],
        DispatchOutcome::End { tid: "T1".into(), outcome: EndOutcome::Committed }
    );
    assert_eq!(
        out[5],
        DispatchOutcome::End { tid: "T2".into(), outcome: EndOutcome::Committed }
    );
    let DispatchOutcome::Dump(lines) = &out[6] else {
        panic!("expected dump")
    };
    assert!(lines.iter().any(|l| l.contains("x2: 202")));
}

#[test]
fn scenario_3_first_committer_wins() {
    let mut d = InstructionDispatcher::new();
    let out = dispatch_all(
        &mut d,
        &[
            Begin("T1".into()),
            Begin("T2".into()),
            W("T1".into(), "x4".into(), 14),
            W("T2".into(), "x4".into(), 24),
            End("T1".into()),
            End("T2".into()),
        ],
    );
    assert_eq!(
        out[4],
        DispatchOutcome::End { tid: "T1".into(), outcome: EndOutcome::Committed }
    );
    assert_eq!(
        out[5],
        DispatchOutcome::End {
            tid: "T2".into(),
            outcome: EndOutcome::Aborted(AbortKind::FirstCommitterWrite)
        }
    );
}

#[test]
fn scenario_4_available_copies_abort_on_failure() {
    let mut d = InstructionDispatcher::new();
    let out = dispatch_all(
        &mut d,
        &[
            Begin("T1".into()),
            W("T1".into(), "x6".into(), 66),
            Fail(3),
            End("T1".into()),
        ],
    );
    assert_eq!(
        out[3],
        DispatchOutcome::End {
            tid: "T1".into(),
            outcome: EndOutcome::Aborted(AbortKind::SiteFailure)
        }
    );
}

#[test]
fn scenario_5_impossible_read() {
    let mut d = InstructionDispatcher::new();
    let out = dispatch_all(
        &mut d,
        &[Fail(2), Begin("T1".into()), Read("T1".into(), "x1".into())],
    );
    assert_eq!(
        out[2],
        DispatchOutcome::Read {
            tid: "T1".into(),
            outcome: ReadOutcome::Aborted(AbortKind::ImpossibleRead)
        }
    );
}

#[test]
fn scenario_6_ssi_dangerous_structure() {
    let mut d = InstructionDispatcher::new();
    let out = dispatch_all(
        &mut d,
        &[
            Begin("T1".into()),
            Begin("T2".into()),
            Read("T1".into(), "x2".into()),
            Read("T2".into(), "x4".into()),
            W("T1".into(), "x4".into(), 40),
            W("T2".into(), "x2".into(), 20),
            End("T1".into()),
            End("T2".into()),
        ],
    );
    let committed = out[6..=7]
        .iter()
        .filter(|o| matches!(o, DispatchOutcome::End { outcome: EndOutcome::Committed, .. }))
        .count();
    let aborted = out[6..=7]
        .iter()
        .filter(|o| {
            matches!(
                o,
                DispatchOutcome::End {
                    outcome: EndOutcome::Aborted(AbortKind::ConsecutiveRwCycle),
                    ..
                }
            )
        })
        .count();
    assert_eq!(committed, 1);
    assert_eq!(aborted, 1);
}

#[test]
fn recover_retries_a_pending_write_after_site_comes_back() {
    let mut d = InstructionDispatcher::new();
    let out = dispatch_all(
        &mut d,
        &[
            Fail(2),
            Begin("T1".into()),
            W("T1".into(), "x1".into(), 999),
            Recover(2),
            End("T1".into()),
        ],
    );
    let DispatchOutcome::SiteRecovered { retried_writes, .. } = &out[3] else {
        panic!("expected site recovered");
    };
    assert_eq!(retried_writes.len(), 1);
    assert_eq!(
        retried_writes[0],
        (
            "T1".to_string(),
            WriteOutcome::Written {
                item: "x1".into(),
                value: 999,
                sites: vec![2]
            }
        )
    );
    assert_eq!(
        out[4],
        DispatchOutcome::End { tid: "T1".into(), outcome: EndOutcome::Committed }
    );
}
