//! Console rendering of the dispatcher's stable stdout contract, plus
//! `tracing` subscriber setup for diagnostic logging kept separate from
//! that contract.

use submerge_txn::{AbortKind, DispatchOutcome, EndOutcome, ReadOutcome, WriteOutcome};

/// Installs the `tracing` subscriber used for internal diagnostics (e.g.
/// `submerge_base::Error`'s `tracing::error!` on construction). Independent
/// of the plain `println!` stdout contract rendered by this crate.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

fn format_sites(sites: &[u32]) -> String {
    let inner = sites
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{inner}]")
}

fn render_read(tid: &str, outcome: &ReadOutcome, verbose: bool) {
    match outcome {
        ReadOutcome::Value { item, value } => println!("{item}: {value}"),
        ReadOutcome::Pending => {
            if verbose {
                println!("{tid} read queued, no read-ready site available");
            }
        }
        ReadOutcome::Aborted(kind) => {
            println!("{tid} aborts");
            if verbose {
                println!("  reason: {}", kind.as_str());
            }
        }
        ReadOutcome::Error(kind) => {
            if verbose {
                println!("{tid}: {}", kind.as_str());
            }
        }
    }
}

fn render_write(tid: &str, outcome: &WriteOutcome, verbose: bool) {
    match outcome {
        WriteOutcome::Written { item, value, sites } => {
            println!("{tid} writes {value} to {item} at sites {}", format_sites(sites))
        }
        WriteOutcome::Pending => {
            if verbose {
                println!("{tid} write queued, no site available");
            }
        }
        WriteOutcome::Error(kind) => {
            if verbose {
                println!("{tid}: {}", kind.as_str());
            }
        }
    }
}

fn render_abort_reason(kind: AbortKind, verbose: bool) {
    if verbose {
        println!("  reason: {}", kind.as_str());
    }
}

/// Renders one `DispatchOutcome` to stdout per §6's stable emissions. In
/// verbose mode also emits abort reasons and pending-queue movements.
pub fn render(outcome: &DispatchOutcome, verbose: bool) {
    match outcome {
        DispatchOutcome::Began { tid } => println!("{tid} begins"),
        DispatchOutcome::BeginFailed { tid, kind } => {
            if verbose {
                println!("{tid}: {}", kind.as_str());
            }
        }
        DispatchOutcome::Read { tid, outcome } => render_read(tid, outcome, verbose),
        DispatchOutcome::Write { tid, outcome } => render_write(tid, outcome, verbose),
        DispatchOutcome::End { tid, outcome } => match outcome {
            EndOutcome::Committed => println!("{tid} commits"),
            EndOutcome::Aborted(kind) => {
                println!("{tid} aborts");
                render_abort_reason(*kind, verbose);
            }
            EndOutcome::Error(kind) => {
                if verbose {
                    println!("{tid}: {}", kind.as_str());
                }
            }
        },
        DispatchOutcome::SiteFailed { site } => println!("Site {site} fails"),
        DispatchOutcome::SiteRecovered {
            site,
            retried_reads,
            retried_writes,
        } => {
            println!("Site {site} recovers");
            for (tid, outcome) in retried_reads {
                if verbose {
                    println!("  retrying queued read for {tid}");
                }
                render_read(tid, outcome, verbose);
            }
            for (tid, outcome) in retried_writes {
                if verbose {
                    println!("  retrying queued write for {tid}");
                }
                render_write(tid, outcome, verbose);
            }
        }
        DispatchOutcome::Dump(lines) => {
            for line in lines {
                println!("{line}");
            }
        }
    }
}
