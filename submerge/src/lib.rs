//! CLI surface and top-level driving loop: read a script, parse it, run it
//! through the dispatcher one instruction at a time, render each outcome.

use clap::Parser;
use submerge_base::Result;
use submerge_txn::InstructionDispatcher;

#[derive(Parser, Debug)]
#[command(name = "submerge", about = "Runs a transaction instruction script")]
pub struct Cli {
    /// Path to the instruction script.
    pub input: std::path::PathBuf,

    /// Emit abort reasons and pending-queue movements in addition to the
    /// stable output contract.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Reads `cli.input`, parses it, and drives every instruction through a
/// fresh `InstructionDispatcher`, rendering each outcome as it happens.
pub fn run(cli: &Cli) -> Result<()> {
    let text = std::fs::read_to_string(&cli.input)?;
    let instructions = submerge_lang::parse_script(&text)?;

    let mut dispatcher = InstructionDispatcher::new();
    for (i, instr) in instructions.iter().enumerate() {
        let outcome = dispatcher.dispatch(instr, (i + 1) as u32);
        submerge_ui::render(&outcome, cli.verbose);
    }
    Ok(())
}
