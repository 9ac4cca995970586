use clap::Parser;
use submerge::Cli;

fn main() {
    submerge_ui::init_tracing();
    let cli = Cli::parse();
    if let Err(err) = submerge::run(&cli) {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}
