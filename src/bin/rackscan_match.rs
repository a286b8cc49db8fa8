use clap::Parser;
use rackscan::cli::run_match;
use rackscan::cli::MatchArgs;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    run_match(MatchArgs::parse())
}
