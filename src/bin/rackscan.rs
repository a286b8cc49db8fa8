use clap::Parser;
use rackscan::cli::run_scan;
use rackscan::cli::ScanArgs;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    run_scan(ScanArgs::parse())
}
