use stutter::{cli, process};

fn main() -> anyhow::Result<()> {
    let cfg = cli::handle_cli()?;
    process::process_data(cfg)
}
