use clap::Parser;
use ghtrends::cli::Cli;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries exported rows
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    cli.run()
}
