use std::error::Error;

use clap::Parser;

use depfetch::{
    cli::args::{CliArgs, Command},
    config::DepfetchConfig,
    Depfetch,
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli_args = CliArgs::parse();
    let config = DepfetchConfig::load()?;

    let mut builder = Depfetch::builder().manifest_file_name(&cli_args.manifest_location);
    if let Some(root) = &cli_args.root {
        builder = builder.root(root);
    }
    if let Some(dest) = cli_args.dest_directory.as_ref().or(config.dest_dir.as_ref()) {
        builder = builder.dest_directory_name(dest);
    }
    if let Some(protocol) = config.default_protocol {
        builder = builder.default_protocol(protocol);
    }
    let depfetch = builder.try_build()?;

    match cli_args.cmd.unwrap_or(Command::Fetch) {
        Command::Fetch => depfetch.fetch(),
        Command::List => depfetch.list(),
        Command::Init => depfetch.init(),
        Command::Clean => depfetch.clean(),
    }
}
