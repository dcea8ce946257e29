use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Fetches pinned git source dependencies into a local directory.
#[derive(Debug, Parser)]
#[command(version)]
pub struct CliArgs {
    #[command(subcommand)]
    pub cmd: Option<Command>,
    /// Location of the depfetch manifest file, relative to the root
    #[arg(short, long, default_value = "depfetch.toml")]
    pub manifest_location: PathBuf,
    /// Directory the dependency trees are placed in, relative to the root
    #[arg(short, long)]
    pub dest_directory: Option<PathBuf>,
    /// Root directory all other paths are relative to
    #[arg(short, long)]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch all dependencies listed in the manifest (the default)
    Fetch,
    /// Print the dependency list without fetching anything
    List,
    /// Write the built-in dependency list to the manifest file
    Init,
    /// Remove the destination directory and everything under it
    Clean,
}
