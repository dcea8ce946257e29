use std::{error::Error, path::PathBuf};

use crate::{
    cli::command_handlers::{do_clean, do_fetch, do_init, do_list},
    git::source::GitSource,
};

mod builder;

pub use builder::DepfetchBuilder;

pub struct Depfetch {
    source: GitSource,
    root: PathBuf,
    manifest_file_name: PathBuf,
    dest_directory_name: PathBuf,
}

impl Depfetch {
    pub fn builder() -> DepfetchBuilder {
        DepfetchBuilder::default()
    }

    /// Fetches all dependencies listed in the manifest (or the built-in
    /// list if there is no manifest file).
    pub fn fetch(&self) -> Result<(), Box<dyn Error>> {
        do_fetch(
            &self.source,
            &self.root,
            &self.manifest_file_name,
            &self.dest_directory_name,
        )
    }

    /// Prints the dependency list without fetching anything.
    pub fn list(&self) -> Result<(), Box<dyn Error>> {
        do_list(&self.root, &self.manifest_file_name)
    }

    /// Writes the built-in dependency list to the manifest file.
    pub fn init(&self) -> Result<(), Box<dyn Error>> {
        do_init(&self.root, &self.manifest_file_name)
    }

    /// Deletes the destination directory and everything under it.
    pub fn clean(&self) -> Result<(), Box<dyn Error>> {
        do_clean(&self.root, &self.dest_directory_name)
    }
}
