use std::{env, error::Error, path::PathBuf};

use crate::{git::source::GitSource, model::manifest::Protocol, Depfetch};

#[derive(Default)]
pub struct DepfetchBuilder {
    // All other paths are relative to `root`
    root: Option<PathBuf>,
    manifest_file_name: Option<PathBuf>,
    dest_directory_name: Option<PathBuf>,
    default_protocol: Option<Protocol>,
}

impl DepfetchBuilder {
    /// Project root directory.
    ///
    /// Defaults to the current directory.
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Name of the depfetch manifest toml file.
    ///
    /// Defaults to `depfetch.toml`.
    pub fn manifest_file_name(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_file_name = Some(path.into());
        self
    }

    /// Name of the directory the dependency trees are placed in.
    ///
    /// Defaults to `deps`.
    pub fn dest_directory_name(mut self, path: impl Into<PathBuf>) -> Self {
        self.dest_directory_name = Some(path.into());
        self
    }

    /// Protocol used for coordinates that do not name one.
    ///
    /// Defaults to https.
    pub fn default_protocol(mut self, protocol: Protocol) -> Self {
        self.default_protocol = Some(protocol);
        self
    }

    pub fn try_build(self) -> Result<Depfetch, Box<dyn Error>> {
        let Self {
            root,
            manifest_file_name,
            dest_directory_name,
            default_protocol,
        } = self;

        let root = match root {
            Some(root) => root,
            None => env::current_dir()?,
        };

        let manifest_file_name =
            manifest_file_name.unwrap_or_else(|| PathBuf::from("depfetch.toml"));

        let dest_directory_name = dest_directory_name.unwrap_or_else(|| PathBuf::from("deps"));

        let git_config = git2::Config::open_default()?;
        let source = GitSource::new(git_config, default_protocol.unwrap_or(Protocol::Https));

        Ok(Depfetch {
            source,
            root,
            manifest_file_name,
            dest_directory_name,
        })
    }
}
