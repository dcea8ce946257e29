use std::path::{Path, PathBuf};

use log::{error, info};
use thiserror::Error;

use crate::{
    git::repository::GitRepoError,
    model::manifest::{Dependency, DependencyName, Manifest},
};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to create destination directory {path}: {source}")]
    Filesystem {
        path: String,
        source: std::io::Error,
    },
    #[error("Bad destination directory {0}")]
    BadDestination(String),
    #[error(transparent)]
    Repository(#[from] GitRepoError),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

/// Where dependency trees come from. `GitSource` is the real one; tests
/// stub it out.
pub trait RepositorySource {
    fn materialize(
        &self,
        dependency: &Dependency,
        target: &Path,
    ) -> Result<FetchedTree, FetchError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedTree {
    pub path: PathBuf,
    pub commit_hash: String,
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub name: DependencyName,
    pub result: Result<FetchedTree, FetchError>,
}

/// One outcome per manifest entry, in manifest order.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub outcomes: Vec<FetchOutcome>,
}

impl FetchReport {
    pub fn fetched(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

/// Materializes every manifest entry under `dest`, strictly in order, one
/// at a time. A failing entry is recorded and does not stop the batch;
/// the caller decides what to do with the aggregate report.
pub fn fetch_trees<S: RepositorySource>(
    source: &S,
    manifest: &Manifest,
    dest: &Path,
) -> Result<FetchReport, FetchError> {
    if !dest.exists() {
        std::fs::create_dir_all(dest).map_err(|error| FetchError::Filesystem {
            path: dest.to_string_lossy().to_string(),
            source: error,
        })?;
    }
    if !dest.is_dir() {
        return Err(FetchError::BadDestination(
            dest.to_string_lossy().to_string(),
        ));
    }

    let mut report = FetchReport::default();
    for dependency in &manifest.dependencies {
        info!(
            "Fetching {} ({} {})",
            dependency.name, dependency.coordinate, dependency.specification
        );
        let target = dest.join(dependency.name.as_str());
        let result = source.materialize(dependency, &target);
        if let Err(err) = &result {
            error!("Failed to fetch {}: {}", dependency.name, err);
        }
        report.outcomes.push(FetchOutcome {
            name: dependency.name.clone(),
            result,
        });
    }

    info!("{} fetched, {} failed", report.fetched(), report.failed());
    Ok(report)
}
