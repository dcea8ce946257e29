use std::path::{Path, PathBuf};

use git2::{build::CheckoutBuilder, ErrorCode, Oid, Repository};
use log::{debug, trace, warn};
use thiserror::Error;

use super::source::GitSource;

#[derive(Error, Debug)]
pub enum GitRepoError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),
    #[error("Ref {refname} was not found on origin")]
    RefNotFound { refname: String },
    #[error("Failed to check out {revision}: {source}")]
    Checkout {
        revision: String,
        source: git2::Error,
    },
    #[error("Destination {path} exists but is not a git repository")]
    NotARepository { path: String },
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

/// A dependency working tree on local disk, backed by a git repository
/// with a single `origin` remote.
pub struct DepGitRepository<'a> {
    source: &'a GitSource,
    git_repo: Repository,
    path: PathBuf,
}

impl<'a> DepGitRepository<'a> {
    /// Opens the tree at `path`, or initializes a fresh one with `url` as
    /// origin. An existing tree keeps its objects; only the origin url is
    /// updated if it changed.
    pub fn clone_or_open(
        source: &'a GitSource,
        url: &str,
        path: &Path,
    ) -> Result<DepGitRepository<'a>, GitRepoError> {
        let git_repo = if path.exists() {
            Self::open_tree(path, url)?
        } else {
            Self::create_tree(path, url)?
        };

        Ok(DepGitRepository {
            source,
            git_repo,
            path: path.to_path_buf(),
        })
    }

    fn open_tree(path: &Path, url: &str) -> Result<Repository, GitRepoError> {
        trace!("Opening existing repository at {}", path.display());

        let repo = Repository::open(path).map_err(|e| match e.code() {
            ErrorCode::NotFound => GitRepoError::NotARepository {
                path: path.to_string_lossy().to_string(),
            },
            _ => e.into(),
        })?;

        {
            let remote = repo.find_remote("origin")?;
            if remote.url() != Some(url) {
                trace!(
                    "Updating remote existing url {:?} to new url {}",
                    remote.url(),
                    url
                );
                repo.remote_set_url("origin", url)?;
            }
        }

        Ok(repo)
    }

    fn create_tree(path: &Path, url: &str) -> Result<Repository, GitRepoError> {
        trace!("Creating a new repository at {}", path.display());

        std::fs::create_dir_all(path)?;
        let repo = Repository::init(path)?;
        repo.remote("origin", url)?;

        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Single-branch fetch. The name may be a branch or a tag, so both
    /// refspecs are requested; a refspec that matches nothing on the
    /// remote is ignored.
    pub fn fetch_ref(&self, refname: &str) -> Result<(), GitRepoError> {
        let mut remote = self.git_repo.find_remote("origin")?;
        let refspecs = [
            format!("+refs/heads/{refname}:refs/remotes/origin/{refname}"),
            format!("+refs/tags/{refname}:refs/tags/{refname}"),
        ];
        debug!(
            "Fetching {} from {}",
            refname,
            remote.url().unwrap_or_default()
        );
        remote.fetch(&refspecs, Some(&mut self.source.fetch_options()), None)?;
        Ok(())
    }

    /// Makes sure a pinned commit is present locally. The single-branch
    /// fetch normally brings it in; if not, ask origin for the commit
    /// itself (not every server allows that, so a failure here is only a
    /// warning and resolution decides the final outcome).
    pub fn fetch_revision(&self, revision: &str) -> Result<(), GitRepoError> {
        if self.git_repo.revparse_single(revision).is_ok() {
            return Ok(());
        }
        let mut remote = self.git_repo.find_remote("origin")?;
        if let Err(error) = remote.fetch(&[revision], Some(&mut self.source.fetch_options()), None)
        {
            warn!("Failed to fetch single commit {}: {}", revision, error);
        }
        Ok(())
    }

    /// Commit at the tip of the fetched branch or tag.
    pub fn resolve_ref_tip(&self, refname: &str) -> Result<Oid, GitRepoError> {
        self.commit_for_obj_str(&format!("refs/remotes/origin/{refname}"))
            .or_else(|_| self.commit_for_obj_str(&format!("refs/tags/{refname}")))
            .map_err(|_| GitRepoError::RefNotFound {
                refname: refname.to_string(),
            })
    }

    pub fn resolve_revision(&self, revision: &str) -> Result<Oid, GitRepoError> {
        self.commit_for_obj_str(revision)
            .map_err(|source| GitRepoError::Checkout {
                revision: revision.to_string(),
                source,
            })
    }

    /// Force-checkout the working tree at `oid`, detached.
    pub fn checkout_detached(&self, oid: Oid) -> Result<(), GitRepoError> {
        fn as_checkout_error(oid: Oid) -> impl Fn(git2::Error) -> GitRepoError {
            move |source| GitRepoError::Checkout {
                revision: oid.to_string(),
                source,
            }
        }

        self.git_repo
            .find_commit(oid)
            .map_err(as_checkout_error(oid))?;
        self.git_repo
            .set_head_detached(oid)
            .map_err(as_checkout_error(oid))?;
        self.git_repo
            .checkout_head(Some(CheckoutBuilder::new().force()))
            .map_err(as_checkout_error(oid))?;

        Ok(())
    }

    pub fn head_commit_hash(&self) -> Result<String, GitRepoError> {
        Ok(self.git_repo.head()?.peel_to_commit()?.id().to_string())
    }

    fn commit_for_obj_str(&self, str: &str) -> Result<Oid, git2::Error> {
        Ok(self.git_repo.revparse_single(str)?.peel_to_commit()?.id())
    }
}
