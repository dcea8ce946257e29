use std::path::Path;

use git2::{AutotagOption, Config, Cred, CredentialType, FetchOptions, RemoteCallbacks};
use log::{info, trace};

use crate::{
    fetch::{FetchError, FetchedTree, RepositorySource},
    git::repository::DepGitRepository,
    model::manifest::{Dependency, Protocol},
};

/// Fetches dependency trees over git, authenticating the way the user's
/// git configuration says to.
pub struct GitSource {
    git_config: Config,
    default_protocol: Protocol,
}

impl GitSource {
    pub fn new(git_config: Config, default_protocol: Protocol) -> GitSource {
        GitSource {
            git_config,
            default_protocol,
        }
    }

    /// Fetch from an explicit url instead of the coordinate's. Local
    /// filesystem paths work too, which the integration tests rely on.
    pub fn materialize_from(
        &self,
        url: &str,
        dependency: &Dependency,
        target: &Path,
    ) -> Result<FetchedTree, FetchError> {
        let repository = DepGitRepository::clone_or_open(self, url, target)?;
        repository.fetch_ref(&dependency.specification.branch)?;

        let oid = match &dependency.specification.revision {
            Some(revision) => {
                repository.fetch_revision(revision)?;
                repository.resolve_revision(revision)?
            }
            None => repository.resolve_ref_tip(&dependency.specification.branch)?,
        };
        repository.checkout_detached(oid)?;
        let commit_hash = repository.head_commit_hash()?;

        info!("Fetched {} at {}", dependency.name, commit_hash);
        Ok(FetchedTree {
            path: repository.path().to_path_buf(),
            commit_hash,
        })
    }

    pub(super) fn fetch_options(&self) -> FetchOptions<'_> {
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(move |url, username, allowed_types| {
            trace!(
                "Requested credentials for {}, username {:?}, allowed types {:?}",
                url,
                username,
                allowed_types
            );
            // Asking for ssh username
            if allowed_types.contains(CredentialType::USERNAME) {
                return Cred::username("git");
            }
            // SSH auth
            if allowed_types.contains(CredentialType::SSH_KEY) {
                return Cred::ssh_key_from_agent(username.unwrap_or("git"));
            }
            // HTTP auth
            if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
                return Cred::credential_helper(&self.git_config, url, username);
            }
            Err(git2::Error::from_str("no valid authentication available"))
        });

        let mut fetch_options = FetchOptions::new();
        fetch_options
            .remote_callbacks(callbacks)
            .download_tags(AutotagOption::None);

        fetch_options
    }
}

impl RepositorySource for GitSource {
    fn materialize(
        &self,
        dependency: &Dependency,
        target: &Path,
    ) -> Result<FetchedTree, FetchError> {
        let url = dependency.coordinate.to_git_url(self.default_protocol);
        self.materialize_from(&url, dependency, target)
    }
}
