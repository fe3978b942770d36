//! git::remote
//!
//! Network operations: fetch, fast-forward pull, push of branches and tags,
//! remote ref deletion, with credential lookup and raw transport progress.
//!
//! # Progress
//!
//! Transport callbacks are forwarded unparsed as [`TransportEvent`]s. Turning
//! them into user-facing `{status, percent}` events is the job of the
//! engine's progress relay.
//!
//! # Credentials
//!
//! SSH remotes use, in order: the configured key, `~/.ssh/id_ed25519`,
//! `~/.ssh/id_rsa`. When none exists the attempt fails with a message
//! containing [`SSH_KEY_NOT_FOUND`]. HTTPS remotes go through the git
//! credential helpers.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use super::interface::{Git, GitError, SSH_KEY_NOT_FOUND};
use crate::core::types::{BranchName, Oid, RefName};

/// Give up after this many credential callbacks in one operation.
const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

/// Raw progress reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Free-form remote output ("Counting objects: 50% (2/4)").
    Sideband(String),
    /// Fetch object download progress.
    Received {
        received: usize,
        indexed: usize,
        total: usize,
    },
    /// Push object upload progress.
    Sent { current: usize, total: usize },
}

/// What a pull did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    UpToDate,
    FastForwarded { from: Option<Oid>, to: Oid },
}

/// SSH key to offer: the configured one, else the first default key present.
pub fn find_ssh_key(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        return path.exists().then(|| path.to_path_buf());
    }
    let ssh_dir = dirs::home_dir()?.join(".ssh");
    ["id_ed25519", "id_rsa"]
        .iter()
        .map(|name| ssh_dir.join(name))
        .find(|path| path.exists())
}

/// Remote callbacks shared by fetch and push.
fn callbacks<'a, 'p: 'a>(
    ssh_key: Option<&'a Path>,
    progress: &'a RefCell<&'p mut (dyn FnMut(TransportEvent) + 'p)>,
) -> git2::RemoteCallbacks<'a> {
    let mut callbacks = git2::RemoteCallbacks::new();
    let mut attempts = 0;

    callbacks.credentials(move |url, username, allowed| {
        attempts += 1;
        if attempts > MAX_CREDENTIAL_ATTEMPTS {
            return Err(git2::Error::from_str(&format!(
                "authentication failed for {url}"
            )));
        }
        let user = username.unwrap_or("git");

        if allowed.contains(git2::CredentialType::SSH_KEY) {
            let key = find_ssh_key(ssh_key).ok_or_else(|| git2::Error::from_str(SSH_KEY_NOT_FOUND))?;
            tracing::debug!(key = %key.display(), "offering SSH key");
            return git2::Cred::ssh_key(user, None, &key, None);
        }
        if allowed.contains(git2::CredentialType::USER_PASS_PLAINTEXT) {
            let config = git2::Config::open_default()?;
            return git2::Cred::credential_helper(&config, url, username);
        }
        if allowed.contains(git2::CredentialType::USERNAME) {
            return git2::Cred::username(user);
        }
        git2::Cred::default()
    });

    callbacks.sideband_progress(move |data| {
        let text = String::from_utf8_lossy(data).into_owned();
        (progress.borrow_mut())(TransportEvent::Sideband(text));
        true
    });

    callbacks.transfer_progress(move |stats| {
        (progress.borrow_mut())(TransportEvent::Received {
            received: stats.received_objects(),
            indexed: stats.indexed_objects(),
            total: stats.total_objects(),
        });
        true
    });

    callbacks.push_transfer_progress(move |current, total, _bytes| {
        (progress.borrow_mut())(TransportEvent::Sent { current, total });
    });

    callbacks
}

impl Git {
    fn find_remote(&self, name: &str) -> Result<git2::Remote<'_>, GitError> {
        self.repo.find_remote(name).map_err(|e| match e.code() {
            git2::ErrorCode::NotFound | git2::ErrorCode::InvalidSpec => GitError::RemoteNotFound {
                name: name.to_string(),
            },
            _ => GitError::from_git2(e, name),
        })
    }

    /// Fetch `remote` with its configured refspecs.
    pub fn fetch(
        &self,
        remote: &str,
        ssh_key: Option<&Path>,
        progress: &mut dyn FnMut(TransportEvent),
    ) -> Result<(), GitError> {
        let mut remote = self.find_remote(remote)?;
        let progress = RefCell::new(progress);

        let mut options = git2::FetchOptions::new();
        options.remote_callbacks(callbacks(ssh_key, &progress));
        options.download_tags(git2::AutotagOption::All);

        remote
            .fetch::<&str>(&[], Some(&mut options), None)
            .map_err(GitError::from_transport)?;

        let stats = remote.stats();
        tracing::debug!(
            objects = stats.received_objects(),
            bytes = stats.received_bytes(),
            "fetch finished"
        );
        Ok(())
    }

    /// Upstream of the current branch: its configured upstream, else
    /// `<remote>/<branch>`.
    fn upstream_ref(&self, branch: &BranchName, remote: &str) -> Result<String, GitError> {
        let local = RefName::local(branch.clone()).full();
        match self.repo.branch_upstream_name(&local) {
            Ok(buf) => buf.as_str().map(String::from).ok_or_else(|| GitError::Internal {
                message: format!("upstream of {branch} is not valid UTF-8"),
            }),
            Err(_) => Ok(format!("refs/remotes/{remote}/{branch}")),
        }
    }

    /// Fetch, then fast-forward the current branch to its upstream.
    ///
    /// Diverged histories fail with [`GitError::NonFastForward`] without
    /// touching the worktree.
    pub fn pull_fast_forward(
        &self,
        remote: &str,
        ssh_key: Option<&Path>,
        progress: &mut dyn FnMut(TransportEvent),
    ) -> Result<PullOutcome, GitError> {
        let branch = self.current_branch()?.ok_or(GitError::DetachedHead)?;
        self.fetch(remote, ssh_key, progress)?;

        let upstream = self.upstream_ref(&branch, remote)?;
        let target = self
            .repo
            .find_reference(&upstream)
            .and_then(|r| r.peel_to_commit())
            .map_err(|e| GitError::from_git2(e, &upstream))?;
        let annotated = self
            .repo
            .find_annotated_commit(target.id())
            .map_err(|e| GitError::from_git2(e, &upstream))?;

        let (analysis, _) = self
            .repo
            .merge_analysis(&[&annotated])
            .map_err(|e| GitError::from_git2(e, &upstream))?;

        let to = Oid::new(target.id().to_string())?;
        let local = RefName::local(branch.clone()).full();

        if analysis.is_up_to_date() {
            return Ok(PullOutcome::UpToDate);
        }

        if analysis.is_unborn() {
            self.repo
                .reference(&local, target.id(), false, "pull: initial fast-forward")
                .map_err(|e| GitError::from_git2(e, &local))?;
            self.repo
                .set_head(&local)
                .map_err(|e| GitError::from_git2(e, &local))?;
            let mut checkout = git2::build::CheckoutBuilder::new();
            checkout.safe();
            self.repo
                .checkout_head(Some(&mut checkout))
                .map_err(|e| GitError::from_git2(e, &local))?;
            return Ok(PullOutcome::FastForwarded { from: None, to });
        }

        if !analysis.is_fast_forward() {
            return Err(GitError::NonFastForward {
                branch: branch.to_string(),
            });
        }

        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.safe();
        self.repo
            .checkout_tree(target.as_object(), Some(&mut checkout))
            .map_err(|e| GitError::from_git2(e, &upstream))?;

        let mut reference = self
            .repo
            .find_reference(&local)
            .map_err(|e| GitError::from_git2(e, &local))?;
        let from = reference
            .target()
            .and_then(|oid| Oid::new(oid.to_string()).ok());
        reference
            .set_target(target.id(), &format!("pull: fast-forward to {upstream}"))
            .map_err(|e| GitError::from_git2(e, &local))?;

        Ok(PullOutcome::FastForwarded { from, to })
    }

    /// Push refspecs to `remote`.
    ///
    /// A ref rejected by the server fails the push.
    pub fn push_refspecs(
        &self,
        remote: &str,
        refspecs: &[String],
        ssh_key: Option<&Path>,
        progress: &mut dyn FnMut(TransportEvent),
    ) -> Result<(), GitError> {
        let mut remote = self.find_remote(remote)?;
        let progress = RefCell::new(progress);
        let rejected: RefCell<Vec<String>> = RefCell::new(Vec::new());

        let mut cbs = callbacks(ssh_key, &progress);
        cbs.push_update_reference(|refname, status| {
            if let Some(message) = status {
                rejected.borrow_mut().push(format!("{refname}: {message}"));
            }
            Ok(())
        });

        let mut options = git2::PushOptions::new();
        options.remote_callbacks(cbs);

        remote
            .push(refspecs, Some(&mut options))
            .map_err(GitError::from_transport)?;

        let rejected = rejected.take();
        if !rejected.is_empty() {
            return Err(GitError::Transport {
                message: format!("rejected {}", rejected.join(", ")),
            });
        }
        Ok(())
    }

    /// Push the current branch to the same name on `remote`.
    pub fn push_current_branch(
        &self,
        remote: &str,
        ssh_key: Option<&Path>,
        progress: &mut dyn FnMut(TransportEvent),
    ) -> Result<BranchName, GitError> {
        let branch = self.current_branch()?.ok_or(GitError::DetachedHead)?;
        // An unborn branch has nothing to push.
        self.head_oid()?;
        let full = RefName::local(branch.clone()).full();
        self.push_refspecs(remote, &[format!("{full}:{full}")], ssh_key, progress)?;
        Ok(branch)
    }

    /// Push the named tags to the same names on `remote`.
    pub fn push_tags(
        &self,
        remote: &str,
        tags: &[String],
        ssh_key: Option<&Path>,
        progress: &mut dyn FnMut(TransportEvent),
    ) -> Result<(), GitError> {
        let refspecs = tags
            .iter()
            .map(|tag| RefName::tag(tag).map(|r| format!("{0}:{0}", r.full())))
            .collect::<Result<Vec<_>, _>>()?;
        if refspecs.is_empty() {
            return Ok(());
        }
        self.push_refspecs(remote, &refspecs, ssh_key, progress)
    }

    /// Delete a branch on `remote`.
    pub fn delete_remote_branch(
        &self,
        remote: &str,
        branch: &BranchName,
        ssh_key: Option<&Path>,
        progress: &mut dyn FnMut(TransportEvent),
    ) -> Result<(), GitError> {
        let full = RefName::local(branch.clone()).full();
        self.push_refspecs(remote, &[format!(":{full}")], ssh_key, progress)
    }
}
