//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`BranchName`] - Validated Git branch name
//! - [`Oid`] - Git object identifier (SHA)
//! - [`RefName`] - Parsed Git reference name (local branch, remote branch,
//!   tag, symbolic, other)
//!
//! # Validation
//!
//! These types enforce validity at construction time. Reference names are
//! parsed once, at the boundary where they come out of the repository, so
//! nothing downstream splits `origin/feature` strings by hand.
//!
//! # Examples
//!
//! ```
//! use gitlane::core::types::{BranchName, Oid, RefName};
//!
//! let branch = BranchName::new("feature/my-branch").unwrap();
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! let local = RefName::local(branch.clone());
//! assert_eq!(local.full(), "refs/heads/feature/my-branch");
//!
//! let remote = RefName::parse("refs/remotes/origin/feature/my-branch").unwrap();
//! assert_eq!(remote.remote(), Some("origin"));
//! assert_eq!(remote.branch(), Some(&branch));
//!
//! assert!(BranchName::new("invalid..name").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! # let _ = oid;
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),
}

/// Check a name against Git's refname rules (see `git check-ref-format`).
///
/// Returns a description of the first violated rule.
fn refname_violation(name: &str) -> Option<String> {
    if name.is_empty() {
        return Some("name cannot be empty".into());
    }
    if name == "@" {
        return Some("name cannot be '@' (reserved)".into());
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Some("name cannot start or end with '/'".into());
    }
    if name.ends_with('.') {
        return Some("name cannot end with '.'".into());
    }
    for bad in ["..", "@{", "//"] {
        if name.contains(bad) {
            return Some(format!("name cannot contain '{bad}'"));
        }
    }
    const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
    if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
        return Some(format!("name cannot contain '{c}'"));
    }
    if name.chars().any(|c| c.is_ascii_control()) {
        return Some("name cannot contain control characters".into());
    }
    for component in name.split('/') {
        if component.starts_with('.') {
            return Some("path component cannot start with '.'".into());
        }
        if component.ends_with(".lock") {
            return Some("path component cannot end with '.lock'".into());
        }
    }
    None
}

/// A validated Git branch name (without the `refs/heads/` prefix).
///
/// # Example
///
/// ```
/// use gitlane::core::types::BranchName;
///
/// let name = BranchName::new("feature/my-branch").unwrap();
/// assert_eq!(name.as_str(), "feature/my-branch");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new(".hidden").is_err());
/// assert!(BranchName::new("-flag").is_err());
/// assert!(BranchName::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.starts_with('-') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot start with '-'".into(),
            ));
        }
        if let Some(problem) = refname_violation(&name) {
            return Err(TypeError::InvalidBranchName(problem));
        }
        Ok(Self(name))
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split the name into its `/`-separated segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A Git object identifier (SHA-1 or SHA-256), normalized to lowercase.
///
/// # Example
///
/// ```
/// use gitlane::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a 40 or 64
    /// character hex id.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(Self(oid))
    }

    /// Get an abbreviated form of the OID.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A parsed Git reference name.
///
/// Produced once by [`RefName::parse`] from the full name stored in the
/// repository; callers match on the variant instead of re-splitting strings.
///
/// # Example
///
/// ```
/// use gitlane::core::types::RefName;
///
/// let tag = RefName::parse("refs/tags/v1.0").unwrap();
/// assert!(tag.is_tag());
/// assert_eq!(tag.short(), "v1.0");
///
/// let head = RefName::parse("HEAD").unwrap();
/// assert_eq!(head, RefName::Symbolic("HEAD".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RefName {
    /// `refs/heads/<branch>`
    LocalBranch(BranchName),
    /// `refs/remotes/<remote>/<branch>`
    RemoteBranch {
        /// The remote that owns the branch (first path segment).
        remote: String,
        /// Branch name on the remote.
        branch: BranchName,
    },
    /// `refs/tags/<name>`
    Tag(String),
    /// Top-level pseudo refs such as `HEAD` or `FETCH_HEAD`.
    Symbolic(String),
    /// Any other namespace under `refs/` (notes, stash, ...).
    Other(String),
}

impl RefName {
    /// Parse a full reference name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRefName` if the name violates Git's
    /// refname rules or a namespace is missing its name.
    pub fn parse(full: &str) -> Result<Self, TypeError> {
        if let Some(problem) = refname_violation(full) {
            return Err(TypeError::InvalidRefName(format!("{full}: {problem}")));
        }

        if let Some(rest) = full.strip_prefix("refs/heads/") {
            return BranchName::new(rest)
                .map(RefName::LocalBranch)
                .map_err(|e| TypeError::InvalidRefName(e.to_string()));
        }
        if let Some(rest) = full.strip_prefix("refs/remotes/") {
            return Self::remote_from_short(rest);
        }
        if let Some(rest) = full.strip_prefix("refs/tags/") {
            return Ok(RefName::Tag(rest.to_string()));
        }
        if full.starts_with("refs/") {
            return Ok(RefName::Other(full.to_string()));
        }
        if full.contains('/') {
            return Err(TypeError::InvalidRefName(format!(
                "{full}: not under refs/"
            )));
        }
        Ok(RefName::Symbolic(full.to_string()))
    }

    /// Parse a short remote branch name such as `origin/feature/x`.
    ///
    /// The first segment names the remote; the rest is the branch.
    pub fn remote_from_short(short: &str) -> Result<Self, TypeError> {
        let (remote, branch) = short.split_once('/').ok_or_else(|| {
            TypeError::InvalidRefName(format!("{short}: expected <remote>/<branch>"))
        })?;
        if remote.is_empty() {
            return Err(TypeError::InvalidRefName(format!(
                "{short}: empty remote name"
            )));
        }
        let branch = BranchName::new(branch).map_err(|e| TypeError::InvalidRefName(e.to_string()))?;
        Ok(RefName::RemoteBranch {
            remote: remote.to_string(),
            branch,
        })
    }

    /// Reference for a local branch.
    pub fn local(branch: BranchName) -> Self {
        RefName::LocalBranch(branch)
    }

    /// Reference for a tag.
    pub fn tag(name: &str) -> Result<Self, TypeError> {
        Self::parse(&format!("refs/tags/{name}"))
    }

    /// The full reference name as stored by Git.
    pub fn full(&self) -> String {
        match self {
            RefName::LocalBranch(b) => format!("refs/heads/{b}"),
            RefName::RemoteBranch { remote, branch } => format!("refs/remotes/{remote}/{branch}"),
            RefName::Tag(t) => format!("refs/tags/{t}"),
            RefName::Symbolic(s) | RefName::Other(s) => s.clone(),
        }
    }

    /// The short display name (`main`, `origin/main`, `v1.0`, `HEAD`).
    pub fn short(&self) -> String {
        match self {
            RefName::LocalBranch(b) => b.to_string(),
            RefName::RemoteBranch { remote, branch } => format!("{remote}/{branch}"),
            RefName::Tag(t) => t.clone(),
            RefName::Symbolic(s) => s.clone(),
            RefName::Other(s) => s.strip_prefix("refs/").unwrap_or(s).to_string(),
        }
    }

    /// The branch name for local and remote branches.
    pub fn branch(&self) -> Option<&BranchName> {
        match self {
            RefName::LocalBranch(b) | RefName::RemoteBranch { branch: b, .. } => Some(b),
            _ => None,
        }
    }

    /// The owning remote for remote branches.
    pub fn remote(&self) -> Option<&str> {
        match self {
            RefName::RemoteBranch { remote, .. } => Some(remote),
            _ => None,
        }
    }

    /// Check if this is a tag reference.
    pub fn is_tag(&self) -> bool {
        matches!(self, RefName::Tag(_))
    }

    /// Check if this is a local branch reference.
    pub fn is_local_branch(&self) -> bool {
        matches!(self, RefName::LocalBranch(_))
    }
}

impl TryFrom<String> for RefName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.full()
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full())
    }
}
