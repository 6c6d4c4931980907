//! Path safety filter: a fixed, case-insensitive substring denylist.
//!
//! A candidate path is unsafe when its lowercased string form contains any
//! denylist term anywhere, not just as a whole path component. This
//! over-blocks (`/srv/MyUsersData/...` is refused because it contains
//! `users`) and that is the intended contract: the filter must never let a
//! path through that literally contains one of the terms.
//!
//! The filter is pure. It performs no I/O and keeps no state between calls.

use std::path::Path;
use std::sync::LazyLock;

use memchr::memmem;

/// Path fragments that veto deletion, as written by the operator.
///
/// Matching is case-insensitive; the order only decides which term
/// [`denied_term`] reports when several match.
pub const DENYLIST: [&str; 8] = [
    "Windows",
    "System32",
    "Program Files",
    "Program Files (x86)",
    "Users",
    "AppData",
    "$Recycle.Bin",
    "Recovery",
];

/// Lowercased finders, built once, paired with the term they came from.
static FINDERS: LazyLock<Vec<(&'static str, memmem::Finder<'static>)>> = LazyLock::new(|| {
    DENYLIST
        .iter()
        .map(|term| {
            let lowered = term.to_lowercase();
            (*term, memmem::Finder::new(lowered.as_bytes()).into_owned())
        })
        .collect()
});

/// Outcome of checking a single candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyDecision {
    /// No denylist term occurs in the path.
    Allowed,
    /// The path contains `term` (case-insensitively).
    Denied { term: &'static str },
}

impl SafetyDecision {
    /// Whether deletion may proceed.
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Decide whether `path` may be deleted.
pub fn check(path: &Path) -> SafetyDecision {
    check_str(&path.to_string_lossy())
}

/// Decide whether the path string `raw` may be deleted.
pub fn check_str(raw: &str) -> SafetyDecision {
    let lowered = raw.to_lowercase();
    let haystack = lowered.as_bytes();
    FINDERS
        .iter()
        .find(|(_, finder)| finder.find(haystack).is_some())
        .map_or(SafetyDecision::Allowed, |(term, _)| SafetyDecision::Denied {
            term: *term,
        })
}

/// `true` when no denylist term occurs in `path`.
pub fn is_safe(path: &Path) -> bool {
    check(path).is_allowed()
}

/// String form of [`is_safe`]. The empty string is safe.
pub fn is_safe_str(raw: &str) -> bool {
    check_str(raw).is_allowed()
}

/// The first denylist term found in `path`, if any.
pub fn denied_term(path: &Path) -> Option<&'static str> {
    match check(path) {
        SafetyDecision::Allowed => None,
        SafetyDecision::Denied { term } => Some(term),
    }
}
