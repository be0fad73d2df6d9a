//! Resolution of RFC 822 style mailboxes (`Name <user@host>`) to observer ids.

use log::{debug, error};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use crate::api::ObserverId;
pub use crate::db::repository::IdentityDirectory;

/// Why a mailbox did not resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// No `<address>` segment in the mailbox.
    NoAddress,
    /// More than one `<address>` segment.
    AmbiguousAddress(usize),
    /// The bracketed text is not an email address.
    MalformedAddress(String),
    /// No observer is registered under the address.
    Unregistered(String),
    /// Several observers share the address.
    Duplicated { address: String, matches: usize },
    /// The directory could not be queried.
    LookupFailed(String),
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAddress => write!(f, "no <address> found"),
            Self::AmbiguousAddress(n) => write!(f, "{} <address> segments found, expected one", n),
            Self::MalformedAddress(a) => write!(f, "'{}' is not an email address", a),
            Self::Unregistered(a) => write!(f, "no registered user for {}", a),
            Self::Duplicated { address, matches } => {
                write!(f, "{} users registered for {}", matches, address)
            }
            Self::LookupFailed(e) => write!(f, "user lookup failed: {}", e),
        }
    }
}

/// Outcome of resolving one mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ObserverId),
    NotFound(UnresolvedReason),
}

impl Resolution {
    pub fn observer(&self) -> Option<ObserverId> {
        match self {
            Resolution::Resolved(id) => Some(*id),
            Resolution::NotFound(_) => None,
        }
    }
}

fn address_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"<([^<>]*)>").ok())
        .as_ref()
}

/// Pull the single bracketed address out of a mailbox.
pub fn extract_address(mailbox: &str) -> Result<String, UnresolvedReason> {
    let Some(pattern) = address_pattern() else {
        return Err(UnresolvedReason::NoAddress);
    };
    let candidates: Vec<&str> = pattern
        .captures_iter(mailbox)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .collect();

    match candidates.as_slice() {
        [] => Err(UnresolvedReason::NoAddress),
        [address] => {
            let valid = address
                .split_once('@')
                .is_some_and(|(user, host)| !user.is_empty() && !host.is_empty());
            if valid && !address.contains(char::is_whitespace) {
                Ok(address.to_string())
            } else {
                Err(UnresolvedReason::MalformedAddress(address.to_string()))
            }
        }
        many => Err(UnresolvedReason::AmbiguousAddress(many.len())),
    }
}

/// Resolve `mailbox` against `directory`.
///
/// Never fails: every problem, including a datastore error, becomes
/// [`Resolution::NotFound`] with a reason.
pub fn resolve(directory: &dyn IdentityDirectory, mailbox: &str) -> Resolution {
    let address = match extract_address(mailbox) {
        Ok(a) => a,
        Err(reason) => return Resolution::NotFound(reason),
    };

    match directory.find_by_address(&address) {
        Ok(ids) => match ids.as_slice() {
            [] => Resolution::NotFound(UnresolvedReason::Unregistered(address)),
            [id] => {
                debug!("Resolved {} to observer {}", address, id);
                Resolution::Resolved(*id)
            }
            many => {
                error!(
                    "Identity directory holds {} observers for {}: {:?}",
                    many.len(),
                    address,
                    many
                );
                Resolution::NotFound(UnresolvedReason::Duplicated {
                    address,
                    matches: many.len(),
                })
            }
        },
        Err(e) => Resolution::NotFound(UnresolvedReason::LookupFailed(e.to_string())),
    }
}
