//! Contributor identity from heterogeneous record shapes

use crate::github::EventRecord;
use crate::types::Identity;

/// Login suffix GitHub gives to app accounts
const BOT_SUFFIX: &str = "[bot]";

#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityResolver {
    exclude_bots: bool,
}

impl IdentityResolver {
    pub fn new(exclude_bots: bool) -> Self {
        Self { exclude_bots }
    }

    /// Login first, then git author email; `None` when neither is usable.
    ///
    /// With bot exclusion on, a bot login resolves to `None` rather than
    /// falling through to the email.
    pub fn resolve(&self, record: &EventRecord) -> Option<Identity> {
        if let Some(login) = record.login() {
            if self.exclude_bots && is_bot(login) {
                return None;
            }
            return Some(Identity::Login(login.to_string()));
        }
        record.email().map(|email| Identity::Email(email.to_string()))
    }
}

pub fn is_bot(login: &str) -> bool {
    login.ends_with(BOT_SUFFIX)
}
