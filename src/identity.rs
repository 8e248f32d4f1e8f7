//! Identity map between GitHub logins and Linear display names
//!
//! Built once from the canonical direction (Linear display name -> GitHub
//! login); the inverse is derived at load time. Never mutated afterwards.

use crate::{Result, SyncError};
use std::collections::BTreeMap;

/// Bidirectional, injective lookup between the two systems' identities
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityMap {
    by_display_name: BTreeMap<String, String>,
    by_login: BTreeMap<String, String>,
}

impl IdentityMap {
    /// Build the map from `(linear display name, github login)` pairs.
    ///
    /// Fails if two display names map to the same login or a display name
    /// appears twice, since either would break the inverse lookup.
    pub fn from_display_names<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut by_display_name = BTreeMap::new();
        let mut by_login = BTreeMap::new();

        for (display_name, login) in entries {
            let display_name = display_name.into();
            let login = login.into();

            if let Some(previous) = by_login.insert(login.clone(), display_name.clone()) {
                return Err(SyncError::Config(format!(
                    "GitHub login {} is mapped from both {} and {}",
                    login, previous, display_name
                )));
            }
            if by_display_name
                .insert(display_name.clone(), login)
                .is_some()
            {
                return Err(SyncError::Config(format!(
                    "Linear user {} is configured twice",
                    display_name
                )));
            }
        }

        Ok(Self {
            by_display_name,
            by_login,
        })
    }

    /// GitHub login -> Linear display name
    pub fn to_external(&self, login: &str) -> Option<&str> {
        self.by_login.get(login).map(String::as_str)
    }

    /// Linear display name -> GitHub login
    pub fn to_ticket_system(&self, display_name: &str) -> Option<&str> {
        self.by_display_name.get(display_name).map(String::as_str)
    }

    /// Known GitHub logins, in stable (sorted) order
    pub fn logins(&self) -> Vec<String> {
        self.by_login.keys().cloned().collect()
    }

    /// Keep only the given GitHub logins. Unknown logins are ignored.
    pub fn restrict_to(&self, logins: &[String]) -> Self {
        let by_login: BTreeMap<String, String> = self
            .by_login
            .iter()
            .filter(|(login, _)| logins.contains(login))
            .map(|(login, name)| (login.clone(), name.clone()))
            .collect();
        let by_display_name = by_login
            .iter()
            .map(|(login, name)| (name.clone(), login.clone()))
            .collect();

        Self {
            by_display_name,
            by_login,
        }
    }

    pub fn len(&self) -> usize {
        self.by_login.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_login.is_empty()
    }
}
