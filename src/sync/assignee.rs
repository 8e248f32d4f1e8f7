//! Default assignee policy for newly synced issues

use crate::identity::IdentityMap;
use std::time::SystemTime;

/// Picks a default assignee among known GitHub logins
pub trait AssigneePicker: Send + Sync {
    fn pick<'a>(&self, candidates: &'a [String]) -> Option<&'a str>;
}

/// Uniform-ish pick seeded from the clock, for load balancing
#[derive(Debug, Clone, Copy, Default)]
pub struct ClockPicker;

impl AssigneePicker for ClockPicker {
    fn pick<'a>(&self, candidates: &'a [String]) -> Option<&'a str> {
        if candidates.is_empty() {
            return None;
        }
        let nanos = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        candidates
            .get(nanos as usize % candidates.len())
            .map(String::as_str)
    }
}

/// Always picks the first candidate
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstPicker;

impl AssigneePicker for FirstPicker {
    fn pick<'a>(&self, candidates: &'a [String]) -> Option<&'a str> {
        candidates.first().map(String::as_str)
    }
}

/// The author when they are a known identity, otherwise the picker's choice.
///
/// Returns `None` only when the identity map is empty.
pub fn resolve_assignee(
    author: &str,
    identities: &IdentityMap,
    picker: &dyn AssigneePicker,
) -> Option<String> {
    if identities.to_external(author).is_some() {
        return Some(author.to_string());
    }
    let candidates = identities.logins();
    picker.pick(&candidates).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identities() -> IdentityMap {
        IdentityMap::from_display_names([("a-name", "a"), ("b-name", "b")]).unwrap()
    }

    #[test]
    fn test_author_wins_over_picker() {
        for _ in 0..20 {
            assert_eq!(
                resolve_assignee("b", &identities(), &ClockPicker).as_deref(),
                Some("b")
            );
        }
    }

    #[test]
    fn test_unknown_author_uses_picker() {
        assert_eq!(
            resolve_assignee("stranger", &identities(), &FirstPicker).as_deref(),
            Some("a")
        );
    }

    #[test]
    fn test_clock_picker_stays_in_range() {
        let candidates = identities().logins();
        for _ in 0..20 {
            let picked = ClockPicker.pick(&candidates).unwrap();
            assert!(candidates.iter().any(|c| c == picked));
        }
    }

    #[test]
    fn test_empty_map() {
        assert_eq!(
            resolve_assignee("stranger", &IdentityMap::default(), &ClockPicker),
            None
        );
    }
}
