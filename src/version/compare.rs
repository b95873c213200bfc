use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Prefixes removed before comparison, tried in this order. At most one
/// is stripped, so "version1.0" only loses its leading "v".
const PREFIXES: [&str; 7] = ["v", "version", "ver", "release", "rel", "r", "v."];

/// How the running version relates to the reference version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Older,
    Equal,
    Newer,
}

impl From<Ordering> for Verdict {
    fn from(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => Verdict::Older,
            Ordering::Equal => Verdict::Equal,
            Ordering::Greater => Verdict::Newer,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Older => write!(f, "older"),
            Verdict::Equal => write!(f, "equal"),
            Verdict::Newer => write!(f, "newer"),
        }
    }
}

/// Lower-cases `version` and removes the first matching known prefix.
pub fn strip_prefix(version: &str) -> String {
    let version = version.to_lowercase();
    PREFIXES
        .iter()
        .find_map(|prefix| version.strip_prefix(prefix))
        .map(str::to_string)
        .unwrap_or(version)
}

/// Splits a component into its leading digits (leading zeros removed)
/// and the remaining suffix.
///
/// A component without leading digits counts as 0 and keeps all of its
/// text as suffix.
fn split_component(component: &str) -> (&str, &str) {
    let digits_end = component
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(component.len());
    let (digits, suffix) = component.split_at(digits_end);
    (digits.trim_start_matches('0'), suffix)
}

/// Orders two zero-trimmed digit runs by numeric value, whatever their length.
fn cmp_digits(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Compares `own` against `other`.
///
/// Components are compared pairwise: numerically first, then by suffix.
/// When all shared components are equal, the version with more
/// components is the newer one.
pub fn compare(own: &str, other: &str) -> Ordering {
    let own = strip_prefix(own);
    let other = strip_prefix(other);

    let own_parts: Vec<&str> = own.split('.').collect();
    let other_parts: Vec<&str> = other.split('.').collect();

    for (a, b) in own_parts.iter().zip(other_parts.iter()) {
        let (a_num, a_suffix) = split_component(a);
        let (b_num, b_suffix) = split_component(b);

        let ordering = cmp_digits(a_num, b_num).then_with(|| a_suffix.cmp(b_suffix));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    own_parts.len().cmp(&other_parts.len())
}

/// [`compare`] as -1 (older), 0 (equal) or 1 (newer).
pub fn compare_versions(own: &str, other: &str) -> i32 {
    match compare(own, other) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}
