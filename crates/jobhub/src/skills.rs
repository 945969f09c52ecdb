//! Canonical form of skill tags shared by job requirements and profiles.

use std::collections::HashSet;

/// Trim, lowercase and collapse inner whitespace. Blank tags yield `None`.
pub fn normalize_skill(raw: &str) -> Option<String> {
    let skill = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    (!skill.is_empty()).then_some(skill)
}

/// Normalise every tag and drop duplicates, keeping first-seen order.
pub fn normalize_skills<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    raw.into_iter()
        .filter_map(|skill| normalize_skill(skill.as_ref()))
        .filter(|skill| seen.insert(skill.clone()))
        .collect()
}
