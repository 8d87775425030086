use std::collections::BTreeSet;

/// Diff between the currently published file set and a freshly extracted
/// archive. Paths present on both sides are overwritten in place, never
/// deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub added: Vec<String>,
    pub retained: Vec<String>,
    pub stale: Vec<String>,
}

impl SyncPlan {
    pub fn compute<P, N>(previous_paths: P, new_paths: N) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        N: IntoIterator,
        N::Item: Into<String>,
    {
        let previous: BTreeSet<String> = previous_paths.into_iter().map(Into::into).collect();
        let next: BTreeSet<String> = new_paths.into_iter().map(Into::into).collect();

        Self {
            added: next.difference(&previous).cloned().collect(),
            retained: next.intersection(&previous).cloned().collect(),
            stale: previous.difference(&next).cloned().collect(),
        }
    }
}
