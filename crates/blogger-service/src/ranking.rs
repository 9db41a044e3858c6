use serde::Serialize;

use crate::repositories::EngagementCounts;

pub const POPULAR_LIMIT: usize = 10;

/// An item paired with its engagement counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scored<T> {
    #[serde(flatten)]
    pub item: T,
    #[serde(flatten)]
    pub counts: EngagementCounts,
}

impl<T> Scored<T> {
    pub fn new(item: T, counts: EngagementCounts) -> Self {
        Self { item, counts }
    }
}

/// Most popular first. Items nobody liked are left out whatever their
/// dislikes; equal scores keep their input order.
pub fn rank<T>(candidates: Vec<Scored<T>>) -> Vec<Scored<T>> {
    let mut ranked: Vec<Scored<T>> = candidates
        .into_iter()
        .filter(|candidate| candidate.counts.likes() > 0)
        .collect();
    ranked.sort_by_key(|candidate| candidate.counts.popularity_score());
    ranked.truncate(POPULAR_LIMIT);
    ranked
}
