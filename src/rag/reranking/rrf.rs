// Reciprocal Rank Fusion over any number of ranked candidate lists
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::rag::retrieval::{Candidate, SourceKind};

/// Candidates of one source, best first
#[derive(Debug, Clone, PartialEq)]
pub struct SourceResults {
    pub kind: SourceKind,
    pub candidates: Vec<Candidate>,
}

impl SourceResults {
    pub fn new(kind: SourceKind, candidates: Vec<Candidate>) -> Self {
        Self { kind, candidates }
    }
}

/// Position of a document in one source's list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub id: String,
    pub source: SourceKind,
    /// 1-based
    pub rank: usize,
}

/// A document after fusion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedResult {
    pub id: String,
    pub score: f64,
    pub payload: Map<String, Value>,
    /// Rank in every source that returned the document
    pub source_ranks: Vec<RankedCandidate>,
}

struct Accumulator {
    id: String,
    score: f64,
    payload: Map<String, Value>,
    ranks: Vec<Option<usize>>,
}

impl Accumulator {
    /// Ranks in source order, absent ranks last
    fn rank_key(&self) -> Vec<usize> {
        self.ranks.iter().map(|r| r.unwrap_or(usize::MAX)).collect()
    }
}

/// Fuse ranked lists: each id scores the sum of `1 / (k + rank)` over the
/// lists containing it. Output is sorted by score descending; equal scores
/// are ordered by rank in the first source, then the next, then by id.
/// Only the first occurrence of an id within one list counts.
pub fn reciprocal_rank_fusion(lists: Vec<SourceResults>, k: f64, limit: usize) -> Vec<FusedResult> {
    let kinds: Vec<SourceKind> = lists.iter().map(|list| list.kind).collect();
    let mut fused: Vec<Accumulator> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (source_idx, list) in lists.into_iter().enumerate() {
        let mut seen: HashSet<String> = HashSet::new();

        for (pos, candidate) in list.candidates.into_iter().enumerate() {
            if !seen.insert(candidate.id.clone()) {
                continue;
            }
            let rank = pos + 1;
            let contribution = 1.0 / (k + rank as f64);

            match positions.get(&candidate.id) {
                Some(&idx) => {
                    fused[idx].score += contribution;
                    fused[idx].ranks[source_idx] = Some(rank);
                }
                None => {
                    let mut ranks = vec![None; kinds.len()];
                    ranks[source_idx] = Some(rank);
                    positions.insert(candidate.id.clone(), fused.len());
                    fused.push(Accumulator {
                        id: candidate.id,
                        score: contribution,
                        payload: candidate.payload,
                        ranks,
                    });
                }
            }
        }
    }

    fused.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.rank_key().cmp(&b.rank_key()))
            .then_with(|| a.id.cmp(&b.id))
    });
    fused.truncate(limit);

    fused
        .into_iter()
        .map(|acc| {
            let source_ranks = acc
                .ranks
                .iter()
                .zip(&kinds)
                .filter_map(|(rank, kind)| {
                    rank.map(|rank| RankedCandidate {
                        id: acc.id.clone(),
                        source: *kind,
                        rank,
                    })
                })
                .collect();

            FusedResult {
                id: acc.id,
                score: acc.score,
                payload: acc.payload,
                source_ranks,
            }
        })
        .collect()
}
