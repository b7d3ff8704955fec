//! Season usage ledger: desired-state computation, diffing, and the
//! deterministic digest of a tournament's reconciled output.

use crate::domain::{
    Pick, PickRole, Resolution, Season, SeasonPlayerUsage, TournamentId, TournamentResult,
};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};

/// Rows to add and remove to turn the current ledger into the desired one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageDiff {
    pub insert: Vec<SeasonPlayerUsage>,
    pub remove: Vec<SeasonPlayerUsage>,
}

impl UsageDiff {
    pub fn is_empty(&self) -> bool {
        self.insert.is_empty() && self.remove.is_empty()
    }
}

/// A desired row whose (user, golfer, season) key is already held by a
/// different tournament.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageConflict {
    pub desired: SeasonPlayerUsage,
    pub existing_tournament: TournamentId,
}

/// Usage rows implied by a tournament's resolutions: one row per golfer with
/// a `used` disposition.
pub fn desired_usage<'a, I>(season: Season, resolved: I) -> BTreeSet<SeasonPlayerUsage>
where
    I: IntoIterator<Item = (&'a Pick, &'a Resolution)>,
{
    let mut rows = BTreeSet::new();
    for (pick, resolution) in resolved {
        for role in [PickRole::Primary, PickRole::Backup] {
            if resolution.disposition(role).is_used() {
                rows.insert(SeasonPlayerUsage {
                    user_id: pick.user_id,
                    golfer_id: pick.golfer(role),
                    season,
                    tournament_id: pick.tournament_id,
                });
            }
        }
    }
    rows
}

/// Diff one tournament's current rows against its desired rows.
pub fn diff(
    current: &BTreeSet<SeasonPlayerUsage>,
    desired: &BTreeSet<SeasonPlayerUsage>,
) -> UsageDiff {
    UsageDiff {
        insert: desired.difference(current).copied().collect(),
        remove: current.difference(desired).copied().collect(),
    }
}

/// Desired rows that collide with usage recorded by other tournaments.
///
/// `others` must not contain rows of the tournament being reconciled.
pub fn find_conflicts(
    desired: &BTreeSet<SeasonPlayerUsage>,
    others: &[SeasonPlayerUsage],
) -> Vec<UsageConflict> {
    let held: BTreeMap<_, TournamentId> = others
        .iter()
        .map(|u| ((u.user_id, u.golfer_id, u.season), u.tournament_id))
        .collect();

    desired
        .iter()
        .filter_map(|row| {
            held.get(&(row.user_id, row.golfer_id, row.season))
                .filter(|t| **t != row.tournament_id)
                .map(|t| UsageConflict {
                    desired: *row,
                    existing_tournament: *t,
                })
        })
        .collect()
}

fn hash_var(hasher: &mut Sha256, data: &str) {
    hasher.update((data.len() as u32).to_le_bytes());
    hasher.update(data.as_bytes());
}

fn hash_opt(hasher: &mut Sha256, data: Option<String>) {
    match data {
        Some(s) => {
            hasher.update([1u8]);
            hash_var(hasher, &s);
        }
        None => hasher.update([0u8]),
    }
}

/// SHA-256 over the results (by pick id) and usage rows (in ledger order).
///
/// Identical reconciled output always produces the same digest.
pub fn results_digest(
    results: &[TournamentResult],
    usage: &BTreeSet<SeasonPlayerUsage>,
) -> String {
    let mut ordered: Vec<&TournamentResult> = results.iter().collect();
    ordered.sort_by_key(|r| r.pick_id);

    let mut hasher = Sha256::new();
    hasher.update((ordered.len() as u32).to_le_bytes());
    for r in ordered {
        hasher.update(r.pick_id.as_i64().to_le_bytes());
        hasher.update(r.tournament_id.as_i64().to_le_bytes());
        hasher.update(r.user_id.as_i64().to_le_bytes());
        hasher.update(r.primary_golfer.as_i64().to_le_bytes());
        hasher.update(r.backup_golfer.as_i64().to_le_bytes());
        hasher.update(r.active_golfer.as_i64().to_le_bytes());
        hash_var(&mut hasher, r.active_role.as_str());
        hash_opt(&mut hasher, r.raw_earnings.map(|m| m.to_canonical_string()));
        hash_var(&mut hasher, &r.points.to_canonical_string());
        hasher.update([r.earnings_missing as u8]);
        hash_var(&mut hasher, r.primary_disposition.as_str());
        hash_var(&mut hasher, r.backup_disposition.as_str());
    }

    hasher.update((usage.len() as u32).to_le_bytes());
    for u in usage {
        hasher.update(u.user_id.as_i64().to_le_bytes());
        hasher.update(u.golfer_id.as_i64().to_le_bytes());
        hasher.update(u.season.year().to_le_bytes());
        hasher.update(u.tournament_id.as_i64().to_le_bytes());
    }

    format!("sha256:{}", hex::encode(hasher.finalize()))
}
