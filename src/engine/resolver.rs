//! Pick resolution: converts a primary/backup pick plus withdrawal and
//! earnings data into a scored outcome.

use crate::domain::{
    Disposition, Money, Pick, PickRole, Resolution, TournamentFormat, Withdrawal,
    BACKUP_CUTOFF_ROUNDS,
};
use rust_decimal::Decimal as RustDecimal;
use thiserror::Error;

/// What the tournament did to one golfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GolferOutcome {
    pub withdrawal: Withdrawal,
    /// Final prize money; `None` when the feed has no usable figure
    /// (missed cut, absent, or malformed).
    pub earnings: Option<Money>,
}

impl GolferOutcome {
    pub fn new(withdrawal: Withdrawal, earnings: Option<Money>) -> Self {
        Self {
            withdrawal,
            earnings,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("{0} tournaments are not scored")]
    Ineligible(TournamentFormat),
}

/// Row of the decision table that applied to a pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionCase {
    /// Primary did not withdraw.
    PrimaryPlayed,
    /// Primary withdrew after completing Round 2.
    PrimaryWithdrewLate,
    /// Primary withdrew before completing Round 2, backup did not withdraw.
    BackupActivated,
    /// Primary withdrew before completing Round 2, backup withdrew at any point.
    BothWithdrew,
}

/// Select the decision-table row. Arms are evaluated top to bottom and the
/// order is the rule priority.
pub fn classify(primary: Withdrawal, backup: Withdrawal) -> ResolutionCase {
    match (primary, backup) {
        (Withdrawal::Active, _) => ResolutionCase::PrimaryPlayed,
        (Withdrawal::Withdrawn { rounds_completed }, _)
            if rounds_completed >= BACKUP_CUTOFF_ROUNDS =>
        {
            ResolutionCase::PrimaryWithdrewLate
        }
        (Withdrawal::Withdrawn { .. }, Withdrawal::Active) => ResolutionCase::BackupActivated,
        (Withdrawal::Withdrawn { .. }, Withdrawal::Withdrawn { .. }) => {
            ResolutionCase::BothWithdrew
        }
    }
}

/// Scale earnings by the format multiplier, truncated to whole units.
///
/// Team events use a 0.5 multiplier, which on non-negative whole amounts is
/// exactly integer division by two.
pub fn apply_multiplier(earnings: Money, multiplier: RustDecimal) -> Money {
    (earnings * multiplier).trunc()
}

/// Resolve one pick.
///
/// Pure: identical inputs always produce an identical `Resolution`.
///
/// # Errors
/// Returns `ResolveError::Ineligible` for formats excluded from scoring.
pub fn resolve_pick(
    pick: &Pick,
    primary: &GolferOutcome,
    backup: &GolferOutcome,
    format: TournamentFormat,
) -> Result<Resolution, ResolveError> {
    let multiplier = format
        .multiplier()
        .ok_or(ResolveError::Ineligible(format))?;

    let resolution = match classify(primary.withdrawal, backup.withdrawal) {
        ResolutionCase::PrimaryPlayed => scored(
            pick,
            PickRole::Primary,
            primary.earnings,
            multiplier,
            Disposition::Used,
            Disposition::Unused,
        ),
        ResolutionCase::PrimaryWithdrewLate => {
            zero_points(pick, Disposition::Used, Disposition::Unused)
        }
        ResolutionCase::BackupActivated => scored(
            pick,
            PickRole::Backup,
            backup.earnings,
            multiplier,
            Disposition::ReturnedToPool,
            Disposition::Used,
        ),
        ResolutionCase::BothWithdrew => {
            zero_points(pick, Disposition::Used, Disposition::ReturnedToPool)
        }
    };

    Ok(resolution)
}

fn scored(
    pick: &Pick,
    role: PickRole,
    earnings: Option<Money>,
    multiplier: RustDecimal,
    primary_disposition: Disposition,
    backup_disposition: Disposition,
) -> Resolution {
    let points = earnings
        .map(|e| apply_multiplier(e, multiplier))
        .unwrap_or_else(Money::zero);

    Resolution {
        active_golfer: pick.golfer(role),
        active_role: role,
        raw_earnings: earnings,
        points,
        earnings_missing: earnings.is_none(),
        primary_disposition,
        backup_disposition,
    }
}

/// Primary stays active and scores nothing by rule.
fn zero_points(
    pick: &Pick,
    primary_disposition: Disposition,
    backup_disposition: Disposition,
) -> Resolution {
    Resolution {
        active_golfer: pick.primary,
        active_role: PickRole::Primary,
        raw_earnings: None,
        points: Money::zero(),
        earnings_missing: false,
        primary_disposition,
        backup_disposition,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GolferId, PickId, TimeMs, TournamentId, UserId};

    fn pick() -> Pick {
        Pick {
            id: PickId::new(1),
            user_id: UserId::new(1),
            tournament_id: TournamentId::new(1),
            primary: GolferId::new(100),
            backup: GolferId::new(200),
            submitted_at: TimeMs::new(0),
        }
    }

    fn played(earnings: i64) -> GolferOutcome {
        GolferOutcome::new(Withdrawal::Active, Some(Money::from_whole(earnings)))
    }

    fn wd(rounds: u8) -> GolferOutcome {
        GolferOutcome::new(
            Withdrawal::Withdrawn {
                rounds_completed: rounds,
            },
            None,
        )
    }

    #[test]
    fn test_classify_priority_order() {
        use ResolutionCase::*;
        let active = Withdrawal::Active;
        let early = Withdrawal::Withdrawn { rounds_completed: 1 };
        let late = Withdrawal::Withdrawn { rounds_completed: 2 };

        assert_eq!(classify(active, active), PrimaryPlayed);
        assert_eq!(classify(active, early), PrimaryPlayed);
        assert_eq!(classify(late, active), PrimaryWithdrewLate);
        // Backup state is irrelevant once the primary reached Round 2.
        assert_eq!(classify(late, early), PrimaryWithdrewLate);
        assert_eq!(classify(early, active), BackupActivated);
        assert_eq!(classify(early, early), BothWithdrew);
        assert_eq!(classify(early, late), BothWithdrew);
    }

    #[test]
    fn test_primary_played_standard() {
        let r = resolve_pick(&pick(), &played(1_000_000), &played(5), TournamentFormat::Standard)
            .unwrap();
        assert_eq!(r.active_golfer, GolferId::new(100));
        assert_eq!(r.active_role, PickRole::Primary);
        assert_eq!(r.points, Money::from_whole(1_000_000));
        assert_eq!(r.primary_disposition, Disposition::Used);
        assert_eq!(r.backup_disposition, Disposition::Unused);
        assert!(!r.earnings_missing);
    }

    #[test]
    fn test_primary_withdrew_after_round_two_scores_zero() {
        let r = resolve_pick(&pick(), &wd(3), &played(900_000), TournamentFormat::Standard)
            .unwrap();
        assert_eq!(r.active_golfer, GolferId::new(100));
        assert_eq!(r.points, Money::zero());
        assert_eq!(r.primary_disposition, Disposition::Used);
        assert_eq!(r.backup_disposition, Disposition::Unused);
    }

    #[test]
    fn test_backup_activates_on_early_withdrawal() {
        let r = resolve_pick(&pick(), &wd(1), &played(250_000), TournamentFormat::Standard)
            .unwrap();
        assert_eq!(r.active_golfer, GolferId::new(200));
        assert_eq!(r.active_role, PickRole::Backup);
        assert_eq!(r.points, Money::from_whole(250_000));
        assert_eq!(r.primary_disposition, Disposition::ReturnedToPool);
        assert_eq!(r.backup_disposition, Disposition::Used);
    }

    #[test]
    fn test_both_withdrew_keeps_primary_with_zero() {
        let r = resolve_pick(&pick(), &wd(0), &wd(3), TournamentFormat::Major).unwrap();
        assert_eq!(r.active_golfer, GolferId::new(100));
        assert_eq!(r.points, Money::zero());
        assert_eq!(r.primary_disposition, Disposition::Used);
        assert_eq!(r.backup_disposition, Disposition::ReturnedToPool);
    }

    #[test]
    fn test_team_multiplier_integer_division() {
        let r = resolve_pick(&pick(), &played(1_000_000), &played(0), TournamentFormat::Team)
            .unwrap();
        assert_eq!(r.points, Money::from_whole(500_000));
        assert_eq!(r.raw_earnings, Some(Money::from_whole(1_000_000)));

        let r = resolve_pick(&pick(), &played(1_000_001), &played(0), TournamentFormat::Team)
            .unwrap();
        assert_eq!(r.points, Money::from_whole(500_000));
    }

    #[test]
    fn test_major_multiplier() {
        let r = resolve_pick(&pick(), &played(1_000_000), &played(0), TournamentFormat::Major)
            .unwrap();
        assert_eq!(r.points, Money::from_whole(1_500_000));
    }

    #[test]
    fn test_multiplier_applies_to_active_backup_only() {
        let r = resolve_pick(&pick(), &wd(0), &played(400_000), TournamentFormat::Major).unwrap();
        assert_eq!(r.points, Money::from_whole(600_000));
    }

    #[test]
    fn test_missing_earnings_scores_zero_without_error() {
        let primary = GolferOutcome::new(Withdrawal::Active, None);
        let r = resolve_pick(&pick(), &primary, &played(1), TournamentFormat::Standard).unwrap();
        assert_eq!(r.points, Money::zero());
        assert!(r.earnings_missing);
        assert_eq!(r.primary_disposition, Disposition::Used);
    }

    #[test]
    fn test_ineligible_formats_rejected() {
        for format in [
            TournamentFormat::OppositeField,
            TournamentFormat::TourChampionship,
        ] {
            let err = resolve_pick(&pick(), &played(1), &played(1), format).unwrap_err();
            assert_eq!(err, ResolveError::Ineligible(format));
        }
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let a = resolve_pick(&pick(), &wd(1), &played(77_777), TournamentFormat::Team).unwrap();
        let b = resolve_pick(&pick(), &wd(1), &played(77_777), TournamentFormat::Team).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.points, Money::from_whole(38_888));
    }
}
