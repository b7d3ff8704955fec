mod common;

use common::*;
use fairway::domain::{
    Disposition, Money, PickRole, Season, TournamentFormat, TournamentId, TournamentStatus,
};
use fairway::orchestration::{Inconsistency, ReconcileError, ResultsReconciler, TournamentLocks};
use fairway::Repository;
use std::sync::Arc;

fn reconciler(repo: &Arc<Repository>) -> ResultsReconciler {
    ResultsReconciler::new(repo.clone(), TournamentLocks::new())
}

#[tokio::test]
async fn test_reconcile_scores_picks_and_records_usage() {
    let (repo, _temp) = setup_repo().await;
    let tid = repo
        .insert_tournament(&tournament("R1", TournamentFormat::Standard, 0))
        .await
        .unwrap();
    let ids = seed_field(
        &repo,
        tid,
        &[
            golfer("100", "Scottie", "Scheffler"),
            golfer("200", "Rory", "McIlroy"),
            golfer("300", "Xander", "Schauffele"),
            golfer("400", "Ludvig", "Aberg"),
        ],
    )
    .await;
    let alice = repo.insert_user("alice", None).await.unwrap();
    let bob = repo.insert_user("bob", None).await.unwrap();
    let alice_pick = place_pick(&repo, alice, tid, ids[0], ids[1]).await;
    let bob_pick = place_pick(&repo, bob, tid, ids[2], ids[3]).await;

    finalize(
        &repo,
        tid,
        &[
            earned("100", "1500000"),
            earned("200", "500000"),
            withdrew("300", 1),
            earned("400", "360000.50"),
        ],
    )
    .await;

    let report = reconciler(&repo).reconcile(tid).await.unwrap();
    assert_eq!(report.picks_resolved, 2);
    assert_eq!(report.usage_inserted, 2);
    assert_eq!(report.usage_removed, 0);
    assert!(report.missing_earnings.is_empty());

    let results = repo.list_results(tid).await.unwrap();
    assert_eq!(results.len(), 2);

    let alice_result = &results[0];
    assert_eq!(alice_result.pick_id, alice_pick.id);
    assert_eq!(alice_result.active_golfer, ids[0]);
    assert_eq!(alice_result.active_role, PickRole::Primary);
    assert_eq!(alice_result.points, Money::from_whole(1_500_000));
    assert_eq!(alice_result.primary_disposition, Disposition::Used);
    assert_eq!(alice_result.backup_disposition, Disposition::Unused);

    // Primary withdrew in Round 1, so the backup plays.
    let bob_result = &results[1];
    assert_eq!(bob_result.pick_id, bob_pick.id);
    assert_eq!(bob_result.active_golfer, ids[3]);
    assert_eq!(bob_result.active_role, PickRole::Backup);
    assert_eq!(bob_result.points, Money::from_whole(360_000));
    assert_eq!(
        bob_result.raw_earnings.unwrap().to_canonical_string(),
        "360000.5"
    );
    assert_eq!(bob_result.primary_disposition, Disposition::ReturnedToPool);
    assert_eq!(bob_result.backup_disposition, Disposition::Used);

    let usage: Vec<_> = repo
        .list_usage_for_tournament(tid)
        .await
        .unwrap()
        .into_iter()
        .map(|u| (u.user_id, u.golfer_id))
        .collect();
    assert_eq!(usage, vec![(alice, ids[0]), (bob, ids[3])]);

    let stored = repo.get_tournament(tid).await.unwrap().unwrap();
    assert_eq!(stored.status, TournamentStatus::Complete);
    assert!(stored.results_finalized);
    assert_eq!(stored.results_digest.as_deref(), Some(report.digest.as_str()));
}

#[tokio::test]
async fn test_reconcile_is_idempotent() {
    let (repo, _temp) = setup_repo().await;
    let tid = repo
        .insert_tournament(&tournament("R1", TournamentFormat::Standard, 0))
        .await
        .unwrap();
    let ids = seed_field(
        &repo,
        tid,
        &[golfer("100", "Scottie", "Scheffler"), golfer("200", "Rory", "McIlroy")],
    )
    .await;
    let alice = repo.insert_user("alice", None).await.unwrap();
    place_pick(&repo, alice, tid, ids[0], ids[1]).await;
    finalize(&repo, tid, &[earned("100", "900000"), earned("200", "10000")]).await;

    let reconciler = reconciler(&repo);
    let first = reconciler.reconcile(tid).await.unwrap();
    let results_after_first = repo.list_results(tid).await.unwrap();
    let usage_after_first = repo.list_usage_for_tournament(tid).await.unwrap();

    let second = reconciler.reconcile(tid).await.unwrap();
    assert_eq!(second.digest, first.digest);
    assert_ne!(second.run_id, first.run_id);
    assert_eq!(second.usage_inserted, 0);
    assert_eq!(second.usage_removed, 0);
    assert_eq!(repo.list_results(tid).await.unwrap(), results_after_first);
    assert_eq!(
        repo.list_usage_for_tournament(tid).await.unwrap(),
        usage_after_first
    );
}

#[tokio::test]
async fn test_correction_moves_usage_to_backup() {
    let (repo, _temp) = setup_repo().await;
    let tid = repo
        .insert_tournament(&tournament("R1", TournamentFormat::Standard, 0))
        .await
        .unwrap();
    let ids = seed_field(
        &repo,
        tid,
        &[golfer("100", "Scottie", "Scheffler"), golfer("200", "Rory", "McIlroy")],
    )
    .await;
    let alice = repo.insert_user("alice", None).await.unwrap();
    place_pick(&repo, alice, tid, ids[0], ids[1]).await;
    finalize(&repo, tid, &[earned("100", "900000"), earned("200", "10000")]).await;

    let reconciler = reconciler(&repo);
    let first = reconciler.reconcile(tid).await.unwrap();

    // The provider later reports the primary as a Round 1 withdrawal.
    repo.store_final_results(tid, &[withdrew("100", 1), earned("200", "10000")])
        .await
        .unwrap();
    let second = reconciler.reconcile(tid).await.unwrap();

    assert_eq!(second.usage_inserted, 1);
    assert_eq!(second.usage_removed, 1);
    assert_ne!(second.digest, first.digest);

    let usage = repo.list_usage_for_tournament(tid).await.unwrap();
    assert_eq!(usage.len(), 1);
    assert_eq!(usage[0].golfer_id, ids[1]);

    let results = repo.list_results(tid).await.unwrap();
    assert_eq!(results[0].active_role, PickRole::Backup);
    assert_eq!(results[0].points, Money::from_whole(10_000));
}

#[tokio::test]
async fn test_late_and_double_withdrawals_score_zero() {
    let (repo, _temp) = setup_repo().await;
    let tid = repo
        .insert_tournament(&tournament("R1", TournamentFormat::Standard, 0))
        .await
        .unwrap();
    let ids = seed_field(
        &repo,
        tid,
        &[
            golfer("100", "Scottie", "Scheffler"),
            golfer("200", "Rory", "McIlroy"),
            golfer("300", "Xander", "Schauffele"),
            golfer("400", "Ludvig", "Aberg"),
        ],
    )
    .await;
    let alice = repo.insert_user("alice", None).await.unwrap();
    let bob = repo.insert_user("bob", None).await.unwrap();
    place_pick(&repo, alice, tid, ids[0], ids[1]).await;
    place_pick(&repo, bob, tid, ids[2], ids[3]).await;

    finalize(
        &repo,
        tid,
        &[
            // Withdrew after completing Round 2: primary stays active.
            withdrew("100", 2),
            earned("200", "700000"),
            // Both withdrew: primary early, backup in Round 3.
            withdrew("300", 0),
            withdrew("400", 2),
        ],
    )
    .await;

    reconciler(&repo).reconcile(tid).await.unwrap();
    let results = repo.list_results(tid).await.unwrap();

    assert_eq!(results[0].active_golfer, ids[0]);
    assert!(results[0].points.is_zero());
    assert!(!results[0].earnings_missing);
    assert_eq!(results[0].primary_disposition, Disposition::Used);
    assert_eq!(results[0].backup_disposition, Disposition::Unused);

    assert_eq!(results[1].active_golfer, ids[2]);
    assert_eq!(results[1].active_role, PickRole::Primary);
    assert!(results[1].points.is_zero());
    assert_eq!(results[1].primary_disposition, Disposition::Used);
    assert_eq!(results[1].backup_disposition, Disposition::ReturnedToPool);

    let used: Vec<_> = repo
        .list_usage_for_tournament(tid)
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.golfer_id)
        .collect();
    assert_eq!(used, vec![ids[0], ids[2]]);
}

#[tokio::test]
async fn test_missing_and_malformed_earnings_score_zero() {
    let (repo, _temp) = setup_repo().await;
    let tid = repo
        .insert_tournament(&tournament("R1", TournamentFormat::Standard, 0))
        .await
        .unwrap();
    let ids = seed_field(
        &repo,
        tid,
        &[
            golfer("100", "Scottie", "Scheffler"),
            golfer("200", "Rory", "McIlroy"),
            golfer("300", "Xander", "Schauffele"),
            golfer("400", "Ludvig", "Aberg"),
        ],
    )
    .await;
    let alice = repo.insert_user("alice", None).await.unwrap();
    let bob = repo.insert_user("bob", None).await.unwrap();
    let alice_pick = place_pick(&repo, alice, tid, ids[0], ids[1]).await;
    let bob_pick = place_pick(&repo, bob, tid, ids[2], ids[3]).await;

    finalize(
        &repo,
        tid,
        &[
            no_earnings("100"),
            earned("200", "50000"),
            earned("300", "N/A"),
            earned("400", "50000"),
        ],
    )
    .await;

    let report = reconciler(&repo).reconcile(tid).await.unwrap();
    let missing: Vec<_> = report
        .missing_earnings
        .iter()
        .map(|m| (m.pick_id, m.golfer_id))
        .collect();
    assert_eq!(missing, vec![(alice_pick.id, ids[0]), (bob_pick.id, ids[2])]);

    let results = repo.list_results(tid).await.unwrap();
    for r in &results {
        assert!(r.points.is_zero());
        assert!(r.earnings_missing);
        assert!(r.raw_earnings.is_none());
        assert_eq!(r.primary_disposition, Disposition::Used);
    }
    assert_eq!(repo.list_usage_for_tournament(tid).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_oversized_earnings_score_zero_under_major_multiplier() {
    let (repo, _temp) = setup_repo().await;
    let tid = repo
        .insert_tournament(&tournament("R1", TournamentFormat::Major, 0))
        .await
        .unwrap();
    let ids = seed_field(
        &repo,
        tid,
        &[golfer("100", "Scottie", "Scheffler"), golfer("200", "Rory", "McIlroy")],
    )
    .await;
    let alice = repo.insert_user("alice", None).await.unwrap();
    let pick = place_pick(&repo, alice, tid, ids[0], ids[1]).await;
    finalize(
        &repo,
        tid,
        &[
            earned("100", "79228162514264337593543950335"),
            earned("200", "10000"),
        ],
    )
    .await;

    let report = reconciler(&repo).reconcile(tid).await.unwrap();
    assert_eq!(report.missing_earnings.len(), 1);
    assert_eq!(report.missing_earnings[0].pick_id, pick.id);
    assert_eq!(report.missing_earnings[0].golfer_id, ids[0]);

    let results = repo.list_results(tid).await.unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].points.is_zero());
    assert!(results[0].earnings_missing);
    assert_eq!(results[0].primary_disposition, Disposition::Used);
    assert_eq!(
        repo.get_tournament(tid).await.unwrap().unwrap().status,
        TournamentStatus::Complete
    );
}

#[tokio::test]
async fn test_concurrent_reconciles_converge() {
    let (repo, _temp) = setup_repo().await;
    let tid = repo
        .insert_tournament(&tournament("R1", TournamentFormat::Standard, 0))
        .await
        .unwrap();
    let ids = seed_field(
        &repo,
        tid,
        &[golfer("100", "Scottie", "Scheffler"), golfer("200", "Rory", "McIlroy")],
    )
    .await;
    let alice = repo.insert_user("alice", None).await.unwrap();
    place_pick(&repo, alice, tid, ids[0], ids[1]).await;
    finalize(&repo, tid, &[earned("100", "900000"), earned("200", "10000")]).await;

    let reconciler = reconciler(&repo);
    let (first, second) = tokio::join!(reconciler.reconcile(tid), reconciler.reconcile(tid));
    let first = first.unwrap();
    let second = second.unwrap();

    assert_eq!(first.digest, second.digest);
    assert_ne!(first.run_id, second.run_id);
    // Serialised runs: only one of them records the usage row.
    assert_eq!(first.usage_inserted + second.usage_inserted, 1);
    assert_eq!(first.usage_removed + second.usage_removed, 0);
    assert_eq!(repo.list_results(tid).await.unwrap().len(), 1);
    assert_eq!(repo.list_usage_for_tournament(tid).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_team_event_halves_and_truncates() {
    let (repo, _temp) = setup_repo().await;
    let tid = repo
        .insert_tournament(&tournament("R1", TournamentFormat::Team, 0))
        .await
        .unwrap();
    let ids = seed_field(
        &repo,
        tid,
        &[golfer("100", "Nick", "Taylor"), golfer("200", "Adam", "Hadwin")],
    )
    .await;
    let alice = repo.insert_user("alice", None).await.unwrap();
    place_pick(&repo, alice, tid, ids[0], ids[1]).await;
    finalize(&repo, tid, &[earned("100", "1000001"), earned("200", "1000001")]).await;

    reconciler(&repo).reconcile(tid).await.unwrap();

    let results = repo.list_results(tid).await.unwrap();
    assert_eq!(results[0].points, Money::from_whole(500_000));
    assert_eq!(
        results[0].raw_earnings,
        Some(Money::from_whole(1_000_001))
    );
}

#[tokio::test]
async fn test_missing_field_entry_aborts_without_writes() {
    let (repo, _temp) = setup_repo().await;
    let tid = repo
        .insert_tournament(&tournament("R1", TournamentFormat::Standard, 0))
        .await
        .unwrap();
    let ids = seed_field(&repo, tid, &[golfer("100", "Scottie", "Scheffler")]).await;
    let outsider = repo
        .upsert_golfer(&golfer("999", "Not", "Entered"))
        .await
        .unwrap();
    let alice = repo.insert_user("alice", None).await.unwrap();
    let pick = place_pick(&repo, alice, tid, ids[0], outsider).await;
    finalize(&repo, tid, &[earned("100", "900000")]).await;

    let err = reconciler(&repo).reconcile(tid).await.unwrap_err();
    match err {
        ReconcileError::DataInconsistency(Inconsistency::MissingFieldEntry {
            pick: p,
            golfer,
            role,
            ..
        }) => {
            assert_eq!(p, pick.id);
            assert_eq!(golfer, outsider);
            assert_eq!(role, PickRole::Backup);
        }
        other => panic!("expected missing field entry, got {:?}", other),
    }

    assert!(repo.list_results(tid).await.unwrap().is_empty());
    assert!(repo.list_usage_for_tournament(tid).await.unwrap().is_empty());
    let stored = repo.get_tournament(tid).await.unwrap().unwrap();
    assert_eq!(stored.status, TournamentStatus::Active);
    assert!(!stored.results_finalized);
    assert!(stored.results_digest.is_none());
}

#[tokio::test]
async fn test_usage_conflict_across_tournaments_aborts() {
    let (repo, _temp) = setup_repo().await;
    let first = repo
        .insert_tournament(&tournament("R1", TournamentFormat::Standard, 0))
        .await
        .unwrap();
    let second = repo
        .insert_tournament(&tournament("R2", TournamentFormat::Standard, 1))
        .await
        .unwrap();
    let golfers = [golfer("100", "Scottie", "Scheffler"), golfer("200", "Rory", "McIlroy")];
    let ids = seed_field(&repo, first, &golfers).await;
    seed_field(&repo, second, &golfers).await;
    let alice = repo.insert_user("alice", None).await.unwrap();

    place_pick(&repo, alice, first, ids[0], ids[1]).await;
    finalize(&repo, first, &[earned("100", "900000"), earned("200", "1")]).await;
    let reconciler = reconciler(&repo);
    reconciler.reconcile(first).await.unwrap();

    // Stored without submission checks, so the same golfer is used twice.
    place_pick(&repo, alice, second, ids[0], ids[1]).await;
    finalize(&repo, second, &[earned("100", "400000"), earned("200", "1")]).await;

    let err = reconciler.reconcile(second).await.unwrap_err();
    match err {
        ReconcileError::DataInconsistency(Inconsistency::UsageConflict {
            user,
            golfer,
            tournament,
            existing,
            ..
        }) => {
            assert_eq!(user, alice);
            assert_eq!(golfer, ids[0]);
            assert_eq!(tournament, second);
            assert_eq!(existing, first);
        }
        other => panic!("expected usage conflict, got {:?}", other),
    }

    assert!(repo.list_results(second).await.unwrap().is_empty());
    assert!(!repo
        .get_tournament(second)
        .await
        .unwrap()
        .unwrap()
        .results_finalized);
    assert_eq!(repo.list_usage_for_tournament(first).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_not_ready_leaves_state_unchanged() {
    let (repo, _temp) = setup_repo().await;
    let tid = repo
        .insert_tournament(&tournament("R1", TournamentFormat::Standard, 0))
        .await
        .unwrap();
    let ids = seed_field(
        &repo,
        tid,
        &[golfer("100", "Scottie", "Scheffler"), golfer("200", "Rory", "McIlroy")],
    )
    .await;
    let alice = repo.insert_user("alice", None).await.unwrap();
    place_pick(&repo, alice, tid, ids[0], ids[1]).await;
    let reconciler = reconciler(&repo);

    let err = reconciler.reconcile(tid).await.unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::NotReady {
            status: TournamentStatus::Upcoming,
            final_confirmed: false,
            ..
        }
    ));

    repo.advance_status(tid, TournamentStatus::Active)
        .await
        .unwrap();
    let err = reconciler.reconcile(tid).await.unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::NotReady {
            status: TournamentStatus::Active,
            final_confirmed: false,
            ..
        }
    ));

    assert!(repo.list_results(tid).await.unwrap().is_empty());
    let stored = repo.get_tournament(tid).await.unwrap().unwrap();
    assert_eq!(stored.status, TournamentStatus::Active);
    assert!(!stored.results_finalized);
}

#[tokio::test]
async fn test_unscored_and_unknown_tournaments_rejected() {
    let (repo, _temp) = setup_repo().await;
    let tid = repo
        .insert_tournament(&tournament("R1", TournamentFormat::OppositeField, 0))
        .await
        .unwrap();
    finalize(&repo, tid, &[]).await;
    let reconciler = reconciler(&repo);

    let err = reconciler.reconcile(tid).await.unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::Ineligible {
            format: TournamentFormat::OppositeField,
            ..
        }
    ));
    assert_ne!(
        repo.get_tournament(tid).await.unwrap().unwrap().status,
        TournamentStatus::Complete
    );

    let err = reconciler
        .reconcile(TournamentId::new(999))
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::NotFound(id) if id == TournamentId::new(999)));
}

#[tokio::test]
async fn test_reconcile_pending_skips_unscored_and_unconfirmed() {
    let (repo, _temp) = setup_repo().await;
    let golfers = [golfer("100", "Scottie", "Scheffler"), golfer("200", "Rory", "McIlroy")];
    let alice = repo.insert_user("alice", None).await.unwrap();

    let mut confirmed = Vec::new();
    for (week, api_id) in ["R1", "R2"].iter().enumerate() {
        let tid = repo
            .insert_tournament(&tournament(api_id, TournamentFormat::Standard, week as i64))
            .await
            .unwrap();
        let ids = seed_field(&repo, tid, &golfers).await;
        // Different primaries so the two weeks do not collide in the ledger.
        let (primary, backup) = if week == 0 { (ids[0], ids[1]) } else { (ids[1], ids[0]) };
        place_pick(&repo, alice, tid, primary, backup).await;
        finalize(&repo, tid, &[earned("100", "100"), earned("200", "200")]).await;
        confirmed.push(tid);
    }

    let opposite = repo
        .insert_tournament(&tournament("R3", TournamentFormat::OppositeField, 1))
        .await
        .unwrap();
    finalize(&repo, opposite, &[]).await;
    let unconfirmed = repo
        .insert_tournament(&tournament("R4", TournamentFormat::Standard, 2))
        .await
        .unwrap();

    let summary = reconciler(&repo)
        .reconcile_pending(Season::new(SEASON))
        .await
        .unwrap();
    assert!(summary.failed.is_empty());
    let reconciled: Vec<TournamentId> = summary
        .reconciled
        .iter()
        .map(|r| r.tournament_id)
        .collect();
    assert_eq!(reconciled, confirmed);

    assert!(!repo
        .get_tournament(opposite)
        .await
        .unwrap()
        .unwrap()
        .results_finalized);
    assert!(!repo
        .get_tournament(unconfirmed)
        .await
        .unwrap()
        .unwrap()
        .results_finalized);

    // Nothing left to do on a second pass.
    let summary = reconciler(&repo)
        .reconcile_pending(Season::new(SEASON))
        .await
        .unwrap();
    assert!(summary.reconciled.is_empty());
}

#[tokio::test]
async fn test_standings_rank_reconciled_points() {
    let (repo, _temp) = setup_repo().await;
    let tid = repo
        .insert_tournament(&tournament("R1", TournamentFormat::Standard, 0))
        .await
        .unwrap();
    let ids = seed_field(
        &repo,
        tid,
        &[
            golfer("100", "Scottie", "Scheffler"),
            golfer("200", "Rory", "McIlroy"),
            golfer("300", "Xander", "Schauffele"),
        ],
    )
    .await;
    let alice = repo.insert_user("alice", None).await.unwrap();
    let bob = repo.insert_user("bob", None).await.unwrap();
    let carol = repo.insert_user("carol", None).await.unwrap();
    let dave = repo.insert_user("dave", None).await.unwrap();
    place_pick(&repo, alice, tid, ids[0], ids[1]).await;
    place_pick(&repo, bob, tid, ids[1], ids[2]).await;
    place_pick(&repo, carol, tid, ids[2], ids[0]).await;

    finalize(
        &repo,
        tid,
        &[
            earned("100", "300000"),
            earned("200", "300000"),
            earned("300", "125000.99"),
        ],
    )
    .await;

    // Unreconciled results do not count.
    let before = repo.standings(Season::new(SEASON)).await.unwrap();
    assert!(before.iter().all(|s| s.points.is_zero() && s.rank == 1));

    reconciler(&repo).reconcile(tid).await.unwrap();
    let standings = repo.standings(Season::new(SEASON)).await.unwrap();

    let table: Vec<_> = standings
        .iter()
        .map(|s| (s.user_id, s.rank, s.points.to_canonical_string(), s.tournaments_scored))
        .collect();
    assert_eq!(
        table,
        vec![
            (alice, 1, "300000".to_string(), 1),
            (bob, 1, "300000".to_string(), 1),
            (carol, 3, "125000".to_string(), 1),
            (dave, 4, "0".to_string(), 0),
        ]
    );
}
