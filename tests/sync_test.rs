//! Sync driver behavior against a scripted source

mod common;

use challenge_board::domain::{now_ms, AwardTier, Period};
use challenge_board::sync::StopSignal;
use challenge_board::SyncError;

use common::{monthly_game, progress, tier_of, unlock, FakeSource, RecordingSink, TestBoard};

const GAME: &str = "1234";

#[tokio::test]
async fn test_new_unlock_is_announced_and_awarded_once() {
    let board = TestBoard::new();
    let period = Period::current();
    board.register(&["Alice"]);
    board.add_challenge(&monthly_game(GAME, period));

    let source = FakeSource::new();
    let t = now_ms() - 60_000;
    source.push_unlock("Alice", unlock("W1", GAME, t));
    source.set_progress("Alice", GAME, progress(&["W1", "P1"], 4));
    let sink = RecordingSink::new();
    let driver = board.driver(source.clone(), sink.clone());

    let report = driver.run_cycle(None, &StopSignal::new()).await.unwrap();
    assert!(report.is_complete());
    assert_eq!(report.new_unlocks(), 1);
    assert_eq!(report.upgrades(), 1);
    assert_eq!(sink.unlocks().len(), 1);

    let upgrades = sink.upgrades();
    assert_eq!(upgrades.len(), 1);
    assert_eq!(upgrades[0].previous, AwardTier::None);
    assert_eq!(upgrades[0].tier, AwardTier::Beaten);
    assert_eq!(upgrades[0].earned_count, 2);
    assert_eq!(tier_of(&board.store, "Alice", GAME, period), AwardTier::Beaten);

    // Replaying the same window produces nothing new
    let report = driver.run_cycle(None, &StopSignal::new()).await.unwrap();
    assert_eq!(report.new_unlocks(), 0);
    assert_eq!(report.users[0].replayed, 1);
    assert_eq!(sink.all().len(), 2);
}

#[tokio::test]
async fn test_progress_fetched_once_per_game_per_cycle() {
    let board = TestBoard::new();
    let period = Period::current();
    board.register(&["Alice"]);
    board.add_challenge(&monthly_game(GAME, period));

    let source = FakeSource::new();
    let t = now_ms() - 120_000;
    source.push_unlock("Alice", unlock("X", GAME, t));
    source.push_unlock("Alice", unlock("W1", GAME, t + 1_000));
    source.push_unlock("Alice", unlock("P1", GAME, t + 2_000));
    source.set_progress("Alice", GAME, progress(&["X", "W1", "P1"], 4));
    let sink = RecordingSink::new();
    let driver = board.driver(source.clone(), sink.clone());

    driver.run_cycle(None, &StopSignal::new()).await.unwrap();

    assert_eq!(source.progress_calls("Alice", GAME), 1);
    assert_eq!(sink.unlocks().len(), 3);
    // Announced oldest first
    let order: Vec<_> = sink.unlocks().iter().map(|u| u.achievement_id.clone()).collect();
    assert_eq!(order, ["X", "W1", "P1"]);
    assert_eq!(sink.upgrades().len(), 1);
}

#[tokio::test]
async fn test_unlock_outside_challenges_is_only_announced() {
    let board = TestBoard::new();
    let period = Period::current();
    board.register(&["Alice"]);
    board.add_challenge(&monthly_game(GAME, period));

    let source = FakeSource::new();
    source.push_unlock("Alice", unlock("A1", "777", now_ms() - 1_000));
    let sink = RecordingSink::new();
    let driver = board.driver(source.clone(), sink.clone());

    driver.run_cycle(None, &StopSignal::new()).await.unwrap();

    assert_eq!(sink.unlocks().len(), 1);
    assert!(sink.upgrades().is_empty());
    assert_eq!(source.progress_calls("Alice", "777"), 0);
    assert_eq!(tier_of(&board.store, "Alice", "777", period), AwardTier::None);

    let progress = board.store.progress().get("Alice", "777").unwrap().unwrap();
    assert_eq!(progress.announced.len(), 1);
}

#[tokio::test]
async fn test_failing_user_does_not_block_others_or_advance_watermark() {
    let board = TestBoard::new();
    let period = Period::current();
    board.register(&["Alice", "Bob"]);
    board.add_challenge(&monthly_game(GAME, period));

    let source = FakeSource::new();
    let t = now_ms() - 60_000;
    source.push_unlock("Alice", unlock("W1", GAME, t));
    source.push_unlock("Bob", unlock("X", GAME, t));
    source.set_progress("Alice", GAME, progress(&["W1"], 4));
    source.set_progress("Bob", GAME, progress(&["X"], 4));
    source.fail_user("Alice");
    let sink = RecordingSink::new();
    let driver = board.driver(source.clone(), sink.clone());

    let report = driver.run_once(&StopSignal::new()).await.unwrap();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, "Alice");
    assert_eq!(report.users.len(), 1);
    assert_eq!(report.watermark, None);
    assert_eq!(board.store.sync_state().watermark().unwrap(), None);
    assert_eq!(tier_of(&board.store, "Bob", GAME, period), AwardTier::Participation);

    // Next cycle picks Alice up again; Bob's unlock is not repeated
    source.recover("Alice");
    let report = driver.run_once(&StopSignal::new()).await.unwrap();
    assert!(report.is_complete());
    assert_eq!(report.new_unlocks(), 1);
    assert_eq!(tier_of(&board.store, "Alice", GAME, period), AwardTier::Participation);

    let stored = board.store.sync_state().watermark().unwrap();
    assert_eq!(stored, Some(report.started_at));
    assert_eq!(sink.unlocks().len(), 2);
}

#[tokio::test]
async fn test_unlocks_at_or_before_watermark_are_ignored() {
    let board = TestBoard::new();
    let period = Period::current();
    board.register(&["Alice"]);
    board.add_challenge(&monthly_game(GAME, period));

    let watermark = now_ms() - 10_000;
    let source = FakeSource::new();
    source.push_unlock("Alice", unlock("OLD", GAME, watermark - 5_000));
    source.push_unlock("Alice", unlock("EDGE", GAME, watermark));
    source.push_unlock("Alice", unlock("NEW", GAME, watermark + 1));
    let sink = RecordingSink::new();
    let driver = board.driver(source.clone(), sink.clone());

    let report = driver.run_cycle(Some(watermark), &StopSignal::new()).await.unwrap();
    assert_eq!(report.users[0].fetched, 3);
    let seen: Vec<_> = sink.unlocks().iter().map(|u| u.achievement_id.clone()).collect();
    assert_eq!(seen, ["NEW"]);
    assert_eq!(report.watermark, Some(report.started_at));
}

#[tokio::test]
async fn test_stopped_cycle_keeps_watermark() {
    let board = TestBoard::new();
    board.register(&["Alice", "Bob"]);

    let source = FakeSource::new();
    let sink = RecordingSink::new();
    let driver = board.driver(source.clone(), sink.clone());

    let stop = StopSignal::new();
    stop.stop();
    let report = driver.run_cycle(Some(42), &stop).await.unwrap();
    assert!(report.stopped);
    assert!(report.users.is_empty());
    assert_eq!(report.watermark, Some(42));
}

#[tokio::test]
async fn test_failed_announcement_keeps_award_and_progress() {
    let board = TestBoard::new();
    let period = Period::current();
    board.register(&["Alice"]);
    board.add_challenge(&monthly_game(GAME, period));

    let source = FakeSource::new();
    source.push_unlock("Alice", unlock("W1", GAME, now_ms() - 1_000));
    source.set_progress("Alice", GAME, progress(&["W1", "P1"], 4));
    let sink = RecordingSink::new();
    sink.set_failing(true);
    let driver = board.driver(source.clone(), sink.clone());

    let report = driver.run_cycle(None, &StopSignal::new()).await.unwrap();
    assert!(report.is_complete());
    assert_eq!(tier_of(&board.store, "Alice", GAME, period), AwardTier::Beaten);

    // Already processed: a later replay stays quiet even once the sink is back
    sink.set_failing(false);
    driver.run_cycle(None, &StopSignal::new()).await.unwrap();
    assert!(sink.all().is_empty());
}

#[tokio::test]
async fn test_malformed_progress_defers_evaluation_until_data_recovers() {
    let board = TestBoard::new();
    let period = Period::current();
    board.register(&["Alice"]);
    board.add_challenge(&monthly_game(GAME, period));

    let source = FakeSource::new();
    source.push_unlock("Alice", unlock("W1", GAME, now_ms() - 60_000));
    source.push_unlock("Alice", unlock("P1", GAME, now_ms() - 50_000));
    source.set_progress_error(
        "Alice",
        GAME,
        SyncError::MalformedPayload("unexpected layout".to_string()),
    );
    let sink = RecordingSink::new();
    let driver = board.driver(source.clone(), sink.clone());

    let report = driver.run_once(&StopSignal::new()).await.unwrap();
    assert!(report.is_complete());
    assert!(report.watermark.is_some());
    assert_eq!(report.users[0].skipped, 2);
    assert_eq!(source.progress_calls("Alice", GAME), 1);
    assert_eq!(sink.unlocks().len(), 2);
    assert!(sink.upgrades().is_empty());
    assert_eq!(tier_of(&board.store, "Alice", GAME, period), AwardTier::None);
    assert!(board.store.progress().get("Alice", GAME).unwrap().unwrap().pending_evaluation);

    // Still broken: stays deferred
    let report = driver.run_once(&StopSignal::new()).await.unwrap();
    assert_eq!(report.users[0].skipped, 1);
    assert_eq!(tier_of(&board.store, "Alice", GAME, period), AwardTier::None);

    // The unlocks are now behind the watermark, yet the award is recovered
    source.set_progress("Alice", GAME, progress(&["W1", "P1"], 4));
    let report = driver.run_once(&StopSignal::new()).await.unwrap();
    assert_eq!(report.new_unlocks(), 0);
    assert_eq!(report.users[0].recovered, 1);
    assert_eq!(tier_of(&board.store, "Alice", GAME, period), AwardTier::Beaten);
    assert_eq!(sink.upgrades().len(), 1);
    assert!(!board.store.progress().get("Alice", GAME).unwrap().unwrap().pending_evaluation);

    // Nothing left to redo
    let report = driver.run_once(&StopSignal::new()).await.unwrap();
    assert_eq!(report.users[0].recovered, 0);
    assert_eq!(sink.upgrades().len(), 1);
    assert_eq!(sink.unlocks().len(), 2);
}
