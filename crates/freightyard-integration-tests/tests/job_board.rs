//! Integration test: the shared job board under concurrent use, wired to a
//! running change notifier.

use freightyard_core::config::{EngineConfig, NotifierConfig};
use freightyard_core::engine::{JobBoard, TransitionError};
use freightyard_core::event::{ChangeNotifier, StationChanged};
use freightyard_core::id::StationId;
use freightyard_core::job::JobType;
use freightyard_core::test_utils::*;
use freightyard_core::validation::check_invariants;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);

fn coal_load(board: &JobBoard) -> freightyard_core::id::JobId {
    board
        .with_network(|net| first_spawned(net, StationId::Cm, JobType::ShuntingLoad))
        .unwrap()
}

// ---------------------------------------------------------------------------
// Reservation race
// ---------------------------------------------------------------------------

#[test]
fn one_winner_when_many_reserve_at_once() {
    const PLAYERS: usize = 8;
    let board = Arc::new(JobBoard::standard(
        EngineConfig::with_seed(3),
        Arc::new(RecordingSink::default()),
    ));
    let id = coal_load(&board);
    let barrier = Arc::new(Barrier::new(PLAYERS));

    let handles: Vec<_> = (0..PLAYERS)
        .map(|i| {
            let board = Arc::clone(&board);
            let barrier = Arc::clone(&barrier);
            let id = id.clone();
            thread::spawn(move || {
                let user = username(&format!("player{i}"));
                barrier.wait();
                (user.clone(), board.reserve(&user, &id))
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners: Vec<_> = results.iter().filter(|(_, r)| r.is_ok()).collect();
    assert_eq!(winners.len(), 1);
    let winner = winners[0].0.clone();
    for (_, result) in results.iter().filter(|(_, r)| r.is_err()) {
        assert_eq!(
            result,
            &Err(TransitionError::AlreadyReserved {
                job: id.clone(),
                by: winner.clone(),
            })
        );
    }

    // Only the winner may go on.
    let loser = results.iter().find(|(u, _)| u != &winner).unwrap().0.clone();
    assert!(matches!(
        board.take(&loser, &id),
        Err(TransitionError::NotReservedBy { .. })
    ));
    assert!(board.take(&winner, &id).is_ok());
    assert!(board.finish(&winner, &id).is_ok());
}

#[test]
fn readers_run_alongside_writers() {
    let board = Arc::new(JobBoard::standard(
        EngineConfig::with_seed(11),
        Arc::new(RecordingSink::default()),
    ));

    let writer = {
        let board = Arc::clone(&board);
        thread::spawn(move || {
            let user = username("writer");
            for _ in 0..20 {
                let Some(id) = board.with_network(|net| {
                    net.jobs()
                        .find(|j| j.is_spawned() && !j.is_reserved())
                        .map(|j| j.id().clone())
                }) else {
                    break;
                };
                let _ = board
                    .reserve(&user, &id)
                    .and_then(|_| board.take(&user, &id))
                    .and_then(|_| board.finish(&user, &id));
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let board = Arc::clone(&board);
            thread::spawn(move || {
                for _ in 0..200 {
                    for station in StationId::ALL {
                        for job in board.list_jobs(station, None) {
                            assert!(job.is_spawned());
                            assert_eq!(job.origin(), station);
                        }
                    }
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }
    assert!(board.with_network(check_invariants).is_empty());
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[test]
fn board_changes_reach_station_subscribers() {
    let notifier = ChangeNotifier::spawn(NotifierConfig::default()).unwrap();
    let handle = notifier.handle();
    let alice = handle.join("alice").unwrap();
    let bob = handle.join("bob").unwrap();
    handle.subscribe(alice.id(), StationId::Cm).unwrap();
    handle.subscribe(alice.id(), StationId::Sm).unwrap();
    handle.subscribe(bob.id(), StationId::Sw).unwrap();

    let board = JobBoard::standard(EngineConfig::with_seed(5), Arc::new(handle.clone()));
    let id = coal_load(&board);
    let user = username("alice");

    // Reserving alone is silent.
    board.reserve(&user, &id).unwrap();
    handle.roster().unwrap();
    assert!(alice.drain().is_empty());

    // Take and finish each touch the mine only.
    board.take(&user, &id).unwrap();
    board.finish(&user, &id).unwrap();
    assert_eq!(alice.next_event(WAIT), Some(StationChanged::new(StationId::Cm)));
    assert_eq!(alice.next_event(WAIT), Some(StationChanged::new(StationId::Cm)));

    handle.roster().unwrap();
    assert!(alice.drain().is_empty());
    assert!(bob.drain().is_empty());

    let stats = notifier.shutdown();
    assert_eq!(stats.published, 2);
    assert_eq!(stats.delivered, 2);
}

#[test]
fn departed_subscribers_are_pruned() {
    let notifier = ChangeNotifier::spawn(NotifierConfig::default()).unwrap();
    let handle = notifier.handle();
    let stays = handle.join("stays").unwrap();
    let leaves = handle.join("leaves").unwrap();
    handle.subscribe(stays.id(), StationId::Hb).unwrap();
    handle.subscribe(leaves.id(), StationId::Hb).unwrap();
    drop(leaves);

    let board = JobBoard::standard(EngineConfig::default(), Arc::new(handle.clone()));
    board.notify_station(StationId::Hb);

    assert_eq!(stays.next_event(WAIT), Some(StationChanged::new(StationId::Hb)));
    let roster = handle.roster().unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].username.as_str(), "stays");
    assert_eq!(handle.stats().pruned_subscribers, 1);
}
