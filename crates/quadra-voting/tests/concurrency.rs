//! Concurrent callers sharing one engine.

use std::sync::Arc;
use std::thread;

use quadra_types::{Address, Timestamp};
use quadra_voting::{EngineConfig, VotingEngine, VotingError};

const T0: Timestamp = Timestamp::new(10_000);

fn admin() -> Address {
    Address::from_bytes([0xaa; 20])
}

#[test]
fn test_same_voter_races_on_one_proposal() {
    let engine = Arc::new(VotingEngine::new(EngineConfig::new(admin())).unwrap());
    let voter = Address::from_bytes([1u8; 20]);
    engine.register_voter(&admin(), voter).unwrap();
    let id = engine.create_proposal(&admin(), "Race", "", 3_600, T0).unwrap();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.cast_vote(voter, id, 25, T0))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let accepted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(accepted, 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| *e == VotingError::AlreadyVoted));

    assert_eq!(engine.get_voter_info(&voter).unwrap().used_credits, 25);
    assert_eq!(engine.get_proposal(id).unwrap().total_votes, 5);
}

#[test]
fn test_same_voter_races_across_proposals() {
    let engine = Arc::new(VotingEngine::new(EngineConfig::new(admin())).unwrap());
    let voter = Address::from_bytes([1u8; 20]);
    engine.register_voter(&admin(), voter).unwrap();
    let ids: Vec<u64> = (0..8)
        .map(|i| engine.create_proposal(&admin(), &format!("P{}", i), "", 3_600, T0).unwrap())
        .collect();

    // 8 x 30 credits against a budget of 100: at most 3 can succeed
    let handles: Vec<_> = ids
        .iter()
        .map(|&id| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.cast_vote(voter, id, 30, T0))
        })
        .collect();

    let accepted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|r| r.is_ok())
        .count();
    assert_eq!(accepted, 3);

    let info = engine.get_voter_info(&voter).unwrap();
    assert_eq!(info.used_credits, 90);
    assert!(engine.snapshot().validate().is_ok());
}

#[test]
fn test_many_voters_in_parallel() {
    let engine = Arc::new(VotingEngine::new(EngineConfig::new(admin())).unwrap());
    let id = engine.create_proposal(&admin(), "Busy", "", 3_600, T0).unwrap();
    let voters: Vec<Address> = (1..=32u8).map(|n| Address::from_bytes([n; 20])).collect();
    for v in &voters {
        engine.register_voter(&admin(), *v).unwrap();
    }

    let handles: Vec<_> = voters
        .iter()
        .map(|&v| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.cast_vote(v, id, 49, T0).map(|r| r.votes))
        })
        .collect();

    for h in handles {
        assert_eq!(h.join().unwrap(), Ok(7));
    }
    assert_eq!(engine.get_proposal(id).unwrap().total_votes, 32 * 7);
    assert_eq!(engine.get_proposal(id).unwrap().voter_count, 32);
}
