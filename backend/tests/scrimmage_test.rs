use bot_arena_backend::services::scrimmage::{MATCHES_PER_PLAYER, build_pairings};
use std::collections::HashSet;

#[test]
fn test_four_players_produce_full_round_robin() {
    // with only four players every window covers the whole table
    let pairings = build_pairings(4);
    assert_eq!(
        pairings,
        vec![(1, 0), (2, 0), (2, 1), (3, 0), (3, 1), (3, 2)],
        "four players should play all six unique pairings"
    );
}

#[test]
fn test_pairings_are_normalized_and_unique() {
    let pairings = build_pairings(12);
    let unique: HashSet<_> = pairings.iter().collect();
    assert_eq!(unique.len(), pairings.len(), "pairings must be deduplicated");
    for &(low_seed, high_seed) in &pairings {
        assert!(
            low_seed > high_seed,
            "pairs are (worse seed, better seed): got ({low_seed}, {high_seed})"
        );
    }
}

#[test]
fn test_pairings_stay_within_rating_window() {
    for player_count in [5, 8, 16, 40] {
        for &(low_seed, high_seed) in &build_pairings(player_count) {
            assert!(
                low_seed - high_seed <= MATCHES_PER_PLAYER,
                "{player_count} players: pair ({low_seed}, {high_seed}) spans more than the window"
            );
        }
    }
}

#[test]
fn test_every_player_gets_enough_matches() {
    for player_count in [4, 7, 10, 25] {
        let pairings = build_pairings(player_count);
        for player in 0..player_count {
            let appearances = pairings
                .iter()
                .filter(|&&(a, b)| a == player || b == player)
                .count();
            let expected_minimum = MATCHES_PER_PLAYER.min(player_count - 1);
            assert!(
                appearances >= expected_minimum,
                "{player_count} players: player {player} only has {appearances} matches"
            );
        }
    }
}

#[test]
fn test_interior_players_play_their_window_exactly() {
    // far from both edges a player meets two neighbours on each side
    let pairings = build_pairings(50);
    let appearances = pairings
        .iter()
        .filter(|&&(a, b)| a == 25 || b == 25)
        .count();
    assert_eq!(
        appearances, MATCHES_PER_PLAYER,
        "an interior player plays exactly the window size"
    );
}

#[test]
fn test_too_few_players_produce_nothing() {
    assert!(build_pairings(0).is_empty());
    assert!(build_pairings(1).is_empty());
}

#[test]
fn test_two_players_produce_one_pairing() {
    assert_eq!(build_pairings(2), vec![(1, 0)]);
}
