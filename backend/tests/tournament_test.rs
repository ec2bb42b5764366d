use bot_arena_backend::services::match_runner::{MatchPlayer, UserSubmission};
use bot_arena_backend::services::tournament::{
    interleave, pad_to_power_of_two, series_winner,
};

fn make_player(name: &str, rating: i32) -> MatchPlayer {
    MatchPlayer {
        user: UserSubmission {
            username: name.to_string(),
            bucket: "bot-submissions".to_string(),
            object_key: format!("{name}.py"),
        },
        rating,
    }
}

fn seed(names: &[&str]) -> Vec<Option<MatchPlayer>> {
    let players = names
        .iter()
        .enumerate()
        .map(|(i, name)| Some(make_player(name, 2000 - i as i32 * 100)))
        .collect();
    interleave(pad_to_power_of_two(players))
}

fn username(slot: &Option<MatchPlayer>) -> Option<&str> {
    slot.as_ref().map(|p| p.user.username.as_str())
}

#[test]
fn test_interleave_pairs_top_seed_with_bottom_seed() {
    assert_eq!(interleave(vec![1, 2, 3, 4]), vec![1, 4, 2, 3]);
    assert_eq!(
        interleave(vec![1, 2, 3, 4, 5, 6, 7, 8]),
        vec![1, 8, 2, 7, 3, 6, 4, 5]
    );
}

#[test]
fn test_interleave_of_two_keeps_order() {
    assert_eq!(interleave(vec!["winner_a", "winner_b"]), vec!["winner_a", "winner_b"]);
}

#[test]
fn test_padding_reaches_next_power_of_two() {
    let padded = pad_to_power_of_two(vec![Some(make_player("s1", 1500))]);
    assert_eq!(padded.len(), 1, "one player is already a power of two");

    let padded = pad_to_power_of_two(
        ["s1", "s2", "s3"]
            .iter()
            .map(|n| Some(make_player(n, 1500)))
            .collect(),
    );
    assert_eq!(padded.len(), 4);
    assert!(padded[3].is_none(), "padding goes after the real players");
}

#[test]
fn test_four_player_seeding() {
    let seeded = seed(&["s1", "s2", "s3", "s4"]);
    let names: Vec<_> = seeded.iter().map(|s| username(s).unwrap()).collect();
    assert_eq!(
        names,
        vec!["s1", "s4", "s2", "s3"],
        "round one should pair first-vs-last and second-vs-third"
    );
}

#[test]
fn test_three_player_seeding_gives_top_seed_the_bye() {
    let seeded = seed(&["s1", "s2", "s3"]);
    assert_eq!(seeded.len(), 4);
    assert_eq!(username(&seeded[0]), Some("s1"));
    assert!(
        seeded[1].is_none(),
        "the single bye should land next to the top seed"
    );
    assert_eq!(username(&seeded[2]), Some("s2"));
    assert_eq!(username(&seeded[3]), Some("s3"));
}

#[test]
fn test_byes_only_reach_round_one() {
    // 5 real players in an 8 slot bracket: all three byes sit in distinct
    // round-one pairings, so every later round is fully played
    let seeded = seed(&["s1", "s2", "s3", "s4", "s5"]);
    assert_eq!(seeded.len(), 8);
    for pair in seeded.chunks(2) {
        assert!(
            pair[0].is_some() || pair[1].is_some(),
            "padding must never produce an empty pairing"
        );
    }
}

#[test]
fn test_series_winner_needs_equal_or_more_wins() {
    assert_eq!(series_winner(2, 1), 1);
    assert_eq!(series_winner(0, 2), 2);
    assert_eq!(series_winner(1, 1), 1, "win ties resolve to player one");
    assert_eq!(series_winner(0, 0), 1, "a fully failed series advances player one");
}
