use bot_arena_backend::services::elo::{K_FACTOR, expected_score, rating_changes};

#[test]
fn test_expected_score_equal_ratings() {
    let expected = expected_score(1200, 1200);
    assert!(
        (expected - 0.5).abs() < 1e-9,
        "equal ratings should expect a coin flip, got {expected}"
    );
}

#[test]
fn test_expected_scores_sum_to_one() {
    let first = expected_score(1600, 1300);
    let second = expected_score(1300, 1600);
    assert!(
        (first + second - 1.0).abs() < 1e-9,
        "expected scores of both sides should sum to 1, got {first} + {second}"
    );
    assert!(first > second, "higher rating should be favored");
}

#[test]
fn test_rating_changes_equal_ratings() {
    assert_eq!(
        rating_changes(1200, 1200, true),
        (10, -10),
        "even match moves exactly half the K factor"
    );
    assert_eq!(rating_changes(1200, 1200, false), (-10, 10));
}

#[test]
fn test_rating_changes_favorite_wins_small() {
    // favorite winning at 1600 vs 1500 is worth less than an even win
    assert_eq!(rating_changes(1600, 1500, true), (7, -7));
}

#[test]
fn test_rating_changes_underdog_win_mirrors_favorite_loss_magnitude() {
    let (underdog_gain, favorite_loss) = rating_changes(1500, 1600, true);
    assert_eq!((underdog_gain, favorite_loss), (12, -12));
    assert!(
        underdog_gain > rating_changes(1600, 1500, true).0,
        "an upset should move more rating than the expected result"
    );
}

#[test]
fn test_rating_changes_bigger_upset_moves_more() {
    let (small_upset, _) = rating_changes(1500, 1600, true);
    let (big_upset, _) = rating_changes(1300, 1600, true);
    assert_eq!(big_upset, 16);
    assert!(
        big_upset > small_upset,
        "beating a much stronger player should pay more: {big_upset} vs {small_upset}"
    );
}

#[test]
fn test_rating_changes_are_zero_sum_and_bounded() {
    let cases = [
        (1000, 2000, true),
        (1000, 2000, false),
        (1480, 1520, true),
        (1520, 1480, false),
        (1200, 1200, true),
    ];
    for (first, second, first_won) in cases {
        let (change_1, change_2) = rating_changes(first, second, first_won);
        assert_eq!(
            change_1 + change_2,
            0,
            "deltas must cancel for ({first}, {second}, {first_won})"
        );
        assert!(
            change_1.abs() <= K_FACTOR,
            "a single match can move at most K: got {change_1}"
        );
    }
}

#[test]
fn test_scrimmage_batch_is_zero_sum() {
    // four players, six pairings, the lower-rated side always wins
    let ratings = [("a", 1600), ("b", 1500), ("c", 1400), ("d", 1300)];
    let pairings = [(1, 0), (2, 0), (2, 1), (3, 0), (3, 1), (3, 2)];

    let mut net = std::collections::HashMap::new();
    for (low_seed, high_seed) in pairings {
        let (low_name, low_rating) = ratings[low_seed];
        let (high_name, high_rating) = ratings[high_seed];
        let (change_low, change_high) = rating_changes(low_rating, high_rating, true);
        *net.entry(low_name).or_insert(0) += change_low;
        *net.entry(high_name).or_insert(0) += change_high;
        assert!(change_low > 0, "the winner should always gain rating");
    }

    let total: i32 = net.values().sum();
    assert_eq!(total, 0, "a full batch must conserve rating, net was {net:?}");
}
