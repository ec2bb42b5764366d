//! Elo Rating Math for Ranked Scrimmages
//!
//! Standard two-player Elo with K = 20. Every ranked match moves a single
//! integer amount from the loser to the winner, so ratings are zero-sum
//! across a scrimmage batch.
//!
//! Deltas are truncated toward zero, which keeps the winner's gain and the
//! loser's loss exact mirror images even for lopsided expected scores.

/// Maximum rating movement per match.
pub const K_FACTOR: i32 = 20;

/// Probability that the first player beats the second, given their ratings.
pub fn expected_score(first_rating: i32, second_rating: i32) -> f64 {
    1.0 / (1.0 + 10_f64.powf((second_rating - first_rating) as f64 / 400.0))
}

/// Rating changes for a finished match, as
/// `(change to first player, change to second player)`.
pub fn rating_changes(
    first_rating: i32,
    second_rating: i32,
    first_player_won: bool,
) -> (i32, i32) {
    let score = if first_player_won { 1.0 } else { 0.0 };
    let expected = expected_score(first_rating, second_rating);
    let change = (K_FACTOR as f64 * (score - expected)) as i32;
    (change, -change)
}
