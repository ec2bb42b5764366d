pub mod match_record;
pub mod player;

pub use match_record::{MatchKind, MatchRecord, MatchStatus};
pub use player::PlayerRow;
