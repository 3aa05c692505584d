pub const PLAYERS: &str = "players";
pub const BATTLES: &str = "battles";
pub const PROGRESS: &str = "progress";
pub const META: &str = "meta";

// Secondary index trees
pub const PLAYERS_BY_EXP: &str = "players_by_exp";
pub const BATTLES_BY_PLAYER: &str = "battles_by_player";
