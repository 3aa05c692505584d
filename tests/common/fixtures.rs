use adaptive_backend::store::operations::battles::Battle;
use adaptive_backend::store::operations::players::PlayerRecord;
use adaptive_backend::store::operations::progress::PuzzleProgress;
use adaptive_backend::store::Store;

pub fn seed_player(store: &Store, id: &str, exp: u64) -> PlayerRecord {
    let mut player = PlayerRecord::new(id, format!("player-{id}"), exp);
    player.avatar_url = Some(format!("https://cdn.example.test/avatars/{id}.png"));
    store.upsert_player(&player).expect("seed player");
    player
}

/// Completed battle between `a` and `b`; `winner` of `None` is a draw.
pub fn seed_battle(store: &Store, a: &str, b: &str, winner: Option<&str>) -> Battle {
    let battle = Battle::new(a, b);
    store.create_battle(&battle).expect("seed battle");
    store
        .complete_battle(&battle.id, winner)
        .expect("complete battle")
}

pub fn seed_scores(store: &Store, user_id: &str, scores: &[f64]) {
    for (idx, score) in scores.iter().enumerate() {
        let progress = PuzzleProgress::new(user_id, format!("puzzle-{idx}"), *score);
        store.record_progress(&progress).expect("seed progress");
    }
}
