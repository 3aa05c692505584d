use crate::store::StoreError;

/// Ids become key segments, so the separator is not allowed inside them.
fn segment(value: &str) -> Result<&str, StoreError> {
    if value.is_empty() {
        return Err(StoreError::Validation("key segment must not be empty".to_string()));
    }
    if value.contains(':') {
        return Err(StoreError::Validation(format!(
            "key segment must not contain ':': {value}"
        )));
    }
    Ok(value)
}

pub fn player_key(player_id: &str) -> Result<String, StoreError> {
    Ok(segment(player_id)?.to_string())
}

/// Highest experience sorts first.
pub fn player_exp_key(exp: u64, player_id: &str) -> Result<String, StoreError> {
    let reverse_exp = u64::MAX - exp;
    Ok(format!("{:020}:{}", reverse_exp, segment(player_id)?))
}

pub fn battle_key(battle_id: &str) -> Result<String, StoreError> {
    Ok(segment(battle_id)?.to_string())
}

pub fn battle_player_index_key(player_id: &str, battle_id: &str) -> Result<String, StoreError> {
    Ok(format!("{}:{}", segment(player_id)?, segment(battle_id)?))
}

pub fn battle_player_prefix(player_id: &str) -> Result<String, StoreError> {
    Ok(format!("{}:", segment(player_id)?))
}

pub fn progress_key(user_id: &str, timestamp_ms: i64, progress_id: &str) -> Result<String, StoreError> {
    let ts = timestamp_ms.max(0) as u64;
    let reverse_ts = u64::MAX - ts;
    Ok(format!(
        "{}:{:020}:{}",
        segment(user_id)?,
        reverse_ts,
        segment(progress_id)?
    ))
}

pub fn progress_prefix(user_id: &str) -> Result<String, StoreError> {
    Ok(format!("{}:", segment(user_id)?))
}
