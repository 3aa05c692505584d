use crate::store::operations::battles::Battle;
use crate::store::operations::players::PlayerRecord;
use crate::store::{keys, Store, StoreError};

pub(crate) const VERSION_KEY: &str = "_meta:version";

type MigrationFn = fn(&Store) -> Result<(), StoreError>;

fn migrations() -> Vec<(&'static str, MigrationFn)> {
    vec![
        ("001_initial", m001_initial),
        ("002_players_by_exp_index", m002_players_by_exp_index),
        ("003_battles_by_player_index", m003_battles_by_player_index),
    ]
}

/// 执行所有未应用的迁移。
///
/// 每个迁移必须幂等：进程可能在迁移完成后、版本号写入前崩溃，重启后会重跑。
pub fn run(store: &Store) -> Result<(), StoreError> {
    let current = get_current_version(store)?;

    for (index, (name, func)) in migrations().iter().enumerate() {
        let version = (index + 1) as u32;
        if version > current {
            tracing::info!(version, name, "Running migration");
            func(store)?;
            set_version(store, version)?;
            tracing::info!(version, name, "Migration complete");
        } else {
            tracing::debug!(version, name, "Migration already applied, skipping");
        }
    }

    Ok(())
}

pub fn get_current_version(store: &Store) -> Result<u32, StoreError> {
    match store.meta.get(VERSION_KEY.as_bytes())? {
        Some(raw) => {
            let bytes: [u8; 4] = raw.as_ref().try_into().map_err(|_| StoreError::Migration {
                version: 0,
                message: format!("corrupt version marker ({} bytes)", raw.len()),
            })?;
            Ok(u32::from_be_bytes(bytes))
        }
        None => Ok(0),
    }
}

pub fn set_version(store: &Store, version: u32) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    if version < current {
        return Err(StoreError::Migration {
            version,
            message: format!("Refuse to downgrade from {} to {}", current, version),
        });
    }

    store
        .meta
        .insert(VERSION_KEY.as_bytes(), &version.to_be_bytes())?;
    Ok(())
}

fn m001_initial(_store: &Store) -> Result<(), StoreError> {
    Ok(())
}

fn m002_players_by_exp_index(store: &Store) -> Result<(), StoreError> {
    store.players_by_exp.clear()?;
    for item in store.players.iter() {
        let (_, value) = item?;
        let player: PlayerRecord = Store::deserialize(&value)?;
        let key = keys::player_exp_key(player.exp, &player.id)?;
        store
            .players_by_exp
            .insert(key.as_bytes(), player.id.as_bytes())?;
    }
    Ok(())
}

fn m003_battles_by_player_index(store: &Store) -> Result<(), StoreError> {
    for item in store.battles.iter() {
        let (_, value) = item?;
        let battle: Battle = Store::deserialize(&value)?;
        for player_id in [&battle.player1_id, &battle.player2_id] {
            let key = keys::battle_player_index_key(player_id, &battle.id)?;
            store.battles_by_player.insert(key.as_bytes(), &[])?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent_and_record_version() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().to_str().unwrap()).unwrap();

        store.run_migrations().unwrap();
        assert_eq!(get_current_version(&store).unwrap(), migrations().len() as u32);
        store.run_migrations().unwrap();
        assert_eq!(get_current_version(&store).unwrap(), migrations().len() as u32);
    }

    #[test]
    fn version_cannot_go_backwards() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().to_str().unwrap()).unwrap();
        set_version(&store, 3).unwrap();
        assert!(matches!(
            set_version(&store, 1),
            Err(StoreError::Migration { version: 1, .. })
        ));
    }

    #[test]
    fn exp_index_is_rebuilt_from_players() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().to_str().unwrap()).unwrap();
        let record = PlayerRecord::new("p1", "alice", 1200);
        store
            .players
            .insert(b"p1", Store::serialize(&record).unwrap())
            .unwrap();

        m002_players_by_exp_index(&store).unwrap();
        let top = store.list_players_by_exp(None, 10).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].id, "p1");
    }
}
