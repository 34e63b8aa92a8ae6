//! Vibe Farm セーブ/ロード機能。
//!
//! ## バージョニング方針
//!
//! - `SAVE_VERSION`: 現在のセーブ形式バージョン。フィールド追加時にインクリメントする。
//! - `MIN_COMPATIBLE_VERSION`: 互換性を維持できる最小バージョン。
//!   新フィールドの追加のみの場合はこの値を変えない（旧データを維持できる）。
//!   既存フィールドの意味変更や削除など破壊的変更を行った場合のみインクリメントする。
//!
//! セーブデータは `GameState` の JSON にバージョン番号 `saveVersion` を並べた
//! フラットなオブジェクト。`saveVersion` を持たない旧データはバージョン 1 として扱い、
//! 不足フィールドはデフォルト値で補完する。

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::economy;
use crate::state::GameState;

/// セーブデータのフォーマットバージョン。
pub const SAVE_VERSION: u32 = 2;

/// 互換性を維持できる最小バージョン。
pub const MIN_COMPATIBLE_VERSION: u32 = 1;

/// デフォルトのストレージキー。
pub const DEFAULT_STORAGE_KEY: &str = "emojiClickerSave";

/// 文字列キーで値を保存する永続ストレージ。
pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage key `{0}` is not usable as a file name")]
    InvalidKey(String),
    #[error("failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("storage backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save data is not valid JSON for this game: {0}")]
    Json(#[from] serde_json::Error),
    #[error("save version {found} is older than the oldest supported version {min}")]
    Incompatible { found: u32, min: u32 },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// シリアライズ用のセーブデータ構造体。
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveData {
    #[serde(default = "legacy_version")]
    save_version: u32,
    #[serde(flatten)]
    game: GameState,
}

/// `saveVersion` の無い旧データのバージョン。
fn legacy_version() -> u32 {
    1
}

/// ロード結果。ランクは `total_vibes` から再計算したもの。
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedGame {
    pub state: GameState,
    pub rank_index: usize,
}

/// GameState を JSON 文字列に変換する。
pub fn encode(state: &GameState) -> Result<String, SaveError> {
    let data = SaveData {
        save_version: SAVE_VERSION,
        game: state.clone(),
    };
    Ok(serde_json::to_string(&data)?)
}

/// JSON 文字列から GameState を復元する。
/// 壊れた値は `GameState::sanitize` で補正する。
pub fn decode(json: &str) -> Result<GameState, SaveError> {
    let data: SaveData = serde_json::from_str(json)?;
    if data.save_version < MIN_COMPATIBLE_VERSION {
        return Err(SaveError::Incompatible {
            found: data.save_version,
            min: MIN_COMPATIBLE_VERSION,
        });
    }
    if data.save_version < SAVE_VERSION {
        debug!(
            saved = data.save_version,
            current = SAVE_VERSION,
            "migrating older save data"
        );
    }
    let mut state = data.game;
    state.sanitize();
    Ok(state)
}

/// ゲーム状態をストレージに保存する。ストレージが無い環境では何もしない。
pub fn save_game(
    storage: Option<&dyn Storage>,
    key: &str,
    state: &GameState,
) -> Result<(), SaveError> {
    let Some(storage) = storage else {
        return Ok(());
    };
    let json = encode(state)?;
    storage.set_item(key, &json)?;
    debug!(key, bytes = json.len(), "game saved");
    Ok(())
}

/// ストレージからゲーム状態を復元する。
/// キーが無い場合、パースエラー、バージョン不一致の場合は None を返す（新規ゲームになる）。
pub fn load_game(storage: Option<&dyn Storage>, key: &str) -> Option<LoadedGame> {
    let storage = storage?;
    let json = match storage.get_item(key) {
        Ok(Some(j)) => j,
        Ok(None) => return None,
        Err(e) => {
            warn!(error = %e, "failed to read save data");
            return None;
        }
    };

    match decode(&json) {
        Ok(state) => {
            let rank_index = economy::rank_index_for(state.total_vibes);
            Some(LoadedGame { state, rank_index })
        }
        Err(e) => {
            warn!(error = %e, "save data corrupted, discarding");
            // 壊れたデータを削除
            if let Err(e) = storage.remove_item(key) {
                warn!(error = %e, "failed to remove corrupted save data");
            }
            None
        }
    }
}

/// セーブデータを削除する。
pub fn delete_save(storage: Option<&dyn Storage>, key: &str) -> Result<(), StorageError> {
    match storage {
        Some(storage) => storage.remove_item(key),
        None => Ok(()),
    }
}

/// メモリ上のストレージ。テストやネイティブのホストで使う。
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

impl<S: Storage + ?Sized> Storage for std::rc::Rc<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }
}

/// キーごとに `<dir>/<key>.json` へ書き込むファイルストレージ。
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(json) => Ok(Some(json)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })?;
        // Write to a temp file first, then rename for atomicity
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, value).map_err(|source| StorageError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &path).map_err(|source| StorageError::Io { path, source })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}

/// ブラウザの localStorage。WASM 環境でのみ動作。
#[cfg(target_arch = "wasm32")]
pub struct LocalStorage {
    inner: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    /// localStorage にアクセスする。使えない環境では None。
    pub fn open() -> Option<Self> {
        let inner = web_sys::window()?.local_storage().ok()??;
        Some(Self { inner })
    }
}

#[cfg(target_arch = "wasm32")]
impl Storage for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner
            .get_item(key)
            .map_err(|e| StorageError::Backend(format!("{e:?}")))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner
            .set_item(key, value)
            .map_err(|e| StorageError::Backend(format!("{e:?}")))
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.inner
            .remove_item(key)
            .map_err(|e| StorageError::Backend(format!("{e:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BuildingId, MarketItemId, VeggieId};
    use crate::state::PlotStage;

    fn busy_state() -> GameState {
        let mut s = GameState::new(1_700_000_000_000);
        s.vibes = 12_345.6;
        s.total_vibes = 99_999.25;
        s.inventory.insert(BuildingId::Cursor, 10);
        s.inventory.insert(BuildingId::GardenPatch, 1);
        let farm = &mut s.farming;
        farm.unlocked = true;
        farm.bio_vibes = 321.5;
        farm.plots[0].stage = PlotStage::Growing;
        farm.plots[0].timer = 3.75;
        farm.plots[0].max_time = 5.0;
        farm.plots[0].veggie_type = VeggieId::Tomato;
        farm.plots[1].stage = PlotStage::Ripe;
        farm.plots[1].timer = -0.5;
        farm.plots[1].max_time = 10.0;
        farm.upgrades.insert(MarketItemId::GmoTomato, 1);
        farm.upgrades.insert(MarketItemId::Fertilizer, 3);
        farm.upgrades.insert(MarketItemId::Factory, 1);
        farm.upgrades.insert(MarketItemId::ExtraPlot, 1);
        farm.extra_plots = 1;
        farm.plots.push(crate::state::Plot::empty(9));
        farm.stocks.insert(VeggieId::Carrot, 480.0);
        farm.unlocked_veggies.insert(VeggieId::Tomato);
        farm.selected_veggie_type = VeggieId::Tomato;
        farm.factory.enabled = true;
        farm.factory.conversion_rate = 1.5;
        farm.fertilizer.purchased = 3;
        farm.fertilizer.active = 2;
        farm.fertilizer.last_decay_time = 1_700_000_360_000;
        s
    }

    #[test]
    fn roundtrip_preserves_state() {
        let original = busy_state();
        let storage = MemoryStorage::new();
        save_game(Some(&storage), DEFAULT_STORAGE_KEY, &original).unwrap();
        let loaded = load_game(Some(&storage), DEFAULT_STORAGE_KEY).unwrap();
        assert_eq!(loaded.state, original);
        assert_eq!(loaded.rank_index, 2); // 10k <= 99,999 < 100k
    }

    #[test]
    fn veggie_operations_roundtrip() {
        use crate::logic;
        use crate::state::LogBook;

        let mut s = GameState::new(5_000);
        let mut log = LogBook::default();
        s.farming.unlocked = true;
        s.farming.bio_vibes = 2_000.0;
        assert!(logic::unlock_veggie(&mut s, &mut log, VeggieId::Tomato));
        assert!(logic::select_veggie(&mut s, &mut log, VeggieId::Tomato));
        assert!(logic::plant(&mut s, &mut log, 4, Some(VeggieId::Tomato)));
        s.farming.stocks.insert(VeggieId::Corn, 7.0);
        s.farming.stocks.insert(VeggieId::Carrot, 11.0);
        assert!(logic::convert_veggie_stocks(&mut s, &mut log, VeggieId::Carrot) > 0.0);

        let restored = decode(&encode(&s).unwrap()).unwrap();
        assert_eq!(restored, s);
        assert_eq!(restored.farming.selected_veggie_type, VeggieId::Tomato);
        assert_eq!(restored.farming.plots[4].veggie_type, VeggieId::Tomato);
    }

    #[test]
    fn fresh_state_roundtrip() {
        let original = GameState::new(0);
        let restored = decode(&encode(&original).unwrap()).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn json_field_names() {
        let json = encode(&busy_state()).unwrap();
        for field in [
            "\"saveVersion\":2",
            "\"vibes\":",
            "\"totalVibes\":",
            "\"bioVibes\":",
            "\"maxTime\":",
            "\"veggieType\":\"tomato\"",
            "\"unlockedVeggies\":",
            "\"conversionRate\":1.5",
            "\"lastDecayTime\":",
            "\"extraPlots\":1",
            "\"cursor\":10",
            "\"gmo_tomato\":1",
        ] {
            assert!(json.contains(field), "missing {field} in {json}");
        }
    }

    #[test]
    fn no_storage_is_a_noop() {
        save_game(None, DEFAULT_STORAGE_KEY, &GameState::new(0)).unwrap();
        assert!(load_game(None, DEFAULT_STORAGE_KEY).is_none());
        delete_save(None, DEFAULT_STORAGE_KEY).unwrap();
    }

    #[test]
    fn missing_key_is_fresh_start() {
        let storage = MemoryStorage::new();
        assert!(load_game(Some(&storage), DEFAULT_STORAGE_KEY).is_none());
    }

    #[test]
    fn corrupted_data_returns_none_and_is_removed() {
        let storage = MemoryStorage::new();
        storage.set_item(DEFAULT_STORAGE_KEY, "invalid json").unwrap();
        assert!(load_game(Some(&storage), DEFAULT_STORAGE_KEY).is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn wrong_shape_returns_none() {
        let storage = MemoryStorage::new();
        storage
            .set_item(DEFAULT_STORAGE_KEY, r#"{"vibes":"lots","farming":[]}"#)
            .unwrap();
        assert!(load_game(Some(&storage), DEFAULT_STORAGE_KEY).is_none());
    }

    #[test]
    fn version_below_min_compatible_is_rejected() {
        let err = decode(r#"{"saveVersion":0,"vibes":5.0}"#).unwrap_err();
        assert!(matches!(err, SaveError::Incompatible { found: 0, .. }));
    }

    /// saveVersion の無い旧データ（plots に veggieType も無い）も読み込める。
    #[test]
    fn legacy_save_without_version_loads() {
        let old_json = r#"{
            "vibes": 100,
            "totalVibes": 1500,
            "startTime": 1700000000000,
            "inventory": { "cursor": 5 },
            "farming": {
                "unlocked": true,
                "bioVibes": 10,
                "plots": [{ "id": 0, "stage": 2, "timer": 0, "maxTime": 10 }],
                "upgrades": { "fertilizer": 2 }
            }
        }"#;
        let storage = MemoryStorage::new();
        storage.set_item(DEFAULT_STORAGE_KEY, old_json).unwrap();
        let loaded = load_game(Some(&storage), DEFAULT_STORAGE_KEY).unwrap();
        let s = loaded.state;
        assert_eq!(s.vibes, 100.0);
        assert_eq!(s.owned(BuildingId::Cursor), 5);
        assert_eq!(s.owned(BuildingId::Grandma), 0);
        assert_eq!(s.farming.upgrade_count(MarketItemId::Fertilizer), 2);
        assert_eq!(s.farming.plots.len(), 9);
        assert_eq!(s.farming.plots[0].stage, PlotStage::Ripe);
        assert_eq!(s.farming.plots[0].veggie_type, VeggieId::Carrot);
        assert!(s.farming.is_unlocked(VeggieId::Carrot));
        assert_eq!(loaded.rank_index, 1);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let json = r#"{"saveVersion":2,"vibes":3.0,"futureField":"ignored"}"#;
        assert_eq!(decode(json).unwrap().vibes, 3.0);
    }

    #[test]
    fn delete_removes_key() {
        let storage = MemoryStorage::new();
        save_game(Some(&storage), "k", &GameState::new(0)).unwrap();
        delete_save(Some(&storage), "k").unwrap();
        assert!(storage.get_item("k").unwrap().is_none());
    }

    #[test]
    fn file_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("saves"));
        let original = busy_state();
        save_game(Some(&storage), DEFAULT_STORAGE_KEY, &original).unwrap();
        assert!(dir.path().join("saves/emojiClickerSave.json").exists());
        let loaded = load_game(Some(&storage), DEFAULT_STORAGE_KEY).unwrap();
        assert_eq!(loaded.state, original);
        delete_save(Some(&storage), DEFAULT_STORAGE_KEY).unwrap();
        assert!(load_game(Some(&storage), DEFAULT_STORAGE_KEY).is_none());
        // Removing twice is fine.
        delete_save(Some(&storage), DEFAULT_STORAGE_KEY).unwrap();
    }

    #[test]
    fn file_storage_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(matches!(
            storage.set_item("../escape", "{}"),
            Err(StorageError::InvalidKey(_))
        ));
    }

    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Backend("quota".into()))
        }
        fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Backend("quota".into()))
        }
        fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Backend("quota".into()))
        }
    }

    #[test]
    fn backend_failures_do_not_panic() {
        assert!(load_game(Some(&BrokenStorage), "k").is_none());
        let err = save_game(Some(&BrokenStorage), "k", &GameState::new(0)).unwrap_err();
        assert!(matches!(err, SaveError::Storage(StorageError::Backend(_))));
    }
}
