use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::core::RetirementPlan;

pub const CURRENT_PLAN_KEY: &str = "plan";

const LEGACY_RETURN_RATE: f64 = 0.07;
const UPGRADED_RETURN_RATE: f64 = 0.10;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("stored document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
}

/// Key-value storage for JSON documents.
pub trait PlanStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    fn set(&self, key: &str, value: &Value) -> Result<(), StoreError>;
}

/// One pretty-printed `<key>.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl PlanStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(key)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let body = serde_json::to_string_pretty(value)?;
        fs::write(&path, body).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "stored document");
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlanStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.clone());
        Ok(())
    }
}

/// Brings a plan document written by an older version up to date: the old
/// 7% default return becomes 10%, and fields added later get their
/// defaults when the plan is deserialized.
pub fn migrate_plan(mut plan: RetirementPlan) -> RetirementPlan {
    if plan.expected_return_rate == LEGACY_RETURN_RATE {
        plan.expected_return_rate = UPGRADED_RETURN_RATE;
    }
    plan
}

/// Reads the current plan. A missing document or one that no longer parses
/// as a plan reads as `None`.
pub fn load_current_plan(store: &dyn PlanStore) -> Result<Option<RetirementPlan>, StoreError> {
    let Some(doc) = store.get(CURRENT_PLAN_KEY)? else {
        return Ok(None);
    };
    Ok(serde_json::from_value::<RetirementPlan>(doc)
        .ok()
        .map(migrate_plan))
}

/// Stores the plan document wholesale; it is not validated here.
pub fn save_current_plan(store: &dyn PlanStore, doc: &Value) -> Result<(), StoreError> {
    store.set(CURRENT_PLAN_KEY, doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("nestegg-{name}-{}-{nanos}", std::process::id()))
    }

    fn legacy_doc() -> Value {
        json!({
            "currentAge": 31,
            "retirementAge": 56,
            "currentSavings": 126000,
            "expectedReturnRate": 0.07,
            "inflationRate": 0.03,
            "monthlySpendingGoal": 9000,
            "rothPct": 100,
            "filingStatus": "single",
            "contributionMode": "fixed",
            "annualContribution": 35000,
            "currentSalary": 120000,
            "salaryContributionPct": 15,
            "expectedSalaryGrowthPct": 3,
            "lifeExpectancy": 90
        })
    }

    #[test]
    fn missing_plan_reads_as_none() {
        let store = MemoryStore::new();
        assert!(load_current_plan(&store).expect("load").is_none());
    }

    #[test]
    fn legacy_plan_is_migrated_on_read() {
        let store = MemoryStore::new();
        save_current_plan(&store, &legacy_doc()).expect("save");
        let plan = load_current_plan(&store).expect("load").expect("plan present");
        assert_eq!(plan.expected_return_rate, 0.10);
        assert_eq!(plan.post_retirement_return_rate, 0.05);
        assert_eq!(plan.withdrawal_rate, 0.04);
        assert_eq!(plan.die_with_target, 0.0);
        assert_eq!(plan.current_savings_roth, 0.0);
    }

    #[test]
    fn non_legacy_return_rate_is_kept() {
        let mut plan = RetirementPlan::default();
        plan.expected_return_rate = 0.08;
        assert_eq!(migrate_plan(plan).expected_return_rate, 0.08);
    }

    #[test]
    fn unparseable_plan_reads_as_none() {
        let store = MemoryStore::new();
        store
            .set(CURRENT_PLAN_KEY, &json!({ "hello": "world" }))
            .expect("set");
        assert!(load_current_plan(&store).expect("load").is_none());
    }

    #[test]
    fn json_file_store_roundtrips_documents() {
        let dir = scratch_dir("roundtrip");
        let store = JsonFileStore::new(&dir).expect("create store");
        assert!(store.get("plan").expect("get").is_none());

        store.set("plan", &legacy_doc()).expect("set");
        assert!(dir.join("plan.json").exists());
        assert_eq!(store.get("plan").expect("get"), Some(legacy_doc()));

        let plan = load_current_plan(&store).expect("load").expect("plan");
        assert_eq!(plan.retirement_age, 56);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn json_file_store_rejects_path_like_keys() {
        let dir = scratch_dir("keys");
        let store = JsonFileStore::new(&dir).expect("create store");
        let err = store.get("../escape").expect_err("must reject");
        assert!(matches!(err, StoreError::InvalidKey(_)));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn json_file_store_reports_corrupt_documents() {
        let dir = scratch_dir("corrupt");
        let store = JsonFileStore::new(&dir).expect("create store");
        fs::write(dir.join("plan.json"), "{ not json").expect("write");
        assert!(matches!(store.get("plan"), Err(StoreError::Json(_))));
        let _ = fs::remove_dir_all(&dir);
    }
}
