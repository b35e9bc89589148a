//! Cookie jar implementations: in-memory and file-backed.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::port::{CookieJar, SameSite};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredValue {
    value: String,
    expires_at: DateTime<Utc>,
}

impl StoredValue {
    fn new(value: &str, ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(7));
        Self {
            value: value.to_string(),
            expires_at: Utc::now() + ttl,
        }
    }

    fn expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// In-memory cookie jar honoring expiry. Used before any durable storage is
/// wired up and throughout the test suites.
#[derive(Default)]
pub struct MemoryCookieJar {
    values: Mutex<HashMap<String, StoredValue>>,
}

impl MemoryCookieJar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CookieJar for MemoryCookieJar {
    async fn get(&self, name: &str) -> Result<Option<String>> {
        let mut values = self.values.lock();
        match values.get(name) {
            Some(stored) if stored.expired() => {
                values.remove(name);
                Ok(None)
            }
            Some(stored) => Ok(Some(stored.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, name: &str, value: &str, ttl: Duration, _same_site: SameSite) -> Result<()> {
        self.values
            .lock()
            .insert(name.to_string(), StoredValue::new(value, ttl));
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<()> {
        self.values.lock().remove(name);
        Ok(())
    }
}

/// File-backed cookie jar: a JSON map of named values with expiry timestamps,
/// persisted across processes. Same expiry semantics as the in-memory jar.
pub struct FileCookieJar {
    path: PathBuf,
    // Serializes read-modify-write cycles against the backing file.
    lock: Mutex<()>,
}

impl FileCookieJar {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> HashMap<String, StoredValue> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return HashMap::new(),
        };
        match serde_json::from_str(&content) {
            Ok(values) => values,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "Unparsable cookie file, starting empty");
                HashMap::new()
            }
        }
    }

    fn save(&self, values: &HashMap<String, StoredValue>) -> Result<()> {
        let content = serde_json::to_string(values)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

#[async_trait]
impl CookieJar for FileCookieJar {
    async fn get(&self, name: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock();
        let mut values = self.load();
        let before = values.len();
        values.retain(|_, stored| !stored.expired());
        if values.len() != before {
            if let Err(err) = self.save(&values) {
                warn!(path = %self.path.display(), error = %err, "Failed to prune expired cookies");
            }
        }
        Ok(values.get(name).map(|stored| stored.value.clone()))
    }

    async fn set(&self, name: &str, value: &str, ttl: Duration, _same_site: SameSite) -> Result<()> {
        let _guard = self.lock.lock();
        let mut values = self.load();
        values.retain(|_, stored| !stored.expired());
        values.insert(name.to_string(), StoredValue::new(value, ttl));
        self.save(&values)
    }

    async fn remove(&self, name: &str) -> Result<()> {
        let _guard = self.lock.lock();
        let mut values = self.load();
        if values.remove(name).is_some() {
            self.save(&values)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEEK: Duration = Duration::from_secs(7 * 24 * 3600);

    #[tokio::test]
    async fn memory_jar_round_trips() {
        let jar = MemoryCookieJar::new();
        jar.set("cart", "[]", WEEK, SameSite::Strict).await.unwrap();
        assert_eq!(jar.get("cart").await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn memory_jar_missing_key_is_none() {
        let jar = MemoryCookieJar::new();
        assert!(jar.get("cart").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn memory_jar_expired_value_is_none() {
        let jar = MemoryCookieJar::new();
        jar.set("cart", "[]", Duration::ZERO, SameSite::Strict)
            .await
            .unwrap();
        assert!(jar.get("cart").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn memory_jar_remove_is_idempotent() {
        let jar = MemoryCookieJar::new();
        jar.set("cart", "[]", WEEK, SameSite::Strict).await.unwrap();
        jar.remove("cart").await.unwrap();
        jar.remove("cart").await.unwrap();
        assert!(jar.get("cart").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_jar_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");

        let jar = FileCookieJar::new(&path);
        jar.set("cart", r#"[{"id":"x"}]"#, WEEK, SameSite::Strict)
            .await
            .unwrap();

        let reopened = FileCookieJar::new(&path);
        assert_eq!(
            reopened.get("cart").await.unwrap().as_deref(),
            Some(r#"[{"id":"x"}]"#)
        );
    }

    #[tokio::test]
    async fn file_jar_expired_value_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let jar = FileCookieJar::new(dir.path().join("cookies.json"));
        jar.set("cart", "[]", Duration::ZERO, SameSite::Strict)
            .await
            .unwrap();
        assert!(jar.get("cart").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_jar_prunes_expired_values_from_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");

        let jar = FileCookieJar::new(&path);
        jar.set("fresh", "[]", WEEK, SameSite::Strict).await.unwrap();
        jar.set("stale", "[]", Duration::ZERO, SameSite::Strict)
            .await
            .unwrap();

        assert!(jar.get("stale").await.unwrap().is_none());

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("stale"));
        assert!(raw.contains("fresh"));
    }

    #[tokio::test]
    async fn file_jar_survives_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, "not json at all").unwrap();

        let jar = FileCookieJar::new(&path);
        assert!(jar.get("cart").await.unwrap().is_none());

        // Writes recover the file.
        jar.set("cart", "[]", WEEK, SameSite::Strict).await.unwrap();
        assert_eq!(jar.get("cart").await.unwrap().as_deref(), Some("[]"));
    }
}
