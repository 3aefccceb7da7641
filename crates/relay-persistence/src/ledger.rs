//! JSON array file ledger of dispatched orders.
//!
//! The whole file is rewritten on every change. Read-modify-write
//! sequences are serialized through an internal async mutex so concurrent
//! signals on different markets cannot lose each other's entries.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use relay_core::{DesiredPosition, Market, OrderSide, Price, Size};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::PersistenceResult;

/// One dispatched order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Exchange order id / tx hash.
    pub id: String,
    pub market: Market,
    /// Position the originating signal asked for.
    pub position: DesiredPosition,
    pub side: OrderSide,
    pub amount: Size,
    pub price: Price,
    pub reduce_only: bool,
    pub created_at: DateTime<Utc>,
}

/// Ledger stored as a pretty-printed JSON array.
#[derive(Debug)]
pub struct JsonLedger {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries. A missing file reads as an empty ledger.
    pub async fn read_all(&self) -> PersistenceResult<Vec<LedgerEntry>> {
        let _guard = self.lock.lock().await;
        self.read_unlocked().await
    }

    /// Replace the whole ledger.
    pub async fn write_all(&self, entries: &[LedgerEntry]) -> PersistenceResult<()> {
        let _guard = self.lock.lock().await;
        self.write_unlocked(entries).await
    }

    /// Append an entry.
    pub async fn create(&self, entry: LedgerEntry) -> PersistenceResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_unlocked().await?;
        debug!(id = %entry.id, market = %entry.market, "Ledger create");
        entries.push(entry);
        self.write_unlocked(&entries).await
    }

    /// Replace the entry with the same id. Returns false (and leaves the
    /// file untouched) if no such entry exists.
    pub async fn update(&self, entry: LedgerEntry) -> PersistenceResult<bool> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_unlocked().await?;
        let Some(slot) = entries.iter_mut().find(|e| e.id == entry.id) else {
            return Ok(false);
        };
        *slot = entry;
        self.write_unlocked(&entries).await?;
        Ok(true)
    }

    /// Remove the entry with `id`. Returns whether it existed.
    pub async fn delete(&self, id: &str) -> PersistenceResult<bool> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_unlocked().await?;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        self.write_unlocked(&entries).await?;
        Ok(true)
    }

    async fn read_unlocked(&self) -> PersistenceResult<Vec<LedgerEntry>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_unlocked(&self, entries: &[LedgerEntry]) -> PersistenceResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !tokio::fs::try_exists(parent).await? {
                tokio::fs::create_dir_all(parent).await?;
                info!(dir = %parent.display(), "Created ledger directory");
            }
        }

        let json = serde_json::to_vec_pretty(entries)?;
        // Write-then-rename so a crash never leaves a half-written array.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn entry(id: &str, market: &str) -> LedgerEntry {
        LedgerEntry {
            id: id.to_string(),
            market: Market::parse(market).unwrap(),
            position: DesiredPosition::Long,
            side: OrderSide::Buy,
            amount: Size::new(dec!(5)),
            price: Price::new(dec!(100)),
            reduce_only: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let ledger = JsonLedger::new(dir.path().join("db.json"));
        assert!(ledger.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_update_delete() {
        let dir = TempDir::new().unwrap();
        let ledger = JsonLedger::new(dir.path().join("nested").join("db.json"));

        ledger.create(entry("a", "SOL-USD")).await.unwrap();
        ledger.create(entry("b", "ETH-USD")).await.unwrap();
        assert_eq!(ledger.read_all().await.unwrap().len(), 2);

        let mut changed = entry("a", "SOL-USD");
        changed.amount = Size::new(dec!(7));
        assert!(ledger.update(changed).await.unwrap());
        let entries = ledger.read_all().await.unwrap();
        assert_eq!(entries[0].amount.inner(), dec!(7));

        assert!(ledger.delete("b").await.unwrap());
        assert!(!ledger.delete("b").await.unwrap());
        let entries = ledger.read_all().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "a");
    }

    #[tokio::test]
    async fn test_update_unknown_id_leaves_file_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        let ledger = JsonLedger::new(&path);
        ledger.create(entry("a", "SOL-USD")).await.unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        assert!(!ledger.update(entry("zzz", "SOL-USD")).await.unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_file_is_pretty_printed_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        let ledger = JsonLedger::new(&path);
        ledger.write_all(&[entry("a", "SOL-USD")]).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n"));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["market"], "SOL-USD");
        assert_eq!(value[0]["reduceOnly"], false);
        assert_eq!(value[0]["amount"], "5");
    }

    #[tokio::test]
    async fn test_concurrent_creates_are_not_lost() {
        let dir = TempDir::new().unwrap();
        let ledger = Arc::new(JsonLedger::new(dir.path().join("db.json")));

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                tokio::spawn(async move { ledger.create(entry(&format!("id-{i}"), "SOL-USD")).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(ledger.read_all().await.unwrap().len(), 10);
    }
}
