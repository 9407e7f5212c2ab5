//! Supplier directory: resolves the name a vendor types to a payable address.

use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

/// Name → address lookup. Names are matched case-insensitively.
#[async_trait]
pub trait SupplierDirectory: Send + Sync {
    async fn lookup(&self, name: &str) -> Option<String>;
}

/// Directory backed by the `[suppliers]` table of the config.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    entries: HashMap<String, String>,
}

impl StaticDirectory {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, address)| (name.as_ref().to_lowercase(), address.into()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SupplierDirectory for StaticDirectory {
    async fn lookup(&self, name: &str) -> Option<String> {
        let found = self.entries.get(&name.to_lowercase()).cloned();
        debug!("Supplier lookup '{}': {}", name, found.as_deref().unwrap_or("not found"));
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookup_ignores_case() {
        let directory =
            StaticDirectory::new([("Bala", "0x70997970C51812dc3A010C7d01b50e0d17dc79ee")]);
        assert_eq!(
            directory.lookup("bala").await.as_deref(),
            Some("0x70997970C51812dc3A010C7d01b50e0d17dc79ee")
        );
        assert_eq!(directory.lookup("Musa").await, None);
        assert_eq!(directory.len(), 1);
        assert!(StaticDirectory::default().is_empty());
    }
}
