use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cuckoo::{CuckooError, CuckooFilter};
use crate::wire::{Code, Status};

/// Upper bound on the capacity a single filter may request.
pub const DEFAULT_MAX_CAPACITY: u64 = 1 << 24;

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Filter '{0}' already exists")]
    FilterExists(String),

    #[error("Filter '{0}' not found")]
    FilterNotFound(String),

    #[error("Filter '{0}' is full")]
    FilterFull(String),
}

impl RegistryError {
    pub fn code(&self) -> Code {
        match self {
            RegistryError::InvalidArgument(_) => Code::InvalidArgument,
            RegistryError::FilterExists(_) => Code::FilterExists,
            RegistryError::FilterNotFound(_) => Code::FilterNotFound,
            RegistryError::FilterFull(_) => Code::FilterFull,
        }
    }
}

impl From<&RegistryError> for Status {
    fn from(err: &RegistryError) -> Self {
        Status::new(err.code(), err.to_string())
    }
}

/// Named, independent cuckoo filters.
///
/// Reads share the lock; anything that mutates a filter or the name table
/// takes it exclusively.
pub struct FilterRegistry {
    filters: RwLock<HashMap<String, CuckooFilter>>,
    max_capacity: u64,
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CAPACITY)
    }
}

impl FilterRegistry {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            filters: RwLock::new(HashMap::new()),
            max_capacity,
        }
    }

    pub async fn create(&self, name: &str, capacity: u64) -> RegistryResult<()> {
        validate_name(name)?;
        if capacity == 0 || capacity > self.max_capacity {
            return Err(RegistryError::InvalidArgument(format!(
                "capacity must be in 1..={}, got {capacity}",
                self.max_capacity
            )));
        }

        let mut filters = self.filters.write().await;
        if filters.contains_key(name) {
            return Err(RegistryError::FilterExists(name.to_string()));
        }
        let capacity = usize::try_from(capacity).map_err(|_| {
            RegistryError::InvalidArgument(format!(
                "capacity {capacity} does not fit this platform"
            ))
        })?;
        let filter = CuckooFilter::new(capacity)
            .map_err(|e| RegistryError::InvalidArgument(e.to_string()))?;
        debug!(
            "Created filter '{}' with {} buckets",
            name,
            filter.num_buckets()
        );
        filters.insert(name.to_string(), filter);
        Ok(())
    }

    pub async fn insert(&self, name: &str, element: &str) -> RegistryResult<()> {
        let mut filters = self.filters.write().await;
        let filter = lookup_mut(&mut filters, name)?;
        filter.insert(element.as_bytes()).map_err(|e| match e {
            CuckooError::Full => RegistryError::FilterFull(name.to_string()),
            other => RegistryError::InvalidArgument(other.to_string()),
        })
    }

    /// Insert every element, returning those that could not be placed.
    pub async fn insert_many(
        &self,
        name: &str,
        elements: &[String],
    ) -> RegistryResult<Vec<String>> {
        let mut filters = self.filters.write().await;
        let filter = lookup_mut(&mut filters, name)?;
        let failed: Vec<String> = elements
            .iter()
            .filter(|element| filter.insert(element.as_bytes()).is_err())
            .cloned()
            .collect();
        if !failed.is_empty() {
            debug!("{} elements rejected by filter '{}'", failed.len(), name);
        }
        Ok(failed)
    }

    pub async fn lookup(&self, name: &str, element: &str) -> RegistryResult<bool> {
        let filters = self.filters.read().await;
        let filter = lookup_ref(&filters, name)?;
        Ok(filter.contains(element.as_bytes()))
    }

    /// Partition `elements` into (matched, unmatched), preserving order.
    pub async fn lookup_many(
        &self,
        name: &str,
        elements: &[String],
    ) -> RegistryResult<(Vec<String>, Vec<String>)> {
        let filters = self.filters.read().await;
        let filter = lookup_ref(&filters, name)?;
        Ok(elements
            .iter()
            .cloned()
            .partition(|element| filter.contains(element.as_bytes())))
    }

    pub async fn delete_element(
        &self,
        name: &str,
        element: &str,
    ) -> RegistryResult<bool> {
        let mut filters = self.filters.write().await;
        let filter = lookup_mut(&mut filters, name)?;
        Ok(filter.remove(element.as_bytes()))
    }

    pub async fn delete_filter(&self, name: &str) -> RegistryResult<()> {
        self.filters
            .write()
            .await
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| RegistryError::FilterNotFound(name.to_string()))
    }

    pub async fn reset(&self, name: &str) -> RegistryResult<()> {
        let mut filters = self.filters.write().await;
        lookup_mut(&mut filters, name)?.reset();
        Ok(())
    }

    pub async fn count(&self, name: &str) -> RegistryResult<u64> {
        let filters = self.filters.read().await;
        Ok(lookup_ref(&filters, name)?.len() as u64)
    }

    /// Filter names in lexical order.
    pub async fn list(&self) -> Vec<String> {
        let mut names: Vec<String> =
            self.filters.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

fn validate_name(name: &str) -> RegistryResult<()> {
    if name.is_empty() {
        return Err(RegistryError::InvalidArgument(
            "filter name must not be empty".into(),
        ));
    }
    Ok(())
}

fn lookup_ref<'a>(
    filters: &'a HashMap<String, CuckooFilter>,
    name: &str,
) -> RegistryResult<&'a CuckooFilter> {
    filters
        .get(name)
        .ok_or_else(|| RegistryError::FilterNotFound(name.to_string()))
}

fn lookup_mut<'a>(
    filters: &'a mut HashMap<String, CuckooFilter>,
    name: &str,
) -> RegistryResult<&'a mut CuckooFilter> {
    filters
        .get_mut(name)
        .ok_or_else(|| RegistryError::FilterNotFound(name.to_string()))
}
