use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::models::{CampaignResult, CopyField};

#[derive(Debug, Default)]
struct StoreInner {
    result: Option<CampaignResult>,
    /// Bumped whenever the held result is replaced or dropped.
    epoch: u64,
}

/// Live, locally editable copy of the last successful campaign.
///
/// Cloning yields another handle onto the same store. Writers are the
/// campaign session (`seed`, `clear`) and the refinement workflow
/// (`overwrite`).
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the store wholesale.
    pub fn seed(&self, result: CampaignResult) {
        let mut inner = self.write();
        inner.result = Some(result);
        inner.epoch += 1;
        log::debug!("result store seeded (epoch {})", inner.epoch);
    }

    pub fn clear(&self) {
        let mut inner = self.write();
        if inner.result.take().is_some() {
            inner.epoch += 1;
            log::debug!("result store cleared (epoch {})", inner.epoch);
        }
    }

    /// Replaces exactly one marketing copy field. Returns `false` when the
    /// store is empty.
    pub fn overwrite(&self, field: CopyField, value: &str) -> bool {
        let mut inner = self.write();
        match inner.result.as_mut() {
            Some(result) => {
                result.marketing_copy.set_field(field, value);
                log::debug!("overwrote {}", field);
                true
            }
            None => false,
        }
    }

    /// Like [`overwrite`](Self::overwrite), but only if the store still holds
    /// the result seen at `epoch`.
    pub(crate) fn overwrite_at(&self, epoch: u64, field: CopyField, value: &str) -> bool {
        let mut inner = self.write();
        if inner.epoch != epoch {
            return false;
        }
        match inner.result.as_mut() {
            Some(result) => {
                result.marketing_copy.set_field(field, value);
                log::debug!("overwrote {} (epoch {})", field, epoch);
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> Option<CampaignResult> {
        self.read().result.clone()
    }

    /// Current text of one field, with the epoch it was read at.
    pub fn field_text(&self, field: CopyField) -> Option<(String, u64)> {
        let inner = self.read();
        inner
            .result
            .as_ref()
            .map(|result| (result.marketing_copy.field_text(field), inner.epoch))
    }

    pub fn epoch(&self) -> u64 {
        self.read().epoch
    }

    pub fn is_empty(&self) -> bool {
        self.read().result.is_none()
    }
}
