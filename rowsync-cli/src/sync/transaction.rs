//! Run-wide destination transaction
//!
//! ```text
//! Idle --first batch--> Open --commit--> Committed
//!   |                     |
//!   |                     +--error/abort--> Aborted
//!   +--(empty change set: stays Idle, nothing to commit)
//! ```
//!
//! Every batch of a run goes through one coordinator, so the destination sees
//! either all of them or none.

use std::fmt;

use serde::Serialize;

use super::batch::Batch;
use super::error::{SyncError, SyncResult};
use super::record::{NaturalKey, SyncRecord};
use crate::destination::DestinationStore;
use crate::schema::EntitySchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxState {
    Idle,
    Open,
    Committed,
    Aborted,
}

impl fmt::Display for TxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TxState::Idle => "idle",
            TxState::Open => "open",
            TxState::Committed => "committed",
            TxState::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

pub struct TransactionCoordinator<'a> {
    store: &'a mut dyn DestinationStore,
    state: TxState,
}

impl<'a> TransactionCoordinator<'a> {
    pub fn new(store: &'a mut dyn DestinationStore) -> Self {
        Self {
            store,
            state: TxState::Idle,
        }
    }

    pub fn state(&self) -> TxState {
        self.state
    }

    /// Write one batch, opening the transaction on the first call.
    ///
    /// A failed write rolls the transaction back before the error is returned.
    pub async fn apply(
        &mut self,
        schema: &'static EntitySchema,
        batch: &Batch<'_, SyncRecord>,
    ) -> SyncResult<Vec<NaturalKey>> {
        match self.state {
            TxState::Idle => {
                self.store.begin().await?;
                self.state = TxState::Open;
                log::debug!("Transaction opened on {}", self.store.describe());
            }
            TxState::Open => {}
            state => return Err(invalid("write a batch", state)),
        }

        log::info!("Writing {} into {}", batch, schema.table);
        match self.store.upsert_batch(schema, batch.records).await {
            Ok(keys) => Ok(keys),
            Err(e) => {
                log::error!("{} failed: {}", batch, e);
                self.abort().await;
                Err(e)
            }
        }
    }

    /// Commit the open transaction. Committing an idle coordinator is a no-op:
    /// an empty change set never opens a transaction.
    pub async fn commit(&mut self) -> SyncResult<()> {
        match self.state {
            TxState::Idle => Ok(()),
            TxState::Open => match self.store.commit().await {
                Ok(()) => {
                    self.state = TxState::Committed;
                    log::debug!("Transaction committed");
                    Ok(())
                }
                Err(e) => {
                    self.abort().await;
                    Err(e)
                }
            },
            state => Err(invalid("commit", state)),
        }
    }

    /// Roll back if a transaction is open. Rollback failures are logged; the
    /// destination discards an uncommitted transaction when the session ends.
    pub async fn abort(&mut self) {
        if self.state == TxState::Open {
            if let Err(e) = self.store.rollback().await {
                log::warn!("Rollback failed: {}", e);
            } else {
                log::warn!("Transaction rolled back");
            }
        }
        if self.state != TxState::Committed {
            self.state = TxState::Aborted;
        }
    }
}

fn invalid(action: &'static str, state: TxState) -> SyncError {
    SyncError::InvalidTransition {
        action,
        state: state.to_string(),
    }
}
