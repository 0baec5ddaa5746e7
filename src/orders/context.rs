use std::collections::BTreeMap;

use sqlx::{Sqlite, Transaction};
use thiserror::Error;

use super::Customer;
use crate::database::{customers, Database};

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Customer {0} is not tracked by this context")]
    EntityNotTracked(i64),

    #[error("Customer {0} has already been removed")]
    EntityDeleted(i64),

    #[error("Customer {0} is already persisted and cannot be added again")]
    AlreadyPersisted(i64),

    #[error("Customer has no key; only loaded customers can be updated or removed")]
    MissingKey,

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    Unchanged,
    Modified,
    Deleted,
}

/// Per-kind row counts, either pending or persisted by a flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeCounts {
    pub inserted: u64,
    pub updated: u64,
    pub deleted: u64,
}

impl ChangeCounts {
    pub fn total(&self) -> u64 {
        self.inserted + self.updated + self.deleted
    }
}

#[derive(Debug)]
struct TrackedCustomer {
    current: Customer,
    state: EntityState,
}

/// Change-tracking unit of work over a single SQLite transaction.
///
/// Reads go through the transaction, writes are buffered until
/// [`save_changes`](Self::save_changes) flushes them in one pass. Nothing is
/// ever committed: [`rollback`](Self::rollback) undoes the transaction, and
/// dropping the context has the same effect.
pub struct OrdersContext {
    txn: Transaction<'static, Sqlite>,
    tracked: BTreeMap<i64, TrackedCustomer>,
    added: Vec<Customer>,
}

impl std::fmt::Debug for OrdersContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersContext")
            .field("txn", &"<REDACTED>")
            .field("tracked", &self.tracked.len())
            .field("added", &self.added.len())
            .finish()
    }
}

impl OrdersContext {
    pub async fn begin(database: &Database) -> Result<Self, ContextError> {
        let txn = database.pool.begin().await?;
        Ok(Self::from_transaction(txn))
    }

    pub fn from_transaction(txn: Transaction<'static, Sqlite>) -> Self {
        Self {
            txn,
            tracked: BTreeMap::new(),
            added: Vec::new(),
        }
    }

    /// Loads all customers ordered by id and starts tracking them.
    ///
    /// Customers that are already tracked keep their in-memory values.
    pub async fn query_customers(&mut self) -> Result<Vec<Customer>, ContextError> {
        let loaded = customers::load_all(&mut self.txn).await?;
        let mut result = Vec::with_capacity(loaded.len());

        for customer in loaded {
            let Some(id) = customer.id else { continue };
            let entry = self.tracked.entry(id).or_insert(TrackedCustomer {
                current: customer,
                state: EntityState::Unchanged,
            });
            if entry.state != EntityState::Deleted {
                result.push(entry.current.clone());
            }
        }

        Ok(result)
    }

    pub fn add(&mut self, customer: Customer) -> Result<(), ContextError> {
        if let Some(id) = customer.id {
            return Err(ContextError::AlreadyPersisted(id));
        }
        self.added.push(customer);
        Ok(())
    }

    /// Marks a loaded customer as modified with the given values.
    pub fn update(&mut self, customer: &Customer) -> Result<(), ContextError> {
        let entry = self.tracked_entry(customer)?;
        if entry.state == EntityState::Deleted {
            return Err(ContextError::EntityDeleted(customer.id.unwrap_or_default()));
        }
        entry.current = customer.clone();
        entry.state = EntityState::Modified;
        Ok(())
    }

    pub fn remove(&mut self, customer: &Customer) -> Result<(), ContextError> {
        let entry = self.tracked_entry(customer)?;
        entry.state = EntityState::Deleted;
        Ok(())
    }

    pub fn state_of(&self, id: i64) -> Option<EntityState> {
        self.tracked.get(&id).map(|entry| entry.state)
    }

    pub fn pending_changes(&self) -> ChangeCounts {
        let mut counts = ChangeCounts {
            inserted: self.added.len() as u64,
            ..ChangeCounts::default()
        };
        for entry in self.tracked.values() {
            match entry.state {
                EntityState::Modified => counts.updated += 1,
                EntityState::Deleted => counts.deleted += 1,
                EntityState::Unchanged => {}
            }
        }
        counts
    }

    /// Flushes every buffered change through the transaction.
    ///
    /// Returns the rows actually affected per kind. Pending changes are
    /// accepted afterwards, so a second call with no new changes returns zero.
    pub async fn save_changes(&mut self) -> Result<ChangeCounts, ContextError> {
        let modified: Vec<(i64, String)> = self
            .tracked
            .iter()
            .filter(|(_, entry)| entry.state == EntityState::Modified)
            .map(|(id, entry)| (*id, entry.current.name.clone()))
            .collect();
        let deleted: Vec<i64> = self
            .tracked
            .iter()
            .filter(|(_, entry)| entry.state == EntityState::Deleted)
            .map(|(id, _)| *id)
            .collect();

        let mut counts = ChangeCounts {
            inserted: customers::insert_batch(&mut self.txn, &self.added).await?,
            ..ChangeCounts::default()
        };
        for (id, name) in &modified {
            counts.updated += customers::update(&mut self.txn, *id, name).await?;
        }
        counts.deleted = customers::delete_batch(&mut self.txn, &deleted).await?;

        self.accept_changes();
        Ok(counts)
    }

    pub async fn rollback(self) -> Result<(), ContextError> {
        self.txn.rollback().await?;
        Ok(())
    }

    fn accept_changes(&mut self) {
        self.added.clear();
        self.tracked
            .retain(|_, entry| entry.state != EntityState::Deleted);
        for entry in self.tracked.values_mut() {
            entry.state = EntityState::Unchanged;
        }
    }

    fn tracked_entry(&mut self, customer: &Customer) -> Result<&mut TrackedCustomer, ContextError> {
        let id = customer.id.ok_or(ContextError::MissingKey)?;
        self.tracked
            .get_mut(&id)
            .ok_or(ContextError::EntityNotTracked(id))
    }
}
