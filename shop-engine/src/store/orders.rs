//! Order Repository
//!
//! Orders are written once and never rewritten except for their status.
//! Insertion and the idempotency marker commit in the same transaction, so
//! a recorded command id always points at a persisted order.

use super::{ORDERS_TABLE, PROCESSED_COMMANDS_TABLE, StorageResult, StoreDb};
use redb::ReadableTable;
use shared::models::{Order, OrderOwner, OrderStatus};
use shared::util::now_millis;

/// Result of an atomic status transition
#[derive(Debug, Clone)]
pub enum TransitionOutcome {
    /// Status was updated; `from` is the previous status
    Updated { order: Order, from: OrderStatus },
    /// The transition is not legal from the current status
    Illegal { from: OrderStatus },
    NotFound,
}

#[derive(Clone)]
pub struct OrderRepository {
    db: StoreDb,
}

impl OrderRepository {
    pub fn new(db: StoreDb) -> Self {
        Self { db }
    }

    /// Persist a new order; when `command_id` is given, record it in the
    /// same transaction for duplicate-submission detection
    ///
    /// The command id is re-checked inside the transaction: if a racing
    /// duplicate submission already recorded it, nothing is written and the
    /// previously recorded order id is returned instead of `order.id`.
    pub fn insert(&self, order: &Order, command_id: Option<&str>) -> StorageResult<u64> {
        let txn = self.db.begin_write()?;
        let winner = {
            let mut orders = txn.open_table(ORDERS_TABLE)?;
            match command_id {
                Some(command_id) => {
                    let mut commands = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
                    let existing = commands.get(command_id)?.map(|g| g.value());
                    match existing {
                        Some(existing_id) => existing_id,
                        None => {
                            let value = serde_json::to_vec(order)?;
                            orders.insert(order.id, value.as_slice())?;
                            commands.insert(command_id, order.id)?;
                            order.id
                        }
                    }
                }
                None => {
                    let value = serde_json::to_vec(order)?;
                    orders.insert(order.id, value.as_slice())?;
                    order.id
                }
            }
        };
        txn.commit()?;
        Ok(winner)
    }

    pub fn find_by_id(&self, id: u64) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// All orders belonging to an owner, oldest first
    pub fn find_by_owner(&self, owner: &OrderOwner) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let order: Order = serde_json::from_slice(value.value())?;
            if &order.owner == owner {
                orders.push(order);
            }
        }
        Ok(orders)
    }

    /// Order id previously created for this command, if any
    pub fn find_by_command(&self, command_id: &str) -> StorageResult<Option<u64>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.map(|g| g.value()))
    }

    /// Atomically move an order to `new_status`
    ///
    /// Legality is checked against [`OrderStatus::can_transition_to`] inside
    /// the same transaction that writes the update, so two concurrent
    /// transitions cannot both pass the check. `admin_override` skips the
    /// legality check (administrative correction path).
    pub fn transition_status(
        &self,
        id: u64,
        new_status: OrderStatus,
        admin_override: bool,
    ) -> StorageResult<TransitionOutcome> {
        let txn = self.db.begin_write()?;
        let outcome = {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            let order: Option<Order> = match table.get(id)? {
                Some(guard) => Some(serde_json::from_slice(guard.value())?),
                None => None,
            };
            match order {
                None => TransitionOutcome::NotFound,
                Some(mut order) => {
                    let from = order.status;
                    if !admin_override && !from.can_transition_to(new_status) {
                        TransitionOutcome::Illegal { from }
                    } else {
                        order.status = new_status;
                        order.updated_at = now_millis();
                        let value = serde_json::to_vec(&order)?;
                        table.insert(id, value.as_slice())?;
                        TransitionOutcome::Updated { order, from }
                    }
                }
            }
        };
        txn.commit()?;
        Ok(outcome)
    }
}
