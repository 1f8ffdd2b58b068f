//! CheckoutManager - turns a cart into a priced, immutable order
//!
//! # Checkout Flow
//!
//! ```text
//! place_order(req)
//!     ├─ 1. Idempotency check (command_id)
//!     ├─ 2. Resolve lines (user cart / guest item list) and validate
//!     ├─ 3. Snapshot products, pre-check stock        (no side effects yet)
//!     ├─ 4. Reserve stock per line (each atomic), undo log kept
//!     ├─ 5. Allocate order id, persist order + command marker
//!     ├─ 6. Clear the originating cart (authenticated checkout only)
//!     └─ 7. Broadcast OrderPlaced and return the order
//! ```
//!
//! Steps 1-3 are pure validation and safe to retry. From step 4 on, every
//! already-applied reservation is tracked in an undo log; any later failure
//! (a losing reservation race, an order-persist error after retries)
//! releases the reserved lines before the error is returned. Stock is never
//! left decremented without a corresponding persisted order.
//!
//! A cart-clear failure after the order is persisted is logged and absorbed
//! instead of compensated: the order and stock are already consistent, and
//! deleting a persisted order over a cart hiccup would be worse than a stale
//! cart. Rollback releases are best-effort as well; a storage failure there
//! is logged at error level for operator attention.

mod error;
pub use error::*;

use crate::inventory::InventoryLedger;
use crate::money;
use crate::store::{
    CartRepository, EntityKind, OrderRepository, ProductRepository, SequenceAllocator,
    TransitionOutcome, with_retry,
};
use shared::checkout::{CheckoutRequest, ShopEvent};
use shared::models::{CartItemInput, Order, OrderLine, OrderOwner, OrderStatus, Product};
use shared::util::now_millis;
use tokio::sync::broadcast;
use validator::Validate;

/// Phases of one checkout attempt, in order. A failure in any phase returns
/// early; the undo log decides what still needs compensation.
#[derive(Debug, Clone, Copy)]
enum CheckoutPhase {
    Started,
    ItemsValidated,
    StockReserved,
    OrderPersisted,
    CartCleared,
    Done,
}

/// CheckoutManager for order assembly and status transitions
pub struct CheckoutManager {
    products: ProductRepository,
    carts: CartRepository,
    orders: OrderRepository,
    sequences: SequenceAllocator,
    inventory: InventoryLedger,
    event_tx: broadcast::Sender<ShopEvent>,
}

impl CheckoutManager {
    pub fn new(
        products: ProductRepository,
        carts: CartRepository,
        orders: OrderRepository,
        sequences: SequenceAllocator,
        inventory: InventoryLedger,
        event_tx: broadcast::Sender<ShopEvent>,
    ) -> Self {
        Self {
            products,
            carts,
            orders,
            sequences,
            inventory,
            event_tx,
        }
    }

    /// Subscribe to event broadcasts
    pub fn subscribe(&self) -> broadcast::Receiver<ShopEvent> {
        self.event_tx.subscribe()
    }

    /// Place an order from a checkout request
    ///
    /// Re-submitting the same `command_id` returns the order created by the
    /// first submission and reserves no additional stock.
    pub fn place_order(&self, req: &CheckoutRequest) -> CheckoutResult<Order> {
        let mut phase = CheckoutPhase::Started;
        tracing::debug!(command_id = %req.command_id, owner = ?req.owner, phase = ?phase, "Processing checkout");

        // 1. Idempotency check
        if let Some(order_id) = self.orders.find_by_command(&req.command_id)? {
            tracing::warn!(command_id = %req.command_id, order_id, "Duplicate checkout command");
            return self
                .orders
                .find_by_id(order_id)?
                .ok_or(CheckoutError::OrderNotFound(order_id));
        }

        // 2. Resolve and validate lines (pure, no side effects)
        req.shipping
            .validate()
            .map_err(|e| CheckoutError::Validation(e.to_string()))?;
        let lines = self.resolve_lines(req)?;

        // 3. Snapshot products and pre-check stock
        let snapshots = self.snapshot_products(&lines)?;
        phase = CheckoutPhase::ItemsValidated;

        // 4. Reserve stock per line, keeping an undo log
        let mut reserved: Vec<(u64, u32)> = Vec::new();
        for line in &lines {
            match self.inventory.reserve(line.product_id, line.quantity) {
                Ok(_) => reserved.push((line.product_id, line.quantity)),
                Err(e) => {
                    tracing::warn!(
                        phase = ?phase,
                        product_id = line.product_id,
                        error = %e,
                        "Checkout failed during reservation, rolling back"
                    );
                    self.rollback_reservations(&reserved);
                    return Err(e.into());
                }
            }
        }
        phase = CheckoutPhase::StockReserved;

        // 5. Assemble and persist the order
        let order_lines: Vec<OrderLine> = lines
            .iter()
            .zip(&snapshots)
            .map(|(line, product)| OrderLine {
                product_id: product.id,
                product_name: product.name.clone(),
                unit_price: product.price,
                quantity: line.quantity,
                subtotal: money::line_subtotal(product.price, line.quantity),
            })
            .collect();
        let total = money::order_total(order_lines.iter().map(|l| l.subtotal));

        let order_id = match with_retry("checkout.order_id", || {
            self.sequences.next(EntityKind::Order)
        }) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(phase = ?phase, error = %e, "Order id allocation failed, rolling back");
                self.rollback_reservations(&reserved);
                return Err(e.into());
            }
        };

        let now = now_millis();
        let order = Order {
            id: order_id,
            owner: req.owner.clone(),
            lines: order_lines,
            total,
            status: OrderStatus::Pending,
            shipping: req.shipping.clone(),
            payment_method: req.payment_method,
            created_at: now,
            updated_at: now,
        };

        match with_retry("checkout.persist", || {
            self.orders.insert(&order, Some(&req.command_id))
        }) {
            Ok(winner_id) if winner_id == order_id => {}
            Ok(winner_id) => {
                // A concurrent submission of the same command won the write;
                // our reservation belongs to nothing and must be undone
                tracing::warn!(command_id = %req.command_id, winner_id, "Duplicate checkout raced ahead, rolling back");
                self.rollback_reservations(&reserved);
                return self
                    .orders
                    .find_by_id(winner_id)?
                    .ok_or(CheckoutError::OrderNotFound(winner_id));
            }
            Err(e) => {
                // The central correctness property: a failed order write must
                // not leave stock decremented
                tracing::error!(phase = ?phase, order_id, error = %e, "Order persistence failed, rolling back");
                self.rollback_reservations(&reserved);
                return Err(e.into());
            }
        }
        phase = CheckoutPhase::OrderPersisted;

        // 6. Clear the originating cart (guests have none)
        if let OrderOwner::User(user_id) = req.owner {
            if let Err(e) = with_retry("checkout.clear_cart", || self.carts.clear(user_id)) {
                tracing::error!(phase = ?phase, order_id, user_id, error = %e, "Cart clear failed after checkout");
            }
        }
        phase = CheckoutPhase::CartCleared;
        tracing::debug!(order_id, phase = ?phase, "Cart step complete");

        // 7. Broadcast and return
        if self
            .event_tx
            .send(ShopEvent::OrderPlaced { order_id, total })
            .is_err()
        {
            tracing::debug!("Event broadcast skipped: no active receivers");
        }
        phase = CheckoutPhase::Done;
        tracing::info!(order_id, total, lines = order.lines.len(), phase = ?phase, "Order placed");
        Ok(order)
    }

    /// Move an order along its lifecycle
    ///
    /// Normal transitions follow the linear chain; `admin_override` permits
    /// administrative corrections. Cancelling an order whose goods have not
    /// shipped releases its line quantities back to stock.
    pub fn update_order_status(
        &self,
        order_id: u64,
        new_status: OrderStatus,
        admin_override: bool,
    ) -> CheckoutResult<Order> {
        let outcome = with_retry("checkout.transition", || {
            self.orders
                .transition_status(order_id, new_status, admin_override)
        })?;
        match outcome {
            TransitionOutcome::NotFound => Err(CheckoutError::OrderNotFound(order_id)),
            TransitionOutcome::Illegal { from } => {
                tracing::warn!(order_id, from = ?from, to = ?new_status, "Illegal status transition rejected");
                Err(CheckoutError::IllegalTransition {
                    from,
                    to: new_status,
                })
            }
            TransitionOutcome::Updated { order, from } => {
                if new_status == OrderStatus::Cancelled
                    && matches!(from, OrderStatus::Pending | OrderStatus::Processing)
                {
                    self.restock_cancelled_order(&order);
                }
                if self
                    .event_tx
                    .send(ShopEvent::OrderStatusChanged {
                        order_id,
                        from,
                        to: new_status,
                    })
                    .is_err()
                {
                    tracing::debug!("Event broadcast skipped: no active receivers");
                }
                tracing::info!(order_id, from = ?from, to = ?new_status, "Order status updated");
                Ok(order)
            }
        }
    }

    /// Resolve the lines to order: the stored cart for users, the explicit
    /// item list for guests (duplicates merged, cart semantics)
    fn resolve_lines(&self, req: &CheckoutRequest) -> CheckoutResult<Vec<CartItemInput>> {
        let lines: Vec<CartItemInput> = match &req.owner {
            OrderOwner::User(user_id) => {
                let cart = self.carts.get(*user_id)?;
                cart.lines
                    .iter()
                    .map(|l| CartItemInput {
                        product_id: l.product_id,
                        quantity: l.quantity,
                    })
                    .collect()
            }
            OrderOwner::Guest(email) => {
                if email.trim().is_empty() || !email.contains('@') {
                    return Err(CheckoutError::Validation(format!(
                        "invalid guest contact email: {email:?}"
                    )));
                }
                let mut merged: Vec<CartItemInput> = Vec::new();
                for item in req.items.as_deref().unwrap_or_default() {
                    match merged.iter_mut().find(|m| m.product_id == item.product_id) {
                        Some(m) => m.quantity = m.quantity.saturating_add(item.quantity),
                        None => merged.push(*item),
                    }
                }
                merged
            }
        };

        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        for line in &lines {
            money::validate_quantity(line.quantity).map_err(CheckoutError::Validation)?;
        }
        Ok(lines)
    }

    /// Look up every line's product and pre-check stock; fails whole (no
    /// partial orders). Reservation remains the source of truth under
    /// concurrency - this check just fails fast without side effects.
    fn snapshot_products(&self, lines: &[CartItemInput]) -> CheckoutResult<Vec<Product>> {
        let mut snapshots = Vec::with_capacity(lines.len());
        for line in lines {
            let product = self
                .products
                .find_by_id(line.product_id)?
                .ok_or(CheckoutError::ProductNotFound(line.product_id))?;
            if product.stock < line.quantity {
                return Err(CheckoutError::InsufficientStock {
                    product_id: product.id,
                    requested: line.quantity,
                    available: product.stock,
                });
            }
            snapshots.push(product);
        }
        Ok(snapshots)
    }

    /// Compensation: release every reservation in the undo log (best effort)
    fn rollback_reservations(&self, reserved: &[(u64, u32)]) {
        for &(product_id, quantity) in reserved {
            if let Err(e) = self.inventory.release(product_id, quantity) {
                tracing::error!(product_id, quantity, error = %e, "Failed to release reserved stock during rollback");
            }
        }
    }

    /// Compensation for cancellation: put the order's quantities back
    fn restock_cancelled_order(&self, order: &Order) {
        for line in &order.lines {
            match self.inventory.release(line.product_id, line.quantity) {
                Ok(stock) => {
                    tracing::debug!(order_id = order.id, product_id = line.product_id, stock, "Cancelled line restocked");
                }
                Err(e) => {
                    tracing::error!(order_id = order.id, product_id = line.product_id, error = %e, "Failed to restock cancelled line");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
