//! Order lifecycle state machine
//!
//! ```text
//! Idle ──preview──▶ Reserved ──confirm──▶ Confirming ──poll──▶ InProgress
//!   ▲                  │                       │                   │
//!   │               cancel                     └───────poll────────┤
//!   │                  ▼                                           ▼
//!   └──────────────── Idle ◀────acknowledge──── Completed / Failed / Cancelled
//! ```
//!
//! Transitions are pure: the workflow in [`super::client`] only calls them
//! after the service answered with a 2xx, so a failed request never moves
//! the machine.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use shared::{OrderLine, OrderRecord};

use crate::poll::{StatusClass, classify_status};
use crate::{ClientError, ClientResult};

/// SKU → reserved quantity
pub type ReservedItems = BTreeMap<String, u32>;

/// Flat status name of a [`PendingOrder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    None,
    Reserved,
    Confirming,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Failed | OrderStatus::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::None => "NONE",
            OrderStatus::Reserved => "RESERVED",
            OrderStatus::Confirming => "CONFIRMING",
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Failed => "FAILED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single in-flight order of a session
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PendingOrder {
    #[default]
    Idle,
    Reserved {
        order_id: String,
        items: ReservedItems,
    },
    Confirming {
        order_id: String,
        items: ReservedItems,
    },
    InProgress {
        order_id: String,
        items: ReservedItems,
        /// Last status string reported by the service
        status: String,
    },
    Completed {
        order_id: String,
        items: ReservedItems,
        total_price: Decimal,
    },
    Failed {
        order_id: String,
        items: ReservedItems,
        status: String,
    },
    Cancelled {
        order_id: String,
        items: ReservedItems,
    },
}

/// What a terminal order settled as
#[derive(Debug, Clone, PartialEq)]
pub enum OrderOutcome {
    Completed {
        order_id: String,
        items: ReservedItems,
        total_price: Decimal,
    },
    Failed {
        order_id: String,
        status: String,
    },
    Cancelled {
        order_id: String,
    },
}

impl OrderOutcome {
    pub fn order_id(&self) -> &str {
        match self {
            OrderOutcome::Completed { order_id, .. }
            | OrderOutcome::Failed { order_id, .. }
            | OrderOutcome::Cancelled { order_id } => order_id,
        }
    }

    /// `Completed` passes through, a failure becomes [`ClientError::TerminalFailure`]
    pub fn into_result(self) -> ClientResult<OrderOutcome> {
        match self {
            OrderOutcome::Failed { order_id, status } => {
                Err(ClientError::TerminalFailure { order_id, status })
            }
            other => Ok(other),
        }
    }
}

impl PendingOrder {
    pub fn status(&self) -> OrderStatus {
        match self {
            PendingOrder::Idle => OrderStatus::None,
            PendingOrder::Reserved { .. } => OrderStatus::Reserved,
            PendingOrder::Confirming { .. } => OrderStatus::Confirming,
            PendingOrder::InProgress { .. } => OrderStatus::InProgress,
            PendingOrder::Completed { .. } => OrderStatus::Completed,
            PendingOrder::Failed { .. } => OrderStatus::Failed,
            PendingOrder::Cancelled { .. } => OrderStatus::Cancelled,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, PendingOrder::Idle)
    }

    /// Confirmed and waiting on the service
    pub fn is_awaiting_result(&self) -> bool {
        matches!(
            self,
            PendingOrder::Confirming { .. } | PendingOrder::InProgress { .. }
        )
    }

    pub fn order_id(&self) -> Option<&str> {
        match self {
            PendingOrder::Idle => None,
            PendingOrder::Reserved { order_id, .. }
            | PendingOrder::Confirming { order_id, .. }
            | PendingOrder::InProgress { order_id, .. }
            | PendingOrder::Completed { order_id, .. }
            | PendingOrder::Failed { order_id, .. }
            | PendingOrder::Cancelled { order_id, .. } => Some(order_id),
        }
    }

    pub fn items(&self) -> Option<&ReservedItems> {
        match self {
            PendingOrder::Idle => None,
            PendingOrder::Reserved { items, .. }
            | PendingOrder::Confirming { items, .. }
            | PendingOrder::InProgress { items, .. }
            | PendingOrder::Completed { items, .. }
            | PendingOrder::Failed { items, .. }
            | PendingOrder::Cancelled { items, .. } => Some(items),
        }
    }

    pub fn total_price(&self) -> Option<Decimal> {
        match self {
            PendingOrder::Completed { total_price, .. } => Some(*total_price),
            _ => None,
        }
    }

    /// Normalize a cart: blank SKUs and zero quantities are dropped, duplicate
    /// SKUs summed. Fails when nothing orderable is left.
    pub fn prepare_cart(cart: &[OrderLine]) -> ClientResult<Vec<OrderLine>> {
        let mut merged: Vec<OrderLine> = Vec::new();
        for line in cart {
            let sku = line.sku.trim();
            if sku.is_empty() || line.quantity == 0 {
                continue;
            }
            match merged.iter_mut().find(|l| l.sku == sku) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity)
                }
                None => merged.push(OrderLine::new(sku, line.quantity)),
            }
        }
        if merged.is_empty() {
            return Err(ClientError::Validation(
                "Add at least one item with a positive quantity to your cart".into(),
            ));
        }
        Ok(merged)
    }

    /// Preview is only allowed with no order in flight
    pub fn check_can_preview(&self) -> ClientResult<()> {
        match self.order_id() {
            None => Ok(()),
            Some(order_id) => Err(ClientError::InvalidState(format!(
                "Order {order_id} is {}; finish it before starting a new one",
                self.status()
            ))),
        }
    }

    /// Idle → Reserved
    pub fn reserved(&mut self, order_id: String, items: ReservedItems) -> ClientResult<()> {
        self.check_can_preview()?;
        if order_id.is_empty() {
            return Err(ClientError::InvalidResponse(
                "preview response carries no order id".into(),
            ));
        }
        *self = PendingOrder::Reserved { order_id, items };
        Ok(())
    }

    /// Reserved → Confirming
    pub fn confirm_accepted(&mut self) -> ClientResult<()> {
        match std::mem::take(self) {
            PendingOrder::Reserved { order_id, items } => {
                *self = PendingOrder::Confirming { order_id, items };
                Ok(())
            }
            other => {
                let err = invalid("confirm", &other);
                *self = other;
                Err(err)
            }
        }
    }

    /// Reserved → Idle. Returns the released order id.
    pub fn released(&mut self) -> ClientResult<String> {
        match std::mem::take(self) {
            PendingOrder::Reserved { order_id, .. } => Ok(order_id),
            other => {
                let err = invalid("cancel", &other);
                *self = other;
                Err(err)
            }
        }
    }

    /// Apply one polled record (`None`: the service has no record yet).
    ///
    /// Only valid while Confirming or InProgress. A record for another order
    /// counts as a non-terminal poll.
    pub fn apply_poll(&mut self, record: Option<&OrderRecord>) -> ClientResult<OrderStatus> {
        let (order_id, items, last_status) = match std::mem::take(self) {
            PendingOrder::Confirming { order_id, items } => (order_id, items, String::new()),
            PendingOrder::InProgress {
                order_id,
                items,
                status,
            } => (order_id, items, status),
            other => {
                let err = invalid("poll", &other);
                *self = other;
                return Err(err);
            }
        };

        let matching = record.filter(|r| r.order_id.is_empty() || r.order_id == order_id);
        let Some(record) = matching else {
            if let Some(other) = record {
                tracing::debug!(
                    tracked = %order_id,
                    polled = %other.order_id,
                    "Polled record belongs to another order"
                );
            }
            *self = PendingOrder::InProgress {
                order_id,
                items,
                status: last_status,
            };
            return Ok(OrderStatus::InProgress);
        };

        *self = match classify_status(&record.status) {
            StatusClass::Completed => PendingOrder::Completed {
                order_id,
                items,
                total_price: record.total_price,
            },
            StatusClass::Failed => PendingOrder::Failed {
                order_id,
                items,
                status: record.status.clone(),
            },
            StatusClass::Cancelled => PendingOrder::Cancelled { order_id, items },
            StatusClass::Pending => PendingOrder::InProgress {
                order_id,
                items,
                status: record.status.clone(),
            },
        };
        Ok(self.status())
    }

    /// Outcome of a terminal order, without clearing it
    pub fn outcome(&self) -> Option<OrderOutcome> {
        match self {
            PendingOrder::Completed {
                order_id,
                items,
                total_price,
            } => Some(OrderOutcome::Completed {
                order_id: order_id.clone(),
                items: items.clone(),
                total_price: *total_price,
            }),
            PendingOrder::Failed {
                order_id, status, ..
            } => Some(OrderOutcome::Failed {
                order_id: order_id.clone(),
                status: status.clone(),
            }),
            PendingOrder::Cancelled { order_id, .. } => Some(OrderOutcome::Cancelled {
                order_id: order_id.clone(),
            }),
            _ => None,
        }
    }

    /// Terminal → Idle
    pub fn acknowledge(&mut self) -> ClientResult<OrderOutcome> {
        match self.outcome() {
            Some(outcome) => {
                *self = PendingOrder::Idle;
                Ok(outcome)
            }
            None => Err(invalid("acknowledge", self)),
        }
    }

    /// Forget any order (new login, logout)
    pub fn reset(&mut self) {
        *self = PendingOrder::Idle;
    }
}

fn invalid(action: &str, state: &PendingOrder) -> ClientError {
    ClientError::InvalidState(format!("Cannot {action} while order is {}", state.status()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(order_id: &str, status: &str, total: Decimal) -> OrderRecord {
        OrderRecord {
            order_id: order_id.into(),
            status: status.into(),
            total_price: total,
            created_at: None,
        }
    }

    fn milk() -> ReservedItems {
        BTreeMap::from([("MILK-1".to_string(), 2)])
    }

    fn confirming() -> PendingOrder {
        let mut order = PendingOrder::Idle;
        order.reserved("ord-1".into(), milk()).unwrap();
        order.confirm_accepted().unwrap();
        order
    }

    #[test]
    fn test_prepare_cart_merges_and_drops() {
        let cart = vec![
            OrderLine::new("MILK-1", 1),
            OrderLine::new("  ", 3),
            OrderLine::new("EGGS-12", 0),
            OrderLine::new("MILK-1", 1),
        ];
        let lines = PendingOrder::prepare_cart(&cart).unwrap();
        assert_eq!(lines, vec![OrderLine::new("MILK-1", 2)]);
    }

    #[test]
    fn test_empty_cart_rejected() {
        let err = PendingOrder::prepare_cart(&[OrderLine::new("MILK-1", 0)]).unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(PendingOrder::prepare_cart(&[]).is_err());
    }

    #[test]
    fn test_preview_then_cancel_returns_to_idle() {
        let mut order = PendingOrder::Idle;
        order.reserved("ord-1".into(), milk()).unwrap();
        assert_eq!(order.status(), OrderStatus::Reserved);
        assert_eq!(order.order_id(), Some("ord-1"));

        assert_eq!(order.released().unwrap(), "ord-1");
        assert_eq!(order, PendingOrder::Idle);
        assert!(order.order_id().is_none());
    }

    #[test]
    fn test_second_preview_while_active_is_invalid() {
        let mut order = PendingOrder::Idle;
        order.reserved("ord-1".into(), milk()).unwrap();
        let err = order.reserved("ord-2".into(), milk()).unwrap_err();
        assert!(matches!(err, ClientError::InvalidState(_)));
        assert_eq!(order.order_id(), Some("ord-1"));
    }

    #[test]
    fn test_confirm_requires_reservation() {
        let mut order = PendingOrder::Idle;
        assert!(order.confirm_accepted().is_err());
        assert_eq!(order, PendingOrder::Idle);
    }

    #[test]
    fn test_cancel_after_confirm_is_invalid() {
        let mut order = confirming();
        assert!(order.released().is_err());
        assert_eq!(order.status(), OrderStatus::Confirming);
    }

    #[test]
    fn test_polls_until_completed() {
        let mut order = confirming();
        for _ in 0..3 {
            let status = order
                .apply_poll(Some(&record("ord-1", "IN_PROGRESS", Decimal::ZERO)))
                .unwrap();
            assert_eq!(status, OrderStatus::InProgress);
        }
        let status = order
            .apply_poll(Some(&record("ord-1", "COMPLETED", Decimal::new(1250, 2))))
            .unwrap();
        assert_eq!(status, OrderStatus::Completed);
        assert_eq!(order.total_price(), Some(Decimal::new(1250, 2)));
        assert_eq!(order.items(), Some(&milk()));
    }

    #[test]
    fn test_confirming_can_go_straight_to_terminal() {
        let mut order = confirming();
        let status = order
            .apply_poll(Some(&record("ord-1", "FAILED_DISPATCH", Decimal::ZERO)))
            .unwrap();
        assert_eq!(status, OrderStatus::Failed);
    }

    #[test]
    fn test_status_matching_is_asymmetric() {
        let mut late = confirming();
        late.apply_poll(Some(&record("ord-1", "COMPLETED_LATE", Decimal::ONE)))
            .unwrap();
        assert_eq!(late.status(), OrderStatus::InProgress);
        assert!(late.total_price().is_none());

        let mut payment = confirming();
        payment
            .apply_poll(Some(&record("ord-1", "PAYMENT_FAILED", Decimal::ZERO)))
            .unwrap();
        assert_eq!(
            payment.outcome(),
            Some(OrderOutcome::Failed {
                order_id: "ord-1".into(),
                status: "PAYMENT_FAILED".into()
            })
        );
    }

    #[test]
    fn test_record_for_other_order_is_not_terminal() {
        let mut order = confirming();
        order
            .apply_poll(Some(&record("ord-0", "COMPLETED", Decimal::ONE)))
            .unwrap();
        assert_eq!(order.status(), OrderStatus::InProgress);

        order.apply_poll(None).unwrap();
        assert_eq!(order.status(), OrderStatus::InProgress);
    }

    #[test]
    fn test_polled_cancellation_is_terminal() {
        let mut order = confirming();
        order
            .apply_poll(Some(&record("ord-1", "CANCELLED", Decimal::ZERO)))
            .unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(
            order.acknowledge().unwrap(),
            OrderOutcome::Cancelled {
                order_id: "ord-1".into()
            }
        );
        assert_eq!(order, PendingOrder::Idle);
    }

    #[test]
    fn test_acknowledge_only_from_terminal() {
        let mut order = confirming();
        assert!(order.acknowledge().is_err());
        assert_eq!(order.status(), OrderStatus::Confirming);

        order
            .apply_poll(Some(&record("ord-1", "COMPLETED", Decimal::new(1250, 2))))
            .unwrap();
        let outcome = order.acknowledge().unwrap();
        assert_eq!(outcome.order_id(), "ord-1");
        assert!(outcome.into_result().is_ok());
        assert!(!order.is_active());
    }

    #[test]
    fn test_failed_outcome_into_terminal_failure() {
        let outcome = OrderOutcome::Failed {
            order_id: "ord-1".into(),
            status: "PAYMENT_FAILED".into(),
        };
        assert!(matches!(
            outcome.into_result(),
            Err(ClientError::TerminalFailure { .. })
        ));
    }

    #[test]
    fn test_poll_rejected_outside_confirmed_states() {
        let mut order = PendingOrder::Idle;
        assert!(order.apply_poll(None).is_err());
        order.reserved("ord-1".into(), milk()).unwrap();
        assert!(order.apply_poll(None).is_err());
        assert_eq!(order.status(), OrderStatus::Reserved);
    }
}
