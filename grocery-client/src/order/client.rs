// grocery-client/src/order/client.rs
// 订单流程 - 预览、确认、轮询

use std::sync::Arc;

use shared::{ApiResponse, OrderLine, OrderRecord, OrderRef, PreviewRequest, PreviewResponse};
use tokio_util::sync::CancellationToken;

use super::state::{OrderOutcome, OrderStatus, PendingOrder, ReservedItems};
use crate::http::{ApiRequest, NetworkTransport, Transport};
use crate::poll::{PollOutcome, PollSchedule};
use crate::session::SessionManager;
use crate::{ClientConfig, ClientError, ClientResult};

pub const PREVIEW_PATH: &str = "/api/client/order/preview";
pub const CONFIRM_PATH: &str = "/api/client/order/confirm";
pub const CANCEL_PATH: &str = "/api/client/order/cancel";
pub const HISTORY_PATH: &str = "/api/client/orders";
pub const LAST_ORDER_PATH: &str = "/api/client/orders/last";

/// Client-side driver for one device: its session plus its single in-flight order.
pub struct GroceryClient {
    config: ClientConfig,
    session: SessionManager,
    order: PendingOrder,
}

impl GroceryClient {
    /// Client over the network transport
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let transport = Arc::new(NetworkTransport::new(&config)?);
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let session = SessionManager::new(transport, &config);
        Self {
            config,
            session,
            order: PendingOrder::Idle,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionManager {
        &mut self.session
    }

    pub fn order(&self) -> &PendingOrder {
        &self.order
    }

    // ========== Session ==========

    pub async fn register(
        &self,
        device_id: &str,
        password: &str,
        email: &str,
        phone: &str,
    ) -> ClientResult<()> {
        self.session.register(device_id, password, email, phone).await
    }

    /// Log in; any order tracked for a previous session is forgotten.
    pub async fn login(&mut self, device_id: &str, password: &str) -> ClientResult<()> {
        self.session.login(device_id, password).await?;
        self.order.reset();
        Ok(())
    }

    /// Restore the cached session; `Ok(true)` when a usable session came back.
    ///
    /// An unreachable service is an error and leaves the cache in place.
    pub async fn restore(&mut self) -> ClientResult<bool> {
        Ok(self.session.restore().await?.is_some())
    }

    pub fn logout(&mut self) -> ClientResult<()> {
        self.order.reset();
        self.session.logout()
    }

    // ========== Order lifecycle ==========

    /// Reserve stock for `cart`.
    ///
    /// The cart is normalized and validated before any request is sent. On a
    /// non-2xx answer the error is returned and the order stays idle.
    pub async fn preview(&mut self, cart: &[OrderLine]) -> ClientResult<&PendingOrder> {
        self.order.check_can_preview()?;
        let lines = PendingOrder::prepare_cart(cart)?;
        let requested: ReservedItems = lines
            .iter()
            .map(|l| (l.sku.clone(), l.quantity))
            .collect();

        let request = ApiRequest::post(PREVIEW_PATH).json(&PreviewRequest { items: lines })?;
        let preview: PreviewResponse = self.session.authorized_call(request).await?.json()?;

        let mut items: ReservedItems = preview
            .items
            .into_iter()
            .filter(|(sku, qty)| !sku.is_empty() && *qty > 0)
            .collect();
        if items.is_empty() {
            items = requested;
        }

        self.order.reserved(preview.order_id, items)?;
        tracing::info!(order_id = ?self.order.order_id(), "Order reserved");
        Ok(&self.order)
    }

    /// Confirm the reservation and hand the order to the service.
    pub async fn confirm(&mut self) -> ClientResult<()> {
        let order_id = match &self.order {
            PendingOrder::Reserved { order_id, .. } => order_id.clone(),
            other => {
                return Err(ClientError::InvalidState(format!(
                    "Nothing to confirm: order is {}",
                    other.status()
                )));
            }
        };

        let request = ApiRequest::post(CONFIRM_PATH).json(&OrderRef::new(&order_id))?;
        self.session.authorized_call(request).await?.ensure_success()?;
        self.order.confirm_accepted()?;
        tracing::info!(order_id = %order_id, "Order confirmed");
        Ok(())
    }

    /// Release the reservation. Returns the cancelled order id.
    pub async fn cancel(&mut self) -> ClientResult<String> {
        let order_id = match &self.order {
            PendingOrder::Reserved { order_id, .. } => order_id.clone(),
            other => {
                return Err(ClientError::InvalidState(format!(
                    "Only a reserved order can be cancelled: order is {}",
                    other.status()
                )));
            }
        };

        let request = ApiRequest::post(CANCEL_PATH).json(&OrderRef::new(&order_id))?;
        self.session.authorized_call(request).await?.ensure_success()?;
        let released = self.order.released()?;
        tracing::info!(order_id = %released, "Reservation released");
        Ok(released)
    }

    /// Ask the service once for the order's status.
    pub async fn poll_once(&mut self) -> ClientResult<OrderStatus> {
        if !self.order.is_awaiting_result() {
            return Err(ClientError::InvalidState(format!(
                "Nothing to poll: order is {}",
                self.order.status()
            )));
        }

        let response = self
            .session
            .authorized_call(ApiRequest::get(LAST_ORDER_PATH))
            .await?;
        let record = if response.is_not_found() {
            None
        } else {
            response.json::<ApiResponse<OrderRecord>>()?.into_data()
        };
        self.order.apply_poll(record.as_ref())
    }

    /// Poll until the order is terminal, the attempt cap is hit or `cancel` fires.
    ///
    /// Transport and service errors count as non-terminal polls. An auth
    /// error ends the loop since no later poll can succeed. The terminal
    /// state is kept until [`acknowledge`](Self::acknowledge).
    pub async fn wait_for_completion(
        &mut self,
        cancel: &CancellationToken,
    ) -> ClientResult<PollOutcome<OrderOutcome>> {
        if let Some(outcome) = self.order.outcome() {
            return Ok(PollOutcome::Terminal(outcome));
        }

        let mut schedule = PollSchedule::from_config(&self.config);
        while let Some(attempt) = schedule.next_attempt() {
            if cancel.is_cancelled() {
                return Ok(PollOutcome::Cancelled {
                    attempts: attempt - 1,
                });
            }

            match self.poll_once().await {
                Ok(status) => {
                    tracing::info!(
                        order_id = ?self.order.order_id(),
                        attempt,
                        %status,
                        "Order status"
                    );
                    if let Some(outcome) = self.order.outcome() {
                        return Ok(PollOutcome::Terminal(outcome));
                    }
                }
                Err(e) if e.is_auth() || matches!(e, ClientError::InvalidState(_)) => {
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Order status poll failed");
                }
            }

            if schedule.is_exhausted() {
                break;
            }
            if !schedule.wait(cancel).await {
                return Ok(PollOutcome::Cancelled { attempts: attempt });
            }
        }

        tracing::warn!(
            order_id = ?self.order.order_id(),
            attempts = schedule.attempts(),
            "Order still in progress after max poll attempts"
        );
        Ok(PollOutcome::TimedOut {
            attempts: schedule.attempts(),
        })
    }

    /// Clear a terminal order back to idle
    pub fn acknowledge(&mut self) -> ClientResult<OrderOutcome> {
        self.order.acknowledge()
    }

    // ========== Queries ==========

    /// All orders of this device, in service order
    pub async fn history(&mut self) -> ClientResult<Vec<OrderRecord>> {
        let response = self
            .session
            .authorized_call(ApiRequest::get(HISTORY_PATH))
            .await?;
        Ok(response
            .json::<ApiResponse<Vec<OrderRecord>>>()?
            .into_data()
            .unwrap_or_default())
    }

    /// Most recent order, `None` if the device has none yet
    pub async fn last_order(&mut self) -> ClientResult<Option<OrderRecord>> {
        let response = self
            .session
            .authorized_call(ApiRequest::get(LAST_ORDER_PATH))
            .await?;
        if response.is_not_found() {
            return Ok(None);
        }
        Ok(response.json::<ApiResponse<OrderRecord>>()?.into_data())
    }
}
