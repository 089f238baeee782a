// grocery-client/src/restock/client.rs
// 补货流程 - 提交、轮询

use std::sync::Arc;

use shared::{ApiResponse, RestockRecord, RestockSubmitted};
use tokio_util::sync::CancellationToken;

use super::batch::{RestockBatch, TruckIdentity};
use super::state::{RestockOutcome, RestockState, RestockStatus};
use crate::http::{ApiRequest, NetworkTransport, Transport};
use crate::poll::{PollOutcome, PollSchedule};
use crate::{ClientConfig, ClientError, ClientResult};

pub const TRUCK_REGISTER_PATH: &str = "/api/truck/register";
pub const RESTOCK_PATH: &str = "/api/truck/restock";
pub const RESTOCK_STATUS_PATH: &str = "/api/truck/restock/status";

/// Delivery-truck driver. Truck endpoints take no bearer token.
pub struct TruckClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    current: Option<RestockState>,
}

impl TruckClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let transport = Arc::new(NetworkTransport::new(&config)?);
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            current: None,
        }
    }

    /// Restock being tracked, if any
    pub fn current(&self) -> Option<&RestockState> {
        self.current.as_ref()
    }

    pub async fn register_truck(&self, truck: &TruckIdentity) -> ClientResult<()> {
        truck.validate()?;
        let request = ApiRequest::post(TRUCK_REGISTER_PATH).json(&truck.to_register_request())?;
        self.transport.send(request).await.ensure_success()?;
        tracing::info!(truck_id = %truck.truck_id, "Truck registered");
        Ok(())
    }

    /// Validate and submit a batch. Returns the restock order id.
    pub async fn submit(&mut self, batch: &RestockBatch) -> ClientResult<String> {
        if let Some(current) = self.current.as_ref().filter(|c| !c.status().is_terminal()) {
            return Err(ClientError::InvalidState(format!(
                "Restock {} is still {}",
                current.order_id(),
                current.status()
            )));
        }
        let body = batch.to_request()?;

        let request = ApiRequest::post(RESTOCK_PATH).json(&body)?;
        let submitted: RestockSubmitted = self.transport.send(request).await.json()?;
        if submitted.order_id.is_empty() {
            return Err(ClientError::InvalidResponse(
                "restock response carries no order id".into(),
            ));
        }

        tracing::info!(
            order_id = %submitted.order_id,
            supplier_id = %batch.supplier_id,
            lines = batch.manifest.len(),
            "Restock submitted"
        );
        self.current = Some(RestockState::submitted(submitted.order_id.clone()));
        Ok(submitted.order_id)
    }

    /// Ask the service once for the restock's status
    pub async fn poll_once(&mut self) -> ClientResult<RestockStatus> {
        let Some(order_id) = self.current.as_ref().map(|c| c.order_id().to_string()) else {
            return Err(ClientError::InvalidState("No restock submitted".into()));
        };

        let request = ApiRequest::get(RESTOCK_STATUS_PATH).query("order_id", &order_id);
        let record = self
            .transport
            .send(request)
            .await
            .json::<ApiResponse<RestockRecord>>()?
            .into_data();

        match (record, self.current.as_mut()) {
            (Some(record), Some(state)) => Ok(state.apply_poll(&record)),
            (None, Some(state)) => Ok(state.status()),
            (_, None) => Err(ClientError::InvalidState("No restock submitted".into())),
        }
    }

    /// Poll until Completed/Failed, the attempt cap, or `cancel`.
    ///
    /// Running out of attempts yields [`PollOutcome::TimedOut`], never a failure.
    pub async fn wait_for_completion(
        &mut self,
        cancel: &CancellationToken,
    ) -> ClientResult<PollOutcome<RestockOutcome>> {
        if let Some(outcome) = self.current.as_ref().and_then(RestockState::outcome) {
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
                    tracing::info!(attempt, %status, "Restock status");
                    if let Some(outcome) = self.current.as_ref().and_then(RestockState::outcome) {
                        return Ok(PollOutcome::Terminal(outcome));
                    }
                }
                Err(e @ ClientError::InvalidState(_)) => return Err(e),
                Err(e) => tracing::warn!(attempt, error = %e, "Restock status poll failed"),
            }

            if schedule.is_exhausted() {
                break;
            }
            if !schedule.wait(cancel).await {
                return Ok(PollOutcome::Cancelled { attempts: attempt });
            }
        }

        tracing::warn!(
            attempts = schedule.attempts(),
            "Restock still in progress after max poll attempts"
        );
        Ok(PollOutcome::TimedOut {
            attempts: schedule.attempts(),
        })
    }

    /// Stop tracking the current restock
    pub fn clear(&mut self) {
        self.current = None;
    }
}
