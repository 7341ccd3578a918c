//! In-process domain events.
//!
//! Services publish fire-and-forget events over an mpsc channel; a consumer
//! task logs them. Delivery is best-effort: losing an event never fails the
//! request that produced it.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::order::OrderStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    InventoryReserved {
        item_ids: Vec<Uuid>,
    },
    OrderCreated {
        order_id: Uuid,
        user_id: Uuid,
    },
    PaymentInitiated {
        invoice_id: Uuid,
        external_payment_id: i64,
    },
    InvoiceStatusChanged {
        invoice_id: Uuid,
        status: String,
    },
    OrderStatusChanged {
        order_id: Uuid,
        status: OrderStatus,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, logging (not failing) when the consumer is gone or
    /// the channel is full.
    pub async fn send(&self, event: Event) {
        if let Err(e) = self.sender.try_send(event) {
            warn!("failed to publish event: {}", e);
        }
    }
}

/// Creates a channel pair with a reasonable buffer.
pub fn channel() -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(1024);
    (EventSender::new(tx), rx)
}

/// Logs events until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    while let Some(event) = rx.recv().await {
        info!(?event, "domain event");
    }
}
