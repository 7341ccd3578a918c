//! Order lifecycle: creation with invoice planning and payment initiation,
//! webhook-driven settlement, and the customer-facing order view.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthenticatedUser;
use crate::db::DbPool;
use crate::entities::delivery::DeliveryService;
use crate::entities::invoice::{InvoiceStatus, InvoiceType};
use crate::entities::order::OrderStatus;
use crate::entities::{
    catalog_item, credit_part, delivery, invoice, order, order_item, payment, product, CatalogItem,
    CreditPart, Delivery, Invoice, Order, OrderItem, Payment, Preorder, Product,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::gateway::{InitPaymentRequest, PaymentGatewayClient, PaymentStatusNotification, Receipt, ReceiptItem};
use crate::services::catalog::AvailableCheckoutItem;
use crate::services::invoicing::{plan_invoices, InvoiceDraft};

const STATUS_AUTHORIZED: &str = "AUTHORIZED";
const STATUS_CONFIRMED: &str = "CONFIRMED";

/// Delivery details supplied at order creation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct DeliveryRequest {
    pub service: DeliveryService,
    #[validate(length(min = 1, message = "address must not be empty"))]
    pub address: String,
    pub address_identifier: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateOrderResponse {
    pub order_id: Uuid,
    /// Gateway page where the customer completes the initial payment.
    pub payment_url: String,
}

/// Invoice as shown to the customer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvoiceView {
    pub id: Uuid,
    pub title: String,
    pub invoice_type: InvoiceType,
    pub amount: i64,
    pub status: InvoiceStatus,
    /// Payment page for the latest attempt, present while settlement is open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_url: Option<String>,
}

/// One installment of a credit purchase, joined with its schedule deadline.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InstallmentView {
    pub invoice_id: Uuid,
    pub part_index: i32,
    pub amount: i64,
    pub status: InvoiceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemView {
    pub id: Uuid,
    pub item_id: Uuid,
    pub title: String,
    pub quantity: i64,
    /// Unit price at order time, minor currency units.
    pub price: i64,
    pub by_credit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installments: Option<Vec<InstallmentView>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeliveryView {
    pub service: DeliveryService,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PreorderView {
    pub id: Uuid,
    pub title: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_arrival: Option<String>,
}

/// Full customer-facing order aggregate.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderView {
    pub id: Uuid,
    pub status: OrderStatus,
    pub created_at: chrono::DateTime<Utc>,
    pub items: Vec<OrderItemView>,
    /// Order-level invoices (initial, shipping); installments live on items.
    pub invoices: Vec<InvoiceView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preorder: Option<PreorderView>,
}

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
    gateway: Arc<PaymentGatewayClient>,
    event_sender: Arc<EventSender>,
    order_expiry_hours: i64,
}

impl OrderService {
    pub fn new(
        db: Arc<DbPool>,
        gateway: Arc<PaymentGatewayClient>,
        event_sender: Arc<EventSender>,
        order_expiry_hours: i64,
    ) -> Self {
        Self {
            db,
            gateway,
            event_sender,
            order_expiry_hours,
        }
    }

    /// Creates an order from verified (and already reserved) checkout lines,
    /// then initiates the gateway payment for the initial invoice.
    ///
    /// The order and its invoices commit before the gateway call, so a
    /// gateway failure leaves a persisted unpaid order behind; the customer
    /// retries payment rather than checkout.
    #[instrument(skip_all, fields(user_id = %user.id, lines = checkout_items.len()))]
    pub async fn create_order(
        &self,
        user: &AuthenticatedUser,
        checkout_items: Vec<AvailableCheckoutItem>,
        credit_item_ids: Vec<Uuid>,
        delivery_request: Option<DeliveryRequest>,
    ) -> Result<CreateOrderResponse, ServiceError> {
        if checkout_items.is_empty() {
            return Err(ServiceError::CheckoutDataEmpty);
        }
        let preorder_id = checkout_items[0].preorder_id;
        // Preorder batches ship together later; everything else needs a
        // delivery destination up front.
        if preorder_id.is_none() && delivery_request.is_none() {
            return Err(ServiceError::InvalidCheckoutData(
                "delivery data is required for in-stock orders".to_string(),
            ));
        }
        if let Some(request) = &delivery_request {
            request.validate()?;
        }

        let plan = plan_invoices(&checkout_items, &credit_item_ids);
        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let initial_invoice_id = Uuid::new_v4();

        let txn = self.db.begin().await?;

        let delivery_id = match delivery_request {
            Some(request) => {
                let id = Uuid::new_v4();
                delivery::ActiveModel {
                    id: Set(id),
                    service: Set(request.service),
                    address: Set(request.address),
                    address_identifier: Set(request.address_identifier),
                    recipient_name: Set(request.recipient_name),
                    recipient_phone: Set(request.recipient_phone),
                    track_code: Set(None),
                    created_at: Set(now),
                    updated_at: Set(None),
                }
                .insert(&txn)
                .await?;
                Some(id)
            }
            None => None,
        };

        order::ActiveModel {
            id: Set(order_id),
            user_id: Set(user.id),
            preorder_id: Set(preorder_id),
            delivery_id: Set(delivery_id),
            status: Set(OrderStatus::Unpaid),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await?;

        for item in &checkout_items {
            let order_item_id = Uuid::new_v4();
            order_item::ActiveModel {
                id: Set(order_item_id),
                order_id: Set(order_id),
                item_id: Set(item.id),
                quantity: Set(item.quantity),
                price: Set(item.price),
                by_credit: Set(credit_item_ids.contains(&item.id)),
                created_at: Set(now),
                updated_at: Set(None),
            }
            .insert(&txn)
            .await?;

            if let Some(drafts) = plan.credit.get(&item.id) {
                for draft in drafts {
                    insert_invoice(&txn, order_id, Some(order_item_id), draft, now).await?;
                }
            }
        }

        invoice::ActiveModel {
            id: Set(initial_invoice_id),
            order_id: Set(order_id),
            order_item_id: Set(None),
            title: Set(plan.initial.title.clone()),
            invoice_type: Set(plan.initial.invoice_type),
            credit_part_index: Set(None),
            amount: Set(plan.initial.amount),
            status: Set(plan.initial.status),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(%order_id, total = plan.total(), "order created");
        self.event_sender
            .send(Event::OrderCreated {
                order_id,
                user_id: user.id,
            })
            .await;

        let payment_url = self
            .initiate_initial_payment(user, order_id, initial_invoice_id, plan.initial.amount, &checkout_items)
            .await?;

        Ok(CreateOrderResponse {
            order_id,
            payment_url,
        })
    }

    async fn initiate_initial_payment(
        &self,
        user: &AuthenticatedUser,
        order_id: Uuid,
        invoice_id: Uuid,
        amount: i64,
        checkout_items: &[AvailableCheckoutItem],
    ) -> Result<String, ServiceError> {
        let email = user.email.clone().unwrap_or_default();
        let phone = user.phone.clone().unwrap_or_default();

        let receipt_items = checkout_items
            .iter()
            .map(|item| ReceiptItem::new(item.title.clone(), item.price, item.quantity))
            .collect();

        let mut data = HashMap::new();
        if !email.is_empty() {
            data.insert("Email".to_string(), email.clone());
        }
        if !phone.is_empty() {
            data.insert("Phone".to_string(), phone.clone());
        }

        let request = InitPaymentRequest::new(
            amount,
            invoice_id,
            format!("Order #{order_id}"),
            Utc::now() + Duration::hours(self.order_expiry_hours),
            data,
            Receipt::new(email, phone, receipt_items),
        );

        let response = self.gateway.init_payment(request).await?;

        payment::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_id: Set(invoice_id),
            external_id: Set(response.payment_id),
            url: Set(response.payment_url.clone()),
            status: Set(response.status),
            due_at: Set(Some(Utc::now() + Duration::hours(self.order_expiry_hours))),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(self.db.as_ref())
        .await?;

        self.event_sender
            .send(Event::PaymentInitiated {
                invoice_id,
                external_payment_id: response.payment_id,
            })
            .await;

        Ok(response.payment_url)
    }

    /// Applies a verified payment-status notification.
    ///
    /// The raw gateway status is always recorded on the matching payment
    /// attempt. Invoice state only moves on the statuses we map (AUTHORIZED,
    /// CONFIRMED) and never out of a terminal state, so redelivered
    /// notifications are harmless.
    #[instrument(skip(self, notification), fields(invoice_id = %notification.invoice_id, status = %notification.status))]
    pub async fn apply_payment_notification(
        &self,
        notification: &PaymentStatusNotification,
    ) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let invoice_row = Invoice::find_by_id(notification.invoice_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("invoice {} not found", notification.invoice_id))
            })?;

        let attempt = Payment::find()
            .filter(payment::Column::InvoiceId.eq(invoice_row.id))
            .filter(payment::Column::ExternalId.eq(notification.payment_id))
            .one(&txn)
            .await?;
        let Some(attempt) = attempt else {
            warn!(
                external_id = notification.payment_id,
                "notification does not match any payment attempt, ignoring"
            );
            return Ok(());
        };

        let mut attempt: payment::ActiveModel = attempt.into();
        attempt.status = Set(notification.status.clone());
        attempt.updated_at = Set(Some(Utc::now()));
        attempt.update(&txn).await?;

        let mapped = match notification.status.as_str() {
            STATUS_AUTHORIZED => Some(InvoiceStatus::Waiting),
            STATUS_CONFIRMED => Some(InvoiceStatus::Paid),
            _ => None,
        };

        if let Some(next) = mapped {
            if !invoice_row.status.is_terminal() && invoice_row.status != next {
                let invoice_type = invoice_row.invoice_type;
                let order_id = invoice_row.order_id;
                let invoice_id = invoice_row.id;

                let mut active: invoice::ActiveModel = invoice_row.into();
                active.status = Set(next);
                active.updated_at = Set(Some(Utc::now()));
                active.update(&txn).await?;

                self.event_sender
                    .send(Event::InvoiceStatusChanged {
                        invoice_id,
                        status: notification.status.clone(),
                    })
                    .await;

                if invoice_type == InvoiceType::Initial && next == InvoiceStatus::Paid {
                    self.accept_order(&txn, order_id).await?;
                }
            }
        }

        txn.commit().await?;
        Ok(())
    }

    /// Moves a freshly paid order from `Unpaid` to `Accepted`. Later statuses
    /// are operator-driven and never regressed from here.
    async fn accept_order(
        &self,
        txn: &sea_orm::DatabaseTransaction,
        order_id: Uuid,
    ) -> Result<(), ServiceError> {
        let order_row = Order::find_by_id(order_id)
            .one(txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {order_id} not found")))?;
        if order_row.status != OrderStatus::Unpaid {
            return Ok(());
        }

        let mut active: order::ActiveModel = order_row.into();
        active.status = Set(OrderStatus::Accepted);
        active.updated_at = Set(Some(Utc::now()));
        active.update(txn).await?;

        info!(%order_id, "order accepted");
        self.event_sender
            .send(Event::OrderStatusChanged {
                order_id,
                status: OrderStatus::Accepted,
            })
            .await;
        Ok(())
    }

    /// Loads the full order aggregate for its owner.
    #[instrument(skip(self))]
    pub async fn get_user_order(
        &self,
        order_id: Uuid,
        user_id: Uuid,
    ) -> Result<OrderView, ServiceError> {
        let order_row = Order::find_by_id(order_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {order_id} not found")))?;
        if order_row.user_id != user_id {
            return Err(ServiceError::Forbidden(
                "order belongs to another user".to_string(),
            ));
        }

        let items = order_row
            .find_related(OrderItem)
            .order_by_asc(order_item::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;
        let invoices = order_row
            .find_related(Invoice)
            .order_by_asc(invoice::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        let invoice_ids: Vec<Uuid> = invoices.iter().map(|i| i.id).collect();
        let mut latest_payment_urls: HashMap<Uuid, String> = HashMap::new();
        for row in Payment::find()
            .filter(payment::Column::InvoiceId.is_in(invoice_ids))
            .order_by_asc(payment::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?
        {
            latest_payment_urls.insert(row.invoice_id, row.url);
        }

        let titles = self.item_titles(&items).await?;
        let deadlines = self.installment_deadlines(&items).await?;

        let item_views = items
            .iter()
            .map(|item| {
                let installments = if item.by_credit {
                    let mut views: Vec<InstallmentView> = invoices
                        .iter()
                        .filter(|inv| inv.order_item_id == Some(item.id))
                        .filter_map(|inv| {
                            inv.credit_part_index.map(|index| InstallmentView {
                                invoice_id: inv.id,
                                part_index: index,
                                amount: inv.amount,
                                status: inv.status,
                                deadline: deadlines
                                    .get(&(item.item_id, index))
                                    .copied(),
                            })
                        })
                        .collect();
                    views.sort_by_key(|view| view.part_index);
                    Some(views)
                } else {
                    None
                };
                OrderItemView {
                    id: item.id,
                    item_id: item.item_id,
                    title: titles.get(&item.item_id).cloned().unwrap_or_default(),
                    quantity: item.quantity,
                    price: item.price,
                    by_credit: item.by_credit,
                    installments,
                }
            })
            .collect();

        let invoice_views = invoices
            .iter()
            .filter(|inv| inv.invoice_type != InvoiceType::Credit)
            .map(|inv| InvoiceView {
                id: inv.id,
                title: inv.title.clone(),
                invoice_type: inv.invoice_type,
                amount: inv.amount,
                status: inv.status,
                payment_url: if inv.status.is_terminal() {
                    None
                } else {
                    latest_payment_urls.get(&inv.id).cloned()
                },
            })
            .collect();

        let delivery_view = match order_row.delivery_id {
            Some(id) => Delivery::find_by_id(id)
                .one(self.db.as_ref())
                .await?
                .map(|d| DeliveryView {
                    service: d.service,
                    address: d.address,
                    address_identifier: d.address_identifier,
                    tracking_link: d
                        .track_code
                        .as_deref()
                        .and_then(|code| d.service.tracking_link(code)),
                    track_code: d.track_code,
                }),
            None => None,
        };

        let preorder_view = match order_row.preorder_id {
            Some(id) => Preorder::find_by_id(id)
                .one(self.db.as_ref())
                .await?
                .map(|p| PreorderView {
                    id: p.id,
                    title: p.title,
                    status: p.status,
                    expected_arrival: p.expected_arrival,
                }),
            None => None,
        };

        Ok(OrderView {
            id: order_row.id,
            status: order_row.status,
            created_at: order_row.created_at,
            items: item_views,
            invoices: invoice_views,
            delivery: delivery_view,
            preorder: preorder_view,
        })
    }

    async fn item_titles(
        &self,
        items: &[order_item::Model],
    ) -> Result<HashMap<Uuid, String>, ServiceError> {
        let item_ids: Vec<Uuid> = items.iter().map(|i| i.item_id).collect();
        let catalog_rows = CatalogItem::find()
            .filter(catalog_item::Column::Id.is_in(item_ids))
            .all(self.db.as_ref())
            .await?;

        let product_ids: Vec<Uuid> = catalog_rows.iter().map(|r| r.product_id).collect();
        let products: HashMap<Uuid, String> = Product::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(|p| (p.id, p.title))
            .collect();

        Ok(catalog_rows
            .into_iter()
            .filter_map(|row| {
                products
                    .get(&row.product_id)
                    .map(|title| (row.id, title.clone()))
            })
            .collect())
    }

    /// Deadlines for installment invoices, keyed by catalog item id and part
    /// index, resolved through the item's credit plan.
    async fn installment_deadlines(
        &self,
        items: &[order_item::Model],
    ) -> Result<HashMap<(Uuid, i32), NaiveDate>, ServiceError> {
        let credit_item_ids: Vec<Uuid> = items
            .iter()
            .filter(|i| i.by_credit)
            .map(|i| i.item_id)
            .collect();
        if credit_item_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let catalog_rows = CatalogItem::find()
            .filter(catalog_item::Column::Id.is_in(credit_item_ids))
            .all(self.db.as_ref())
            .await?;
        let plan_ids: Vec<Uuid> = catalog_rows.iter().filter_map(|r| r.credit_plan_id).collect();
        if plan_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let parts = CreditPart::find()
            .filter(credit_part::Column::CreditPlanId.is_in(plan_ids))
            .all(self.db.as_ref())
            .await?;
        let mut by_plan: HashMap<Uuid, Vec<&credit_part::Model>> = HashMap::new();
        for part in &parts {
            by_plan.entry(part.credit_plan_id).or_default().push(part);
        }

        let mut deadlines = HashMap::new();
        for row in &catalog_rows {
            if let Some(plan_parts) = row.credit_plan_id.and_then(|id| by_plan.get(&id)) {
                for part in plan_parts {
                    deadlines.insert((row.id, part.part_index), part.deadline);
                }
            }
        }
        Ok(deadlines)
    }
}

async fn insert_invoice(
    txn: &sea_orm::DatabaseTransaction,
    order_id: Uuid,
    order_item_id: Option<Uuid>,
    draft: &InvoiceDraft,
    now: chrono::DateTime<Utc>,
) -> Result<(), ServiceError> {
    invoice::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        order_item_id: Set(order_item_id),
        title: Set(draft.title.clone()),
        invoice_type: Set(draft.invoice_type),
        credit_part_index: Set(draft.credit_part_index),
        amount: Set(draft.amount),
        status: Set(draft.status),
        created_at: Set(now),
        updated_at: Set(None),
    }
    .insert(txn)
    .await?;
    Ok(())
}
