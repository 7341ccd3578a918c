//! Database entities for the storefront domain.
//!
//! Catalog side: products grouped into publications (optionally tied to a
//! preorder batch), sold as catalog items with price, stock counters and an
//! optional installment plan. Order side: orders owning order items,
//! invoices, payments and an optional delivery record.

pub mod catalog_item;
pub mod credit_part;
pub mod credit_plan;
pub mod delivery;
pub mod invoice;
pub mod order;
pub mod order_item;
pub mod payment;
pub mod preorder;
pub mod product;
pub mod publication;

pub use catalog_item::Entity as CatalogItem;
pub use credit_part::Entity as CreditPart;
pub use credit_plan::Entity as CreditPlan;
pub use delivery::Entity as Delivery;
pub use invoice::Entity as Invoice;
pub use order::Entity as Order;
pub use order_item::Entity as OrderItem;
pub use payment::Entity as Payment;
pub use preorder::Entity as Preorder;
pub use product::Entity as Product;
pub use publication::Entity as Publication;
