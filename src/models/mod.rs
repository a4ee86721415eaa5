//! Data models for scraped products and orders.

mod order;
mod product;
mod work_item;

pub use order::{BuyerInfo, OrderFinancials, OrderItem, OrderRecord, ShippingAddress, TrackingInfo};
pub use product::{ProductRecord, Site, MAX_IMAGES};
pub use work_item::WorkItem;
