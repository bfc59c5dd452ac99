pub mod catalog;
pub mod concierge;
pub mod currency;
pub mod dashboard;
pub mod direct;
pub mod polling;
pub mod session;
pub mod signup;
pub mod wizard;

pub use crate::domain::model::{Country, Currency, Order, OrderStatus, Quota, Service};
pub use crate::domain::ports::{AccountBackend, ConfigProvider, DirectBackend, OrderBackend, Storage};
pub use crate::utils::error::Result;
