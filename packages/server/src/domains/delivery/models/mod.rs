pub mod delivery_history;

pub use delivery_history::{DeliveryHistory, DeliveryStage};
