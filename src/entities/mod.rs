pub mod asset;
pub mod building;
pub mod contract;
pub mod floor;
pub mod location;
pub mod maintenance_order;
pub mod order_counter;
