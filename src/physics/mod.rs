pub mod bonding;
pub mod operations;
