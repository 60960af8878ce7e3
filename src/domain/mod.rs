pub mod branch;
pub mod mapping;
pub mod ticket;
