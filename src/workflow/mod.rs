pub mod clean;
pub mod create;
pub mod rate_gate;
pub mod reconcile;
pub mod stage;

#[cfg(test)]
mod fakes;
