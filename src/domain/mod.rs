//! Domain layer: reference data, pure conversion rules and the transfer flow.
//!
//! Nothing in here touches a clock or a task runtime. Async collaborators are
//! described by the traits in [`ports`] and driven from the application layer.

pub mod amount;
pub mod bank;
pub mod conversion;
pub mod flow;
pub mod history;
pub mod ports;
pub mod reference;
pub mod transfer;
