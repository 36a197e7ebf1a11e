//! Domain layer: marketplace entities, value objects, the job state
//! machine, the fee calculator and the persistence ports.

pub mod completion;
pub mod conversation;
pub mod fees;
pub mod ids;
pub mod job;
pub mod lifecycle;
pub mod money;
pub mod payment;
pub mod ports;
pub mod user;
