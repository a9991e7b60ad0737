pub mod employee;
pub mod production_order;
pub mod stage;
pub mod task;
