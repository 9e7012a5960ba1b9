pub mod enrollment_store;
pub mod match_store;
pub mod sweep_observer;
pub mod unit_of_work;
