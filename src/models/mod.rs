pub mod participant;
pub mod schedule;
