pub mod classifier;
pub mod constraints;
pub mod openai_service;
pub mod overlap;
pub mod ranker;
pub mod suggestion_gateway;
pub mod timezone;
