pub mod audit;
pub mod messaging;
