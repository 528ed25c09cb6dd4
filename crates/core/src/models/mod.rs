pub mod balance;
pub mod chart;
pub mod settings;
pub mod transaction;
pub mod unit;
