pub mod health;
pub mod stock_analysis;
pub mod stocks;
