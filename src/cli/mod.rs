pub mod history;
pub mod holdings;
pub mod price;
pub mod trade;
pub mod ui;
