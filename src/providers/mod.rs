pub mod algod;
pub mod coinmarketcap;
pub mod indexer;
