//! Domain services sitting between the REST layer and the database.

pub mod categories;
pub mod data_exchange;
pub mod reports;
pub mod transactions;

pub use categories::CategoryService;
pub use data_exchange::DataExchangeService;
pub use reports::ReportService;
pub use transactions::TransactionService;
