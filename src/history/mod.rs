//! Lookup history: persisted readings and the operations over them

pub mod service;
pub mod store;

pub use service::HistoryService;
pub use store::HistoryStore;
