//! Query text construction for the asynchronous engine.

pub mod query_builder;

pub use query_builder::QueryBuilder;
