pub mod async_await;
pub mod base;
pub mod connection;
pub mod containers;
pub mod pointers;
pub mod scalars;
