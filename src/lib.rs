pub mod cache;
pub mod feed;
pub mod logging;
pub mod profile;
pub mod session;
pub mod store;
pub mod wallet;
pub mod web;
