pub mod api;
pub mod auth;
pub mod booking;
pub mod cache;
pub mod conflict;
pub mod session;

#[cfg(test)]
mod stub_server;
