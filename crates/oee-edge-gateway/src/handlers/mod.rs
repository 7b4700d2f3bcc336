//! HTTP request handlers served by the gateway itself.

pub mod health;
pub mod logout;
