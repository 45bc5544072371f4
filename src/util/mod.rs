//! Utility modules: http, retry, timeout.

pub mod http;
pub mod retry;
pub mod timeout;
