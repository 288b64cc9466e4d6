//! Cookie based authentication for the single admin account.

pub mod cookie;
pub mod log_in;
pub mod log_out;
pub mod middleware;

pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{auth_guard, auth_guard_hx};
