pub mod assignment;
pub mod assignment_selector;
pub mod auth;
pub mod client;
pub mod creds;
pub mod services;
pub mod session;
pub mod submission;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub mod util;
