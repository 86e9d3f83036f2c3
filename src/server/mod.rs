/// Liveness endpoint module - Gateway

mod health;

pub use health::{router, serve};
