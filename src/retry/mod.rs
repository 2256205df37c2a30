// src/retry/mod.rs
mod strategy;

pub use strategy::{RetryError, RetryPolicy, RetryStrategy};
