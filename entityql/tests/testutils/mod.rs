//! Test utilities for EntityQL integration tests
//!
//! - OrderFixture: order-management model with in-memory rows, translating
//!   and executing requests through the public API only

pub mod order_fixture;
