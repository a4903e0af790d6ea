//! Integration tests for Green Basket.
//!
//! These tests exercise the storefront engine end to end, in process: the
//! catalog feeds search, search results go into a cart, and the cart is
//! carried through checkout against an in-memory order gateway. No server
//! or database is involved.
//!
//! # Test Categories
//!
//! - `shopping_flow` - Customer journey from browsing to a placed order
//! - `store_management` - Store owner catalog management and dashboard

pub mod fixtures;
