//! Green Basket Storefront engine.
//!
//! The in-process core of the grocery-delivery storefront: the catalog of
//! stores and products, the search and filter rules over it, the per-session
//! cart, the customer profile with its single-default invariants, and the
//! checkout flow that turns a cart plus a chosen address and payment method
//! into an order.
//!
//! Screens, sessions, and the order service itself are external
//! collaborators; everything here is synchronous in-memory state except the
//! one awaited call to the [`checkout::OrderGateway`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod profile;
