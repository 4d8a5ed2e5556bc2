//! # Sample Custom Resource
//!
//! This crate shows the canonical wiring of the `cfn-resource` framework:
//! a resource implementation ([`widget`]), and a cache-backed logs client
//! demonstrating the [`ClientCache`](cfn_resource::ClientCache) plus
//! log-cleanup integration ([`logs`]).

pub mod logs;
pub mod widget;
