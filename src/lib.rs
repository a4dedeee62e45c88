//! MCP registry: a catalog of remote tool-providing servers.
//!
//! Authenticated owners publish, update and delete server descriptors;
//! anyone may search and browse the catalog. Every mutation is recorded
//! in an append-only audit trail.
//!
//! # Architecture
//!
//! The registry follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, tokens)
//!
//! # Modules
//!
//! - [`registry`]: Catalog domain, ports, adapters and services
//! - [`http`]: Axum routes over the catalog service
//! - [`config`]: Environment-driven configuration
//! - [`telemetry`]: Tracing subscriber set-up

pub mod config;
pub mod http;
pub mod registry;
pub mod telemetry;
