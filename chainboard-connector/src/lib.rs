//! A client-library-agnostic sync engine for on-chain message boards.
//!
//! This crate provides the two components a board client needs between its
//! UI and whichever blockchain binding it ships with: a connection manager
//! that tracks the wallet/account/capability binding, and a feed
//! synchronizer that renders the board's append-only log as a paginated
//! list kept eventually consistent through push notifications with a
//! polling fallback.
//!
//! # Key Components
//!
//! *   [`workers::SyncEngine`]: the main entry point. A single cooperative
//!     task owning both components, driven through its
//!     [`workers::SyncEngineHandle`].
//! *   [`rpc`]: the ports an external client-library adapter implements:
//!     wallet, reader, writer, pending transaction.
//! *   [`view::BoardView`]: the render port. Redaction of soft-deleted
//!     content and author-only affordance gating happen before this
//!     boundary.
/// Configuration structures and file/env loading.
pub mod config;
/// The connector error taxonomy.
pub mod error;
/// Typed payloads for the internal event bus.
pub mod events;
/// The feed synchronizer: pagination cursor, freshness marker, writes.
pub mod feed;
/// Ports onto the external chain stack.
pub mod rpc;
/// The connection manager: wallet/account/capability binding.
pub mod session;
/// Core data model: addresses, message records, rendered projections.
pub mod types;
/// The render port.
pub mod view;
/// The engine task and its background workers.
pub mod workers;
