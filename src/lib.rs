//! # moq-client: a client-side Media over QUIC transport engine.
//!
//! This crate multiplexes a publish/subscribe broadcast surface over an
//! established QUIC or WebTransport session: one bidirectional control stream
//! plus a fan of unidirectional object streams, one per group.
//!
//! Two wire variants are negotiated during setup and share the same engine:
//! - **lite** ([coding::Version::DRAFT_07]): varint length framing and a plain
//!   group-per-stream object format.
//! - **ietf** ([coding::Version::DRAFT_14], the default): `moq-transport-14`
//!   typed control messages with u16 length framing and subgroup object
//!   streams.
//!
//! ## API
//!
//! The API is built around producer/consumer pairs:
//! - [Broadcast]: a named collection of [Track]s, published under a [Path].
//! - [Track]: a sequence of [Group]s sharing a name and priority.
//! - [Group]: an ordered sequence of frames, carried on a single stream.
//!
//! To publish, create a [Broadcast] pair, hand the consumer half to
//! [Session::publish], and serve the tracks requested from the producer half.
//! To consume, call [Session::consume] and subscribe tracks on the returned
//! consumer; groups and frames arrive as the peer sends them.
//! [Session::announced] surfaces the peer's namespace announcements under a
//! prefix.

mod error;
mod model;
mod path;
mod session;
mod signal;

pub mod coding;
pub mod data;
pub mod message;
pub mod transport;

pub use error::*;
pub use model::*;
pub use path::*;
pub use session::*;
pub use signal::*;
