//! Bidirectional event-bus bridge core.
//!
//! Exposes a server-side publish/subscribe bus to untrusted duplex-socket
//! clients behind a declarative permission list, async session
//! authorisation with TTL caching, and ephemeral reply-address
//! whitelisting for request/reply traffic.
//!
//! # Architecture
//!
//! A [`session::BridgeShared`] holds the bridge-wide state (the compiled
//! [`match_engine::MatchEngine`], the [`auth_cache::AuthCache`] and the
//! [`reply_registry::ReplyAddressRegistry`]) and mints one
//! [`session::BridgeSession`] per connected socket. Each session wires its
//! own [`dispatcher::FrameDispatcher`], which routes a parsed frame to
//! either the [`subscriptions::SubscriptionRegistry`] or the
//! [`outbound::IngressFilter`]; bus deliveries flow back through the
//! [`outbound::OutboundFilter`] before being written to the socket.
//!
//! The bus and the client transport are external collaborators, modelled
//! here as the [`transport::Bus`] and [`transport::ClientSocket`] traits so
//! this crate depends only on their contracts.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod auth_cache;
pub mod auth_coordinator;
pub mod dispatcher;
pub mod error;
pub mod frame;
pub mod hooks;
pub mod match_engine;
pub mod outbound;
pub mod reply_registry;
pub mod session;
pub mod subscriptions;
pub mod transport;

pub use auth_cache::{Auth, AuthCache};
pub use auth_coordinator::{AuthCoordinator, DEFAULT_AUTH_ADDRESS};
pub use dispatcher::FrameDispatcher;
pub use error::{BridgeError, BridgeResult};
pub use frame::{BridgeEnvelope, ClientFrame, Direction, PermissionRule, CLIENT_AUTH_ADDRESS};
pub use hooks::{BridgeHooks, NoopHooks};
pub use match_engine::{Match, MatchEngine};
pub use reply_registry::{ReplyAddressRegistry, DEFAULT_REPLY_TIMEOUT};
pub use session::{BridgeSession, BridgeShared};
pub use subscriptions::SubscriptionRegistry;
pub use transport::{Bus, BusMessage, BusReply, ClientSocket, SocketId, Subscription};
