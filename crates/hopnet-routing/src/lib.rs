//! # Hopnet Routing
//!
//! Reactive source routing for hopnet.
//!
//! A node that needs a route floods a route request. Every node that relays
//! it appends itself to the request's path, so when the request reaches its
//! destination the path is the full hop sequence. The destination answers
//! with a route reply that walks the path backwards; every node on the way
//! caches the part of the path that lies ahead of it.
//!
//! ## Core Components
//!
//! - [`RouteDiscoveryProtocol`]: Per-node request/reply/data state machine
//! - [`RoutingTable`]: Cached source routes, keyed by destination
//! - [`DsrMessage`]: The closed set of messages the protocol exchanges
//!
//! ## Missing routes
//!
//! Data for a destination with no cached route triggers a fresh discovery
//! and is then dropped. Data sent before a route exists is lost; traffic
//! sources are expected to keep sending at a steady cadence.
//!
//! ## Example
//!
//! ```rust,ignore
//! use hopnet_routing::{RouteDiscoveryProtocol, RouteDiscoveryConfig};
//!
//! let mut node = RouteDiscoveryProtocol::new(id, RouteDiscoveryConfig::default());
//! let disposition = node.handle(&arrival, message, &mut network)?;
//! ```

pub mod message;
pub mod router;
pub mod table;

// Re-export main types
pub use message::{DATA_KIND, DsrMessage, ROUTE_REPLY_KIND, ROUTE_REQUEST_KIND};
pub use router::{RouteDiscoveryConfig, RouteDiscoveryProtocol};
pub use table::RoutingTable;
