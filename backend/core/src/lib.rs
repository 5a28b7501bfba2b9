//! Request-scoped types shared across the fingate crates.

pub mod types;

pub use types::{
    client_key_from_forwarded, ClientIdentity, OutboundRequest, UpstreamMethod, CLIENT_DEVICE,
    UNKNOWN_CLIENT,
};
