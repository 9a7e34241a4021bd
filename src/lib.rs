//! wg-quick - bring WireGuard interfaces up and down on Android
//!
//! Like the shell script it descends from, this crate does its work by
//! calling out to external tools: `ip(8)` and `wg(8)` for links, addresses
//! and routes, and `ndc` to put the interface into its own netd policy
//! network.
//!
//! # Features
//!
//! - Config file parsing that lifts `Address`, `DNS` and `MTU` out of the
//!   `[Interface]` section and passes everything else to `wg setconf`
//! - MTU estimation from the default route and the routes to peer endpoints
//! - Ordered bring-up with rollback of a half-configured interface
//! - Teardown that rediscovers the policy network from the rule table
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use wgquick::config::parse_config;
//!
//! let config = parse_config("wg0", Path::new("/data/misc/wireguard")).unwrap();
//! println!("{} has {} address(es)", config.name, config.addresses.len());
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod network;
pub mod platform;
pub mod tunnel;

pub use error::{Result, WgError};
