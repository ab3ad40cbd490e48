//! The streaming core of an OpenPGP implementation.
//!
//! [`packet::parse`] drives an event-driven packet parser over a pull-style
//! byte source: packet headers, public keys, user ids, signatures and their
//! subpackets are decoded within nested length-bounded regions and handed to
//! a caller-supplied sink. The [`sig`] module is the signature engine on
//! top: it reconstructs the exact signed-data digest for certification and
//! subkey binding signatures and verifies or produces RSA/DSA material over
//! it.
//!
//! ```
//! use pgp_core::packet::{parse, Event, ParseOptions, SliceSource};
//!
//! let input = b"\xcd\x05Alice";
//! let mut events = Vec::new();
//! parse(SliceSource::new(input), ParseOptions::default(), &mut |event: Event| {
//!     events.push(event)
//! })?;
//!
//! match &events[1] {
//!     Event::UserId(id) => assert_eq!(id.as_str_lossy(), "Alice"),
//!     other => panic!("unexpected event: {:?}", other),
//! }
//! # Ok::<(), pgp_core::Error>(())
//! ```

#[macro_use]
pub mod errors;

pub mod crypto;
pub mod packet;
pub mod sig;
pub mod types;
pub mod util;

pub use crate::errors::{Error, Result};
