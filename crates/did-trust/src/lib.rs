//! A Decentralized Identifier (aka [DID][spec]), is a globally unique
//! identifier that provides a general purpose way of looking up public keys
//! associated with the globally unique identifier.
//!
//! This crate covers the self-certifying `did:key` method, where the public key
//! is embedded directly in the identifier, and builds a small trust layer on
//! top of it:
//!
//! - [`Anchor`]s pair a DID with the public key that verifies its signatures.
//! - [`Provider`]s pair a DID with something that can sign on its behalf,
//!   either an in-process [`PrivateKey`] or a hardware wallet (see [`ledger`]).
//! - A [`TrustContext`] caches anchors for a while, resolving unknown DIDs
//!   through an [`AnchorResolver`], and keeps a registry of providers.
//!
//! [spec]: https://www.w3.org/TR/did-core/

#![forbid(unsafe_code)]

pub mod anchor;
pub mod crypto;
pub mod did;
pub mod key_algos;
pub mod ledger;
pub mod methods;
pub mod resolver;
pub mod trust;
pub mod varint;

pub use crate::anchor::{Anchor, KeyProvider, Provider};
pub use crate::crypto::{PrivateKey, PublicKey, TypedPublicKey};
pub use crate::did::Did;
pub use crate::key_algos::KeyAlgo;
pub use crate::resolver::AnchorResolver;
pub use crate::trust::{TrustContext, TrustContextConfig};
