//! DID methods that we know how to turn into public keys.
//!
//! Only [`key`] is built in. Other methods can be plugged into an
//! [`AnchorResolver`](crate::resolver::AnchorResolver).

pub mod key;
