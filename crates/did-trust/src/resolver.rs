//! Turns DIDs into [`Anchor`]s, dispatching on the DID method.

use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
	anchor::Anchor,
	did::{Did, PublicKeyFromDidError},
	methods::key,
};

/// Resolves DIDs of a single method.
pub type ResolveFn = Arc<dyn Fn(&Did) -> Result<Anchor, ResolveError> + Send + Sync>;

/// A table from DID method to the function that resolves it.
///
/// The default resolver only knows about `did:key`. More methods can be added
/// with [`Self::register`].
#[derive(Clone)]
pub struct AnchorResolver {
	methods: HashMap<String, ResolveFn>,
}

impl AnchorResolver {
	/// A resolver with no methods at all.
	pub fn empty() -> Self {
		Self {
			methods: HashMap::new(),
		}
	}

	/// Registers `f` for `method`, replacing any previous registration.
	pub fn register(
		&mut self,
		method: impl Into<String>,
		f: impl Fn(&Did) -> Result<Anchor, ResolveError> + Send + Sync + 'static,
	) -> &mut Self {
		self.methods.insert(method.into(), Arc::new(f));
		self
	}

	pub fn with_method(
		mut self,
		method: impl Into<String>,
		f: impl Fn(&Did) -> Result<Anchor, ResolveError> + Send + Sync + 'static,
	) -> Self {
		self.register(method, f);
		self
	}

	pub fn methods(&self) -> impl Iterator<Item = &str> {
		self.methods.keys().map(String::as_str)
	}

	pub fn resolve(&self, did: &Did) -> Result<Anchor, ResolveError> {
		let Some(f) = self.methods.get(did.method()) else {
			return Err(ResolveError::NoAnchorMethod(did.method().to_owned()));
		};
		f(did)
	}
}

impl Default for AnchorResolver {
	fn default() -> Self {
		Self::empty().with_method(key::METHOD, resolve_key_anchor)
	}
}

impl fmt::Debug for AnchorResolver {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AnchorResolver")
			.field("methods", &self.methods.keys().collect::<Vec<_>>())
			.finish()
	}
}

/// Resolves a `did:key` by decoding the key embedded in it.
pub fn resolve_key_anchor(did: &Did) -> Result<Anchor, ResolveError> {
	let public_key = did.public_key()?;
	Ok(Anchor::new(did.clone(), public_key))
}

#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
	#[error("no anchor method registered for DID method {0:?}")]
	NoAnchorMethod(String),
	#[error("failed to decode did:key")]
	Key(#[from] PublicKeyFromDidError),
	#[error(transparent)]
	Other(Box<dyn std::error::Error + Send + Sync>),
}
