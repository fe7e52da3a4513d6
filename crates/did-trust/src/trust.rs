//! The [`TrustContext`], a cache of anchors and a registry of providers.

use std::{
	collections::HashMap,
	sync::{Arc, Mutex, MutexGuard, Weak},
	time::{Duration, Instant},
};

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
	anchor::{Anchor, KeyProvider, Provider},
	crypto::PrivateKey,
	did::Did,
	resolver::{AnchorResolver, ResolveError},
};

/// How long an anchor stays cached after it was last looked up.
pub const ANCHOR_ENTRY_TTL: Duration = Duration::from_secs(60 * 60);

/// Configuration for a [`TrustContext`].
#[derive(Debug, Clone)]
pub struct TrustContextConfig {
	/// Resolves DIDs that aren't cached yet.
	pub resolver: AnchorResolver,
	pub anchor_ttl: Duration,
}

impl Default for TrustContextConfig {
	fn default() -> Self {
		Self {
			resolver: AnchorResolver::default(),
			anchor_ttl: ANCHOR_ENTRY_TTL,
		}
	}
}

impl TrustContextConfig {
	pub fn build(self) -> TrustContext {
		TrustContext {
			state: Arc::new(Mutex::new(State::default())),
			resolver: self.resolver,
			anchor_ttl: self.anchor_ttl,
		}
	}
}

#[derive(Debug)]
struct AnchorEntry {
	anchor: Anchor,
	expires_at: Instant,
}

#[derive(Debug, Default)]
struct State {
	anchors: HashMap<Did, AnchorEntry>,
	providers: HashMap<Did, Arc<dyn Provider>>,
	/// Cancels the running reclamation loop, if any.
	gc: Option<CancellationToken>,
}

impl State {
	/// Removes every anchor that expired strictly before `now`.
	fn sweep(&mut self, now: Instant) -> usize {
		let before = self.anchors.len();
		self.anchors.retain(|_, entry| entry.expires_at >= now);
		before - self.anchors.len()
	}

	fn stop_gc(&mut self) -> bool {
		let Some(cancel) = self.gc.take() else {
			return false;
		};
		cancel.cancel();
		true
	}
}

/// Caches [`Anchor`]s, evicting the ones that haven't been looked up for a
/// while, and holds the [`Provider`]s that can sign for us.
///
/// All methods take `&self`, share it between threads with an [`Arc`].
/// Expired anchors are only evicted while the reclamation loop started by
/// [`Self::start`] is running. Dropping the context stops the loop.
#[derive(Debug)]
pub struct TrustContext {
	state: Arc<Mutex<State>>,
	resolver: AnchorResolver,
	anchor_ttl: Duration,
}

impl TrustContext {
	/// An empty context that resolves `did:key`s.
	pub fn new() -> Self {
		TrustContextConfig::default().build()
	}

	/// An empty context with a single provider for `private_key`.
	pub fn with_private_key(private_key: PrivateKey) -> Self {
		Self::with_provider(Arc::new(KeyProvider::new(private_key)))
	}

	pub fn with_provider(provider: Arc<dyn Provider>) -> Self {
		let ctx = Self::new();
		ctx.add_provider(provider);
		ctx
	}

	/// The DIDs of all cached anchors, in no particular order.
	pub fn anchors(&self) -> Vec<Did> {
		self.lock().anchors.keys().cloned().collect()
	}

	/// The DIDs of all providers, in no particular order.
	pub fn providers(&self) -> Vec<Did> {
		self.lock().providers.keys().cloned().collect()
	}

	/// Looks up the anchor for `did`, resolving and caching it if it isn't
	/// cached. Either way, the entry's expiry is pushed back.
	pub fn get_anchor(&self, did: &Did) -> Result<Anchor, TrustContextError> {
		{
			let mut state = self.lock();
			if let Some(entry) = state.anchors.get_mut(did) {
				entry.expires_at = Instant::now() + self.anchor_ttl;
				return Ok(entry.anchor.clone());
			}
		}

		// The lock is released while resolving, so concurrent misses on the same
		// DID may each resolve it. The last insert wins.
		debug!(%did, "anchor not cached, resolving");
		let anchor = self.resolver.resolve(did).map_err(|source| {
			TrustContextError::AnchorResolutionFailed {
				did: did.clone(),
				source,
			}
		})?;
		if anchor.did() != did {
			debug!(%did, resolved = %anchor.did(), "resolver returned a different DID");
		}
		// cached under the anchor's own DID, same as `add_anchor`
		self.add_anchor(anchor.clone());
		Ok(anchor)
	}

	pub fn get_provider(
		&self,
		did: &Did,
	) -> Result<Arc<dyn Provider>, TrustContextError> {
		self.lock()
			.providers
			.get(did)
			.cloned()
			.ok_or_else(|| TrustContextError::NoProvider(did.clone()))
	}

	/// Caches `anchor`, replacing any previous anchor for the same DID.
	pub fn add_anchor(&self, anchor: Anchor) {
		let entry = AnchorEntry {
			expires_at: Instant::now() + self.anchor_ttl,
			anchor,
		};
		self.lock().anchors.insert(entry.anchor.did().clone(), entry);
	}

	/// Registers `provider`, replacing any previous provider for the same DID.
	/// Providers never expire.
	pub fn add_provider(&self, provider: Arc<dyn Provider>) {
		self.lock().providers.insert(provider.did().clone(), provider);
	}

	/// Starts the reclamation loop, sweeping expired anchors every
	/// `gc_interval`. A loop that is already running is stopped first.
	///
	/// Must be called from within a tokio runtime.
	pub fn start(&self, gc_interval: Duration) -> Result<(), StartError> {
		if gc_interval.is_zero() {
			return Err(StartError::ZeroInterval);
		}
		let runtime = Handle::try_current()?;

		let mut state = self.lock();
		if state.stop_gc() {
			debug!("replacing running reclamation loop");
		}
		let cancel = CancellationToken::new();
		runtime.spawn(gc_loop(
			Arc::downgrade(&self.state),
			gc_interval,
			cancel.clone(),
		));
		state.gc = Some(cancel);
		info!(?gc_interval, "started anchor reclamation loop");
		Ok(())
	}

	/// Signals the reclamation loop to exit, without waiting for it. Does
	/// nothing if it isn't running.
	pub fn stop(&self) {
		if self.lock().stop_gc() {
			info!("stopped anchor reclamation loop");
		}
	}

	pub fn is_running(&self) -> bool {
		self.lock().gc.is_some()
	}

	fn lock(&self) -> MutexGuard<'_, State> {
		self.state.lock().expect("trust context lock poisoned")
	}
}

impl Default for TrustContext {
	fn default() -> Self {
		Self::new()
	}
}

impl Drop for TrustContext {
	fn drop(&mut self) {
		if let Ok(mut state) = self.state.lock() {
			state.stop_gc();
		}
	}
}

async fn gc_loop(
	state: Weak<Mutex<State>>,
	gc_interval: Duration,
	cancel: CancellationToken,
) {
	let mut interval = tokio::time::interval(gc_interval);
	// first tick completes immediately
	interval.tick().await;
	loop {
		tokio::select! {
			_ = cancel.cancelled() => return,
			_ = interval.tick() => (),
		}
		// the context was dropped
		let Some(state) = state.upgrade() else {
			return;
		};
		let mut guard = state.lock().expect("trust context lock poisoned");
		let removed = guard.sweep(Instant::now());
		if removed > 0 {
			debug!(removed, remaining = guard.anchors.len(), "swept expired anchors");
		}
	}
}

#[derive(thiserror::Error, Debug)]
pub enum TrustContextError {
	#[error("no provider for {0}")]
	NoProvider(Did),
	#[error("failed to resolve anchor for {did}")]
	AnchorResolutionFailed {
		did: Did,
		#[source]
		source: ResolveError,
	},
}

#[derive(thiserror::Error, Debug)]
pub enum StartError {
	#[error("the reclamation loop must be started from within a tokio runtime")]
	NoRuntime(#[from] tokio::runtime::TryCurrentError),
	#[error("the reclamation interval must not be zero")]
	ZeroInterval,
}
