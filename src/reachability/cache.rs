use super::TraverseParms;
use crate::host::{FactionId, MoverId};

use hashbrown::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
	/// uids of the two Rooms, smaller first
	rooms: (u64, u64),
	parms: TraverseParms,
}

impl CacheKey {
	fn new(a: u64, b: u64, parms: &TraverseParms) -> CacheKey {
		CacheKey {
			rooms: (a.min(b), a.max(b)),
			parms: *parms,
		}
	}
}

/// Remembers whether two Rooms are connected for a set of [`TraverseParms`].
///
/// Rooms are identified by uid, so entries of Rooms that were deleted simply never match
/// again. Any change to walkability clears the whole cache.
#[derive(Clone, Debug, Default)]
pub(crate) struct ReachabilityCache {
	entries: HashMap<CacheKey, bool>,
}

impl ReachabilityCache {
	pub fn get(&self, a: u64, b: u64, parms: &TraverseParms) -> Option<bool> {
		self.entries.get(&CacheKey::new(a, b, parms)).copied()
	}

	pub fn insert(&mut self, a: u64, b: u64, parms: &TraverseParms, reachable: bool) {
		self.entries.insert(CacheKey::new(a, b, parms), reachable);
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn clear(&mut self) {
		self.entries.clear();
	}

	/// Forgets every answer computed for `mover`
	pub fn clear_for_mover(&mut self, mover: MoverId) {
		self.entries.retain(|key, _| key.parms.mover != Some(mover));
	}

	/// Forgets every answer computed for movers of `faction`
	pub fn clear_for_faction(&mut self, faction: FactionId) {
		self.entries.retain(|key, _| key.parms.faction != Some(faction));
	}
}
