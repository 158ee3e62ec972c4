//! Hash maps and sets keyed by arena indices, Cell indices and link hashes.
//!
//! All of those keys are already well distributed integers, so hashing is a single multiply.

/// A [`HashMap`](hashbrown::HashMap) for integer ids with a faster Hasher
pub type IdMap<K, V> = hashbrown::HashMap<K, V, BuildIdHasher>;
/// A [`HashSet`](hashbrown::HashSet) for integer ids with a faster Hasher
pub type IdSet<K> = hashbrown::HashSet<K, BuildIdHasher>;

/// A [`BuildHasher`](std::hash::BuildHasher) specialized on integer ids
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildIdHasher;

/// A [`Hasher`](std::hash::Hasher) specialized on integer ids
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdHasher(u64);

impl std::hash::BuildHasher for BuildIdHasher {
	type Hasher = IdHasher;
	fn build_hasher(&self) -> IdHasher {
		IdHasher(0)
	}
}

impl std::hash::Hasher for IdHasher {
	/// panics, since only integer ids are supposed to be used
	fn write(&mut self, _: &[u8]) {
		unreachable!("This Hasher only works with integer ids")
	}
	fn write_u32(&mut self, id: u32) {
		self.0 = id as u64
	}
	fn write_u64(&mut self, id: u64) {
		self.0 = id
	}
	fn write_usize(&mut self, id: usize) {
		self.0 = id as u64
	}
	fn finish(&self) -> u64 {
		// spread sequential ids over the high bits, which hashbrown uses for its control bytes
		self.0.wrapping_mul(0x9E37_79B9_7F4A_7C15)
	}
}

/// create a new [`IdMap`]
pub fn id_map<K, V>() -> IdMap<K, V> {
	IdMap::with_hasher(BuildIdHasher)
}
/// create a new [`IdSet`]
pub fn id_set<K>() -> IdSet<K> {
	IdSet::with_hasher(BuildIdHasher)
}
/// create a new [`IdMap`] with the given capacity
pub fn id_map_with_cap<K, V>(capacity: usize) -> IdMap<K, V> {
	IdMap::with_capacity_and_hasher(capacity, BuildIdHasher)
}
