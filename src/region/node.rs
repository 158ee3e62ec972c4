use super::RegionType;
use crate::{Cell, CellRect};

/// Cost of one cardinal step between two link centers
pub(crate) const LINK_WEIGHT_CARDINAL: u32 = 10;
/// Cost of one diagonal step between two link centers
pub(crate) const LINK_WEIGHT_DIAGONAL: u32 = 14;

/// A flood-filled cluster of Cells with the same [`RegionType`].
///
/// Regions are stored in the arena of their graph and referenced by index. The `uid` tells a
/// Region apart from a later one that reuses its arena slot.
#[derive(Clone, Debug)]
pub(crate) struct Region {
	pub uid: u64,
	pub region_type: RegionType,
	pub valid: bool,
	/// tight bounds of all member Cells
	pub rect: CellRect,
	/// tile-aligned box the flood fill may not leave
	pub limit: CellRect,
	pub links: Vec<usize>,
	pub room: Option<usize>,
	pub cell_count: usize,
	pub touches_map_edge: bool,
	/// search stamp of the last reachability search that visited this Region
	pub reached: u32,
	/// number of Region Grid slots pointing at this Region
	pub slots: u32,
	/// `link_weights[i * links.len() + j]` is the cost of walking from `links[i]` to `links[j]`
	pub link_weights: Vec<u32>,
}

impl Region {
	pub fn new(uid: u64, region_type: RegionType, seed: Cell, limit: CellRect) -> Region {
		Region {
			uid,
			region_type,
			valid: false,
			rect: CellRect::single(seed),
			limit,
			links: vec![],
			room: None,
			cell_count: 0,
			touches_map_edge: false,
			reached: 0,
			slots: 0,
			link_weights: vec![],
		}
	}

	/// The precomputed cost between two links of this Region
	pub fn link_weight(&self, from: usize, to: usize) -> Option<u32> {
		let n = self.links.len();
		let i = self.links.iter().position(|&l| l == from)?;
		let j = self.links.iter().position(|&l| l == to)?;
		self.link_weights.get(i * n + j).copied()
	}
}
