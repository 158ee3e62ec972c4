use super::{GraphContext, OwnerGraph};
use crate::{Cell, MapSize};

/// Maps every Cell to the Region it was last assigned to.
///
/// Slots may point at invalidated Regions. Readers only accept valid Regions, and
/// [`update_clean`](OwnerGraph::update_clean) clears stale slots a few at a time.
#[derive(Clone, Debug)]
pub(crate) struct RegionGrid {
	size: MapSize,
	slots: Vec<Option<usize>>,
	clean_cursor: usize,
}

impl RegionGrid {
	pub fn new(size: MapSize) -> RegionGrid {
		RegionGrid {
			size,
			slots: vec![None; size.num_cells()],
			clean_cursor: 0,
		}
	}

	pub fn size(&self) -> MapSize {
		self.size
	}

	/// The Region stored at a Cell index, valid or not
	pub fn slot(&self, index: usize) -> Option<usize> {
		self.slots[index]
	}

	/// The Region stored at a Cell, or `None` for Cells out of bounds
	pub fn slot_at(&self, cell: Cell) -> Option<usize> {
		if self.size.in_bounds(cell) {
			self.slots[self.size.index_of(cell)]
		} else {
			None
		}
	}
}

impl OwnerGraph {
	/// The valid Region at a Cell, without processing pending changes first
	pub(crate) fn valid_region_at_no_rebuild(&self, cell: Cell) -> Option<usize> {
		self.grid
			.slot_at(cell)
			.filter(|&r| self.regions.get(r).map_or(false, |r| r.valid))
	}

	/// The valid Region at a Cell, after rebuilding every dirty Region
	pub(crate) fn valid_region_at(&mut self, ctx: &GraphContext, cell: Cell) -> Option<usize> {
		self.rebuild_if_needed(ctx);
		self.valid_region_at_no_rebuild(cell)
	}

	/// Points a slot at a new Region, releasing the previous one.
	///
	/// An invalid Region is removed from the arena once no slot points at it anymore.
	pub(crate) fn set_slot(&mut self, index: usize, region: Option<usize>) {
		let old = std::mem::replace(&mut self.grid.slots[index], region);
		if old == region {
			return;
		}
		if let Some(new) = region {
			self.regions[new].slots += 1;
		}
		if let Some(old) = old {
			self.release_slot(old);
		}
	}

	fn release_slot(&mut self, region: usize) {
		let r = &mut self.regions[region];
		r.slots -= 1;
		if r.slots == 0 && !r.valid {
			debug_assert!(r.room.is_none() && r.links.is_empty());
			self.regions.remove(region);
		}
	}

	/// Clears up to `budget` slots that point at invalid Regions, continuing where the last call
	/// stopped.
	pub(crate) fn update_clean(&mut self, budget: usize) {
		let len = self.grid.slots.len();
		let budget = budget.min(len);
		let mut cleared = 0;
		for _ in 0..budget {
			let index = self.grid.clean_cursor;
			self.grid.clean_cursor = (index + 1) % len;
			if let Some(r) = self.grid.slots[index] {
				if !self.regions[r].valid {
					self.set_slot(index, None);
					cleared += 1;
				}
			}
		}
		if cleared > 0 {
			log::trace!("cleared {cleared} stale region slots");
		}
	}

	/// Every valid Region. Each Region is listed once.
	pub(crate) fn valid_regions(&self) -> impl Iterator<Item = usize> + '_ {
		self.regions
			.iter()
			.filter(|(_, r)| r.valid)
			.map(|(index, _)| index)
	}

	/// The Cells that belong to a Region
	pub(crate) fn region_cells(&self, region: usize) -> impl Iterator<Item = Cell> + '_ {
		self.regions[region]
			.rect
			.cells()
			.filter(move |&c| self.grid.slot(self.grid.size().index_of(c)) == Some(region))
	}
}
