use super::{id_set, IdSet, OwnerGraph};
use crate::{Cell, CellRect};

/// The set of Cells whose Region has to be rebuilt
#[derive(Clone, Debug)]
pub(crate) struct DirtyTracker {
	cells: IdSet<usize>,
}

impl DirtyTracker {
	pub fn new() -> DirtyTracker {
		DirtyTracker { cells: id_set() }
	}

	pub fn len(&self) -> usize {
		self.cells.len()
	}

	pub fn is_empty(&self) -> bool {
		self.cells.is_empty()
	}

	pub fn insert(&mut self, index: usize) -> bool {
		self.cells.insert(index)
	}

	pub fn contains(&self, index: usize) -> bool {
		self.cells.contains(&index)
	}

	pub fn remove(&mut self, index: usize) -> bool {
		self.cells.remove(&index)
	}

	/// The dirty Cell indices in ascending order, so that rebuilds are deterministic
	pub fn sorted(&self) -> Vec<usize> {
		let mut cells: Vec<usize> = self.cells.iter().copied().collect();
		cells.sort_unstable();
		cells
	}
}

impl OwnerGraph {
	/// Invalidates a Region, detaching it from its Room and links.
	///
	/// With `add_cells` the Cells of the Region are queued for the next rebuild.
	pub(crate) fn set_region_dirty(&mut self, region: usize, add_cells: bool) {
		if self.regions[region].valid {
			self.regions[region].valid = false;
			self.clear_room(region);
			let links = std::mem::take(&mut self.regions[region].links);
			for link in links {
				self.links.deregister(link, region);
			}
			self.regions[region].link_weights.clear();
		}
		if add_cells {
			let cells: Vec<Cell> = self.region_cells(region).collect();
			for cell in cells {
				self.dirty.insert(self.size.index_of(cell));
			}
		}
	}

	/// Dirties every valid Region touching `rect`
	fn dirty_regions_in(&mut self, rect: CellRect) {
		let rect = rect.clipped_to(self.size);
		let mut found = vec![];
		for cell in rect.cells() {
			if let Some(r) = self.valid_region_at_no_rebuild(cell) {
				if !found.contains(&r) {
					found.push(r);
				}
			}
		}
		for r in found {
			self.set_region_dirty(r, true);
		}
	}

	/// A Cell changed between walkable and impassable, or its Region type changed.
	///
	/// `has_region` tells whether the Cell now classifies as anything but
	/// `RegionType::None`, so that it gets a Region in the next rebuild.
	pub(crate) fn notify_walkability_changed(&mut self, cell: Cell, has_region: bool) {
		if !self.enabled || !self.size.in_bounds(cell) {
			return;
		}
		self.reachability.clear();
		self.dirty_regions_in(CellRect::single(cell).expanded_by(1));
		if has_region {
			self.dirty.insert(self.size.index_of(cell));
		}
	}

	/// A Thing was spawned on `rect`
	pub(crate) fn notify_thing_spawned(&mut self, rect: CellRect) {
		if !self.enabled {
			return;
		}
		self.reachability.clear();
		self.dirty_regions_in(rect.expanded_by(1));
	}

	/// A Thing was removed from `rect`. `padding` widens the invalidated area for movers larger
	/// than a single Cell.
	pub(crate) fn notify_thing_despawned(&mut self, rect: CellRect, padding: i32) {
		if !self.enabled {
			return;
		}
		self.reachability.clear();
		self.dirty_regions_in(rect.expanded_by(1 + padding.max(0)));
		for cell in rect.clipped_to(self.size).cells() {
			self.dirty.insert(self.size.index_of(cell));
		}
	}

	/// Invalidates the entire graph
	pub(crate) fn set_all_dirty(&mut self) {
		if !self.enabled {
			return;
		}
		self.reachability.clear();
		let regions: Vec<usize> = self.valid_regions().collect();
		for r in regions {
			self.set_region_dirty(r, false);
		}
		for index in 0..self.size.num_cells() {
			self.dirty.insert(index);
		}
		log::debug!("marked every region of {} dirty", self.owner);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::region::GraphContext;
	use crate::host::{GridMap, WorldMap};
	use crate::{MoverClass, MoverClassId, PathCostGrid};

	#[test]
	fn tracker_keeps_cells_sorted() {
		let mut dirty = DirtyTracker::new();
		assert!(dirty.insert(9));
		assert!(dirty.insert(3));
		assert!(!dirty.insert(9));
		assert_eq!(dirty.sorted(), vec![3, 9]);
		assert!(dirty.remove(3));
		assert!(!dirty.contains(3));
		assert_eq!(dirty.len(), 1);
	}

	#[test]
	fn invalidation_detaches_links() {
		let world = GridMap::open(16, 4);
		let class = MoverClass::new("walker");
		let costs = PathCostGrid::new(world.size());
		costs.recompute_all(&world, &class);
		let ctx = GraphContext {
			world: &world,
			costs: &costs,
			class: &class,
		};
		let mut graph = OwnerGraph::new(MoverClassId(0), world.size(), 8, true);
		graph.rebuild_all(&ctx);
		assert_eq!(graph.links.len(), 1);
		assert!(graph.dirty.is_empty());

		let left = graph.valid_region_at_no_rebuild(Cell::new(0, 0)).unwrap();
		graph.notify_thing_spawned(CellRect::single(Cell::new(2, 2)));
		// the right Region still holds the shared link
		assert_eq!(graph.links.len(), 1);
		assert!(graph.links.iter().all(|(_, l)| !l.has(left)));
		assert_eq!(graph.dirty.len(), 32);
		assert!(graph.valid_region_at_no_rebuild(Cell::new(12, 0)).is_some());
		assert!(graph.valid_region_at_no_rebuild(Cell::new(0, 0)).is_none());

		graph.rebuild_if_needed(&ctx);
		assert_eq!(graph.links.len(), 1);
		assert!(graph.check_consistency(&ctx).is_ok());
	}
}
