//! The per-class movement cost of every Cell.

use crate::host::{Thing, WorldMap};
use crate::{Cell, MapSize, MoverClass};

use std::sync::atomic::{AtomicU32, Ordering};

/// The cost that marks a Cell as impassable. Every cost at or above this value is impassable.
pub const IMPASSABLE: u32 = 10_000;

/// Upper bound of the additional cost caused by snow
pub const MAX_SNOW_COST: u32 = 450;

/// The movement cost of every Cell for one mover class.
///
/// Costs are stored in atomics, so that any thread that notices a change can overwrite a single
/// Cell without further synchronization. Reads never block.
#[derive(Debug)]
pub struct PathCostGrid {
	size: MapSize,
	costs: Box<[AtomicU32]>,
}

impl PathCostGrid {
	/// A grid of the given size where every Cell has cost `0`.
	///
	/// Call [`recompute_all`](PathCostGrid::recompute_all) before using it.
	pub fn new(size: MapSize) -> PathCostGrid {
		PathCostGrid {
			size,
			costs: (0..size.num_cells()).map(|_| AtomicU32::new(0)).collect(),
		}
	}

	/// The size of the grid
	pub fn size(&self) -> MapSize {
		self.size
	}

	/// The current cost of an in-bounds Cell
	pub fn cost(&self, cell: Cell) -> u32 {
		self.cost_at_index(self.size.index_of(cell))
	}

	/// The current cost of the Cell with the given index
	pub fn cost_at_index(&self, index: usize) -> u32 {
		self.costs[index].load(Ordering::Relaxed)
	}

	/// `true` if the Cell is in bounds and not impassable
	pub fn walkable(&self, cell: Cell) -> bool {
		self.size.in_bounds(cell) && self.cost(cell) < IMPASSABLE
	}

	/// Derives the cost of a Cell from the world.
	///
	/// `things` is a scratch buffer that is cleared before use.
	pub fn calculated_cost_at(
		world: &dyn WorldMap,
		class: &MoverClass,
		cell: Cell,
		things: &mut Vec<Thing>,
	) -> u32 {
		let terrain = world.terrain_at(cell);
		let mut cost = match class.terrain_cost(terrain) {
			Some(custom) => custom,
			None if !world.terrain_passable(cell) || class.default_terrain_impassable => {
				return IMPASSABLE;
			}
			None => world.terrain_base_cost(cell),
		};
		if cost >= IMPASSABLE {
			return IMPASSABLE;
		}

		things.clear();
		world.things_at(cell, things);
		let mut thing_cost = 0;
		for thing in things.iter() {
			let cost = match class.thing_cost(thing.kind) {
				Some(custom) if custom >= IMPASSABLE => return IMPASSABLE,
				Some(custom) => custom,
				None if thing.is_impassable() => return IMPASSABLE,
				None => thing.path_cost,
			};
			thing_cost = thing_cost.max(cost);
		}
		cost = cost.saturating_add(thing_cost);

		let snow = class.snow_costs[world.snow_category_at(cell).index()];
		cost = cost.saturating_add(snow.min(MAX_SNOW_COST));

		cost.min(IMPASSABLE - 1)
	}

	/// Total hit points of the Things a mover has to break to enter a Cell.
	///
	/// `None` if the Cell stays impassable after destroying everything destroyable on it,
	/// `Some(0)` if nothing blocks it.
	pub fn destroyable_blocker_hit_points(
		world: &dyn WorldMap,
		class: &MoverClass,
		cell: Cell,
		things: &mut Vec<Thing>,
	) -> Option<u32> {
		let terrain_passable = match class.terrain_cost(world.terrain_at(cell)) {
			Some(custom) => custom < IMPASSABLE,
			None => world.terrain_passable(cell) && !class.default_terrain_impassable,
		};
		if !terrain_passable {
			return None;
		}
		things.clear();
		world.things_at(cell, things);
		let mut hit_points = 0u32;
		for thing in things.iter() {
			let blocks = match class.thing_cost(thing.kind) {
				Some(custom) => custom >= IMPASSABLE,
				None => thing.is_impassable(),
			};
			if !blocks {
				continue;
			}
			if !thing.destroyable {
				return None;
			}
			hit_points = hit_points.saturating_add(thing.hit_points);
		}
		Some(hit_points)
	}

	/// Recalculates the cost of a Cell. Returns `true` if the Cell changed between walkable and
	/// impassable.
	pub fn recompute_at(
		&self,
		world: &dyn WorldMap,
		class: &MoverClass,
		cell: Cell,
		things: &mut Vec<Thing>,
	) -> bool {
		let cost = Self::calculated_cost_at(world, class, cell, things);
		let old = self.costs[self.size.index_of(cell)].swap(cost, Ordering::Relaxed);
		(old >= IMPASSABLE) != (cost >= IMPASSABLE)
	}

	/// Recalculates every Cell of the grid
	pub fn recompute_all(&self, world: &dyn WorldMap, class: &MoverClass) {
		let mut things = vec![];
		for (index, slot) in self.costs.iter().enumerate() {
			let cell = self.size.cell_at(index);
			let cost = Self::calculated_cost_at(world, class, cell, &mut things);
			slot.store(cost, Ordering::Relaxed);
		}
		log::debug!(
			"computed path costs of {} cells for {}",
			self.costs.len(),
			class.name
		);
	}
}
