use crate::host::Thing;
use crate::path::Cost;
use crate::reachability::{cell_passable, TraverseParms};
use crate::region::GraphContext;
use crate::{Cell, PathCostGrid, PathingConfig, IMPASSABLE};

/// Added when a mover with a non-square footprint changes its direction
pub(crate) const TURN_COST: Cost = 10;
/// Added for entering a Cell another mover stands on
pub(crate) const BLOCKING_MOVER_COST: Cost = 175;
/// Multiplier of the avoid cost the host reports for a Cell
pub(crate) const AVOID_COST_FACTOR: Cost = 8;
/// Base cost of breaking through a Cell, on top of a fifth of the hit points of its blockers
pub(crate) const DESTROY_BASE_COST: Cost = 70;

/// Weight of the Cell a mover stands on in the footprint average
const ROOT_WEIGHT: Cost = 3;

/// The cost of a single step from `from` to the neighboring Cell `to`, or `None` if the step is
/// not possible.
///
/// `prev` is the Cell the mover came from before `from`, used for the turn penalty. The cell
/// search and path cost replays both go through this function, so a replayed path always costs
/// exactly what the search paid for it.
pub(crate) fn transition_cost(
	ctx: &GraphContext,
	config: &PathingConfig,
	tp: &TraverseParms,
	from: Cell,
	to: Cell,
	prev: Option<Cell>,
	things: &mut Vec<Thing>,
) -> Option<Cost> {
	let class = ctx.class;
	let (dx, dz) = (to.x - from.x, to.z - from.z);
	debug_assert!(dx.abs() <= 1 && dz.abs() <= 1 && (dx, dz) != (0, 0));
	let diagonal = dx != 0 && dz != 0;
	if diagonal
		&& (!cell_passable(ctx, from.offset(dx, 0), tp, things)
			|| !cell_passable(ctx, from.offset(0, dz), tp, things))
	{
		return None;
	}
	let ticks = if diagonal {
		class.move_ticks_diagonal
	} else {
		class.move_ticks_cardinal
	};

	let cell_cost = if config.full_footprint_pathing && class.size != (1, 1) {
		let mut total = 0;
		let mut weights = 0;
		for cell in class.footprint_at(to).cells() {
			let weight = if cell == to { ROOT_WEIGHT } else { 1 };
			total += cell_cost(ctx, tp, cell, things)? * weight;
			weights += weight;
		}
		total / weights
	} else {
		cell_cost(ctx, tp, to, things)?
	};

	let mut cost = ticks + cell_cost;
	if !tp.hostile && config.off_road_multiplier != 1.0 && !ctx.world.is_road(to) {
		cost = (cost as f32 * config.off_road_multiplier).round() as Cost;
	}
	if ctx.world.blocking_mover_at(to, tp.mover) {
		cost += BLOCKING_MOVER_COST;
	}
	cost += ctx.world.avoid_cost_at(to, tp.mover) * AVOID_COST_FACTOR;
	if let Some(prev) = prev {
		let turned = (from.x - prev.x, from.z - prev.z) != (dx, dz);
		if turned && config.smoothing && !class.is_square() {
			cost += TURN_COST;
		}
	}
	Some(cost)
}

/// The cost of standing on a single Cell
fn cell_cost(
	ctx: &GraphContext,
	tp: &TraverseParms,
	cell: Cell,
	things: &mut Vec<Thing>,
) -> Option<Cost> {
	let world = ctx.world;
	if !world.size().in_bounds(cell) {
		return None;
	}
	let mut extra = 0;
	if let Some(door) = world.door_at(cell) {
		if !tp.can_pass_door(&door) {
			return None;
		}
		if !door.open {
			extra += door.ticks_to_open;
		}
	}
	if world.fence_at(cell) && !tp.allows_fences() {
		return None;
	}
	let cost = ctx.costs.cost(cell);
	if cost < IMPASSABLE {
		return Some(cost + extra);
	}
	if !tp.mode.can_destroy() {
		return None;
	}
	let hit_points = PathCostGrid::destroyable_blocker_hit_points(world, ctx.class, cell, things)?;
	Some(DESTROY_BASE_COST + hit_points / 5 + extra)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::host::{Door, GridMap, WorldMap};
	use crate::reachability::TraverseMode;
	use crate::MoverClass;

	struct Fixture {
		world: GridMap,
		class: MoverClass,
		costs: PathCostGrid,
	}

	impl Fixture {
		fn new(class: MoverClass) -> Fixture {
			let world = GridMap::open(8, 8);
			let costs = PathCostGrid::new(world.size());
			costs.recompute_all(&world, &class);
			Fixture {
				world,
				class,
				costs,
			}
		}

		fn refresh(&self) {
			self.costs.recompute_all(&self.world, &self.class);
		}

		fn step(
			&self,
			config: &PathingConfig,
			tp: &TraverseParms,
			from: (i32, i32),
			to: (i32, i32),
			prev: Option<(i32, i32)>,
		) -> Option<Cost> {
			let ctx = GraphContext {
				world: &self.world,
				costs: &self.costs,
				class: &self.class,
			};
			transition_cost(
				&ctx,
				config,
				tp,
				Cell::from(from),
				Cell::from(to),
				prev.map(Cell::from),
				&mut vec![],
			)
		}
	}

	#[test]
	fn ticks_and_penalties() {
		let f = Fixture::new(MoverClass::new("walker"));
		let config = PathingConfig::SYNCHRONOUS;
		let tp = TraverseParms::for_mover(1, None);
		assert_eq!(f.step(&config, &tp, (1, 1), (2, 1), None), Some(13));
		assert_eq!(f.step(&config, &tp, (1, 1), (2, 2), None), Some(18));

		f.world.set_blocking_mover(Cell::new(2, 1), Some(2));
		assert_eq!(f.step(&config, &tp, (1, 1), (2, 1), None), Some(13 + 175));
		f.world.set_blocking_mover(Cell::new(2, 1), Some(1));
		assert_eq!(f.step(&config, &tp, (1, 1), (2, 1), None), Some(13));

		f.world.set_avoid_cost(Cell::new(1, 2), 3);
		assert_eq!(f.step(&config, &tp, (1, 1), (1, 2), None), Some(13 + 24));

		let off_road = PathingConfig {
			off_road_multiplier: 2.0,
			..config
		};
		f.world.set_road(Cell::new(0, 1), true);
		assert_eq!(f.step(&off_road, &tp, (1, 1), (2, 1), None), Some(26));
		assert_eq!(f.step(&off_road, &tp, (1, 1), (0, 1), None), Some(13));
		assert_eq!(f.step(&off_road, &tp.hostile(), (1, 1), (2, 1), None), Some(13));
	}

	#[test]
	fn corners_and_walls() {
		let f = Fixture::new(MoverClass::new("walker"));
		let config = PathingConfig::SYNCHRONOUS;
		let tp = TraverseParms::default();
		f.world.build_wall(Cell::new(2, 1));
		f.refresh();
		assert_eq!(f.step(&config, &tp, (1, 1), (2, 1), None), None);
		assert_eq!(f.step(&config, &tp, (1, 1), (2, 2), None), None);
		assert_eq!(f.step(&config, &tp, (1, 1), (0, 0), None), Some(18));

		let destroy = TraverseParms::with_mode(TraverseMode::PassAllDestroyableThings);
		assert_eq!(f.step(&config, &tp, (1, 1), (2, 1), None), None);
		assert_eq!(
			f.step(&config, &destroy, (1, 1), (2, 1), None),
			Some(13 + DESTROY_BASE_COST + 300 / 5)
		);
	}

	#[test]
	fn doors_cost_time_to_open() {
		let f = Fixture::new(MoverClass::new("walker"));
		let config = PathingConfig::SYNCHRONOUS;
		let mut door = Door::new(false);
		door.faction = Some(4);
		door.ticks_to_open = 30;
		f.world.set_door(Cell::new(3, 3), Some(door));
		f.refresh();
		let owner = TraverseParms::for_mover(1, Some(4));
		let stranger = TraverseParms::for_mover(2, Some(5));
		assert_eq!(
			f.step(&config, &owner, (2, 3), (3, 3), None),
			Some(13 + 30)
		);
		assert_eq!(f.step(&config, &stranger, (2, 3), (3, 3), None), None);
	}

	#[test]
	fn wide_movers_turn_and_average() {
		let f = Fixture::new(MoverClass::new("cart").with_size(3, 1));
		let config = PathingConfig::SYNCHRONOUS;
		let tp = TraverseParms::default();
		assert_eq!(f.step(&config, &tp, (3, 3), (4, 3), Some((2, 3))), Some(13));
		assert_eq!(f.step(&config, &tp, (3, 3), (3, 4), Some((2, 3))), Some(13 + TURN_COST));
		let straight = PathingConfig {
			smoothing: false,
			..config
		};
		assert_eq!(f.step(&straight, &tp, (3, 3), (3, 4), Some((2, 3))), Some(13));

		f.world.set_terrain(Cell::new(5, 3), 0);
		f.world.spawn(
			crate::CellRect::single(Cell::new(5, 3)),
			crate::host::Thing::new(50, 8, 50),
		);
		f.refresh();
		// (50 + 0 + 0 * 3) / 5
		assert_eq!(f.step(&config, &tp, (3, 3), (4, 3), Some((2, 3))), Some(13 + 10));
		let root_only = PathingConfig {
			full_footprint_pathing: false,
			..config
		};
		assert_eq!(f.step(&root_only, &tp, (3, 3), (4, 3), Some((2, 3))), Some(13));
		// the footprint leaves the map
		assert_eq!(f.step(&config, &tp, (1, 3), (0, 3), None), None);
	}
}
