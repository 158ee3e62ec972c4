use super::TraverseParms;
use crate::host::Thing;
use crate::region::GraphContext;
use crate::{Cell, CellRect, PathCostGrid, ADJACENT_8};

use std::collections::VecDeque;

/// `true` if a mover with `tp` may stand on `cell`
pub(crate) fn cell_passable(
	ctx: &GraphContext,
	cell: Cell,
	tp: &TraverseParms,
	things: &mut Vec<Thing>,
) -> bool {
	let world = ctx.world;
	if !world.size().in_bounds(cell) {
		return false;
	}
	if let Some(door) = world.door_at(cell) {
		if !tp.can_pass_door(&door) {
			return false;
		}
	}
	if world.fence_at(cell) && !tp.allows_fences() {
		return false;
	}
	if ctx.costs.walkable(cell) {
		return true;
	}
	tp.mode.can_destroy()
		&& PathCostGrid::destroyable_blocker_hit_points(world, ctx.class, cell, things).is_some()
}

/// Cell by cell flood fill from `start` until a Cell of `end_area` is reached.
///
/// Used where Regions cannot answer: for movers that break through obstacles and for classes
/// without a Region graph.
pub(crate) fn flood_reaches(
	ctx: &GraphContext,
	start: Cell,
	end_area: CellRect,
	tp: &TraverseParms,
) -> bool {
	let size = ctx.world.size();
	if !size.in_bounds(start) {
		return false;
	}
	if end_area.contains(start) {
		return true;
	}
	let end_area = end_area.clipped_to(size);
	if end_area.is_empty() {
		return false;
	}

	let mut things = vec![];
	let mut visited = vec![false; size.num_cells()];
	let mut queue = VecDeque::new();
	visited[size.index_of(start)] = true;
	queue.push_back(start);

	while let Some(cell) = queue.pop_front() {
		for &(dx, dz) in ADJACENT_8.iter() {
			let next = cell.offset(dx, dz);
			if !size.in_bounds(next) || visited[size.index_of(next)] {
				continue;
			}
			if dx != 0 && dz != 0 {
				let corner_a = cell.offset(dx, 0);
				let corner_b = cell.offset(0, dz);
				if !cell_passable(ctx, corner_a, tp, &mut things)
					|| !cell_passable(ctx, corner_b, tp, &mut things)
				{
					continue;
				}
			}
			if !cell_passable(ctx, next, tp, &mut things) {
				continue;
			}
			if end_area.contains(next) {
				return true;
			}
			visited[size.index_of(next)] = true;
			queue.push_back(next);
		}
	}
	false
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::host::{GridMap, WorldMap};
	use crate::{MoverClass, TraverseMode};

	#[test]
	fn destroyers_break_through_walls() {
		let world = GridMap::open(7, 3);
		for z in 0..3 {
			world.build_wall(Cell::new(3, z));
		}
		let class = MoverClass::new("walker");
		let costs = PathCostGrid::new(world.size());
		costs.recompute_all(&world, &class);
		let ctx = GraphContext {
			world: &world,
			costs: &costs,
			class: &class,
		};
		let dest = CellRect::single(Cell::new(6, 1));

		let walker = TraverseParms::with_mode(TraverseMode::PassDoors);
		assert!(!flood_reaches(&ctx, Cell::new(0, 1), dest, &walker));
		assert!(flood_reaches(&ctx, Cell::new(4, 0), dest, &walker));

		let breaker = TraverseParms::with_mode(TraverseMode::PassAllDestroyableThings);
		assert!(flood_reaches(&ctx, Cell::new(0, 1), dest, &breaker));
	}

	#[test]
	fn diagonals_need_both_corners() {
		let world = GridMap::open(2, 2);
		world.build_wall(Cell::new(1, 0));
		let class = MoverClass::new("walker");
		let costs = PathCostGrid::new(world.size());
		costs.recompute_all(&world, &class);
		let ctx = GraphContext {
			world: &world,
			costs: &costs,
			class: &class,
		};
		let tp = TraverseParms::default();
		let dest = CellRect::single(Cell::new(1, 1));
		assert!(flood_reaches(&ctx, Cell::new(0, 0), dest, &tp));

		world.build_wall(Cell::new(0, 1));
		costs.recompute_all(&world, &class);
		assert!(!flood_reaches(&ctx, Cell::new(0, 0), dest, &tp));
	}
}
