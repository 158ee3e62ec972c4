//! Answers "can a mover get from here to there" on the Region graph.
//!
//! A breadth-first search over Region links is far cheaper than a cell search and is run before
//! every path request. Answers are cached per pair of Rooms, since two Rooms that are connected
//! once stay connected until the walkability of the map changes.

mod cache;
mod flood;
mod traverse;

pub use self::traverse::{PathEndMode, TraverseMode, TraverseParms};

pub(crate) use self::cache::ReachabilityCache;
pub(crate) use self::flood::{cell_passable, flood_reaches};

use crate::host::Danger;
use crate::region::{id_set, GraphContext, IdSet, OwnerGraph, RegionType};
use crate::{Cell, CellRect};

use std::collections::VecDeque;

impl OwnerGraph {
	/// `true` if a mover with `tp` standing on `start` can arrive at `dest` according to
	/// `end_mode`.
	pub(crate) fn can_reach(
		&mut self,
		ctx: &GraphContext,
		start: Cell,
		dest: CellRect,
		end_mode: PathEndMode,
		tp: &TraverseParms,
	) -> bool {
		if self.reach_working {
			log::error!(
				"reachability check from {start} to {dest} for {} while another one is running",
				ctx.class.name
			);
			return false;
		}
		if !self.size.in_bounds(start) || dest.clipped_to(self.size).is_empty() {
			log::error!("reachability check from {start} to {dest} leaves the map");
			return false;
		}
		let end_mode = end_mode.resolve(ctx.costs, dest);
		let end_area = end_mode.end_area(dest);
		if end_area.contains(start) {
			return true;
		}
		if tp.mode.can_destroy() || !self.enabled {
			return flood_reaches(ctx, start, end_area, tp);
		}

		self.reach_working = true;
		let result = self.reach_through_regions(ctx, start, dest, end_mode, tp);
		self.reach_working = false;
		result
	}

	fn reach_through_regions(
		&mut self,
		ctx: &GraphContext,
		start: Cell,
		dest: CellRect,
		end_mode: PathEndMode,
		tp: &TraverseParms,
	) -> bool {
		self.rebuild_if_needed(ctx);

		let start_regions = self.start_regions(ctx, start, tp);
		if start_regions.is_empty() {
			return false;
		}
		let dest_regions = self.destination_regions(ctx, dest, end_mode, tp);
		if dest_regions.is_empty() {
			return false;
		}

		if tp.max_danger >= Danger::Deadly && end_mode == PathEndMode::OnCell {
			let start_room = self.room_at_no_rebuild(start);
			if start_room.is_some() && dest.cells().any(|c| self.room_at_no_rebuild(c) == start_room)
			{
				return true;
			}
		}

		let start_rooms = self.rooms_of(&start_regions);
		let dest_rooms = self.rooms_of(&dest_regions);
		let use_cache = tp.max_danger >= Danger::Deadly;
		if use_cache {
			let mut all_false = true;
			for &a in &start_rooms {
				for &b in &dest_rooms {
					match self.reachability.get(a, b, tp) {
						Some(true) => return true,
						Some(false) => {}
						None => all_false = false,
					}
				}
			}
			if all_false {
				return false;
			}
		}

		let reached = self.region_bfs(ctx, &start_regions, &dest_regions, tp);
		if use_cache {
			match reached {
				Some(region) => {
					if let (&[a], Some(room)) = (start_rooms.as_slice(), self.regions[region].room) {
						let b = self.rooms[room].uid;
						self.reachability.insert(a, b, tp, true);
					}
				}
				None => {
					for &a in &start_rooms {
						for &b in &dest_rooms {
							self.reachability.insert(a, b, tp, false);
						}
					}
				}
			}
		}
		reached.is_some()
	}

	/// The Regions a search from `start` begins in. A mover standing on an impassable Cell
	/// starts from the Regions around it.
	fn start_regions(&self, ctx: &GraphContext, start: Cell, tp: &TraverseParms) -> Vec<usize> {
		if let Some(region) = self.valid_region_at_no_rebuild(start) {
			if self.regions[region].region_type.passable() {
				return vec![region];
			}
		}
		let mut regions = vec![];
		for cell in start.adjacent_8() {
			if let Some(r) = self.valid_region_at_no_rebuild(cell) {
				if !regions.contains(&r) && self.region_allows(ctx, r, tp, false) {
					regions.push(r);
				}
			}
		}
		regions
	}

	/// The Regions a mover may arrive in
	fn destination_regions(
		&self,
		ctx: &GraphContext,
		dest: CellRect,
		end_mode: PathEndMode,
		tp: &TraverseParms,
	) -> Vec<usize> {
		let area = end_mode.end_area(dest).clipped_to(self.size);
		let mut regions = vec![];
		for cell in area.cells() {
			if let Some(r) = self.valid_region_at_no_rebuild(cell) {
				if !regions.contains(&r) && self.region_allows(ctx, r, tp, true) {
					regions.push(r);
				}
			}
		}
		regions
	}

	/// Distinct Room uids of a list of Regions
	fn rooms_of(&self, regions: &[usize]) -> Vec<u64> {
		let mut rooms = vec![];
		for &r in regions {
			if let Some(room) = self.regions[r].room {
				let uid = self.rooms[room].uid;
				if !rooms.contains(&uid) {
					rooms.push(uid);
				}
			}
		}
		rooms
	}

	/// Breadth-first search over links. Returns the first destination Region reached.
	fn region_bfs(
		&mut self,
		ctx: &GraphContext,
		start_regions: &[usize],
		dest_regions: &[usize],
		tp: &TraverseParms,
	) -> Option<usize> {
		let stamp = self.next_reached_stamp();
		let dest: IdSet<usize> = {
			let mut set = id_set();
			set.extend(dest_regions.iter().copied());
			set
		};
		let mut queue = VecDeque::new();
		for &r in start_regions {
			if dest.contains(&r) {
				return Some(r);
			}
			self.regions[r].reached = stamp;
			queue.push_back(r);
		}

		while let Some(current) = queue.pop_front() {
			for i in 0..self.regions[current].links.len() {
				let link = self.regions[current].links[i];
				let Some(other) = self.links.get(link).other(current) else {
					continue;
				};
				if self.regions[other].reached == stamp {
					continue;
				}
				let is_dest = dest.contains(&other);
				if !self.region_allows(ctx, other, tp, is_dest) {
					continue;
				}
				if is_dest {
					return Some(other);
				}
				self.regions[other].reached = stamp;
				queue.push_back(other);
			}
		}
		None
	}

	fn next_reached_stamp(&mut self) -> u32 {
		self.reached_stamp = self.reached_stamp.wrapping_add(1);
		if self.reached_stamp == 0 {
			for (_, region) in self.regions.iter_mut() {
				region.reached = 0;
			}
			self.reached_stamp = 1;
		}
		self.reached_stamp
	}

	/// `true` if a mover with `tp` may enter a Region. Danger only matters on the way, not at
	/// the destination.
	pub(crate) fn region_allows(
		&self,
		ctx: &GraphContext,
		region: usize,
		tp: &TraverseParms,
		is_destination: bool,
	) -> bool {
		let r = &self.regions[region];
		if !r.valid || !r.region_type.passable() {
			return false;
		}
		if !is_destination && tp.max_danger < Danger::Deadly {
			let danger = self
				.region_cells(region)
				.map(|c| ctx.world.danger_at(c))
				.max()
				.unwrap_or_default();
			if danger > tp.max_danger {
				return false;
			}
		}
		match r.region_type {
			RegionType::Portal => {
				let cell = Cell::new(r.rect.min_x, r.rect.min_z);
				ctx.world
					.door_at(cell)
					.map_or(true, |door| tp.can_pass_door(&door))
			}
			RegionType::Fence => tp.allows_fences(),
			_ => true,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::host::{Door, GridMap, WorldMap};
	use crate::{MoverClass, MoverClassId, PathCostGrid};

	struct Fixture {
		world: GridMap,
		class: MoverClass,
		costs: PathCostGrid,
		graph: OwnerGraph,
	}

	impl Fixture {
		/// A 12x5 map split by a wall at x = 5 with a closed door at (5, 2)
		fn new() -> Fixture {
			let world = GridMap::open(12, 5);
			for z in 0..5 {
				world.build_wall(Cell::new(5, z));
			}
			world.remove_walls(Cell::new(5, 2));
			let mut door = Door::new(false);
			door.faction = Some(1);
			world.set_door(Cell::new(5, 2), Some(door));
			let class = MoverClass::new("walker");
			let costs = PathCostGrid::new(world.size());
			costs.recompute_all(&world, &class);
			let graph = OwnerGraph::new(MoverClassId(0), world.size(), 12, true);
			Fixture {
				world,
				class,
				costs,
				graph,
			}
		}

		fn reach(&mut self, from: (i32, i32), to: (i32, i32), tp: TraverseParms) -> bool {
			let ctx = GraphContext {
				world: &self.world,
				costs: &self.costs,
				class: &self.class,
			};
			self.graph.can_reach(
				&ctx,
				Cell::from(from),
				CellRect::single(Cell::from(to)),
				PathEndMode::OnCell,
				&tp,
			)
		}
	}

	#[test]
	fn doors_follow_the_traverse_mode() {
		let mut f = Fixture::new();
		assert!(f.reach((0, 0), (4, 4), TraverseParms::for_mover(1, Some(2))));
		assert!(!f.reach((0, 0), (11, 4), TraverseParms::for_mover(1, Some(2))));
		assert!(f.reach((0, 0), (11, 4), TraverseParms::for_mover(1, Some(1))));
		assert!(f.reach((0, 0), (11, 4), TraverseParms::with_mode(TraverseMode::PassDoors)));
		let closed = TraverseParms::with_mode(TraverseMode::NoPassClosedDoors);
		assert!(!f.reach((0, 0), (11, 4), closed));

		f.world.set_door_open(Cell::new(5, 2), true);
		// door state changes come with a cache clear
		f.graph.reachability.clear();
		assert!(f.reach((0, 0), (11, 4), closed));
	}

	#[test]
	fn cached_and_fresh_answers_agree() {
		let mut f = Fixture::new();
		let tp = TraverseParms::for_mover(1, Some(2));
		let cold = f.reach((0, 0), (11, 4), tp);
		assert!(f.graph.reachability.len() > 0);
		let warm = f.reach((0, 0), (11, 4), tp);
		assert_eq!(cold, warm);
		f.graph.reachability.clear();
		assert_eq!(f.reach((11, 4), (0, 0), tp), cold);
	}

	#[test]
	fn danger_blocks_the_way_but_not_the_goal() {
		let mut f = Fixture::new();
		f.world.set_door_open(Cell::new(5, 2), true);
		f.world.set_danger(Cell::new(5, 2), Danger::Deadly);
		let careful = TraverseParms::with_mode(TraverseMode::PassDoors).max_danger(Danger::Some);
		assert!(!f.reach((0, 0), (11, 4), careful));
		assert!(f.reach((0, 0), (5, 2), careful));
		assert!(f.reach((0, 0), (11, 4), TraverseParms::default()));
	}

	#[test]
	fn nested_checks_fail() {
		let mut f = Fixture::new();
		f.graph.reach_working = true;
		assert!(!f.reach((0, 0), (1, 1), TraverseParms::default()));
	}
}
