use super::{id_set, GraphContext, IdSet, OwnerGraph, RegionType};

use std::collections::VecDeque;

/// Progress of the Region graph of one owner
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RebuildState {
	/// nothing was built yet. The first read builds the entire graph.
	Uninitialized,
	/// the graph is up to date except for the Cells in the dirty set
	Idle,
	/// a rebuild pass is running. Reads from inside the pass see the graph as it is.
	Rebuilding,
}

impl OwnerGraph {
	/// Brings the graph up to date by rebuilding every dirty Cell.
	///
	/// Calls from inside a running pass return immediately.
	pub(crate) fn rebuild_if_needed(&mut self, ctx: &GraphContext) {
		if !self.enabled {
			return;
		}
		match self.state {
			RebuildState::Rebuilding => {}
			RebuildState::Uninitialized => self.rebuild_all(ctx),
			RebuildState::Idle => {
				if !self.dirty.is_empty() {
					self.run_pass(ctx);
				}
			}
		}
	}

	/// Throws away every Region and builds the graph from scratch
	pub(crate) fn rebuild_all(&mut self, ctx: &GraphContext) {
		if !self.enabled || self.state == RebuildState::Rebuilding {
			return;
		}
		self.set_all_dirty();
		self.run_pass(ctx);
		self.build_count += 1;
		log::info!(
			"built region graph of {} ({} regions, {} rooms, {} links)",
			ctx.class.name,
			self.valid_regions().count(),
			self.rooms.len(),
			self.links.len()
		);
	}

	fn run_pass(&mut self, ctx: &GraphContext) {
		self.state = RebuildState::Rebuilding;
		let dirty = self.dirty.sorted();

		let mut new_regions = vec![];
		let mut failed = id_set();
		for &index in &dirty {
			let cell = self.size.cell_at(index);
			if self.valid_region_at_no_rebuild(cell).is_some() {
				continue;
			}
			match self.try_generate_region_from(ctx, cell) {
				Ok(Some(region)) => new_regions.push(region),
				Ok(None) => self.set_slot(index, None),
				Err(_) => {
					failed.insert(index);
				}
			}
		}

		self.assign_rooms(&new_regions);
		self.split_disconnected_rooms();

		for index in dirty {
			if !failed.contains(&index) {
				self.dirty.remove(index);
			}
		}
		if !failed.is_empty() {
			log::warn!(
				"{} cells of {} stay dirty after failed region builds",
				failed.len(),
				ctx.class.name
			);
		}
		self.reachability.clear();
		self.rebuild_passes += 1;
		self.state = RebuildState::Idle;
		log::trace!(
			"rebuild pass {} of {} created {} regions",
			self.rebuild_passes,
			ctx.class.name,
			new_regions.len()
		);
	}

	/// Groups the new Regions into contiguous clusters and gives every cluster a Room
	fn assign_rooms(&mut self, new_regions: &[usize]) {
		let mut grouped: IdSet<usize> = id_set();
		for &start in new_regions {
			if !grouped.insert(start) {
				continue;
			}
			let region_type = self.regions[start].region_type;
			let group = if region_type.allows_multiple_regions_per_room() {
				self.contiguous_new_group(start, &mut grouped)
			} else {
				vec![start]
			};
			self.attach_group(&group, region_type);
		}
	}

	/// Every Region connected to `start` through links to Regions of the same type that have no
	/// Room yet
	fn contiguous_new_group(&self, start: usize, grouped: &mut IdSet<usize>) -> Vec<usize> {
		let region_type = self.regions[start].region_type;
		let mut group = vec![start];
		let mut queue = VecDeque::new();
		queue.push_back(start);
		while let Some(current) = queue.pop_front() {
			for &link in &self.regions[current].links {
				let Some(other) = self.links.get(link).other(current) else {
					continue;
				};
				let o = &self.regions[other];
				if o.valid && o.room.is_none() && o.region_type == region_type && grouped.insert(other)
				{
					group.push(other);
					queue.push_back(other);
				}
			}
		}
		group
	}

	fn attach_group(&mut self, group: &[usize], region_type: RegionType) {
		if !region_type.allows_multiple_regions_per_room() {
			let room = self.new_room(region_type);
			for &region in group {
				self.set_room(region, room);
			}
			return;
		}

		let mut old_rooms = vec![];
		for &region in group {
			for &link in &self.regions[region].links {
				let Some(other) = self.links.get(link).other(region) else {
					continue;
				};
				let o = &self.regions[other];
				if !o.valid || o.region_type != region_type {
					continue;
				}
				if let Some(room) = o.room {
					if !old_rooms.contains(&room) {
						old_rooms.push(room);
					}
				}
			}
		}

		match old_rooms.as_slice() {
			[] => {
				let room = self.new_room(region_type);
				self.flood_room(group[0], room);
			}
			&[room] => {
				for &region in group {
					self.set_room(region, room);
				}
			}
			_ => {
				let target = old_rooms
					.iter()
					.copied()
					.max_by(|&a, &b| {
						let (a, b) = (&self.rooms[a], &self.rooms[b]);
						a.cell_count.cmp(&b.cell_count).then(b.uid.cmp(&a.uid))
					})
					.unwrap_or(old_rooms[0]);
				log::debug!(
					"merging {} rooms into room {}",
					old_rooms.len(),
					self.rooms[target].uid
				);
				self.flood_room(group[0], target);
			}
		}
	}

	/// Rooms that lost Regions may have fallen apart. The largest part keeps the Room, every
	/// other part gets a new one.
	fn split_disconnected_rooms(&mut self) {
		let touched: Vec<usize> = self.touched_rooms.drain().collect();
		for room in touched {
			let Some(r) = self.rooms.get(room) else {
				continue;
			};
			if !r.region_type.allows_multiple_regions_per_room() || r.regions.len() < 2 {
				continue;
			}
			let mut parts = self.room_components(room);
			if parts.len() < 2 {
				continue;
			}
			parts.sort_by_key(|part| {
				std::cmp::Reverse(
					part.iter()
						.map(|&m| self.regions[m].cell_count)
						.sum::<usize>(),
				)
			});
			let region_type = self.rooms[room].region_type;
			log::debug!(
				"room {} fell apart into {} parts",
				self.rooms[room].uid,
				parts.len()
			);
			for part in parts.into_iter().skip(1) {
				let new = self.new_room(region_type);
				for region in part {
					self.set_room(region, new);
				}
			}
		}
		// splitting touches the rooms it just checked
		self.touched_rooms.clear();
	}

	/// The connected parts of a Room, in the order of its Region list
	fn room_components(&self, room: usize) -> Vec<Vec<usize>> {
		let mut seen: IdSet<usize> = id_set();
		let mut parts = vec![];
		for &start in &self.rooms[room].regions {
			if !seen.insert(start) {
				continue;
			}
			let mut part = vec![start];
			let mut queue = VecDeque::new();
			queue.push_back(start);
			while let Some(current) = queue.pop_front() {
				for &link in &self.regions[current].links {
					let Some(other) = self.links.get(link).other(current) else {
						continue;
					};
					if self.regions[other].room == Some(room) && seen.insert(other) {
						part.push(other);
						queue.push_back(other);
					}
				}
			}
			parts.push(part);
		}
		parts
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::host::{Door, GridMap, WorldMap};
	use crate::{Cell, CellRect, MoverClass, MoverClassId, PathCostGrid};

	struct Fixture {
		world: GridMap,
		class: MoverClass,
		costs: PathCostGrid,
		graph: OwnerGraph,
	}

	impl Fixture {
		fn new(width: i32, height: i32, region_size: i32) -> Fixture {
			let world = GridMap::open(width, height);
			let class = MoverClass::new("walker");
			let costs = PathCostGrid::new(world.size());
			let graph = OwnerGraph::new(MoverClassId(0), world.size(), region_size, true);
			Fixture {
				world,
				class,
				costs,
				graph,
			}
		}

		fn build(&mut self) {
			self.costs.recompute_all(&self.world, &self.class);
			let ctx = GraphContext {
				world: &self.world,
				costs: &self.costs,
				class: &self.class,
			};
			self.graph.rebuild_if_needed(&ctx);
			assert_eq!(self.graph.check_consistency(&ctx), Ok(()));
		}

		fn change(&mut self, rect: CellRect) {
			let mut things = vec![];
			for cell in rect.cells() {
				let flipped = self
					.costs
					.recompute_at(&self.world, &self.class, cell, &mut things);
				if flipped {
					self.graph
						.notify_walkability_changed(cell, self.costs.walkable(cell));
				}
			}
			self.graph.notify_thing_spawned(rect);
		}

		fn room(&self, x: i32, z: i32) -> Option<u64> {
			self.graph
				.room_at_no_rebuild(Cell::new(x, z))
				.map(|r| self.graph.rooms[r].uid)
		}
	}

	#[test]
	fn first_read_builds_everything() {
		let mut f = Fixture::new(24, 24, 12);
		assert_eq!(f.graph.state, RebuildState::Uninitialized);
		f.build();
		assert_eq!(f.graph.state, RebuildState::Idle);
		assert_eq!(f.graph.build_count, 1);
		assert_eq!(f.graph.stats().regions, 4);
		assert_eq!(f.graph.stats().rooms, 1);
		assert!(f.graph.rooms.iter().all(|(_, r)| r.touches_map_edge));
	}

	#[test]
	fn walls_split_rooms_and_openings_merge_them() {
		let mut f = Fixture::new(10, 10, 12);
		f.build();

		for z in 0..10 {
			f.world.build_wall(Cell::new(5, z));
		}
		f.change(CellRect::new(5, 0, 5, 9));
		f.build();
		let left = f.room(0, 0).unwrap();
		let right = f.room(9, 9).unwrap();
		assert_ne!(left, right);
		assert_eq!(f.graph.stats().rooms, 2);

		f.world.remove_walls(Cell::new(5, 4));
		f.change(CellRect::single(Cell::new(5, 4)));
		f.build();
		assert_eq!(f.room(0, 0), f.room(9, 9));
		assert_eq!(f.graph.stats().rooms, 1);
	}

	#[test]
	fn doors_get_their_own_room() {
		let mut f = Fixture::new(9, 3, 12);
		for z in 0..3 {
			f.world.build_wall(Cell::new(4, z));
		}
		f.world.remove_walls(Cell::new(4, 1));
		f.world.set_door(Cell::new(4, 1), Some(Door::new(true)));
		f.build();
		let door = f.room(4, 1).unwrap();
		assert_ne!(Some(door), f.room(0, 0));
		assert_ne!(f.room(0, 0), f.room(8, 0));
		assert_eq!(f.graph.stats().rooms, 3);
	}

	#[test]
	fn unrelated_edits_keep_room_identity() {
		let mut f = Fixture::new(36, 12, 12);
		f.build();
		let before = f.room(35, 0);
		f.world.build_wall(Cell::new(1, 1));
		f.change(CellRect::single(Cell::new(1, 1)));
		f.build();
		assert_eq!(f.room(35, 0), before);
		assert_eq!(f.room(0, 0), before);
	}

	#[test]
	fn reentrant_reads_are_ignored() {
		let mut f = Fixture::new(4, 4, 12);
		f.costs.recompute_all(&f.world, &f.class);
		let ctx = GraphContext {
			world: &f.world,
			costs: &f.costs,
			class: &f.class,
		};
		f.graph.state = RebuildState::Rebuilding;
		f.graph.rebuild_if_needed(&ctx);
		assert_eq!(f.graph.build_count, 0);
		assert_eq!(f.graph.valid_region_at_no_rebuild(Cell::new(0, 0)), None);
	}
}
