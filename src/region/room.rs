use super::{OwnerGraph, RegionType};
use crate::host::MoverId;

use std::collections::VecDeque;

/// A group of contiguous Regions of a compatible type.
///
/// Rooms are the unit of reachability caching, so their identity (`uid`) has to survive
/// incremental rebuilds of unrelated Regions.
#[derive(Clone, Debug)]
pub(crate) struct Room {
	pub uid: u64,
	pub region_type: RegionType,
	pub regions: Vec<usize>,
	pub cell_count: usize,
	pub touches_map_edge: bool,
	pub visitors: Vec<MoverId>,
}

impl Room {
	pub fn add_visitor(&mut self, mover: MoverId) {
		if !self.visitors.contains(&mover) {
			self.visitors.push(mover);
		}
	}

	pub fn remove_visitor(&mut self, mover: MoverId) {
		self.visitors.retain(|&m| m != mover);
	}
}

impl OwnerGraph {
	pub(crate) fn new_room(&mut self, region_type: RegionType) -> usize {
		let room = self.rooms.insert(Room {
			uid: super::next_uid(),
			region_type,
			regions: vec![],
			cell_count: 0,
			touches_map_edge: false,
			visitors: vec![],
		});
		log::trace!("created room {room} ({region_type:?})");
		room
	}

	/// Moves a Region into `room`, leaving its previous Room (if any)
	pub(crate) fn set_room(&mut self, region: usize, room: usize) {
		if self.regions[region].room == Some(room) {
			return;
		}
		self.clear_room(region);
		let r = &mut self.regions[region];
		r.room = Some(room);
		let (cells, edge) = (r.cell_count, r.touches_map_edge);

		let target = &mut self.rooms[room];
		target.regions.push(region);
		target.cell_count += cells;
		target.touches_map_edge |= edge;
	}

	/// Removes a Region from its Room. Rooms without Regions are deleted.
	pub(crate) fn clear_room(&mut self, region: usize) {
		let Some(room) = self.regions[region].room.take() else {
			return;
		};
		let r = &mut self.rooms[room];
		r.regions.retain(|&other| other != region);
		if r.regions.is_empty() {
			log::trace!("room {room} lost its last region");
			self.rooms.remove(room);
			return;
		}
		self.touched_rooms.insert(room);
		let regions = &self.regions;
		r.cell_count = r.regions.iter().map(|&m| regions[m].cell_count).sum();
		r.touches_map_edge = r.regions.iter().any(|&m| regions[m].touches_map_edge);
	}

	/// Puts every Region reachable from `start` through Regions of the same type into `room`.
	///
	/// Regions already in `room` end the flood.
	pub(crate) fn flood_room(&mut self, start: usize, room: usize) {
		let region_type = self.rooms[room].region_type;
		let mut queue = VecDeque::new();
		self.set_room(start, room);
		queue.push_back(start);

		while let Some(current) = queue.pop_front() {
			for i in 0..self.regions[current].links.len() {
				let link = self.regions[current].links[i];
				let Some(other) = self.links.get(link).other(current) else {
					continue;
				};
				let o = &self.regions[other];
				if o.valid && o.region_type == region_type && o.room != Some(room) {
					self.set_room(other, room);
					queue.push_back(other);
				}
			}
		}
	}
}
