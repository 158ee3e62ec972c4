//! Region graphs: the decomposition of the walkable area of one owner class into Regions, the
//! links between them and the Rooms they form.
//!
//! ## Overview
//! Every owner class has one [`OwnerGraph`]. The Cells of the map are flood-filled into
//! [`Regions`](node::Region) of uniform [`RegionType`], capped by tile-aligned boxes of
//! [`region_size`](crate::PathingConfig::region_size) Cells. Neighboring Regions share
//! [links](link::RegionLink), which turn the graph into something small enough for reachability
//! checks and long-distance heuristics. Contiguous Regions of a compatible type form Rooms.
//!
//! World changes only mark Regions as dirty. The next read of the graph rebuilds them in one
//! pass (see [`rebuild_if_needed`](OwnerGraph::rebuild_if_needed)).
//!
//! All storage is arena based: Regions, Rooms and links reference each other by index. Indices
//! never leave this crate; callers get [`RegionHandle`]s and [`RoomHandle`]s instead.

mod builder;
mod dirtyer;
mod grid;
mod id_map;
mod link;
mod node;
mod rebuilder;
mod region_type;
mod room;

pub use self::link::EdgeSpan;
pub use self::region_type::RegionType;

pub(crate) use self::dirtyer::DirtyTracker;
pub(crate) use self::grid::RegionGrid;
pub(crate) use self::id_map::{id_map, id_map_with_cap, id_set, IdMap, IdSet};
pub(crate) use self::link::RegionLinkTable;
pub(crate) use self::node::{Region, LINK_WEIGHT_CARDINAL, LINK_WEIGHT_DIAGONAL};
pub(crate) use self::rebuilder::RebuildState;
pub(crate) use self::region_type::classify;
pub(crate) use self::room::Room;

use crate::host::{Thing, WorldMap};
use crate::reachability::ReachabilityCache;
use crate::{Cell, MapSize, MoverClass, MoverClassId, PathCostGrid};

use slab::Slab;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_UID: AtomicU64 = AtomicU64::new(1);

/// A process-wide unique id for Regions and Rooms
pub(crate) fn next_uid() -> u64 {
	NEXT_UID.fetch_add(1, Ordering::Relaxed)
}

/// Identifies a Region. Only useful for comparing with other handles.
///
/// A handle never compares equal to the handle of a Region that was built later, even if it
/// covers exactly the same Cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegionHandle(u64);

/// Identifies a Room. Only useful for comparing with other handles.
///
/// Rooms keep their identity across rebuilds of their Regions as long as they are not merged
/// into another Room or split apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RoomHandle(u64);

/// Size of a Region graph, mostly useful for diagnostics and tests
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegionStats {
	/// number of valid Regions
	pub regions: usize,
	/// number of links between Regions
	pub links: usize,
	/// number of Rooms
	pub rooms: usize,
	/// number of Cells waiting for a rebuild
	pub dirty_cells: usize,
}

/// Everything outside of the graph that building and querying it needs
#[derive(Clone, Copy)]
pub(crate) struct GraphContext<'a> {
	pub world: &'a dyn WorldMap,
	pub costs: &'a PathCostGrid,
	pub class: &'a MoverClass,
}

/// The Region graph of one owner class, shared by all of its piggyback classes
#[derive(Debug)]
pub(crate) struct OwnerGraph {
	pub owner: MoverClassId,
	pub size: MapSize,
	pub region_size: i32,
	/// `false` for classes that don't use Regions. Nothing is ever built for them.
	pub enabled: bool,
	pub grid: RegionGrid,
	pub regions: Slab<Region>,
	pub rooms: Slab<Room>,
	pub links: RegionLinkTable,
	pub dirty: DirtyTracker,
	/// Rooms that lost a Region since the last rebuild pass and may have fallen apart
	pub touched_rooms: IdSet<usize>,
	pub state: RebuildState,
	pub builder_working: bool,
	pub reachability: ReachabilityCache,
	pub reach_working: bool,
	pub reached_stamp: u32,
	pub build_count: usize,
	pub rebuild_passes: usize,
}

impl OwnerGraph {
	pub fn new(owner: MoverClassId, size: MapSize, region_size: i32, enabled: bool) -> OwnerGraph {
		assert!(region_size > 0, "region_size must be positive");
		OwnerGraph {
			owner,
			size,
			region_size,
			enabled,
			grid: RegionGrid::new(size),
			regions: Slab::new(),
			rooms: Slab::new(),
			links: RegionLinkTable::new(size),
			dirty: DirtyTracker::new(),
			touched_rooms: id_set(),
			state: RebuildState::Uninitialized,
			builder_working: false,
			reachability: ReachabilityCache::default(),
			reach_working: false,
			reached_stamp: 0,
			build_count: 0,
			rebuild_passes: 0,
		}
	}

	pub fn region_handle(&self, region: usize) -> RegionHandle {
		RegionHandle(self.regions[region].uid)
	}

	pub fn room_handle(&self, room: usize) -> RoomHandle {
		RoomHandle(self.rooms[room].uid)
	}

	/// The Room of the valid Region at a Cell, without rebuilding
	pub fn room_at_no_rebuild(&self, cell: Cell) -> Option<usize> {
		self.valid_region_at_no_rebuild(cell)
			.and_then(|r| self.regions[r].room)
	}

	pub fn stats(&self) -> RegionStats {
		RegionStats {
			regions: self.valid_regions().count(),
			links: self.links.len(),
			rooms: self.rooms.len(),
			dirty_cells: self.dirty.len(),
		}
	}

	/// The Cells of a link that lie inside `region`
	pub fn link_cells_in(&self, link: usize, region: usize) -> impl Iterator<Item = Cell> + '_ {
		let span = self.links.get(link).span;
		let on_span_side = self.grid.slot_at(span.root) == Some(region);
		let (ax, az) = if on_span_side { (0, 0) } else { span.across() };
		span.cells().map(move |c| c.offset(ax, az))
	}

	/// The middle Cell of a link on the side of `region`
	pub fn link_center_in(&self, link: usize, region: usize) -> Cell {
		let span = self.links.get(link).span;
		let center = span.center();
		if self.grid.slot_at(span.root) == Some(region) {
			center
		} else {
			let (ax, az) = span.across();
			center.offset(ax, az)
		}
	}

	/// The Cell of a link on the side of `region` that is closest to `cell`
	pub fn link_closest_cell_in(&self, link: usize, region: usize, cell: Cell) -> Cell {
		let span = self.links.get(link).span;
		let closest = span.closest_cell_to(cell);
		if self.grid.slot_at(span.root) == Some(region) {
			closest
		} else {
			let (ax, az) = span.across();
			closest.offset(ax, az)
		}
	}

	/// Every Thing on or next to a Region, each listed once
	pub fn things_in_region(&self, ctx: &GraphContext, region: usize, out: &mut Vec<Thing>) {
		out.clear();
		let rect = self.regions[region].rect.expanded_by(1).clipped_to(self.size);
		for cell in rect.cells() {
			let touches = cell
				.adjacent_and_inside()
				.any(|c| self.grid.slot_at(c) == Some(region));
			if touches {
				ctx.world.things_at(cell, out);
			}
		}
		out.sort_unstable_by_key(|t| t.id);
		out.dedup_by_key(|t| t.id);
	}

	/// Verifies the structural invariants of a fully rebuilt graph: the Cell partition, link
	/// symmetry and Room membership.
	pub fn check_consistency(&self, ctx: &GraphContext) -> Result<(), String> {
		if !self.enabled {
			return Ok(());
		}
		if !self.dirty.is_empty() {
			return Err(format!("{} cells are still dirty", self.dirty.len()));
		}
		let mut things = vec![];

		for cell in self.size.cells() {
			let expected = classify(ctx, cell, &mut things);
			match self.valid_region_at_no_rebuild(cell) {
				None if expected != RegionType::None => {
					return Err(format!("{cell} ({expected:?}) has no region"));
				}
				Some(r) if self.regions[r].region_type != expected => {
					return Err(format!(
						"{cell} is {expected:?} but its region is {:?}",
						self.regions[r].region_type
					));
				}
				_ => {}
			}
			let Some(here) = self.valid_region_at_no_rebuild(cell) else {
				continue;
			};
			for neighbor in [cell.offset(1, 0), cell.offset(0, 1)] {
				let Some(there) = self.valid_region_at_no_rebuild(neighbor) else {
					continue;
				};
				let (a, b) = (&self.regions[here], &self.regions[there]);
				if here != there
					&& a.region_type == b.region_type
					&& !a.region_type.is_one_cell()
					&& a.limit == b.limit
				{
					return Err(format!("{cell} and {neighbor} should share a region"));
				}
			}
		}

		for (index, link) in self.links.iter() {
			if link.regions == [None, None] {
				return Err(format!("link {index} at {} has no regions", link.span.root));
			}
			for r in link.regions.iter().flatten() {
				let region = self
					.regions
					.get(*r)
					.ok_or_else(|| format!("link {index} references a removed region"))?;
				if !region.valid {
					return Err(format!("link {index} references an invalid region"));
				}
				if !region.links.contains(&index) {
					return Err(format!("region {r} doesn't list link {index}"));
				}
			}
		}

		for r in self.valid_regions() {
			let region = &self.regions[r];
			for &l in &region.links {
				if !self.links.get(l).has(r) {
					return Err(format!("link {l} doesn't list region {r}"));
				}
			}
			let cells = self.region_cells(r).count();
			if cells != region.cell_count {
				return Err(format!(
					"region {r} claims {} cells but owns {cells}",
					region.cell_count
				));
			}
			let Some(room) = region.room else {
				return Err(format!("region {r} has no room"));
			};
			let listed = self.rooms[room].regions.iter().filter(|&&m| m == r).count();
			if listed != 1 {
				return Err(format!("room {room} lists region {r} {listed} times"));
			}
		}

		for (index, room) in self.rooms.iter() {
			if room.regions.is_empty() {
				return Err(format!("room {index} is empty"));
			}
			let mut cells = 0;
			let mut edge = false;
			for &m in &room.regions {
				let region = &self.regions[m];
				if !region.valid || region.room != Some(index) {
					return Err(format!("room {index} lists foreign region {m}"));
				}
				cells += region.cell_count;
				edge |= region.touches_map_edge;
			}
			if cells != room.cell_count || edge != room.touches_map_edge {
				return Err(format!("room {index} has stale aggregates"));
			}
		}
		Ok(())
	}
}
