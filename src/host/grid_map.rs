use super::{Danger, Door, FactionId, MoverId, SnowCategory, TerrainKind, Thing, ThingId, WorldMap};
use crate::utils::{read, write};
use crate::{Cell, CellRect, MapSize};

use hashbrown::HashMap;
use std::sync::RwLock;

/// The properties of a kind of terrain on a [`GridMap`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TerrainDef {
	/// generic path cost
	pub path_cost: u32,
	/// `false` for terrain no mover may enter unless its class overrides it
	pub passable: bool,
}

impl TerrainDef {
	/// Walkable terrain with the given path cost
	pub const fn walkable(path_cost: u32) -> TerrainDef {
		TerrainDef {
			path_cost,
			passable: true,
		}
	}
	/// Terrain that blocks movement by default
	pub const IMPASSABLE: TerrainDef = TerrainDef {
		path_cost: 0,
		passable: false,
	};
}

#[derive(Clone, Debug, Default)]
struct CellData {
	terrain: TerrainKind,
	things: Vec<ThingId>,
	door: Option<Door>,
	fence: bool,
	road: bool,
	snow: SnowCategory,
	danger: Danger,
	avoid_cost: u32,
	blocking_mover: Option<MoverId>,
}

#[derive(Debug)]
struct Contents {
	cells: Vec<CellData>,
	things: HashMap<ThingId, (Thing, CellRect)>,
	next_thing_id: ThingId,
}

/// A simple in-memory [`WorldMap`].
///
/// All mutators take `&self` so that the map can be shared with a
/// [`PathingMap`](crate::PathingMap) (and its worker thread) through an `Arc`. Mutators return
/// the Rect that changed, which is what the `notify_*` methods of the PathingMap expect.
///
/// ## Examples
/// ```
/// use region_pathing::prelude::*;
///
/// let map = GridMap::open(10, 10);
/// let rect = map.build_wall(Cell::new(3, 3));
/// assert_eq!(rect, CellRect::single(Cell::new(3, 3)));
///
/// let mut things = vec![];
/// map.things_at(Cell::new(3, 3), &mut things);
/// assert!(things[0].is_impassable());
/// ```
#[derive(Debug)]
pub struct GridMap {
	size: MapSize,
	terrains: Vec<TerrainDef>,
	contents: RwLock<Contents>,
}

/// The kind given to Things created by [`GridMap::build_wall`]
pub const WALL_KIND: u32 = 0;

impl GridMap {
	/// Creates a map where every Cell has terrain `0` of the given `terrains` list
	pub fn new(size: MapSize, terrains: Vec<TerrainDef>) -> GridMap {
		assert!(!terrains.is_empty(), "a GridMap needs at least one terrain");
		GridMap {
			size,
			terrains,
			contents: RwLock::new(Contents {
				cells: vec![CellData::default(); size.num_cells()],
				things: HashMap::new(),
				next_thing_id: 1,
			}),
		}
	}

	/// A `width` x `height` map of free terrain with no path cost
	pub fn open(width: i32, height: i32) -> GridMap {
		GridMap::new(MapSize::new(width, height), vec![TerrainDef::walkable(0)])
	}

	fn index(&self, cell: Cell) -> Option<usize> {
		self.size.in_bounds(cell).then(|| self.size.index_of(cell))
	}

	/// Changes the terrain of a Cell
	pub fn set_terrain(&self, cell: Cell, terrain: TerrainKind) -> CellRect {
		assert!((terrain as usize) < self.terrains.len(), "unknown terrain {terrain}");
		if let Some(i) = self.index(cell) {
			write(&self.contents).cells[i].terrain = terrain;
		}
		CellRect::single(cell)
	}

	/// Places `thing` on every Cell of `rect`. The Thing keeps its id.
	pub fn spawn(&self, rect: CellRect, thing: Thing) -> CellRect {
		let rect = rect.clipped_to(self.size);
		let mut contents = write(&self.contents);
		for cell in rect.cells() {
			let i = self.size.index_of(cell);
			contents.cells[i].things.push(thing.id);
		}
		contents.next_thing_id = contents.next_thing_id.max(thing.id + 1);
		contents.things.insert(thing.id, (thing, rect));
		rect
	}

	/// Removes a Thing, returning the Rect it occupied
	pub fn despawn(&self, id: ThingId) -> Option<CellRect> {
		let mut contents = write(&self.contents);
		let (_, rect) = contents.things.remove(&id)?;
		for cell in rect.cells() {
			let i = self.size.index_of(cell);
			contents.cells[i].things.retain(|&t| t != id);
		}
		Some(rect)
	}

	/// Returns an unused ThingId
	pub fn next_thing_id(&self) -> ThingId {
		let mut contents = write(&self.contents);
		let id = contents.next_thing_id;
		contents.next_thing_id += 1;
		id
	}

	/// Builds an indestructible-by-default wall on a single Cell
	pub fn build_wall(&self, cell: Cell) -> CellRect {
		let id = self.next_thing_id();
		self.spawn(CellRect::single(cell), Thing::wall(id, WALL_KIND, 300))
	}

	/// Removes every wall from a Cell
	pub fn remove_walls(&self, cell: Cell) -> CellRect {
		let walls: Vec<ThingId> = {
			let contents = read(&self.contents);
			match self.index(cell) {
				Some(i) => contents.cells[i]
					.things
					.iter()
					.copied()
					.filter(|id| contents.things[id].0.kind == WALL_KIND)
					.collect(),
				None => vec![],
			}
		};
		for id in walls {
			self.despawn(id);
		}
		CellRect::single(cell)
	}

	/// Places or removes a door
	pub fn set_door(&self, cell: Cell, door: Option<Door>) -> CellRect {
		if let Some(i) = self.index(cell) {
			write(&self.contents).cells[i].door = door;
		}
		CellRect::single(cell)
	}

	/// Opens or closes an existing door
	pub fn set_door_open(&self, cell: Cell, open: bool) {
		if let Some(i) = self.index(cell) {
			if let Some(door) = write(&self.contents).cells[i].door.as_mut() {
				door.open = open;
			}
		}
	}

	/// Changes the owner of an existing door
	pub fn set_door_faction(&self, cell: Cell, faction: Option<FactionId>) {
		if let Some(i) = self.index(cell) {
			if let Some(door) = write(&self.contents).cells[i].door.as_mut() {
				door.faction = faction;
			}
		}
	}

	/// Places or removes a fence
	pub fn set_fence(&self, cell: Cell, fence: bool) -> CellRect {
		if let Some(i) = self.index(cell) {
			write(&self.contents).cells[i].fence = fence;
		}
		CellRect::single(cell)
	}

	/// Places or removes a road
	pub fn set_road(&self, cell: Cell, road: bool) {
		if let Some(i) = self.index(cell) {
			write(&self.contents).cells[i].road = road;
		}
	}

	/// Changes the snow depth of a Cell
	pub fn set_snow(&self, cell: Cell, snow: SnowCategory) -> CellRect {
		if let Some(i) = self.index(cell) {
			write(&self.contents).cells[i].snow = snow;
		}
		CellRect::single(cell)
	}

	/// Changes the danger of a Cell
	pub fn set_danger(&self, cell: Cell, danger: Danger) {
		if let Some(i) = self.index(cell) {
			write(&self.contents).cells[i].danger = danger;
		}
	}

	/// Changes the avoid cost of a Cell
	pub fn set_avoid_cost(&self, cell: Cell, cost: u32) {
		if let Some(i) = self.index(cell) {
			write(&self.contents).cells[i].avoid_cost = cost;
		}
	}

	/// Marks a Cell as blocked by the given mover
	pub fn set_blocking_mover(&self, cell: Cell, mover: Option<MoverId>) {
		if let Some(i) = self.index(cell) {
			write(&self.contents).cells[i].blocking_mover = mover;
		}
	}

	fn with_cell<T>(&self, cell: Cell, f: impl FnOnce(&CellData) -> T) -> T {
		let contents = read(&self.contents);
		f(&contents.cells[self.size.index_of(cell)])
	}
}

impl WorldMap for GridMap {
	fn size(&self) -> MapSize {
		self.size
	}
	fn terrain_at(&self, cell: Cell) -> TerrainKind {
		self.with_cell(cell, |c| c.terrain)
	}
	fn terrain_base_cost(&self, cell: Cell) -> u32 {
		self.terrains[self.terrain_at(cell) as usize].path_cost
	}
	fn terrain_passable(&self, cell: Cell) -> bool {
		self.terrains[self.terrain_at(cell) as usize].passable
	}
	fn things_at(&self, cell: Cell, out: &mut Vec<Thing>) {
		let contents = read(&self.contents);
		let data = &contents.cells[self.size.index_of(cell)];
		out.extend(data.things.iter().map(|id| contents.things[id].0));
	}
	fn snow_category_at(&self, cell: Cell) -> SnowCategory {
		self.with_cell(cell, |c| c.snow)
	}
	fn door_at(&self, cell: Cell) -> Option<Door> {
		self.with_cell(cell, |c| c.door)
	}
	fn fence_at(&self, cell: Cell) -> bool {
		self.with_cell(cell, |c| c.fence)
	}
	fn is_road(&self, cell: Cell) -> bool {
		self.with_cell(cell, |c| c.road)
	}
	fn danger_at(&self, cell: Cell) -> Danger {
		self.with_cell(cell, |c| c.danger)
	}
	fn blocking_mover_at(&self, cell: Cell, except: Option<MoverId>) -> bool {
		self.with_cell(cell, |c| {
			c.blocking_mover.is_some() && c.blocking_mover != except
		})
	}
	fn avoid_cost_at(&self, cell: Cell, _mover: Option<MoverId>) -> u32 {
		self.with_cell(cell, |c| c.avoid_cost)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn spawn_and_despawn() {
		let map = GridMap::open(4, 4);
		let id = map.next_thing_id();
		let rect = map.spawn(CellRect::new(1, 1, 5, 2), Thing::new(id, 7, 20));
		assert_eq!(rect, CellRect::new(1, 1, 3, 2));

		let mut things = vec![];
		map.things_at(Cell::new(3, 2), &mut things);
		assert_eq!(things.len(), 1);
		assert_eq!(things[0].path_cost, 20);

		assert_eq!(map.despawn(id), Some(rect));
		things.clear();
		map.things_at(Cell::new(3, 2), &mut things);
		assert!(things.is_empty());
		assert_eq!(map.despawn(id), None);
	}

	#[test]
	fn walls_can_be_removed() {
		let map = GridMap::open(3, 3);
		map.build_wall(Cell::new(1, 1));
		map.spawn(CellRect::single(Cell::new(1, 1)), Thing::new(99, 5, 3));
		map.remove_walls(Cell::new(1, 1));

		let mut things = vec![];
		map.things_at(Cell::new(1, 1), &mut things);
		assert_eq!(things.len(), 1);
		assert_eq!(things[0].id, 99);
	}

	#[test]
	fn blocking_movers_ignore_themselves() {
		let map = GridMap::open(3, 3);
		map.set_blocking_mover(Cell::new(0, 0), Some(4));
		assert!(map.blocking_mover_at(Cell::new(0, 0), None));
		assert!(!map.blocking_mover_at(Cell::new(0, 0), Some(4)));
	}
}
