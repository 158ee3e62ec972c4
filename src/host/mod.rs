//! The query surface this crate needs from the simulation that owns the map.
//!
//! The pathing core never stores terrain or Things itself. Everything it knows about the world
//! is asked through [`WorldMap`], which allows the host to keep its data in whatever format it
//! likes, as long as it can answer these questions for a single Cell.
//!
//! [`GridMap`] is a small in-memory implementation, useful for tools, benchmarks and tests.

use crate::{Cell, MapSize};

mod grid_map;
pub use self::grid_map::{GridMap, TerrainDef};
#[cfg(test)]
pub(crate) use self::grid_map::WALL_KIND;

/// Identifies a single Thing on the map
pub type ThingId = u32;
/// Identifies the kind (definition) of a Thing. Mover classes override costs per kind.
pub type ThingKind = u32;
/// Identifies a type of terrain. Mover classes override costs per kind.
pub type TerrainKind = u16;
/// Identifies an individual mover (as opposed to its [`MoverClass`](crate::MoverClass))
pub type MoverId = u32;
/// Identifies a faction. Doors and reachability caches are faction-aware.
pub type FactionId = u32;

/// How a Thing interacts with movement
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Passability {
	/// Movers may walk over and stop on the Thing
	Standable,
	/// Movers may walk over the Thing but not stop on it
	PassThroughOnly,
	/// Movers cannot enter the Cell
	Impassable,
}

/// A snapshot of a Thing occupying a Cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Thing {
	/// unique id
	pub id: ThingId,
	/// definition, used to look up per-mover-class cost overrides
	pub kind: ThingKind,
	/// generic additional path cost of entering the Cell
	pub path_cost: u32,
	/// whether movers may enter the Cell at all
	pub passability: Passability,
	/// `true` if the Thing fills the whole Cell (walls, rocks). A non-filling impassable Thing
	/// still lets air through.
	pub fills_cell: bool,
	/// `true` if movers that are allowed to destroy obstacles can break through
	pub destroyable: bool,
	/// remaining hit points, scaling the cost of breaking through
	pub hit_points: u32,
}

impl Thing {
	/// A standable Thing with the given path cost
	pub fn new(id: ThingId, kind: ThingKind, path_cost: u32) -> Thing {
		Thing {
			id,
			kind,
			path_cost,
			passability: Passability::Standable,
			fills_cell: false,
			destroyable: false,
			hit_points: 0,
		}
	}

	/// An impassable, cell-filling, destroyable wall with the given hit points
	pub fn wall(id: ThingId, kind: ThingKind, hit_points: u32) -> Thing {
		Thing {
			id,
			kind,
			path_cost: 0,
			passability: Passability::Impassable,
			fills_cell: true,
			destroyable: true,
			hit_points,
		}
	}

	/// `true` if this Thing blocks every mover that doesn't override its cost
	pub fn is_impassable(&self) -> bool {
		self.passability == Passability::Impassable
	}
}

/// Snow depth on a Cell. Each mover class assigns its own cost per category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SnowCategory {
	/// no snow at all
	#[default]
	None,
	/// barely visible
	Dusting,
	/// slows down slightly
	Thin,
	/// slows down noticeably
	Medium,
	/// slows down heavily
	Thick,
}

impl SnowCategory {
	/// Index into a per-category cost table
	pub fn index(self) -> usize {
		self as usize
	}
}

/// How dangerous an area is. Traversal parameters cap the danger a mover accepts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Danger {
	/// safe
	#[default]
	None,
	/// risky
	Some,
	/// lethal
	Deadly,
}

/// A door on a Cell. Doors form their own one-Cell Regions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Door {
	/// `true` if the door is currently open (or held open)
	pub open: bool,
	/// the faction owning the door, `None` for doors anyone may open
	pub faction: Option<FactionId>,
	/// additional ticks a mover waits in front of the closed door
	pub ticks_to_open: u32,
}

impl Door {
	/// An unowned door
	pub fn new(open: bool) -> Door {
		Door {
			open,
			faction: None,
			ticks_to_open: 0,
		}
	}

	/// `true` if a mover of `faction` may pass through without breaking the door
	pub fn can_pass(&self, faction: Option<FactionId>) -> bool {
		self.open || self.faction.is_none() || self.faction == faction
	}
}

/// Read access to the world the movers live in.
///
/// Every method answers a question about a single Cell. Implementations must be cheap, since
/// cost recomputation and Region building call them for every Cell they touch.
///
/// Cells passed in are always in bounds.
pub trait WorldMap: Send + Sync {
	/// The fixed size of the Grid
	fn size(&self) -> MapSize;
	/// The terrain on a Cell
	fn terrain_at(&self, cell: Cell) -> TerrainKind;
	/// The generic path cost of the terrain on a Cell
	fn terrain_base_cost(&self, cell: Cell) -> u32;
	/// `false` if the terrain on a Cell cannot be walked on by default (deep water, chasms, ...)
	fn terrain_passable(&self, cell: Cell) -> bool;
	/// Appends every Thing occupying a Cell to `out`
	fn things_at(&self, cell: Cell, out: &mut Vec<Thing>);
	/// Snow depth on a Cell
	fn snow_category_at(&self, _cell: Cell) -> SnowCategory {
		SnowCategory::None
	}
	/// The door on a Cell, if any
	fn door_at(&self, _cell: Cell) -> Option<Door> {
		None
	}
	/// `true` if a fence stands on a Cell
	fn fence_at(&self, _cell: Cell) -> bool {
		false
	}
	/// `true` if a Cell has a road on it. Non-hostile movers may prefer roads.
	fn is_road(&self, _cell: Cell) -> bool {
		false
	}
	/// How dangerous a Cell is
	fn danger_at(&self, _cell: Cell) -> Danger {
		Danger::None
	}
	/// `true` if a mover other than `except` currently blocks a Cell
	fn blocking_mover_at(&self, _cell: Cell, _except: Option<MoverId>) -> bool {
		false
	}
	/// Cost a mover attaches to a Cell it would rather avoid (e.g. known enemy fire lanes)
	fn avoid_cost_at(&self, _cell: Cell, _mover: Option<MoverId>) -> u32 {
		0
	}
}
