//! Mover classes and the grouping of equivalent classes under a shared "owner".
//!
//! A [`MoverClass`] is pure data: a footprint and tables of cost overrides. No behavior varies by
//! class beyond these lookups. Classes that see the world identically share one Region graph,
//! which is built and owned by the first class of the group (see [`GridOwners`]).

use crate::host::{TerrainKind, ThingKind};
use crate::path_cost::IMPASSABLE;
use crate::{Cell, CellRect};

use hashbrown::HashMap;
use std::fmt;

/// Identifies a [`MoverClass`] registered on a [`PathingMap`](crate::PathingMap).
///
/// Ids are handed out in registration order, starting at `0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MoverClassId(pub u16);

impl MoverClassId {
	/// The position of the class in the registration list
	pub fn index(self) -> usize {
		self.0 as usize
	}
}

impl fmt::Display for MoverClassId {
	fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
		write!(fmt, "#{}", self.0)
	}
}

/// The movement profile of a kind of mover (a vehicle definition, a creature type, ...)
///
/// Custom costs replace the generic cost of a terrain or Thing. A custom cost of
/// [`IMPASSABLE`] or more makes that terrain or Thing impassable for the class, a lower custom
/// cost makes it passable even if it is impassable by default.
///
/// ## Examples
/// ```
/// use region_pathing::prelude::*;
///
/// let boat = MoverClass::new("boat")
///     .with_size(3, 5)
///     .with_default_terrain_impassable()
///     .with_terrain_cost(2, 0); // water
///
/// assert_eq!(boat.min_dimension(), 3);
/// assert_eq!(boat.size_padding(), 2);
/// assert_eq!(boat.terrain_cost(2), Some(0));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct MoverClass {
	/// human readable name, used in logs
	pub name: String,
	/// footprint as `(width, height)`, centered on the Cell the mover stands on
	pub size: (i32, i32),
	/// `false` for classes that never build Regions. Their reachability checks and searches run
	/// on Cells only.
	pub uses_regions: bool,
	/// `true` if every terrain without a custom cost is impassable
	pub default_terrain_impassable: bool,
	/// custom cost per terrain
	pub terrain_costs: HashMap<TerrainKind, u32>,
	/// custom cost per Thing kind
	pub thing_costs: HashMap<ThingKind, u32>,
	/// additional cost per [`SnowCategory`](crate::host::SnowCategory)
	pub snow_costs: [u32; 5],
	/// ticks needed for a straight step
	pub move_ticks_cardinal: u32,
	/// ticks needed for a diagonal step
	pub move_ticks_diagonal: u32,
}

impl MoverClass {
	/// A 1x1 class without any overrides
	pub fn new(name: impl Into<String>) -> MoverClass {
		MoverClass {
			name: name.into(),
			size: (1, 1),
			uses_regions: true,
			default_terrain_impassable: false,
			terrain_costs: HashMap::new(),
			thing_costs: HashMap::new(),
			snow_costs: [0, 0, 4, 8, 12],
			move_ticks_cardinal: 13,
			move_ticks_diagonal: 18,
		}
	}

	/// Sets the footprint
	///
	/// ## Panics
	/// if either dimension is not positive
	pub fn with_size(mut self, width: i32, height: i32) -> MoverClass {
		assert!(width > 0 && height > 0, "invalid footprint {width}x{height}");
		self.size = (width, height);
		self
	}

	/// Sets a custom cost for a terrain
	pub fn with_terrain_cost(mut self, terrain: TerrainKind, cost: u32) -> MoverClass {
		self.terrain_costs.insert(terrain, cost);
		self
	}

	/// Sets a custom cost for a kind of Thing
	pub fn with_thing_cost(mut self, kind: ThingKind, cost: u32) -> MoverClass {
		self.thing_costs.insert(kind, cost);
		self
	}

	/// Makes every terrain without a custom cost impassable
	pub fn with_default_terrain_impassable(mut self) -> MoverClass {
		self.default_terrain_impassable = true;
		self
	}

	/// Disables Region building for this class
	pub fn without_regions(mut self) -> MoverClass {
		self.uses_regions = false;
		self
	}

	/// Sets the ticks needed per step
	pub fn with_move_ticks(mut self, cardinal: u32, diagonal: u32) -> MoverClass {
		self.move_ticks_cardinal = cardinal;
		self.move_ticks_diagonal = diagonal;
		self
	}

	/// The smaller side of the footprint
	pub fn min_dimension(&self) -> i32 {
		self.size.0.min(self.size.1)
	}

	/// How far the footprint reaches beyond the Cell the mover stands on
	pub fn size_padding(&self) -> i32 {
		(self.size.0.max(self.size.1) - 1) / 2
	}

	/// `true` if turning doesn't change the shape of the footprint
	pub fn is_square(&self) -> bool {
		self.size.0 == self.size.1
	}

	/// The Cells covered when standing on `root`
	pub fn footprint_at(&self, root: Cell) -> CellRect {
		CellRect::centered_at(root, self.size.0, self.size.1)
	}

	/// The custom cost of a terrain, if any
	pub fn terrain_cost(&self, terrain: TerrainKind) -> Option<u32> {
		self.terrain_costs.get(&terrain).copied()
	}

	/// The custom cost of a kind of Thing, if any
	pub fn thing_cost(&self, kind: ThingKind) -> Option<u32> {
		self.thing_costs.get(&kind).copied()
	}

	/// The fields that decide which Cells are walkable and how Regions are shaped.
	///
	/// Two classes with equal profiles can share a Region graph.
	pub(crate) fn walkability_profile(&self) -> WalkabilityProfile {
		fn split<K: Copy + Ord>(costs: &HashMap<K, u32>) -> (Vec<K>, Vec<K>) {
			let (mut blocked, mut open): (Vec<K>, Vec<K>) = (vec![], vec![]);
			for (&kind, &cost) in costs {
				if cost >= IMPASSABLE {
					blocked.push(kind);
				} else {
					open.push(kind);
				}
			}
			blocked.sort_unstable();
			open.sort_unstable();
			(blocked, open)
		}
		let (impassable_terrain, passable_terrain) = split(&self.terrain_costs);
		let (impassable_things, passable_things) = split(&self.thing_costs);
		WalkabilityProfile {
			min_dimension: self.min_dimension(),
			default_terrain_impassable: self.default_terrain_impassable,
			uses_regions: self.uses_regions,
			impassable_terrain,
			passable_terrain,
			impassable_things,
			passable_things,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct WalkabilityProfile {
	min_dimension: i32,
	default_terrain_impassable: bool,
	uses_regions: bool,
	impassable_terrain: Vec<TerrainKind>,
	passable_terrain: Vec<TerrainKind>,
	impassable_things: Vec<ThingKind>,
	passable_things: Vec<ThingKind>,
}

/// The static mapping from every mover class to the class that owns its Region graph.
///
/// Computed once when the classes are registered. Owners map to themselves, and every owner
/// gets a dense "slot" index into the per-owner graph storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridOwners {
	owner_of: Vec<MoverClassId>,
	slot_of: Vec<usize>,
	owners: Vec<MoverClassId>,
}

impl GridOwners {
	/// Groups `classes` by walkability. The first class of every group becomes its owner.
	pub fn compute(classes: &[MoverClass]) -> GridOwners {
		let mut by_profile: HashMap<WalkabilityProfile, usize> = HashMap::new();
		let mut owner_of = Vec::with_capacity(classes.len());
		let mut slot_of = Vec::with_capacity(classes.len());
		let mut owners = vec![];

		for (index, class) in classes.iter().enumerate() {
			let id = MoverClassId(index as u16);
			let slot = *by_profile
				.entry(class.walkability_profile())
				.or_insert_with(|| {
					owners.push(id);
					owners.len() - 1
				});
			owner_of.push(owners[slot]);
			slot_of.push(slot);
			if owners[slot] != id {
				log::debug!(
					"mover class {} ({}) piggybacks on owner {}",
					id,
					class.name,
					owners[slot]
				);
			}
		}
		GridOwners {
			owner_of,
			slot_of,
			owners,
		}
	}

	/// The owner of `class`
	pub fn owner_of(&self, class: MoverClassId) -> MoverClassId {
		self.owner_of[class.index()]
	}

	/// `true` if `class` owns a Region graph
	pub fn is_owner(&self, class: MoverClassId) -> bool {
		self.owner_of(class) == class
	}

	/// All owners, in registration order
	pub fn owners(&self) -> &[MoverClassId] {
		&self.owners
	}

	/// The index of the graph used by `class`
	pub fn slot_of(&self, class: MoverClassId) -> usize {
		self.slot_of[class.index()]
	}

	/// Every class that shares the graph of `owner` (including `owner` itself)
	pub fn members_of(&self, owner: MoverClassId) -> impl Iterator<Item = MoverClassId> + '_ {
		self.owner_of
			.iter()
			.enumerate()
			.filter(move |(_, o)| **o == owner)
			.map(|(index, _)| MoverClassId(index as u16))
	}

	/// The classes that read the graph of `owner` without owning it
	pub fn piggies_of(&self, owner: MoverClassId) -> impl Iterator<Item = MoverClassId> + '_ {
		self.members_of(owner).filter(move |&c| c != owner)
	}
}

/// All mover classes of a map, together with their [`GridOwners`]
#[derive(Clone, Debug)]
pub struct MoverRegistry {
	classes: Vec<MoverClass>,
	owners: GridOwners,
}

impl MoverRegistry {
	/// Registers `classes`. Their ids follow the order of the list.
	///
	/// ## Panics
	/// if more than `u16::MAX` classes are given
	pub fn new(classes: Vec<MoverClass>) -> MoverRegistry {
		assert!(classes.len() <= u16::MAX as usize, "too many mover classes");
		let owners = GridOwners::compute(&classes);
		MoverRegistry { classes, owners }
	}

	/// The class with the given id, if it is registered
	pub fn get(&self, id: MoverClassId) -> Option<&MoverClass> {
		self.classes.get(id.index())
	}

	/// Looks up a class by name
	pub fn find(&self, name: &str) -> Option<MoverClassId> {
		self.classes
			.iter()
			.position(|c| c.name == name)
			.map(|i| MoverClassId(i as u16))
	}

	/// The owner grouping
	pub fn owners(&self) -> &GridOwners {
		&self.owners
	}

	/// Number of registered classes
	pub fn len(&self) -> usize {
		self.classes.len()
	}

	/// `true` if no classes are registered
	pub fn is_empty(&self) -> bool {
		self.classes.is_empty()
	}

	/// Iterates over all ids and classes
	pub fn iter(&self) -> impl Iterator<Item = (MoverClassId, &MoverClass)> {
		self.classes
			.iter()
			.enumerate()
			.map(|(i, c)| (MoverClassId(i as u16), c))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn equal_profiles_share_an_owner() {
		let classes = vec![
			MoverClass::new("car").with_thing_cost(5, IMPASSABLE),
			MoverClass::new("truck")
				.with_thing_cost(5, IMPASSABLE)
				.with_move_ticks(20, 28),
			MoverClass::new("tank").with_size(3, 3),
			MoverClass::new("boat").with_default_terrain_impassable(),
		];
		let owners = GridOwners::compute(&classes);
		assert_eq!(owners.owner_of(MoverClassId(1)), MoverClassId(0));
		assert!(owners.is_owner(MoverClassId(0)));
		assert!(owners.is_owner(MoverClassId(2)));
		assert_eq!(owners.owners().len(), 3);
		assert_eq!(owners.slot_of(MoverClassId(3)), 2);
		assert_eq!(
			owners.piggies_of(MoverClassId(0)).collect::<Vec<_>>(),
			vec![MoverClassId(1)]
		);
	}

	#[test]
	fn overrides_take_part_in_equivalence() {
		let a = MoverClass::new("a").with_terrain_cost(3, 10);
		let b = MoverClass::new("b");
		assert_ne!(a.walkability_profile(), b.walkability_profile());

		let c = MoverClass::new("c").with_terrain_cost(3, 40);
		assert_eq!(a.walkability_profile(), c.walkability_profile());

		let d = b.clone().with_size(2, 4);
		let e = b.clone().with_size(2, 2);
		assert_eq!(d.walkability_profile(), e.walkability_profile());
	}

	#[test]
	fn footprint() {
		let class = MoverClass::new("wide").with_size(3, 1);
		assert_eq!(class.footprint_at(Cell::new(5, 5)), CellRect::new(4, 5, 6, 5));
		assert!(!class.is_square());
		assert_eq!(class.size_padding(), 1);
	}
}
