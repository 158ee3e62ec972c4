use super::GraphContext;
use crate::host::Thing;
use crate::Cell;

/// The topological classification of a Cell, and of the Region built from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegionType {
	/// no Region at all (solid rock, walls, out of bounds)
	None,
	/// blocks movement, but not air. No mover ever enters these Regions.
	ImpassableFreeAir,
	/// ordinary walkable ground
	Normal,
	/// a door. Always a single Cell.
	Portal,
	/// a fence. Always a single Cell.
	Fence,
}

impl RegionType {
	/// `true` if movers may enter Regions of this type
	pub fn passable(self) -> bool {
		matches!(self, RegionType::Normal | RegionType::Portal | RegionType::Fence)
	}

	/// `true` if several Regions of this type can be grouped into one Room
	pub fn allows_multiple_regions_per_room(self) -> bool {
		matches!(self, RegionType::Normal | RegionType::ImpassableFreeAir)
	}

	/// `true` for types whose Regions never grow beyond their seed Cell
	pub fn is_one_cell(self) -> bool {
		matches!(self, RegionType::Portal | RegionType::Fence)
	}
}

/// Classifies a single Cell for the class of `ctx`.
///
/// Has no side effects and only performs Cell lookups.
pub(crate) fn classify(ctx: &GraphContext, cell: Cell, things: &mut Vec<Thing>) -> RegionType {
	let world = ctx.world;
	if !world.size().in_bounds(cell) {
		return RegionType::None;
	}
	if world.door_at(cell).is_some() {
		return RegionType::Portal;
	}
	if world.fence_at(cell) {
		return RegionType::Fence;
	}
	if ctx.costs.walkable(cell) {
		return RegionType::Normal;
	}
	things.clear();
	world.things_at(cell, things);
	if things.iter().any(|t| t.fills_cell) {
		RegionType::None
	} else {
		RegionType::ImpassableFreeAir
	}
}
