use crate::host::{Danger, Door, FactionId, MoverId};
use crate::{CellRect, PathCostGrid};

/// How a mover deals with doors and obstacles
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TraverseMode {
	/// passes the doors its faction may open
	ByMover,
	/// passes every door
	PassDoors,
	/// only passes open doors
	NoPassClosedDoors,
	/// breaks through every destroyable obstacle on the way
	PassAllDestroyableThings,
}

impl TraverseMode {
	/// `true` if movers may break through obstacles. Regions cannot model this.
	pub fn can_destroy(self) -> bool {
		self == TraverseMode::PassAllDestroyableThings
	}
}

/// Who is moving and what they are allowed to pass.
///
/// Part of the key of the reachability cache, so two parameter sets that differ in any field
/// never share a cached answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TraverseParms {
	/// the individual mover, if any. Used for avoid costs and to ignore the mover's own body.
	pub mover: Option<MoverId>,
	/// the faction of the mover, deciding which doors it may open
	pub faction: Option<FactionId>,
	/// door and obstacle policy
	pub mode: TraverseMode,
	/// the most dangerous area the mover is willing to cross
	pub max_danger: Danger,
	/// `true` if fences stop the mover (animals)
	pub fence_blocked: bool,
	/// `true` if the mover may break through fences that would block it
	pub can_bash_fences: bool,
	/// `true` for movers hostile to the map's owners. Hostile movers ignore road preferences.
	pub hostile: bool,
}

impl TraverseParms {
	/// Parameters for an individual mover of `faction` that respects door ownership
	pub fn for_mover(mover: MoverId, faction: Option<FactionId>) -> TraverseParms {
		TraverseParms {
			mover: Some(mover),
			faction,
			..TraverseParms::with_mode(TraverseMode::ByMover)
		}
	}

	/// Parameters without a specific mover
	///
	/// ```
	/// # use region_pathing::{TraverseMode, TraverseParms};
	/// # use region_pathing::host::Danger;
	/// let tp = TraverseParms::with_mode(TraverseMode::NoPassClosedDoors);
	/// assert_eq!(tp.mover, None);
	/// assert_eq!(tp.max_danger, Danger::Deadly);
	/// assert!(!tp.fence_blocked);
	/// ```
	pub fn with_mode(mode: TraverseMode) -> TraverseParms {
		TraverseParms {
			mover: None,
			faction: None,
			mode,
			max_danger: Danger::Deadly,
			fence_blocked: false,
			can_bash_fences: false,
			hostile: false,
		}
	}

	/// Avoids areas more dangerous than `max_danger`
	pub fn max_danger(mut self, max_danger: Danger) -> TraverseParms {
		self.max_danger = max_danger;
		self
	}

	/// Makes fences block the mover
	pub fn fence_blocked(mut self) -> TraverseParms {
		self.fence_blocked = true;
		self
	}

	/// Marks the mover as hostile
	pub fn hostile(mut self) -> TraverseParms {
		self.hostile = true;
		self
	}

	/// `true` if the mover may cross fences
	pub fn allows_fences(&self) -> bool {
		!self.fence_blocked || self.can_bash_fences
	}

	/// `true` if the mover may walk through `door` without breaking it
	pub fn can_pass_door(&self, door: &Door) -> bool {
		match self.mode {
			TraverseMode::ByMover => door.can_pass(self.faction),
			TraverseMode::PassDoors | TraverseMode::PassAllDestroyableThings => true,
			TraverseMode::NoPassClosedDoors => door.open,
		}
	}
}

impl Default for TraverseParms {
	fn default() -> TraverseParms {
		TraverseParms::with_mode(TraverseMode::PassDoors)
	}
}

/// When a search counts as arrived
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PathEndMode {
	/// standing on a Cell of the destination
	#[default]
	OnCell,
	/// standing on or next to the destination
	Touch,
	/// [`OnCell`](PathEndMode::OnCell) for a single walkable Cell, [`Touch`](PathEndMode::Touch)
	/// for everything else
	ClosestTouch,
}

impl PathEndMode {
	/// Replaces [`ClosestTouch`](PathEndMode::ClosestTouch) with the mode it stands for
	pub(crate) fn resolve(self, costs: &PathCostGrid, dest: CellRect) -> PathEndMode {
		match self {
			PathEndMode::ClosestTouch => {
				let single = dest.width() == 1 && dest.height() == 1;
				if single && costs.walkable(dest.center_cell()) {
					PathEndMode::OnCell
				} else {
					PathEndMode::Touch
				}
			}
			other => other,
		}
	}

	/// The Cells a mover may end up on. Must be called on a resolved mode.
	pub(crate) fn end_area(self, dest: CellRect) -> CellRect {
		match self {
			PathEndMode::OnCell => dest,
			PathEndMode::Touch | PathEndMode::ClosestTouch => dest.expanded_by(1),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::host::{GridMap, WorldMap};
	use crate::{Cell, MoverClass};

	#[test]
	fn door_policies() {
		let mut door = Door::new(false);
		door.faction = Some(1);
		assert!(TraverseParms::for_mover(0, Some(1)).can_pass_door(&door));
		assert!(!TraverseParms::for_mover(0, Some(2)).can_pass_door(&door));
		assert!(TraverseParms::with_mode(TraverseMode::PassDoors).can_pass_door(&door));
		assert!(!TraverseParms::with_mode(TraverseMode::NoPassClosedDoors).can_pass_door(&door));
		door.open = true;
		assert!(TraverseParms::with_mode(TraverseMode::NoPassClosedDoors).can_pass_door(&door));
		assert!(TraverseParms::for_mover(0, Some(2)).can_pass_door(&door));
	}

	#[test]
	fn closest_touch_resolution() {
		let world = GridMap::open(4, 4);
		world.build_wall(Cell::new(2, 2));
		let costs = PathCostGrid::new(world.size());
		costs.recompute_all(&world, &MoverClass::new("walker"));

		let open = CellRect::single(Cell::new(1, 1));
		let wall = CellRect::single(Cell::new(2, 2));
		let area = CellRect::new(0, 0, 1, 1);
		let mode = PathEndMode::ClosestTouch;
		assert_eq!(mode.resolve(&costs, open), PathEndMode::OnCell);
		assert_eq!(mode.resolve(&costs, wall), PathEndMode::Touch);
		assert_eq!(mode.resolve(&costs, area), PathEndMode::Touch);
		assert_eq!(PathEndMode::Touch.end_area(wall), CellRect::new(1, 1, 3, 3));
	}
}
