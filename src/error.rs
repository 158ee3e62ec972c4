//! Failure values returned across the public API.
//!
//! Precondition violations and search exhaustion are ordinary return values. They are logged at
//! the point where they are detected (errors for violated preconditions, warnings for exhausted
//! searches) and never unwind through the search loops.

use crate::{Cell, MoverClassId};
use thiserror::Error;

/// Why a path request did not produce a [`Path`](crate::Path)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NoPath {
	/// The start or destination is not on the map
	#[error("{0} is out of bounds")]
	OutOfBounds(Cell),
	/// The mover class is not registered on this map, or the finder was built for another one
	#[error("mover class {0:?} does not belong to this map")]
	WrongMoverClass(MoverClassId),
	/// The start Cell cannot be stood on by the mover
	#[error("start {0} is impassable")]
	StartImpassable(Cell),
	/// The destination is in a different, disconnected part of the map
	#[error("destination is unreachable")]
	Unreachable,
	/// Every reachable Cell was expanded without satisfying the destination
	#[error("search exhausted the open list")]
	Exhausted,
	/// The search closed more nodes than it is allowed to
	#[error("search hit the limit of {0} nodes")]
	NodeLimit(usize),
	/// The caller cancelled the search
	#[error("search was cancelled")]
	Cancelled,
	/// The finder was entered while it was already running a search
	#[error("path finder is already running a search")]
	Reentrant,
	/// The worker shut down before the request was processed
	#[error("worker is shut down")]
	WorkerGone,
}

impl NoPath {
	/// `true` for outcomes that indicate a bug or misuse by the caller, as opposed to a search
	/// that simply found nothing.
	pub fn is_precondition_violation(&self) -> bool {
		matches!(
			self,
			NoPath::OutOfBounds(_) | NoPath::WrongMoverClass(_) | NoPath::Reentrant
		)
	}
}

/// Internal faults while building a Region. The builder logs them together with the last step it
/// completed and leaves no partial Region behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegionBuildError {
	/// The builder was entered while it was already building a Region
	#[error("region builder is already working")]
	Reentrant,
	/// A Region tried to register itself on a link it already owns
	#[error("region is already registered on the link at {0}")]
	DoubleRegistration(Cell),
	/// A third Region tried to register itself on a link
	#[error("link at {0} already has two regions")]
	LinkFull(Cell),
	/// The flood fill claimed a Cell that still belongs to a valid Region
	#[error("cell {0} already belongs to a valid region")]
	CellClaimed(Cell),
}
