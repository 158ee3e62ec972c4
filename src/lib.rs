#![warn(
	missing_docs,
	missing_debug_implementations,
	trivial_casts,
	trivial_numeric_casts,
	unsafe_code,
	unstable_features,
	unused_import_braces,
	unused_qualifications
)]

//! Incremental Region graphs, reachability checks and Region-accelerated A* for many kinds of
//! movers on a shared, changing Grid.
//!
//! ## Introduction
//! Running a plain A* for every mover on a large Grid is expensive, and most of that expense is
//! wasted on requests that can never succeed. This crate keeps a coarse description of the map
//! around to avoid that work: every Cell a mover can stand on is flood-filled into a **Region**
//! (bounded by tile-aligned boxes and by doors and fences), neighboring Regions share **links**,
//! and contiguous Regions form **Rooms**.
//!
//! That graph is small enough to answer "can this mover get there at all" with a breadth-first
//! search over links, and the answers are cached per pair of Rooms. The cell search itself starts
//! out as a regular A* with an octile heuristic. Only if it has to open a large number of nodes
//! does it switch to a heuristic derived from the Region graph, which knows about walls and
//! detours that a straight-line estimate cannot see.
//!
//! Different movers see the world differently: a boat cannot enter land, a large vehicle cannot
//! squeeze through gaps, a digger walks through walls. Each kind of mover is described by a
//! [`MoverClass`]. Classes that see the world identically share a single Region graph, owned by
//! the first of them.
//!
//! When the world changes, only the Regions around the change are marked dirty. They are rebuilt
//! in one pass on the next read, and Rooms keep their identity unless they are actually merged or
//! split.
//!
//! ## Examples
//! Creating the map:
//! ```
//! use region_pathing::prelude::*;
//! use std::sync::Arc;
//!
//! // any type implementing WorldMap will do, GridMap is a simple in-memory one
//! let world = Arc::new(GridMap::open(40, 40));
//!
//! let map = PathingMap::new(
//!     world.clone(),
//!     vec![
//!         MoverClass::new("walker"),
//!         MoverClass::new("cart").with_size(3, 1),
//!     ],
//!     PathingConfig::SYNCHRONOUS,
//! );
//! let walker = MoverClassId(0);
//! # assert!(map.region_at(Cell::new(0, 0), walker).is_some());
//! ```
//!
//! ### Pathfinding
//! ```
//! # use region_pathing::prelude::*;
//! # use std::sync::Arc;
//! # let world = Arc::new(GridMap::open(40, 40));
//! # let map = PathingMap::new(world.clone(), vec![MoverClass::new("walker")], PathingConfig::SYNCHRONOUS);
//! # let walker = MoverClassId(0);
//! let request = PathRequest::new(Cell::new(0, 0), Cell::new(30, 12), walker);
//!
//! // synchronously, on the calling thread
//! let path = map.find_path(&request).unwrap();
//! assert_eq!(path.start(), Some(Cell::new(0, 0)));
//! assert_eq!(path.dest(), Some(Cell::new(30, 12)));
//!
//! // or queued on the worker of the map
//! let ticket = map.request_path(request);
//! assert_eq!(ticket.wait().map(|p| p.cost()), Ok(path.cost()));
//! ```
//!
//! ### Updating the map
//! The map never watches the world by itself. Every change has to be reported:
//! ```
//! # use region_pathing::prelude::*;
//! # use std::sync::Arc;
//! # let world = Arc::new(GridMap::open(40, 40));
//! # let map = PathingMap::new(world.clone(), vec![MoverClass::new("walker")], PathingConfig::SYNCHRONOUS);
//! # let walker = MoverClassId(0);
//! for z in 0..40 {
//!     let rect = world.build_wall(Cell::new(20, z));
//!     map.notify_thing_spawned_all(rect);
//! }
//! let reachable = map.can_reach(
//!     Cell::new(0, 0),
//!     Cell::new(30, 12),
//!     walker,
//!     TraverseParms::default(),
//!     PathEndMode::OnCell,
//! );
//! assert!(!reachable);
//! assert_eq!(
//!     map.find_path(&PathRequest::new(Cell::new(0, 0), Cell::new(30, 12), walker)),
//!     Err(NoPath::Unreachable)
//! );
//! ```
//!
//! ### Configuration
//! The last parameter of [`PathingMap::new`] is a [`PathingConfig`]. The presets
//! [`PathingConfig::SYNCHRONOUS`] and [`PathingConfig::HIGH_PERFORMANCE`] cover the common setups.
//! ```
//! use region_pathing::PathingConfig;
//!
//! let config = PathingConfig {
//!     region_size: 8,
//!     ..PathingConfig::HIGH_PERFORMANCE
//! };
//! assert!(config.hierarchical_pathing);
//! ```

mod cell;
mod config;
mod error;
pub mod host;
mod mover;
mod path;
mod path_cost;
mod path_finder;
mod pathing_map;
mod reachability;
mod region;
mod search;
mod utils;
mod worker;

pub use self::cell::{octile_distance, Cell, CellRect, Dir, MapSize, ADJACENT_8};
pub use self::config::PathingConfig;
pub use self::error::{NoPath, RegionBuildError};
pub use self::mover::{GridOwners, MoverClass, MoverClassId, MoverRegistry};
pub use self::path::{Cost, Path};
pub use self::path_cost::{PathCostGrid, IMPASSABLE, MAX_SNOW_COST};
pub use self::path_finder::CancelToken;
pub use self::pathing_map::{PathRequest, PathingMap};
pub use self::reachability::{PathEndMode, TraverseMode, TraverseParms};
pub use self::region::{RegionHandle, RegionStats, RegionType, RoomHandle};
pub use self::worker::{DedicatedWorker, PathTicket};

/// The types needed in almost every use of this crate
pub mod prelude {
	pub use crate::host::{GridMap, WorldMap};
	pub use crate::{
		Cell, CellRect, MapSize, MoverClass, MoverClassId, NoPath, Path, PathEndMode,
		PathRequest, PathingConfig, PathingMap, TraverseMode, TraverseParms,
	};
}
