/// Options for configuring a [`PathingMap`](crate::PathingMap)
///
/// Default options:
/// ```
/// # use region_pathing::PathingConfig;
/// assert_eq!(
///     PathingConfig {
///         multithreading: true,
///         hierarchical_pathing: false,
///         full_footprint_pathing: true,
///         smoothing: true,
///         off_road_multiplier: 1.0,
///         region_size: 12,
///         region_heuristic_threshold: 100_000,
///         max_search_nodes: 160_000,
///         clean_cells_per_update: 1024,
///     },
///     Default::default()
/// );
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathingConfig {
	/// `true` (default): the [`DedicatedWorker`](crate::DedicatedWorker) of a map runs its jobs
	/// on a background thread.
	///
	/// `false`: every job is executed synchronously on the thread that enqueues it. Ordering and
	/// result handoff behave exactly the same.
	pub multithreading: bool,
	/// `true`: long searches first run a coarse A* over the Region graph and only expand Cells
	/// inside the resulting corridor of Regions.
	///
	/// `false` (default): the cell search may expand any Cell on the map.
	pub hierarchical_pathing: bool,
	/// `true` (default): movers larger than 1x1 check and pay for every Cell of their footprint.
	///
	/// `false`: only the root Cell of the footprint is considered.
	pub full_footprint_pathing: bool,
	/// `true` (default): movers with a non-square footprint pay an extra cost whenever the
	/// direction of travel changes.
	pub smoothing: bool,
	/// Multiplier applied to the step cost of non-hostile movers on Cells without a road.
	/// `1.0` (default) disables the penalty.
	pub off_road_multiplier: f32,
	/// Side length of the tile-aligned boxes that bound the flood fill of a Region (defaults to `12`)
	pub region_size: i32,
	/// Number of opened nodes after which the cell search restarts with the region-distance
	/// heuristic (defaults to `100_000`)
	pub region_heuristic_threshold: usize,
	/// Number of closed nodes after which the cell search gives up (defaults to `160_000`)
	pub max_search_nodes: usize,
	/// Number of Region Grid slots swept for stale entries per call to
	/// [`update_clean`](crate::PathingMap::update_clean) (defaults to `1024`)
	pub clean_cells_per_update: usize,
}

impl PathingConfig {
	/// an example PathingConfig that runs every job on the calling thread
	///
	/// Values:
	/// ```
	/// # use region_pathing::PathingConfig;
	/// assert_eq!(
	///     PathingConfig {
	///         multithreading: false,
	///         ..Default::default()
	///     },
	///     PathingConfig::SYNCHRONOUS
	/// );
	/// ```
	pub const SYNCHRONOUS: PathingConfig = PathingConfig {
		multithreading: false,
		..PathingConfig::DEFAULT
	};
	/// an example PathingConfig aimed at very large, open maps
	///
	/// Values:
	/// ```
	/// # use region_pathing::PathingConfig;
	/// assert_eq!(
	///     PathingConfig {
	///         hierarchical_pathing: true,
	///         full_footprint_pathing: false,
	///         ..Default::default()
	///     },
	///     PathingConfig::HIGH_PERFORMANCE
	/// );
	/// ```
	pub const HIGH_PERFORMANCE: PathingConfig = PathingConfig {
		hierarchical_pathing: true,
		full_footprint_pathing: false,
		..PathingConfig::DEFAULT
	};

	const DEFAULT: PathingConfig = PathingConfig {
		multithreading: true,
		hierarchical_pathing: false,
		full_footprint_pathing: true,
		smoothing: true,
		off_road_multiplier: 1.0,
		region_size: 12,
		region_heuristic_threshold: 100_000,
		max_search_nodes: 160_000,
		clean_cells_per_update: 1024,
	};

	/// Default options, but with the given `region_size`
	pub fn with_region_size(region_size: i32) -> PathingConfig {
		PathingConfig {
			region_size,
			..Default::default()
		}
	}
}

impl Default for PathingConfig {
	fn default() -> PathingConfig {
		PathingConfig::DEFAULT
	}
}
