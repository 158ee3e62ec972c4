use crate::host::{FactionId, MoverId, Thing, WorldMap};
use crate::path::{Cost, Path};
use crate::path_finder::{replay_cost, CancelToken, CellPathFinder};
use crate::reachability::{PathEndMode, TraverseParms};
use crate::region::{
	classify, GraphContext, OwnerGraph, RegionHandle, RegionStats, RegionType, RoomHandle,
};
use crate::utils::lock;
use crate::worker::{DedicatedWorker, PathTicket, TicketGuard};
use crate::{
	Cell, CellRect, MapSize, MoverClass, MoverClassId, MoverRegistry, NoPath, PathCostGrid,
	PathingConfig,
};

use std::sync::{Arc, Mutex};

/// A single path request
///
/// ## Examples
/// ```
/// # use region_pathing::prelude::*;
/// let request = PathRequest::new(Cell::new(0, 0), Cell::new(5, 5), MoverClassId(0))
///     .with_parms(TraverseParms::for_mover(7, Some(1)))
///     .with_end_mode(PathEndMode::Touch);
/// assert_eq!(request.dest, CellRect::single(Cell::new(5, 5)));
/// ```
#[derive(Clone, Debug)]
pub struct PathRequest {
	/// the Cell the mover stands on
	pub start: Cell,
	/// the Cells the mover wants to reach
	pub dest: CellRect,
	/// the class of the mover
	pub class: MoverClassId,
	/// who is moving and what they may pass
	pub tp: TraverseParms,
	/// when the mover counts as arrived
	pub end_mode: PathEndMode,
	/// lets the caller abort the search
	pub cancel: CancelToken,
}

impl PathRequest {
	/// A request with default [`TraverseParms`], [`PathEndMode::OnCell`] and a fresh
	/// [`CancelToken`]
	pub fn new(start: Cell, dest: impl Into<CellRect>, class: MoverClassId) -> PathRequest {
		PathRequest {
			start,
			dest: dest.into(),
			class,
			tp: TraverseParms::default(),
			end_mode: PathEndMode::OnCell,
			cancel: CancelToken::new(),
		}
	}

	/// Replaces the traverse parameters
	pub fn with_parms(mut self, tp: TraverseParms) -> PathRequest {
		self.tp = tp;
		self
	}

	/// Replaces the end mode
	pub fn with_end_mode(mut self, end_mode: PathEndMode) -> PathRequest {
		self.end_mode = end_mode;
		self
	}

	/// Replaces the cancel token
	pub fn with_cancel(mut self, cancel: CancelToken) -> PathRequest {
		self.cancel = cancel;
		self
	}
}

/// Everything the worker needs to share with the thread that owns the [`PathingMap`]
struct Shared<M: WorldMap> {
	world: Arc<M>,
	size: MapSize,
	registry: MoverRegistry,
	config: PathingConfig,
	/// one per class
	costs: Vec<PathCostGrid>,
	/// one per owner slot
	graphs: Vec<Mutex<OwnerGraph>>,
	/// idle finders, one list per class
	finders: Vec<Mutex<Vec<CellPathFinder>>>,
}

/// The pathing state of one map: a Region graph per owner class, the path costs of every
/// class and the worker that runs requests in the background.
///
/// ## Examples
/// ```
/// use region_pathing::prelude::*;
/// use std::sync::Arc;
///
/// let world = Arc::new(GridMap::open(30, 30));
/// let map = PathingMap::new(
///     world.clone(),
///     vec![MoverClass::new("walker")],
///     PathingConfig::SYNCHRONOUS,
/// );
/// let walker = MoverClassId(0);
///
/// // wall off the left third of the map
/// for z in 0..30 {
///     let rect = world.build_wall(Cell::new(10, z));
///     map.notify_thing_spawned(rect, walker);
/// }
/// assert!(!map.can_reach(Cell::new(0, 0), Cell::new(20, 0), walker, TraverseParms::default(), PathEndMode::OnCell));
///
/// let path = map
///     .find_path(&PathRequest::new(Cell::new(12, 0), Cell::new(20, 5), walker))
///     .unwrap();
/// assert_eq!(path.start(), Some(Cell::new(12, 0)));
/// assert_eq!(path.dest(), Some(Cell::new(20, 5)));
/// ```
pub struct PathingMap<M: WorldMap + 'static> {
	shared: Arc<Shared<M>>,
	worker: DedicatedWorker,
}

impl<M: WorldMap + 'static> std::fmt::Debug for PathingMap<M> {
	fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
		fmt.debug_struct("PathingMap")
			.field("size", &self.shared.size)
			.field("classes", &self.shared.registry.len())
			.field("owners", &self.shared.graphs.len())
			.field("config", &self.shared.config)
			.field("worker", &self.worker)
			.finish()
	}
}

impl<M: WorldMap + 'static> Shared<M> {
	fn class(&self, id: MoverClassId) -> Option<&MoverClass> {
		let class = self.registry.get(id);
		if class.is_none() {
			log::error!("mover class {id} is not registered on this map");
		}
		class
	}

	fn ctx<'a>(&'a self, id: MoverClassId, class: &'a MoverClass) -> GraphContext<'a> {
		GraphContext {
			world: &*self.world,
			costs: &self.costs[id.index()],
			class,
		}
	}

	fn graph_of(&self, id: MoverClassId) -> &Mutex<OwnerGraph> {
		&self.graphs[self.registry.owners().slot_of(id)]
	}

	/// Runs `f` with the Region graph used by `id`, described through the eyes of `id`
	fn with_graph<T>(
		&self,
		id: MoverClassId,
		f: impl FnOnce(&mut OwnerGraph, &GraphContext) -> T,
	) -> Option<T> {
		let class = self.class(id)?;
		let ctx = self.ctx(id, class);
		let mut graph = lock(self.graph_of(id));
		Some(f(&mut graph, &ctx))
	}

	fn rebuild_owner(&self, owner: MoverClassId) {
		self.with_graph(owner, |graph, ctx| graph.rebuild_all(ctx));
	}

	#[cfg(feature = "parallel")]
	fn rebuild_owners_parallel(&self, owners: &[MoverClassId]) {
		use rayon::prelude::*;
		owners
			.par_iter()
			.for_each(|&owner| self.rebuild_owner(owner));
	}

	#[cfg(not(feature = "parallel"))]
	fn rebuild_owners_parallel(&self, owners: &[MoverClassId]) {
		for &owner in owners {
			self.rebuild_owner(owner);
		}
	}

	fn find_path(&self, request: &PathRequest) -> Result<Path, NoPath> {
		let class = self
			.class(request.class)
			.ok_or(NoPath::WrongMoverClass(request.class))?;
		let ctx = self.ctx(request.class, class);
		let pool = &self.finders[request.class.index()];
		let mut finder = lock(pool)
			.pop()
			.unwrap_or_else(|| CellPathFinder::new(request.class, self.size));

		let result = {
			let mut graph = lock(self.graph_of(request.class));
			finder.find_path(
				&mut graph,
				&ctx,
				&self.config,
				request.class,
				request.start,
				request.dest,
				&request.tp,
				request.end_mode,
				&request.cancel,
			)
		};
		lock(pool).push(finder);
		result
	}

	/// Recomputes the costs of every class sharing the graph of `owner` and invalidates the
	/// Regions around `cell` if its walkability or Region type changed
	fn cell_changed(&self, owner: MoverClassId, cell: Cell) {
		let mut things = vec![];
		let mut flipped = false;
		for member in self.registry.owners().members_of(owner) {
			let Some(class) = self.registry.get(member) else {
				continue;
			};
			let changed = self.costs[member.index()].recompute_at(&*self.world, class, cell, &mut things);
			if member == owner {
				flipped = changed;
			}
		}

		self.with_graph(owner, |graph, ctx| {
			graph.reachability.clear();
			if !graph.enabled {
				return;
			}
			let current = graph
				.valid_region_at_no_rebuild(cell)
				.map_or(RegionType::None, |r| graph.regions[r].region_type);
			let expected = classify(ctx, cell, &mut things);
			if flipped || current != expected {
				graph.notify_walkability_changed(cell, expected != RegionType::None);
			}
		});
	}

	fn recompute_rect(&self, owner: MoverClassId, rect: CellRect) {
		let rect = rect.clipped_to(self.size);
		let mut things = vec![];
		for member in self.registry.owners().members_of(owner) {
			let Some(class) = self.registry.get(member) else {
				continue;
			};
			for cell in rect.cells() {
				self.costs[member.index()].recompute_at(&*self.world, class, cell, &mut things);
			}
		}
	}

	fn thing_spawned(&self, owner: MoverClassId, rect: CellRect) {
		self.recompute_rect(owner, rect);
		self.with_graph(owner, |graph, _| graph.notify_thing_spawned(rect));
	}

	fn thing_despawned(&self, owner: MoverClassId, rect: CellRect) {
		self.recompute_rect(owner, rect);
		let padding = self
			.registry
			.owners()
			.members_of(owner)
			.filter_map(|m| self.registry.get(m))
			.map(MoverClass::size_padding)
			.max()
			.unwrap_or(0);
		self.with_graph(owner, |graph, _| graph.notify_thing_despawned(rect, padding));
	}

	fn owner_of(&self, class: MoverClassId) -> Option<MoverClassId> {
		self.class(class)?;
		Some(self.registry.owners().owner_of(class))
	}
}

impl<M: WorldMap + 'static> PathingMap<M> {
	/// Registers `classes` on `world` and builds the Region graph of every owner.
	///
	/// Classes get their [`MoverClassId`] from their position in `classes`.
	///
	/// ## Panics
	/// if `config.region_size` is not positive or more than `u16::MAX` classes are given
	pub fn new(world: Arc<M>, classes: Vec<MoverClass>, config: PathingConfig) -> PathingMap<M> {
		let size = world.size();
		let registry = MoverRegistry::new(classes);

		let costs: Vec<PathCostGrid> = registry
			.iter()
			.map(|(_, class)| {
				let grid = PathCostGrid::new(size);
				grid.recompute_all(&*world, class);
				grid
			})
			.collect();
		let graphs = registry
			.owners()
			.owners()
			.iter()
			.map(|&owner| {
				let uses_regions = registry.get(owner).map_or(false, |c| c.uses_regions);
				Mutex::new(OwnerGraph::new(owner, size, config.region_size, uses_regions))
			})
			.collect();
		let finders = registry.iter().map(|_| Mutex::new(vec![])).collect();
		log::debug!(
			"pathing map {}x{}: {} classes, {} owners",
			size.width,
			size.height,
			registry.len(),
			registry.owners().owners().len()
		);

		let worker = DedicatedWorker::new(
			&format!("{}x{}", size.width, size.height),
			config.multithreading,
		);
		let map = PathingMap {
			shared: Arc::new(Shared {
				world,
				size,
				registry,
				config,
				costs,
				graphs,
				finders,
			}),
			worker,
		};
		map.rebuild_all_regions();
		map
	}

	/// The world this map reads from
	pub fn world(&self) -> &Arc<M> {
		&self.shared.world
	}

	/// The options given at creation
	pub fn config(&self) -> &PathingConfig {
		&self.shared.config
	}

	/// The registered classes and their owners
	pub fn registry(&self) -> &MoverRegistry {
		&self.shared.registry
	}

	/// The class whose Region graph `class` uses, `None` for unknown classes
	pub fn owner_of(&self, class: MoverClassId) -> Option<MoverClassId> {
		self.shared.owner_of(class)
	}

	/// The current path cost of a Cell for a class
	pub fn path_cost_at(&self, cell: Cell, class: MoverClassId) -> Option<u32> {
		self.shared.class(class)?;
		self.shared
			.size
			.in_bounds(cell)
			.then(|| self.shared.costs[class.index()].cost(cell))
	}

	/// Finds a path on the calling thread.
	///
	/// Requests of classes that share an owner are serialized. Requests of different owners can
	/// run in parallel.
	pub fn find_path(&self, request: &PathRequest) -> Result<Path, NoPath> {
		self.shared.find_path(request)
	}

	/// Queues a path request on the worker of this map.
	///
	/// Requests run in the order they were made, after every job queued before them.
	pub fn request_path(&self, request: PathRequest) -> PathTicket {
		let ticket = PathTicket::new();
		let guard = TicketGuard(ticket.clone());
		let shared = self.shared.clone();
		self.worker.enqueue(move || {
			let result = shared.find_path(&request);
			guard.0.fulfill(result);
		});
		ticket
	}

	/// Queues a rebuild of the entire Region graph used by `class`. Returns `false` if the class
	/// is unknown or the worker is gone.
	pub fn request_rebuild(&self, class: MoverClassId) -> bool {
		let Some(owner) = self.shared.owner_of(class) else {
			return false;
		};
		let shared = self.shared.clone();
		self.worker.enqueue(move || shared.rebuild_owner(owner))
	}

	/// Queues any action on the worker of this map, ordered with path requests and rebuilds
	pub fn run_on_worker(&self, job: impl FnOnce() + Send + 'static) -> bool {
		self.worker.enqueue(job)
	}

	/// `true` if a mover of `class` with `tp` standing on `start` can arrive at `dest`
	pub fn can_reach(
		&self,
		start: Cell,
		dest: impl Into<CellRect>,
		class: MoverClassId,
		tp: TraverseParms,
		end_mode: PathEndMode,
	) -> bool {
		let dest = dest.into();
		self.shared
			.with_graph(class, |graph, ctx| {
				graph.can_reach(ctx, start, dest, end_mode, &tp)
			})
			.unwrap_or(false)
	}

	/// Reports that something on `cell` changed for `class` (and every class sharing its graph)
	pub fn notify_cell_changed(&self, cell: Cell, class: MoverClassId) {
		if !self.shared.size.in_bounds(cell) {
			log::error!("change notification for {cell}, which is out of bounds");
			return;
		}
		if let Some(owner) = self.shared.owner_of(class) {
			self.shared.cell_changed(owner, cell);
		}
	}

	/// Reports that something on `cell` changed for every class
	pub fn notify_cell_changed_all(&self, cell: Cell) {
		if !self.shared.size.in_bounds(cell) {
			log::error!("change notification for {cell}, which is out of bounds");
			return;
		}
		for &owner in self.shared.registry.owners().owners() {
			self.shared.cell_changed(owner, cell);
		}
	}

	/// Reports that a Thing now occupies `rect`
	pub fn notify_thing_spawned(&self, rect: CellRect, class: MoverClassId) {
		if let Some(owner) = self.shared.owner_of(class) {
			self.shared.thing_spawned(owner, rect);
		}
	}

	/// Reports that a Thing now occupies `rect`, for every class
	pub fn notify_thing_spawned_all(&self, rect: CellRect) {
		for &owner in self.shared.registry.owners().owners() {
			self.shared.thing_spawned(owner, rect);
		}
	}

	/// Reports that a Thing no longer occupies `rect`
	pub fn notify_thing_despawned(&self, rect: CellRect, class: MoverClassId) {
		if let Some(owner) = self.shared.owner_of(class) {
			self.shared.thing_despawned(owner, rect);
		}
	}

	/// Reports that a Thing no longer occupies `rect`, for every class
	pub fn notify_thing_despawned_all(&self, rect: CellRect) {
		for &owner in self.shared.registry.owners().owners() {
			self.shared.thing_despawned(owner, rect);
		}
	}

	/// The Region at `cell` for `class`, after processing pending changes
	pub fn region_at(&self, cell: Cell, class: MoverClassId) -> Option<RegionHandle> {
		self.shared
			.with_graph(class, |graph, ctx| {
				let region = graph.valid_region_at(ctx, cell)?;
				Some(graph.region_handle(region))
			})
			.flatten()
	}

	/// The Room at `cell` for `class`, after processing pending changes
	pub fn room_at(&self, cell: Cell, class: MoverClassId) -> Option<RoomHandle> {
		self.shared
			.with_graph(class, |graph, ctx| {
				graph.rebuild_if_needed(ctx);
				let room = graph.room_at_no_rebuild(cell)?;
				Some(graph.room_handle(room))
			})
			.flatten()
	}

	/// `true` if the Room at `cell` touches the edge of the map, `None` without a Room
	pub fn room_touches_map_edge(&self, cell: Cell, class: MoverClassId) -> Option<bool> {
		self.shared
			.with_graph(class, |graph, ctx| {
				graph.rebuild_if_needed(ctx);
				let room = graph.room_at_no_rebuild(cell)?;
				Some(graph.rooms[room].touches_map_edge)
			})
			.flatten()
	}

	/// Records `mover` as a visitor of the Room at `cell`. Returns `false` without a Room.
	pub fn add_room_visitor(&self, cell: Cell, class: MoverClassId, mover: MoverId) -> bool {
		self.shared
			.with_graph(class, |graph, ctx| {
				graph.rebuild_if_needed(ctx);
				match graph.room_at_no_rebuild(cell) {
					Some(room) => {
						graph.rooms[room].add_visitor(mover);
						true
					}
					None => false,
				}
			})
			.unwrap_or(false)
	}

	/// Removes `mover` from the visitors of the Room at `cell`
	pub fn remove_room_visitor(&self, cell: Cell, class: MoverClassId, mover: MoverId) {
		self.shared.with_graph(class, |graph, ctx| {
			graph.rebuild_if_needed(ctx);
			if let Some(room) = graph.room_at_no_rebuild(cell) {
				graph.rooms[room].remove_visitor(mover);
			}
		});
	}

	/// The visitors of the Room at `cell`
	pub fn room_visitors(&self, cell: Cell, class: MoverClassId) -> Vec<MoverId> {
		self.shared
			.with_graph(class, |graph, ctx| {
				graph.rebuild_if_needed(ctx);
				graph
					.room_at_no_rebuild(cell)
					.map(|room| graph.rooms[room].visitors.clone())
					.unwrap_or_default()
			})
			.unwrap_or_default()
	}

	/// Every Thing on or next to the Region at `cell`, each listed once
	pub fn things_in_region(&self, cell: Cell, class: MoverClassId) -> Vec<Thing> {
		self.shared
			.with_graph(class, |graph, ctx| {
				let mut things = vec![];
				if let Some(region) = graph.valid_region_at(ctx, cell) {
					graph.things_in_region(ctx, region, &mut things);
				}
				things
			})
			.unwrap_or_default()
	}

	/// Releases a slice of the Region Grid slots that still point at invalidated Regions.
	///
	/// Meant to be called once per simulation tick.
	pub fn update_clean(&self) {
		let budget = self.shared.config.clean_cells_per_update;
		for graph in &self.shared.graphs {
			lock(graph).update_clean(budget);
		}
	}

	/// Throws away and rebuilds the Region graph of every owner on the calling thread.
	///
	/// With feature `parallel`, maps with three or more owners build their graphs in parallel.
	pub fn rebuild_all_regions(&self) {
		let owners = self.shared.registry.owners().owners();
		if owners.len() >= 3 {
			self.shared.rebuild_owners_parallel(owners);
		} else {
			for &owner in owners {
				self.shared.rebuild_owner(owner);
			}
		}
	}

	/// How often the Region graph used by `class` was built from scratch
	pub fn region_build_count(&self, class: MoverClassId) -> usize {
		self.shared
			.with_graph(class, |graph, _| graph.build_count)
			.unwrap_or(0)
	}

	/// Size of the Region graph used by `class`, without processing pending changes
	pub fn region_stats(&self, class: MoverClassId) -> Option<RegionStats> {
		self.shared.with_graph(class, |graph, _| graph.stats())
	}

	/// Processes pending changes, then verifies the partition of the map into Regions, the
	/// symmetry of links and the membership of Rooms
	pub fn check_consistency(&self, class: MoverClassId) -> Result<(), String> {
		self.shared
			.with_graph(class, |graph, ctx| {
				graph.rebuild_if_needed(ctx);
				graph.check_consistency(ctx)
			})
			.unwrap_or_else(|| Err(format!("mover class {class} is not registered")))
	}

	/// Replays the cost of walking along `path` with the current state of the map.
	///
	/// `None` if a step of the path is no longer possible.
	pub fn path_cost_of(&self, class: MoverClassId, path: &Path, tp: &TraverseParms) -> Option<Cost> {
		let class_def = self.shared.class(class)?;
		let ctx = self.shared.ctx(class, class_def);
		replay_cost(&ctx, &self.shared.config, tp, path.cells(), &mut vec![])
	}

	/// Forgets every cached reachability answer
	pub fn clear_reachability_cache(&self) {
		for graph in &self.shared.graphs {
			lock(graph).reachability.clear();
		}
	}

	/// Forgets the cached reachability answers of `mover`
	pub fn clear_reachability_for_mover(&self, mover: MoverId) {
		for graph in &self.shared.graphs {
			lock(graph).reachability.clear_for_mover(mover);
		}
	}

	/// Forgets the cached reachability answers of movers of `faction`
	pub fn clear_reachability_for_faction(&self, faction: FactionId) {
		for graph in &self.shared.graphs {
			lock(graph).reachability.clear_for_faction(faction);
		}
	}
}
