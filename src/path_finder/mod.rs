//! The cell level A* that produces every [`Path`].
//!
//! A [`CellPathFinder`] owns the per-search scratch state of one map size and is reused for many
//! searches on the same thread. Searches start with a scaled octile heuristic. Once a search has
//! opened more than [`region_heuristic_threshold`](crate::PathingConfig::region_heuristic_threshold)
//! nodes it starts over with a heuristic derived from the Region graph, which knows about walls
//! the octile distance cannot see.

mod cancel;
mod heuristic;
mod node_grid;
mod transition;

pub use self::cancel::CancelToken;

use self::heuristic::Heuristic;
use self::node_grid::{NodeGrid, NO_PARENT};
use self::transition::transition_cost;
use crate::host::Thing;
use crate::path::{Cost, Path};
use crate::reachability::{PathEndMode, TraverseParms};
use crate::region::{GraphContext, IdSet, OwnerGraph, RebuildState};
use crate::search::{chunk_corridor, HeuristicElement, RegionCostCalculator};
use crate::{Cell, CellRect, MapSize, MoverClassId, NoPath, PathingConfig, ADJACENT_8};

use std::collections::BinaryHeap;

/// Reusable cell search for one mover class on one map
#[derive(Debug)]
pub(crate) struct CellPathFinder {
	class: MoverClassId,
	size: MapSize,
	nodes: NodeGrid,
	open_list: BinaryHeap<HeuristicElement<usize>>,
	things: Vec<Thing>,
}

/// Everything a single search needs that stays fixed while it runs
struct Search<'a, 'c> {
	graph: &'a OwnerGraph,
	ctx: &'a GraphContext<'c>,
	config: &'a PathingConfig,
	tp: &'a TraverseParms,
	cancel: &'a CancelToken,
	start: Cell,
	end_area: CellRect,
	corridor: Option<&'a IdSet<usize>>,
}

impl CellPathFinder {
	pub fn new(class: MoverClassId, size: MapSize) -> CellPathFinder {
		CellPathFinder {
			class,
			size,
			nodes: NodeGrid::new(size.num_cells()),
			open_list: BinaryHeap::new(),
			things: vec![],
		}
	}

	/// Finds the cheapest path from `start` to `dest` for the class of this finder.
	///
	/// `graph` must be the Region graph of the class's owner and `ctx` must describe the class
	/// itself. Unless `tp` allows breaking through obstacles, the destination is first checked for
	/// reachability on the Region graph.
	#[allow(clippy::too_many_arguments)]
	pub fn find_path(
		&mut self,
		graph: &mut OwnerGraph,
		ctx: &GraphContext,
		config: &PathingConfig,
		class: MoverClassId,
		start: Cell,
		dest: CellRect,
		tp: &TraverseParms,
		end_mode: PathEndMode,
		cancel: &CancelToken,
	) -> Result<Path, NoPath> {
		if class != self.class || ctx.costs.size() != self.size {
			log::error!(
				"path finder of {} ({}x{}) was asked to search for {}",
				self.class,
				self.size.width,
				self.size.height,
				class
			);
			return Err(NoPath::WrongMoverClass(class));
		}
		if !self.size.in_bounds(start) {
			log::error!("path request for {} starts out of bounds at {start}", ctx.class.name);
			return Err(NoPath::OutOfBounds(start));
		}
		if dest.clipped_to(self.size).is_empty() {
			log::error!("path request for {} ends out of bounds at {dest}", ctx.class.name);
			return Err(NoPath::OutOfBounds(dest.center_cell()));
		}
		if graph.reach_working || graph.state == RebuildState::Rebuilding {
			log::error!(
				"path request for {} from {start} to {dest} while its region graph is busy",
				ctx.class.name
			);
			return Err(NoPath::Reentrant);
		}

		let destroy = tp.mode.can_destroy();
		if destroy {
			graph.rebuild_if_needed(ctx);
		} else if !graph.can_reach(ctx, start, dest, end_mode, tp) {
			log::debug!("{dest} is unreachable from {start} for {}", ctx.class.name);
			return Err(NoPath::Unreachable);
		}
		let end_area = end_mode.resolve(ctx.costs, dest).end_area(dest);

		let graph: &OwnerGraph = graph;
		let corridor = if config.hierarchical_pathing && graph.enabled && !destroy {
			chunk_corridor(graph, ctx, start, end_area, tp)
		} else {
			None
		};

		let mut search = Search {
			graph,
			ctx,
			config,
			tp,
			cancel,
			start,
			end_area,
			corridor: corridor.as_ref(),
		};
		let result = self.search(&search);
		match result {
			Err(NoPath::Exhausted | NoPath::NodeLimit(_)) if search.corridor.is_some() => {
				log::warn!(
					"search from {start} to {dest} failed inside its corridor, retrying without"
				);
				search.corridor = None;
				self.search(&search)
			}
			other => other,
		}
	}

	fn search(&mut self, s: &Search) -> Result<Path, NoPath> {
		let size = self.size;
		let class = s.ctx.class;
		let ticks = (class.move_ticks_cardinal, class.move_ticks_diagonal);
		let can_escalate = s.graph.enabled && !s.tp.mode.can_destroy();
		let start_index = size.index_of(s.start);
		let mut heuristic = Heuristic::octile(s.start, s.end_area, ticks);

		'restart: loop {
			self.nodes.next_search();
			self.open_list.clear();
			let mut opened = 1;
			let mut closed = 0;

			let h = heuristic.estimate(s.graph, s.ctx, s.start, s.end_area, 0);
			self.nodes.open(start_index, 0, h, NO_PARENT);
			self.open_list.push(HeuristicElement(start_index, 0, h));

			while let Some(HeuristicElement(index, cost, _)) = self.open_list.pop() {
				if s.cancel.is_cancelled() {
					log::debug!("search from {} was cancelled after {closed} nodes", s.start);
					return Err(NoPath::Cancelled);
				}
				let node = *self.nodes.get(index);
				if self.nodes.is_closed(index) || cost != node.known_cost {
					continue;
				}
				let cell = size.cell_at(index);
				if s.end_area.contains(cell) {
					log::trace!(
						"search from {} to {} closed {closed} of {opened} opened nodes",
						s.start,
						s.end_area
					);
					return self.build_path(s, index);
				}

				self.nodes.close(index);
				closed += 1;
				if closed > s.config.max_search_nodes {
					log::warn!(
						"search from {} to {} for {} hit the limit of {} nodes",
						s.start,
						s.end_area,
						class.name,
						s.config.max_search_nodes
					);
					return Err(NoPath::NodeLimit(s.config.max_search_nodes));
				}
				if can_escalate
					&& !heuristic.is_region_based()
					&& opened > s.config.region_heuristic_threshold
				{
					log::warn!(
						"search from {} to {} opened {opened} nodes, restarting with region heuristic",
						s.start,
						s.end_area
					);
					let calc = RegionCostCalculator::new(s.graph, s.ctx, s.end_area, s.tp);
					heuristic = Heuristic::Regions(Box::new(calc));
					continue 'restart;
				}

				let prev = (node.parent != NO_PARENT).then(|| size.cell_at(node.parent as usize));
				for &(dx, dz) in ADJACENT_8.iter() {
					let next = cell.offset(dx, dz);
					if !size.in_bounds(next) {
						continue;
					}
					if let Some(corridor) = s.corridor {
						match s.graph.valid_region_at_no_rebuild(next) {
							Some(r) if corridor.contains(&r) => {}
							_ => continue,
						}
					}
					let next_index = size.index_of(next);
					// closed nodes are only reopened under the region heuristic, which is not
					// consistent
					if self.nodes.is_closed(next_index) && !heuristic.is_region_based() {
						continue;
					}
					let Some(step) = transition_cost(
						s.ctx,
						s.config,
						s.tp,
						cell,
						next,
						prev,
						&mut self.things,
					) else {
						continue;
					};
					let next_cost = cost + step;
					if self.nodes.is_visited(next_index)
						&& self.nodes.get(next_index).known_cost <= next_cost
					{
						continue;
					}
					let h = heuristic.estimate(s.graph, s.ctx, next, s.end_area, closed);
					self.nodes.open(next_index, next_cost, h, index as u32);
					opened += 1;
					self.open_list
						.push(HeuristicElement(next_index, next_cost, next_cost + h));
				}
			}

			if opened == 1 && !s.ctx.costs.walkable(s.start) {
				log::warn!("{} is stuck on impassable {}", class.name, s.start);
				return Err(NoPath::StartImpassable(s.start));
			}
			log::warn!(
				"search from {} to {} for {} exhausted {closed} nodes",
				s.start,
				s.end_area,
				class.name
			);
			return Err(NoPath::Exhausted);
		}
	}

	/// Follows the parents from `dest_index` back to the start and replays the step costs
	fn build_path(&mut self, s: &Search, dest_index: usize) -> Result<Path, NoPath> {
		let size = self.size;
		let mut cells = vec![size.cell_at(dest_index)];
		let mut current = self.nodes.get(dest_index).parent;
		while current != NO_PARENT {
			if cells.len() > self.nodes.len() {
				log::error!(
					"parent chain from {} to {} does not end",
					s.start,
					size.cell_at(dest_index)
				);
				return Err(NoPath::Exhausted);
			}
			cells.push(size.cell_at(current as usize));
			current = self.nodes.get(current as usize).parent;
		}
		cells.reverse();

		match replay_cost(s.ctx, s.config, s.tp, &cells, &mut self.things) {
			Some(cost) => Ok(Path::new(cells, cost)),
			None => {
				log::error!(
					"path from {} to {} contains a step that cannot be taken",
					s.start,
					size.cell_at(dest_index)
				);
				Err(NoPath::Exhausted)
			}
		}
	}
}

/// The total cost of walking along `cells`, or `None` if any step is impossible
pub(crate) fn replay_cost(
	ctx: &GraphContext,
	config: &PathingConfig,
	tp: &TraverseParms,
	cells: &[Cell],
	things: &mut Vec<Thing>,
) -> Option<Cost> {
	let mut total: Cost = 0;
	for i in 1..cells.len() {
		let (from, to) = (cells[i - 1], cells[i]);
		if (to.x - from.x).abs() > 1 || (to.z - from.z).abs() > 1 || from == to {
			return None;
		}
		let prev = i.checked_sub(2).map(|p| cells[p]);
		total += transition_cost(ctx, config, tp, from, to, prev, things)?;
	}
	Some(total)
}
