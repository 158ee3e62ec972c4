use super::Element;
use crate::path::Cost;
use crate::reachability::TraverseParms;
use crate::region::{id_map, id_set, GraphContext, IdMap, IdSet, OwnerGraph, RegionType};
use crate::{octile_distance, Cell, CellRect, ADJACENT_8};

use nanorand::{Rng, WyRand};
use std::collections::BinaryHeap;

/// Reported for Cells from which the destination cannot be reached
pub(crate) const UNREACHABLE_COST: Cost = 10_000;

const MEDIAN_SAMPLES: usize = 11;
const MEDIAN_INDEX: usize = 4;

#[derive(Clone, Copy, Debug, Default)]
struct RegionDistance {
	best: Option<(usize, Cost)>,
	second: Option<(usize, Cost)>,
}

/// Estimates the cost of reaching the destination from any Cell, through the Region graph.
///
/// Inside the destination Regions the estimate is exact (a Dijkstra over their Cells). Outside,
/// the cost to every link is found by a Dijkstra over links that only runs as far as the
/// queried Regions need. Results are memoized for the lifetime of the calculator, which is a
/// single search.
pub(crate) struct RegionCostCalculator {
	tp: TraverseParms,
	ticks: (Cost, Cost),
	end_area: CellRect,
	dest_regions: IdSet<usize>,
	dest_cell_costs: IdMap<usize, Cost>,
	queue: BinaryHeap<Element<usize>>,
	tentative: IdMap<usize, Cost>,
	settled: IdMap<usize, Cost>,
	region_distances: IdMap<usize, RegionDistance>,
	medians: IdMap<usize, Cost>,
}

impl RegionCostCalculator {
	pub fn new(
		graph: &OwnerGraph,
		ctx: &GraphContext,
		end_area: CellRect,
		tp: &TraverseParms,
	) -> RegionCostCalculator {
		let mut calc = RegionCostCalculator {
			tp: *tp,
			ticks: (ctx.class.move_ticks_cardinal, ctx.class.move_ticks_diagonal),
			end_area,
			dest_regions: id_set(),
			dest_cell_costs: id_map(),
			queue: BinaryHeap::new(),
			tentative: id_map(),
			settled: id_map(),
			region_distances: id_map(),
			medians: id_map(),
		};
		for cell in end_area.clipped_to(graph.size).cells() {
			if let Some(r) = graph.valid_region_at_no_rebuild(cell) {
				if graph.region_allows(ctx, r, tp, true) {
					calc.dest_regions.insert(r);
				}
			}
		}
		calc.fill_destination_regions(graph, ctx);
		calc.seed_links(graph);
		log::trace!(
			"region cost calculator: {} destination regions, {} seeded links",
			calc.dest_regions.len(),
			calc.queue.len()
		);
		calc
	}

	/// Exact costs for every Cell of the destination Regions
	fn fill_destination_regions(&mut self, graph: &OwnerGraph, ctx: &GraphContext) {
		let size = graph.size;
		let mut queue = BinaryHeap::new();
		for cell in self.end_area.clipped_to(size).cells() {
			let in_dest = graph
				.valid_region_at_no_rebuild(cell)
				.map_or(false, |r| self.dest_regions.contains(&r));
			if in_dest {
				let index = size.index_of(cell);
				self.dest_cell_costs.insert(index, 0);
				queue.push(Element(index, 0));
			}
		}

		while let Some(Element(index, cost)) = queue.pop() {
			if cost > self.dest_cell_costs[&index] {
				continue;
			}
			let cell = size.cell_at(index);
			let step_cost = ctx.costs.cost_at_index(index);
			for &(dx, dz) in ADJACENT_8.iter() {
				let next = cell.offset(dx, dz);
				let in_dest = graph
					.valid_region_at_no_rebuild(next)
					.map_or(false, |r| self.dest_regions.contains(&r));
				if !in_dest {
					continue;
				}
				let ticks = if dx != 0 && dz != 0 {
					self.ticks.1
				} else {
					self.ticks.0
				};
				let next_cost = cost + ticks + step_cost;
				let next_index = size.index_of(next);
				let better = self
					.dest_cell_costs
					.get(&next_index)
					.map_or(true, |&known| next_cost < known);
				if better {
					self.dest_cell_costs.insert(next_index, next_cost);
					queue.push(Element(next_index, next_cost));
				}
			}
		}
	}

	/// Every link of a destination Region starts at the cheapest of its Cells
	fn seed_links(&mut self, graph: &OwnerGraph) {
		let dest: Vec<usize> = self.dest_regions.iter().copied().collect();
		for region in dest {
			for &link in &graph.regions[region].links {
				let cost = graph
					.link_cells_in(link, region)
					.filter_map(|c| self.dest_cell_costs.get(&graph.size.index_of(c)))
					.min()
					.copied();
				if let Some(cost) = cost {
					self.relax(link, cost);
				}
			}
		}
	}

	fn relax(&mut self, link: usize, cost: Cost) {
		let better = self.tentative.get(&link).map_or(true, |&known| cost < known);
		if better && !self.settled.contains_key(&link) {
			self.tentative.insert(link, cost);
			self.queue.push(Element(link, cost));
		}
	}

	/// Runs the link Dijkstra until `target` is settled
	fn link_cost(&mut self, graph: &OwnerGraph, ctx: &GraphContext, target: usize) -> Option<Cost> {
		if let Some(&cost) = self.settled.get(&target) {
			return Some(cost);
		}
		while let Some(Element(link, cost)) = self.queue.pop() {
			if self.settled.contains_key(&link) || cost > self.tentative[&link] {
				continue;
			}
			self.settled.insert(link, cost);
			self.expand(graph, ctx, link, cost);
			if link == target {
				return Some(cost);
			}
		}
		None
	}

	fn expand(&mut self, graph: &OwnerGraph, ctx: &GraphContext, link: usize, cost: Cost) {
		for region in graph.links.get(link).regions.into_iter().flatten() {
			if self.dest_regions.contains(&region)
				|| !graph.region_allows(ctx, region, &self.tp, false)
			{
				continue;
			}
			for i in 0..graph.regions[region].links.len() {
				let other = graph.regions[region].links[i];
				if other == link || self.settled.contains_key(&other) {
					continue;
				}
				let step = self.link_to_link_cost(graph, ctx, region, link, other);
				self.relax(other, cost + step);
			}
		}
	}

	fn link_to_link_cost(
		&mut self,
		graph: &OwnerGraph,
		ctx: &GraphContext,
		region: usize,
		from: usize,
		to: usize,
	) -> Cost {
		let a = graph.link_center_in(from, region);
		let b = graph.link_center_in(to, region);
		let mut cost = self.estimate(graph, ctx, region, a, b);
		if graph.regions[region].region_type == RegionType::Portal {
			cost += self.ticks.0 + ctx.costs.cost(a);
			if let Some(door) = ctx.world.door_at(a) {
				if !door.open {
					cost += door.ticks_to_open;
				}
			}
		}
		cost
	}

	/// Octile movement cost between two Cells of a Region, plus its typical Cell cost per step
	fn estimate(
		&mut self,
		graph: &OwnerGraph,
		ctx: &GraphContext,
		region: usize,
		a: Cell,
		b: Cell,
	) -> Cost {
		let (dx, dz) = a.abs_diff(b);
		let median = self.median_cost(graph, ctx, region);
		octile_distance(dx, dz, self.ticks.0, self.ticks.1) + median * dx.max(dz)
	}

	/// The median path cost of a few Cells of a Region, sampled with a seed unique to the Region
	fn median_cost(&mut self, graph: &OwnerGraph, ctx: &GraphContext, region: usize) -> Cost {
		if let Some(&median) = self.medians.get(&region) {
			return median;
		}
		let cells: Vec<Cell> = graph.region_cells(region).collect();
		let median = if cells.is_empty() {
			0
		} else {
			let mut rng = WyRand::new_seed(graph.regions[region].uid);
			let mut samples = [0; MEDIAN_SAMPLES];
			for sample in samples.iter_mut() {
				*sample = ctx.costs.cost(cells[rng.generate_range(0..cells.len())]);
			}
			samples.sort_unstable();
			samples[MEDIAN_INDEX]
		};
		self.medians.insert(region, median);
		median
	}

	fn region_distance(
		&mut self,
		graph: &OwnerGraph,
		ctx: &GraphContext,
		region: usize,
	) -> RegionDistance {
		if let Some(&known) = self.region_distances.get(&region) {
			return known;
		}
		let mut distance = RegionDistance::default();
		for i in 0..graph.regions[region].links.len() {
			let link = graph.regions[region].links[i];
			let Some(cost) = self.link_cost(graph, ctx, link) else {
				continue;
			};
			match distance.best {
				Some((_, best)) if cost >= best => {
					if distance.second.map_or(true, |(_, second)| cost < second) {
						distance.second = Some((link, cost));
					}
				}
				_ => {
					distance.second = distance.best;
					distance.best = Some((link, cost));
				}
			}
		}
		self.region_distances.insert(region, distance);
		distance
	}

	/// The estimated cost of walking from `cell` to the destination
	pub fn cost_from(&mut self, graph: &OwnerGraph, ctx: &GraphContext, cell: Cell) -> Cost {
		let Some(region) = graph.valid_region_at_no_rebuild(cell) else {
			return UNREACHABLE_COST;
		};
		if self.dest_regions.contains(&region) {
			if let Some(&cost) = self.dest_cell_costs.get(&graph.size.index_of(cell)) {
				return cost;
			}
			let (dx, dz) = cell.abs_diff(self.end_area.closest_cell_to(cell));
			return octile_distance(dx, dz, self.ticks.0, self.ticks.1);
		}

		let distance = self.region_distance(graph, ctx, region);
		let mut best = UNREACHABLE_COST;
		for (link, cost) in [distance.best, distance.second].into_iter().flatten() {
			let near = graph.link_closest_cell_in(link, region, cell);
			let total = cost + self.estimate(graph, ctx, region, cell, near);
			best = best.min(total);
		}
		best
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::host::{GridMap, WorldMap};
	use crate::{MoverClass, MoverClassId, PathCostGrid};

	fn build(world: &GridMap, class: &MoverClass, costs: &PathCostGrid) -> OwnerGraph {
		costs.recompute_all(world, class);
		let ctx = GraphContext {
			world,
			costs,
			class,
		};
		let mut graph = OwnerGraph::new(MoverClassId(0), world.size(), 6, true);
		graph.rebuild_all(&ctx);
		graph
	}

	#[test]
	fn estimates_grow_with_distance() {
		let world = GridMap::open(30, 6);
		let class = MoverClass::new("walker");
		let costs = PathCostGrid::new(world.size());
		let graph = build(&world, &class, &costs);
		let ctx = GraphContext {
			world: &world,
			costs: &costs,
			class: &class,
		};
		let dest = CellRect::single(Cell::new(29, 3));
		let mut calc =
			RegionCostCalculator::new(&graph, &ctx, dest, &TraverseParms::default());

		assert_eq!(calc.cost_from(&graph, &ctx, Cell::new(29, 3)), 0);
		assert_eq!(calc.cost_from(&graph, &ctx, Cell::new(28, 3)), 13);
		let near = calc.cost_from(&graph, &ctx, Cell::new(20, 3));
		let far = calc.cost_from(&graph, &ctx, Cell::new(2, 3));
		assert!(near < far, "{near} >= {far}");
		assert!(far < UNREACHABLE_COST);
		// never more than twice the straight walk on an open map
		assert!(far <= 2 * 27 * 13, "{far}");
	}

	#[test]
	fn walled_off_cells_are_unreachable() {
		let world = GridMap::open(12, 6);
		for z in 0..6 {
			world.build_wall(Cell::new(6, z));
		}
		let class = MoverClass::new("walker");
		let costs = PathCostGrid::new(world.size());
		let graph = build(&world, &class, &costs);
		let ctx = GraphContext {
			world: &world,
			costs: &costs,
			class: &class,
		};
		let dest = CellRect::single(Cell::new(11, 0));
		let mut calc =
			RegionCostCalculator::new(&graph, &ctx, dest, &TraverseParms::default());
		assert_eq!(calc.cost_from(&graph, &ctx, Cell::new(0, 0)), UNREACHABLE_COST);
		assert_eq!(calc.cost_from(&graph, &ctx, Cell::new(6, 0)), UNREACHABLE_COST);
		assert!(calc.cost_from(&graph, &ctx, Cell::new(7, 5)) < UNREACHABLE_COST);
	}
}
