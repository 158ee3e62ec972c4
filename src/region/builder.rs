use super::{
	classify, id_set, next_uid, EdgeSpan, GraphContext, OwnerGraph, Region, RegionType,
	LINK_WEIGHT_CARDINAL, LINK_WEIGHT_DIAGONAL,
};
use crate::error::RegionBuildError;
use crate::host::Thing;
use crate::{octile_distance, Cell, CellRect, Dir};

use std::collections::VecDeque;

/// The steps of building a Region. A failed build reports the step it was in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BuildStep {
	Classify,
	FloodFill,
	CreateLinks,
	LinkWeights,
}

impl OwnerGraph {
	/// Builds a new Region from `seed`.
	///
	/// Returns `Ok(None)` if there is no Region to build at `seed`. Failures are logged together
	/// with the step that failed and leave no trace of the new Region behind.
	pub(crate) fn try_generate_region_from(
		&mut self,
		ctx: &GraphContext,
		seed: Cell,
	) -> Result<Option<usize>, RegionBuildError> {
		if self.builder_working {
			log::error!(
				"tried to build a region at {seed} for {} while another region is being built",
				ctx.class.name
			);
			return Err(RegionBuildError::Reentrant);
		}
		self.builder_working = true;
		let mut step = BuildStep::Classify;
		let result = self.generate_region(ctx, seed, &mut step);
		if let Err(err) = &result {
			log::error!(
				"failed to build region at {seed} for {} during {step:?}: {err}",
				ctx.class.name
			);
		}
		self.builder_working = false;
		result
	}

	fn generate_region(
		&mut self,
		ctx: &GraphContext,
		seed: Cell,
		step: &mut BuildStep,
	) -> Result<Option<usize>, RegionBuildError> {
		let mut things = vec![];
		let region_type = classify(ctx, seed, &mut things);
		if region_type == RegionType::None {
			return Ok(None);
		}
		if self.valid_region_at_no_rebuild(seed).is_some() {
			return Err(RegionBuildError::CellClaimed(seed));
		}
		let limit = if region_type.is_one_cell() {
			CellRect::single(seed)
		} else {
			self.limit_box_of(seed)
		};
		let region = self
			.regions
			.insert(Region::new(next_uid(), region_type, seed, limit));

		*step = BuildStep::FloodFill;
		let cells = self.flood_fill(ctx, region, seed, &mut things);

		*step = BuildStep::CreateLinks;
		if let Err(err) = self.create_links(ctx, region, &cells, &mut things) {
			self.discard_partial(region, &cells);
			return Err(err);
		}

		*step = BuildStep::LinkWeights;
		self.compute_link_weights(region);

		self.regions[region].valid = true;
		Ok(Some(region))
	}

	/// The tile-aligned box around `cell`, clipped to the map
	pub(crate) fn limit_box_of(&self, cell: Cell) -> CellRect {
		let s = self.region_size;
		let origin = Cell::new(cell.x.div_euclid(s) * s, cell.z.div_euclid(s) * s);
		CellRect::with_size(origin, s, s).clipped_to(self.size)
	}

	fn claim(&mut self, region: usize, cell: Cell) {
		self.set_slot(self.size.index_of(cell), Some(region));
		let on_edge = self.size.on_edge(cell);
		let r = &mut self.regions[region];
		r.rect.encapsulate(cell);
		r.cell_count += 1;
		r.touches_map_edge |= on_edge;
	}

	fn flood_fill(
		&mut self,
		ctx: &GraphContext,
		region: usize,
		seed: Cell,
		things: &mut Vec<Thing>,
	) -> Vec<Cell> {
		let (region_type, limit) = {
			let r = &self.regions[region];
			(r.region_type, r.limit)
		};
		let mut cells = vec![seed];
		let mut queue = VecDeque::new();
		self.claim(region, seed);
		queue.push_back(seed);

		while let Some(cell) = queue.pop_front() {
			for dir in Dir::all() {
				let next = cell.step(dir);
				if !limit.contains(next) || self.grid.slot_at(next) == Some(region) {
					continue;
				}
				if self.valid_region_at_no_rebuild(next).is_some() {
					continue;
				}
				if classify(ctx, next, things) != region_type {
					continue;
				}
				self.claim(region, next);
				cells.push(next);
				queue.push_back(next);
			}
		}
		cells
	}

	fn create_links(
		&mut self,
		ctx: &GraphContext,
		region: usize,
		cells: &[Cell],
		things: &mut Vec<Thing>,
	) -> Result<(), RegionBuildError> {
		let mut seen = id_set();
		for &cell in cells {
			for dir in Dir::all() {
				let other = cell.step(dir);
				if !self.size.in_bounds(other) || self.grid.slot_at(other) == Some(region) {
					continue;
				}
				let other_type = classify(ctx, other, things);
				if other_type == RegionType::None {
					continue;
				}
				let span = self.sweep_span(ctx, region, cell, dir, other_type, things);
				if !seen.insert(span.unique_hash(self.size)) {
					continue;
				}
				let link = self.links.link_for(span);
				self.links.get_mut(link).register(region)?;
				self.regions[region].links.push(link);
			}
		}
		Ok(())
	}

	/// Extends the boundary between `cell` and its neighbor in `dir` as far as both sides stay
	/// the same.
	fn sweep_span(
		&self,
		ctx: &GraphContext,
		region: usize,
		cell: Cell,
		dir: Dir,
		other_type: RegionType,
		things: &mut Vec<Thing>,
	) -> EdgeSpan {
		let other = cell.step(dir);
		let along = if dir.is_vertical() { Dir::East } else { Dir::North };
		let (ax, az) = along.offset();
		let one_cell = self.regions[region].region_type.is_one_cell() || other_type.is_one_cell();

		let (mut lo, mut hi) = (0, 0);
		if !one_cell {
			while self.span_continues(ctx, region, cell, other, lo - 1, along, other_type, things) {
				lo -= 1;
			}
			while self.span_continues(ctx, region, cell, other, hi + 1, along, other_type, things) {
				hi += 1;
			}
		}
		let span_side = if dir == Dir::North || dir == Dir::East {
			cell
		} else {
			other
		};
		EdgeSpan::new(span_side.offset(ax * lo, az * lo), along, hi - lo + 1)
	}

	#[allow(clippy::too_many_arguments)]
	fn span_continues(
		&self,
		ctx: &GraphContext,
		region: usize,
		cell: Cell,
		other: Cell,
		k: i32,
		along: Dir,
		other_type: RegionType,
		things: &mut Vec<Thing>,
	) -> bool {
		let (ax, az) = along.offset();
		let mine = cell.offset(ax * k, az * k);
		let theirs = other.offset(ax * k, az * k);
		self.grid.slot_at(mine) == Some(region)
			&& self.size.in_bounds(theirs)
			&& self.grid.slot_at(theirs) != Some(region)
			&& classify(ctx, theirs, things) == other_type
	}

	fn compute_link_weights(&mut self, region: usize) {
		let links = &self.regions[region].links;
		let centers: Vec<Cell> = links
			.iter()
			.map(|&l| self.link_center_in(l, region))
			.collect();
		let mut weights = Vec::with_capacity(centers.len() * centers.len());
		for a in &centers {
			for b in &centers {
				let (dx, dz) = a.abs_diff(*b);
				weights.push(octile_distance(
					dx,
					dz,
					LINK_WEIGHT_CARDINAL,
					LINK_WEIGHT_DIAGONAL,
				));
			}
		}
		self.regions[region].link_weights = weights;
	}

	/// Undoes a Region whose links could not be created
	fn discard_partial(&mut self, region: usize, cells: &[Cell]) {
		let links = std::mem::take(&mut self.regions[region].links);
		for link in links {
			self.links.deregister(link, region);
		}
		self.regions[region].valid = false;
		for &cell in cells {
			self.set_slot(self.size.index_of(cell), None);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::host::{Door, GridMap, WorldMap};
	use crate::{MoverClass, MoverClassId, PathCostGrid};

	fn setup(world: &GridMap) -> (MoverClass, PathCostGrid) {
		let class = MoverClass::new("walker");
		let costs = PathCostGrid::new(world.size());
		costs.recompute_all(world, &class);
		(class, costs)
	}

	#[test]
	fn flood_stops_at_the_limit_box() {
		let world = GridMap::open(20, 5);
		let (class, costs) = setup(&world);
		let ctx = GraphContext {
			world: &world,
			costs: &costs,
			class: &class,
		};
		let mut graph = OwnerGraph::new(MoverClassId(0), world.size(), 8, true);

		let a = graph
			.try_generate_region_from(&ctx, Cell::new(3, 2))
			.unwrap()
			.unwrap();
		let region = &graph.regions[a];
		assert_eq!(region.rect, CellRect::new(0, 0, 7, 4));
		assert_eq!(region.cell_count, 40);
		assert!(region.touches_map_edge);
		assert_eq!(region.links.len(), 1);

		let b = graph
			.try_generate_region_from(&ctx, Cell::new(8, 0))
			.unwrap()
			.unwrap();
		assert_eq!(graph.regions[b].links.len(), 2);
		let shared = graph.regions[a].links[0];
		assert!(graph.regions[b].links.contains(&shared));
		let span = graph.links.get(shared).span;
		assert_eq!(span, EdgeSpan::new(Cell::new(7, 0), Dir::North, 5));
		assert_eq!(graph.links.get(shared).other(a), Some(b));
	}

	#[test]
	fn doors_are_single_cells() {
		let world = GridMap::open(5, 5);
		for z in 0..5 {
			world.build_wall(Cell::new(2, z));
		}
		world.remove_walls(Cell::new(2, 2));
		world.set_door(Cell::new(2, 2), Some(Door::new(false)));
		let (class, costs) = setup(&world);
		let ctx = GraphContext {
			world: &world,
			costs: &costs,
			class: &class,
		};
		let mut graph = OwnerGraph::new(MoverClassId(0), world.size(), 12, true);

		let door = graph
			.try_generate_region_from(&ctx, Cell::new(2, 2))
			.unwrap()
			.unwrap();
		assert_eq!(graph.regions[door].region_type, RegionType::Portal);
		assert_eq!(graph.regions[door].cell_count, 1);
		assert_eq!(graph.regions[door].links.len(), 2);

		let wall = graph.try_generate_region_from(&ctx, Cell::new(2, 0)).unwrap();
		assert!(wall.is_none());
	}

	#[test]
	fn nested_builds_are_rejected() {
		let world = GridMap::open(3, 3);
		let (class, costs) = setup(&world);
		let ctx = GraphContext {
			world: &world,
			costs: &costs,
			class: &class,
		};
		let mut graph = OwnerGraph::new(MoverClassId(0), world.size(), 12, true);
		graph.builder_working = true;
		assert_eq!(
			graph.try_generate_region_from(&ctx, Cell::new(0, 0)),
			Err(RegionBuildError::Reentrant)
		);
		graph.builder_working = false;
		assert!(graph
			.try_generate_region_from(&ctx, Cell::new(0, 0))
			.unwrap()
			.is_some());
		assert_eq!(
			graph.try_generate_region_from(&ctx, Cell::new(1, 1)),
			Err(RegionBuildError::CellClaimed(Cell::new(1, 1)))
		);
	}
}
