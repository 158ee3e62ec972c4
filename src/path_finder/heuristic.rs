use crate::path::Cost;
use crate::region::{GraphContext, OwnerGraph};
use crate::search::RegionCostCalculator;
use crate::utils::SimpleCurve;
use crate::{octile_distance, Cell, CellRect};

/// Strength of the octile heuristic by straight-line distance between start and destination.
/// Short searches stay close to Dijkstra, long ones are guided harder.
const STRENGTH_BY_DISTANCE: SimpleCurve<2> = SimpleCurve::new([(40.0, 1.0), (120.0, 2.8)]);

/// Weight of the Region heuristic by number of closed nodes
const REGION_WEIGHT_BY_CLOSED: SimpleCurve<5> = SimpleCurve::new([
	(0.0, 1.0),
	(3500.0, 1.0),
	(4500.0, 5.0),
	(30000.0, 50.0),
	(100000.0, 500.0),
]);

/// Octile movement ticks from `cell` to the nearest Cell of `area`
pub(crate) fn octile_to_area(cell: Cell, area: CellRect, ticks: (Cost, Cost)) -> Cost {
	let (dx, dz) = cell.abs_diff(area.closest_cell_to(cell));
	octile_distance(dx, dz, ticks.0, ticks.1)
}

/// The remaining-cost estimate of a cell search
pub(crate) enum Heuristic {
	/// scaled octile distance
	Octile { strength: f32, ticks: (Cost, Cost) },
	/// Region graph distance, weighted by how long the search has been running
	Regions(Box<RegionCostCalculator>),
}

impl Heuristic {
	pub fn octile(start: Cell, end_area: CellRect, ticks: (Cost, Cost)) -> Heuristic {
		let distance = start.euclidean_distance(end_area.closest_cell_to(start));
		Heuristic::Octile {
			strength: STRENGTH_BY_DISTANCE.evaluate(distance),
			ticks,
		}
	}

	pub fn is_region_based(&self) -> bool {
		matches!(self, Heuristic::Regions(_))
	}

	pub fn estimate(
		&mut self,
		graph: &OwnerGraph,
		ctx: &GraphContext,
		cell: Cell,
		end_area: CellRect,
		closed: usize,
	) -> Cost {
		match self {
			Heuristic::Octile { strength, ticks } => {
				(octile_to_area(cell, end_area, *ticks) as f32 * *strength).round() as Cost
			}
			Heuristic::Regions(calc) => {
				let weight = REGION_WEIGHT_BY_CLOSED.evaluate(closed as f32);
				(calc.cost_from(graph, ctx, cell) as f32 * weight).round() as Cost
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strength_grows_with_distance() {
		let area = CellRect::single(Cell::new(0, 0));
		let short = Heuristic::octile(Cell::new(10, 0), area, (13, 18));
		let long = Heuristic::octile(Cell::new(200, 0), area, (13, 18));
		match (short, long) {
			(Heuristic::Octile { strength: a, .. }, Heuristic::Octile { strength: b, .. }) => {
				assert_eq!(a, 1.0);
				assert_eq!(b, 2.8);
			}
			_ => unreachable!(),
		}
		assert_eq!(REGION_WEIGHT_BY_CLOSED.evaluate(1000.0), 1.0);
		assert_eq!(REGION_WEIGHT_BY_CLOSED.evaluate(4500.0), 5.0);
		assert_eq!(octile_to_area(Cell::new(3, 1), area, (13, 18)), 13 * 2 + 18);
	}
}
