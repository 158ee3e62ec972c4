use super::HeuristicElement;
use crate::path::Cost;
use crate::reachability::TraverseParms;
use crate::region::{
	id_map, id_set, GraphContext, IdMap, IdSet, OwnerGraph, LINK_WEIGHT_CARDINAL,
	LINK_WEIGHT_DIAGONAL,
};
use crate::{octile_distance, Cell, CellRect};

use std::collections::BinaryHeap;

fn link_heuristic(from: Cell, end_area: CellRect) -> Cost {
	let (dx, dz) = from.abs_diff(end_area.closest_cell_to(from));
	octile_distance(dx, dz, LINK_WEIGHT_CARDINAL, LINK_WEIGHT_DIAGONAL)
}

/// A* over Region links from the Region of `start` to any Region of `end_area`.
///
/// Returns the Regions along the cheapest chain of links, or `None` if the search does not
/// help: `start` and the destination share a Region, either end has no Region, or no chain
/// exists.
pub(crate) fn chunk_corridor(
	graph: &OwnerGraph,
	ctx: &GraphContext,
	start: Cell,
	end_area: CellRect,
	tp: &TraverseParms,
) -> Option<IdSet<usize>> {
	let start_region = graph.valid_region_at_no_rebuild(start)?;
	let mut dest_regions: IdSet<usize> = id_set();
	for cell in end_area.clipped_to(graph.size).cells() {
		if let Some(r) = graph.valid_region_at_no_rebuild(cell) {
			if graph.region_allows(ctx, r, tp, true) {
				dest_regions.insert(r);
			}
		}
	}
	if dest_regions.is_empty() || dest_regions.contains(&start_region) {
		return None;
	}

	// link -> (cost, previous link, Region the link was entered from)
	let mut visited: IdMap<usize, (Cost, Option<usize>, usize)> = id_map();
	let mut next = BinaryHeap::new();
	for &link in &graph.regions[start_region].links {
		let near = graph.link_closest_cell_in(link, start_region, start);
		let (dx, dz) = near.abs_diff(start);
		let cost = octile_distance(dx, dz, LINK_WEIGHT_CARDINAL, LINK_WEIGHT_DIAGONAL);
		visited.insert(link, (cost, None, start_region));
		let center = graph.links.get(link).span.center();
		next.push(HeuristicElement(link, cost, cost + link_heuristic(center, end_area)));
	}

	let mut goal = None;
	while let Some(HeuristicElement(current_id, current_cost, _)) = next.pop() {
		let (known_cost, _, from_region) = visited[&current_id];
		if current_cost > known_cost {
			continue;
		}
		let Some(region) = graph.links.get(current_id).other(from_region) else {
			continue;
		};
		let is_dest = dest_regions.contains(&region);
		if !graph.region_allows(ctx, region, tp, is_dest) {
			continue;
		}
		if is_dest {
			goal = Some((current_id, region));
			break;
		}

		let r = &graph.regions[region];
		for &other_id in &r.links {
			if other_id == current_id {
				continue;
			}
			let Some(weight) = r.link_weight(current_id, other_id) else {
				continue;
			};
			let other_cost = current_cost + weight;

			let mut needs_visit = true;
			if let Some((prev_cost, prev_id, prev_region)) = visited.get_mut(&other_id) {
				if *prev_cost > other_cost {
					*prev_cost = other_cost;
					*prev_id = Some(current_id);
					*prev_region = region;
				} else {
					needs_visit = false;
				}
			} else {
				visited.insert(other_id, (other_cost, Some(current_id), region));
			}

			if needs_visit {
				let center = graph.links.get(other_id).span.center();
				next.push(HeuristicElement(
					other_id,
					other_cost,
					other_cost + link_heuristic(center, end_area),
				));
			}
		}
	}

	let (goal_link, dest_region) = goal?;
	let mut corridor = id_set();
	corridor.insert(dest_region);
	let mut current = Some(goal_link);
	while let Some(link) = current {
		let (_, prev, from_region) = visited[&link];
		corridor.insert(from_region);
		current = prev;
	}
	log::trace!(
		"chunk search from {start} found a corridor of {} regions",
		corridor.len()
	);
	Some(corridor)
}
