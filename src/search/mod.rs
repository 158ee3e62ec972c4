//! Searches over the Region graph that guide the cell search on long routes.
//!
//! [`RegionCostCalculator`] estimates the remaining cost from any Cell to the destination by
//! running a lazy Dijkstra over Region links. [`chunk_corridor`] runs an A* over the same links
//! and returns the Regions a cell search may stay within.

mod hierarchical;
mod region_cost;

pub(crate) use self::hierarchical::chunk_corridor;
pub(crate) use self::region_cost::RegionCostCalculator;

use crate::path::Cost;

use std::cmp::Ordering;

/// A queue entry ordered by its estimated total cost, cheapest first
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct HeuristicElement<Id>(pub Id, pub Cost, pub Cost);
impl<Id: Eq> PartialOrd for HeuristicElement<Id> {
	fn partial_cmp(&self, rhs: &Self) -> Option<Ordering> {
		Some(self.cmp(rhs))
	}
}
impl<Id: Eq> Ord for HeuristicElement<Id> {
	fn cmp(&self, rhs: &Self) -> Ordering {
		rhs.2.cmp(&self.2)
	}
}

/// A queue entry ordered by its known cost, cheapest first
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Element<Id>(pub Id, pub Cost);
impl<Id: Eq> PartialOrd for Element<Id> {
	fn partial_cmp(&self, rhs: &Self) -> Option<Ordering> {
		Some(self.cmp(rhs))
	}
}
impl<Id: Eq> Ord for Element<Id> {
	fn cmp(&self, rhs: &Self) -> Ordering {
		rhs.1.cmp(&self.1)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::BinaryHeap;

	#[test]
	fn cheapest_first() {
		let mut heap = BinaryHeap::new();
		heap.push(HeuristicElement('a', 0, 30));
		heap.push(HeuristicElement('b', 5, 10));
		heap.push(HeuristicElement('c', 1, 20));
		assert_eq!(heap.pop().map(|e| e.0), Some('b'));
		assert_eq!(heap.pop(), Some(HeuristicElement('c', 1, 20)));

		let mut heap = BinaryHeap::new();
		heap.push(Element(1, 7));
		heap.push(Element(2, 3));
		assert_eq!(heap.pop(), Some(Element(2, 3)));
	}
}
