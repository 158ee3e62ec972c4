use crate::path::Cost;

/// Marks a node without a parent
pub(crate) const NO_PARENT: u32 = u32::MAX;

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Node {
	pub known_cost: Cost,
	pub heuristic: Cost,
	pub parent: u32,
	status: u32,
}

/// Per-Cell search state, reused across searches.
///
/// Instead of clearing every node before a search, the open and closed markers move up by two.
/// Nodes carrying older markers count as unvisited. Only when the markers are about to overflow
/// is the grid cleared.
#[derive(Clone, Debug)]
pub(crate) struct NodeGrid {
	nodes: Vec<Node>,
	open: u32,
	closed: u32,
}

impl NodeGrid {
	pub fn new(num_cells: usize) -> NodeGrid {
		NodeGrid {
			nodes: vec![Node::default(); num_cells],
			open: 1,
			closed: 2,
		}
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// Forgets the state of the previous search
	pub fn next_search(&mut self) {
		if self.closed >= u32::MAX - 2 {
			log::debug!("search markers wrapped, resetting {} nodes", self.nodes.len());
			for node in self.nodes.iter_mut() {
				node.status = 0;
			}
			self.open = 1;
			self.closed = 2;
		} else {
			self.open += 2;
			self.closed += 2;
		}
	}

	pub fn is_open(&self, index: usize) -> bool {
		self.nodes[index].status == self.open
	}

	pub fn is_closed(&self, index: usize) -> bool {
		self.nodes[index].status == self.closed
	}

	/// `true` if the node was opened or closed in the current search
	pub fn is_visited(&self, index: usize) -> bool {
		self.is_open(index) || self.is_closed(index)
	}

	/// Opens a node with a new cost and parent
	pub fn open(&mut self, index: usize, known_cost: Cost, heuristic: Cost, parent: u32) {
		let open = self.open;
		let node = &mut self.nodes[index];
		node.known_cost = known_cost;
		node.heuristic = heuristic;
		node.parent = parent;
		node.status = open;
	}

	pub fn close(&mut self, index: usize) {
		self.nodes[index].status = self.closed;
	}

	pub fn get(&self, index: usize) -> &Node {
		&self.nodes[index]
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn markers_forget_old_searches() {
		let mut grid = NodeGrid::new(4);
		grid.next_search();
		grid.open(0, 5, 1, NO_PARENT);
		grid.open(1, 7, 1, 0);
		grid.close(1);
		assert!(grid.is_open(0));
		assert!(grid.is_closed(1));

		grid.next_search();
		assert!(!grid.is_visited(0));
		assert!(!grid.is_visited(1));
	}

	#[test]
	fn markers_wrap_around() {
		let mut grid = NodeGrid::new(2);
		grid.open = u32::MAX - 3;
		grid.closed = u32::MAX - 2;
		grid.open(0, 1, 1, NO_PARENT);
		grid.close(1);
		grid.next_search();
		assert_eq!((grid.open, grid.closed), (1, 2));
		assert!(!grid.is_visited(0));
		assert!(!grid.is_visited(1));
		grid.open(1, 3, 0, 0);
		assert!(grid.is_open(1));
	}
}
