use crate::Cell;

use std::sync::Arc;

/// The cost type of paths and searches, in movement ticks
pub type Cost = u32;

/// A path from a start Cell to a destination, as returned by a search.
///
/// Cheap to clone: the Cells are shared. The first Cell is the start, the last one the Cell the
/// mover arrives on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
	cells: Arc<[Cell]>,
	cost: Cost,
}

impl Path {
	/// Creates a new Path. `cells` must be ordered from start to destination.
	pub fn new(cells: Vec<Cell>, cost: Cost) -> Path {
		Path {
			cells: cells.into(),
			cost,
		}
	}

	/// Creates a new Path from a slice of Cells
	pub fn from_slice(cells: &[Cell], cost: Cost) -> Path {
		Path {
			cells: cells.into(),
			cost,
		}
	}

	/// The total cost of walking the Path
	pub fn cost(&self) -> Cost {
		self.cost
	}

	/// The number of Cells, including the start
	pub fn len(&self) -> usize {
		self.cells.len()
	}

	/// `true` if the Path has no Cells
	pub fn is_empty(&self) -> bool {
		self.cells.is_empty()
	}

	/// The Cell the Path starts on
	pub fn start(&self) -> Option<Cell> {
		self.cells.first().copied()
	}

	/// The Cell the Path ends on
	pub fn dest(&self) -> Option<Cell> {
		self.cells.last().copied()
	}

	/// The Cells of the Path
	pub fn cells(&self) -> &[Cell] {
		&self.cells
	}

	/// Returns an Iterator over the Cells, from start to destination. Walk it backwards with
	/// [`rev`](Iterator::rev).
	pub fn iter(&self) -> std::slice::Iter<'_, Cell> {
		self.cells.iter()
	}
}

impl std::ops::Index<usize> for Path {
	type Output = Cell;
	fn index(&self, index: usize) -> &Cell {
		&self.cells[index]
	}
}

impl<'a> IntoIterator for &'a Path {
	type Item = &'a Cell;
	type IntoIter = std::slice::Iter<'a, Cell>;
	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

impl PartialEq<Vec<Cell>> for Path {
	fn eq(&self, rhs: &Vec<Cell>) -> bool {
		*self.cells == **rhs
	}
}

impl<'a> PartialEq<&'a [Cell]> for Path {
	fn eq(&self, rhs: &&'a [Cell]) -> bool {
		*self.cells == **rhs
	}
}

use std::fmt;
impl fmt::Display for Path {
	fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
		write!(fmt, "Path[Cost = {}]: ", self.cost)?;
		if self.cells.is_empty() {
			write!(fmt, "<empty>")
		} else {
			write!(fmt, "{}", self.cells[0])?;
			for c in self.cells.iter().skip(1) {
				write!(fmt, " -> {}", c)?;
			}
			Ok(())
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn path() -> Path {
		Path::new(vec![Cell::new(0, 0), Cell::new(1, 1), Cell::new(2, 1)], 31)
	}

	#[test]
	fn index() {
		let path = path();
		assert_eq!(path[0], Cell::new(0, 0));
		assert_eq!(path[2], Cell::new(2, 1));
		assert_eq!(path.dest(), Some(Cell::new(2, 1)));
	}

	#[test]
	fn both_directions() {
		let path = path();
		let back: Vec<Cell> = path.iter().rev().copied().collect();
		assert_eq!(back[0], Cell::new(2, 1));
		assert_eq!(path, path.cells().to_vec());
	}

	#[test]
	fn display() {
		assert_eq!(
			&format!("{}", path()),
			"Path[Cost = 31]: (0, 0) -> (1, 1) -> (2, 1)"
		);
	}

	#[test]
	fn display_empty() {
		let path = Path::new(vec![], 0);
		assert_eq!(&format!("{}", path), "Path[Cost = 0]: <empty>");
	}
}
