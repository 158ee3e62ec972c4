//! Cells, Rectangles and Directions on the Grid.
//!
//! Every other Module addresses the Grid through these types. A [`Cell`] is an integer `(x, z)`
//! coordinate, a [`MapSize`] converts Cells to dense row-major indices and back, and a
//! [`CellRect`] is an inclusive, axis-aligned block of Cells.

use std::fmt;

/// A single Tile on the Grid.
///
/// Coordinates are signed so that neighbors of border Cells can be formed without wrapping.
/// Use [`MapSize::in_bounds`] to check whether a Cell actually exists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
	/// column
	pub x: i32,
	/// row
	pub z: i32,
}

impl Cell {
	/// Creates a new Cell at `(x, z)`
	pub const fn new(x: i32, z: i32) -> Cell {
		Cell { x, z }
	}

	/// The Cell `(dx, dz)` away from this one
	pub fn offset(self, dx: i32, dz: i32) -> Cell {
		Cell::new(self.x + dx, self.z + dz)
	}

	/// The Cell one step in `dir`
	pub fn step(self, dir: Dir) -> Cell {
		let (dx, dz) = dir.offset();
		self.offset(dx, dz)
	}

	/// Number of king-moves needed to go from `self` to `other`
	pub fn chebyshev_distance(self, other: Cell) -> u32 {
		let (dx, dz) = self.abs_diff(other);
		dx.max(dz)
	}

	/// Absolute difference along both axes
	pub fn abs_diff(self, other: Cell) -> (u32, u32) {
		(self.x.abs_diff(other.x), self.z.abs_diff(other.z))
	}

	/// Straight-line distance, used to pick the heuristic strength of a search
	pub fn euclidean_distance(self, other: Cell) -> f32 {
		let (dx, dz) = self.abs_diff(other);
		((dx * dx + dz * dz) as f32).sqrt()
	}

	/// All 8 surrounding Cells, cardinals first. May contain Cells outside of the map.
	pub fn adjacent_8(self) -> impl Iterator<Item = Cell> {
		ADJACENT_8.iter().map(move |&(dx, dz)| self.offset(dx, dz))
	}

	/// The Cell itself followed by the 8 surrounding Cells
	pub fn adjacent_and_inside(self) -> impl Iterator<Item = Cell> {
		std::iter::once(self).chain(self.adjacent_8())
	}
}

impl From<(i32, i32)> for Cell {
	fn from((x, z): (i32, i32)) -> Cell {
		Cell::new(x, z)
	}
}

impl fmt::Display for Cell {
	fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
		write!(fmt, "({}, {})", self.x, self.z)
	}
}

/// Offsets of the 8 neighbors of a Cell: the 4 cardinals (in [`Dir`] order) followed by the 4
/// diagonals (NE, SE, SW, NW).
pub const ADJACENT_8: [(i32, i32); 8] = [
	(0, 1),
	(1, 0),
	(0, -1),
	(-1, 0),
	(1, 1),
	(1, -1),
	(-1, -1),
	(-1, 1),
];

/// The dimensions of a Grid. Fixed at map creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MapSize {
	/// number of columns
	pub width: i32,
	/// number of rows
	pub height: i32,
}

impl MapSize {
	/// Creates a new MapSize
	///
	/// ## Panics
	/// if either dimension is not positive
	pub fn new(width: i32, height: i32) -> MapSize {
		assert!(width > 0 && height > 0, "invalid map size {width}x{height}");
		MapSize { width, height }
	}

	/// Total number of Cells
	pub fn num_cells(&self) -> usize {
		self.width as usize * self.height as usize
	}

	/// `true` if `cell` lies on the Grid
	pub fn in_bounds(&self, cell: Cell) -> bool {
		cell.x >= 0 && cell.z >= 0 && cell.x < self.width && cell.z < self.height
	}

	/// `true` if `cell` is on the outermost ring of the Grid
	pub fn on_edge(&self, cell: Cell) -> bool {
		cell.x == 0 || cell.z == 0 || cell.x == self.width - 1 || cell.z == self.height - 1
	}

	/// Dense row-major index of an in-bounds Cell
	pub fn index_of(&self, cell: Cell) -> usize {
		debug_assert!(self.in_bounds(cell), "{cell} is out of bounds");
		cell.z as usize * self.width as usize + cell.x as usize
	}

	/// Inverse of [`index_of`](MapSize::index_of)
	pub fn cell_at(&self, index: usize) -> Cell {
		let width = self.width as usize;
		Cell::new((index % width) as i32, (index / width) as i32)
	}

	/// A Rect covering the entire Grid
	pub fn bounds(&self) -> CellRect {
		CellRect::new(0, 0, self.width - 1, self.height - 1)
	}

	/// Iterates over every Cell in row-major order
	pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
		(0..self.num_cells()).map(move |i| self.cell_at(i))
	}
}

/// An inclusive, axis-aligned Rectangle of Cells
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellRect {
	/// smallest x
	pub min_x: i32,
	/// smallest z
	pub min_z: i32,
	/// largest x (inclusive)
	pub max_x: i32,
	/// largest z (inclusive)
	pub max_z: i32,
}

impl CellRect {
	/// Creates a new Rect from inclusive bounds
	pub const fn new(min_x: i32, min_z: i32, max_x: i32, max_z: i32) -> CellRect {
		CellRect {
			min_x,
			min_z,
			max_x,
			max_z,
		}
	}

	/// A 1x1 Rect
	pub const fn single(cell: Cell) -> CellRect {
		CellRect::new(cell.x, cell.z, cell.x, cell.z)
	}

	/// A Rect of `width` x `height` Cells with its lower-left corner at `origin`
	pub fn with_size(origin: Cell, width: i32, height: i32) -> CellRect {
		CellRect::new(
			origin.x,
			origin.z,
			origin.x + width - 1,
			origin.z + height - 1,
		)
	}

	/// A `width` x `height` Rect around `center`. Even sizes extend further towards negative x/z.
	pub fn centered_at(center: Cell, width: i32, height: i32) -> CellRect {
		let min_x = center.x - width / 2;
		let min_z = center.z - height / 2;
		CellRect::new(min_x, min_z, min_x + width - 1, min_z + height - 1)
	}

	/// number of columns
	pub fn width(&self) -> i32 {
		self.max_x - self.min_x + 1
	}

	/// number of rows
	pub fn height(&self) -> i32 {
		self.max_z - self.min_z + 1
	}

	/// number of Cells, 0 for an inverted Rect
	pub fn area(&self) -> usize {
		if self.is_empty() {
			0
		} else {
			self.width() as usize * self.height() as usize
		}
	}

	/// `true` for Rects with inverted bounds (e.g. the result of clipping to a disjoint area)
	pub fn is_empty(&self) -> bool {
		self.min_x > self.max_x || self.min_z > self.max_z
	}

	/// `true` if `cell` is inside the Rect
	pub fn contains(&self, cell: Cell) -> bool {
		cell.x >= self.min_x && cell.x <= self.max_x && cell.z >= self.min_z && cell.z <= self.max_z
	}

	/// `true` if the two Rects share at least one Cell
	pub fn overlaps(&self, other: &CellRect) -> bool {
		!self.is_empty()
			&& !other.is_empty()
			&& self.min_x <= other.max_x
			&& other.min_x <= self.max_x
			&& self.min_z <= other.max_z
			&& other.min_z <= self.max_z
	}

	/// The Rect grown by `amount` Cells on every side
	pub fn expanded_by(&self, amount: i32) -> CellRect {
		CellRect::new(
			self.min_x - amount,
			self.min_z - amount,
			self.max_x + amount,
			self.max_z + amount,
		)
	}

	/// The part of the Rect that lies on a Grid of `size`
	pub fn clipped_to(&self, size: MapSize) -> CellRect {
		CellRect::new(
			self.min_x.max(0),
			self.min_z.max(0),
			self.max_x.min(size.width - 1),
			self.max_z.min(size.height - 1),
		)
	}

	/// Grows the Rect so that it contains `cell`
	pub fn encapsulate(&mut self, cell: Cell) {
		self.min_x = self.min_x.min(cell.x);
		self.min_z = self.min_z.min(cell.z);
		self.max_x = self.max_x.max(cell.x);
		self.max_z = self.max_z.max(cell.z);
	}

	/// The Cell in the middle (rounded towards the lower-left corner)
	pub fn center_cell(&self) -> Cell {
		Cell::new(
			self.min_x + (self.width() - 1) / 2,
			self.min_z + (self.height() - 1) / 2,
		)
	}

	/// The Cell of the Rect closest to `cell`
	pub fn closest_cell_to(&self, cell: Cell) -> Cell {
		Cell::new(
			cell.x.clamp(self.min_x, self.max_x),
			cell.z.clamp(self.min_z, self.max_z),
		)
	}

	/// Iterates over all Cells in row-major order
	pub fn cells(&self) -> impl Iterator<Item = Cell> {
		let rect = *self;
		let width = rect.width().max(0);
		(0..rect.area()).map(move |i| {
			let i = i as i32;
			Cell::new(rect.min_x + i % width, rect.min_z + i / width)
		})
	}

	/// Iterates over the Cells on the outermost ring of the Rect
	pub fn edge_cells(&self) -> impl Iterator<Item = Cell> {
		let rect = *self;
		self.cells().filter(move |c| {
			c.x == rect.min_x || c.x == rect.max_x || c.z == rect.min_z || c.z == rect.max_z
		})
	}
}

impl From<Cell> for CellRect {
	fn from(cell: Cell) -> CellRect {
		CellRect::single(cell)
	}
}

impl fmt::Display for CellRect {
	fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
		write!(
			fmt,
			"[{}..={}, {}..={}]",
			self.min_x, self.max_x, self.min_z, self.max_z
		)
	}
}

/// The four cardinal Directions. North is `+z`, East is `+x`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dir {
	/// `+z`
	North = 0,
	/// `+x`
	East = 1,
	/// `-z`
	South = 2,
	/// `-x`
	West = 3,
}
pub use self::Dir::*;

impl Dir {
	/// All four Directions, clockwise starting at North
	pub fn all() -> std::iter::Copied<std::slice::Iter<'static, Dir>> {
		[North, East, South, West].iter().copied()
	}
	/// The Direction pointing the other way
	pub fn opposite(self) -> Dir {
		((self.num() + 2) % 4).into()
	}
	/// The Direction after a quarter turn clockwise
	pub fn clockwise(self) -> Dir {
		((self.num() + 1) % 4).into()
	}
	/// The Direction as an index into `[North, East, South, West]`
	pub fn num(self) -> usize {
		self as usize
	}
	/// `true` for North and South
	pub fn is_vertical(self) -> bool {
		self == North || self == South
	}
	/// `(dx, dz)` of one step in this Direction
	pub fn offset(self) -> (i32, i32) {
		ADJACENT_8[self.num()]
	}
}

macro_rules! impl_from_into {
	($($type:ty),+) => {$(
		impl From<$type> for Dir {
			fn from(val: $type) -> Dir {
				match val {
					0 => North,
					1 => East,
					2 => South,
					3 => West,
					_ => panic!("invalid Dir: {}", val),
				}
			}
		}
		impl From<Dir> for $type {
			fn from(dir: Dir) -> $type {
				dir as $type
			}
		}
	)+}
}

impl_from_into!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

/// Cost of moving `dx` columns and `dz` rows when straight moves cost `cardinal` and diagonal
/// moves cost `diagonal`.
pub fn octile_distance(dx: u32, dz: u32, cardinal: u32, diagonal: u32) -> u32 {
	let (long, short) = if dx > dz { (dx, dz) } else { (dz, dx) };
	cardinal * (long - short) + diagonal * short
}
