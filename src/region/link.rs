use super::id_map::{id_map, IdMap};
use crate::error::RegionBuildError;
use crate::{Cell, Dir, MapSize};

use slab::Slab;

/// A straight piece of boundary between two Regions.
///
/// The span is stored as the run of Cells on the south (or west) side of the boundary:
/// `dir` is [`East`](Dir::East) for boundaries between two rows and [`North`](Dir::North) for
/// boundaries between two columns. Both Regions derive the exact same span, so the span
/// identifies the boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EdgeSpan {
	/// the first Cell of the run
	pub root: Cell,
	/// the direction the run extends in
	pub dir: Dir,
	/// number of Cells in the run
	pub length: i32,
}

impl EdgeSpan {
	/// Creates a new EdgeSpan
	pub fn new(root: Cell, dir: Dir, length: i32) -> EdgeSpan {
		debug_assert!(dir == Dir::East || dir == Dir::North, "invalid span direction {dir:?}");
		debug_assert!(length > 0);
		EdgeSpan { root, dir, length }
	}

	/// The offset from a span Cell to the Cell across the boundary
	pub fn across(&self) -> (i32, i32) {
		match self.dir {
			Dir::East => (0, 1),
			_ => (1, 0),
		}
	}

	/// The Cells of the run
	pub fn cells(&self) -> impl Iterator<Item = Cell> {
		let (dx, dz) = self.dir.offset();
		let root = self.root;
		(0..self.length).map(move |i| root.offset(dx * i, dz * i))
	}

	/// The Cells on the other side of the boundary
	pub fn across_cells(&self) -> impl Iterator<Item = Cell> {
		let (ax, az) = self.across();
		self.cells().map(move |c| c.offset(ax, az))
	}

	/// The Cell in the middle of the run
	pub fn center(&self) -> Cell {
		let (dx, dz) = self.dir.offset();
		let half = (self.length - 1) / 2;
		self.root.offset(dx * half, dz * half)
	}

	/// The Cell of the run closest to `cell`
	pub fn closest_cell_to(&self, cell: Cell) -> Cell {
		let (dx, dz) = self.dir.offset();
		let along = if dx != 0 {
			cell.x - self.root.x
		} else {
			cell.z - self.root.z
		};
		let i = along.clamp(0, self.length - 1);
		self.root.offset(dx * i, dz * i)
	}

	/// A hash that is unique per span on a map of the given size
	pub fn unique_hash(&self, size: MapSize) -> u64 {
		let root = size.index_of(self.root) as u64;
		(root << 24) | ((self.dir.num() as u64) << 22) | (self.length as u64 & 0x3F_FFFF)
	}
}

/// A boundary shared by at most two Regions
#[derive(Clone, Debug)]
pub(crate) struct RegionLink {
	pub span: EdgeSpan,
	pub regions: [Option<usize>; 2],
}

impl RegionLink {
	fn new(span: EdgeSpan) -> RegionLink {
		RegionLink {
			span,
			regions: [None, None],
		}
	}

	pub fn register(&mut self, region: usize) -> Result<(), RegionBuildError> {
		if self.regions.contains(&Some(region)) {
			return Err(RegionBuildError::DoubleRegistration(self.span.root));
		}
		match self.regions.iter_mut().find(|r| r.is_none()) {
			Some(slot) => {
				*slot = Some(region);
				Ok(())
			}
			None => Err(RegionBuildError::LinkFull(self.span.root)),
		}
	}

	/// Removes `region` from the link. Returns `true` if no Region is left.
	pub fn deregister(&mut self, region: usize) -> bool {
		for slot in self.regions.iter_mut() {
			if *slot == Some(region) {
				*slot = None;
			}
		}
		self.regions == [None, None]
	}

	/// The Region on the other side of `region`
	pub fn other(&self, region: usize) -> Option<usize> {
		match self.regions {
			[Some(a), b] if a == region => b,
			[a, Some(b)] if b == region => a,
			_ => None,
		}
	}

	pub fn has(&self, region: usize) -> bool {
		self.regions.contains(&Some(region))
	}
}

/// The deduplicated store of all links of a graph
#[derive(Debug)]
pub(crate) struct RegionLinkTable {
	size: MapSize,
	links: Slab<RegionLink>,
	by_hash: IdMap<u64, usize>,
}

impl RegionLinkTable {
	pub fn new(size: MapSize) -> RegionLinkTable {
		RegionLinkTable {
			size,
			links: Slab::new(),
			by_hash: id_map(),
		}
	}

	/// The link for `span`, created if it doesn't exist yet
	pub fn link_for(&mut self, span: EdgeSpan) -> usize {
		let links = &mut self.links;
		*self
			.by_hash
			.entry(span.unique_hash(self.size))
			.or_insert_with(|| links.insert(RegionLink::new(span)))
	}

	/// Removes `region` from a link, deleting the link once no Region is left on it
	pub fn deregister(&mut self, link: usize, region: usize) {
		let Some(l) = self.links.get_mut(link) else {
			log::error!("deregistering region {region} from unknown link {link}");
			return;
		};
		if l.deregister(region) {
			let span = l.span;
			self.by_hash.remove(&span.unique_hash(self.size));
			self.links.remove(link);
		}
	}

	pub fn get(&self, link: usize) -> &RegionLink {
		&self.links[link]
	}

	pub fn get_mut(&mut self, link: usize) -> &mut RegionLink {
		&mut self.links[link]
	}

	pub fn len(&self) -> usize {
		self.links.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = (usize, &RegionLink)> {
		self.links.iter()
	}

	pub fn clear(&mut self) {
		self.links.clear();
		self.by_hash.clear();
	}
}
