use nanorand::{Rng, WyRand};
use region_pathing::host::{Door, GridMap, TerrainDef, TerrainKind, Thing};
use region_pathing::prelude::*;
use region_pathing::{CancelToken, IMPASSABLE};

use std::sync::Arc;

fn init() {
	let _ = env_logger::builder().is_test(true).try_init();
}

fn build(world: GridMap, classes: Vec<MoverClass>, config: PathingConfig) -> (Arc<GridMap>, PathingMap<GridMap>) {
	let world = Arc::new(world);
	let map = PathingMap::new(world.clone(), classes, config);
	(world, map)
}

fn walker_map(world: GridMap) -> (Arc<GridMap>, PathingMap<GridMap>) {
	build(world, vec![MoverClass::new("walker")], PathingConfig::SYNCHRONOUS)
}

/// A map with roughly `density` percent of its Cells walled in
fn random_world(width: i32, height: i32, density: u32, seed: u64) -> GridMap {
	let world = GridMap::open(width, height);
	let mut rng = WyRand::new_seed(seed);
	for cell in world.size().cells().collect::<Vec<_>>() {
		if rng.generate_range(0..100u32) < density {
			world.build_wall(cell);
		}
	}
	world
}

fn random_cell(rng: &mut WyRand, size: MapSize) -> Cell {
	Cell::new(
		rng.generate_range(0..size.width as u32) as i32,
		rng.generate_range(0..size.height as u32) as i32,
	)
}

const WALKER: MoverClassId = MoverClassId(0);

#[test]
fn crossing_an_empty_map() {
	init();
	let (_, map) = walker_map(GridMap::open(50, 50));
	let path = map
		.find_path(&PathRequest::new(Cell::new(0, 0), Cell::new(49, 49), WALKER))
		.unwrap();
	assert_eq!(path.start(), Some(Cell::new(0, 0)));
	assert_eq!(path.dest(), Some(Cell::new(49, 49)));
	assert!(path.len() >= 50);

	let tp = TraverseParms::default();
	let mut last = 0;
	for end in 1..=path.len() {
		let prefix = Path::from_slice(&path.cells()[..end], 0);
		let cost = map.path_cost_of(WALKER, &prefix, &tp).unwrap();
		assert!(cost >= last);
		last = cost;
	}
	assert_eq!(last, path.cost());
}

#[test]
fn closing_the_only_gap() {
	init();
	let world = GridMap::open(50, 50);
	for x in (0..50).filter(|&x| x != 30) {
		world.build_wall(Cell::new(x, 25));
	}
	let (world, map) = walker_map(world);
	let (start, dest) = (Cell::new(5, 5), Cell::new(5, 45));
	let reach = |map: &PathingMap<GridMap>| {
		map.can_reach(start, dest, WALKER, TraverseParms::default(), PathEndMode::OnCell)
	};

	assert!(reach(&map));
	let path = map.find_path(&PathRequest::new(start, dest, WALKER)).unwrap();
	assert!(path.iter().any(|&c| c == Cell::new(30, 25)));

	let rect = world.build_wall(Cell::new(30, 25));
	map.notify_thing_spawned(rect, WALKER);
	assert!(!reach(&map));
	assert_eq!(
		map.find_path(&PathRequest::new(start, dest, WALKER)),
		Err(NoPath::Unreachable)
	);

	let rect = world.remove_walls(Cell::new(30, 25));
	map.notify_thing_despawned(rect, WALKER);
	assert!(reach(&map));
	assert!(map.check_consistency(WALKER).is_ok());
}

#[test]
fn identical_classes_share_one_graph() {
	init();
	let (_, map) = build(
		GridMap::open(30, 30),
		vec![
			MoverClass::new("walker"),
			MoverClass::new("runner").with_move_ticks(8, 11),
		],
		PathingConfig::SYNCHRONOUS,
	);
	let runner = MoverClassId(1);
	assert_eq!(map.owner_of(runner), Some(WALKER));
	assert_eq!(map.region_build_count(WALKER), 1);

	let cell = Cell::new(17, 4);
	assert_eq!(map.region_at(cell, runner), map.region_at(cell, WALKER));
	assert!(map.region_at(cell, runner).is_some());
	assert_eq!(map.region_build_count(WALKER), 1);
	assert_eq!(map.region_build_count(runner), 1);
}

#[test]
fn spawning_only_invalidates_nearby_regions() {
	init();
	let config = PathingConfig {
		region_size: 12,
		..PathingConfig::SYNCHRONOUS
	};
	let (world, map) = build(GridMap::open(48, 48), vec![MoverClass::new("walker")], config);
	let samples = [
		Cell::new(5, 5),
		Cell::new(13, 13),
		Cell::new(22, 22),
		Cell::new(30, 17),
		Cell::new(17, 40),
	];
	let before: Vec<_> = samples.iter().map(|&c| map.region_at(c, WALKER)).collect();

	// the expanded rect (16, 16)..=(19, 19) stays inside the box (12, 12)..=(23, 23)
	let rect = world.spawn(
		CellRect::new(17, 17, 18, 18),
		Thing::wall(world.next_thing_id(), 9, 100),
	);
	map.notify_thing_spawned(rect, WALKER);

	let after: Vec<_> = samples.iter().map(|&c| map.region_at(c, WALKER)).collect();
	assert_eq!(after[0], before[0]);
	assert_ne!(after[1], before[1]);
	assert_ne!(after[2], before[2]);
	assert_eq!(after[3], before[3]);
	assert_eq!(after[4], before[4]);
	assert_eq!(map.region_at(Cell::new(17, 17), WALKER), None);
	assert!(map.check_consistency(WALKER).is_ok());
}

/// Three walls with gaps on alternating ends, forcing a long zig-zag
fn comb() -> GridMap {
	let world = GridMap::open(40, 40);
	for (x, gap) in [(10, 38), (20, 1), (30, 38)] {
		for z in (0..40).filter(|&z| z != gap) {
			world.build_wall(Cell::new(x, z));
		}
	}
	world
}

#[test]
fn escalated_searches_stay_close_to_plain_ones() {
	init();
	let request = PathRequest::new(Cell::new(2, 2), Cell::new(37, 2), WALKER);
	let (_, plain_map) = walker_map(comb());
	let plain = plain_map.find_path(&request).unwrap();

	let config = PathingConfig {
		region_heuristic_threshold: 20,
		region_size: 6,
		..PathingConfig::SYNCHRONOUS
	};
	let (_, map) = build(comb(), vec![MoverClass::new("walker")], config);
	let escalated = map.find_path(&request).unwrap();
	assert_eq!(escalated.dest(), Some(Cell::new(37, 2)));
	assert!(escalated.cost() <= plain.cost() * 2, "{} vs {}", escalated.cost(), plain.cost());
	assert!(plain.cost() <= escalated.cost() * 2, "{} vs {}", plain.cost(), escalated.cost());
	assert_eq!(
		map.path_cost_of(WALKER, &escalated, &TraverseParms::default()),
		Some(escalated.cost())
	);
}

#[test]
fn concurrent_changes_to_independent_owners() {
	init();
	let walker = MoverClass::new("walker").with_thing_cost(10, IMPASSABLE);
	let swimmer = MoverClass::new("swimmer").with_thing_cost(20, IMPASSABLE);
	let (world, map) = build(GridMap::open(40, 40), vec![walker, swimmer], PathingConfig::SYNCHRONOUS);
	let swimmer = MoverClassId(1);
	assert_eq!(map.owner_of(swimmer), Some(swimmer));

	std::thread::scope(|scope| {
		for (class, kind, seed) in [(WALKER, 10, 1), (swimmer, 20, 2)] {
			let (world, map) = (&world, &map);
			scope.spawn(move || {
				let mut rng = WyRand::new_seed(seed);
				for _ in 0..150 {
					let cell = random_cell(&mut rng, world.size());
					// standable for everyone but the class that overrides its kind
					let post = Thing::new(world.next_thing_id(), kind, 0);
					let rect = world.spawn(CellRect::single(cell), post);
					map.notify_thing_spawned(rect, class);
					if rng.generate_range(0..4u32) == 0 {
						map.region_at(cell.offset(1, 0), class);
					}
				}
			});
		}
	});

	for class in [WALKER, swimmer] {
		assert_eq!(map.check_consistency(class), Ok(()));
		let stats = map.region_stats(class).unwrap();
		assert!(stats.regions > 0 && stats.rooms > 0);
		assert_eq!(stats.dirty_cells, 0);
	}
}

#[test]
fn random_changes_keep_the_graph_consistent() {
	init();
	let config = PathingConfig {
		region_size: 7,
		..PathingConfig::SYNCHRONOUS
	};
	let (world, map) = build(random_world(35, 35, 20, 11), vec![MoverClass::new("walker")], config);
	assert_eq!(map.check_consistency(WALKER), Ok(()));

	let mut rng = WyRand::new_seed(5);
	for round in 0..60 {
		let cell = random_cell(&mut rng, world.size());
		if rng.generate_range(0..2u32) == 0 {
			let rect = world.build_wall(cell);
			map.notify_thing_spawned(rect, WALKER);
		} else {
			let rect = world.remove_walls(cell);
			map.notify_thing_despawned(rect, WALKER);
		}
		if round % 10 == 0 {
			assert_eq!(map.check_consistency(WALKER), Ok(()), "after round {round}");
		}
	}
	assert_eq!(map.check_consistency(WALKER), Ok(()));
}

#[test]
fn door_placed_on_a_wall_gets_a_region() {
	init();
	let (world, map) = walker_map(GridMap::open(10, 10));
	let cell = Cell::new(4, 4);
	map.notify_thing_spawned(world.build_wall(cell), WALKER);
	assert_eq!(map.region_at(cell, WALKER), None);

	world.set_door(cell, Some(Door::new(true)));
	map.notify_cell_changed(cell, WALKER);
	assert!(map.region_at(cell, WALKER).is_some());
	assert_eq!(map.check_consistency(WALKER), Ok(()));

	world.set_door(cell, None);
	map.notify_cell_changed(cell, WALKER);
	assert_eq!(map.region_at(cell, WALKER), None);
	assert_eq!(map.check_consistency(WALKER), Ok(()));
}

/// Cells a default mover may enter, following the Region types: doors and fences count even
/// when something else on the Cell blocks it
fn enterable(map: &PathingMap<GridMap>, world: &GridMap, cell: Cell) -> bool {
	world.size().in_bounds(cell)
		&& (world.door_at(cell).is_some()
			|| world.fence_at(cell)
			|| map.path_cost_at(cell, WALKER).map_or(false, |c| c < IMPASSABLE))
}

/// Walkable Cells without a door or fence
fn plain_ground(map: &PathingMap<GridMap>, world: &GridMap, cell: Cell) -> bool {
	world.door_at(cell).is_none()
		&& !world.fence_at(cell)
		&& map.path_cost_at(cell, WALKER).map_or(false, |c| c < IMPASSABLE)
}

/// Breadth-first search over orthogonal steps between enterable Cells
fn cell_bfs(map: &PathingMap<GridMap>, world: &GridMap, start: Cell, dest: Cell) -> bool {
	let size = world.size();
	let mut seen = vec![false; size.num_cells()];
	let mut queue = std::collections::VecDeque::from([start]);
	seen[size.index_of(start)] = true;
	while let Some(cell) = queue.pop_front() {
		if cell == dest {
			return true;
		}
		for (dx, dz) in [(0, -1), (1, 0), (0, 1), (-1, 0)] {
			let next = cell.offset(dx, dz);
			if enterable(map, world, next) && !seen[size.index_of(next)] {
				seen[size.index_of(next)] = true;
				queue.push_back(next);
			}
		}
	}
	false
}

#[test]
fn random_doors_fences_and_terrain_keep_the_graph_consistent() {
	init();
	const ROCK: TerrainKind = 1;
	let config = PathingConfig {
		region_size: 6,
		..PathingConfig::SYNCHRONOUS
	};
	let tp = TraverseParms::default();
	for seed in 0..4 {
		let terrains = vec![TerrainDef::walkable(0), TerrainDef::IMPASSABLE];
		let world = GridMap::new(MapSize::new(24, 24), terrains);
		let (world, map) = build(world, vec![MoverClass::new("walker")], config);
		let mut rng = WyRand::new_seed(seed);

		for step in 0..150 {
			let cell = random_cell(&mut rng, world.size());
			match rng.generate_range(0..8u32) {
				0 => map.notify_thing_spawned(world.build_wall(cell), WALKER),
				1 => map.notify_thing_despawned(world.remove_walls(cell), WALKER),
				kind => {
					match kind {
						2 => world.set_door(cell, Some(Door::new(rng.generate_range(0..2u32) == 0))),
						3 => world.set_door(cell, None),
						4 => world.set_fence(cell, true),
						5 => world.set_fence(cell, false),
						6 => world.set_terrain(cell, ROCK),
						_ => world.set_terrain(cell, 0),
					};
					map.notify_cell_changed(cell, WALKER);
				}
			}
			if step % 25 != 24 {
				continue;
			}
			assert_eq!(map.check_consistency(WALKER), Ok(()), "seed {seed}, step {step}");
			for _ in 0..20 {
				let start = random_cell(&mut rng, world.size());
				let dest = random_cell(&mut rng, world.size());
				if !plain_ground(&map, &world, start) || !plain_ground(&map, &world, dest) {
					continue;
				}
				assert_eq!(
					map.can_reach(start, dest, WALKER, tp, PathEndMode::OnCell),
					cell_bfs(&map, &world, start, dest),
					"seed {seed}, step {step}: {start} -> {dest}"
				);
			}
		}
	}
}

#[test]
fn repeated_notifications_are_idempotent() {
	init();
	let (world, map) = walker_map(GridMap::open(30, 30));
	world.build_wall(Cell::new(14, 14));
	map.notify_cell_changed(Cell::new(14, 14), WALKER);
	let once = map.region_stats(WALKER).unwrap();
	assert!(once.dirty_cells > 0);
	map.notify_cell_changed(Cell::new(14, 14), WALKER);
	assert_eq!(map.region_stats(WALKER).unwrap(), once);

	// nothing changed at all
	assert!(map.check_consistency(WALKER).is_ok());
	let clean = map.region_stats(WALKER).unwrap();
	map.notify_cell_changed(Cell::new(3, 3), WALKER);
	assert_eq!(map.region_stats(WALKER).unwrap(), clean);
}

#[test]
fn cached_and_fresh_reachability_agree() {
	init();
	let (world, map) = walker_map(random_world(40, 40, 30, 3));
	let mut rng = WyRand::new_seed(9);
	let tp = TraverseParms::default();
	for _ in 0..200 {
		let start = random_cell(&mut rng, world.size());
		let dest = random_cell(&mut rng, world.size());
		map.clear_reachability_cache();
		let cold = map.can_reach(start, dest, WALKER, tp, PathEndMode::OnCell);
		let warm = map.can_reach(start, dest, WALKER, tp, PathEndMode::OnCell);
		assert_eq!(cold, warm, "{start} -> {dest}");
	}
}

#[test]
fn paths_match_reachability_and_replay() {
	init();
	let (world, map) = walker_map(random_world(30, 30, 25, 21));
	let mut rng = WyRand::new_seed(4);
	let tp = TraverseParms::default();
	let mut found = 0;
	for _ in 0..80 {
		let start = random_cell(&mut rng, world.size());
		let dest = random_cell(&mut rng, world.size());
		let reachable = map.can_reach(start, dest, WALKER, tp, PathEndMode::OnCell);
		match map.find_path(&PathRequest::new(start, dest, WALKER)) {
			Ok(path) => {
				assert!(reachable, "found a path {start} -> {dest} the graph rejects");
				assert_eq!(map.path_cost_of(WALKER, &path, &tp), Some(path.cost()));
				found += 1;
			}
			Err(err) => assert!(!err.is_precondition_violation(), "{err}"),
		}
	}
	assert!(found > 0);

	let jump = Path::new(vec![Cell::new(0, 0), Cell::new(9, 9)], 0);
	assert_eq!(map.path_cost_of(WALKER, &jump, &tp), None);
	let standing = Path::new(vec![Cell::new(0, 0), Cell::new(0, 0)], 0);
	assert_eq!(map.path_cost_of(WALKER, &standing, &tp), None);
}

#[test]
fn threaded_requests_match_synchronous_ones() {
	init();
	let world = Arc::new(comb());
	let sync = PathingMap::new(world.clone(), vec![MoverClass::new("walker")], PathingConfig::SYNCHRONOUS);
	let threaded = PathingMap::new(world, vec![MoverClass::new("walker")], PathingConfig::default());

	let requests: Vec<_> = [(2, 2), (15, 30), (25, 5)]
		.into_iter()
		.map(|(x, z)| PathRequest::new(Cell::new(x, z), Cell::new(37, 37), WALKER))
		.collect();
	let tickets: Vec<_> = requests
		.iter()
		.map(|r| threaded.request_path(r.clone()))
		.collect();
	for (request, ticket) in requests.iter().zip(tickets) {
		let expected = sync.find_path(request).map(|p| p.cost());
		assert_eq!(ticket.wait().map(|p| p.cost()), expected);
	}

	let cancel = CancelToken::new();
	cancel.cancel();
	let cancelled = PathRequest::new(Cell::new(2, 2), Cell::new(37, 2), WALKER).with_cancel(cancel);
	assert_eq!(threaded.request_path(cancelled).wait(), Err(NoPath::Cancelled));
}

#[test]
fn doors_rooms_and_cache_control() {
	init();
	let world = GridMap::open(20, 20);
	for cell in CellRect::new(5, 5, 10, 10).edge_cells() {
		if cell != Cell::new(5, 7) {
			world.build_wall(cell);
		}
	}
	let (world, map) = walker_map(world);
	let (inside, outside, door) = (Cell::new(7, 7), Cell::new(1, 1), Cell::new(5, 7));
	assert_eq!(map.room_at(inside, WALKER), map.room_at(outside, WALKER));
	assert_eq!(map.path_cost_at(inside, WALKER), Some(0));
	assert_eq!(map.path_cost_at(Cell::new(5, 5), WALKER), Some(IMPASSABLE));
	assert_eq!(map.path_cost_at(Cell::new(20, 5), WALKER), None);

	let mut locked = Door::new(false);
	locked.faction = Some(2);
	world.set_door(door, Some(locked));
	map.notify_cell_changed_all(door);
	assert_ne!(map.room_at(inside, WALKER), map.room_at(outside, WALKER));
	assert_eq!(map.room_touches_map_edge(inside, WALKER), Some(false));
	assert_eq!(map.room_touches_map_edge(outside, WALKER), Some(true));

	let member = TraverseParms::for_mover(1, Some(2));
	let stranger = TraverseParms::for_mover(2, Some(3));
	let reach = |tp: TraverseParms| map.can_reach(outside, inside, WALKER, tp, PathEndMode::OnCell);
	assert!(reach(member));
	assert!(!reach(stranger));
	assert!(reach(TraverseParms::default()));
	map.clear_reachability_for_faction(3);
	map.clear_reachability_for_mover(2);
	assert!(!reach(stranger));

	world.set_door_faction(door, Some(3));
	map.notify_cell_changed_all(door);
	assert!(reach(stranger));
	assert!(!reach(member));
	assert_eq!(map.check_consistency(WALKER), Ok(()));

	let ran = Arc::new(std::sync::atomic::AtomicBool::new(false));
	let flag = ran.clone();
	assert!(map.run_on_worker(move || flag.store(true, std::sync::atomic::Ordering::SeqCst)));
	assert!(ran.load(std::sync::atomic::Ordering::SeqCst));
}
