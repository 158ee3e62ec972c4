use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

// Poisoned locks are recovered. No invariant spans more than one lock.

pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
	lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
	lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// A piecewise linear curve through a sorted list of `(x, y)` points, clamped at both ends.
#[derive(Clone, Copy, Debug)]
pub struct SimpleCurve<const N: usize> {
	points: [(f32, f32); N],
}

impl<const N: usize> SimpleCurve<N> {
	pub const fn new(points: [(f32, f32); N]) -> Self {
		Self { points }
	}

	pub fn evaluate(&self, x: f32) -> f32 {
		let points = &self.points;
		if N == 0 {
			return 0.0;
		}
		if x <= points[0].0 {
			return points[0].1;
		}
		for pair in points.windows(2) {
			let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
			if x <= x1 {
				if x1 <= x0 {
					return y1;
				}
				let t = (x - x0) / (x1 - x0);
				return y0 + (y1 - y0) * t;
			}
		}
		points[N - 1].1
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn curve_interpolates_and_clamps() {
		let curve = SimpleCurve::new([(40.0, 1.0), (120.0, 2.8)]);
		assert_eq!(curve.evaluate(0.0), 1.0);
		assert_eq!(curve.evaluate(500.0), 2.8);
		assert!((curve.evaluate(80.0) - 1.9).abs() < 1e-5);
	}
}
