//! The background thread that runs path searches and Region rebuilds of one map.
//!
//! Jobs run strictly in the order they were enqueued. With multithreading disabled they run on
//! the thread that enqueues them, draining the same FIFO queue, so the observable ordering is
//! identical in both modes. Results travel back through [`PathTicket`]s, which the caller polls
//! on its own schedule.

use crate::path::Path;
use crate::utils::lock;
use crate::NoPath;

use std::collections::VecDeque;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

/// A unit of work for a `DedicatedWorker`
type Job = Box<dyn FnOnce() + Send + 'static>;

/// A FIFO job queue with a single consumer.
///
/// ## Examples
/// ```
/// # use region_pathing::DedicatedWorker;
/// use std::sync::{Arc, Mutex};
///
/// let worker = DedicatedWorker::new("example", false);
/// let log = Arc::new(Mutex::new(vec![]));
/// for i in 0..3 {
///     let log = log.clone();
///     worker.enqueue(move || log.lock().unwrap().push(i));
/// }
/// assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
/// ```
pub struct DedicatedWorker {
	name: String,
	mode: WorkerMode,
}

enum WorkerMode {
	Threaded {
		sender: Mutex<Option<Sender<Job>>>,
		handle: Option<JoinHandle<()>>,
	},
	Inline {
		queue: Mutex<VecDeque<Job>>,
		draining: AtomicBool,
	},
}

impl fmt::Debug for DedicatedWorker {
	fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
		fmt.debug_struct("DedicatedWorker")
			.field("name", &self.name)
			.field("inline", &self.is_inline())
			.finish()
	}
}

fn run_job(name: &str, job: Job) {
	if catch_unwind(AssertUnwindSafe(job)).is_err() {
		log::error!("a job on worker {name} panicked");
	}
}

impl DedicatedWorker {
	/// Starts a worker. Without `multithreading` no thread is spawned and jobs run inline.
	///
	/// If the thread cannot be spawned, the worker falls back to running jobs inline.
	pub fn new(name: &str, multithreading: bool) -> DedicatedWorker {
		let inline = || WorkerMode::Inline {
			queue: Mutex::new(VecDeque::new()),
			draining: AtomicBool::new(false),
		};
		if !multithreading {
			return DedicatedWorker {
				name: name.to_owned(),
				mode: inline(),
			};
		}

		let (sender, receiver) = channel::<Job>();
		let thread_name = name.to_owned();
		let spawned = thread::Builder::new()
			.name(format!("pathing-{name}"))
			.spawn(move || {
				log::debug!("worker {thread_name} started");
				while let Ok(job) = receiver.recv() {
					run_job(&thread_name, job);
				}
				log::debug!("worker {thread_name} stopped");
			});
		let mode = match spawned {
			Ok(handle) => WorkerMode::Threaded {
				sender: Mutex::new(Some(sender)),
				handle: Some(handle),
			},
			Err(err) => {
				log::error!("could not spawn worker {name}, running jobs inline: {err}");
				inline()
			}
		};
		DedicatedWorker {
			name: name.to_owned(),
			mode,
		}
	}

	/// The name given at creation
	pub fn name(&self) -> &str {
		&self.name
	}

	/// `true` if jobs run on the enqueuing thread
	pub fn is_inline(&self) -> bool {
		matches!(self.mode, WorkerMode::Inline { .. })
	}

	/// Appends a job to the queue. Returns `false` if the worker is shut down, in which case the
	/// job is dropped without running.
	pub fn enqueue(&self, job: impl FnOnce() + Send + 'static) -> bool {
		self.enqueue_boxed(Box::new(job))
	}

	fn enqueue_boxed(&self, job: Job) -> bool {
		match &self.mode {
			WorkerMode::Threaded { sender, .. } => match lock(sender).as_ref() {
				Some(sender) => sender.send(job).is_ok(),
				None => false,
			},
			WorkerMode::Inline { queue, draining } => {
				lock(queue).push_back(job);
				// a job that enqueues more work has its follow-ups run after it returns
				if draining.swap(true, Ordering::Acquire) {
					return true;
				}
				loop {
					let next = lock(queue).pop_front();
					match next {
						Some(job) => run_job(&self.name, job),
						None => break,
					}
				}
				draining.store(false, Ordering::Release);
				true
			}
		}
	}

	/// Stops accepting jobs and waits for the queued ones to finish
	pub fn shutdown(&mut self) {
		if let WorkerMode::Threaded { sender, handle } = &mut self.mode {
			lock(sender).take();
			if let Some(handle) = handle.take() {
				if handle.join().is_err() {
					log::error!("worker {} did not stop cleanly", self.name);
				}
			}
		}
	}
}

impl Drop for DedicatedWorker {
	fn drop(&mut self) {
		self.shutdown();
	}
}

#[derive(Debug)]
enum TicketState {
	Pending,
	Ready(Result<Path, NoPath>),
	Taken,
}

#[derive(Debug)]
struct TicketSlot {
	state: Mutex<TicketState>,
	ready: Condvar,
}

/// The single-slot handoff of an asynchronous path request.
///
/// Clones refer to the same slot. The result can be taken exactly once.
#[derive(Clone, Debug)]
pub struct PathTicket {
	slot: Arc<TicketSlot>,
}

impl PathTicket {
	pub(crate) fn new() -> PathTicket {
		PathTicket {
			slot: Arc::new(TicketSlot {
				state: Mutex::new(TicketState::Pending),
				ready: Condvar::new(),
			}),
		}
	}

	/// Stores the result. Only the first call has an effect.
	pub(crate) fn fulfill(&self, result: Result<Path, NoPath>) {
		let mut state = lock(&self.slot.state);
		if matches!(*state, TicketState::Pending) {
			*state = TicketState::Ready(result);
			self.slot.ready.notify_all();
		}
	}

	/// `true` once a result is waiting to be taken
	pub fn is_ready(&self) -> bool {
		matches!(*lock(&self.slot.state), TicketState::Ready(_))
	}

	/// Takes the result if the request is finished
	pub fn poll(&self) -> Option<Result<Path, NoPath>> {
		let mut state = lock(&self.slot.state);
		match std::mem::replace(&mut *state, TicketState::Taken) {
			TicketState::Ready(result) => Some(result),
			other => {
				*state = other;
				None
			}
		}
	}

	/// Blocks until the request is finished and takes the result.
	///
	/// Returns [`NoPath::WorkerGone`] if the result was already taken.
	pub fn wait(&self) -> Result<Path, NoPath> {
		let mut state = lock(&self.slot.state);
		while matches!(*state, TicketState::Pending) {
			state = self
				.slot
				.ready
				.wait(state)
				.unwrap_or_else(std::sync::PoisonError::into_inner);
		}
		match std::mem::replace(&mut *state, TicketState::Taken) {
			TicketState::Ready(result) => result,
			_ => Err(NoPath::WorkerGone),
		}
	}
}

/// Resolves its ticket with [`NoPath::WorkerGone`] if it is dropped before the job produced a
/// result, so waiting callers never hang on a job that will not run.
pub(crate) struct TicketGuard(pub PathTicket);

impl Drop for TicketGuard {
	fn drop(&mut self) {
		self.0.fulfill(Err(NoPath::WorkerGone));
	}
}
