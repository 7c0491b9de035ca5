pub mod attributes;
pub mod driver_data;
pub mod ops;

use crate::job::{Job, State as JobState};
use crate::persist::PrinterRecord;
use driver_data::PrinterDriverData;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Condvar, Mutex, RwLock};
use std::thread::JoinHandle;
use std::time::{Instant, SystemTime};
use uuid::Uuid;

/// `printer->state` ∈ {idle, processing, stopped} (spec.md §3 invariant 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Processing,
    Stopped,
}

pub struct PrinterIdentity {
    pub name: String,
    pub uuid: Uuid,
    pub info: Option<String>,
    pub make_and_model: Option<String>,
    pub location: Option<String>,
    pub geo_location: Option<String>,
    pub organization: Option<String>,
    pub organizational_unit: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_telephone: Option<String>,
}

/// All mutable printer state, guarded by a single reader-writer lock
/// (spec.md §5: "Per-printer reader-writer lock guards all printer
/// fields").
pub struct PrinterState {
    pub identity: PrinterIdentity,
    pub driver_data: PrinterDriverData,
    pub device_uri: String,
    pub state: State,
    pub state_reasons: Vec<String>,
    pub is_stopped: bool,
    pub processing_job: Option<i32>,
    pub active_jobs: VecDeque<Job>,
    pub completed_jobs: VecDeque<Job>,
    pub max_completed_jobs: usize,
    pub impressions_completed: i32,
    pub start_time: Instant,
    pub config_time: SystemTime,
    pub state_time: SystemTime,
    pub last_status_refresh: Option<Instant>,
}

/// A logical printer, owned by the [`crate::system::System`] and identified
/// by a small positive, never-reused (within the run) integer id.
pub struct Printer {
    pub id: i32,
    pub state: RwLock<PrinterState>,
    next_job_id: AtomicI32,
    /// Work-available / shutdown signal for the processing worker. Kept
    /// separate from `state` because `Condvar::wait` requires a
    /// `std::sync::Mutex`, not a `RwLock`; acquisition order is always
    /// `state` before `work_signal`, so this still honors "parked on a
    /// condition variable guarded by the printer lock" in spirit (see
    /// DESIGN.md).
    work_signal: (Mutex<bool>, Condvar),
    worker_spawned: AtomicBool,
    worker_handle: Mutex<Option<JoinHandle<()>>>,
    pub deleted: AtomicBool,
}

impl Printer {
    pub fn new(id: i32, name: String, device_uri: String, driver_data: PrinterDriverData) -> Self {
        let now = SystemTime::now();
        Self {
            id,
            state: RwLock::new(PrinterState {
                identity: PrinterIdentity {
                    name,
                    uuid: Uuid::new_v4(),
                    info: None,
                    make_and_model: None,
                    location: None,
                    geo_location: None,
                    organization: None,
                    organizational_unit: None,
                    contact_name: None,
                    contact_email: None,
                    contact_telephone: None,
                },
                driver_data,
                device_uri,
                state: State::Idle,
                state_reasons: vec!["none".to_string()],
                is_stopped: false,
                processing_job: None,
                active_jobs: VecDeque::new(),
                completed_jobs: VecDeque::new(),
                max_completed_jobs: 100,
                impressions_completed: 0,
                start_time: Instant::now(),
                config_time: now,
                state_time: now,
                last_status_refresh: None,
            }),
            next_job_id: AtomicI32::new(1),
            work_signal: (Mutex::new(false), Condvar::new()),
            worker_spawned: AtomicBool::new(false),
            worker_handle: Mutex::new(None),
            deleted: AtomicBool::new(false),
        }
    }

    pub fn from_record(record: PrinterRecord, mut driver_data: PrinterDriverData) -> Self {
        if !record.media_ready.is_empty() {
            driver_data.media_ready = record.media_ready;
        }
        if !record.supplies.is_empty() {
            driver_data.supplies = record.supplies;
        }
        let printer = Self::new(record.id, record.name, record.device_uri, driver_data);
        {
            let mut state = printer.state.write().unwrap();
            state.identity.uuid = record.uuid;
            state.identity.location = record.location;
            state.identity.organization = record.organization;
            state.identity.organizational_unit = record.organizational_unit;
            state.identity.contact_name = record.contact_name;
            state.identity.contact_email = record.contact_email;
            state.identity.contact_telephone = record.contact_telephone;
        }
        printer
            .next_job_id
            .store(record.next_job_id, Ordering::SeqCst);
        printer
    }

    pub fn alloc_job_id(&self) -> i32 {
        self.next_job_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn peek_next_job_id(&self) -> i32 {
        self.next_job_id.load(Ordering::SeqCst)
    }

    /// Wakes the processing worker (spawning it on first use) to reconsider
    /// `active_jobs`.
    pub fn notify_work(&self) {
        let (lock, cvar) = &self.work_signal;
        let mut has_work = lock.lock().unwrap();
        *has_work = true;
        cvar.notify_one();
    }

    pub fn request_shutdown(&self) {
        let (lock, cvar) = &self.work_signal;
        let mut has_work = lock.lock().unwrap();
        *has_work = true;
        cvar.notify_all();
    }

    /// Parks until either work is signaled or the printer is deleted.
    /// Returns `false` when the worker should exit.
    pub(crate) fn wait_for_work(&self) -> bool {
        let (lock, cvar) = &self.work_signal;
        let mut has_work = lock.lock().unwrap();
        while !*has_work {
            if self.deleted.load(Ordering::SeqCst) {
                return false;
            }
            has_work = cvar.wait(has_work).unwrap();
        }
        *has_work = false;
        !self.deleted.load(Ordering::SeqCst)
    }

    pub fn is_worker_spawned(&self) -> bool {
        self.worker_spawned.load(Ordering::SeqCst)
    }

    pub fn mark_worker_spawned(&self) -> bool {
        self.worker_spawned
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn set_worker_handle(&self, handle: JoinHandle<()>) {
        *self.worker_handle.lock().unwrap() = Some(handle);
    }

    pub fn join_worker(&self) {
        if let Some(handle) = self.worker_handle.lock().unwrap().take() {
            let _ = handle.join();
        }
    }

    /// Recomputes `state` from `processing_job`/`is_stopped`
    /// (spec.md §3 invariant 4). Caller must hold the write lock.
    pub fn recompute_state(state: &mut PrinterState) {
        state.state = if state.processing_job.is_some() {
            State::Processing
        } else if state.is_stopped {
            State::Stopped
        } else {
            State::Idle
        };
        state.state_time = SystemTime::now();
    }

    /// `printer-state-reasons`, with the `moving-to-paused`/`paused`
    /// special encoding from the original C `_papplPrinterCopyState`.
    pub fn effective_state_reasons(state: &PrinterState) -> Vec<String> {
        let mut reasons: Vec<String> = state
            .state_reasons
            .iter()
            .filter(|r| *r != "none")
            .cloned()
            .collect();
        if state.is_stopped && state.state != State::Stopped {
            reasons.push("moving-to-paused".to_string());
        } else if state.is_stopped && state.state == State::Stopped {
            reasons.push("paused".to_string());
        }
        if reasons.is_empty() {
            vec!["none".to_string()]
        } else {
            reasons
        }
    }
}

pub fn job_state_counts(jobs: &VecDeque<Job>) -> (usize, usize) {
    let processing = jobs.iter().filter(|j| j.state == JobState::Processing).count();
    let pending = jobs.iter().filter(|j| j.state == JobState::Pending).count();
    (pending, processing)
}
