//! The per-printer processing worker (spec.md §5): spawned lazily on the
//! first pending job, parked between jobs, picks the lowest-id pending job,
//! invokes the driver's print callback with no lock held, and files the
//! result.

use crate::driver::PrintContext;
use crate::job::State as JobState;
use crate::printer::Printer;
use crate::system::System;
use std::panic;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::SystemTime;

/// Spawns the processing worker for `printer` if it hasn't started yet.
/// Idempotent: concurrent callers racing on job creation only spawn one
/// thread, via `Printer::mark_worker_spawned`'s compare-exchange.
pub fn ensure_worker(system: Arc<System>, printer: Arc<Printer>) {
    if !printer.mark_worker_spawned() {
        return;
    }
    let printer_for_handle = printer.clone();
    let handle = std::thread::Builder::new()
        .name(format!("printer-{}-worker", printer.id))
        .spawn(move || worker_loop(system, printer))
        .expect("failed to spawn printer processing worker");
    printer_for_handle.set_worker_handle(handle);
}

fn worker_loop(system: Arc<System>, printer: Arc<Printer>) {
    loop {
        if !printer.wait_for_work() {
            return;
        }
        loop {
            let picked = pick_next_job(&printer);
            let Some(job_id) = picked else { break };
            run_one_job(&system, &printer, job_id);
        }
    }
}

/// Selects and transitions the lowest-id pending job to `processing` under
/// the write lock, returning its id, or `None` if nothing is pending, a job
/// is already processing (at most one per printer, spec.md invariant 1), or
/// the printer is paused/pausing (Pause-Printer lets the current job finish
/// but holds every pending job until Resume-Printer, spec.md §8 scenario 5).
fn pick_next_job(printer: &Arc<Printer>) -> Option<i32> {
    let mut state = printer.state.write().unwrap();
    if state.processing_job.is_some() || state.is_stopped {
        return None;
    }
    let idx = state
        .active_jobs
        .iter()
        .enumerate()
        .filter(|(_, j)| j.state == JobState::Pending)
        .min_by_key(|(_, j)| j.id)
        .map(|(idx, _)| idx)?;
    let job = &mut state.active_jobs[idx];
    job.state = JobState::Processing;
    job.processing_at = Some(SystemTime::now());
    let id = job.id;
    state.processing_job = Some(id);
    Printer::recompute_state(&mut state);
    Some(id)
}

fn run_one_job(system: &Arc<System>, printer: &Arc<Printer>, job_id: i32) {
    let (driver_name, device_uri, snapshot, cancel_flag) = {
        let state = printer.state.read().unwrap();
        let job = state.active_jobs.iter().find(|j| j.id == job_id).unwrap();
        (
            state.driver_data.driver_name.clone(),
            state.device_uri.clone(),
            job.snapshot(),
            job.cancel_requested.clone(),
        )
    };

    let outcome = (|| -> anyhow::Result<()> {
        let driver = system
            .drivers
            .get(&driver_name)
            .ok_or_else(|| anyhow::anyhow!("no driver registered for {driver_name:?}"))?;
        let mut device = system.devices.open(&device_uri)?;
        let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            let mut ctx = PrintContext {
                job: &snapshot,
                device: device.as_mut(),
                cancel_requested: cancel_flag.clone(),
            };
            driver.print(&mut ctx)
        }));
        device.close().ok();
        match result {
            Ok(r) => r,
            Err(_) => Err(anyhow::anyhow!("driver callback panicked")),
        }
    })();

    let canceled = cancel_flag.load(Ordering::Relaxed);
    let mut state = printer.state.write().unwrap();
    let idx = state
        .active_jobs
        .iter()
        .position(|j| j.id == job_id)
        .expect("job still in active_jobs while processing");
    let mut job = state.active_jobs.remove(idx).unwrap();
    job.completed_at = Some(SystemTime::now());
    job.state = if canceled {
        JobState::Canceled
    } else {
        match &outcome {
            Ok(()) => {
                job.impressions_completed = job.impressions_requested.max(1);
                JobState::Completed
            }
            Err(_) => JobState::Aborted,
        }
    };
    if job.state == JobState::Completed {
        state.impressions_completed += job.impressions_completed;
    }
    job.unlink_spool();
    state.completed_jobs.push_front(job);
    while state.completed_jobs.len() > state.max_completed_jobs {
        state.completed_jobs.pop_back();
    }
    state.processing_job = None;
    Printer::recompute_state(&mut state);
    drop(state);
    system.schedule_save();
    printer.notify_work();
}
