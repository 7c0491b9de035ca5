//! End-to-end coverage for the scenarios in spec.md §8: a printer is built
//! from the same public constructors a host application uses (`System`,
//! `Printer`, `DriverRegistry`, `device::Registry`), admitted through
//! `printer::ops` with hand-built `IppRequestResponse`s exactly as the
//! dispatcher would hand them off, and driven to completion through the
//! same processing worker (`job::pipeline`) a live server runs.
//!
//! Document bodies are attached via `job::spool_payload` directly rather
//! than through `Send-Document`'s wire parsing: the `ipp` crate's request
//! type only exposes attaching a payload through its async parser, so
//! these tests perform the same spool-then-mark-closed step
//! `printer::ops::send_document` does, then hand off to the worker the
//! same way.

use ipp::attribute::IppAttribute;
use ipp::model::{DelimiterTag, IppVersion, StatusCode};
use ipp::payload::IppPayload;
use ipp::request::IppRequestResponse;
use ipp::value::IppValue;
use pappl_core::device;
use pappl_core::driver::{DriverRegistry, PrintContext, PrinterDriver, StatusUpdate};
use pappl_core::job::pipeline;
use pappl_core::printer::driver_data::PrinterDriverData;
use pappl_core::printer::{ops, Printer, State as PrinterState};
use pappl_core::system::auth::AllowAll;
use pappl_core::system::{System, SystemOptions, TlsMode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn options() -> SystemOptions {
    SystemOptions {
        log_level: "info".to_string(),
        max_log_size: 0,
        auth_service: None,
        tls_mode: TlsMode::Off,
        port: 0,
        multi_queue: true,
        web_ui: false,
        raw_socket: false,
        usb_gadget: false,
    }
}

/// Completes every job instantly, writing the document bytes to the device.
struct InstantDriver;

impl PrinterDriver for InstantDriver {
    fn capabilities(&self) -> PrinterDriverData {
        PrinterDriverData {
            driver_name: "instant".to_string(),
            document_format_supported: vec![
                "application/octet-stream".to_string(),
                "image/pwg-raster".to_string(),
            ],
            ..Default::default()
        }
    }

    fn print(&self, ctx: &mut PrintContext) -> anyhow::Result<()> {
        ctx.device.write(b"printed")?;
        Ok(())
    }
}

/// Blocks until told to proceed, so tests can observe `processing` state and
/// exercise cooperative cancellation between page boundaries.
struct GatedDriver {
    release: Arc<std::sync::atomic::AtomicBool>,
    started: Arc<AtomicUsize>,
}

impl PrinterDriver for GatedDriver {
    fn capabilities(&self) -> PrinterDriverData {
        PrinterDriverData {
            driver_name: "gated".to_string(),
            ..Default::default()
        }
    }

    fn print(&self, ctx: &mut PrintContext) -> anyhow::Result<()> {
        self.started.fetch_add(1, Ordering::SeqCst);
        loop {
            if ctx.is_canceled() || self.release.load(Ordering::SeqCst) {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        Ok(())
    }

    fn status(&self, _device: Option<&mut dyn device::Device>) -> anyhow::Result<StatusUpdate> {
        Ok(StatusUpdate::default())
    }
}

fn new_system(spool_dir: &std::path::Path, drivers: DriverRegistry) -> Arc<System> {
    System::new(
        "testpappl".to_string(),
        spool_dir.to_path_buf(),
        options(),
        device::Registry::new(),
        drivers,
        Box::new(AllowAll),
    )
}

fn request(op_attrs: Vec<IppAttribute>) -> IppRequestResponse {
    let mut req = IppRequestResponse::new_response(IppVersion::v1_1(), StatusCode::SuccessfulOk, 1);
    for a in op_attrs {
        req.attributes_mut().add(DelimiterTag::OperationAttributes, a);
    }
    req
}

fn create_job_request(op_attrs: Vec<IppAttribute>, tmpl_attrs: Vec<IppAttribute>) -> IppRequestResponse {
    let mut req = request(op_attrs);
    for a in tmpl_attrs {
        req.attributes_mut().add(DelimiterTag::JobAttributes, a);
    }
    req
}

fn job_id_of(resp: &IppRequestResponse) -> i32 {
    match resp
        .attributes()
        .groups_of(DelimiterTag::PrinterAttributes)
        .find_map(|g| g.attributes().get("job-id"))
        .map(|a| a.value())
    {
        Some(IppValue::Integer(n)) => *n,
        _ => panic!("response is missing job-id"),
    }
}

/// Mirrors the tail of `printer::ops::send_document`: spools `bytes`,
/// attaches the spool path, marks the job closed, and wakes the worker.
async fn submit_document(system: &Arc<System>, printer: &Arc<Printer>, job_id: i32, bytes: &[u8]) {
    let payload = IppPayload::new(futures::io::Cursor::new(bytes.to_vec()));
    let (spool_path, _len) = pappl_core::job::spool_payload(&system.spool_dir, job_id, payload)
        .await
        .unwrap();
    {
        let mut state = printer.state.write().unwrap();
        let job = state.active_jobs.iter_mut().find(|j| j.id == job_id).unwrap();
        job.spool_path = Some(spool_path);
        job.closed = true;
    }
    pipeline::ensure_worker(system.clone(), printer.clone());
    printer.notify_work();
}

fn wait_until<F: Fn() -> bool>(f: F, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if f() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    f()
}

#[tokio::test]
async fn print_job_happy_path() {
    let spool = tempfile::tempdir().unwrap();
    let out = spool.path().join("out");
    let mut drivers = DriverRegistry::new();
    drivers.register("instant", Arc::new(InstantDriver));
    let system = new_system(spool.path(), drivers);

    let printer = system.add_printer(Printer::new(
        1,
        "Test Printer".to_string(),
        format!("file://{}", out.display()),
        InstantDriver.capabilities(),
    ));

    let req = create_job_request(
        vec![IppAttribute::new(
            "requesting-user-name",
            IppValue::NameWithoutLanguage("alice".to_string()),
        )],
        vec![
            IppAttribute::new("copies", IppValue::Integer(1)),
            IppAttribute::new("media", IppValue::Keyword("na_letter_8.5x11in".to_string())),
        ],
    );
    let resp = ops::create_job(&system, &printer, req).expect("create-job accepted");
    assert_eq!(resp.header().operation_or_status, StatusCode::SuccessfulOk as u16);
    let job_id = job_id_of(&resp);
    assert_eq!(job_id, 1);

    submit_document(&system, &printer, job_id, b"raster bytes").await;

    let completed = wait_until(
        || {
            let state = printer.state.read().unwrap();
            state.completed_jobs.iter().any(|j| j.id == job_id && j.state.is_terminal())
        },
        Duration::from_secs(5),
    );
    assert!(completed, "job did not reach a terminal state in time");

    let state = printer.state.read().unwrap();
    let job = state.completed_jobs.iter().find(|j| j.id == job_id).unwrap();
    assert_eq!(job.state, pappl_core::job::State::Completed);
    assert_eq!(state.impressions_completed, 1);
    drop(state);
    assert_eq!(std::fs::read(&out).unwrap(), b"printed");
}

#[tokio::test]
async fn admission_rejects_excessive_copies() {
    let spool = tempfile::tempdir().unwrap();
    let mut drivers = DriverRegistry::new();
    drivers.register("instant", Arc::new(InstantDriver));
    let system = new_system(spool.path(), drivers);
    let printer = system.add_printer(Printer::new(
        1,
        "Test Printer".to_string(),
        "file:///dev/null".to_string(),
        InstantDriver.capabilities(),
    ));

    let req = create_job_request(vec![], vec![IppAttribute::new("copies", IppValue::Integer(1000))]);
    let err = ops::print_job(&system, &printer, req).await.unwrap_err();
    match &err {
        pappl_core::error::AppError::AttributesNotSupported(bad) => {
            assert_eq!(bad.len(), 1);
            assert_eq!(bad[0].name(), "copies");
            assert_eq!(bad[0].value(), &IppValue::Integer(1000));
        }
        other => panic!("expected AttributesNotSupported, got {other:?}"),
    }
    assert_eq!(err.status_code(), StatusCode::ClientErrorAttributesOrValuesNotSupported);
}

#[tokio::test]
async fn jobs_process_in_id_order_regardless_of_document_arrival() {
    let spool = tempfile::tempdir().unwrap();
    let mut drivers = DriverRegistry::new();
    drivers.register("instant", Arc::new(InstantDriver));
    let system = new_system(spool.path(), drivers);
    let printer = system.add_printer(Printer::new(
        1,
        "Test Printer".to_string(),
        format!("file://{}", spool.path().join("out").display()),
        InstantDriver.capabilities(),
    ));

    let mut ids = Vec::new();
    for _ in 0..3 {
        let resp = ops::create_job(&system, &printer, create_job_request(vec![], vec![])).unwrap();
        ids.push(job_id_of(&resp));
    }
    assert_eq!(ids, vec![1, 2, 3]);

    // Documents arrive in reverse job-id order.
    for &id in ids.iter().rev() {
        submit_document(&system, &printer, id, b"doc").await;
    }

    let all_done = wait_until(
        || printer.state.read().unwrap().completed_jobs.len() == 3,
        Duration::from_secs(5),
    );
    assert!(all_done);

    let state = printer.state.read().unwrap();
    // completed_jobs is newest-completed-first; reversing gives processing order.
    let mut completed_order: Vec<i32> = state.completed_jobs.iter().map(|j| j.id).collect();
    completed_order.reverse();
    assert_eq!(completed_order, vec![1, 2, 3]);
}

#[tokio::test]
async fn cancel_job_while_processing() {
    let spool = tempfile::tempdir().unwrap();
    let release = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let started = Arc::new(AtomicUsize::new(0));
    let mut drivers = DriverRegistry::new();
    drivers.register(
        "gated",
        Arc::new(GatedDriver {
            release: release.clone(),
            started: started.clone(),
        }),
    );
    let system = new_system(spool.path(), drivers);
    let driver_data = GatedDriver {
        release: release.clone(),
        started: started.clone(),
    }
    .capabilities();
    let printer = system.add_printer(Printer::new(1, "Test Printer".to_string(), "file:///dev/null".to_string(), driver_data));

    let resp = ops::create_job(&system, &printer, create_job_request(vec![], vec![])).unwrap();
    let job_id = job_id_of(&resp);
    submit_document(&system, &printer, job_id, b"doc").await;

    let processing = wait_until(
        || printer.state.read().unwrap().state == PrinterState::Processing,
        Duration::from_secs(5),
    );
    assert!(processing, "job never reached processing");

    let cancel_req = request(vec![IppAttribute::new("job-id", IppValue::Integer(job_id))]);
    let resp = ops::cancel_job(&printer, cancel_req).expect("cancel-job accepted");
    assert_eq!(resp.header().operation_or_status, StatusCode::SuccessfulOk as u16);

    let canceled = wait_until(
        || {
            let state = printer.state.read().unwrap();
            state
                .completed_jobs
                .iter()
                .any(|j| j.id == job_id && j.state == pappl_core::job::State::Canceled)
        },
        Duration::from_secs(5),
    );
    release.store(true, Ordering::SeqCst);
    assert!(canceled, "job did not reach canceled in time");
}

#[tokio::test]
async fn pause_lets_current_job_finish_then_stops() {
    let spool = tempfile::tempdir().unwrap();
    let release = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let started = Arc::new(AtomicUsize::new(0));
    let mut drivers = DriverRegistry::new();
    drivers.register(
        "gated",
        Arc::new(GatedDriver {
            release: release.clone(),
            started: started.clone(),
        }),
    );
    let system = new_system(spool.path(), drivers);
    let driver_data = GatedDriver {
        release: release.clone(),
        started: started.clone(),
    }
    .capabilities();
    let printer = system.add_printer(Printer::new(1, "Test Printer".to_string(), "file:///dev/null".to_string(), driver_data));

    let mut job_ids = Vec::new();
    for _ in 0..2 {
        let resp = ops::create_job(&system, &printer, create_job_request(vec![], vec![])).unwrap();
        let id = job_id_of(&resp);
        job_ids.push(id);
        submit_document(&system, &printer, id, b"doc").await;
    }

    let started_ok = wait_until(|| started.load(Ordering::SeqCst) >= 1, Duration::from_secs(5));
    assert!(started_ok);

    let pause_resp = ops::pause_printer(&printer, request(vec![])).unwrap();
    assert_eq!(pause_resp.header().operation_or_status, StatusCode::SuccessfulOk as u16);

    release.store(true, Ordering::SeqCst);

    let stopped = wait_until(
        || printer.state.read().unwrap().state == PrinterState::Stopped,
        Duration::from_secs(5),
    );
    assert!(stopped, "printer never stopped after its current job finished");

    {
        let state = printer.state.read().unwrap();
        let second = state.active_jobs.iter().find(|j| j.id == job_ids[1]).unwrap();
        assert_eq!(second.state, pappl_core::job::State::Pending);
        assert!(Printer::effective_state_reasons(&state).contains(&"paused".to_string()));
    }

    release.store(false, Ordering::SeqCst);
    let resume_resp = ops::resume_printer(&printer, request(vec![])).unwrap();
    assert_eq!(resume_resp.header().operation_or_status, StatusCode::SuccessfulOk as u16);
    release.store(true, Ordering::SeqCst);

    let done = wait_until(
        || printer.state.read().unwrap().completed_jobs.len() == 2,
        Duration::from_secs(5),
    );
    assert!(done, "second job never completed after resume");
}

#[tokio::test]
async fn state_persists_across_restart() {
    let spool = tempfile::tempdir().unwrap();
    let system = new_system(spool.path(), DriverRegistry::new());
    system.set_organization("Acme".to_string(), Some("Print Shop".to_string()));

    let p1 = system.add_printer(Printer::new(
        1,
        "First".to_string(),
        "file:///dev/null".to_string(),
        PrinterDriverData::default(),
    ));
    system.add_printer(Printer::new(
        5,
        "Second".to_string(),
        "file:///dev/null".to_string(),
        PrinterDriverData::default(),
    ));
    assert_eq!(system.default_printer().unwrap().id, p1.id);
    system.save_now().unwrap();

    let restarted = new_system(spool.path(), DriverRegistry::new());
    let records = pappl_core::persist::load(&restarted);
    assert_eq!(records.len(), 2);
    let ids: Vec<i32> = records.iter().map(|r| r.id).collect();
    assert!(ids.contains(&1));
    assert!(ids.contains(&5));
    for record in records {
        let driver_data = pappl_core::persist::default_driver_data(&record.driver_name);
        let next_id = record.next_job_id;
        let restored = Printer::from_record(record, driver_data);
        assert_eq!(restored.peek_next_job_id(), next_id);
        restarted.add_printer(restored);
    }
    assert!(restarted.next_printer_id() > 5);
}
