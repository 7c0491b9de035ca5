//! Per-printer operation handlers (spec.md §4.D), dispatched by
//! [`crate::system::dispatcher`] once the target printer has been resolved.

use crate::driver::IdentifyActions;
use crate::error::AppError;
use crate::job::admission;
use crate::job::pipeline;
use crate::job::{Job, State as JobState};
use crate::model::WhichJob;
use crate::printer::attributes::copy_printer_attributes;
use crate::printer::{Printer, PrinterState, State};
use crate::result::IppResult;
use crate::system::System;
use crate::utils::{
    decommpress_payload, get_ipp_attribute, get_requested_attributes, take_ipp_attribute,
    take_requesting_user_name,
};
use ipp::attribute::IppAttribute;
use ipp::model::{DelimiterTag, IppVersion, StatusCode};
use ipp::request::IppRequestResponse;
use ipp::value::IppValue;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn ok_response(version: IppVersion, req_id: u32, attrs: Vec<IppAttribute>) -> IppRequestResponse {
    let mut resp = IppRequestResponse::new_response(version, StatusCode::SuccessfulOk, req_id);
    for a in attrs {
        resp.attributes_mut()
            .add(DelimiterTag::PrinterAttributes, a);
    }
    resp
}

fn unsupported_response(
    version: IppVersion,
    req_id: u32,
    unsupported: Vec<IppAttribute>,
) -> IppRequestResponse {
    let mut resp = IppRequestResponse::new_response(
        version,
        StatusCode::ClientErrorAttributesOrValuesNotSupported,
        req_id,
    );
    for a in unsupported {
        resp.attributes_mut()
            .add(DelimiterTag::UnsupportedAttributes, a);
    }
    resp
}

/// Print-Job: admission, job creation, spools the inline document, then
/// wakes the processing worker.
pub async fn print_job(
    system: &Arc<System>,
    printer: &Arc<Printer>,
    mut req: IppRequestResponse,
) -> IppResult {
    let version = req.header().version;
    let req_id = req.header().request_id;
    let username = take_requesting_user_name(req.attributes_mut());
    let shutting_down = system.is_shutting_down();

    let (template, name) = {
        let state = printer.state.read().unwrap();
        reject_if_busy(&state)?;
        admission::validate(&state.driver_data, shutting_down, req.attributes_mut()).map_err(
            |bad| {
                if bad.is_empty() {
                    AppError::ShuttingDown
                } else {
                    AppError::AttributesNotSupported(bad)
                }
            },
        )?
    };

    let document_format = take_ipp_attribute(
        req.attributes_mut(),
        DelimiterTag::OperationAttributes,
        "document-format",
    )
    .and_then(|v| match v {
        IppValue::MimeMediaType(s) => Some(s),
        _ => None,
    });
    if let Some(fmt) = &document_format {
        let state = printer.state.read().unwrap();
        if !state.driver_data.document_format_supported.contains(fmt) && fmt != "application/octet-stream" {
            return Err(AppError::DocumentFormatNotSupported(fmt.clone()));
        }
    }
    let compression = take_ipp_attribute(
        req.attributes_mut(),
        DelimiterTag::OperationAttributes,
        "compression",
    )
    .and_then(|v| match v {
        IppValue::Keyword(k) => Some(k),
        _ => None,
    });

    let job_id = printer.alloc_job_id();
    let mut job = Job::new(job_id, username, name, template);
    job.document_format = document_format;

    let payload = decommpress_payload(req.into_payload(), compression.as_deref())
        .map_err(|_| AppError::CompressionNotSupported(compression.clone().unwrap_or_default()))?;
    let (spool_path, len) = crate::job::spool_payload(&system.spool_dir, job_id, payload)
        .await
        .map_err(AppError::Internal)?;
    if len == 0 {
        let _ = std::fs::remove_file(&spool_path);
        return Err(AppError::BadRequest("no document body present".to_string()));
    }
    job.spool_path = Some(spool_path);
    job.closed = true;

    let mut attrs = Vec::new();
    {
        let mut state = printer.state.write().unwrap();
        attrs.push(IppAttribute::new(
            "job-id",
            IppValue::Integer(job.id),
        ));
        attrs.push(IppAttribute::new(
            "job-uri",
            IppValue::Uri(format!("ipp://{}/ipp/print/{}/{}", system.app_name, printer.id, job.id)),
        ));
        attrs.push(IppAttribute::new(
            "job-state",
            IppValue::Enum(job.state.to_wire() as i32),
        ));
        attrs.push(IppAttribute::new(
            "job-state-reasons",
            IppValue::Array(job.state_reasons.iter().cloned().map(IppValue::Keyword).collect()),
        ));
        state.active_jobs.push_back(job);
        Printer::recompute_state(&mut state);
    }

    pipeline::ensure_worker(system.clone(), printer.clone());
    printer.notify_work();
    system.schedule_save();

    Ok(ok_response(version, req_id, attrs))
}

/// Validate-Job: runs admission without creating a job.
pub fn validate_job(printer: &Arc<Printer>, mut req: IppRequestResponse) -> IppResult {
    let version = req.header().version;
    let req_id = req.header().request_id;
    admission::validate(
        &printer.state.read().unwrap().driver_data,
        false,
        req.attributes_mut(),
    )
    .map_err(AppError::AttributesNotSupported)?;
    Ok(IppRequestResponse::new_response(
        version,
        StatusCode::SuccessfulOk,
        req_id,
    ))
}

/// Create-Job: identical admission path to Print-Job, but the job stays
/// pending until a Send-Document request supplies its data.
pub fn create_job(
    system: &Arc<System>,
    printer: &Arc<Printer>,
    mut req: IppRequestResponse,
) -> IppResult {
    let version = req.header().version;
    let req_id = req.header().request_id;
    let username = take_requesting_user_name(req.attributes_mut());
    let shutting_down = system.is_shutting_down();

    let (template, name) = {
        let state = printer.state.read().unwrap();
        reject_if_busy(&state)?;
        admission::validate(&state.driver_data, shutting_down, req.attributes_mut()).map_err(
            |bad| {
                if bad.is_empty() {
                    AppError::ShuttingDown
                } else {
                    AppError::AttributesNotSupported(bad)
                }
            },
        )?
    };

    let job_id = printer.alloc_job_id();
    let job = Job::new(job_id, username, name, template);
    let mut attrs = vec![
        IppAttribute::new("job-id", IppValue::Integer(job.id)),
        IppAttribute::new(
            "job-uri",
            IppValue::Uri(format!("ipp://{}/ipp/print/{}/{}", system.app_name, printer.id, job.id)),
        ),
        IppAttribute::new("job-state", IppValue::Enum(job.state.to_wire() as i32)),
    ];
    attrs.push(IppAttribute::new(
        "job-state-reasons",
        IppValue::Array(job.state_reasons.iter().cloned().map(IppValue::Keyword).collect()),
    ));
    {
        let mut state = printer.state.write().unwrap();
        state.active_jobs.push_back(job);
        Printer::recompute_state(&mut state);
    }
    system.schedule_save();
    Ok(ok_response(version, req_id, attrs))
}

/// Send-Document: attaches spooled data to a previously Create-Job'd job
/// and, once `last-document` is true, admits it for processing.
pub async fn send_document(
    system: &Arc<System>,
    printer: &Arc<Printer>,
    mut req: IppRequestResponse,
) -> IppResult {
    let version = req.header().version;
    let req_id = req.header().request_id;
    let job_id = job_id_from_request(req.attributes())?;
    let last_document = matches!(
        get_ipp_attribute(req.attributes(), DelimiterTag::OperationAttributes, "last-document"),
        Some(IppValue::Boolean(true)) | None
    );

    {
        let state = printer.state.read().unwrap();
        let job = state
            .active_jobs
            .iter()
            .find(|j| j.id == job_id)
            .ok_or(AppError::JobNotFound(job_id))?;
        if job.state != JobState::Pending {
            return Err(AppError::NotPossible);
        }
        if job.closed {
            return Err(AppError::BadRequest(
                "extra document body after the job was already closed".to_string(),
            ));
        }
    }

    let document_format = take_ipp_attribute(
        req.attributes_mut(),
        DelimiterTag::OperationAttributes,
        "document-format",
    )
    .and_then(|v| match v {
        IppValue::MimeMediaType(s) => Some(s),
        _ => None,
    });
    let compression = take_ipp_attribute(
        req.attributes_mut(),
        DelimiterTag::OperationAttributes,
        "compression",
    )
    .and_then(|v| match v {
        IppValue::Keyword(k) => Some(k),
        _ => None,
    });
    let payload = decommpress_payload(req.into_payload(), compression.as_deref())
        .map_err(|_| AppError::CompressionNotSupported(compression.clone().unwrap_or_default()))?;
    let (spool_path, _len) = crate::job::spool_payload(&system.spool_dir, job_id, payload)
        .await
        .map_err(AppError::Internal)?;

    {
        let mut state = printer.state.write().unwrap();
        if let Some(job) = state.active_jobs.iter_mut().find(|j| j.id == job_id) {
            job.spool_path = Some(spool_path);
            if document_format.is_some() {
                job.document_format = document_format;
            }
            if last_document {
                job.closed = true;
            }
        }
    }

    if last_document {
        pipeline::ensure_worker(system.clone(), printer.clone());
        printer.notify_work();
    }
    system.schedule_save();
    Ok(IppRequestResponse::new_response(
        version,
        StatusCode::SuccessfulOk,
        req_id,
    ))
}

/// Rejects admission with `server-error-busy` if the printer's driver caps
/// concurrently-admitted jobs (`max_active_jobs`) and that cap is already
/// held by non-terminal jobs (spec.md §7, "a concurrent job holds the
/// single slot").
fn reject_if_busy(state: &PrinterState) -> Result<(), AppError> {
    let cap = state.driver_data.max_active_jobs;
    if cap <= 0 {
        return Ok(());
    }
    let active = state.active_jobs.iter().filter(|j| j.state.is_active()).count() as i32;
    if active >= cap {
        return Err(AppError::PrinterBusy);
    }
    Ok(())
}

fn job_id_from_request(attrs: &ipp::attribute::IppAttributes) -> Result<i32, AppError> {
    get_ipp_attribute(attrs, DelimiterTag::OperationAttributes, "job-id")
        .and_then(|v| match v {
            IppValue::Integer(n) => Some(*n),
            _ => None,
        })
        .ok_or(AppError::JobNotFound(0))
}

/// Cancel-Job / Cancel-Current-Job: requests cooperative cancellation of an
/// active job; already-terminal jobs return `not-possible`.
pub fn cancel_job(printer: &Arc<Printer>, req: IppRequestResponse) -> IppResult {
    let version = req.header().version;
    let req_id = req.header().request_id;
    let job_id = job_id_from_request(req.attributes())?;

    let mut state = printer.state.write().unwrap();
    let job = state
        .active_jobs
        .iter_mut()
        .find(|j| j.id == job_id)
        .ok_or(AppError::JobNotFound(job_id))?;
    if job.state.is_terminal() {
        return Err(AppError::NotPossible);
    }
    use std::sync::atomic::Ordering;
    job.cancel_requested.store(true, Ordering::Relaxed);
    if job.state == JobState::Pending || job.state == JobState::Held {
        let mut job = state
            .active_jobs
            .iter()
            .position(|j| j.id == job_id)
            .and_then(|idx| state.active_jobs.remove(idx))
            .unwrap();
        job.state = JobState::Canceled;
        job.completed_at = Some(std::time::SystemTime::now());
        job.unlink_spool();
        state.completed_jobs.push_front(job);
        while state.completed_jobs.len() > state.max_completed_jobs {
            state.completed_jobs.pop_back();
        }
    }
    drop(state);
    printer.notify_work();

    Ok(IppRequestResponse::new_response(
        version,
        StatusCode::SuccessfulOk,
        req_id,
    ))
}

/// Cancel-Jobs: cancels every active job on the printer (admin operation).
pub fn cancel_jobs(printer: &Arc<Printer>, req: IppRequestResponse) -> IppResult {
    cancel_jobs_filtered(printer, req, None)
}

/// Cancel-My-Jobs: cancels only the active jobs owned by `requesting-user-name`.
pub fn cancel_my_jobs(printer: &Arc<Printer>, mut req: IppRequestResponse) -> IppResult {
    let username = take_requesting_user_name(req.attributes_mut());
    cancel_jobs_filtered(printer, req, Some(username))
}

fn cancel_jobs_filtered(
    printer: &Arc<Printer>,
    req: IppRequestResponse,
    username: Option<String>,
) -> IppResult {
    let version = req.header().version;
    let req_id = req.header().request_id;
    use std::sync::atomic::Ordering;
    let mut state = printer.state.write().unwrap();
    for job in state
        .active_jobs
        .iter()
        .filter(|j| username.as_deref().map_or(true, |u| j.username == u))
    {
        job.cancel_requested.store(true, Ordering::Relaxed);
    }
    let pending: Vec<i32> = state
        .active_jobs
        .iter()
        .filter(|j| matches!(j.state, JobState::Pending | JobState::Held))
        .filter(|j| username.as_deref().map_or(true, |u| j.username == u))
        .map(|j| j.id)
        .collect();
    for id in pending {
        if let Some(idx) = state.active_jobs.iter().position(|j| j.id == id) {
            let mut job = state.active_jobs.remove(idx).unwrap();
            job.state = JobState::Canceled;
            job.completed_at = Some(std::time::SystemTime::now());
            job.unlink_spool();
            state.completed_jobs.push_front(job);
        }
    }
    while state.completed_jobs.len() > state.max_completed_jobs {
        state.completed_jobs.pop_back();
    }
    drop(state);
    printer.notify_work();
    Ok(IppRequestResponse::new_response(
        version,
        StatusCode::SuccessfulOk,
        req_id,
    ))
}

/// Get-Job-Attributes.
pub fn get_job_attributes(printer: &Arc<Printer>, req: IppRequestResponse) -> IppResult {
    let version = req.header().version;
    let req_id = req.header().request_id;
    let job_id = job_id_from_request(req.attributes())?;
    let requested = get_requested_attributes(req.attributes());

    let state = printer.state.read().unwrap();
    let job = state
        .active_jobs
        .iter()
        .chain(state.completed_jobs.iter())
        .find(|j| j.id == job_id)
        .ok_or(AppError::JobNotFound(job_id))?;
    let attrs = job_attributes(job, &requested);
    let mut resp = IppRequestResponse::new_response(version, StatusCode::SuccessfulOk, req_id);
    for a in attrs {
        resp.attributes_mut().add(DelimiterTag::JobAttributes, a);
    }
    Ok(resp)
}

fn job_attributes(job: &Job, requested: &std::collections::HashSet<String>) -> Vec<IppAttribute> {
    let all = requested.contains("all");
    let mut r = Vec::new();
    macro_rules! push {
        ($name:expr, $value:expr) => {
            if all || requested.contains($name) {
                r.push(IppAttribute::new($name, $value));
            }
        };
    }
    push!("job-id", IppValue::Integer(job.id));
    push!(
        "job-name",
        IppValue::NameWithoutLanguage(job.name.clone())
    );
    push!(
        "job-originating-user-name",
        IppValue::NameWithoutLanguage(job.username.clone())
    );
    push!("job-state", IppValue::Enum(job.state.to_wire() as i32));
    push!(
        "job-state-message",
        IppValue::TextWithoutLanguage(job.state.message().to_string())
    );
    push!(
        "job-state-reasons",
        IppValue::Array(job.state_reasons.iter().cloned().map(IppValue::Keyword).collect())
    );
    push!(
        "job-impressions-completed",
        IppValue::Integer(job.impressions_completed)
    );
    push!(
        "time-at-creation",
        IppValue::Integer(
            job.created_at
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs() as i32)
                .unwrap_or(0)
        )
    );
    r
}

/// Get-Jobs: filtered by `which-jobs` and, optionally, `my-jobs`.
pub fn get_jobs(printer: &Arc<Printer>, mut req: IppRequestResponse) -> IppResult {
    let version = req.header().version;
    let req_id = req.header().request_id;
    let requested = get_requested_attributes(req.attributes());

    let which = match get_ipp_attribute(req.attributes(), DelimiterTag::OperationAttributes, "which-jobs")
    {
        Some(IppValue::Keyword(k)) if k == "completed" => WhichJob::Completed,
        Some(IppValue::Keyword(k)) if k == "all" => WhichJob::All,
        _ => WhichJob::NotCompleted,
    };
    let username = take_requesting_user_name(req.attributes_mut());
    let my_jobs = matches!(
        get_ipp_attribute(req.attributes(), DelimiterTag::OperationAttributes, "my-jobs"),
        Some(IppValue::Boolean(true))
    );
    let limit = match get_ipp_attribute(req.attributes(), DelimiterTag::OperationAttributes, "limit") {
        Some(IppValue::Integer(n)) if *n > 0 => *n as usize,
        _ => usize::MAX,
    };

    let state = printer.state.read().unwrap();
    let mut jobs: Vec<&Job> = state
        .active_jobs
        .iter()
        .chain(state.completed_jobs.iter())
        .filter(|j| match which {
            WhichJob::All => true,
            WhichJob::Completed => j.state.is_terminal(),
            WhichJob::NotCompleted => !j.state.is_terminal(),
        })
        .filter(|j| !my_jobs || j.username == username)
        .collect();
    jobs.sort_by_key(|j| j.id);
    jobs.truncate(limit);

    let mut resp = IppRequestResponse::new_response(version, StatusCode::SuccessfulOk, req_id);
    for job in jobs {
        for a in job_attributes(job, &requested) {
            resp.attributes_mut().add(DelimiterTag::JobAttributes, a);
        }
    }
    Ok(resp)
}

/// Get-Printer-Attributes.
pub fn get_printer_attributes(
    system: &Arc<System>,
    printer: &Arc<Printer>,
    req: IppRequestResponse,
    host: &str,
    path: &str,
    scheme: &str,
) -> IppResult {
    let version = req.header().version;
    let req_id = req.header().request_id;
    refresh_status(system, printer);
    let requested = get_requested_attributes(req.attributes());
    let mut attrs = copy_printer_attributes(system, printer, host, path, scheme, &requested);
    if requested.contains("all") || requested.contains("printer-strings-uri") {
        let lang = get_ipp_attribute(
            req.attributes(),
            DelimiterTag::OperationAttributes,
            "attributes-natural-language",
        )
        .and_then(|v| match v {
            IppValue::NaturalLanguage(s) => Some(s.clone()),
            _ => None,
        })
        .unwrap_or_else(|| "en".to_string());
        if let Some(uri) = system.strings_uri(&lang, scheme, host) {
            attrs.push(IppAttribute::new("printer-strings-uri", IppValue::Uri(uri)));
        }
    }
    Ok(ok_response(version, req_id, attrs))
}

/// Pulls `printer-state-reasons`/`printer-supply` up to date from the
/// driver, throttled to once a second and skipped while a job holds the
/// device (spec.md §4.D driver `status` callback, "at most once per
/// second while the device is idle").
fn refresh_status(system: &Arc<System>, printer: &Arc<Printer>) {
    let driver_name = {
        let state = printer.state.read().unwrap();
        if state.state == State::Processing {
            return;
        }
        if let Some(last) = state.last_status_refresh {
            if last.elapsed() < Duration::from_secs(1) {
                return;
            }
        }
        state.driver_data.driver_name.clone()
    };
    let Some(driver) = system.drivers.get(&driver_name) else {
        return;
    };
    let Ok(update) = driver.status(None) else {
        return;
    };
    let mut state = printer.state.write().unwrap();
    if !update.state_reasons.is_empty() {
        state.state_reasons = update.state_reasons;
    }
    for (name, level) in &update.supply_levels {
        if let Some(supply) = state
            .driver_data
            .supplies
            .iter_mut()
            .find(|s| &s.description == name)
        {
            supply.level = *level;
        }
    }
    state.last_status_refresh = Some(Instant::now());
}

/// Pause-Printer: transitions to `stopped` once the current job (if any)
/// finishes; sets `is_stopped` immediately so new jobs stop being admitted.
pub fn pause_printer(printer: &Arc<Printer>, req: IppRequestResponse) -> IppResult {
    let version = req.header().version;
    let req_id = req.header().request_id;
    let mut state = printer.state.write().unwrap();
    state.is_stopped = true;
    Printer::recompute_state(&mut state);
    Ok(IppRequestResponse::new_response(
        version,
        StatusCode::SuccessfulOk,
        req_id,
    ))
}

/// Resume-Printer: clears `is_stopped` and wakes the processing worker.
pub fn resume_printer(printer: &Arc<Printer>, req: IppRequestResponse) -> IppResult {
    let version = req.header().version;
    let req_id = req.header().request_id;
    {
        let mut state = printer.state.write().unwrap();
        state.is_stopped = false;
        Printer::recompute_state(&mut state);
    }
    printer.notify_work();
    Ok(IppRequestResponse::new_response(
        version,
        StatusCode::SuccessfulOk,
        req_id,
    ))
}

/// Identify-Printer: runs the driver's identify callback with no lock held.
pub fn identify_printer(
    system: &Arc<System>,
    printer: &Arc<Printer>,
    req: IppRequestResponse,
) -> IppResult {
    let version = req.header().version;
    let req_id = req.header().request_id;
    let (driver_name, actions, message) = {
        let state = printer.state.read().unwrap();
        let actions = match get_ipp_attribute(
            req.attributes(),
            DelimiterTag::OperationAttributes,
            "identify-actions",
        ) {
            Some(IppValue::Array(values)) => values.iter().fold(IdentifyActions::empty(), |acc, v| {
                acc | keyword_to_identify(v)
            }),
            Some(v) => keyword_to_identify(v),
            None => state.driver_data.identify_actions_default,
        };
        let message = get_ipp_attribute(
            req.attributes(),
            DelimiterTag::OperationAttributes,
            "message",
        )
        .and_then(|v| match v {
            IppValue::TextWithoutLanguage(s) => Some(s.clone()),
            _ => None,
        });
        (state.driver_data.driver_name.clone(), actions, message)
    };
    if let Some(driver) = system.drivers.get(&driver_name) {
        driver
            .identify(actions, message.as_deref())
            .map_err(AppError::Internal)?;
    }
    Ok(IppRequestResponse::new_response(
        version,
        StatusCode::SuccessfulOk,
        req_id,
    ))
}

fn keyword_to_identify(v: &IppValue) -> IdentifyActions {
    match v {
        IppValue::Keyword(k) => match k.as_str() {
            "display" => IdentifyActions::DISPLAY,
            "flash" => IdentifyActions::FLASH,
            "sound" => IdentifyActions::SOUND,
            "speak" => IdentifyActions::SPEAK,
            _ => IdentifyActions::empty(),
        },
        _ => IdentifyActions::empty(),
    }
}

/// Set-Printer-Attributes: preflights the submitted attribute set against a
/// small editable whitelist (spec.md §4.D), applies under the write lock,
/// and bumps `config_time`.
pub fn set_printer_attributes(printer: &Arc<Printer>, req: IppRequestResponse) -> IppResult {
    let version = req.header().version;
    let req_id = req.header().request_id;
    const EDITABLE: &[&str] = &[
        "printer-info",
        "printer-location",
        "printer-geo-location",
        "printer-organization",
        "printer-organizational-unit",
    ];
    // Preflight pass: validate every submitted attribute against the
    // whitelist and stage the edits without touching printer state, so a
    // request mixing a valid edit with a rejected one applies nothing
    // (spec.md §4.D, "if all pass, apply under write lock").
    let mut rejected = Vec::new();
    let mut bad_request = false;
    let mut pending_info = None;
    let mut pending_location = None;
    let mut pending_geo_location = None;
    let mut pending_organization = None;
    let mut pending_organizational_unit = None;
    for group in req.attributes().groups_of(DelimiterTag::PrinterAttributes) {
        for (name, attr) in group.attributes().iter() {
            if !EDITABLE.contains(&name.as_str()) {
                rejected.push(IppAttribute::new(name.clone(), attr.value().clone()));
                continue;
            }
            match (name.as_str(), attr.value()) {
                ("printer-info", IppValue::TextWithoutLanguage(v)) => {
                    pending_info = Some(v.clone())
                }
                ("printer-location", IppValue::TextWithoutLanguage(v)) => {
                    pending_location = Some(v.clone())
                }
                ("printer-geo-location", IppValue::Uri(v)) => {
                    if crate::utils::is_valid_geo_uri(v) {
                        pending_geo_location = Some(v.clone())
                    } else {
                        bad_request = true;
                    }
                }
                ("printer-organization", IppValue::TextWithoutLanguage(v)) => {
                    pending_organization = Some(v.clone())
                }
                ("printer-organizational-unit", IppValue::TextWithoutLanguage(v)) => {
                    pending_organizational_unit = Some(v.clone())
                }
                _ => rejected.push(IppAttribute::new(name.clone(), attr.value().clone())),
            }
        }
    }
    if bad_request {
        return Err(AppError::BadRequest(
            "printer-geo-location must match geo:<lat>,<lon>(,<alt>)?".to_string(),
        ));
    }
    if !rejected.is_empty() {
        return Ok(unsupported_response(version, req_id, rejected));
    }

    let mut state = printer.state.write().unwrap();
    if let Some(v) = pending_info {
        state.identity.info = Some(v);
    }
    if let Some(v) = pending_location {
        state.identity.location = Some(v);
    }
    if let Some(v) = pending_geo_location {
        state.identity.geo_location = Some(v);
    }
    if let Some(v) = pending_organization {
        state.identity.organization = Some(v);
    }
    if let Some(v) = pending_organizational_unit {
        state.identity.organizational_unit = Some(v);
    }
    state.config_time = std::time::SystemTime::now();
    Ok(IppRequestResponse::new_response(
        version,
        StatusCode::SuccessfulOk,
        req_id,
    ))
}

pub fn state_of(printer: &Arc<Printer>) -> State {
    printer.state.read().unwrap().state
}
