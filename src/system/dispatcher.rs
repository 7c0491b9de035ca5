//! Request routing (spec.md §4.E): resolves the target object from the
//! request path, checks authorization for mutating operations, and
//! dispatches to a printer operation (`printer::ops`) or a system-level
//! operation handled in place.

use crate::error::AppError;
use crate::printer::{ops, Printer};
use crate::result::IppResult;
use crate::system::System;
use ipp::attribute::IppAttribute;
use ipp::model::{IppVersion, StatusCode};
use ipp::request::IppRequestResponse;
use ipp::value::IppValue;
use std::sync::Arc;

/// Operation codes dispatched on, as raw `u16`s rather than a typed enum:
/// the base IPP/1.1 codes (RFC8011) are on the left, the System Service
/// extension codes PAPPL adds (PWG5100.22) on the right — a generic wire
/// crate's `Operation` enum isn't guaranteed to carry the latter.
mod op {
    pub const PRINT_JOB: u16 = 0x0002;
    pub const VALIDATE_JOB: u16 = 0x0004;
    pub const CREATE_JOB: u16 = 0x0005;
    pub const SEND_DOCUMENT: u16 = 0x0006;
    pub const CANCEL_JOB: u16 = 0x0008;
    pub const GET_JOB_ATTRIBUTES: u16 = 0x0009;
    pub const GET_JOBS: u16 = 0x000A;
    pub const GET_PRINTER_ATTRIBUTES: u16 = 0x000B;
    pub const PAUSE_PRINTER: u16 = 0x0010;
    pub const RESUME_PRINTER: u16 = 0x0011;
    pub const SET_PRINTER_ATTRIBUTES: u16 = 0x0014;
    pub const CANCEL_CURRENT_JOB: u16 = 0x0037;
    pub const CANCEL_JOBS: u16 = 0x0038;
    pub const CANCEL_MY_JOBS: u16 = 0x0039;
    pub const IDENTIFY_PRINTER: u16 = 0x003C;
    pub const GET_SYSTEM_ATTRIBUTES: u16 = 0x4004;
    pub const GET_PRINTERS: u16 = 0x4006;
    pub const CREATE_PRINTER: u16 = 0x4008;
    pub const DELETE_PRINTER: u16 = 0x4009;
    pub const SHUTDOWN_ALL_PRINTERS: u16 = 0x400A;
}

/// Mutating operations require the requester to be authorized for the
/// admin group (spec.md §4.E Authorization).
fn requires_admin(code: u16) -> bool {
    matches!(
        code,
        op::PAUSE_PRINTER
            | op::RESUME_PRINTER
            | op::SET_PRINTER_ATTRIBUTES
            | op::CANCEL_JOBS
            | op::CANCEL_CURRENT_JOB
            | op::CREATE_PRINTER
            | op::DELETE_PRINTER
            | op::SHUTDOWN_ALL_PRINTERS
    )
}

impl System {
    /// Entry point called from the HTTP layer for every parsed IPP
    /// request. Takes `self` through the same `Arc` the server holds, so
    /// handlers that hand work to the processing worker can clone it.
    pub async fn handle_request(
        self: &Arc<Self>,
        parts: http::request::Parts,
        req: IppRequestResponse,
    ) -> IppRequestResponse {
        let version = req.header().version;
        let req_id = req.header().request_id;
        dispatch(self, &parts, req)
            .await
            .unwrap_or_else(|e| error_response(version, req_id, e))
    }
}

fn error_response(version: IppVersion, req_id: u32, error: AppError) -> IppRequestResponse {
    let mut resp = IppRequestResponse::new_response(version, error.status_code(), req_id);
    if let Some(bad) = error.unsupported_attributes() {
        for a in bad {
            resp.attributes_mut().add(
                ipp::model::DelimiterTag::UnsupportedAttributes,
                IppAttribute::new(a.name(), a.value().clone()),
            );
        }
    } else {
        resp.attributes_mut().add(
            ipp::model::DelimiterTag::OperationAttributes,
            IppAttribute::new(
                IppAttribute::STATUS_MESSAGE,
                IppValue::TextWithoutLanguage(error.message()),
            ),
        );
    }
    resp
}

/// Dispatch core: only Print-Job/Send-Document actually await anything
/// (spooling the document payload); every other operation resolves
/// synchronously under the printer/system locks.
pub async fn dispatch(
    system: &Arc<System>,
    parts: &http::request::Parts,
    req: IppRequestResponse,
) -> IppResult {
    let version = req.header().version;
    let req_id = req.header().request_id;
    let code = req.header().operation_or_status;

    if requires_admin(code) {
        // `None` username is surfaced to the authorizer as unauthenticated;
        // real deployments resolve this from TLS client certs or PAM, kept
        // external to the core (spec.md §1).
        let username = header_username(parts);
        let group = system
            .table
            .read()
            .unwrap()
            .identity
            .admin_group
            .clone()
            .unwrap_or_else(|| "admin".to_string());
        if !system.authorizer.is_authorized(username.as_deref(), &group) {
            return Err(AppError::Forbidden);
        }
    } else if code == op::CANCEL_MY_JOBS {
        // Cancel-My-Jobs only ever touches the caller's own jobs, so it is
        // gated on the print group rather than the admin group (spec.md
        // §4.C).
        let username = header_username(parts);
        let group = system
            .table
            .read()
            .unwrap()
            .identity
            .default_print_group
            .clone()
            .unwrap_or_else(|| "print".to_string());
        if !system.authorizer.is_authorized(username.as_deref(), &group) {
            return Err(AppError::Forbidden);
        }
    }

    let path = parts.uri.path();
    let host = parts
        .headers
        .get(http::header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost")
        .to_string();

    if let Some(resp) = system_level_operation(system, code, &req, version, req_id)? {
        return Ok(resp);
    }

    let printer = resolve_printer(system, path)
        .ok_or_else(|| AppError::PrinterNotFound(path.to_string()))?;

    match code {
        op::PRINT_JOB => ops::print_job(system, &printer, req).await,
        op::VALIDATE_JOB => ops::validate_job(&printer, req),
        op::CREATE_JOB => ops::create_job(system, &printer, req),
        op::SEND_DOCUMENT => ops::send_document(system, &printer, req).await,
        op::CANCEL_JOB | op::CANCEL_CURRENT_JOB => ops::cancel_job(&printer, req),
        op::CANCEL_JOBS => ops::cancel_jobs(&printer, req),
        op::CANCEL_MY_JOBS => ops::cancel_my_jobs(&printer, req),
        op::GET_JOB_ATTRIBUTES => ops::get_job_attributes(&printer, req),
        op::GET_JOBS => ops::get_jobs(&printer, req),
        op::GET_PRINTER_ATTRIBUTES => {
            ops::get_printer_attributes(system, &printer, req, &host, path, "ipp")
        }
        op::PAUSE_PRINTER => ops::pause_printer(&printer, req),
        op::RESUME_PRINTER => ops::resume_printer(&printer, req),
        op::SET_PRINTER_ATTRIBUTES => ops::set_printer_attributes(&printer, req),
        op::IDENTIFY_PRINTER => ops::identify_printer(system, &printer, req),
        _ => Err(AppError::Ipp(crate::error::IppError::from_code(
            StatusCode::ServerErrorOperationNotSupported,
        ))),
    }
}

fn header_username(parts: &http::request::Parts) -> Option<String> {
    parts
        .headers
        .get("x-requesting-user-name")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}

fn resolve_printer(system: &Arc<System>, path: &str) -> Option<Arc<Printer>> {
    if let Some(rest) = path.strip_prefix("/ipp/print/") {
        let id: i32 = rest.split('/').next()?.parse().ok()?;
        return system.find_printer(id);
    }
    if path == "/" || path == "/ipp/print" {
        return system.default_printer();
    }
    None
}

fn system_level_operation(
    system: &Arc<System>,
    code: u16,
    req: &IppRequestResponse,
    version: IppVersion,
    req_id: u32,
) -> Result<Option<IppRequestResponse>, AppError> {
    match code {
        op::GET_SYSTEM_ATTRIBUTES => Ok(Some(get_system_attributes(system, version, req_id))),
        op::GET_PRINTERS => Ok(Some(get_printers(system, version, req_id))),
        op::CREATE_PRINTER => create_printer(system, req, version, req_id).map(Some),
        op::DELETE_PRINTER => delete_printer(system, req, version, req_id).map(Some),
        op::SHUTDOWN_ALL_PRINTERS => {
            system.request_shutdown(std::time::Duration::from_secs(30));
            Ok(Some(IppRequestResponse::new_response(
                version,
                StatusCode::SuccessfulOk,
                req_id,
            )))
        }
        _ => Ok(None),
    }
}

fn get_system_attributes(system: &System, version: IppVersion, req_id: u32) -> IppRequestResponse {
    let table = system.table.read().unwrap();
    let mut resp = IppRequestResponse::new_response(version, StatusCode::SuccessfulOk, req_id);
    resp.attributes_mut().add(
        ipp::model::DelimiterTag::PrinterAttributes,
        IppAttribute::new(
            "system-uuid",
            IppValue::Uri(format!("urn:uuid:{}", table.identity.uuid.hyphenated())),
        ),
    );
    resp.attributes_mut().add(
        ipp::model::DelimiterTag::PrinterAttributes,
        IppAttribute::new(
            "system-name",
            IppValue::NameWithoutLanguage(table.identity.dns_sd_name.clone()),
        ),
    );
    resp.attributes_mut().add(
        ipp::model::DelimiterTag::PrinterAttributes,
        IppAttribute::new("system-up-time", IppValue::Integer(system.uptime_secs() as i32)),
    );
    resp.attributes_mut().add(
        ipp::model::DelimiterTag::PrinterAttributes,
        IppAttribute::new(
            "system-configured-printers",
            IppValue::Array(
                table
                    .printers
                    .keys()
                    .map(|id| IppValue::Integer(*id))
                    .collect(),
            ),
        ),
    );
    resp
}

fn get_printers(system: &System, version: IppVersion, req_id: u32) -> IppRequestResponse {
    let table = system.table.read().unwrap();
    let mut resp = IppRequestResponse::new_response(version, StatusCode::SuccessfulOk, req_id);
    for (id, printer) in table.printers.iter() {
        let state = printer.state.read().unwrap();
        resp.attributes_mut().add(
            ipp::model::DelimiterTag::PrinterAttributes,
            IppAttribute::new("printer-id", IppValue::Integer(*id)),
        );
        resp.attributes_mut().add(
            ipp::model::DelimiterTag::PrinterAttributes,
            IppAttribute::new(
                "printer-name",
                IppValue::NameWithoutLanguage(state.identity.name.clone()),
            ),
        );
    }
    resp
}

fn create_printer(
    system: &Arc<System>,
    req: &IppRequestResponse,
    version: IppVersion,
    req_id: u32,
) -> IppResult {
    use crate::utils::get_ipp_attribute;
    let name = get_ipp_attribute(
        req.attributes(),
        ipp::model::DelimiterTag::OperationAttributes,
        "printer-name",
    )
    .and_then(|v| match v {
        IppValue::NameWithoutLanguage(s) => Some(s.clone()),
        _ => None,
    })
    .ok_or_else(|| AppError::Internal(anyhow::anyhow!("printer-name is required")))?;
    let device_uri = get_ipp_attribute(
        req.attributes(),
        ipp::model::DelimiterTag::OperationAttributes,
        "device-uri",
    )
    .and_then(|v| match v {
        IppValue::Uri(s) => Some(s.clone()),
        _ => None,
    })
    .ok_or_else(|| AppError::Internal(anyhow::anyhow!("device-uri is required")))?;
    let driver_name = get_ipp_attribute(
        req.attributes(),
        ipp::model::DelimiterTag::OperationAttributes,
        "printer-device-id",
    )
    .and_then(|v| match v {
        IppValue::Keyword(s) => Some(s.clone()),
        _ => None,
    })
    .unwrap_or_else(|| "generic".to_string());

    let driver_data = system
        .drivers
        .get(&driver_name)
        .map(|d| d.capabilities())
        .unwrap_or_default();
    let id = system.next_printer_id();
    let printer = Printer::new(id, name, device_uri, driver_data);
    let printer = system.add_printer(printer);
    let mut resp = IppRequestResponse::new_response(version, StatusCode::SuccessfulOk, req_id);
    resp.attributes_mut().add(
        ipp::model::DelimiterTag::PrinterAttributes,
        IppAttribute::new("printer-id", IppValue::Integer(printer.id)),
    );
    Ok(resp)
}

fn delete_printer(
    system: &Arc<System>,
    req: &IppRequestResponse,
    version: IppVersion,
    req_id: u32,
) -> IppResult {
    use crate::utils::get_ipp_attribute;
    let id = get_ipp_attribute(
        req.attributes(),
        ipp::model::DelimiterTag::OperationAttributes,
        "printer-id",
    )
    .and_then(|v| match v {
        IppValue::Integer(n) => Some(*n),
        _ => None,
    })
    .ok_or_else(|| AppError::Internal(anyhow::anyhow!("printer-id is required")))?;
    if !system.delete_printer(id) {
        return Err(AppError::PrinterNotFound(id.to_string()));
    }
    Ok(IppRequestResponse::new_response(
        version,
        StatusCode::SuccessfulOk,
        req_id,
    ))
}
