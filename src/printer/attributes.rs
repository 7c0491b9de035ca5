//! Port of `_papplPrinterCopyAttributes`/`_papplPrinterCopyState`/
//! `_papplPrinterCopyXRI` from the original PAPPL `printer-ipp.c`.

use crate::printer::{Printer, PrinterState, State};
use crate::system::{System, TlsMode};
use ipp::attribute::IppAttribute;
use ipp::model::PrinterState as WirePrinterState;
use ipp::value::IppValue;
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

fn epoch_secs(t: SystemTime) -> i32 {
    t.duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i32).unwrap_or(0)
}

/// `printer-state`, `printer-state-reasons`, `printer-state-message`.
pub fn copy_state(state: &PrinterState, requested: &HashSet<String>, out: &mut Vec<IppAttribute>) {
    let all = requested.contains("all");
    if all || requested.contains("printer-state") {
        let wire = match state.state {
            State::Idle => WirePrinterState::Idle,
            State::Processing => WirePrinterState::Processing,
            State::Stopped => WirePrinterState::Stopped,
        };
        out.push(IppAttribute::new(
            "printer-state",
            IppValue::Enum(wire as i32),
        ));
    }
    if all || requested.contains("printer-state-message") {
        let msg = match state.state {
            State::Idle => "Idle.",
            State::Processing => "Printing.",
            State::Stopped => "Stopped.",
        };
        out.push(IppAttribute::new(
            "printer-state-message",
            IppValue::TextWithoutLanguage(msg.to_string()),
        ));
    }
    if all || requested.contains("printer-state-reasons") {
        let reasons = Printer::effective_state_reasons(state);
        out.push(IppAttribute::new(
            "printer-state-reasons",
            IppValue::Array(reasons.into_iter().map(IppValue::Keyword).collect()),
        ));
    }
    if all || requested.contains("printer-state-change-time") {
        out.push(IppAttribute::new(
            "printer-state-change-time",
            IppValue::Integer(epoch_secs(state.state_time)),
        ));
    }
    if all || requested.contains("printer-config-change-time") {
        out.push(IppAttribute::new(
            "printer-config-change-time",
            IppValue::Integer(epoch_secs(state.config_time)),
        ));
    }
    if all || requested.contains("printer-impressions-completed") {
        out.push(IppAttribute::new(
            "printer-impressions-completed",
            IppValue::Integer(state.impressions_completed),
        ));
    }
}

/// `xri-authentication`/`xri-security`/`xri-uri` collection pairs, one per
/// advertised scheme (ipp and, if TLS is enabled, ipps).
pub fn copy_xri(system: &System, host: &str, path: &str, out: &mut Vec<IppAttribute>) {
    let tls_mode = system.table.read().unwrap().options.tls_mode;
    let mut xris = Vec::new();
    xris.push(make_xri("ipp", host, path, "none"));
    if tls_mode != TlsMode::Off {
        xris.push(make_xri("ipps", host, path, "tls"));
    }
    out.push(IppAttribute::new(
        "printer-xri-supported",
        IppValue::Array(xris),
    ));
}

/// A collection value is encoded by the `ipp` crate as a flat
/// `Vec<IppValue>`, each member a `MemberAttrName` immediately followed by
/// its value (mirroring the begCollection/memberAttrName/endCollection
/// wire grammar) rather than a keyed map.
fn make_xri(scheme: &str, host: &str, path: &str, security: &str) -> IppValue {
    IppValue::Collection(vec![
        IppValue::MemberAttrName("xri-uri".to_string()),
        IppValue::Uri(format!("{scheme}://{host}{path}")),
        IppValue::MemberAttrName("xri-authentication".to_string()),
        IppValue::Keyword("requesting-user-name".to_string()),
        IppValue::MemberAttrName("xri-security".to_string()),
        IppValue::Keyword(security.to_string()),
    ])
}

/// Full Get-Printer-Attributes response body, filtered by `requested`.
pub fn copy_printer_attributes(
    system: &System,
    printer: &Printer,
    host: &str,
    path: &str,
    scheme: &str,
    requested: &HashSet<String>,
) -> Vec<IppAttribute> {
    let state = printer.state.read().unwrap();
    let mut r = Vec::new();
    let all = requested.contains("all");
    macro_rules! want {
        ($name:expr) => {
            all || requested.contains($name)
        };
    }
    macro_rules! push {
        ($name:expr, $value:expr) => {
            if want!($name) {
                r.push(IppAttribute::new($name, $value));
            }
        };
    }

    copy_state(&state, requested, &mut r);
    copy_xri(system, host, path, &mut r);

    push!(
        "printer-uri-supported",
        IppValue::Array({
            let mut uris = vec![IppValue::Uri(format!("ipp://{host}{path}"))];
            if system.table.read().unwrap().options.tls_mode != TlsMode::Off {
                uris.push(IppValue::Uri(format!("ipps://{host}{path}")));
            }
            uris
        })
    );
    push!(
        "printer-name",
        IppValue::NameWithoutLanguage(state.identity.name.clone())
    );
    push!("printer-uuid", {
        IppValue::Uri(format!(
            "urn:uuid:{}",
            state.identity.uuid.hyphenated()
        ))
    });
    push!(
        "printer-is-accepting-jobs",
        IppValue::Boolean(!system.is_shutting_down())
    );
    push!(
        "printer-up-time",
        IppValue::Integer(state.start_time.elapsed().as_secs() as i32)
    );
    push!(
        "queued-job-count",
        IppValue::Integer(
            state
                .active_jobs
                .iter()
                .filter(|j| j.state.is_active())
                .count() as i32
        )
    );
    push!(
        "printer-icons",
        IppValue::Array(
            ["sm", "md", "lg"]
                .iter()
                .map(|sz| IppValue::Uri(format!("{scheme}://{host}{path}/icon-{sz}.png")))
                .collect()
        )
    );
    push!(
        "operations-supported",
        IppValue::Array(
            // Operation codes per RFC8011 (base IPP/1.1 ops supported by
            // every queue) — kept as raw codes rather than a typed enum,
            // see `system::dispatcher`.
            [
                0x0002u16, // Print-Job
                0x0004,    // Validate-Job
                0x0005,    // Create-Job
                0x0006,    // Send-Document
                0x0008,    // Cancel-Job
                0x0009,    // Get-Job-Attributes
                0x000A,    // Get-Jobs
                0x000B,    // Get-Printer-Attributes
                0x0010,    // Pause-Printer
                0x0011,    // Resume-Printer
                0x0014,    // Set-Printer-Attributes
                0x0037,    // Cancel-Current-Job
                0x0038,    // Cancel-Jobs
                0x0039,    // Cancel-My-Jobs
                0x003C,    // Identify-Printer
            ]
            .into_iter()
            .map(|code| IppValue::Enum(code as i32))
            .collect()
        )
    );

    // driver-derived capability attributes
    push!(
        "media-default",
        IppValue::Keyword(state.driver_data.media_default.clone())
    );
    push!(
        "media-supported",
        IppValue::Array(
            state
                .driver_data
                .media_supported
                .iter()
                .cloned()
                .map(IppValue::Keyword)
                .collect()
        )
    );
    push!(
        "sides-default",
        IppValue::Keyword(state.driver_data.sides_default.keyword().to_string())
    );
    push!(
        "print-color-mode-default",
        IppValue::Keyword(state.driver_data.color_default.keyword().to_string())
    );
    push!(
        "document-format-default",
        IppValue::MimeMediaType(state.driver_data.document_format_default.clone())
    );
    push!(
        "document-format-supported",
        IppValue::Array(
            state
                .driver_data
                .document_format_supported
                .iter()
                .cloned()
                .map(IppValue::MimeMediaType)
                .collect()
        )
    );
    let streaming_only = state
        .driver_data
        .document_format_supported
        .iter()
        .all(|f| f == "image/pwg-raster" || f == "image/urf");
    push!(
        "copies-supported",
        IppValue::RangeOfInteger {
            min: 1,
            max: if streaming_only { 1 } else { 999 },
        }
    );
    if want!("printer-supply") && !state.driver_data.supplies.is_empty() {
        r.push(IppAttribute::new(
            "printer-supply",
            IppValue::Array(
                state
                    .driver_data
                    .supplies
                    .iter()
                    .enumerate()
                    .map(|(i, s)| {
                        IppValue::OctetString(format!(
                            "index={};type={};maxcapacity=100;level={};colorantname={};",
                            i,
                            s.kind,
                            s.level,
                            s.color.clone().unwrap_or_default()
                        ))
                    })
                    .collect(),
            ),
        ));
    }
    if want!("printer-input-tray") && !state.driver_data.sources.is_empty() {
        let mut values: Vec<IppValue> = state
            .driver_data
            .sources
            .iter()
            .zip(state.driver_data.media_ready.iter())
            .map(|(src, media)| {
                let tray_type = match src.as_str() {
                    "manual" => "sheetFeedManual",
                    "by-pass-tray" => "sheetFeedAutoNonRemovableTray",
                    _ => "sheetFeedAutoRemovableTray",
                };
                let maxcapacity = if src == "manual" { 1 } else { -2 };
                IppValue::OctetString(format!(
                    "type={tray_type};mediafeed={};mediaxfeed={};maxcapacity={maxcapacity};level=-2;status=0;name={src};",
                    media.y_dimension, media.x_dimension,
                ))
            })
            .collect();
        // The "auto" tray is a dummy entry appended after the real sources.
        values.push(IppValue::OctetString(
            "type=other;mediafeed=0;mediaxfeed=0;maxcapacity=-2;level=-2;status=0;name=auto;"
                .to_string(),
        ));
        r.push(IppAttribute::new(
            "printer-input-tray",
            IppValue::Array(values),
        ));
    }

    r
}
