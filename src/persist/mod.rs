//! Persisted state: an opaque, line-oriented text format written to
//! `<spool>/<app>.state` (spec.md §6). One `key value` pair per line, a
//! blank line separates printer records from the leading system record.
//! A missing or corrupt file is treated as "fresh start" (spec.md §4.E).

use crate::printer::driver_data::{MediaCol, PrinterDriverData, Supply};
use crate::system::System;
use anyhow::Result;
use std::fs;
use std::io::Write;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PrinterRecord {
    pub id: i32,
    pub name: String,
    pub uuid: Uuid,
    pub driver_name: String,
    pub device_uri: String,
    pub location: Option<String>,
    pub organization: Option<String>,
    pub organizational_unit: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_telephone: Option<String>,
    pub next_job_id: i32,
    pub media_ready: Vec<MediaCol>,
    pub supplies: Vec<Supply>,
}

fn encode_media_col(m: &MediaCol) -> String {
    escape(&format!(
        "{}\t{}\t{}\t{}\t{}\t{}",
        m.source,
        m.size_name,
        m.x_dimension,
        m.y_dimension,
        m.media_type,
        if m.borderless { 1 } else { 0 },
    ))
}

fn decode_media_col(value: &str) -> Option<MediaCol> {
    let value = unescape(value);
    let mut fields = value.split('\t');
    Some(MediaCol {
        source: fields.next()?.to_string(),
        size_name: fields.next()?.to_string(),
        x_dimension: fields.next()?.parse().ok()?,
        y_dimension: fields.next()?.parse().ok()?,
        media_type: fields.next()?.to_string(),
        borderless: fields.next()? == "1",
    })
}

fn encode_supply(s: &Supply) -> String {
    escape(&format!(
        "{}\t{}\t{}\t{}\t{}",
        s.description,
        s.kind,
        s.level,
        if s.is_consumed { 1 } else { 0 },
        s.color.clone().unwrap_or_default(),
    ))
}

fn decode_supply(value: &str) -> Option<Supply> {
    let value = unescape(value);
    let mut fields = value.splitn(5, '\t');
    let description = fields.next()?.to_string();
    let kind = fields.next()?.to_string();
    let level = fields.next()?.parse().ok()?;
    let is_consumed = fields.next()? == "1";
    let color = fields.next().filter(|s| !s.is_empty()).map(str::to_string);
    Some(Supply {
        color,
        description,
        kind,
        level,
        is_consumed,
    })
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\n', "\\n")
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('\\') => out.push('\\'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Writes the current system+printer state atomically: write to a temp
/// file in the same directory, then rename over the target (spec.md §5
/// "Shared resources").
pub fn save(system: &System) -> Result<()> {
    let mut body = String::new();
    {
        let table = system.table.read().unwrap();
        body.push_str(&format!("system-uuid {}\n", table.identity.uuid));
        body.push_str(&format!("next-printer-id {}\n", table.next_printer_id));
        if let Some(id) = table.default_printer_id {
            body.push_str(&format!("default-printer-id {id}\n"));
        }
        if let Some(loc) = &table.identity.location {
            body.push_str(&format!("location {}\n", escape(loc)));
        }
        if let Some(org) = &table.identity.organization {
            body.push_str(&format!("organization {}\n", escape(org)));
        }
        for printer in table.printers.values() {
            let state = printer.state.read().unwrap();
            body.push_str("\n[printer]\n");
            body.push_str(&format!("id {}\n", printer.id));
            body.push_str(&format!("name {}\n", escape(&state.identity.name)));
            body.push_str(&format!("uuid {}\n", state.identity.uuid));
            body.push_str(&format!(
                "driver-name {}\n",
                escape(&state.driver_data.driver_name)
            ));
            body.push_str(&format!("device-uri {}\n", escape(&state.device_uri)));
            if let Some(loc) = &state.identity.location {
                body.push_str(&format!("location {}\n", escape(loc)));
            }
            if let Some(org) = &state.identity.organization {
                body.push_str(&format!("organization {}\n", escape(org)));
            }
            if let Some(unit) = &state.identity.organizational_unit {
                body.push_str(&format!("organizational-unit {}\n", escape(unit)));
            }
            if let Some(name) = &state.identity.contact_name {
                body.push_str(&format!("contact-name {}\n", escape(name)));
            }
            if let Some(email) = &state.identity.contact_email {
                body.push_str(&format!("contact-email {}\n", escape(email)));
            }
            if let Some(tel) = &state.identity.contact_telephone {
                body.push_str(&format!("contact-telephone {}\n", escape(tel)));
            }
            body.push_str(&format!("next-job-id {}\n", printer.peek_next_job_id()));
            body.push_str(&format!(
                "media-default {}\n",
                escape(&state.driver_data.media_default)
            ));
            for media in &state.driver_data.media_ready {
                body.push_str(&format!("media-ready {}\n", encode_media_col(media)));
            }
            for supply in &state.driver_data.supplies {
                body.push_str(&format!("supply {}\n", encode_supply(supply)));
            }
        }
    }

    let tmp_path = system.state_path.with_extension("state.tmp");
    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(body.as_bytes())?;
    file.sync_all()?;
    fs::rename(&tmp_path, &system.state_path)?;
    Ok(())
}

/// Parses a previously-saved state file into printer records. Returns an
/// empty result (fresh start) rather than an error when the file is
/// missing or malformed — persistence is best-effort.
pub fn load(system: &System) -> Vec<PrinterRecord> {
    let text = match fs::read_to_string(&system.state_path) {
        Ok(t) => t,
        Err(_) => return Vec::new(),
    };

    let mut records = Vec::new();
    let mut current: Option<PrinterRecord> = None;

    for line in text.lines() {
        if line == "[printer]" {
            if let Some(r) = current.take() {
                records.push(r);
            }
            current = Some(PrinterRecord {
                id: 0,
                name: String::new(),
                uuid: Uuid::nil(),
                driver_name: String::new(),
                device_uri: String::new(),
                location: None,
                organization: None,
                organizational_unit: None,
                contact_name: None,
                contact_email: None,
                contact_telephone: None,
                next_job_id: 1,
                media_ready: Vec::new(),
                supplies: Vec::new(),
            });
            continue;
        }
        let Some((key, raw_value)) = line.split_once(' ') else {
            continue;
        };
        match &mut current {
            Some(record) => match key {
                "id" => record.id = unescape(raw_value).parse().unwrap_or(0),
                "name" => record.name = unescape(raw_value),
                "uuid" => record.uuid = Uuid::parse_str(&unescape(raw_value)).unwrap_or_default(),
                "driver-name" => record.driver_name = unescape(raw_value),
                "device-uri" => record.device_uri = unescape(raw_value),
                "location" => record.location = Some(unescape(raw_value)),
                "organization" => record.organization = Some(unescape(raw_value)),
                "organizational-unit" => record.organizational_unit = Some(unescape(raw_value)),
                "contact-name" => record.contact_name = Some(unescape(raw_value)),
                "contact-email" => record.contact_email = Some(unescape(raw_value)),
                "contact-telephone" => record.contact_telephone = Some(unescape(raw_value)),
                "next-job-id" => record.next_job_id = unescape(raw_value).parse().unwrap_or(1),
                "media-ready" => {
                    if let Some(m) = decode_media_col(raw_value) {
                        record.media_ready.push(m);
                    }
                }
                "supply" => {
                    if let Some(s) = decode_supply(raw_value) {
                        record.supplies.push(s);
                    }
                }
                _ => {}
            },
            None => {
                // system-level fields; applied by the caller after load()
                // reconstructs identity separately via `load_system_fields`.
            }
        }
    }
    if let Some(r) = current.take() {
        records.push(r);
    }
    records
}

/// Re-reads the system-level fields only (uuid, next-printer-id,
/// default-printer-id) — kept separate from [`load`] because the printer
/// records need a [`PrinterDriverData`] supplied by the caller's driver
/// registry before they can become real [`crate::printer::Printer`]s.
pub fn load_system_fields(path: &std::path::Path) -> Option<(Uuid, i32, Option<i32>)> {
    let text = fs::read_to_string(path).ok()?;
    let mut uuid = None;
    let mut next_printer_id = 1;
    let mut default_printer_id = None;
    for line in text.lines() {
        if line == "[printer]" {
            break;
        }
        if let Some((key, value)) = line.split_once(' ') {
            match key {
                "system-uuid" => uuid = Uuid::parse_str(value).ok(),
                "next-printer-id" => next_printer_id = value.parse().unwrap_or(1),
                "default-printer-id" => default_printer_id = value.parse().ok(),
                _ => {}
            }
        }
    }
    uuid.map(|u| (u, next_printer_id, default_printer_id))
}

/// Placeholder driver data used when loading a printer record whose driver
/// name isn't registered; callers should prefer the registry's data once
/// available.
pub fn default_driver_data(driver_name: &str) -> PrinterDriverData {
    PrinterDriverData {
        driver_name: driver_name.to_string(),
        ..Default::default()
    }
}
