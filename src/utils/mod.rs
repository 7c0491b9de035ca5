use async_compression::futures::bufread;
use ipp::{
    attribute::{IppAttribute, IppAttributes},
    model::{DelimiterTag, StatusCode},
    payload::IppPayload,
    value::IppValue,
};
use std::collections::HashSet;
mod reader_stream;
use crate::error::IppError;
pub(crate) use reader_stream::ReaderStream;

pub fn get_ipp_attribute<'a>(
    r: &'a IppAttributes,
    tag: DelimiterTag,
    name: &str,
) -> Option<&'a IppValue> {
    r.groups_of(tag)
        .find_map(|g| g.attributes().get(name))
        .map(|a| a.value())
}

pub fn take_ipp_attribute(
    r: &mut IppAttributes,
    tag: DelimiterTag,
    name: &str,
) -> Option<IppValue> {
    r.groups_mut()
        .iter_mut()
        .filter(|g| g.tag() == tag)
        .find_map(|g| g.attributes_mut().remove(name))
        .map(|a| a.into_value())
}

pub fn decommpress_payload(
    payload: IppPayload,
    compression: Option<&str>,
) -> Result<IppPayload, IppError> {
    match compression {
        None => Ok(payload),
        Some("none") => Ok(payload),
        Some("gzip") => {
            let decoder = bufread::GzipDecoder::new(futures::io::BufReader::new(payload));
            Ok(IppPayload::new_async(decoder))
        }
        Some(other) => Err(IppError {
            code: StatusCode::ClientErrorCompressionNotSupported,
            msg: format!("compression {other:?} is not supported"),
        }),
    }
}

/// Validates a `geo:` URI (RFC5870) against `geo:<lat>,<lon>(,<alt>)?`, the
/// grammar `printer-geo-location`/system geo-location values must match.
pub fn is_valid_geo_uri(uri: &str) -> bool {
    let Some(coords) = uri.strip_prefix("geo:") else {
        return false;
    };
    let parts: Vec<&str> = coords.split(',').collect();
    if parts.len() != 2 && parts.len() != 3 {
        return false;
    }
    parts.iter().all(|p| p.parse::<f64>().is_ok())
}

/// Standard members of the `job-template`/`printer-description`/
/// `document-description` group sentinels (spec.md §4.A): a
/// `requested-attributes` value naming one of these groups expands to its
/// member list rather than matching literally.
const JOB_TEMPLATE_GROUP: &[&str] = &[
    "copies",
    "finishings",
    "media",
    "media-col",
    "multiple-document-handling",
    "orientation-requested",
    "output-bin",
    "page-ranges",
    "print-color-mode",
    "print-quality",
    "print-scaling",
    "printer-resolution",
    "sides",
];

const PRINTER_DESCRIPTION_GROUP: &[&str] = &[
    "printer-name",
    "printer-state",
    "printer-state-reasons",
    "printer-state-message",
    "printer-uuid",
    "printer-uri-supported",
    "printer-is-accepting-jobs",
    "printer-up-time",
    "printer-info",
    "printer-location",
    "printer-geo-location",
    "printer-organization",
    "printer-organizational-unit",
    "printer-supply",
    "printer-input-tray",
    "printer-icons",
    "printer-xri-supported",
    "queued-job-count",
];

const DOCUMENT_DESCRIPTION_GROUP: &[&str] = &[
    "document-format",
    "document-format-supported",
    "document-format-default",
    "document-name",
    "document-state",
];

/// Normalizes `requested-attributes` into the concrete attribute-name set
/// a copier should test membership against (spec.md §4.A Filters): `all`
/// and `none` are kept as sentinels (handled by callers), while the
/// `job-template`/`printer-description`/`document-description` group
/// names expand to their standard member lists.
pub fn get_requested_attributes(r: &IppAttributes) -> HashSet<String> {
    let raw = get_ipp_attribute(
        r,
        DelimiterTag::OperationAttributes,
        IppAttribute::REQUESTED_ATTRIBUTES,
    )
    .map(|attr| {
        attr.into_iter()
            .filter_map(|e| e.as_keyword().map(|x| x.as_str()))
            .collect::<Vec<_>>()
    })
    .unwrap_or_else(|| vec!["all"]);

    let mut expanded = HashSet::new();
    for name in raw {
        match name {
            "job-template" => expanded.extend(JOB_TEMPLATE_GROUP.iter().map(|s| s.to_string())),
            "printer-description" => {
                expanded.extend(PRINTER_DESCRIPTION_GROUP.iter().map(|s| s.to_string()))
            }
            "document-description" => {
                expanded.extend(DOCUMENT_DESCRIPTION_GROUP.iter().map(|s| s.to_string()))
            }
            other => {
                expanded.insert(other.to_string());
            }
        }
    }
    expanded
}

pub fn take_requesting_user_name(r: &mut IppAttributes) -> String {
    take_ipp_attribute(r, DelimiterTag::OperationAttributes, "requesting-user-name")
        .and_then(|attr| match attr {
            IppValue::NameWithoutLanguage(name) => Some(name),
            IppValue::NameWithLanguage { name, .. } => Some(name),
            _ => None,
        })
        .unwrap_or_else(|| "anonymous".to_string())
}
