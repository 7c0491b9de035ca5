//! Port of `valid_job_attributes()` from the original PAPPL `printer-ipp.c`:
//! the exhaustive per-job-template-attribute admission check run before a
//! job is created. Every failing attribute is collected and echoed back in
//! an `unsupported-attributes` group (spec.md §4.C).

use crate::job::JobTemplateAttributes;
use crate::model::PageOrientation;
use crate::printer::driver_data::{ColorMode, MediaCol, PrinterDriverData, Sides};
use crate::utils::take_ipp_attribute;
use ipp::attribute::IppAttribute;
use ipp::model::DelimiterTag;
use ipp::value::IppValue;

const STREAMING_RASTER_FORMATS: &[&str] = &["image/pwg-raster", "image/urf"];

/// Accepts a mutable copy of the job-creation request's attribute set,
/// validating and draining each job-template attribute it recognizes.
/// Returns either the extracted [`JobTemplateAttributes`] plus the
/// (possibly defaulted) job name, or the list of offending attributes.
pub fn validate(
    driver: &PrinterDriverData,
    shutting_down: bool,
    attrs: &mut ipp::attribute::IppAttributes,
) -> Result<(JobTemplateAttributes, String), Vec<IppAttribute>> {
    if shutting_down {
        // Mapped by the caller to server-error-not-accepting-jobs; no
        // per-attribute detail applies here.
        return Err(Vec::new());
    }

    let mut bad = Vec::new();
    let mut out = JobTemplateAttributes::default();

    macro_rules! reject {
        ($name:expr, $value:expr) => {
            bad.push(IppAttribute::new($name, $value));
        };
    }

    // copies: integer 1-999, single value; streaming raster formats only
    // advertise 1 as supported.
    if let Some(v) = take_ipp_attribute(attrs, DelimiterTag::JobAttributes, "copies") {
        match v {
            IppValue::Integer(n) => {
                let is_streaming = attrs_document_format(attrs)
                    .map(|f| STREAMING_RASTER_FORMATS.contains(&f.as_str()))
                    .unwrap_or(false);
                let max = if is_streaming { 1 } else { 999 };
                if !(1..=max).contains(&n) {
                    reject!("copies", IppValue::Integer(n));
                } else {
                    out.copies = n;
                }
            }
            other => reject!("copies", other),
        }
    } else {
        out.copies = 1;
    }

    // ipp-attribute-fidelity: boolean, single.
    if let Some(v) = take_ipp_attribute(attrs, DelimiterTag::JobAttributes, "ipp-attribute-fidelity")
    {
        if !matches!(v, IppValue::Boolean(_)) {
            reject!("ipp-attribute-fidelity", v);
        }
    }

    // job-hold-until: no-hold only.
    if let Some(v) = take_ipp_attribute(attrs, DelimiterTag::JobAttributes, "job-hold-until") {
        match &v {
            IppValue::Keyword(k) if k == "no-hold" => {}
            _ => reject!("job-hold-until", v),
        }
    }

    // job-impressions: integer >= 0.
    if let Some(v) = take_ipp_attribute(attrs, DelimiterTag::JobAttributes, "job-impressions") {
        match v {
            IppValue::Integer(n) if n >= 0 => out.impressions_requested = Some(n),
            other => reject!("job-impressions", other),
        }
    }

    // job-priority: integer 1-100.
    if let Some(v) = take_ipp_attribute(attrs, DelimiterTag::JobAttributes, "job-priority") {
        match v {
            IppValue::Integer(n) if (1..=100).contains(&n) => {}
            other => reject!("job-priority", other),
        }
    }

    // job-sheets: none only.
    if let Some(v) = take_ipp_attribute(attrs, DelimiterTag::JobAttributes, "job-sheets") {
        match &v {
            IppValue::Keyword(k) if k == "none" => {}
            _ => reject!("job-sheets", v),
        }
    }

    // media: keyword, must match media-supported.
    if let Some(v) = take_ipp_attribute(attrs, DelimiterTag::JobAttributes, "media") {
        match &v {
            IppValue::Keyword(k) if driver.media_supported.iter().any(|m| m == k) => {
                out.media = k.clone();
            }
            _ => reject!("media", v),
        }
    } else {
        out.media = driver.media_default.clone();
    }

    // media-col: collection with media-size-name, or media-size
    // x/y-dimension matching a supported pair.
    if let Some(v) = take_ipp_attribute(attrs, DelimiterTag::JobAttributes, "media-col") {
        match collection_to_media_col(&v, driver) {
            Some(col) => out.media_col = Some(col),
            None => reject!("media-col", v),
        }
    }

    // multiple-document-handling
    if let Some(v) =
        take_ipp_attribute(attrs, DelimiterTag::JobAttributes, "multiple-document-handling")
    {
        match &v {
            IppValue::Keyword(k)
                if k == "separate-documents-uncollated-copies"
                    || k == "separate-documents-collated-copies" =>
            {
                out.multiple_document_handling = Some(k.clone());
            }
            _ => reject!("multiple-document-handling", v),
        }
    }

    // orientation-requested: enum 3-7.
    if let Some(v) = take_ipp_attribute(attrs, DelimiterTag::JobAttributes, "orientation-requested")
    {
        match &v {
            IppValue::Enum(n) if (3..=7).contains(n) => {
                out.orientation_requested = PageOrientation::try_from(*n).ok();
            }
            _ => reject!("orientation-requested", v),
        }
    }

    // page-ranges: single range, lo >= 1, hi >= lo; requires
    // page-ranges-supported.
    if let Some(v) = take_ipp_attribute(attrs, DelimiterTag::JobAttributes, "page-ranges") {
        match &v {
            IppValue::RangeOfInteger { min, max }
                if driver.page_ranges_supported && *min >= 1 && *max >= *min =>
            {
                out.page_ranges = Some((*min, *max));
            }
            _ => reject!("page-ranges", v),
        }
    }

    // print-color-mode: keyword in color_supported.
    if let Some(v) = take_ipp_attribute(attrs, DelimiterTag::JobAttributes, "print-color-mode") {
        match &v {
            IppValue::Keyword(k) => match ColorMode::from_keyword(k) {
                Some(mode) if driver.color_supported.intersects(mode) => {
                    out.print_color_mode = Some(mode);
                }
                _ => reject!("print-color-mode", v),
            },
            _ => reject!("print-color-mode", v),
        }
    }

    // print-content-optimize: keyword from a recognized set.
    if let Some(v) = take_ipp_attribute(attrs, DelimiterTag::JobAttributes, "print-content-optimize")
    {
        const RECOGNIZED: &[&str] = &["auto", "graphic", "photo", "text", "text-and-graphic"];
        match &v {
            IppValue::Keyword(k) if RECOGNIZED.contains(&k.as_str()) => {
                out.print_content_optimize = Some(k.clone());
            }
            _ => reject!("print-content-optimize", v),
        }
    }

    // print-darkness: integer [-100, 100]; requires darkness_supported.
    if let Some(v) = take_ipp_attribute(attrs, DelimiterTag::JobAttributes, "print-darkness") {
        match v {
            IppValue::Integer(n) if driver.darkness_supported && (-100..=100).contains(&n) => {
                out.print_darkness = Some(n);
            }
            other => reject!("print-darkness", other),
        }
    }

    // print-quality: enum 3-5.
    if let Some(v) = take_ipp_attribute(attrs, DelimiterTag::JobAttributes, "print-quality") {
        match v {
            IppValue::Enum(n) if (3..=5).contains(&n) => out.print_quality = Some(n),
            other => reject!("print-quality", other),
        }
    }

    // print-scaling: keyword from a recognized set.
    if let Some(v) = take_ipp_attribute(attrs, DelimiterTag::JobAttributes, "print-scaling") {
        const RECOGNIZED: &[&str] = &["auto", "auto-fit", "fill", "fit", "none"];
        match &v {
            IppValue::Keyword(k) if RECOGNIZED.contains(&k.as_str()) => {
                out.print_scaling = Some(k.clone());
            }
            _ => reject!("print-scaling", v),
        }
    }

    // print-speed: integer within the driver's supported [min, max].
    if let Some(v) = take_ipp_attribute(attrs, DelimiterTag::JobAttributes, "print-speed") {
        match (v, driver.speed_supported) {
            (IppValue::Integer(n), Some((min, max))) if (min..=max).contains(&n) => {
                out.print_speed = Some(n);
            }
            (other, _) => reject!("print-speed", other),
        }
    }

    // printer-resolution: resolution matching an advertised pair, dpi units.
    if let Some(v) = take_ipp_attribute(attrs, DelimiterTag::JobAttributes, "printer-resolution") {
        match &v {
            IppValue::Resolution {
                cross_feed,
                feed,
                units,
            } if *units == 3
                && driver
                    .resolution_supported
                    .iter()
                    .any(|r| r.cross_feed == *cross_feed && r.feed == *feed) =>
            {
                out.printer_resolution = Some(crate::model::Resolution {
                    cross_feed: *cross_feed,
                    feed: *feed,
                    units: *units,
                });
            }
            _ => reject!("printer-resolution", v),
        }
    }

    // sides: keyword in sides_supported.
    if let Some(v) = take_ipp_attribute(attrs, DelimiterTag::JobAttributes, "sides") {
        match &v {
            IppValue::Keyword(k) => match Sides::from_keyword(k) {
                Some(s) if driver.sides_supported.intersects(s) => out.sides = Some(s),
                _ => reject!("sides", v),
            },
            _ => reject!("sides", v),
        }
    }

    // job-name: name/nameLang, single; defaulted to "Untitled" if absent.
    let job_name = match take_ipp_attribute(attrs, DelimiterTag::OperationAttributes, "job-name")
        .or_else(|| take_ipp_attribute(attrs, DelimiterTag::JobAttributes, "job-name"))
    {
        Some(IppValue::NameWithoutLanguage(name)) => name,
        Some(IppValue::NameWithLanguage { name, .. }) => name,
        Some(other) => {
            reject!("job-name", other);
            "Untitled".to_string()
        }
        None => "Untitled".to_string(),
    };

    if out.copies == 0 {
        out.copies = 1;
    }

    if bad.is_empty() {
        Ok((out, job_name))
    } else {
        Err(bad)
    }
}

fn attrs_document_format(attrs: &ipp::attribute::IppAttributes) -> Option<String> {
    crate::utils::get_ipp_attribute(attrs, DelimiterTag::OperationAttributes, "document-format")
        .and_then(|v| match v {
            IppValue::MimeMediaType(s) => Some(s.clone()),
            _ => None,
        })
}

/// A collection value is a flat `Vec<IppValue>` with each member encoded as
/// a `MemberAttrName` immediately followed by its value (the `ipp` crate's
/// wire-faithful representation, not a keyed map). Scans for `name` and
/// returns the value paired with it.
fn collection_member<'a>(members: &'a [IppValue], name: &str) -> Option<&'a IppValue> {
    let mut iter = members.iter();
    while let Some(entry) = iter.next() {
        if let IppValue::MemberAttrName(member_name) = entry {
            let value = iter.next()?;
            if member_name == name {
                return Some(value);
            }
        }
    }
    None
}

fn collection_to_media_col(value: &IppValue, driver: &PrinterDriverData) -> Option<MediaCol> {
    let members = match value {
        IppValue::Collection(members) => members,
        _ => return None,
    };
    if let Some(name_value) = collection_member(members, "media-size-name") {
        if let IppValue::Keyword(name) = name_value {
            if driver.media_supported.iter().any(|m| m == name) {
                return Some(MediaCol {
                    size_name: name.clone(),
                    ..Default::default()
                });
            }
        }
        return None;
    }
    if let Some(size_value) = collection_member(members, "media-size") {
        if let IppValue::Collection(size_members) = size_value {
            let x = collection_member(size_members, "x-dimension");
            let y = collection_member(size_members, "y-dimension");
            if let (Some(IppValue::Integer(x)), Some(IppValue::Integer(y))) = (x, y) {
                let matches = driver
                    .media_ready
                    .iter()
                    .any(|m| m.x_dimension == *x && m.y_dimension == *y);
                if matches {
                    return Some(MediaCol {
                        x_dimension: *x,
                        y_dimension: *y,
                        ..Default::default()
                    });
                }
            }
        }
    }
    None
}
