use crate::driver::IdentifyActions;
use crate::model::Resolution;
use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ColorMode: u32 {
        const AUTO             = 0b00001;
        const MONOCHROME       = 0b00010;
        const COLOR            = 0b00100;
        const BI_LEVEL         = 0b01000;
        const AUTO_MONOCHROME  = 0b10000;
    }
}

impl ColorMode {
    pub fn keyword(self) -> &'static str {
        if self.contains(ColorMode::AUTO) {
            "auto"
        } else if self.contains(ColorMode::COLOR) {
            "color"
        } else if self.contains(ColorMode::BI_LEVEL) {
            "bi-level"
        } else if self.contains(ColorMode::AUTO_MONOCHROME) {
            "auto-monochrome"
        } else {
            "monochrome"
        }
    }

    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(ColorMode::AUTO),
            "monochrome" => Some(ColorMode::MONOCHROME),
            "color" => Some(ColorMode::COLOR),
            "bi-level" => Some(ColorMode::BI_LEVEL),
            "auto-monochrome" => Some(ColorMode::AUTO_MONOCHROME),
            _ => None,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Sides: u32 {
        const ONE_SIDED          = 0b001;
        const TWO_SIDED_LONG_EDGE  = 0b010;
        const TWO_SIDED_SHORT_EDGE = 0b100;
    }
}

impl Sides {
    pub fn keyword(self) -> &'static str {
        if self.contains(Sides::TWO_SIDED_LONG_EDGE) {
            "two-sided-long-edge"
        } else if self.contains(Sides::TWO_SIDED_SHORT_EDGE) {
            "two-sided-short-edge"
        } else {
            "one-sided"
        }
    }

    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "one-sided" => Some(Sides::ONE_SIDED),
            "two-sided-long-edge" => Some(Sides::TWO_SIDED_LONG_EDGE),
            "two-sided-short-edge" => Some(Sides::TWO_SIDED_SHORT_EDGE),
            _ => None,
        }
    }
}

/// One ready tray/media slot, as exported in `media-col-ready`/`media-ready`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaCol {
    pub size_name: String,
    pub x_dimension: i32,
    pub y_dimension: i32,
    pub source: String,
    pub media_type: String,
    pub borderless: bool,
}

impl MediaCol {
    pub fn is_populated(&self) -> bool {
        !self.size_name.is_empty() && self.x_dimension > 0 && self.y_dimension > 0
    }
}

#[derive(Debug, Clone)]
pub struct Supply {
    pub color: Option<String>,
    pub description: String,
    pub kind: String,
    pub level: i32,
    pub is_consumed: bool,
}

/// Driver-declared capabilities and current defaults, imported from a
/// registered [`crate::driver::PrinterDriver`] when the printer is created
/// and subsequently adjustable via Set-Printer-Attributes.
#[derive(Debug, Clone)]
pub struct PrinterDriverData {
    pub driver_name: String,
    pub color_supported: ColorMode,
    pub color_default: ColorMode,
    pub sides_supported: Sides,
    pub sides_default: Sides,
    pub resolution_supported: Vec<Resolution>,
    pub resolution_default: Option<Resolution>,
    pub media_supported: Vec<String>,
    pub media_default: String,
    pub media_ready: Vec<MediaCol>,
    pub sources: Vec<String>,
    pub supplies: Vec<Supply>,
    pub borderless: bool,
    pub speed_supported: Option<(i32, i32)>,
    pub darkness_supported: bool,
    pub darkness_configured: i32,
    pub output_bins: Vec<String>,
    pub identify_actions_supported: IdentifyActions,
    pub identify_actions_default: IdentifyActions,
    pub page_ranges_supported: bool,
    pub document_format_supported: Vec<String>,
    pub document_format_default: String,
    pub vendor_attributes: Vec<String>,
    /// Upper bound on concurrently-admitted non-terminal jobs; `0` means
    /// unlimited. A driver that models a device with a single job slot
    /// (no queueing) sets this to `1` so admission rejects further
    /// submissions with `server-error-busy` while a job is outstanding.
    pub max_active_jobs: i32,
}

impl Default for PrinterDriverData {
    fn default() -> Self {
        Self {
            driver_name: String::new(),
            color_supported: ColorMode::MONOCHROME,
            color_default: ColorMode::MONOCHROME,
            sides_supported: Sides::ONE_SIDED,
            sides_default: Sides::ONE_SIDED,
            resolution_supported: vec![Resolution::new_dpi(300, 300)],
            resolution_default: Some(Resolution::new_dpi(300, 300)),
            media_supported: vec!["na_letter_8.5x11in".to_string()],
            media_default: "na_letter_8.5x11in".to_string(),
            media_ready: Vec::new(),
            sources: vec!["main".to_string()],
            supplies: Vec::new(),
            borderless: false,
            speed_supported: None,
            darkness_supported: false,
            darkness_configured: 0,
            output_bins: vec!["face-down".to_string()],
            identify_actions_supported: IdentifyActions::DISPLAY | IdentifyActions::SOUND,
            identify_actions_default: IdentifyActions::SOUND,
            page_ranges_supported: false,
            document_format_supported: vec!["application/octet-stream".to_string()],
            document_format_default: "application/octet-stream".to_string(),
            vendor_attributes: Vec::new(),
            max_active_jobs: 0,
        }
    }
}
