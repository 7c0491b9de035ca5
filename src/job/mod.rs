pub mod admission;
pub mod pipeline;

use crate::printer::driver_data::{ColorMode, Sides};
use futures::io::AsyncReadExt;
use ipp::model::JobState as WireJobState;
use ipp::payload::IppPayload;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::SystemTime;

/// Drains a (possibly decompressed) document payload to a spool file,
/// mirroring the original C `papplJobOpenFile`/spool-to-disk step that
/// precedes the driver callback (spec.md §4.C).
pub async fn spool_payload(
    spool_dir: &Path,
    job_id: i32,
    mut payload: IppPayload,
) -> anyhow::Result<(PathBuf, usize)> {
    let mut buf = Vec::new();
    payload.read_to_end(&mut buf).await?;
    let path = spool_dir.join(format!("job-{job_id}.prn"));
    std::fs::write(&path, &buf)?;
    Ok((path, buf.len()))
}

/// `pending -> processing -> {completed, canceled, aborted, stopped}`;
/// `pending -> held -> pending`; any non-terminal state may transition to
/// `canceled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Pending,
    Held,
    Processing,
    Stopped,
    Canceled,
    Aborted,
    Completed,
}

impl State {
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Canceled | State::Aborted | State::Completed)
    }

    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    pub fn to_wire(self) -> WireJobState {
        match self {
            State::Pending => WireJobState::Pending,
            State::Held => WireJobState::PendingHeld,
            State::Processing => WireJobState::Processing,
            State::Stopped => WireJobState::ProcessingStopped,
            State::Canceled => WireJobState::Canceled,
            State::Aborted => WireJobState::Aborted,
            State::Completed => WireJobState::Completed,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            State::Pending => "Pending.",
            State::Held => "Held for printing.",
            State::Processing => "Processing.",
            State::Stopped => "Stopped.",
            State::Canceled => "Canceled.",
            State::Aborted => "Aborted.",
            State::Completed => "Completed.",
        }
    }
}

/// The subset of submitted job-template attributes the core retains after
/// admission (spec.md §3, Job).
#[derive(Debug, Clone, Default)]
pub struct JobTemplateAttributes {
    pub copies: i32,
    pub impressions_requested: Option<i32>,
    pub media: String,
    pub media_col: Option<crate::printer::driver_data::MediaCol>,
    pub print_color_mode: Option<ColorMode>,
    pub orientation_requested: Option<crate::model::PageOrientation>,
    pub print_quality: Option<i32>,
    pub print_scaling: Option<String>,
    pub sides: Option<Sides>,
    pub print_darkness: Option<i32>,
    pub print_speed: Option<i32>,
    pub page_ranges: Option<(i32, i32)>,
    pub multiple_document_handling: Option<String>,
    pub print_content_optimize: Option<String>,
    pub printer_resolution: Option<crate::model::Resolution>,
}

#[derive(Debug)]
pub struct Job {
    pub id: i32,
    pub username: String,
    pub name: String,
    pub document_format: Option<String>,
    pub spool_path: Option<PathBuf>,
    pub attributes: JobTemplateAttributes,
    pub state: State,
    pub state_reasons: Vec<String>,
    pub created_at: SystemTime,
    pub processing_at: Option<SystemTime>,
    pub completed_at: Option<SystemTime>,
    pub impressions_requested: i32,
    pub impressions_completed: i32,
    pub cancel_requested: Arc<AtomicBool>,
    /// Set once a Send-Document with `last-document` true has been applied;
    /// any further Send-Document for this job is an extra body (spec.md
    /// §4.D, Print-Job row).
    pub closed: bool,
}

impl Job {
    pub fn new(id: i32, username: String, name: String, attributes: JobTemplateAttributes) -> Self {
        let impressions_requested = attributes
            .impressions_requested
            .unwrap_or_else(|| attributes.copies.max(1));
        Self {
            id,
            username,
            name,
            document_format: None,
            spool_path: None,
            attributes,
            state: State::Pending,
            state_reasons: vec!["none".to_string()],
            created_at: SystemTime::now(),
            processing_at: None,
            completed_at: None,
            impressions_requested,
            impressions_completed: 0,
            cancel_requested: Arc::new(AtomicBool::new(false)),
            closed: false,
        }
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id,
            username: self.username.clone(),
            name: self.name.clone(),
            document_format: self.document_format.clone(),
            spool_path: self.spool_path.clone(),
            attributes: self.attributes.clone(),
        }
    }

    /// Removes the spooled document file, if any, once the job reaches a
    /// terminal state (spec.md §5, "files are unlinked on terminal
    /// state"). Best-effort: a missing file is not an error.
    pub fn unlink_spool(&mut self) {
        if let Some(path) = self.spool_path.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Immutable view of a job handed to a driver callback; driver callbacks
/// run with no lock held, so they never see `Job` directly.
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub id: i32,
    pub username: String,
    pub name: String,
    pub document_format: Option<String>,
    pub spool_path: Option<PathBuf>,
    pub attributes: JobTemplateAttributes,
}
