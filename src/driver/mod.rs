//! Driver capability set: `{print, status, identify, autoadd}`.
//!
//! A printer application links one or more [`PrinterDriver`] implementations
//! and registers them by name with a [`crate::system::System`]. The core
//! never embeds raw function pointers in printer state (as the C original
//! does); instead driver data carries a `driver_name` string resolved through
//! a [`DriverRegistry`] at the point a callback needs to run, and the
//! callback itself is invoked with no lock held.

use crate::device::Device;
use crate::job::{Job, JobSnapshot};
use crate::printer::driver_data::PrinterDriverData;
use anyhow::Result;
use bitflags::bitflags;
use std::collections::HashMap;
use std::sync::Arc;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IdentifyActions: u32 {
        const DISPLAY = 0b0001;
        const FLASH   = 0b0010;
        const SOUND   = 0b0100;
        const SPEAK   = 0b1000;
    }
}

/// Mutable handle passed to the print callback; the only channel through
/// which a driver reports progress and observes a cancel request.
pub struct PrintContext<'a> {
    pub job: &'a JobSnapshot,
    pub device: &'a mut dyn Device,
    pub cancel_requested: Arc<std::sync::atomic::AtomicBool>,
}

impl PrintContext<'_> {
    /// Drivers poll this between page boundaries; PAPPL never interrupts a
    /// callback by force.
    pub fn is_canceled(&self) -> bool {
        self.cancel_requested
            .load(std::sync::atomic::Ordering::Relaxed)
    }
}

/// Status snapshot a driver may update in place during a status refresh.
#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    pub state_reasons: Vec<String>,
    pub supply_levels: Vec<(String, i32)>,
}

/// The capability set a concrete printer application implements once per
/// supported device family.
pub trait PrinterDriver: Send + Sync {
    /// Driver-declared capabilities merged into a printer's `driver_data`
    /// when the printer is created with this driver name.
    fn capabilities(&self) -> PrinterDriverData;

    /// Consume the job's document and drive `ctx.device`. Returning `Ok(())`
    /// completes the job; `Err` aborts it. The driver is responsible for
    /// checking `ctx.is_canceled()` between pages.
    fn print(&self, ctx: &mut PrintContext) -> Result<()>;

    /// Invoked at most once per second while the device is idle, to refresh
    /// supply levels and state reasons shown by Get-Printer-Attributes.
    fn status(&self, _device: Option<&mut dyn Device>) -> Result<StatusUpdate> {
        Ok(StatusUpdate::default())
    }

    /// Flash a light / beep / speak a message, per `actions`.
    fn identify(&self, _actions: IdentifyActions, _message: Option<&str>) -> Result<()> {
        Ok(())
    }

    /// Best-effort device probing for "auto-add" workflows; not exercised by
    /// the core's IPP surface, provided for parity with PAPPL's driver API.
    fn autoadd(&self, _device_uri: &str) -> Option<String> {
        None
    }
}

/// Maps a `driver-name` string (as stored in a printer's persisted state) to
/// the [`PrinterDriver`] implementation a host application registered for
/// it.
#[derive(Default, Clone)]
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn PrinterDriver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, driver: Arc<dyn PrinterDriver>) {
        self.drivers.insert(name.into(), driver);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn PrinterDriver>> {
        self.drivers.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.drivers.keys().map(|s| s.as_str())
    }
}
