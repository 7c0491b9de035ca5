pub mod auth;
pub mod dispatcher;

use crate::device;
use crate::driver::DriverRegistry;
use crate::persist;
use crate::printer::Printer;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Instant, SystemTime};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    Off,
    Optional,
    Required,
}

pub struct SystemIdentity {
    pub uuid: Uuid,
    pub dns_sd_name: String,
    pub hostname: String,
    pub geo_location: Option<String>,
    pub location: Option<String>,
    pub organization: Option<String>,
    pub organizational_unit: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_telephone: Option<String>,
    pub admin_group: Option<String>,
    pub default_print_group: Option<String>,
    pub software_versions: Vec<(String, String)>,
}

pub struct SystemOptions {
    pub log_level: String,
    pub max_log_size: u64,
    pub auth_service: Option<String>,
    pub tls_mode: TlsMode,
    pub port: u16,
    pub multi_queue: bool,
    pub web_ui: bool,
    pub raw_socket: bool,
    pub usb_gadget: bool,
}

/// Fields protected by the system-wide reader-writer lock (spec.md §5):
/// the printer table, resource table, and global identity fields.
pub struct SystemTable {
    pub identity: SystemIdentity,
    pub options: SystemOptions,
    pub printers: HashMap<i32, Arc<Printer>>,
    pub next_printer_id: i32,
    pub default_printer_id: Option<i32>,
    pub resources: HashMap<String, Vec<u8>>,
}

/// Process-wide singleton (spec.md §3, System), but never a global: a
/// single `Arc<System>` is constructed at startup and threaded explicitly
/// into every handler (spec.md §9 Design Notes, "Global singleton").
pub struct System {
    pub table: RwLock<SystemTable>,
    pub devices: device::Registry,
    pub drivers: DriverRegistry,
    pub authorizer: Box<dyn auth::Authorizer>,
    pub spool_dir: PathBuf,
    pub state_path: PathBuf,
    pub app_name: String,
    pub start_time: Instant,
    pub listening_port: AtomicI32,
    /// 0 = running; otherwise the unix-epoch deadline shutdown was
    /// requested at (spec.md §3: "shutdown deadline timestamp (0 =
    /// running)").
    pub shutdown_deadline: AtomicU64,
    pub running: AtomicBool,
    pub save_pending: AtomicBool,
}

impl System {
    pub fn new(
        app_name: String,
        spool_dir: PathBuf,
        options: SystemOptions,
        devices: device::Registry,
        drivers: DriverRegistry,
        authorizer: Box<dyn auth::Authorizer>,
    ) -> Arc<Self> {
        let state_path = spool_dir.join(format!("{app_name}.state"));
        let identity = SystemIdentity {
            uuid: Uuid::new_v4(),
            dns_sd_name: app_name.clone(),
            hostname: hostname_or_default(),
            geo_location: None,
            location: None,
            organization: None,
            organizational_unit: None,
            contact_name: None,
            contact_email: None,
            contact_telephone: None,
            admin_group: None,
            default_print_group: None,
            software_versions: Vec::new(),
        };
        Arc::new(Self {
            table: RwLock::new(SystemTable {
                identity,
                options,
                printers: HashMap::new(),
                next_printer_id: 1,
                default_printer_id: None,
                resources: HashMap::new(),
            }),
            devices,
            drivers,
            authorizer,
            spool_dir,
            state_path,
            app_name,
            start_time: Instant::now(),
            listening_port: AtomicI32::new(0),
            shutdown_deadline: AtomicU64::new(0),
            running: AtomicBool::new(false),
            save_pending: AtomicBool::new(false),
        })
    }

    pub fn uptime_secs(&self) -> i64 {
        self.start_time.elapsed().as_secs() as i64
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_deadline.load(Ordering::SeqCst) != 0
    }

    /// Called externally to begin an orderly shutdown: sets a deadline,
    /// after which admission is refused and jobs still running are aborted
    /// (spec.md §4.E Lifecycle, §5 Cancellation & timeouts).
    pub fn request_shutdown(&self, grace: std::time::Duration) {
        let deadline = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            + grace;
        self.shutdown_deadline
            .store(deadline.as_secs(), Ordering::SeqCst);
        let table = self.table.read().unwrap();
        for printer in table.printers.values() {
            printer.request_shutdown();
        }
    }

    pub fn find_printer(&self, id: i32) -> Option<Arc<Printer>> {
        self.table.read().unwrap().printers.get(&id).cloned()
    }

    pub fn default_printer(&self) -> Option<Arc<Printer>> {
        let table = self.table.read().unwrap();
        if table.printers.len() == 1 {
            return table.printers.values().next().cloned();
        }
        table
            .default_printer_id
            .and_then(|id| table.printers.get(&id).cloned())
    }

    /// Allocates a printer id, inserts the printer, bumps `next_printer_id`,
    /// and schedules a save (spec.md §3 invariant 3, §4.E Persistence).
    pub fn add_printer(self: &Arc<Self>, printer: Printer) -> Arc<Printer> {
        let printer = Arc::new(printer);
        let mut table = self.table.write().unwrap();
        table.printers.insert(printer.id, printer.clone());
        if table.next_printer_id <= printer.id {
            table.next_printer_id = printer.id + 1;
        }
        if table.default_printer_id.is_none() {
            table.default_printer_id = Some(printer.id);
        }
        drop(table);
        self.schedule_save();
        printer
    }

    pub fn next_printer_id(&self) -> i32 {
        let mut table = self.table.write().unwrap();
        let id = table.next_printer_id;
        table.next_printer_id += 1;
        id
    }

    pub fn delete_printer(&self, id: i32) -> bool {
        let removed = {
            let mut table = self.table.write().unwrap();
            let removed = table.printers.remove(&id);
            if table.default_printer_id == Some(id) {
                table.default_printer_id = table.printers.keys().next().copied();
            }
            removed
        };
        if let Some(printer) = removed {
            printer.deleted.store(true, Ordering::SeqCst);
            printer.request_shutdown();
            self.schedule_save();
            true
        } else {
            false
        }
    }

    /// Debounced save: marks a save pending; the maintenance thread
    /// coalesces repeated calls into a single write (spec.md §4.E
    /// Persistence).
    pub fn schedule_save(&self) {
        self.save_pending.store(true, Ordering::SeqCst);
    }

    pub fn save_now(&self) -> anyhow::Result<()> {
        persist::save(self)?;
        self.save_pending.store(false, Ordering::SeqCst);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Marks the system as running; called once the IPP listener is bound
    /// and the accept loop is about to start (spec.md §3 Lifecycles,
    /// "created -> running"). Identity setters become no-ops afterward.
    pub fn mark_running(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    /// Sets the system's contact/location identity fields. A no-op,
    /// returning `false`, once the system is running (spec.md §3 invariant
    /// 6, Lifecycles: "Several setters are allowed only while not yet
    /// running... they become no-ops once running").
    pub fn set_location(&self, location: String) -> bool {
        if self.is_running() {
            return false;
        }
        self.table.write().unwrap().identity.location = Some(location);
        true
    }

    pub fn set_organization(&self, organization: String, unit: Option<String>) -> bool {
        if self.is_running() {
            return false;
        }
        let mut table = self.table.write().unwrap();
        table.identity.organization = Some(organization);
        table.identity.organizational_unit = unit;
        true
    }

    pub fn set_contact(&self, name: String, email: Option<String>, telephone: Option<String>) -> bool {
        if self.is_running() {
            return false;
        }
        let mut table = self.table.write().unwrap();
        table.identity.contact_name = Some(name);
        table.identity.contact_email = email;
        table.identity.contact_telephone = telephone;
        true
    }

    /// Sets the system's geo-location, validating the `geo:` URI grammar
    /// (spec.md §3 invariant 7); a malformed value or a running system both
    /// leave the field unchanged.
    pub fn set_geo_location(&self, geo_location: String) -> bool {
        if self.is_running() || !crate::utils::is_valid_geo_uri(&geo_location) {
            return false;
        }
        self.table.write().unwrap().identity.geo_location = Some(geo_location);
        true
    }
}

impl System {
    /// Registers a language-tagged static resource under `/strings/<lang>.strings`
    /// (spec.md §3, "resource table: language-tagged static assets keyed by
    /// URL path").
    pub fn add_strings_resource(&self, lang: &str, body: Vec<u8>) {
        let path = format!("/strings/{lang}.strings");
        self.table.write().unwrap().resources.insert(path, body);
    }

    /// Resolves `printer-strings-uri` for the client's
    /// `attributes-natural-language`: an exact match on the registered
    /// language, falling back to a base-language prefix match (e.g. `en`
    /// for a request naming `en-US`), per spec.md §4.D.
    pub fn strings_uri(&self, lang: &str, scheme: &str, host: &str) -> Option<String> {
        let table = self.table.read().unwrap();
        let exact = format!("/strings/{lang}.strings");
        let base = lang.split('-').next().unwrap_or(lang);
        let base_path = format!("/strings/{base}.strings");
        let resource_path = if table.resources.contains_key(&exact) {
            exact
        } else if table.resources.contains_key(&base_path) {
            base_path
        } else {
            return None;
        };
        Some(format!("{scheme}://{host}{resource_path}"))
    }
}

fn hostname_or_default() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string())
}
