//! Process resource collector for a Prometheus registry.
//!
//! The collector reads `<root>/<pid>/stat` for every numeric entry under the
//! configured filesystem root and exports six fixed metrics:
//!
//! | Metric                                  | Type    |
//! |-----------------------------------------|---------|
//! | `<prefix>virtual_memory_bytes`          | gauge   |
//! | `<prefix>resident_memory_bytes`         | gauge   |
//! | `<prefix>start_time_seconds`            | gauge   |
//! | `<prefix>cpu_seconds_total`             | counter |
//! | `<prefix>open_fds`                      | gauge   |
//! | `<prefix>max_fds`                       | gauge   |
//!
//! The prefix is `process_`, or `<namespace>_process_` when a namespace is set.

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{Counter, Gauge, Opts, Registry};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, trace, warn};

use crate::platform::PlatformConstants;
use crate::stat::{read_boot_time, read_pid_stat, ProcStat, StatError};

/// Default mount point of the process-information filesystem.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Errors raised while building or registering a collector.
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("metric error: {0}")]
    Metric(#[from] prometheus::Error),

    #[error("invalid pid selector {0:?}: expected \"self\" or a numeric process id")]
    InvalidPid(String),
}

/// Which process the collector is configured to describe.
///
/// The aggregation pass does not filter on this value; it always covers every
/// numeric entry under the root. The selector is only used by
/// [`ProcessStatsCollector::probe_selected`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PidSelector {
    /// The process reading the filesystem (`<root>/self`).
    #[default]
    SelfProcess,
    /// A fixed process id.
    Pid(u32),
}

impl fmt::Display for PidSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PidSelector::SelfProcess => f.write_str("self"),
            PidSelector::Pid(pid) => write!(f, "{}", pid),
        }
    }
}

impl FromStr for PidSelector {
    type Err = CollectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "self" {
            return Ok(PidSelector::SelfProcess);
        }
        s.parse()
            .map(PidSelector::Pid)
            .map_err(|_| CollectorError::InvalidPid(s.to_string()))
    }
}

/// Construction options for [`ProcessStatsCollector`].
#[derive(Debug, Clone)]
pub struct CollectorOptions {
    /// Metric namespace; empty for the bare `process_` prefix.
    pub namespace: String,
    /// Process checked by [`ProcessStatsCollector::probe_selected`]; not a scan filter.
    pub pid: PidSelector,
    /// Root of the process-information filesystem.
    pub proc_root: PathBuf,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            pid: PidSelector::default(),
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
        }
    }
}

/// Totals accumulated over one scan, already converted to seconds and bytes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProcessTotals {
    pub virtual_memory_bytes: u64,
    pub resident_memory_bytes: u64,
    pub cpu_seconds: f64,
    /// Number of records parsed successfully.
    pub processes: usize,
    /// The most recently parsed record, in directory listing order.
    pub last: Option<ProcStat>,
}

impl ProcessTotals {
    fn add(&mut self, stat: ProcStat, constants: &PlatformConstants) {
        self.virtual_memory_bytes = self.virtual_memory_bytes.saturating_add(stat.vsize_bytes);
        self.resident_memory_bytes = self
            .resident_memory_bytes
            .saturating_add(stat.rss_bytes(constants.pagesize));
        self.cpu_seconds += stat.cpu_seconds(constants.ticks);
        self.processes += 1;
        self.last = Some(stat);
    }
}

#[derive(Clone, Copy)]
enum MetricKind {
    Gauge,
    Counter,
}

struct MetricDef {
    suffix: &'static str,
    help: &'static str,
    kind: MetricKind,
}

/// Exported metrics, in emission order.
const METRICS: [MetricDef; 6] = [
    MetricDef {
        suffix: "virtual_memory_bytes",
        help: "Virtual memory size in bytes.",
        kind: MetricKind::Gauge,
    },
    MetricDef {
        suffix: "resident_memory_bytes",
        help: "Resident memory size in bytes.",
        kind: MetricKind::Gauge,
    },
    MetricDef {
        suffix: "start_time_seconds",
        help: "Start time of the process since unix epoch in seconds.",
        kind: MetricKind::Gauge,
    },
    MetricDef {
        suffix: "cpu_seconds_total",
        help: "Total user and system CPU time spent in seconds.",
        kind: MetricKind::Counter,
    },
    MetricDef {
        suffix: "open_fds",
        help: "Number of open file descriptors.",
        kind: MetricKind::Gauge,
    },
    MetricDef {
        suffix: "max_fds",
        help: "Maximum number of open file descriptors.",
        kind: MetricKind::Gauge,
    },
];

/// Collector for standard process metrics such as CPU and memory.
///
/// Boot time is probed once at construction. If it cannot be read the
/// collector is permanently unavailable and [`Collector::collect`] returns no
/// families.
///
/// Memory and CPU values are sums over every process found under the root.
/// `start_time_seconds` is taken from the last record parsed during the scan,
/// so it only describes a real process when the root holds a single one.
/// `open_fds` and `max_fds` are always 0.
///
/// Construction fails with [`CollectorError::Metric`] when the namespace does
/// not form valid metric names, because `prometheus` validates names when the
/// descriptors are built. Nothing read from the filesystem can fail it.
pub struct ProcessStatsCollector {
    prefix: String,
    pid: PidSelector,
    proc_root: PathBuf,
    constants: PlatformConstants,
    boot_time: Option<u64>,
    descs: Vec<Desc>,
}

impl ProcessStatsCollector {
    /// Creates a collector, resolving platform constants from the running system.
    pub fn new(options: CollectorOptions) -> Result<Self, CollectorError> {
        Self::with_constants(options, PlatformConstants::resolve())
    }

    /// Creates a collector with explicit platform constants.
    ///
    /// Fails only when the namespace does not form valid metric names.
    pub fn with_constants(
        options: CollectorOptions,
        constants: PlatformConstants,
    ) -> Result<Self, CollectorError> {
        let prefix = metric_prefix(&options.namespace);

        let descs = METRICS
            .iter()
            .map(|def| {
                Desc::new(
                    format!("{}{}", prefix, def.suffix),
                    def.help.to_string(),
                    vec![],
                    HashMap::new(),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let boot_time = probe_boot_time(&options.proc_root);

        debug!(
            "Process collector created: prefix={}, root={}, pid={}, ticks={}, pagesize={}, btime={:?}",
            prefix,
            options.proc_root.display(),
            options.pid,
            constants.ticks,
            constants.pagesize,
            boot_time
        );

        Ok(Self {
            prefix,
            pid: options.pid,
            proc_root: options.proc_root,
            constants,
            boot_time,
            descs,
        })
    }

    /// Registers this collector with `registry`.
    pub fn register(self, registry: &Registry) -> Result<(), CollectorError> {
        registry.register(Box::new(self))?;
        Ok(())
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn pid_selector(&self) -> PidSelector {
        self.pid
    }

    pub fn proc_root(&self) -> &Path {
        &self.proc_root
    }

    pub fn constants(&self) -> PlatformConstants {
        self.constants
    }

    /// Boot time in seconds since epoch, if it could be read at construction.
    pub fn boot_time(&self) -> Option<u64> {
        self.boot_time
    }

    /// Whether collection passes produce metrics at all.
    pub fn is_available(&self) -> bool {
        self.boot_time.is_some()
    }

    /// Reads the status record of the configured process selector.
    pub fn probe_selected(&self) -> Result<ProcStat, StatError> {
        read_pid_stat(&self.proc_root.join(self.pid.to_string()))
    }

    /// Scans every numeric entry under the root and sums their usage.
    ///
    /// Entries that vanish, cannot be read or do not parse are skipped.
    pub fn scan(&self) -> ProcessTotals {
        let mut totals = ProcessTotals::default();

        let entries = match fs::read_dir(&self.proc_root) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Failed to list {}: {}", self.proc_root.display(), e);
                return totals;
            }
        };

        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if !is_pid(name) {
                continue;
            }

            match read_pid_stat(&entry.path()) {
                Ok(stat) => totals.add(stat, &self.constants),
                Err(e) => trace!("Skipping pid {}: {}", name, e),
            }
        }

        debug!(
            "Scanned {} processes under {}",
            totals.processes,
            self.proc_root.display()
        );
        totals
    }

    /// Start time of the last parsed process in seconds since epoch, or 0.
    fn start_time_seconds(&self, totals: &ProcessTotals, boot_time: u64) -> f64 {
        match totals.last {
            Some(stat) => stat.start_ticks as f64 / self.constants.ticks + boot_time as f64,
            None => 0.0,
        }
    }

    fn family(&self, def: &MetricDef, value: f64) -> Vec<MetricFamily> {
        let opts = Opts::new(format!("{}{}", self.prefix, def.suffix), def.help);
        let built = match def.kind {
            MetricKind::Gauge => Gauge::with_opts(opts).map(|g| {
                g.set(value);
                g.collect()
            }),
            MetricKind::Counter => Counter::with_opts(opts).map(|c| {
                c.inc_by(value);
                c.collect()
            }),
        };

        built.unwrap_or_else(|e| {
            warn!("Failed to build metric {}{}: {}", self.prefix, def.suffix, e);
            Vec::new()
        })
    }
}

impl Collector for ProcessStatsCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.descs.iter().collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let Some(boot_time) = self.boot_time else {
            return Vec::new();
        };

        let totals = self.scan();
        let values = [
            totals.virtual_memory_bytes as f64,
            totals.resident_memory_bytes as f64,
            self.start_time_seconds(&totals, boot_time),
            totals.cpu_seconds,
            0.0,
            0.0,
        ];

        METRICS
            .iter()
            .zip(values)
            .flat_map(|(def, value)| self.family(def, value))
            .collect()
    }
}

/// Builds the metric name prefix for a namespace.
pub fn metric_prefix(namespace: &str) -> String {
    if namespace.is_empty() {
        "process_".to_string()
    } else {
        format!("{}_process_", namespace)
    }
}

fn is_pid(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit())
}

fn probe_boot_time(root: &Path) -> Option<u64> {
    match read_boot_time(root) {
        Ok(0) => {
            info!(
                "Boot time in {} is zero - process metrics disabled",
                root.join("stat").display()
            );
            None
        }
        Ok(btime) => Some(btime),
        Err(e) => {
            info!("Cannot determine boot time ({}) - process metrics disabled", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_prefix() {
        assert_eq!(metric_prefix(""), "process_");
        assert_eq!(metric_prefix("myapp"), "myapp_process_");
    }

    #[test]
    fn test_is_pid() {
        assert!(is_pid("1"));
        assert!(is_pid("4242"));
        assert!(!is_pid(""));
        assert!(!is_pid("self"));
        assert!(!is_pid("1a"));
        assert!(!is_pid("-1"));
    }

    #[test]
    fn test_pid_selector_parse() {
        assert_eq!("self".parse::<PidSelector>().unwrap(), PidSelector::SelfProcess);
        assert_eq!(" 42 ".parse::<PidSelector>().unwrap(), PidSelector::Pid(42));
        assert!(matches!(
            "init".parse::<PidSelector>(),
            Err(CollectorError::InvalidPid(_))
        ));
    }

    #[test]
    fn test_pid_selector_display() {
        assert_eq!(PidSelector::SelfProcess.to_string(), "self");
        assert_eq!(PidSelector::Pid(7).to_string(), "7");
    }

    #[test]
    fn test_totals_add() {
        let constants = PlatformConstants {
            ticks: 100.0,
            pagesize: 4096,
        };
        let stat = ProcStat {
            utime_ticks: 50,
            stime_ticks: 30,
            start_ticks: 1000,
            vsize_bytes: 204800,
            rss_pages: 10,
        };

        let mut totals = ProcessTotals::default();
        totals.add(stat, &constants);
        totals.add(stat, &constants);

        assert_eq!(totals.virtual_memory_bytes, 409600);
        assert_eq!(totals.resident_memory_bytes, 81920);
        assert!((totals.cpu_seconds - 1.6).abs() < 1e-9);
        assert_eq!(totals.processes, 2);
        assert_eq!(totals.last, Some(stat));
    }
}
