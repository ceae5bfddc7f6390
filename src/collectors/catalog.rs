//! Registry of every metric the built-in tasks may emit. Single source of
//! truth for exposed names: key + `altibase_` prefix = Prometheus name.

use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const NAMESPACE: &str = "altibase";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    /// Gauge of value 1 whose labels carry metadata.
    Info,
}

#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub key: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
}

const fn gauge(key: &'static str, help: &'static str) -> MetricDef {
    MetricDef {
        key,
        help,
        kind: MetricKind::Gauge,
    }
}

const fn info(key: &'static str, help: &'static str) -> MetricDef {
    MetricDef {
        key,
        help,
        kind: MetricKind::Info,
    }
}

/// Declaration order is the order `keys()` reports; lookups go through an
/// index built once.
static DEFS: &[MetricDef] = &[
    info("exporter_build", "Exporter build identity (Info)."),
    info("version", "Altibase server version (Info)."),
    gauge("exporter_last_scrape_success", "1 if last scrape succeeded, 0 otherwise."),
    gauge("scrape_duration_seconds", "Duration of the last scrape in seconds."),
    gauge("instance_working_time_seconds", "Instance working time (V$INSTANCE)."),
    gauge("archive_mode", "Archive mode 0/1 (V$ARCHIVE)."),
    gauge("sessions", "Session count; label status: total, active."),
    gauge("statements", "Statement count; label status: total, active."),
    gauge("memstat_max_total_bytes", "Sum of MAX_TOTAL_SIZE from V$MEMSTAT."),
    gauge("memstat_alloc_bytes", "Sum of ALLOC_SIZE from V$MEMSTAT."),
    gauge("buffer_pool_hit_ratio", "Buffer pool hit ratio (V$BUFFPOOL_STAT)."),
    gauge("buffer_pool_victim_fails", "Buffer pool victim failures (V$BUFFPOOL_STAT)."),
    gauge("logfile_oldest", "Oldest active logfile number (V$ARCHIVE)."),
    gauge("logfile_current", "Current logfile number (V$ARCHIVE)."),
    gauge("logfile_gap", "Logfile gap: current minus oldest (V$ARCHIVE)."),
    gauge("lf_prepare_wait_count", "Logfile prepare wait count (V$LFG)."),
    gauge("lock_hold_count", "Number of lock holds (V$LOCK_STATEMENT STATE=0)."),
    gauge("lock_wait_count", "Number of lock waits (V$LOCK_STATEMENT STATE=1)."),
    gauge("long_run_query_count", "Long-running queries (execute time > 1s)."),
    gauge("utrans_query_count", "Uncommitted transaction queries (UTRANS)."),
    gauge("fullscan_query_count", "Full-scan queries (excluding exporter sessions)."),
    gauge("replication_sender_count", "Replication senders (V$REPSENDER)."),
    gauge("replication_receiver_count", "Replication receivers (V$REPRECEIVER)."),
    gauge("replication_gap", "Replication gap by name (V$REPGAP)."),
    gauge("replication_peer", "Replication peer endpoint per sender (V$REPSENDER)."),
    gauge("memory_table_usage_bytes", "Total memory table usage (V$MEMTBL_INFO)."),
    gauge("disk_table_usage_bytes", "Total disk table usage (V$DISKTBL_INFO)."),
    gauge("memstat_usage_ratio", "Per-name memstat usage ratio, top 10."),
    gauge("memstat_bytes", "Per-name memstat max_total_size and alloc_size."),
    gauge("gc_gap", "GC gap by GC name (V$MEMGC)."),
    gauge("tablespace_total_bytes", "Tablespace total size (memory)."),
    gauge("tablespace_state", "Tablespace state 1=ONLINE, 0=OFFLINE."),
    gauge("tablespace_usage_ratio", "Tablespace usage ratio (memory)."),
    gauge("file_io_reads", "Cumulative physical reads per file (V$FILESTAT)."),
    gauge("file_io_writes", "Cumulative physical writes per file (V$FILESTAT)."),
    gauge("file_io_wait_seconds", "Avg single-block read wait per file (seconds)."),
    gauge("system_event_time_waited_seconds", "System event time waited, non-Idle."),
    gauge("session_event_time_waited_seconds", "Session event time waited, non-Idle."),
    gauge("memory_table_usage_bytes_per_table", "Memory table usage per table, top 5."),
    gauge("disk_table_usage_bytes_per_table", "Disk table usage per table, top 5."),
    gauge("queue_usage_bytes", "Queue table usage."),
    gauge("segment_usage_bytes", "Segment usage by tablespace."),
    gauge("service_thread_count", "Service thread count by type/state/run_mode (V$SERVICE_THREAD)."),
    gauge("sysstat", "V$SYSSTAT values."),
    gauge("lock_hold_detail", "Top 1 lock hold (detail labels)."),
    gauge("lock_wait_detail", "Top 1 lock wait (detail labels)."),
    gauge("tx_of_memory_view_scn", "Top 1 tx pinning the memory view SCN (detail labels)."),
    gauge("long_run_query_detail", "Top 1 long-running query (detail labels)."),
    gauge("utrans_query_detail", "Top 1 uncommitted transaction query (detail labels)."),
    gauge("fullscan_query_detail", "Top 1 full-scan query (detail labels)."),
];

static INDEX: Lazy<HashMap<&'static str, &'static MetricDef>> =
    Lazy::new(|| DEFS.iter().map(|d| (d.key, d)).collect());

#[must_use]
pub fn def(key: &str) -> Option<&'static MetricDef> {
    INDEX.get(key).copied()
}

/// The exposed Prometheus name for a catalog key.
#[must_use]
pub fn name(key: &str) -> String {
    format!("{NAMESPACE}_{key}")
}

#[must_use]
pub fn help(key: &str) -> &'static str {
    def(key).map_or("", |d| d.help)
}

/// Catalog keys in declaration order.
#[must_use]
pub fn keys() -> impl Iterator<Item = &'static str> {
    DEFS.iter().map(|d| d.key)
}

/// Startup self-test: every key a task declares must resolve in the catalog.
/// A mismatch is a programmer error and aborts startup.
pub fn verify_tasks() -> anyhow::Result<()> {
    for task in super::all_tasks() {
        for key in task.keys {
            if def(key).is_none() {
                anyhow::bail!(
                    "task '{}' declares key '{}' which is not in the metric catalog",
                    task.name,
                    key
                );
            }
        }
    }
    Ok(())
}
