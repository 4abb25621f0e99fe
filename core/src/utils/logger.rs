use log::kv::{self, Key, Value, Visitor};
use log::{Log, Metadata, Record, SetLoggerError};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::cell::RefCell;
use std::collections::HashMap;

// --- Thread-local correlation ID storage ---
// The correlation id is whichever scope is active on the calling thread: a
// lead id while processing ingestion, a cycle id inside the optimization
// loop, a sequence id while the scheduler is ticking.

thread_local! {
    static CURRENT_CORRELATION_ID: RefCell<Option<String>> = RefCell::new(None);
}

/// Sets the current correlation ID for the calling thread.
pub fn set_current_correlation_id(correlation_id: String) {
    CURRENT_CORRELATION_ID.with(|id_cell| {
        *id_cell.borrow_mut() = Some(correlation_id);
    });
}

/// Clears the current correlation ID for the calling thread.
pub fn clear_current_correlation_id() {
    CURRENT_CORRELATION_ID.with(|id_cell| {
        *id_cell.borrow_mut() = None;
    });
}

// --- Log Record Structure for JSON output ---

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonLogRecord {
    pub timestamp: String,
    pub level: String,
    pub message: String,
    pub correlation_id: Option<String>,
    pub name: String,
    pub module_path: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

// --- Custom Logger Implementation ---

struct JsonLogger;

struct KeyValueCollector<'a>(&'a mut HashMap<String, serde_json::Value>);

impl<'a> Visitor<'a> for KeyValueCollector<'a> {
    fn visit_pair(&mut self, key: Key<'a>, value: Value<'a>) -> Result<(), kv::Error> {
        self.0
            .insert(key.as_str().to_string(), json!(value.to_string()));
        Ok(())
    }
}

impl Log for JsonLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let correlation_id = CURRENT_CORRELATION_ID.with(|id_cell| id_cell.borrow().clone());

        let mut extra_fields = HashMap::new();
        let mut collector = KeyValueCollector(&mut extra_fields);
        if let Err(e) = record.key_values().visit(&mut collector) {
            eprintln!("error visiting log key-value pairs: {:?}", e);
        }

        let log_record = JsonLogRecord {
            timestamp: chrono::Utc::now().to_rfc3339(),
            level: record.level().to_string(),
            message: format!("{}", record.args()),
            correlation_id,
            name: record.target().to_string(),
            module_path: record.module_path().map(|s| s.to_string()),
            file: record.file().map(|s| s.to_string()),
            line: record.line(),
            extra: extra_fields,
        };

        println!(
            "{}",
            serde_json::to_string(&log_record).expect("failed to serialize log record to JSON")
        );
    }

    fn flush(&self) {}
}

static LOGGER: JsonLogger = JsonLogger;
static INIT_LOGGER_ONCE: OnceCell<()> = OnceCell::new();

/// Initializes the JSON logger. Safe to call more than once; only the first
/// call takes effect.
pub fn init_logger() -> Result<(), SetLoggerError> {
    INIT_LOGGER_ONCE
        .get_or_try_init(|| {
            log::set_logger(&LOGGER)?;
            log::set_max_level(log::LevelFilter::Info);
            Ok(())
        })
        .map(|_| ())
}

// --- Domain-specific structured log helpers ---

/// Logs one optimization cycle's outcome.
pub fn log_cycle_event(cycle_id: &str, event_type: &str, details: &serde_json::Value) {
    let details_str = details.to_string();
    log::info!(
        target: "optimization_loop",
        cycle_id = cycle_id,
        event_type = event_type,
        details = details_str.as_str();
        "Optimization Cycle Event"
    );
}

/// Logs an ingestion pipeline outcome for one raw lead.
pub fn log_ingestion_event(source: &str, event_type: &str, details: &serde_json::Value) {
    let details_str = details.to_string();
    log::info!(
        target: "ingestion_pipeline",
        source = source,
        event_type = event_type,
        details = details_str.as_str();
        "Ingestion Event"
    );
}

/// Logs an alert raised by the error monitor.
pub fn log_alert_event(alert_kind: &str, severity: &str, details: &serde_json::Value) {
    let details_str = details.to_string();
    log::warn!(
        target: "error_monitor",
        alert_kind = alert_kind,
        severity = severity,
        details = details_str.as_str();
        "Alert Raised"
    );
}
