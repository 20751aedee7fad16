use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tokio::sync::{Mutex, broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::{
    core::serial::Clock,
    intake::{
        BatchReceipt, DEFAULT_MAX_SKIDS, IntakeError, IntakeRequest, ScanOutcome, handle_scan,
        run_intake,
    },
    persist::{PersistError, RecordStore},
    projection::{
        export::export_csv,
        labels::{Label, labels_for},
        summary::{DailySummary, daily_summary},
    },
    skid::{RecordFilter, SkidRecord},
    types::{SkidStatus, Sn, SortOrder},
    vendor::{Vendor, VendorDirectory},
};

use super::events::SkidEvent;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("store worker failed: {0}")]
    Worker(String),
    #[error("runtime channel closed")]
    ChannelClosed,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub command_queue_bound: usize,
    pub event_queue_bound: usize,
    /// Reject serial-shaped scans whose check digit does not validate.
    pub verify_scan_checksum: bool,
    pub max_skids_per_batch: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 256,
            event_queue_bound: 1024,
            verify_scan_checksum: false,
            max_skids_per_batch: DEFAULT_MAX_SKIDS,
        }
    }
}

#[derive(Clone)]
pub struct SkidLogHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<SkidEvent>,
    directory: Arc<VendorDirectory>,
    clock: Arc<dyn Clock>,
}

type Reply<T> = oneshot::Sender<Result<T, RuntimeError>>;
type SharedStore = Arc<Mutex<Box<dyn RecordStore>>>;

enum Command {
    Intake {
        req: IntakeRequest,
        resp: Reply<BatchReceipt>,
    },
    Scan {
        code: String,
        resp: Reply<ScanOutcome>,
    },
    MarkDone {
        serial_no: String,
        resp: Reply<bool>,
    },
    FindBySerial {
        serial_no: String,
        resp: Reply<Option<SkidRecord>>,
    },
    Query {
        filter: RecordFilter,
        order: SortOrder,
        resp: Reply<Vec<SkidRecord>>,
    },
    Count {
        filter: RecordFilter,
        status: Option<SkidStatus>,
        resp: Reply<u64>,
    },
    MaxSn {
        resp: Reply<Sn>,
    },
    Summary {
        date: NaiveDate,
        resp: Reply<DailySummary>,
    },
    Labels {
        date: NaiveDate,
        vendor_code: Option<String>,
        resp: Reply<Vec<Label>>,
    },
    ExportCsv {
        resp: Reply<String>,
    },
    Shutdown {
        resp: Reply<()>,
    },
}

/// Spawns the command loop that owns `store`.
///
/// Every command runs to completion before the next is taken, so a batch's
/// max-SN read and its insert are never interleaved with another write.
pub fn spawn_skidlog(
    store: Box<dyn RecordStore>,
    directory: VendorDirectory,
    clock: Arc<dyn Clock>,
    config: RuntimeConfig,
) -> SkidLogHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound);
    let (events_tx, _) = broadcast::channel::<SkidEvent>(config.event_queue_bound);
    let directory = Arc::new(directory);

    let ctx = LoopContext {
        store: Arc::new(Mutex::new(store)),
        directory: Arc::clone(&directory),
        clock: Arc::clone(&clock),
        events_tx: events_tx.clone(),
        config,
    };

    tokio::spawn(async move {
        while let Some(cmd) = cmd_rx.recv().await {
            if ctx.handle_command(cmd).await {
                break;
            }
        }
        debug!("skidlog command loop stopped");
    });

    SkidLogHandle {
        cmd_tx,
        events_tx,
        directory,
        clock,
    }
}

impl SkidLogHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<SkidEvent> {
        self.events_tx.subscribe()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn vendor(&self, vendor_code: &str) -> Option<Vendor> {
        self.directory.lookup(vendor_code).cloned()
    }

    pub async fn intake(&self, req: IntakeRequest) -> Result<BatchReceipt, RuntimeError> {
        self.call(|resp| Command::Intake { req, resp }).await
    }

    pub async fn scan(&self, code: impl Into<String>) -> Result<ScanOutcome, RuntimeError> {
        let code = code.into();
        self.call(|resp| Command::Scan { code, resp }).await
    }

    pub async fn mark_done(&self, serial_no: impl Into<String>) -> Result<bool, RuntimeError> {
        let serial_no = serial_no.into();
        self.call(|resp| Command::MarkDone { serial_no, resp }).await
    }

    pub async fn find_by_serial(
        &self,
        serial_no: impl Into<String>,
    ) -> Result<Option<SkidRecord>, RuntimeError> {
        let serial_no = serial_no.into();
        self.call(|resp| Command::FindBySerial { serial_no, resp })
            .await
    }

    pub async fn query(
        &self,
        filter: RecordFilter,
        order: SortOrder,
    ) -> Result<Vec<SkidRecord>, RuntimeError> {
        self.call(|resp| Command::Query {
            filter,
            order,
            resp,
        })
        .await
    }

    pub async fn count(
        &self,
        filter: RecordFilter,
        status: Option<SkidStatus>,
    ) -> Result<u64, RuntimeError> {
        self.call(|resp| Command::Count {
            filter,
            status,
            resp,
        })
        .await
    }

    pub async fn max_sn(&self) -> Result<Sn, RuntimeError> {
        self.call(|resp| Command::MaxSn { resp }).await
    }

    /// Summary for `date`, or for today when `None`.
    pub async fn daily_summary(&self, date: Option<NaiveDate>) -> Result<DailySummary, RuntimeError> {
        let date = date.unwrap_or_else(|| self.today());
        self.call(|resp| Command::Summary { date, resp }).await
    }

    /// Today's labels, optionally for one vendor.
    pub async fn labels(&self, vendor_code: Option<String>) -> Result<Vec<Label>, RuntimeError> {
        let date = self.today();
        self.call(|resp| Command::Labels {
            date,
            vendor_code,
            resp,
        })
        .await
    }

    pub async fn export_csv(&self) -> Result<String, RuntimeError> {
        self.call(|resp| Command::ExportCsv { resp }).await
    }

    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.call(|resp| Command::Shutdown { resp }).await
    }

    async fn call<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }
}

struct LoopContext {
    store: SharedStore,
    directory: Arc<VendorDirectory>,
    clock: Arc<dyn Clock>,
    events_tx: broadcast::Sender<SkidEvent>,
    config: RuntimeConfig,
}

impl LoopContext {
    /// Returns true once the loop should stop.
    async fn handle_command(&self, cmd: Command) -> bool {
        match cmd {
            Command::Intake { req, resp } => {
                let directory = Arc::clone(&self.directory);
                let date = self.clock.today();
                let max = self.config.max_skids_per_batch;
                let res = self
                    .with_store(move |store| Ok(run_intake(store, &directory, date, &req, max)?))
                    .await;
                match &res {
                    Ok(receipt) => {
                        if let (Some(first), Some(rec)) = (receipt.first_sn(), receipt.records.last()) {
                            let _ = self.events_tx.send(SkidEvent::BatchCommitted {
                                vendor_code: rec.vendor_code.clone(),
                                invoice_no: rec.invoice_no.clone(),
                                first_sn: first,
                                last_sn: rec.sn,
                            });
                        }
                    }
                    Err(err) => warn!(error = %err, "intake failed"),
                }
                let _ = resp.send(res);
            }
            Command::Scan { code, resp } => {
                let directory = Arc::clone(&self.directory);
                let verify = self.config.verify_scan_checksum;
                let res = self
                    .with_store(move |store| Ok(handle_scan(store, &directory, &code, verify)?))
                    .await;
                if let Ok(ScanOutcome::Completed { record }) = &res {
                    let _ = self.events_tx.send(SkidEvent::SkidCompleted {
                        sn: record.sn,
                        serial_no: record.serial_no.clone(),
                    });
                }
                let _ = resp.send(res);
            }
            Command::MarkDone { serial_no, resp } => {
                let serial = serial_no.clone();
                let res = self
                    .with_store(move |store| {
                        if !store.set_status_done(&serial)? {
                            return Ok(None);
                        }
                        Ok(store.find_by_serial(&serial)?)
                    })
                    .await;
                let res = res.map(|changed| {
                    if let Some(rec) = &changed {
                        info!(serial_no = %rec.serial_no, sn = rec.sn, "skid marked done");
                        let _ = self.events_tx.send(SkidEvent::SkidCompleted {
                            sn: rec.sn,
                            serial_no: serial_no.clone(),
                        });
                    }
                    changed.is_some()
                });
                let _ = resp.send(res);
            }
            Command::FindBySerial { serial_no, resp } => {
                let res = self
                    .with_store(move |store| Ok(store.find_by_serial(&serial_no)?))
                    .await;
                let _ = resp.send(res);
            }
            Command::Query {
                filter,
                order,
                resp,
            } => {
                let res = self
                    .with_store(move |store| Ok(store.query(&filter, order)?))
                    .await;
                let _ = resp.send(res);
            }
            Command::Count {
                filter,
                status,
                resp,
            } => {
                let res = self
                    .with_store(move |store| Ok(store.count(&filter, status)?))
                    .await;
                let _ = resp.send(res);
            }
            Command::MaxSn { resp } => {
                let res = self.with_store(|store| Ok(store.max_sn()?)).await;
                let _ = resp.send(res);
            }
            Command::Summary { date, resp } => {
                let res = self
                    .with_store(move |store| Ok(daily_summary(store, date)?))
                    .await;
                let _ = resp.send(res);
            }
            Command::Labels {
                date,
                vendor_code,
                resp,
            } => {
                let res = self
                    .with_store(move |store| Ok(labels_for(store, date, vendor_code.as_deref())?))
                    .await;
                let _ = resp.send(res);
            }
            Command::ExportCsv { resp } => {
                let res = self.with_store(|store| Ok(export_csv(store)?)).await;
                let _ = resp.send(res);
            }
            Command::Shutdown { resp } => {
                let res = self.with_store(|store| Ok(store.flush()?)).await;
                let _ = resp.send(res);
                return true;
            }
        }

        false
    }

    async fn with_store<T, F>(&self, f: F) -> Result<T, RuntimeError>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn RecordStore) -> Result<T, RuntimeError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            let mut guard = store.blocking_lock();
            f(&mut **guard)
        })
        .await
        .map_err(|e| RuntimeError::Worker(format!("join error: {e}")))?
    }
}
