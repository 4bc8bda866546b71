//! In-process transport driven by a per-job script of outcomes.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use bgu_core::control::AbortSignal;
use bgu_core::network::NetworkId;
use bgu_core::retry::TransferError;
use bgu_core::transport::{TransferRequest, TransferResponse, Transport};
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub enum Step {
    /// Report progress up to the full size, then answer with this status.
    Respond(u32),
    /// Fail with a generic transport error.
    FailTransport,
    /// Fail with a local I/O "not found" error.
    FailLocalIo,
    /// Fail with a DNS error.
    FailNameResolution,
    /// Report some progress, then block until aborted.
    HoldUntilAborted,
    /// Sleep, then answer 200.
    Slow(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub job_id: String,
    pub network: NetworkId,
}

pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<Vec<Call>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
    started: mpsc::UnboundedSender<String>,
}

impl ScriptedTransport {
    /// The receiver yields the job id of every attempt as it starts.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (started, rx) = mpsc::unbounded_channel();
        (
            Self {
                scripts: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
                started,
            },
            rx,
        )
    }

    /// Queue outcomes for `job_id`; once exhausted every attempt answers 200.
    pub fn script(&self, job_id: &str, steps: impl IntoIterator<Item = Step>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(job_id.to_string())
            .or_default()
            .extend(steps);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, job_id: &str) -> usize {
        self.calls().iter().filter(|c| c.job_id == job_id).count()
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn next_step(&self, job_id: &str) -> Step {
        self.scripts
            .lock()
            .unwrap()
            .get_mut(job_id)
            .and_then(|q| q.pop_front())
            .unwrap_or(Step::Respond(200))
    }

    fn run(
        &self,
        step: Step,
        on_progress: &mut dyn FnMut(u64),
        abort: &AbortSignal,
    ) -> Result<TransferResponse, TransferError> {
        let ok = |status| TransferResponse {
            status,
            headers: HashMap::from([("X-Scripted".to_string(), "yes".to_string())]),
            body: "done".to_string(),
        };
        match step {
            Step::Respond(status) => {
                for sent in [0, 250, 500, 750, 1000] {
                    on_progress(sent);
                    std::thread::sleep(Duration::from_millis(6));
                }
                Ok(ok(status))
            }
            Step::FailTransport => Err(TransferError::Transport("connection reset".into())),
            Step::FailLocalIo => Err(TransferError::LocalIo(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "source file missing",
            ))),
            Step::FailNameResolution => Err(TransferError::NameResolution("upload.invalid".into())),
            Step::HoldUntilAborted => {
                on_progress(100);
                while !abort.is_aborted() {
                    std::thread::sleep(Duration::from_millis(2));
                }
                Err(TransferError::Aborted)
            }
            Step::Slow(d) => {
                std::thread::sleep(d);
                Ok(ok(200))
            }
        }
    }
}

impl Transport for ScriptedTransport {
    fn send(
        &self,
        request: &TransferRequest,
        on_progress: &mut dyn FnMut(u64),
        abort: &AbortSignal,
    ) -> Result<TransferResponse, TransferError> {
        let job_id = request.job.id.clone();
        self.calls.lock().unwrap().push(Call {
            job_id: job_id.clone(),
            network: request.network.id,
        });
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        let _ = self.started.send(job_id.clone());

        let step = self.next_step(&job_id);
        let result = self.run(step, on_progress, abort);
        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
