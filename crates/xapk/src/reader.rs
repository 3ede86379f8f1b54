//! Request facade.
//!
//! [`XapkReader`] owns the configuration, the [`ArchiveIndex`] and a fixed
//! pool of worker threads. Every request is handled start to finish by one
//! worker and produces exactly one outcome, delivered through a
//! [`PendingRead`] or a callback.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use xapk_obb::{ExpansionDir, ExpansionKind};

use crate::content;
use crate::encode::{encode, Representation, RepresentationMode};
use crate::index::ArchiveIndex;
use crate::resolve::resolve;
use crate::sniff::{sniff, SNIFF_LEN};
use crate::{Error, ExpansionVersion, ReaderConfig, Result};

/// One lookup, fully described.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub filename: String,
    pub version: ExpansionVersion,
    /// Namespace lookups under the main file's name rather than the patch's.
    pub main_file: bool,
    pub mode: RepresentationMode,
}

impl LookupRequest {
    /// Request for `filename` using the versions and namespace of `config`.
    pub fn new(config: &ReaderConfig, filename: impl Into<String>, mode: RepresentationMode) -> Self {
        Self {
            filename: filename.into(),
            version: config.version(),
            main_file: config.main_file,
            mode,
        }
    }
}

/// Run the whole pipeline for one request on the calling thread:
/// open, resolve, read, sniff, encode.
pub fn lookup(index: &ArchiveIndex, request: &LookupRequest) -> Result<Representation> {
    let handle = index.open(request.version)?;

    let kind = if request.main_file {
        ExpansionKind::Main
    } else {
        ExpansionKind::Patch
    };
    let base = index.container_name(kind, request.version);

    let locator = resolve(&handle, &base, &request.filename)?;
    let payload = content::read(&locator)?;

    let mime = match request.mode {
        RepresentationMode::DataUri => {
            let header = &payload.bytes()[..payload.bytes().len().min(SNIFF_LEN)];
            sniff(header, payload.name())
        }
        _ => String::new(),
    };

    encode(payload.into_bytes(), &mime, request.mode)
}

type Callback = Box<dyn FnOnce(Result<Representation>) + Send + 'static>;

enum Reply {
    Channel(Sender<Result<Representation>>),
    Callback(Callback),
}

impl Reply {
    fn deliver(self, result: Result<Representation>) {
        match self {
            // The caller may have dropped its PendingRead.
            Self::Channel(tx) => {
                let _ = tx.send(result);
            }
            // A panicking callback must not take its worker down with it.
            Self::Callback(callback) => {
                if panic::catch_unwind(AssertUnwindSafe(|| callback(result))).is_err() {
                    tracing::error!("request callback panicked");
                }
            }
        }
    }
}

struct Job {
    request: LookupRequest,
    reply: Reply,
}

struct Shared {
    config: ReaderConfig,
    index: ArchiveIndex,
}

impl Shared {
    fn run(&self, request: &LookupRequest) -> Result<Representation> {
        let span = tracing::debug_span!(
            "lookup",
            filename = %request.filename,
            mode = %request.mode,
        );
        let _enter = span.enter();

        let result = lookup(&self.index, request);
        match &result {
            Ok(representation) => tracing::debug!(bytes = representation.len(), "entry read"),
            Err(e) => tracing::error!(error = %e, "lookup failed"),
        }
        result
    }
}

/// Reads files out of an application's expansion files.
///
/// # Example
///
/// ```no_run
/// use xapk::{ReaderConfig, Representation, XapkReader};
///
/// let config = ReaderConfig::new("/sdcard/Android/obb/com.example.game", "com.example.game", 3);
/// let reader = XapkReader::new(config)?;
///
/// match reader.get("level1.json").wait()? {
///     Representation::RawBuffer(bytes) => println!("{} bytes", bytes.len()),
///     other => println!("{:?}", other.mode()),
/// }
/// # Ok::<(), xapk::Error>(())
/// ```
pub struct XapkReader {
    shared: Arc<Shared>,
    jobs: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl XapkReader {
    /// Validate `config` and start its worker pool.
    pub fn new(config: ReaderConfig) -> Result<Self> {
        config.validate()?;

        let index = ArchiveIndex::new(ExpansionDir::new(
            config.expansion_dir.clone(),
            config.package_id.clone(),
        ));
        let worker_count = config.workers;
        let shared = Arc::new(Shared { config, index });

        let (tx, rx) = crossbeam_channel::unbounded::<Job>();
        let mut workers = Vec::with_capacity(worker_count);
        for i in 0..worker_count {
            let shared = Arc::clone(&shared);
            let rx = rx.clone();
            let handle = std::thread::Builder::new()
                .name(format!("xapk-worker-{}", i))
                .spawn(move || worker_loop(&shared, &rx))?;
            workers.push(handle);
        }

        tracing::debug!(
            workers = worker_count,
            dir = %shared.config.expansion_dir.display(),
            package = %shared.config.package_id,
            "reader started"
        );

        Ok(Self {
            shared,
            jobs: Some(tx),
            workers,
        })
    }

    #[inline]
    pub fn config(&self) -> &ReaderConfig {
        &self.shared.config
    }

    #[inline]
    pub fn index(&self) -> &ArchiveIndex {
        &self.shared.index
    }

    /// Read `filename` in the configured result mode.
    pub fn get(&self, filename: &str) -> PendingRead {
        self.get_as(filename, self.shared.config.result_mode)
    }

    /// Read `filename` in a specific mode.
    pub fn get_as(&self, filename: &str, mode: RepresentationMode) -> PendingRead {
        self.submit(LookupRequest::new(&self.shared.config, filename, mode))
    }

    /// Queue a fully specified request.
    pub fn submit(&self, request: LookupRequest) -> PendingRead {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let filename = request.filename.clone();
        self.dispatch(Job {
            request,
            reply: Reply::Channel(tx),
        });
        PendingRead { filename, rx }
    }

    /// Queue a request whose outcome is handed to `callback` on the worker
    /// thread. A panic inside `callback` is caught and logged; the worker
    /// keeps serving the queue.
    pub fn get_with<F>(&self, filename: &str, callback: F)
    where
        F: FnOnce(Result<Representation>) + Send + 'static,
    {
        let request = LookupRequest::new(&self.shared.config, filename, self.shared.config.result_mode);
        self.dispatch(Job {
            request,
            reply: Reply::Callback(Box::new(callback)),
        });
    }

    /// Run a request on the calling thread, bypassing the pool.
    pub fn read_blocking(&self, filename: &str, mode: RepresentationMode) -> Result<Representation> {
        self.shared
            .run(&LookupRequest::new(&self.shared.config, filename, mode))
    }

    fn dispatch(&self, job: Job) {
        let Some(jobs) = &self.jobs else {
            job.reply.deliver(Err(Error::Closed));
            return;
        };
        if let Err(crossbeam_channel::SendError(job)) = jobs.send(job) {
            job.reply.deliver(Err(Error::Closed));
        }
    }

    /// Finish queued requests and stop the workers.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        // Workers drain the queue before they see the disconnect.
        self.jobs.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::error!("worker thread panicked");
            }
        }
    }
}

impl Drop for XapkReader {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for XapkReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XapkReader")
            .field("config", &self.shared.config)
            .field("workers", &self.workers.len())
            .finish()
    }
}

fn worker_loop(shared: &Shared, jobs: &Receiver<Job>) {
    for job in jobs.iter() {
        let result = shared.run(&job.request);
        job.reply.deliver(result);
    }
}

/// Outcome of a queued request.
#[derive(Debug)]
pub struct PendingRead {
    filename: String,
    rx: Receiver<Result<Representation>>,
}

impl PendingRead {
    /// The requested file name.
    #[inline]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Block until the request completes.
    pub fn wait(self) -> Result<Representation> {
        self.rx.recv().unwrap_or(Err(Error::Closed))
    }

    /// Block for at most `timeout`. On timeout the request keeps running and
    /// the pending handle is returned.
    pub fn wait_timeout(self, timeout: Duration) -> std::result::Result<Result<Representation>, Self> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Ok(result),
            Err(RecvTimeoutError::Disconnected) => Ok(Err(Error::Closed)),
            Err(RecvTimeoutError::Timeout) => Err(self),
        }
    }

    /// Channel the outcome arrives on, for use with `crossbeam_channel::select!`.
    pub fn into_receiver(self) -> Receiver<Result<Representation>> {
        self.rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{write_expansion, PACKAGE};
    use base64::Engine as _;

    fn config(root: &std::path::Path) -> ReaderConfig {
        let mut config = ReaderConfig::new(root, PACKAGE, 3);
        config.workers = 2;
        config
    }

    #[test]
    fn test_versioned_subdirectory_wins() {
        let tmp = tempfile::tempdir().unwrap();
        write_expansion(
            tmp.path(),
            ExpansionKind::Main,
            3,
            &[
                ("main.3.com.example.game/level1.json", b"{\"a\":1}"),
                ("level1.json", b"{\"a\":2}"),
            ],
        );

        let reader = XapkReader::new(config(tmp.path())).unwrap();
        let out = reader.get_as("level1.json", RepresentationMode::Text).wait().unwrap();
        assert_eq!(out, Representation::Text("{\"a\":1}".to_string()));
    }

    #[test]
    fn test_default_mode_is_raw_buffer() {
        let tmp = tempfile::tempdir().unwrap();
        write_expansion(tmp.path(), ExpansionKind::Main, 3, &[("blob.bin", b"\x00\x01\x02")]);

        let reader = XapkReader::new(config(tmp.path())).unwrap();
        let out = reader.get("blob.bin").wait().unwrap();
        assert_eq!(out, Representation::RawBuffer(vec![0, 1, 2]));
    }

    #[test]
    fn test_missing_file_reports_name() {
        let tmp = tempfile::tempdir().unwrap();
        write_expansion(tmp.path(), ExpansionKind::Main, 3, &[("a.txt", b"a")]);

        let reader = XapkReader::new(config(tmp.path())).unwrap();
        let pending = reader.get("missing.png");
        assert_eq!(pending.filename(), "missing.png");

        let err = pending.wait().unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
        assert!(err.to_string().contains("missing.png"));
    }

    #[test]
    fn test_archive_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let reader = XapkReader::new(config(tmp.path())).unwrap();
        assert!(matches!(
            reader.get("a.txt").wait(),
            Err(Error::ArchiveNotFound { .. })
        ));
    }

    #[test]
    fn test_data_uri_uses_sniffed_type() {
        let tmp = tempfile::tempdir().unwrap();
        let png = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\x00\x00";
        write_expansion(tmp.path(), ExpansionKind::Main, 3, &[("logo.dat", png)]);

        let reader = XapkReader::new(config(tmp.path())).unwrap();
        let out = reader
            .read_blocking("logo.dat", RepresentationMode::DataUri)
            .unwrap();

        let Representation::DataUri(uri) = out else {
            panic!("expected data uri");
        };
        let payload = uri.strip_prefix("data:image/png;base64,").unwrap();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .unwrap();
        assert_eq!(decoded, png);
    }

    #[test]
    fn test_patch_namespace() {
        let tmp = tempfile::tempdir().unwrap();
        write_expansion(
            tmp.path(),
            ExpansionKind::Patch,
            4,
            &[("patch.4.com.example.game/cfg.txt", b"patched")],
        );

        let mut config = config(tmp.path());
        config.main_file = false;
        config.patch_version_code = Some(4);

        let reader = XapkReader::new(config).unwrap();
        let out = reader.read_blocking("cfg.txt", RepresentationMode::Text).unwrap();
        assert_eq!(out, Representation::Text("patched".to_string()));
    }

    #[test]
    fn test_callback_receives_one_outcome() {
        let tmp = tempfile::tempdir().unwrap();
        write_expansion(tmp.path(), ExpansionKind::Main, 3, &[("a.txt", b"a")]);

        let reader = XapkReader::new(config(tmp.path())).unwrap();
        let (tx, rx) = crossbeam_channel::unbounded();
        reader.get_with("a.txt", move |result| tx.send(result).unwrap());
        reader.shutdown();

        let outcomes: Vec<_> = rx.iter().collect();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].as_ref().unwrap(), &Representation::RawBuffer(b"a".to_vec()));
    }

    #[test]
    fn test_panicking_callback_keeps_worker_alive() {
        let tmp = tempfile::tempdir().unwrap();
        write_expansion(tmp.path(), ExpansionKind::Main, 3, &[("a.txt", b"a")]);

        let mut config = config(tmp.path());
        config.workers = 1;
        let reader = XapkReader::new(config).unwrap();

        reader.get_with("a.txt", |_| panic!("callback failure"));
        let outcome = reader
            .get("a.txt")
            .wait_timeout(Duration::from_secs(10))
            .expect("worker stopped serving the queue");
        assert_eq!(outcome.unwrap(), Representation::RawBuffer(b"a".to_vec()));
    }

    #[test]
    fn test_queued_requests_finish_on_shutdown() {
        let tmp = tempfile::tempdir().unwrap();
        write_expansion(tmp.path(), ExpansionKind::Main, 3, &[("a.txt", b"a")]);

        let reader = XapkReader::new(config(tmp.path())).unwrap();
        let pending: Vec<_> = (0..16).map(|_| reader.get("a.txt")).collect();
        drop(reader);

        for p in pending {
            assert!(p.wait().is_ok());
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ReaderConfig::new("/obb", PACKAGE, 3);
        config.workers = 0;
        assert!(matches!(XapkReader::new(config), Err(Error::Config(_))));
    }
}
