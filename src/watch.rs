//! File watching and coalesced rebuilds
//!
//! Filesystem events are debounced by `notify-debouncer-mini`, filtered,
//! and fed into a [`RebuildGate`]. Only one rebuild runs at a time; any
//! number of triggers arriving while it runs collapse into one follow-up.

use anyhow::Result;
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

use crate::content::{BuildFailure, CollectionHandle};
use crate::generator::Generator;
use crate::Blog;

/// Debounce window for filesystem events
pub const DEBOUNCE_MS: u64 = 500;

#[derive(Debug, Default)]
struct GateState {
    running: bool,
    pending: bool,
}

/// Serializes rebuilds and folds overlapping triggers together
#[derive(Debug, Default)]
pub struct RebuildGate {
    state: Mutex<GateState>,
}

impl RebuildGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a rebuild.
    ///
    /// Returns `true` if the caller now owns the rebuild and must run it,
    /// `false` if one is already running (it will run once more afterwards).
    pub fn request(&self) -> bool {
        let mut state = self.lock();
        if state.running {
            state.pending = true;
            false
        } else {
            state.running = true;
            true
        }
    }

    /// Called by the owner after each rebuild.
    ///
    /// Returns `true` if more triggers arrived meanwhile and the owner must
    /// rebuild again, `false` once the gate is released.
    pub fn finish(&self) -> bool {
        let mut state = self.lock();
        if state.pending {
            state.pending = false;
            true
        } else {
            state.running = false;
            false
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GateState> {
        // the state is two flags; a poisoned lock still holds a usable value
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Whether a change to `path` should trigger a rebuild.
///
/// Output, dot-directories below the site root (including the generator's
/// staging directories) and dependency folders never do.
pub fn is_relevant(path: &Path, base_dir: &Path, public_dir: &Path) -> bool {
    if path.starts_with(public_dir) || is_temp_file(path) {
        return false;
    }
    let relative = path.strip_prefix(base_dir).unwrap_or(path);
    !relative.components().any(|c| match c {
        Component::Normal(name) => {
            name == "node_modules" || name.to_str().is_some_and(|n| n.starts_with('.'))
        }
        _ => false,
    })
}

/// Editor swap/backup files and dot-files
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bak" | "backup" | "swp" | "swo" | "swx" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
        || name.starts_with('#')
}

/// Rebuilds the collection and publishes it
pub struct Rebuilder {
    base_dir: PathBuf,
    handle: &'static CollectionHandle,
    write_output: bool,
    reload_tx: Option<broadcast::Sender<()>>,
    gate: RebuildGate,
}

impl Rebuilder {
    /// `write_output` regenerates the public directory after each
    /// successful load; the dev server renders from the handle instead.
    pub fn new(blog: &Blog, handle: &'static CollectionHandle, write_output: bool) -> Self {
        Self {
            base_dir: blog.base_dir.clone(),
            handle,
            write_output,
            reload_tx: None,
            gate: RebuildGate::new(),
        }
    }

    /// Notify live-reload clients after each published rebuild
    pub fn with_reload(mut self, reload_tx: broadcast::Sender<()>) -> Self {
        self.reload_tx = Some(reload_tx);
        self
    }

    /// One full rebuild. On failure the previous collection stays published.
    pub fn rebuild(&self) -> Result<()> {
        let start = Instant::now();
        // re-read _config.yml as well, it is watched too
        let blog = Blog::new(&self.base_dir)?;
        let collection = blog.load_collection()?;

        if self.write_output {
            Generator::new(&blog)?.generate(&collection)?;
        }

        let count = collection.len();
        self.handle.publish(collection);
        tracing::info!(
            "Rebuilt {} articles in {:.2}s",
            count,
            start.elapsed().as_secs_f64()
        );

        if let Some(tx) = &self.reload_tx {
            // no subscribers is fine
            let _ = tx.send(());
        }
        Ok(())
    }

    /// Rebuild now, or fold into the running rebuild.
    ///
    /// Returns the rebuild thread when this call started one.
    pub fn trigger(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.gate.request() {
            tracing::debug!("Rebuild in progress, queued a follow-up");
            return None;
        }
        let this = Arc::clone(self);
        Some(std::thread::spawn(move || this.run_owned()))
    }

    /// Rebuild until no trigger is pending. The caller must own the gate.
    fn run_owned(&self) {
        loop {
            self.rebuild_logged();
            if !self.gate.finish() {
                break;
            }
        }
    }

    fn rebuild_logged(&self) {
        if let Err(e) = self.rebuild() {
            match e.downcast_ref::<BuildFailure>() {
                Some(failure) => {
                    tracing::error!("{}; keeping the previous version", failure)
                }
                None => tracing::error!("Rebuild failed: {:#}", e),
            }
        }
    }

    /// Watch the content directory and `_config.yml` until the channel closes.
    ///
    /// Blocks the calling thread.
    pub fn watch(self: Arc<Self>) -> Result<()> {
        let blog = Blog::new(&self.base_dir)?;
        let (tx, rx) = std::sync::mpsc::channel();

        let mut debouncer = new_debouncer(Duration::from_millis(DEBOUNCE_MS), tx)?;

        if blog.content_dir.exists() {
            debouncer
                .watcher()
                .watch(&blog.content_dir, RecursiveMode::Recursive)?;
            tracing::debug!("Watching: {:?}", blog.content_dir);
        }

        let config_path = blog.config_path();
        if config_path.exists() {
            debouncer
                .watcher()
                .watch(&config_path, RecursiveMode::NonRecursive)?;
            tracing::debug!("Watching: {:?}", config_path);
        }

        loop {
            match rx.recv() {
                Ok(Ok(events)) => {
                    let changed: Vec<_> = events
                        .iter()
                        .filter(|e| is_relevant(&e.path, &blog.base_dir, &blog.public_dir))
                        .collect();
                    if changed.is_empty() {
                        continue;
                    }
                    for event in &changed {
                        tracing::info!("Changed: {}", event.path.display());
                    }
                    // the rebuild runs on its own thread
                    let _ = self.trigger();
                }
                Ok(Err(e)) => {
                    tracing::error!("Watch error: {:?}", e);
                }
                Err(e) => {
                    tracing::error!("Channel error: {:?}", e);
                    break;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Collection;
    use std::fs;

    #[test]
    fn test_gate_coalesces() {
        let gate = RebuildGate::new();
        assert!(gate.request());

        // three triggers during the rebuild fold into one follow-up
        assert!(!gate.request());
        assert!(!gate.request());
        assert!(!gate.request());

        assert!(gate.finish());
        // still owned during the follow-up
        assert!(!gate.request());
        assert!(gate.finish());
        assert!(!gate.finish());

        assert!(gate.request());
    }

    #[test]
    fn test_gate_idle_finish() {
        let gate = RebuildGate::new();
        assert!(gate.request());
        assert!(!gate.finish());
        assert!(!gate.finish());
    }

    #[test]
    fn test_is_relevant() {
        let base = Path::new("/site");
        let public = Path::new("/site/public");
        let relevant = |p: &str| is_relevant(Path::new(p), base, public);
        assert!(relevant("/site/content/post.md"));
        assert!(relevant("/site/_config.yml"));
        assert!(!relevant("/site/public/index.html"));
        assert!(!relevant("/site/content/.post.md.swp"));
        assert!(!relevant("/site/content/post.md~"));
        assert!(!relevant("/site/content/post.tmp"));
        assert!(!relevant("/site/.git/HEAD"));
        assert!(!relevant("/site/.blogdex-a1b2/index.html"));
        assert!(!relevant("/site/content/.drafts/idea.md"));
        assert!(!relevant("/site/content/node_modules/x.md"));
        // dot-directories above the site root do not matter
        assert!(is_relevant(
            Path::new("/home/me/.sites/blog/content/post.md"),
            Path::new("/home/me/.sites/blog"),
            Path::new("/home/me/.sites/blog/public"),
        ));
    }

    fn leak(handle: CollectionHandle) -> &'static CollectionHandle {
        Box::leak(Box::new(handle))
    }

    #[test]
    fn test_rebuild_publishes_and_writes() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("content")).unwrap();
        fs::write(
            dir.path().join("content/hello.md"),
            "---\ntitle: Hello\npublished_at: 2021-02-01\n---\nHi\n",
        )
        .unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        let handle = leak(CollectionHandle::default());
        let (tx, mut rx) = broadcast::channel(4);
        let rebuilder = Rebuilder::new(&blog, handle, true).with_reload(tx);

        rebuilder.rebuild().unwrap();
        assert_eq!(handle.load().all()[0].slug, "hello");
        assert!(blog.public_dir.join("hello/index.html").exists());
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_triggers_during_rebuild_run_once_more() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("content")).unwrap();
        fs::write(
            dir.path().join("content/hello.md"),
            "---\ntitle: Hello\npublished_at: 2021-02-01\n---\nHi\n",
        )
        .unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        let handle = leak(CollectionHandle::default());
        let (tx, mut rx) = broadcast::channel(8);
        let rebuilder = Arc::new(Rebuilder::new(&blog, handle, false).with_reload(tx));

        // hold the gate as if a rebuild were already running
        assert!(rebuilder.gate.request());
        for _ in 0..3 {
            assert!(rebuilder.trigger().is_none());
        }
        fs::write(
            dir.path().join("content/second.md"),
            "---\ntitle: Second\npublished_at: 2021-02-02\n---\nMore\n",
        )
        .unwrap();

        // the running rebuild plus exactly one follow-up
        rebuilder.run_owned();
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
        assert_eq!(handle.load().len(), 2);

        // the gate is free again: the next trigger starts its own thread
        let thread = rebuilder.trigger().expect("gate should be idle");
        thread.join().unwrap();
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_failed_rebuild_keeps_previous() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("content")).unwrap();
        fs::write(
            dir.path().join("content/hello.md"),
            "---\ntitle: Hello\npublished_at: 2021-02-01\n---\nHi\n",
        )
        .unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        let handle = leak(CollectionHandle::new(Collection::default()));
        let rebuilder = Rebuilder::new(&blog, handle, false);
        rebuilder.rebuild().unwrap();
        assert_eq!(handle.load().len(), 1);

        fs::write(dir.path().join("content/broken.md"), "---\ntitle: x\n").unwrap();
        let err = rebuilder.rebuild().unwrap_err();
        assert!(err.downcast_ref::<BuildFailure>().is_some());
        assert_eq!(handle.load().len(), 1);
        assert!(!blog.public_dir.exists());
    }
}
