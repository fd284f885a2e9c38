//! Parallel loading of a batch of documents.
//!
//! Each file is loaded by its own task on a bounded rayon pool and the result
//! comes back over a channel tagged with the file's position. Tasks share
//! nothing but the stop flag: once a load fails under stop-on-error, tasks
//! that have not started yet skip their file, while running loads finish.

use crate::document::Document;
use crate::error::{DocManagerError, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(Document),
    Failed(DocManagerError),
    /// Not attempted because an earlier failure stopped the batch.
    Skipped,
}

#[derive(Debug)]
pub struct LoadedFile {
    pub file: PathBuf,
    pub outcome: LoadOutcome,
}

impl LoadedFile {
    pub fn document(&self) -> Option<&Document> {
        match &self.outcome {
            LoadOutcome::Loaded(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&DocManagerError> {
        match &self.outcome {
            LoadOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Load results in input order.
#[derive(Debug, Default)]
pub struct Batch {
    pub files: Vec<LoadedFile>,
}

impl Batch {
    pub fn valid_count(&self) -> usize {
        self.files.iter().filter(|f| f.document().is_some()).count()
    }

    pub fn invalid_count(&self) -> usize {
        self.files.len() - self.valid_count()
    }

    /// The failure of the earliest file in input order.
    pub fn first_error(&self) -> Option<(&Path, &DocManagerError)> {
        self.files
            .iter()
            .find_map(|f| f.error().map(|err| (f.file.as_path(), err)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut LoadedFile> {
        self.files.iter_mut()
    }
}

/// Loads `files` on a pool of `jobs` threads.
pub fn load_all(files: &[PathBuf], jobs: usize, stop_on_error: bool) -> Result<Batch> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .build()
        .map_err(|e| DocManagerError::Internal(format!("cannot start worker pool: {}", e)))?;

    let stop = AtomicBool::new(false);
    let (tx, rx) = mpsc::channel::<(usize, LoadOutcome)>();

    pool.scope_fifo(|scope| {
        for (index, file) in files.iter().enumerate() {
            let tx = tx.clone();
            let stop = &stop;
            scope.spawn_fifo(move |_| {
                let outcome = if stop.load(Ordering::SeqCst) {
                    LoadOutcome::Skipped
                } else {
                    match Document::load(file) {
                        Ok(doc) => LoadOutcome::Loaded(doc),
                        Err(err) => {
                            warn!(file = %file.display(), error = %err, "could not load document");
                            if stop_on_error {
                                stop.store(true, Ordering::SeqCst);
                            }
                            LoadOutcome::Failed(err)
                        }
                    }
                };
                // The receiver outlives the scope, so sending cannot fail.
                let _ = tx.send((index, outcome));
            });
        }
    });
    drop(tx);

    let mut slots: Vec<Option<LoadOutcome>> = files.iter().map(|_| None).collect();
    for (index, outcome) in rx {
        slots[index] = Some(outcome);
    }

    let batch = Batch {
        files: files
            .iter()
            .zip(slots)
            .map(|(file, outcome)| LoadedFile {
                file: file.clone(),
                outcome: outcome.unwrap_or(LoadOutcome::Skipped),
            })
            .collect(),
    };
    debug!(
        files = files.len(),
        valid = batch.valid_count(),
        jobs,
        "loaded batch"
    );
    Ok(batch)
}
