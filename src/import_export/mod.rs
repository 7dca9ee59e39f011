use std::path::{Path, PathBuf};

use rocksdb::SstFileWriter;
use tracing::{debug, info};

use crate::{
    db::{DatabaseHandle, LedgerToken, ResourceKind},
    util::{Result, Slice, Status},
};

/// Options for ingesting external SST files
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Move files instead of copying them
    pub move_files: bool,
}

impl IngestOptions {
    pub(crate) fn to_engine(&self) -> rocksdb::IngestExternalFileOptions {
        let mut opts = rocksdb::IngestExternalFileOptions::default();
        opts.set_move_files(self.move_files);
        opts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Open,
    Failed,
    Finished,
}

/// Writes a sorted SST file for one column family
///
/// The writer reuses the column family's live engine options, so the file
/// is ordered by the same comparator and carries the same comparator name as
/// the column family it will be ingested into.
///
/// Keys must be put in strictly increasing order. A rejected `put` leaves a
/// partial file behind: the writer refuses every later call, including
/// [`finish`](Self::finish), and the file should be discarded.
///
/// ```no_run
/// use kvbridge::{DatabaseHandle, DbOptions};
///
/// # fn main() -> kvbridge::Result<()> {
/// let db = DatabaseHandle::open_default(&DbOptions::new("/tmp/kvbridge-bulk"))?;
/// let path = std::path::Path::new("/tmp/kvbridge-bulk.sst");
/// let mut writer = db.bulk_load_writer(path, 0)?;
/// writer.put("a".into(), "1".into())?;
/// writer.put("b".into(), "2".into())?;
/// writer.finish()?;
/// drop(writer);
/// db.ingest(path, 0)?;
/// # Ok(())
/// # }
/// ```
pub struct BulkLoadWriter<'db> {
    inner: SstFileWriter<'db>,
    path: PathBuf,
    cf_index: usize,
    entries: u64,
    state: WriterState,
    _token: LedgerToken<'db>,
}

impl<'db> BulkLoadWriter<'db> {
    pub(crate) fn open(db: &'db DatabaseHandle, path: &Path, cf_index: usize) -> Result<Self> {
        db.cf(cf_index)?;
        let options = db.column_families().options(cf_index)?;
        let inner = SstFileWriter::create(options);
        inner.open(path)?;

        debug!(path = %path.display(), cf_index, "bulk-load writer opened");
        Ok(BulkLoadWriter {
            inner,
            path: path.to_path_buf(),
            cf_index,
            entries: 0,
            state: WriterState::Open,
            _token: db.ledger().acquire(ResourceKind::BulkLoadWriter),
        })
    }

    fn check_open(&self) -> Result<()> {
        match self.state {
            WriterState::Open => Ok(()),
            WriterState::Failed => Err(Status::invalid_argument(format!(
                "bulk-load writer for {} failed earlier, discard the file",
                self.path.display()
            ))),
            WriterState::Finished => Err(Status::invalid_argument(format!(
                "bulk-load writer for {} is already finished",
                self.path.display()
            ))),
        }
    }

    /// Append one entry. `key` must sort after every key put before it.
    pub fn put(&mut self, key: Slice<'_>, value: Slice<'_>) -> Result<()> {
        self.check_open()?;
        if let Err(e) = self.inner.put(key, value) {
            self.state = WriterState::Failed;
            return Err(e.into());
        }
        self.entries += 1;
        Ok(())
    }

    /// Flush and close the file. Must be called exactly once before the
    /// file is ingested.
    pub fn finish(&mut self) -> Result<()> {
        self.check_open()?;
        if self.entries == 0 {
            self.state = WriterState::Failed;
            return Err(Status::invalid_argument(
                "cannot finish a bulk-load file with no entries",
            ));
        }
        if let Err(e) = self.inner.finish() {
            self.state = WriterState::Failed;
            return Err(e.into());
        }
        self.state = WriterState::Finished;
        info!(
            path = %self.path.display(),
            entries = self.entries,
            bytes = self.inner.file_size(),
            "bulk-load file finished"
        );
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cf_index(&self) -> usize {
        self.cf_index
    }

    pub fn entries(&self) -> u64 {
        self.entries
    }

    pub fn file_size(&self) -> u64 {
        self.inner.file_size()
    }

    pub fn is_finished(&self) -> bool {
        self.state == WriterState::Finished
    }
}
