//! Reporter trait for dependency injection
//!
//! Workflows report progress and status through this trait so they are not
//! coupled to a terminal. The CLI provides a console implementation; tests
//! use [`NullReporter`].

use data_schema::BlobHash;

pub trait Reporter: Send + Sync {
    /// A path was added to the manifest (not hashed yet).
    fn added(&self, path: &str);

    /// A path was removed from the manifest.
    fn removed(&self, path: &str);

    /// A path was hashed and its hash recorded.
    fn hashed(&self, path: &str, hash: &BlobHash);

    /// A blob was uploaded or downloaded.
    fn transferred(&self, direction: Direction, path: &str, hash: &BlobHash);

    /// A blob transfer was skipped because the destination already has it.
    fn skipped(&self, direction: Direction, path: &str, hash: &BlobHash);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a success message.
    fn success(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Log an error message.
    fn error(&self, msg: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upload,
    Download,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Upload => "put",
            Self::Download => "get",
        })
    }
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn added(&self, path: &str) {
        (**self).added(path);
    }
    fn removed(&self, path: &str) {
        (**self).removed(path);
    }
    fn hashed(&self, path: &str, hash: &BlobHash) {
        (**self).hashed(path, hash);
    }
    fn transferred(&self, direction: Direction, path: &str, hash: &BlobHash) {
        (**self).transferred(direction, path, hash);
    }
    fn skipped(&self, direction: Direction, path: &str, hash: &BlobHash) {
        (**self).skipped(direction, path, hash);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn success(&self, msg: &str) {
        (**self).success(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn error(&self, msg: &str) {
        (**self).error(msg);
    }
}

/// A no-op reporter for silent operations (e.g., verification, testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn added(&self, _: &str) {}
    fn removed(&self, _: &str) {}
    fn hashed(&self, _: &str, _: &BlobHash) {}
    fn transferred(&self, _: Direction, _: &str, _: &BlobHash) {}
    fn skipped(&self, _: Direction, _: &str, _: &BlobHash) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn error(&self, _: &str) {}
}
