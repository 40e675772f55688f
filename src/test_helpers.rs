//! Shared test utilities for the tagver test suite.
//!
//! Provides a throwaway project directory and a scripted [`Describe`] so
//! resolver tests never depend on a real git binary or repository.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let project = Project::new().with_git();
//! project.write_cache("__version__ = \"2.0.0\"\n");
//!
//! let describer = ScriptedDescribe::found("v2.0.0-3-gdeadbee");
//! let calls = describer.calls();
//! ```

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;
use tempfile::TempDir;

use crate::cache::DEFAULT_CACHE_FILE;
use crate::describe::{Describe, DescribeOutcome, Unavailable};

// =========================================================================
// Project fixture
// =========================================================================

/// A temporary project root.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Add an (empty) `.git` directory so the resolver probes source control.
    pub fn with_git(self) -> Self {
        std::fs::create_dir(self.dir.path().join(".git")).unwrap();
        self
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write raw content to the default cache file.
    pub fn write_cache(&self, content: &str) {
        std::fs::write(self.root().join(DEFAULT_CACHE_FILE), content).unwrap();
    }

    /// Current content of the default cache file, if it exists.
    pub fn cache_contents(&self) -> Option<String> {
        std::fs::read_to_string(self.root().join(DEFAULT_CACHE_FILE)).ok()
    }
}

// =========================================================================
// Scripted describe
// =========================================================================

/// A [`Describe`] that returns a fixed outcome and counts its calls.
pub struct ScriptedDescribe {
    outcome: DescribeOutcome,
    calls: Rc<Cell<usize>>,
}

impl ScriptedDescribe {
    pub fn found(descriptor: &str) -> Self {
        Self::with_outcome(DescribeOutcome::Found(descriptor.to_string()))
    }

    pub fn unavailable(reason: Unavailable) -> Self {
        Self::with_outcome(DescribeOutcome::Unavailable(reason))
    }

    /// Shorthand for a missing git binary.
    pub fn none() -> Self {
        Self::unavailable(Unavailable::ToolNotFound {
            program: "git".into(),
        })
    }

    fn with_outcome(outcome: DescribeOutcome) -> Self {
        Self {
            outcome,
            calls: Rc::new(Cell::new(0)),
        }
    }

    /// Handle on the call counter, usable after the describer is moved.
    pub fn calls(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.calls)
    }
}

impl Describe for ScriptedDescribe {
    fn describe(&self, _root: &Path) -> DescribeOutcome {
        self.calls.set(self.calls.get() + 1);
        self.outcome.clone()
    }
}
