//! Mirror a freshly exported tree onto a live working tree
//!
//! Split into a listing step, a pure planning step over two listings and an
//! apply step, so the decision of what to delete and copy can be tested
//! without touching a filesystem.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::GIT_DIR;
use crate::Result;

/// What sits at a relative path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Dir,
    /// Regular file with a content digest, comparable within one process
    File { digest: u64 },
}

/// Relative path → kind, excluding version-control metadata
pub type Listing = BTreeMap<PathBuf, EntryKind>;

/// Operations that turn the destination into an image of the source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorPlan {
    /// Destination entries absent from (or of another kind in) the source;
    /// only the topmost path of a removed subtree is listed
    pub to_delete: Vec<PathBuf>,
    /// Source directories missing from the destination
    pub to_create: Vec<PathBuf>,
    /// Source files missing from the destination or with other content
    pub to_copy: Vec<PathBuf>,
}

impl MirrorPlan {
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_create.is_empty() && self.to_copy.is_empty()
    }
}

/// List a tree recursively, skipping `.git`
pub fn list_tree(root: &Path) -> Result<Listing> {
    let mut listing = Listing::new();
    if root.exists() {
        list_into(root, Path::new(""), &mut listing)?;
    }
    Ok(listing)
}

fn list_into(root: &Path, rel: &Path, listing: &mut Listing) -> Result<()> {
    for entry in fs::read_dir(root.join(rel))? {
        let entry = entry?;
        let name = entry.file_name();
        if name == GIT_DIR {
            continue;
        }

        let path = rel.join(&name);
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            listing.insert(path.clone(), EntryKind::Dir);
            list_into(root, &path, listing)?;
        } else {
            let bytes = fs::read(entry.path())?;
            let mut hasher = DefaultHasher::new();
            bytes.hash(&mut hasher);
            listing.insert(
                path,
                EntryKind::File {
                    digest: hasher.finish(),
                },
            );
        }
    }
    Ok(())
}

/// Compute the delete/create/copy plan that mirrors `source` onto `dest`
pub fn plan_mirror(source: &Listing, dest: &Listing) -> MirrorPlan {
    let mut plan = MirrorPlan::default();

    for (path, kind) in dest {
        let keep = match (kind, source.get(path)) {
            (EntryKind::Dir, Some(EntryKind::Dir)) => true,
            (EntryKind::File { .. }, Some(EntryKind::File { .. })) => true,
            _ => false,
        };
        if keep {
            continue;
        }
        // Already covered by a deleted ancestor
        if plan.to_delete.iter().any(|d| path.starts_with(d)) {
            continue;
        }
        plan.to_delete.push(path.clone());
    }

    for (path, kind) in source {
        let current = if plan.to_delete.iter().any(|d| path.starts_with(d)) {
            None
        } else {
            dest.get(path)
        };

        match kind {
            EntryKind::Dir if current != Some(&EntryKind::Dir) => {
                plan.to_create.push(path.clone());
            }
            EntryKind::File { .. } if current != Some(kind) => {
                plan.to_copy.push(path.clone());
            }
            _ => {}
        }
    }

    plan
}

/// Execute a plan: deletions first, then directories, then file copies
pub fn apply_mirror(plan: &MirrorPlan, source_root: &Path, dest_root: &Path) -> Result<()> {
    for rel in &plan.to_delete {
        let target = dest_root.join(rel);
        let result = if target.is_dir() {
            fs::remove_dir_all(&target)
        } else {
            fs::remove_file(&target)
        };
        match result {
            Ok(()) => debug!(path = %rel.display(), "Removed stale entry"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }

    for rel in &plan.to_create {
        fs::create_dir_all(dest_root.join(rel))?;
    }

    for rel in &plan.to_copy {
        let target = dest_root.join(rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source_root.join(rel), &target)?;
    }

    Ok(())
}
