//! Raw notify events → add/change/unlink/addDir/unlinkDir.

use std::path::{Path, PathBuf};

use jwalk::WalkDir;
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use rustc_hash::FxHashSet;

use super::types::{EventKind, WatchRoot};
use crate::resolve::Layout;
use crate::utils::path::{is_temp_file, normalize_path};

/// Stateful mapper; remembers known directories and files because a removed
/// path can no longer be inspected.
///
/// notify reports a directory moved in or out as a single event, so the
/// files below it are expanded here: a new directory is walked, a removed
/// one unlinks every file previously seen under it.
pub(super) struct EventMapper {
    layout: Layout,
    pub(super) known_dirs: FxHashSet<PathBuf>,
    pub(super) known_files: FxHashSet<PathBuf>,
}

impl EventMapper {
    pub(super) fn new(layout: Layout) -> Self {
        let mut mapper = Self {
            layout,
            known_dirs: FxHashSet::default(),
            known_files: FxHashSet::default(),
        };
        for root in [WatchRoot::Scripts, WatchRoot::Styles, WatchRoot::Theme] {
            let dir = mapper.layout.root_path(root).to_path_buf();
            mapper.register_tree(&dir, 0, &mut Vec::new());
        }
        mapper
    }

    /// Record everything below `dir`. The startup seed (`min_depth == 0`)
    /// only records; a walk of a new directory also reports its files as `Add`.
    fn register_tree(&mut self, dir: &Path, min_depth: usize, out: &mut Vec<(PathBuf, EventKind)>) {
        let entries = WalkDir::new(dir)
            .min_depth(min_depth)
            .sort(true)
            .into_iter()
            .filter_map(Result::ok);
        for entry in entries {
            let path = entry.path();
            if entry.file_type().is_dir() {
                self.known_dirs.insert(path);
            } else if min_depth == 0 {
                self.known_files.insert(path);
            } else {
                self.created(&path, false, out);
            }
        }
    }

    pub(super) fn layout(&self) -> &Layout {
        &self.layout
    }

    pub(super) fn map(&mut self, event: &notify::Event) -> Vec<(PathBuf, EventKind)> {
        use notify::EventKind as Raw;

        crate::debug!("watch"; "raw notify: {:?} {:?}", event.kind, event.paths);

        let mut out = Vec::new();
        match event.kind {
            Raw::Create(kind) => {
                for path in &event.paths {
                    let is_dir = match kind {
                        CreateKind::Folder => true,
                        CreateKind::File => false,
                        _ => path.is_dir(),
                    };
                    self.created(path, is_dir, &mut out);
                }
            }
            Raw::Remove(kind) => {
                for path in &event.paths {
                    let is_dir = match kind {
                        RemoveKind::Folder => true,
                        RemoveKind::File => false,
                        _ => self.known_dirs.contains(&normalize_path(path)),
                    };
                    self.removed(path, is_dir, &mut out);
                }
            }
            Raw::Modify(ModifyKind::Metadata(_)) => {}
            Raw::Modify(ModifyKind::Name(mode)) => match (mode, event.paths.as_slice()) {
                (RenameMode::Both, [from, to]) => {
                    self.removed_any(from, &mut out);
                    self.created(to, to.is_dir(), &mut out);
                }
                (RenameMode::From, paths) => {
                    for path in paths {
                        self.removed_any(path, &mut out);
                    }
                }
                (_, paths) => {
                    for path in paths {
                        if path.exists() {
                            self.created(path, path.is_dir(), &mut out);
                        } else {
                            self.removed_any(path, &mut out);
                        }
                    }
                }
            },
            Raw::Modify(_) => {
                for path in &event.paths {
                    if !path.is_dir() {
                        self.known_files.insert(normalize_path(path));
                        self.push(path, EventKind::Change, &mut out);
                    }
                }
            }
            _ => {}
        }
        out
    }

    fn created(&mut self, path: &Path, is_dir: bool, out: &mut Vec<(PathBuf, EventKind)>) {
        let path = normalize_path(path);
        if is_dir {
            self.known_dirs.insert(path.clone());
            self.push(&path, EventKind::AddDir, out);
            self.register_tree(&path, 1, out);
        } else {
            self.known_files.insert(path.clone());
            self.push(&path, EventKind::Add, out);
        }
    }

    fn removed(&mut self, path: &Path, is_dir: bool, out: &mut Vec<(PathBuf, EventKind)>) {
        let path = normalize_path(path);
        if is_dir {
            self.known_dirs.retain(|dir| !dir.starts_with(&path));
            self.push(&path, EventKind::UnlinkDir, out);

            let mut files: Vec<_> = self
                .known_files
                .iter()
                .filter(|file| file.starts_with(&path))
                .cloned()
                .collect();
            files.sort();
            for file in files {
                self.known_files.remove(&file);
                self.push(&file, EventKind::Unlink, out);
            }
        } else {
            let known = self.known_files.remove(&path);
            // Already unlinked together with its removed parent directory.
            let orphan = path.parent().is_some_and(|dir| !self.known_dirs.contains(dir));
            if known || !orphan {
                self.push(&path, EventKind::Unlink, out);
            }
        }
    }

    fn removed_any(&mut self, path: &Path, out: &mut Vec<(PathBuf, EventKind)>) {
        let is_dir = self.known_dirs.contains(&normalize_path(path));
        self.removed(path, is_dir, out);
    }

    /// Normalize, tag-check and filter editor noise.
    fn push(&self, path: &Path, kind: EventKind, out: &mut Vec<(PathBuf, EventKind)>) {
        if is_temp_file(path) {
            return;
        }
        let path = normalize_path(path);
        let Some(root) = self.layout.root_of(&path) else {
            return;
        };
        // Hidden directories (.git, .cache, ...) below a root are never synced.
        if let Ok(rel) = path.strip_prefix(self.layout.root_path(root))
            && rel
                .components()
                .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
        {
            return;
        }
        out.push((path, kind));
    }
}
