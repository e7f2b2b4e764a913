use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::files::{is_image_file, list_dir};
use crate::view::ViewState;

/// One subdirectory of the base directory, viewed as a bucket of images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub images: Vec<PathBuf>,
}

pub struct Categories {
    base_dir: PathBuf,
    categories: Vec<Category>,
}

impl Categories {
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            categories: Vec::new(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn list(&self) -> &[Category] {
        &self.categories
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Rebuild every category from disk. Subdirectories without images are
    /// dropped. The new set replaces the old one only after it is complete;
    /// if the base directory cannot be listed the old set is kept.
    pub fn refresh(&mut self) -> Result<()> {
        let mut fresh = Vec::new();
        for entry in list_dir(&self.base_dir)?.into_iter().filter(|e| e.is_dir) {
            let images: Vec<PathBuf> = match list_dir(&entry.path) {
                Ok(files) => files
                    .into_iter()
                    .filter(|f| !f.is_dir && is_image_file(&f.path))
                    .map(|f| f.path)
                    .collect(),
                Err(e) => {
                    log::warn!("Skipping category {}: {}", entry.name, e);
                    continue;
                }
            };
            if !images.is_empty() {
                fresh.push(Category {
                    name: entry.name,
                    images,
                });
            }
        }
        log::info!(
            "Loaded {} categories from {}",
            fresh.len(),
            self.base_dir.display()
        );
        self.categories = fresh;
        Ok(())
    }

    /// Make `name` the active category at index 0. Unknown names leave the
    /// view unchanged.
    pub fn select(&self, view: &ViewState, name: &str) -> ViewState {
        match self.get(name) {
            Some(c) => ViewState::Category {
                name: c.name.clone(),
                index: 0,
            },
            None => view.clone(),
        }
    }

    pub fn next(&self, view: &ViewState) -> ViewState {
        self.step(view, 1)
    }

    pub fn previous(&self, view: &ViewState) -> ViewState {
        self.step(view, -1)
    }

    /// Move the cursor with wraparound. No category selected, or a category
    /// with no images, is a no-op.
    fn step(&self, view: &ViewState, delta: i64) -> ViewState {
        let Some((name, index)) = view.category() else { return view.clone() };
        let len = self.get(name).map_or(0, |c| c.images.len());
        if len == 0 {
            return view.clone();
        }
        let index = (index as i64 + delta).rem_euclid(len as i64) as usize;
        log::debug!("[nav] {} -> {}/{}", name, index + 1, len);
        ViewState::Category {
            name: name.to_string(),
            index,
        }
    }

    /// The image the view points at, if any. Out-of-range indices (left over
    /// from a refresh that shrank the category) resolve to nothing.
    pub fn current_image(&self, view: &ViewState) -> Option<&Path> {
        let (name, index) = view.category()?;
        self.get(name)?.images.get(index).map(PathBuf::as_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("cats")).unwrap();
        fs::write(root.join("cats/a.jpg"), "").unwrap();
        fs::write(root.join("cats/b.png"), "").unwrap();
        fs::create_dir(root.join("empty")).unwrap();
        fs::create_dir(root.join("docs")).unwrap();
        fs::write(root.join("docs/notes.txt"), "").unwrap();
        fs::write(root.join("loose.png"), "").unwrap();
        dir
    }

    fn loaded(dir: &tempfile::TempDir) -> Categories {
        let mut cats = Categories::new(dir.path().to_path_buf());
        cats.refresh().unwrap();
        cats
    }

    #[test]
    fn refresh_keeps_only_subdirectories_with_images() {
        let dir = fixture();
        let cats = loaded(&dir);
        assert_eq!(cats.list().len(), 1);
        let c = &cats.list()[0];
        assert_eq!(c.name, "cats");
        assert_eq!(
            c.images,
            [dir.path().join("cats/a.jpg"), dir.path().join("cats/b.png")]
        );
    }

    #[test]
    fn refresh_replaces_previous_set() {
        let dir = fixture();
        let mut cats = loaded(&dir);
        fs::create_dir(dir.path().join("dogs")).unwrap();
        fs::write(dir.path().join("dogs/rex.GIF"), "").unwrap();
        fs::remove_file(dir.path().join("cats/a.jpg")).unwrap();
        fs::remove_file(dir.path().join("cats/b.png")).unwrap();

        cats.refresh().unwrap();
        let names: Vec<_> = cats.list().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["dogs"]);
    }

    #[test]
    fn refresh_of_missing_base_keeps_old_set() {
        let dir = fixture();
        let mut cats = loaded(&dir);
        cats.base_dir = dir.path().join("gone");
        assert!(cats.refresh().is_err());
        assert_eq!(cats.list().len(), 1);
    }

    #[test]
    fn select_resets_index() {
        let dir = fixture();
        let cats = loaded(&dir);
        let view = ViewState::Category { name: "cats".into(), index: 1 };
        let view = cats.select(&view, "cats");
        assert_eq!(view, ViewState::Category { name: "cats".into(), index: 0 });
        assert_eq!(cats.current_image(&view), Some(dir.path().join("cats/a.jpg").as_path()));

        assert_eq!(cats.select(&ViewState::Empty, "nope"), ViewState::Empty);
    }

    #[test]
    fn navigation_wraps_both_ways() {
        let dir = fixture();
        let cats = loaded(&dir);
        let start = cats.select(&ViewState::Empty, "cats");

        let prev = cats.previous(&start);
        assert_eq!(prev.category(), Some(("cats", 1)));
        assert_eq!(cats.next(&prev).category(), Some(("cats", 0)));
    }

    #[test]
    fn len_steps_return_to_start() {
        let dir = fixture();
        fs::write(dir.path().join("cats/c.bmp"), "").unwrap();
        let cats = loaded(&dir);
        let len = cats.get("cats").unwrap().images.len();
        assert_eq!(len, 3);

        for start in 0..len {
            let origin = ViewState::Category { name: "cats".into(), index: start };
            let mut fwd = origin.clone();
            let mut back = origin.clone();
            for _ in 0..len {
                fwd = cats.next(&fwd);
                back = cats.previous(&back);
            }
            assert_eq!(fwd, origin);
            assert_eq!(back, origin);
        }
    }

    #[test]
    fn navigation_without_category_is_noop() {
        let dir = fixture();
        let cats = loaded(&dir);
        assert_eq!(cats.next(&ViewState::Empty), ViewState::Empty);
        assert_eq!(cats.previous(&ViewState::Node(3)), ViewState::Node(3));
        assert_eq!(cats.current_image(&ViewState::Empty), None);
    }

    #[test]
    fn navigation_in_category_without_images_is_noop() {
        let dir = fixture();
        let cats = loaded(&dir);
        let stale = ViewState::Category { name: "empty".into(), index: 0 };
        assert_eq!(cats.next(&stale), stale);
        assert_eq!(cats.previous(&stale), stale);
        assert_eq!(cats.current_image(&stale), None);
    }
}
