use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::files::{list_dir, DirEntry};

pub type NodeId = usize;

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// Population state of a directory node. `Expanded` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Population {
    Unexpanded,
    Expanded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    /// `open` only controls whether children are shown; it never discards them.
    Directory { population: Population, open: bool },
}

#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub path: PathBuf,
    pub kind: NodeKind,
    pub depth: usize,
    pub children: Vec<NodeId>,
}

impl TreeNode {
    fn from_entry(entry: DirEntry, depth: usize) -> Self {
        let kind = if entry.is_dir {
            NodeKind::Directory {
                population: Population::Unexpanded,
                open: false,
            }
        } else {
            NodeKind::File
        };
        Self {
            name: entry.name,
            path: entry.path,
            kind,
            depth,
            children: Vec::new(),
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    pub fn is_open(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { open: true, .. })
    }

    /// Directories offer an expander until they are known to be empty.
    pub fn has_expander(&self) -> bool {
        match self.kind {
            NodeKind::Directory { population: Population::Unexpanded, .. } => true,
            NodeKind::Directory { population: Population::Expanded, .. } => !self.children.is_empty(),
            NodeKind::File => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// Lazily populated view of a directory hierarchy. Nodes live in an arena and
/// are only dropped when the whole tree is reloaded.
pub struct Tree {
    root: PathBuf,
    nodes: Vec<TreeNode>,
    top: Vec<NodeId>,
}

impl Tree {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            nodes: Vec::new(),
            top: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    pub fn top_level(&self) -> &[NodeId] {
        &self.top
    }

    /// Tear the tree down and list the root again. On failure the tree is
    /// left empty.
    pub fn reload(&mut self) -> Result<()> {
        self.nodes.clear();
        self.top.clear();
        let entries = list_dir(&self.root)?;
        self.top = self.attach(entries, 0);
        log::info!("Loaded {} entries from {}", self.top.len(), self.root.display());
        Ok(())
    }

    fn attach(&mut self, entries: Vec<DirEntry>, depth: usize) -> Vec<NodeId> {
        entries
            .into_iter()
            .map(|entry| {
                self.nodes.push(TreeNode::from_entry(entry, depth));
                self.nodes.len() - 1
            })
            .collect()
    }

    /// Populate (on first call) and open a directory node. Returns true when
    /// the node was listed by this call. Files and unknown ids are ignored.
    ///
    /// A listing failure still moves the node to `Expanded`, with no children.
    pub fn expand(&mut self, id: NodeId) -> Result<bool> {
        let Some(node) = self.nodes.get_mut(id) else { return Ok(false) };
        let NodeKind::Directory { population, .. } = node.kind else { return Ok(false) };
        node.kind = NodeKind::Directory {
            population: Population::Expanded,
            open: true,
        };
        if population == Population::Expanded {
            return Ok(false);
        }

        let path = node.path.clone();
        let depth = node.depth + 1;
        let entries = list_dir(&path)?;
        let children = self.attach(entries, depth);
        log::debug!("Expanded {} ({} children)", path.display(), children.len());
        self.nodes[id].children = children;
        Ok(true)
    }

    pub fn collapse(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            if let NodeKind::Directory { population, .. } = node.kind {
                node.kind = NodeKind::Directory { population, open: false };
            }
        }
    }

    pub fn toggle(&mut self, id: NodeId) -> Result<bool> {
        match self.nodes.get(id) {
            Some(node) if node.is_open() => {
                self.collapse(id);
                Ok(false)
            }
            _ => self.expand(id),
        }
    }

    /// The file a selection of `id` should display. Directories yield
    /// nothing; selecting one does not expand it.
    pub fn selected_file(&self, id: NodeId) -> Option<&Path> {
        self.nodes
            .get(id)
            .filter(|n| !n.is_dir())
            .map(|n| n.path.as_path())
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.children.contains(&id))
    }

    /// Node ids in display order, descending only into open directories.
    pub fn visible_rows(&self) -> Vec<NodeId> {
        let mut rows = Vec::new();
        let mut stack: Vec<NodeId> = self.top_level().iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            rows.push(id);
            let node = &self.nodes[id];
            if node.is_open() {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("photos/2024")).unwrap();
        fs::write(root.join("photos/b.png"), "").unwrap();
        fs::write(root.join("photos/A.jpg"), "").unwrap();
        fs::create_dir(root.join("empty")).unwrap();
        fs::write(root.join("readme.md"), "# hi").unwrap();
        dir
    }

    fn find(tree: &Tree, name: &str) -> NodeId {
        (0..)
            .map_while(|id| tree.node(id).map(|n| (id, n)))
            .find(|(_, n)| n.name == name)
            .map(|(id, _)| id)
            .unwrap()
    }

    #[test]
    fn reload_lists_root_with_unexpanded_directories() {
        let dir = fixture();
        let mut tree = Tree::new(dir.path().to_path_buf());
        tree.reload().unwrap();

        let names: Vec<_> = tree
            .top_level()
            .iter()
            .map(|&id| tree.node(id).unwrap().name.clone())
            .collect();
        assert_eq!(names, ["empty", "photos", "readme.md"]);

        let photos = tree.node(find(&tree, "photos")).unwrap();
        assert!(photos.children.is_empty());
        assert!(photos.has_expander());
        assert_eq!(
            photos.kind,
            NodeKind::Directory { population: Population::Unexpanded, open: false }
        );
        assert!(!tree.node(find(&tree, "readme.md")).unwrap().has_expander());
    }

    #[test]
    fn first_expand_matches_listing() {
        let dir = fixture();
        let mut tree = Tree::new(dir.path().to_path_buf());
        tree.reload().unwrap();
        let photos = find(&tree, "photos");

        assert!(tree.expand(photos).unwrap());

        let listed = list_dir(&dir.path().join("photos")).unwrap();
        let node = tree.node(photos).unwrap();
        let children: Vec<_> = node
            .children
            .iter()
            .map(|&id| {
                let c = tree.node(id).unwrap();
                (c.name.clone(), c.path.clone(), c.is_dir())
            })
            .collect();
        let expected: Vec<_> = listed.into_iter().map(|e| (e.name, e.path, e.is_dir)).collect();
        assert_eq!(children, expected);

        let sub = tree.node(find(&tree, "2024")).unwrap();
        assert_eq!(sub.depth, 1);
        assert!(sub.has_expander());
    }

    #[test]
    fn second_expand_does_not_refetch() {
        let dir = fixture();
        let mut tree = Tree::new(dir.path().to_path_buf());
        tree.reload().unwrap();
        let photos = find(&tree, "photos");
        tree.expand(photos).unwrap();
        let before = tree.node(photos).unwrap().children.clone();

        fs::write(dir.path().join("photos/late.gif"), "").unwrap();
        assert!(!tree.expand(photos).unwrap());
        assert_eq!(tree.node(photos).unwrap().children, before);
        assert_eq!((0..).map_while(|id| tree.node(id)).count(), 6);
    }

    #[test]
    fn collapse_hides_children_without_dropping_them() {
        let dir = fixture();
        let mut tree = Tree::new(dir.path().to_path_buf());
        tree.reload().unwrap();
        let photos = find(&tree, "photos");

        tree.toggle(photos).unwrap();
        assert_eq!(tree.visible_rows().len(), 6);

        tree.toggle(photos).unwrap();
        assert_eq!(tree.visible_rows().len(), 3);
        assert_eq!(tree.node(photos).unwrap().children.len(), 3);
        assert!(!tree.expand(photos).unwrap());
        assert_eq!(tree.visible_rows().len(), 6);
    }

    #[test]
    fn visible_rows_follow_display_order() {
        let dir = fixture();
        let mut tree = Tree::new(dir.path().to_path_buf());
        tree.reload().unwrap();
        tree.expand(find(&tree, "photos")).unwrap();

        let names: Vec<_> = tree
            .visible_rows()
            .into_iter()
            .map(|id| tree.node(id).unwrap().name.clone())
            .collect();
        assert_eq!(names, ["empty", "photos", "2024", "A.jpg", "b.png", "readme.md"]);
        let a = find(&tree, "A.jpg");
        assert_eq!(tree.parent_of(a), Some(find(&tree, "photos")));
    }

    #[test]
    fn empty_directory_loses_expander_after_expansion() {
        let dir = fixture();
        let mut tree = Tree::new(dir.path().to_path_buf());
        tree.reload().unwrap();
        let empty = find(&tree, "empty");
        assert!(tree.expand(empty).unwrap());
        assert!(!tree.node(empty).unwrap().has_expander());
    }

    #[test]
    fn selection_yields_files_only() {
        let dir = fixture();
        let mut tree = Tree::new(dir.path().to_path_buf());
        tree.reload().unwrap();
        let photos = find(&tree, "photos");
        let readme = find(&tree, "readme.md");

        assert_eq!(tree.selected_file(readme), Some(dir.path().join("readme.md").as_path()));
        assert_eq!(tree.selected_file(photos), None);
        assert!(tree.node(photos).unwrap().children.is_empty());
    }

    #[test]
    fn vanished_directory_expands_to_nothing() {
        let dir = fixture();
        let mut tree = Tree::new(dir.path().to_path_buf());
        tree.reload().unwrap();
        let empty = find(&tree, "empty");
        fs::remove_dir(dir.path().join("empty")).unwrap();

        assert!(tree.expand(empty).is_err());
        assert!(!tree.node(empty).unwrap().has_expander());
        assert!(!tree.expand(empty).unwrap());
    }

    #[test]
    fn missing_root_leaves_tree_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut tree = Tree::new(dir.path().join("absent"));
        assert!(tree.reload().is_err());
        assert!(tree.visible_rows().is_empty());
    }
}
