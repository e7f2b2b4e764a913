use crate::tree::NodeId;

/// What the user currently has selected. Owned by the UI state and replaced
/// wholesale by controller operations; controllers never hold on to it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Empty,
    Category { name: String, index: usize },
    Node(NodeId),
}

impl ViewState {
    pub fn category(&self) -> Option<(&str, usize)> {
        match self {
            ViewState::Category { name, index } => Some((name.as_str(), *index)),
            _ => None,
        }
    }

    pub fn node(&self) -> Option<NodeId> {
        match self {
            ViewState::Node(id) => Some(*id),
            _ => None,
        }
    }
}
