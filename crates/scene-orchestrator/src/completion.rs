//! # Aggregate Completion
//!
//! Every request node carries a [`NodePhase`]. The node's own load/unload
//! (its *self-action*) and its subtree report independently, in either order:
//!
//! ```text
//!            self_done            children_done
//! Pending ─────────────► SelfDone ──────────────► AllDone
//!    │                                              ▲
//!    └──── children_done ──► ChildrenDone ──────────┘
//!                                      self_done
//! Pending | SelfDone | ChildrenDone ── fail ──► Failed
//! ```
//!
//! `AllDone` and `Failed` are terminal. The runtime fires a node's terminal
//! callback only on the transition that returns [`Transition::Completed`] or
//! [`Transition::Failed`], so each callback can fire at most once.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodePhase {
    #[default]
    Pending,
    SelfDone,
    ChildrenDone,
    AllDone,
    Failed,
}

/// Outcome of feeding one signal into a [`NodePhase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// One of the two halves is now done.
    Advanced,
    /// Both halves are done; the node just entered `AllDone`.
    Completed,
    /// The node just entered `Failed`.
    Failed,
    /// The signal was already recorded, or the node is terminal.
    Ignored,
}

impl NodePhase {
    pub fn self_done(&mut self) -> Transition {
        match *self {
            NodePhase::Pending => {
                *self = NodePhase::SelfDone;
                Transition::Advanced
            }
            NodePhase::ChildrenDone => {
                *self = NodePhase::AllDone;
                Transition::Completed
            }
            NodePhase::SelfDone | NodePhase::AllDone | NodePhase::Failed => Transition::Ignored,
        }
    }

    pub fn children_done(&mut self) -> Transition {
        match *self {
            NodePhase::Pending => {
                *self = NodePhase::ChildrenDone;
                Transition::Advanced
            }
            NodePhase::SelfDone => {
                *self = NodePhase::AllDone;
                Transition::Completed
            }
            NodePhase::ChildrenDone | NodePhase::AllDone | NodePhase::Failed => Transition::Ignored,
        }
    }

    pub fn fail(&mut self) -> Transition {
        if self.is_terminal() {
            return Transition::Ignored;
        }
        *self = NodePhase::Failed;
        Transition::Failed
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, NodePhase::AllDone | NodePhase::Failed)
    }

    pub fn is_self_done(&self) -> bool {
        matches!(self, NodePhase::SelfDone | NodePhase::AllDone)
    }
}
