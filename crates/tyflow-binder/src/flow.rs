//! Control flow graph nodes.
//!
//! Every flow node is tagged with exactly one kind flag, plus the
//! `REFERENCED`/`SHARED` markers maintained by `FlowNodeArena::add_antecedent`.

use crate::node::NodeIndex;
use smallvec::SmallVec;

/// Flow node flags.
pub mod flow_flags {
    /// Unreachable code
    pub const UNREACHABLE: u32 = 1 << 0;
    /// Start of flow graph
    pub const START: u32 = 1 << 1;
    /// Non-looping junction
    pub const BRANCH_LABEL: u32 = 1 << 2;
    /// Looping junction
    pub const LOOP_LABEL: u32 = 1 << 3;
    /// Assignment
    pub const ASSIGNMENT: u32 = 1 << 4;
    /// Condition known to be true
    pub const TRUE_CONDITION: u32 = 1 << 5;
    /// Condition known to be false
    pub const FALSE_CONDITION: u32 = 1 << 6;
    /// Switch statement clause
    pub const SWITCH_CLAUSE: u32 = 1 << 7;
    /// Potential array mutation
    pub const ARRAY_MUTATION: u32 = 1 << 8;
    /// Potential assertion call
    pub const CALL: u32 = 1 << 9;
    /// Temporarily reduce antecedents of label
    pub const REDUCE_LABEL: u32 = 1 << 10;
    /// Referenced as antecedent once
    pub const REFERENCED: u32 = 1 << 11;
    /// Referenced as antecedent more than once
    pub const SHARED: u32 = 1 << 12;

    pub const LABEL: u32 = BRANCH_LABEL | LOOP_LABEL;
    pub const CONDITION: u32 = TRUE_CONDITION | FALSE_CONDITION;
}

/// Unique identifier for a flow node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct FlowNodeId(pub u32);

impl FlowNodeId {
    pub const NONE: FlowNodeId = FlowNodeId(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    pub fn is_some(self) -> bool {
        self.0 != u32::MAX
    }
}

/// Payload of a `SWITCH_CLAUSE` flow node.
///
/// `[clause_start, clause_end)` indexes the switch statement's clauses. An
/// empty range marks the implicit "no clause matched" bypass path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlowSwitchClauseData {
    pub switch_statement: NodeIndex,
    pub clause_start: u32,
    pub clause_end: u32,
}

/// Payload of a `REDUCE_LABEL` flow node: while evaluating the antecedent,
/// `target` behaves as if its antecedents were `antecedents`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowReduceLabelData {
    pub target: FlowNodeId,
    pub antecedents: Vec<FlowNodeId>,
}

/// A node in the control flow graph.
#[derive(Clone, Debug)]
pub struct FlowNode {
    pub flags: u32,
    pub id: FlowNodeId,
    /// Antecedents in evaluation order. Loop labels keep the entry edge first.
    pub antecedent: SmallVec<[FlowNodeId; 2]>,
    /// The AST node this flow node describes (condition expression, assignment,
    /// call, switch statement, or the container for `START`).
    pub node: NodeIndex,
    pub switch_clause: Option<FlowSwitchClauseData>,
    pub reduce_label: Option<FlowReduceLabelData>,
}

impl FlowNode {
    pub fn new(id: FlowNodeId, flags: u32) -> Self {
        FlowNode {
            flags,
            id,
            antecedent: SmallVec::new(),
            node: NodeIndex::NONE,
            switch_clause: None,
            reduce_label: None,
        }
    }

    #[inline]
    pub fn has_any_flags(&self, flags: u32) -> bool {
        (self.flags & flags) != 0
    }

    /// The single antecedent of a linear flow node.
    #[inline]
    pub fn first_antecedent(&self) -> Option<FlowNodeId> {
        self.antecedent.first().copied()
    }
}

/// Arena for flow nodes.
#[derive(Clone, Debug, Default)]
pub struct FlowNodeArena {
    nodes: Vec<FlowNode>,
}

impl FlowNodeArena {
    pub fn new() -> Self {
        FlowNodeArena { nodes: Vec::new() }
    }

    pub fn alloc(&mut self, flags: u32) -> FlowNodeId {
        let id = FlowNodeId(self.nodes.len() as u32);
        self.nodes.push(FlowNode::new(id, flags));
        id
    }

    #[inline]
    pub fn get(&self, id: FlowNodeId) -> Option<&FlowNode> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    #[inline]
    pub fn get_mut(&mut self, id: FlowNodeId) -> Option<&mut FlowNode> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    /// Link `antecedent` into the label `id`.
    ///
    /// Unreachable antecedents and duplicate edges are ignored.
    pub fn add_antecedent(&mut self, id: FlowNodeId, antecedent: FlowNodeId) {
        let Some(node) = self.get(id) else {
            return;
        };
        if node.antecedent.contains(&antecedent) {
            return;
        }
        match self.get(antecedent) {
            Some(ante) if !ante.has_any_flags(flow_flags::UNREACHABLE) => {}
            _ => return,
        }
        self.set_antecedent(id, antecedent);
    }

    /// Link `antecedent` into the linear node `id` unconditionally.
    ///
    /// A node consumed by more than one successor becomes `SHARED`.
    pub fn set_antecedent(&mut self, id: FlowNodeId, antecedent: FlowNodeId) {
        if antecedent.is_none() || self.get(id).is_none() {
            return;
        }
        if let Some(ante) = self.get_mut(antecedent) {
            if ante.has_any_flags(flow_flags::REFERENCED) {
                ante.flags |= flow_flags::SHARED;
            } else {
                ante.flags |= flow_flags::REFERENCED;
            }
        }
        if let Some(node) = self.get_mut(id) {
            node.antecedent.push(antecedent);
        }
    }

    pub fn find_unreachable(&self) -> Option<FlowNodeId> {
        self.nodes
            .iter()
            .find(|node| node.has_any_flags(flow_flags::UNREACHABLE))
            .map(|node| node.id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}
