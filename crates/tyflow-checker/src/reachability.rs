//! Flow node reachability.
//!
//! A node is unreachable when every path to it passes through a call to a
//! `never`-returning function, an `asserts x` call with a literally false
//! argument, the "no clause matched" edge of an exhaustive switch, or the
//! binder's unreachable node.

use tracing::trace;
use tyflow_binder::{BinaryOperator, FlowNodeId, NodeIndex, NodeKind, flow_flags};
use tyflow_solver::TypePredicateKind;

use crate::control_flow::FlowAnalyzer;

impl<'a> FlowAnalyzer<'a> {
    /// Whether control can reach `flow`.
    pub fn is_reachable_flow_node(&self, flow: FlowNodeId) -> bool {
        let reachable = self.is_reachable_flow_node_worker(flow, false);
        self.last_flow_node.set(Some((flow, reachable)));
        trace!(flow = flow.0, reachable, "reachability");
        reachable
    }

    fn is_reachable_flow_node_worker(&self, mut flow_id: FlowNodeId, mut no_cache_check: bool) -> bool {
        let binder = self.binder;
        loop {
            if let Some((last, reachable)) = self.last_flow_node.get()
                && last == flow_id
            {
                return reachable;
            }
            let Some(flow) = binder.flow_nodes.get(flow_id) else {
                return true;
            };

            if flow.has_any_flags(flow_flags::SHARED) {
                if !no_cache_check {
                    if let Some(&reachable) = self.flow_node_reachable.borrow().get(&flow_id) {
                        return reachable;
                    }
                    let reachable = self.is_reachable_flow_node_worker(flow_id, true);
                    self.flow_node_reachable.borrow_mut().insert(flow_id, reachable);
                    return reachable;
                }
                no_cache_check = false;
            }

            let next = if flow.has_any_flags(
                flow_flags::ASSIGNMENT | flow_flags::CONDITION | flow_flags::ARRAY_MUTATION,
            ) {
                flow.first_antecedent()
            } else if flow.has_any_flags(flow_flags::CALL) {
                if self.is_unreachable_call(flow.node) {
                    return false;
                }
                flow.first_antecedent()
            } else if flow.has_any_flags(flow_flags::BRANCH_LABEL) {
                let reduce_labels = self.reachability_reduce_labels.borrow().clone();
                return self
                    .branch_label_antecedents(flow, &reduce_labels)
                    .iter()
                    .any(|&antecedent| self.is_reachable_flow_node_worker(antecedent, false));
            } else if flow.has_any_flags(flow_flags::LOOP_LABEL) {
                match flow.first_antecedent() {
                    Some(entry) => Some(entry),
                    None => return false,
                }
            } else if flow.has_any_flags(flow_flags::SWITCH_CLAUSE) {
                if let Some(data) = flow.switch_clause
                    && data.clause_start == data.clause_end
                    && self.is_exhaustive_switch_statement(data.switch_statement)
                {
                    return false;
                }
                flow.first_antecedent()
            } else if flow.has_any_flags(flow_flags::REDUCE_LABEL) {
                let Some(antecedent) = flow.first_antecedent() else {
                    return true;
                };
                self.last_flow_node.set(None);
                self.reachability_reduce_labels.borrow_mut().push(flow_id);
                let reachable = self.is_reachable_flow_node_worker(antecedent, false);
                self.reachability_reduce_labels.borrow_mut().pop();
                return reachable;
            } else {
                return !flow.has_any_flags(flow_flags::UNREACHABLE);
            };

            match next {
                Some(antecedent) => flow_id = antecedent,
                None => return !flow.has_any_flags(flow_flags::UNREACHABLE),
            }
        }
    }

    /// A call to a `never`-returning function, or `assertX(false)` through
    /// an `asserts x` signature, ends control flow.
    fn is_unreachable_call(&self, call: NodeIndex) -> bool {
        let Some(signature) = self.host.effects_signature(call) else {
            return false;
        };
        if let Some(predicate) = signature.type_predicate
            && predicate.kind == TypePredicateKind::AssertsIdentifier
            && predicate.type_id.is_none()
        {
            let argument = match (predicate.parameter_index, self.binder.arena.kind(call)) {
                (Some(index), Some(NodeKind::Call { arguments, .. })) => arguments.get(index).copied(),
                _ => None,
            };
            if argument.is_some_and(|argument| self.is_false_expression(argument)) {
                return true;
            }
        }
        signature.return_type.is_never()
    }

    fn is_false_expression(&self, expr: NodeIndex) -> bool {
        let arena = &self.binder.arena;
        match arena.kind(arena.skip_parentheses(expr)) {
            Some(NodeKind::FalseKeyword) => true,
            Some(NodeKind::Binary {
                left,
                operator: BinaryOperator::AmpersandAmpersand,
                right,
            }) => self.is_false_expression(*left) || self.is_false_expression(*right),
            Some(NodeKind::Binary {
                left,
                operator: BinaryOperator::BarBar,
                right,
            }) => self.is_false_expression(*left) && self.is_false_expression(*right),
            _ => false,
        }
    }

    /// Whether every path to `flow` passes through a required call
    /// (`super(...)` or one the host designates), so that `this` is
    /// initialized.
    pub fn is_post_required_call_flow_node(&self, flow: FlowNodeId) -> bool {
        self.is_post_required_call_worker(flow, false)
    }

    fn is_post_required_call_worker(&self, mut flow_id: FlowNodeId, mut no_cache_check: bool) -> bool {
        let binder = self.binder;
        loop {
            let Some(flow) = binder.flow_nodes.get(flow_id) else {
                return false;
            };

            if flow.has_any_flags(flow_flags::SHARED) {
                if !no_cache_check {
                    if let Some(&post) = self.flow_node_post_required_call.borrow().get(&flow_id) {
                        return post;
                    }
                    let post = self.is_post_required_call_worker(flow_id, true);
                    self.flow_node_post_required_call
                        .borrow_mut()
                        .insert(flow_id, post);
                    return post;
                }
                no_cache_check = false;
            }

            let next = if flow.has_any_flags(
                flow_flags::ASSIGNMENT
                    | flow_flags::CONDITION
                    | flow_flags::ARRAY_MUTATION
                    | flow_flags::SWITCH_CLAUSE,
            ) {
                flow.first_antecedent()
            } else if flow.has_any_flags(flow_flags::CALL) {
                if self.is_required_call(flow.node) {
                    return true;
                }
                flow.first_antecedent()
            } else if flow.has_any_flags(flow_flags::BRANCH_LABEL) {
                let reduce_labels = self.reachability_reduce_labels.borrow().clone();
                return self
                    .branch_label_antecedents(flow, &reduce_labels)
                    .iter()
                    .all(|&antecedent| self.is_post_required_call_worker(antecedent, false));
            } else if flow.has_any_flags(flow_flags::LOOP_LABEL) {
                flow.first_antecedent()
            } else if flow.has_any_flags(flow_flags::REDUCE_LABEL) {
                let Some(antecedent) = flow.first_antecedent() else {
                    return false;
                };
                self.reachability_reduce_labels.borrow_mut().push(flow_id);
                let post = self.is_post_required_call_worker(antecedent, false);
                self.reachability_reduce_labels.borrow_mut().pop();
                return post;
            } else {
                return flow.has_any_flags(flow_flags::UNREACHABLE);
            };

            match next {
                Some(antecedent) => flow_id = antecedent,
                None => return flow.has_any_flags(flow_flags::UNREACHABLE),
            }
        }
    }

    fn is_required_call(&self, call: NodeIndex) -> bool {
        let arena = &self.binder.arena;
        match arena.kind(call) {
            Some(NodeKind::Call { callee, .. })
                if matches!(arena.kind(*callee), Some(NodeKind::SuperKeyword)) =>
            {
                true
            }
            _ => self.host.is_required_call(call),
        }
    }
}
