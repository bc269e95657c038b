//! Switch statement narrowing and exhaustiveness.
//!
//! A `SWITCH_CLAUSE` flow node covers the clause range `[start, end)` of one
//! switch statement. The reference is narrowed by the case values in the
//! range when it is the switch operand, the operand of `typeof` in the
//! switch expression, or a discriminant property of the operand.
//! `switch (true)` narrows by each case condition instead.

use std::rc::Rc;

use tracing::trace;
use tyflow_binder::{FlowNode, NodeIndex, NodeKind};
use tyflow_solver::type_queries::literal_value;
use tyflow_solver::{LiteralValue, TypeFacts, TypeId};

use crate::control_flow::{FlowAnalyzer, FlowState, FlowType};
use crate::references::{is_matching_reference, optional_chain_contains_reference};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Exhaustiveness {
    #[default]
    Unknown,
    /// Resolution in progress; a re-entrant query resolves to `false`.
    Computing,
    Resolved(bool),
}

/// Per-statement results cached for the analyzer's lifetime.
#[derive(Clone, Debug, Default)]
pub(crate) struct SwitchStatementLinks {
    exhaustive: Exhaustiveness,
    switch_types: Option<Rc<[TypeId]>>,
    /// Outer `None`: not computed yet. Inner `None`: some case is not a
    /// string literal.
    witnesses: Option<Option<Rc<[String]>>>,
}

impl<'a> FlowAnalyzer<'a> {
    pub(crate) fn type_at_switch_clause(&self, f: &mut FlowState, flow: &FlowNode) -> FlowType {
        let Some(data) = flow.switch_clause else {
            return FlowType::complete(f.declared_type);
        };
        let Some(antecedent) = flow.first_antecedent() else {
            return FlowType::complete(f.initial_type);
        };
        let binder = self.binder;
        let arena = &binder.arena;
        let Some(NodeKind::SwitchStatement {
            expression,
            clauses,
        }) = arena.kind(data.switch_statement)
        else {
            return FlowType::complete(f.declared_type);
        };
        let switch = data.switch_statement;
        let expr = arena.skip_parentheses(*expression);
        let (start, end) = (data.clause_start as usize, data.clause_end as usize);

        let flow_type = self.type_at_flow_node(f, antecedent);
        let mut t = flow_type.type_id;
        let narrowing = self.narrowing();

        let typeof_operand = match arena.kind(expr) {
            Some(NodeKind::TypeOf { expression }) => Some(*expression),
            _ => None,
        };

        if is_matching_reference(binder, f.reference, expr) {
            let types = self.switch_clause_types(switch);
            t = narrowing.narrow_type_by_switch_on_discriminant(t, &types, start, end);
        } else if let Some(operand) = typeof_operand
            && is_matching_reference(binder, f.reference, operand)
        {
            if let Some(witnesses) = self.switch_clause_typeof_witnesses(switch) {
                let default_index = self.default_clause_index(clauses);
                t = narrowing.narrow_type_by_switch_on_typeof(t, &witnesses, default_index, start, end);
            }
        } else if matches!(arena.kind(expr), Some(NodeKind::TrueKeyword)) {
            t = self.narrow_type_by_switch_on_true(f, t, clauses, start, end);
        } else {
            if self.strict_null_checks() {
                if optional_chain_contains_reference(binder, expr, f.reference) {
                    t = self.narrow_type_by_switch_optional_chain_containment(t, switch, start, end, |case| {
                        case != TypeId::UNDEFINED && !case.is_never()
                    });
                } else if let Some(operand) = typeof_operand
                    && optional_chain_contains_reference(binder, operand, f.reference)
                {
                    t = self.narrow_type_by_switch_optional_chain_containment(t, switch, start, end, |case| {
                        !case.is_never() && !self.is_string_literal_with_text(case, "undefined")
                    });
                }
            }
            if let Some(access) = self.discriminant_property_access(f, expr, t) {
                let types = self.switch_clause_types(switch);
                t = self.narrow_type_by_discriminant(t, access, |prop| {
                    narrowing.narrow_type_by_switch_on_discriminant(prop, &types, start, end)
                });
            }
        }
        trace!(switch = switch.0, start, end, result = t.0, "switch clause");
        FlowType::new(t, flow_type.incomplete)
    }

    /// `switch (true)`: earlier cases failed, the cases in range may hold.
    fn narrow_type_by_switch_on_true(
        &self,
        f: &FlowState,
        mut type_id: TypeId,
        clauses: &[NodeIndex],
        start: usize,
        end: usize,
    ) -> TypeId {
        let end = end.min(clauses.len());
        let start = start.min(end);
        let default_index = self.default_clause_index(clauses);
        let has_default_clause =
            start == end || default_index.is_some_and(|index| index >= start && index < end);

        for &clause in &clauses[..start] {
            if let Some(condition) = self.case_expression(clause) {
                type_id = self.narrow_type(f, type_id, condition, false);
            }
        }
        if has_default_clause {
            for &clause in &clauses[end..] {
                if let Some(condition) = self.case_expression(clause) {
                    type_id = self.narrow_type(f, type_id, condition, false);
                }
            }
            return type_id;
        }
        let narrowed = clauses[start..end]
            .iter()
            .map(|&clause| match self.case_expression(clause) {
                Some(condition) => self.narrow_type(f, type_id, condition, true),
                None => TypeId::NEVER,
            })
            .collect();
        self.interner.union(narrowed)
    }

    /// `switch (a?.b)`: every case in range rules out the chain short-circuiting.
    fn narrow_type_by_switch_optional_chain_containment(
        &self,
        type_id: TypeId,
        switch: NodeIndex,
        start: usize,
        end: usize,
        clause_check: impl Fn(TypeId) -> bool,
    ) -> TypeId {
        let types = self.switch_clause_types(switch);
        let end = end.min(types.len());
        let no_clause_is_default_or_undefined =
            start < end && types[start..end].iter().all(|&case| clause_check(case));
        if no_clause_is_default_or_undefined {
            return self
                .narrowing()
                .type_with_facts(type_id, TypeFacts::NE_UNDEFINED_OR_NULL);
        }
        type_id
    }

    fn is_string_literal_with_text(&self, type_id: TypeId, text: &str) -> bool {
        matches!(
            literal_value(self.interner, type_id),
            Some(LiteralValue::String(atom)) if &*self.interner.resolve_atom(atom) == text
        )
    }

    /// The `case` expression of a clause; `None` for `default`.
    fn case_expression(&self, clause: NodeIndex) -> Option<NodeIndex> {
        match self.binder.arena.kind(clause)? {
            NodeKind::CaseClause { expression } if expression.is_some() => Some(*expression),
            _ => None,
        }
    }

    fn default_clause_index(&self, clauses: &[NodeIndex]) -> Option<usize> {
        clauses.iter().position(|&clause| {
            matches!(
                self.binder.arena.kind(clause),
                Some(NodeKind::CaseClause { expression }) if expression.is_none()
            )
        })
    }

    fn switch_clauses_of(&self, switch: NodeIndex) -> &'a [NodeIndex] {
        match self.binder.arena.kind(switch) {
            Some(NodeKind::SwitchStatement { clauses, .. }) => clauses,
            _ => &[],
        }
    }

    // =========================================================================
    // Clause types
    // =========================================================================

    /// Regular literal type of each case expression, `never` for `default`.
    pub(crate) fn switch_clause_types(&self, switch: NodeIndex) -> Rc<[TypeId]> {
        if let Some(types) = self
            .switch_links
            .borrow()
            .get(&switch)
            .and_then(|links| links.switch_types.clone())
        {
            return types;
        }
        let interner = self.interner;
        let types: Rc<[TypeId]> = self
            .switch_clauses_of(switch)
            .iter()
            .map(|&clause| match self.case_expression(clause) {
                Some(expression) => {
                    let case_type = self
                        .host
                        .case_clause_type(expression)
                        .or_else(|| self.expression_type(expression))
                        .unwrap_or(TypeId::UNKNOWN);
                    interner.regular_type_of(case_type)
                }
                None => TypeId::NEVER,
            })
            .collect();
        self.switch_links
            .borrow_mut()
            .entry(switch)
            .or_default()
            .switch_types = Some(types.clone());
        types
    }

    /// `typeof` tags of each case in clause order; `""` for `default` or a
    /// repeated tag. `None` when a case is not a string literal.
    pub(crate) fn switch_clause_typeof_witnesses(&self, switch: NodeIndex) -> Option<Rc<[String]>> {
        if let Some(witnesses) = self
            .switch_links
            .borrow()
            .get(&switch)
            .and_then(|links| links.witnesses.clone())
        {
            return witnesses;
        }
        let binder = self.binder;
        let mut witnesses: Vec<String> = Vec::new();
        let mut all_string_literals = true;
        for &clause in self.switch_clauses_of(switch) {
            let text = match self.case_expression(clause) {
                Some(expression) => match binder.arena.kind(expression) {
                    Some(NodeKind::StringLiteral { text }) => binder.atoms.resolve(*text).to_string(),
                    _ => {
                        all_string_literals = false;
                        break;
                    }
                },
                None => String::new(),
            };
            let witness = if !text.is_empty() && !witnesses.contains(&text) {
                text
            } else {
                String::new()
            };
            witnesses.push(witness);
        }
        let result: Option<Rc<[String]>> = all_string_literals.then(|| witnesses.into());
        self.switch_links
            .borrow_mut()
            .entry(switch)
            .or_default()
            .witnesses = Some(result.clone());
        result
    }

    // =========================================================================
    // Exhaustiveness
    // =========================================================================

    /// Whether the cases of `switch` cover every value of its operand, so
    /// that the implicit "no clause matched" path cannot be taken.
    pub(crate) fn is_exhaustive_switch_statement(&self, switch: NodeIndex) -> bool {
        let state = self
            .switch_links
            .borrow()
            .get(&switch)
            .map_or(Exhaustiveness::Unknown, |links| links.exhaustive);
        match state {
            Exhaustiveness::Resolved(exhaustive) => exhaustive,
            Exhaustiveness::Computing => {
                self.set_exhaustiveness(switch, Exhaustiveness::Resolved(false));
                false
            }
            Exhaustiveness::Unknown => {
                self.set_exhaustiveness(switch, Exhaustiveness::Computing);
                let exhaustive = self.compute_exhaustive_switch_statement(switch);
                let mut links = self.switch_links.borrow_mut();
                let links = links.entry(switch).or_default();
                match links.exhaustive {
                    Exhaustiveness::Computing => {
                        links.exhaustive = Exhaustiveness::Resolved(exhaustive);
                        exhaustive
                    }
                    Exhaustiveness::Resolved(resolved) => resolved,
                    Exhaustiveness::Unknown => exhaustive,
                }
            }
        }
    }

    fn set_exhaustiveness(&self, switch: NodeIndex, state: Exhaustiveness) {
        self.switch_links
            .borrow_mut()
            .entry(switch)
            .or_default()
            .exhaustive = state;
    }

    fn compute_exhaustive_switch_statement(&self, switch: NodeIndex) -> bool {
        let arena = &self.binder.arena;
        let Some(NodeKind::SwitchStatement { expression, .. }) = arena.kind(switch) else {
            return false;
        };
        let expression = arena.skip_parentheses(*expression);
        let narrowing = self.narrowing();
        if let Some(NodeKind::TypeOf { expression: operand }) = arena.kind(expression) {
            let Some(witnesses) = self.switch_clause_typeof_witnesses(switch) else {
                return false;
            };
            let Some(operand_type) = self.expression_type(*operand) else {
                return false;
            };
            return narrowing.is_exhaustive_typeof_switch(operand_type, &witnesses);
        }
        let Some(operand_type) = self.expression_type(expression) else {
            return false;
        };
        let types = self.switch_clause_types(switch);
        let exhaustive = narrowing.is_exhaustive_literal_switch(operand_type, &types);
        trace!(switch = switch.0, exhaustive, "exhaustive switch");
        exhaustive
    }
}
