//! Template literal type evaluation.
//!
//! Handles TypeScript's template literal types: `\`hello ${T}\``

use crate::evaluate::TypeEvaluator;
use crate::template_literal::template_texts;
use crate::type_queries::union_members;
use crate::types::*;

/// Largest cross product a template literal is expanded into.
pub const TEMPLATE_LITERAL_EXPANSION_LIMIT: usize = 100_000;

impl TypeEvaluator<'_> {
    /// Evaluate a template literal type.
    ///
    /// Placeholders that are unions of literals expand to the union of every
    /// combination: `${"a"|"b"}-${"x"|"y"}` is `"a-x"|"a-y"|"b-x"|"b-y"`.
    pub fn evaluate_template_literal(&mut self, type_id: TypeId, id: TemplateLiteralId) -> TypeId {
        let interner = self.interner();
        let template = interner.template_literal_type(id);
        let texts = template_texts(interner, &template);
        let types: Vec<TypeId> = template.types.iter().map(|&t| self.evaluate(t)).collect();

        let mut choices: Vec<Vec<String>> = Vec::with_capacity(types.len());
        let mut total: usize = 1;
        for &t in &types {
            let members = union_members(interner, t);
            let literal_texts: Option<Vec<String>> =
                members.iter().map(|&m| interner.literal_text(m)).collect();
            let Some(literal_texts) = literal_texts else {
                return self.rebuild_template(type_id, &texts, &template.types, types);
            };
            total = total.saturating_mul(literal_texts.len());
            if total > TEMPLATE_LITERAL_EXPANSION_LIMIT {
                tracing::trace!(type_id = type_id.0, "template literal expansion limit exceeded");
                return self.rebuild_template(type_id, &texts, &template.types, types);
            }
            choices.push(literal_texts);
        }

        let mut results = vec![texts.first().map_or(String::new(), |t| t.to_string())];
        for (index, options) in choices.iter().enumerate() {
            let suffix = texts.get(index + 1).map_or("", |t| &**t);
            results = results
                .iter()
                .flat_map(|prefix| {
                    options
                        .iter()
                        .map(move |option| format!("{prefix}{option}{suffix}"))
                })
                .collect();
        }
        let literals: Vec<TypeId> = results.iter().map(|text| interner.literal_string(text)).collect();
        interner.union(literals)
    }

    fn rebuild_template(
        &self,
        type_id: TypeId,
        texts: &[std::sync::Arc<str>],
        original: &[TypeId],
        evaluated: Vec<TypeId>,
    ) -> TypeId {
        if evaluated.as_slice() == original {
            return type_id;
        }
        self.interner()
            .template_literal(texts.iter().map(|t| &**t).collect(), evaluated)
    }
}
