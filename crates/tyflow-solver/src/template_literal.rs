//! Matching string text against template literal skeletons.

use crate::intern::TypeInterner;
use crate::types::*;
use std::sync::Arc;

/// Split `source` into the substrings that fill each placeholder of the
/// template with literal parts `texts` (one more text than placeholders).
///
/// Placeholders followed by a non-empty text take the shortest match;
/// adjacent placeholders take a single character each.
pub fn match_template_parts(source: &str, texts: &[Arc<str>]) -> Option<Vec<String>> {
    let (first, rest) = texts.split_first()?;
    let (last, middle) = match rest.split_last() {
        Some((last, middle)) => (last, middle),
        None => return (source == &**first).then(Vec::new),
    };
    if source.len() < first.len() + last.len()
        || !source.starts_with(&**first)
        || !source.ends_with(&**last)
    {
        return None;
    }
    let body = &source[..source.len() - last.len()];
    let mut parts = Vec::with_capacity(middle.len() + 1);
    let mut seg = first.len();
    let mut pos = seg;
    for delim in middle {
        if !delim.is_empty() {
            let found = body.get(pos..)?.find(&**delim)? + pos;
            parts.push(body[seg..found].to_string());
            seg = found + delim.len();
            pos = seg;
        } else {
            let next = body.get(pos..)?.chars().next()?;
            let end = pos + next.len_utf8();
            parts.push(body[seg..end].to_string());
            seg = end;
            pos = end;
        }
    }
    parts.push(body.get(seg..)?.to_string());
    Some(parts)
}

/// Split a source made of literal texts and placeholder types over the
/// texts of a target template, one type per target placeholder.
///
/// A string literal source is one text and no types. Each piece is a
/// string literal when it falls inside one source text and a template
/// literal when it spans source placeholders: `<<${string}>.<${number}>>`
/// over `<${A}.${B}>` gives `<${string}>` and `<${number}>`.
pub fn infer_from_literal_parts(
    interner: &TypeInterner,
    source_texts: &[Arc<str>],
    source_types: &[TypeId],
    target_texts: &[Arc<str>],
) -> Option<Vec<TypeId>> {
    let last_source = source_texts.len().checked_sub(1)?;
    let last_target = target_texts.len().checked_sub(1)?;
    let (source_start, source_end) = (&source_texts[0], &source_texts[last_source]);
    let (target_start, target_end) = (&target_texts[0], &target_texts[last_target]);
    if (last_source == 0 && source_start.len() < target_start.len() + target_end.len())
        || !source_start.starts_with(&**target_start)
        || !source_end.ends_with(&**target_end)
    {
        return None;
    }
    let remaining_end = &source_end[..source_end.len() - target_end.len()];
    let source_text = |index: usize| {
        if index < last_source {
            &*source_texts[index]
        } else {
            remaining_end
        }
    };
    let piece = |seg: usize, pos: usize, s: usize, p: usize| -> Option<TypeId> {
        if s == seg {
            return Some(interner.literal_string(source_text(s).get(pos..p)?));
        }
        let mut texts: Vec<&str> = Vec::with_capacity(s - seg + 1);
        texts.push(source_texts[seg].get(pos..)?);
        texts.extend(source_texts[seg + 1..s].iter().map(|t| &**t));
        texts.push(source_text(s).get(..p)?);
        Some(interner.template_literal(texts, source_types.get(seg..s)?.to_vec()))
    };

    let mut matches = Vec::with_capacity(last_target);
    let mut seg = 0;
    let mut pos = target_start.len();
    for delim in &target_texts[1..last_target] {
        let (s, p) = if !delim.is_empty() {
            let mut s = seg;
            let mut p = pos;
            loop {
                if let Some(found) = source_text(s).get(p..).and_then(|t| t.find(&**delim)) {
                    break (s, p + found);
                }
                s += 1;
                if s == source_texts.len() {
                    return None;
                }
                p = 0;
            }
        } else if pos < source_text(seg).len() {
            let next = source_text(seg).get(pos..)?.chars().next()?;
            (seg, pos + next.len_utf8())
        } else if seg < last_source {
            (seg + 1, 0)
        } else {
            return None;
        };
        matches.push(piece(seg, pos, s, p)?);
        seg = s;
        pos = p + delim.len();
    }
    matches.push(piece(seg, pos, last_source, source_text(last_source).len())?);
    Some(matches)
}

/// Whether `text` is a valid value for a placeholder of type `placeholder`.
pub fn is_text_valid_for_placeholder(interner: &TypeInterner, text: &str, placeholder: TypeId) -> bool {
    match placeholder {
        TypeId::STRING | TypeId::ANY => return true,
        TypeId::NUMBER => return is_numeric_text(text),
        TypeId::BIGINT => return text.parse::<i128>().is_ok(),
        TypeId::NULL => return text == "null",
        TypeId::UNDEFINED => return text == "undefined",
        _ => {}
    }
    match interner.lookup(placeholder) {
        Some(TypeKey::Literal(_) | TypeKey::FreshLiteral(_)) => {
            interner.literal_text(placeholder).as_deref() == Some(text)
        }
        Some(TypeKey::Union(list)) => interner
            .type_list(list)
            .iter()
            .any(|&member| is_text_valid_for_placeholder(interner, text, member)),
        Some(TypeKey::StringIntrinsic { kind, type_arg }) => {
            kind.apply(text) == text && is_text_valid_for_placeholder(interner, text, type_arg)
        }
        Some(TypeKey::TemplateLiteral(id)) => {
            let template = interner.template_literal_type(id);
            let texts: Vec<Arc<str>> = template
                .texts
                .iter()
                .map(|&atom| interner.resolve_atom(atom))
                .collect();
            match match_template_parts(text, &texts) {
                Some(parts) => parts
                    .iter()
                    .zip(template.types.iter())
                    .all(|(part, &ty)| is_text_valid_for_placeholder(interner, part, ty)),
                None => false,
            }
        }
        _ => false,
    }
}

/// Text that round-trips as a number (`"1"`, `"-0.5"`, `"1e3"`), not `" 1"` or `""`.
pub fn is_numeric_text(text: &str) -> bool {
    !text.is_empty() && text.trim() == text && text.parse::<f64>().is_ok_and(|n| n.is_finite())
}

/// Texts of a template literal type, resolved.
pub fn template_texts(interner: &TypeInterner, template: &TemplateLiteralType) -> Vec<Arc<str>> {
    template
        .texts
        .iter()
        .map(|&atom| interner.resolve_atom(atom))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(parts: &[&str]) -> Vec<Arc<str>> {
        parts.iter().map(|&s| Arc::from(s)).collect()
    }

    #[test]
    fn test_match_prefix_and_suffix() {
        let parts = match_template_parts("foo-bar.baz", &texts(&["foo-", ".", ""]));
        assert_eq!(parts, Some(vec!["bar".to_string(), "baz".to_string()]));
    }

    #[test]
    fn test_adjacent_placeholders_take_one_char() {
        let parts = match_template_parts("abc", &texts(&["", "", ""]));
        assert_eq!(parts, Some(vec!["a".to_string(), "bc".to_string()]));
    }

    #[test]
    fn test_literal_parts_span_source_placeholders() {
        let interner = TypeInterner::new();
        let source_types = [TypeId::STRING, TypeId::NUMBER, TypeId::NUMBER];
        let parts = infer_from_literal_parts(
            &interner,
            &texts(&["<<", ">.<", "-", ">>"]),
            &source_types,
            &texts(&["<", ".", ">"]),
        );
        let first = interner.template_literal(vec!["<", ">"], vec![TypeId::STRING]);
        let second = interner.template_literal(vec!["<", "-", ">"], vec![TypeId::NUMBER, TypeId::NUMBER]);
        assert_eq!(parts, Some(vec![first, second]));
    }

    #[test]
    fn test_literal_parts_of_plain_string() {
        let interner = TypeInterner::new();
        let parts = infer_from_literal_parts(&interner, &texts(&["foo-bar"]), &[], &texts(&["foo-", ""]));
        assert_eq!(parts, Some(vec![interner.literal_string("bar")]));
        assert_eq!(
            infer_from_literal_parts(&interner, &texts(&["x"]), &[], &texts(&["foo-", ""])),
            None
        );
    }

    #[test]
    fn test_mismatch_returns_none() {
        assert_eq!(match_template_parts("bar", &texts(&["foo", ""])), None);
        assert!(!is_numeric_text(" 1"));
        assert!(is_numeric_text("1.5"));
    }
}
