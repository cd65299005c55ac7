//! Operator resolution: folds flat operator tokens into nested operator
//! entries according to precedence.
//!
//! Every operator token in the forest is collected as a path, then paths
//! are processed deepest first, and within a depth by ascending precedence
//! order and position. Each fold moves a run of tokens into a new entry, so
//! pending paths into the same sequence are re-indexed after every fold.

use std::cmp::Reverse;

use crate::delim::DelimId;
use crate::diagnostics::{default_sink, Diagnostics};
use crate::error::ParseError;
use crate::grammar::{ContextId, Grammar};
use crate::token::{EntryId, SeqRef, TokenForest, TokenTag};

/// Where an operator token sits when its syntax callback runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpSite {
    pub seq: SeqRef,
    pub index: usize,
    pub delim: DelimId,
    /// Operator context the folded entry belongs to.
    pub context: ContextId,
}

/// The range a syntax callback folded, reported back so pending paths can
/// be re-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fold {
    pub entry: EntryId,
    pub start: usize,
    pub count: usize,
}

fn is_operand(forest: &TokenForest, seq: SeqRef, index: usize) -> bool {
    match forest.seq(seq).get(index) {
        Some(token) => match token.tag {
            TokenTag::Delim(_) => false,
            TokenTag::Entry(id) => {
                !forest.is_marker(seq, token) && !forest.entry(id).is_comment()
            }
            _ => true,
        },
        None => false,
    }
}

fn interior_bounds(forest: &TokenForest, seq: SeqRef) -> (usize, usize) {
    match seq {
        SeqRef::Root => (0, forest.root().len()),
        SeqRef::Entry(id) => {
            let range = forest.entry(id).interior_range();
            (range.start, range.end)
        }
    }
}

/// Infix operator: folds `left op right`.
pub fn binary_syntax(forest: &mut TokenForest, site: &OpSite) -> Result<Fold, String> {
    let (first, end) = interior_bounds(forest, site.seq);
    if site.index == first || !is_operand(forest, site.seq, site.index - 1) {
        return Err("missing left operand".to_owned());
    }
    if site.index + 1 >= end || !is_operand(forest, site.seq, site.index + 1) {
        return Err("missing right operand".to_owned());
    }
    let start = site.index - 1;
    let entry = forest.fold(site.seq, start, 3, 1, site.context, site.delim);
    Ok(Fold {
        entry,
        start,
        count: 3,
    })
}

/// Prefix operator: folds `op operand`.
pub fn prefix_syntax(forest: &mut TokenForest, site: &OpSite) -> Result<Fold, String> {
    let (_, end) = interior_bounds(forest, site.seq);
    if site.index + 1 >= end || !is_operand(forest, site.seq, site.index + 1) {
        return Err("missing right operand".to_owned());
    }
    let entry = forest.fold(site.seq, site.index, 2, 0, site.context, site.delim);
    Ok(Fold {
        entry,
        start: site.index,
        count: 2,
    })
}

#[derive(Debug, Clone)]
struct Path {
    seq: SeqRef,
    index: usize,
    depth: usize,
    precedence: u32,
}

pub struct OperatorResolver<'g> {
    grammar: &'g Grammar,
    diagnostics: &'g dyn Diagnostics,
}

/// Run the operator pass with the default diagnostics sink.
pub fn resolve_operators(grammar: &Grammar, forest: &mut TokenForest) -> Vec<ParseError> {
    OperatorResolver::new(grammar).resolve(forest)
}

impl<'g> OperatorResolver<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        OperatorResolver {
            grammar,
            diagnostics: default_sink(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: &'g dyn Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    fn collect(&self, forest: &TokenForest) -> Vec<Path> {
        let mut paths = Vec::new();
        let mut pending = vec![SeqRef::Root];
        while let Some(seq) = pending.pop() {
            let depth = forest.depth_of(seq);
            for (index, token) in forest.seq(seq).iter().enumerate() {
                let op = match token.tag {
                    TokenTag::Delim(d) => d,
                    TokenTag::Entry(id) if forest.is_marker(seq, token) => {
                        match forest.entry(id).op {
                            Some(d) => d,
                            None => continue,
                        }
                    }
                    TokenTag::Entry(id) => {
                        pending.push(SeqRef::Entry(id));
                        continue;
                    }
                    _ => continue,
                };
                if let Some(def) = self.grammar.operator(op) {
                    paths.push(Path {
                        seq,
                        index,
                        depth,
                        precedence: def.precedence,
                    });
                }
            }
        }
        // deepest first; within a sequence by precedence then position
        paths.sort_by_key(|p| (Reverse(p.depth), p.precedence, p.index));
        paths
    }

    /// Fold every operator in `forest`. Returns structural errors; a forest
    /// that was already resolved is left unchanged.
    pub fn resolve(&self, forest: &mut TokenForest) -> Vec<ParseError> {
        let mut paths = self.collect(forest);
        let mut errors = Vec::new();

        for k in 0..paths.len() {
            let path = paths[k].clone();
            let Some(token) = forest.seq(path.seq).get(path.index) else {
                continue;
            };
            let offset = token.start;

            let op = match token.tag {
                TokenTag::Entry(id) if forest.is_marker(path.seq, token) => {
                    let entry = forest.entry(id);
                    let expected = entry.op.and_then(|d| self.grammar.target(d));
                    if expected.is_some_and(|ctx| ctx != entry.context) {
                        let expected = expected.map_or("", |ctx| self.grammar.context_name(ctx));
                        let message = format!(
                            "expected context {}, found {}",
                            expected,
                            self.grammar.context_name(entry.context)
                        );
                        errors.push(forest.error_at(offset, message));
                    }
                    continue;
                }
                TokenTag::Delim(d) => d,
                _ => continue,
            };
            let (Some(def), Some(context)) = (self.grammar.operator(op), self.grammar.target(op))
            else {
                continue;
            };
            let site = OpSite {
                seq: path.seq,
                index: path.index,
                delim: op,
                context,
            };
            match (def.syntax)(forest, &site) {
                Ok(fold) => {
                    self.diagnostics.log(&format!(
                        "folded {} at {}",
                        self.grammar.context_name(context),
                        offset
                    ));
                    reindex(&mut paths[k + 1..], path.seq, fold);
                }
                Err(message) => {
                    let error = forest.error_at(offset, message);
                    self.diagnostics.error(&error.to_string());
                    errors.push(error);
                }
            }
        }
        errors
    }
}

fn reindex(paths: &mut [Path], seq: SeqRef, fold: Fold) {
    let end = fold.start + fold.count;
    for path in paths.iter_mut().filter(|p| p.seq == seq) {
        if path.index >= fold.start && path.index < end {
            path.seq = SeqRef::Entry(fold.entry);
            path.index -= fold.start;
        } else if path.index >= end {
            path.index -= fold.count - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn fold(text: &str) -> (TokenForest, Vec<ParseError>) {
        let g = Grammar::standard();
        let mut t = tokenize(g, text);
        assert!(t.success(), "{:?}", t.errors);
        let errors = resolve_operators(g, &mut t.forest);
        (t.forest, errors)
    }

    fn op_context(forest: &TokenForest, index: usize) -> &str {
        let id = forest.root()[index].entry().unwrap();
        Grammar::standard().context_name(forest.entry(id).context)
    }

    #[test]
    fn multiplication_binds_tighter() {
        let (forest, errors) = fold("1 + 2 * 3");
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(forest.root().len(), 1);
        assert_eq!(op_context(&forest, 0), "sum");
        let sum = forest.root()[0].entry().unwrap();
        let right = forest.entry(sum).tokens[2].entry().unwrap();
        assert_eq!(
            Grammar::standard().context_name(forest.entry(right).context),
            "product"
        );
        assert_eq!(forest.entry(right).parent, Some(sum));
    }

    #[test]
    fn same_level_folds_left_to_right() {
        let (forest, errors) = fold("8 - 3 - 2");
        assert!(errors.is_empty(), "{:?}", errors);
        let outer = forest.root()[0].entry().unwrap();
        let left = forest.entry(outer).tokens[0].entry().unwrap();
        assert!(forest.entry(left).is_operator());
        assert_eq!(forest.span_text(left), "8 - 3");
    }

    #[test]
    fn groups_fold_first() {
        let (forest, errors) = fold("(1 + 2) * 3");
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(op_context(&forest, 0), "product");
    }

    #[test]
    fn missing_operands() {
        let (_, errors) = fold("1 +");
        assert_eq!(errors[0].message, "missing right operand");
        let (_, errors) = fold("* 2");
        assert_eq!(errors[0].message, "missing left operand");
        let (_, errors) = fold("(+ 1)");
        assert_eq!(errors[0].message, "missing left operand");
    }

    #[test]
    fn prefix_not() {
        let (forest, errors) = fold("!a && b");
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(op_context(&forest, 0), "logical and");
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let g = Grammar::standard();
        let mut t = tokenize(g, "a * b + c < d && e");
        assert!(resolve_operators(g, &mut t.forest).is_empty());
        let before = t.forest.entries().len();
        let rendered = t.forest.render();
        assert!(resolve_operators(g, &mut t.forest).is_empty());
        assert_eq!(t.forest.entries().len(), before);
        assert_eq!(t.forest.render(), rendered);
    }
}
