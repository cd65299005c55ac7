//! Lexical contexts and their first-character delimiter lookup table.

use crate::delim::{Delim, DelimId, ResolveFn};
use crate::grammar::ContextId;

/// Whitespace used by contexts that do not set their own.
pub const DEFAULT_WHITESPACE: [char; 4] = [' ', '\t', '\n', '\r'];

/// Broad role of a context, used when walking the token forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKind {
    Default,
    /// String and char literals; their entries unescape to text.
    Text,
    Number,
    /// Parenthesized expression group; resolves to the value of its terms.
    Group,
    /// Structural brackets such as `[]` and `{}`.
    Enclosure,
    Comment,
    /// Synthetic context of a folded operator.
    Operator,
}

#[derive(Debug, Clone)]
pub struct Context {
    id: ContextId,
    name: String,
    kind: ContextKind,
    whitespace: Vec<char>,
    delimiters: Vec<DelimId>,
    resolver: Option<ResolveFn>,
    min_char: u32,
    max_char: u32,
    // first_char - min_char -> first candidate in `delimiters`
    lookup: Vec<Option<u32>>,
}

impl Context {
    pub(crate) fn new(id: ContextId, name: &str, kind: ContextKind) -> Self {
        Context {
            id,
            name: name.to_owned(),
            kind,
            whitespace: DEFAULT_WHITESPACE.to_vec(),
            delimiters: Vec::new(),
            resolver: None,
            min_char: 1,
            max_char: 0,
            lookup: Vec::new(),
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    pub fn whitespace(&self) -> &[char] {
        &self.whitespace
    }

    pub fn is_whitespace(&self, c: char) -> bool {
        self.whitespace.contains(&c)
    }

    pub fn delimiters(&self) -> &[DelimId] {
        &self.delimiters
    }

    pub fn resolver(&self) -> Option<ResolveFn> {
        self.resolver
    }

    pub(crate) fn set_whitespace(&mut self, whitespace: &[char]) {
        self.whitespace = whitespace.to_vec();
    }

    pub(crate) fn set_resolver(&mut self, resolver: ResolveFn) {
        self.resolver = Some(resolver);
    }

    pub(crate) fn push_delimiter(&mut self, id: DelimId) {
        self.delimiters.push(id);
    }

    /// Sort the delimiter list and rebuild the lookup table. `delims` is the
    /// grammar-wide delimiter arena.
    pub(crate) fn index(&mut self, delims: &[Delim]) {
        self.delimiters
            .sort_by(|a, b| delims[a.index()].lookup_order(&delims[b.index()]));

        let firsts: Vec<u32> = self
            .delimiters
            .iter()
            .filter_map(|id| delims[id.index()].first_char())
            .map(|c| c as u32)
            .collect();
        let (Some(&min), Some(&max)) = (firsts.iter().min(), firsts.iter().max()) else {
            self.min_char = 1;
            self.max_char = 0;
            self.lookup.clear();
            return;
        };
        self.min_char = min;
        self.max_char = max;
        self.lookup = vec![None; (max - min + 1) as usize];
        for (i, id) in self.delimiters.iter().enumerate() {
            if let Some(c) = delims[id.index()].first_char() {
                let slot = &mut self.lookup[(c as u32 - min) as usize];
                if slot.is_none() {
                    *slot = Some(i as u32);
                }
            }
        }
    }

    /// The delimiter matching `text` at byte offset `index`, if any.
    pub fn delimiter_at(&self, delims: &[Delim], text: &str, index: usize) -> Option<DelimId> {
        let c = text.get(index..)?.chars().next()?;
        let code = c as u32;
        if code < self.min_char || code > self.max_char {
            return None;
        }
        let first = self.lookup[(code - self.min_char) as usize]? as usize;
        for id in &self.delimiters[first..] {
            let delim = &delims[id.index()];
            if delim.first_char() != Some(c) {
                break;
            }
            if delim.is_at(text, index) {
                return Some(*id);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> Vec<Delim> {
        vec![
            Delim::plain("="),
            Delim::plain("=="),
            Delim::plain("("),
            Delim::plain("=>"),
            Delim::plain("/"),
            Delim::plain("//"),
        ]
    }

    fn indexed(delims: &[Delim]) -> Context {
        let mut ctx = Context::new(ContextId(0), "test", ContextKind::Default);
        for i in 0..delims.len() {
            ctx.push_delimiter(DelimId(i as u32));
        }
        ctx.index(delims);
        ctx
    }

    #[test]
    fn longest_match_wins() {
        let delims = arena();
        let ctx = indexed(&delims);
        let found = ctx.delimiter_at(&delims, "a == b", 2).unwrap();
        assert_eq!(delims[found.index()].text, "==");
        let found = ctx.delimiter_at(&delims, "a = b", 2).unwrap();
        assert_eq!(delims[found.index()].text, "=");
        let found = ctx.delimiter_at(&delims, "// x", 0).unwrap();
        assert_eq!(delims[found.index()].text, "//");
    }

    #[test]
    fn out_of_range_chars_miss() {
        let delims = arena();
        let ctx = indexed(&delims);
        assert!(ctx.delimiter_at(&delims, "abc", 0).is_none());
        assert!(ctx.delimiter_at(&delims, " ", 0).is_none());
        // '<' lies inside the table range but has no candidates
        assert!(ctx.delimiter_at(&delims, "<", 0).is_none());
        assert!(ctx.delimiter_at(&delims, "=", 3).is_none());
    }

    #[test]
    fn empty_context_matches_nothing() {
        let delims = arena();
        let mut ctx = Context::new(ContextId(0), "sum", ContextKind::Operator);
        ctx.index(&delims);
        assert!(ctx.delimiter_at(&delims, "=", 0).is_none());
    }
}
