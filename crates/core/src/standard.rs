//! The standard grammar: C-like punctuation, string and char literals with
//! escapes, decimal and hexadecimal numbers, brackets, line and block
//! comments, and the arithmetic/relational/logical operators.

use crate::context::{ContextKind, DEFAULT_WHITESPACE};
use crate::delim::{Delim, OperatorDef, ResolveFn, SyntaxFn};
use crate::grammar::GrammarBuilder;
use crate::operators::{binary_syntax, prefix_syntax};
use crate::ops;
use crate::rules;

/// Context names registered by [`standard_builder`].
pub mod names {
    pub const DEFAULT: &str = "default";
    pub const STRING: &str = "string";
    pub const CHAR: &str = "char";
    pub const NUMBER: &str = "number";
    pub const HEX: &str = "0x";
    pub const PAREN: &str = "()";
    pub const BRACKET: &str = "[]";
    pub const BRACE: &str = "{}";
    pub const LINE_COMMENT: &str = "//";
    /// Documentation line comment.
    pub const DOC_COMMENT: &str = "///";
    pub const BLOCK_COMMENT: &str = "/**/";

    pub const POWER: &str = "power";
    pub const PRODUCT: &str = "product";
    pub const QUOTIENT: &str = "quotient";
    pub const MODULUS: &str = "modulus";
    pub const SUM: &str = "sum";
    pub const DIFFERENCE: &str = "difference";
    pub const LESS: &str = "less than";
    pub const GREATER: &str = "greater than";
    pub const LESS_EQUAL: &str = "less than or equal";
    pub const GREATER_EQUAL: &str = "greater than or equal";
    pub const EQUAL: &str = "equal";
    pub const NOT_EQUAL: &str = "not equal";
    pub const AND: &str = "logical and";
    pub const OR: &str = "logical or";
    pub const NOT: &str = "logical not";
}

/// Precedence orders; lower binds tighter.
pub mod order {
    pub const NOT: u32 = 10;
    pub const POWER: u32 = 20;
    pub const MULTIPLICATIVE: u32 = 30;
    pub const ADDITIVE: u32 = 40;
    pub const RELATIONAL: u32 = 60;
    pub const EQUALITY: u32 = 70;
    pub const AND: u32 = 110;
    pub const OR: u32 = 120;
}

struct StandardOp {
    text: &'static str,
    context: &'static str,
    precedence: u32,
    syntax: SyntaxFn,
    resolve: ResolveFn,
}

const OPERATORS: &[StandardOp] = &[
    StandardOp { text: "!", context: names::NOT, precedence: order::NOT, syntax: prefix_syntax, resolve: ops::not },
    StandardOp { text: "^^", context: names::POWER, precedence: order::POWER, syntax: binary_syntax, resolve: ops::power },
    StandardOp { text: "*", context: names::PRODUCT, precedence: order::MULTIPLICATIVE, syntax: binary_syntax, resolve: ops::product },
    StandardOp { text: "/", context: names::QUOTIENT, precedence: order::MULTIPLICATIVE, syntax: binary_syntax, resolve: ops::quotient },
    StandardOp { text: "%", context: names::MODULUS, precedence: order::MULTIPLICATIVE, syntax: binary_syntax, resolve: ops::modulus },
    StandardOp { text: "+", context: names::SUM, precedence: order::ADDITIVE, syntax: binary_syntax, resolve: ops::sum },
    StandardOp { text: "-", context: names::DIFFERENCE, precedence: order::ADDITIVE, syntax: binary_syntax, resolve: ops::difference },
    StandardOp { text: "<", context: names::LESS, precedence: order::RELATIONAL, syntax: binary_syntax, resolve: ops::less },
    StandardOp { text: ">", context: names::GREATER, precedence: order::RELATIONAL, syntax: binary_syntax, resolve: ops::greater },
    StandardOp { text: "<=", context: names::LESS_EQUAL, precedence: order::RELATIONAL, syntax: binary_syntax, resolve: ops::less_equal },
    StandardOp { text: ">=", context: names::GREATER_EQUAL, precedence: order::RELATIONAL, syntax: binary_syntax, resolve: ops::greater_equal },
    StandardOp { text: "==", context: names::EQUAL, precedence: order::EQUALITY, syntax: binary_syntax, resolve: ops::equal },
    StandardOp { text: "!=", context: names::NOT_EQUAL, precedence: order::EQUALITY, syntax: binary_syntax, resolve: ops::not_equal },
    StandardOp { text: "&&", context: names::AND, precedence: order::AND, syntax: binary_syntax, resolve: ops::and },
    StandardOp { text: "||", context: names::OR, precedence: order::OR, syntax: binary_syntax, resolve: ops::or },
];

const PUNCTUATION: &[&str] = &[
    "?", ":", "??", ";", ",", ".", "->", "::", "?.", "++", "--", "~", "&", "|", "<<", ">>", "^",
    "+=", "-=", "*=", "/=", "%=", "|=", "&=", "<<=", ">>=", "??=", "=", "=>",
];

/// Delimiters shared by the default context and the bracket contexts.
fn code_delimiters() -> Vec<Delim> {
    let mut delims: Vec<Delim> = vec![
        Delim::toggles("\"", names::STRING),
        Delim::toggles("'", names::CHAR),
        Delim::opens("(", names::PAREN),
        Delim::opens("[", names::BRACKET),
        Delim::opens("{", names::BRACE),
        Delim::closes(")", names::PAREN),
        Delim::closes("]", names::BRACKET),
        Delim::closes("}", names::BRACE),
        Delim::opens("//", names::LINE_COMMENT),
        Delim::opens("///", names::DOC_COMMENT),
        Delim::opens("/*", names::BLOCK_COMMENT),
        Delim::within("-", names::NUMBER)
            .with_rule(rules::decimal)
            .with_predicate(rules::starts_signed_number),
        Delim::within(".", names::NUMBER)
            .with_rule(rules::decimal)
            .with_predicate(rules::starts_fraction),
        Delim::within("0x", names::HEX)
            .with_rule(rules::hexadecimal)
            .with_predicate(rules::starts_number),
    ];
    for digit in ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"] {
        delims.push(
            Delim::within(digit, names::NUMBER)
                .with_rule(rules::decimal)
                .with_predicate(rules::starts_number),
        );
    }
    delims.extend(PUNCTUATION.iter().map(|p| Delim::plain(*p)));
    delims.extend(OPERATORS.iter().map(|op| {
        Delim::operator(
            op.text,
            OperatorDef {
                precedence: op.precedence,
                context: op.context.to_owned(),
                syntax: op.syntax,
                resolve: op.resolve,
            },
        )
        .named(op.context)
    }));
    delims
}

/// A builder preloaded with the standard contexts and delimiters. Hosts may
/// register more before calling `build()`.
pub fn standard_builder() -> GrammarBuilder {
    let mut b = GrammarBuilder::new();
    let default = b.context(names::DEFAULT, ContextKind::Default);
    let string = b.context(names::STRING, ContextKind::Text);
    let chr = b.context(names::CHAR, ContextKind::Text);
    b.context(names::NUMBER, ContextKind::Number);
    b.context(names::HEX, ContextKind::Number);
    let paren = b.context(names::PAREN, ContextKind::Group);
    let bracket = b.context(names::BRACKET, ContextKind::Enclosure);
    let brace = b.context(names::BRACE, ContextKind::Enclosure);
    let line = b.context(names::LINE_COMMENT, ContextKind::Comment);
    let doc = b.context(names::DOC_COMMENT, ContextKind::Comment);
    let block = b.context(names::BLOCK_COMMENT, ContextKind::Comment);
    for op in OPERATORS {
        b.context(op.context, ContextKind::Operator);
    }

    b.delimiters(default, code_delimiters());
    b.delimiters(paren, code_delimiters());
    b.delimiters(bracket, code_delimiters());
    b.delimiters(brace, code_delimiters());

    b.whitespace(string, &[]).delimiters(
        string,
        [
            Delim::plain("\\").with_rule(rules::unescape),
            Delim::toggles("\"", names::STRING),
            Delim::closes_with_error("\n", names::STRING, "missing closing token").hidden(),
        ],
    );
    b.whitespace(chr, &[]).resolver(chr, ops::char_literal).delimiters(
        chr,
        [
            Delim::plain("\\").with_rule(rules::unescape),
            Delim::toggles("'", names::CHAR),
            Delim::closes_with_error("\n", names::CHAR, "missing closing token").hidden(),
        ],
    );
    for (context, name) in [(line, names::LINE_COMMENT), (doc, names::DOC_COMMENT)] {
        b.whitespace(context, &[]).delimiters(
            context,
            [
                Delim::plain("\\").with_rule(rules::comment_escape),
                Delim::closes("\n", name).hidden(),
                Delim::closes("\r", name).hidden(),
            ],
        );
    }
    b.whitespace(block, &DEFAULT_WHITESPACE).delimiters(
        block,
        [
            Delim::opens("/*", names::BLOCK_COMMENT),
            Delim::closes("*/", names::BLOCK_COMMENT),
        ],
    );
    b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;

    #[test]
    fn every_standard_context_is_registered() {
        let g = Grammar::standard();
        for name in [
            names::DEFAULT,
            names::STRING,
            names::CHAR,
            names::NUMBER,
            names::HEX,
            names::PAREN,
            names::BRACKET,
            names::BRACE,
            names::LINE_COMMENT,
            names::DOC_COMMENT,
            names::BLOCK_COMMENT,
            names::POWER,
            names::LESS_EQUAL,
            names::NOT,
        ] {
            assert!(g.context_named(name).is_some(), "missing context {}", name);
        }
        assert_eq!(g.default_context(), g.context_named(names::DEFAULT).unwrap());
    }

    #[test]
    fn operator_lookup_prefers_longest() {
        let g = Grammar::standard();
        let default = g.default_context();
        let d = g.delimiter_at(default, "a <= b", 2).unwrap();
        assert_eq!(g.delim(d).text, "<=");
        let op = g.operator(d).unwrap();
        assert_eq!(op.precedence, order::RELATIONAL);
        assert_eq!(g.context_name(g.target(d).unwrap()), names::LESS_EQUAL);
    }

    #[test]
    fn minus_is_number_or_operator_by_position() {
        let g = Grammar::standard();
        let default = g.default_context();
        let d = g.delimiter_at(default, "a -1", 2).unwrap();
        assert!(g.delim(d).parse_rule.is_some());
        let d = g.delimiter_at(default, "8-3", 1).unwrap();
        assert!(g.operator(d).is_some());
    }

    #[test]
    fn same_level_operators_share_an_order() {
        let by_text = |t: &str| OPERATORS.iter().find(|o| o.text == t).unwrap().precedence;
        assert_eq!(by_text("+"), by_text("-"));
        assert_eq!(by_text("*"), by_text("%"));
        assert!(by_text("^^") < by_text("*"));
        assert!(by_text("&&") < by_text("||"));
    }

    #[test]
    fn closers_are_delimiters_in_every_code_context() {
        let g = Grammar::standard();
        for context in [names::DEFAULT, names::PAREN, names::BRACKET, names::BRACE] {
            let id = g.context_named(context).unwrap();
            for closer in [")", "]", "}"] {
                let d = g.delimiter_at(id, closer, 0).unwrap();
                assert!(g.delim(d).context_role().is_some_and(|r| r.end && !r.start));
            }
        }
    }

    #[test]
    fn triple_slash_opens_a_doc_comment() {
        let g = Grammar::standard();
        let d = g.delimiter_at(g.default_context(), "/// docs", 0).unwrap();
        assert_eq!(g.context_name(g.target(d).unwrap()), names::DOC_COMMENT);
    }
}
