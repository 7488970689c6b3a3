//! Source parsing.
//!
//! The engine only depends on the [`Parser`] trait. [`SourceParser`] is the
//! built-in implementation for a small brace-and-keyword language:
//!
//! ```text
//! File
//!   PackageDirective | ImportDirective | PropertyDeclaration
//!   | FunctionDeclaration | Statement      (one per logical line)
//!   Whitespace | EolComment | BlockComment (between statements)
//! Block / Parenthesized / Bracketed       (bracket groups, nested)
//! ```
//!
//! Statements end at a line break or a `;` outside parentheses and brackets.
//! Trivia that starts a line is attached to the enclosing container instead of
//! a statement. Bracket groups nest at most [`MAX_NESTING_DEPTH`] levels deep.

use miette::{Diagnostic, SourceSpan};

use crate::kind::ElementKind;
use crate::tree::{line_column, NodeId, Tree};

/// Deepest bracket nesting [`SourceParser`] accepts.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Failure to turn source text into a tree. Fatal for the file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Diagnostic)]
#[error("{line}:{column}: {message}")]
#[diagnostic(code(treelint::parse))]
pub struct ParseError {
    /// Line of the error (1-indexed).
    pub line: usize,
    /// Column of the error (1-indexed).
    pub column: usize,
    /// What went wrong.
    pub message: String,
    /// Byte span of the offending input.
    #[label("here")]
    pub span: SourceSpan,
}

impl ParseError {
    fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_column(source, offset);
        Self {
            line,
            column,
            message: message.into(),
            span: SourceSpan::from((offset, 1)),
        }
    }
}

/// Turns source text into a [`Tree`].
pub trait Parser: Send + Sync {
    /// Parses the whole source.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the text is not valid for this grammar.
    fn parse(&self, source: &str) -> Result<Tree, ParseError>;
}

/// Built-in parser, see the module documentation for the grammar.
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceParser;

impl SourceParser {
    /// Creates the parser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Parser for SourceParser {
    fn parse(&self, source: &str) -> Result<Tree, ParseError> {
        let tokens = tokenize(source)?;
        let mut builder = TreeBuilder {
            source,
            tokens,
            pos: 0,
            depth: 0,
            tree: Tree::new(ElementKind::File),
        };
        let root = builder.tree.root();
        builder.sequence(root, None)?;
        if let Some(token) = builder.tokens.get(builder.pos) {
            return Err(ParseError::at(
                source,
                token.start,
                format!("unexpected '{}'", token.text(source)),
            ));
        }
        Ok(builder.tree)
    }
}

#[derive(Debug, Clone, Copy)]
struct Token {
    kind: ElementKind,
    start: usize,
    end: usize,
}

impl Token {
    fn text(self, source: &str) -> &str {
        &source[self.start..self.end]
    }
}

fn is_operator(c: char) -> bool {
    "+-*/%=<>!&|?@#$^~\\'".contains(c)
}

fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let rest = &source[start..];
        let kind = if c == ' ' || c == '\t' || c == '\r' || c == '\n' {
            while chars
                .next_if(|&(_, n)| n == ' ' || n == '\t' || n == '\r' || n == '\n')
                .is_some()
            {}
            ElementKind::Whitespace
        } else if rest.starts_with("//") {
            while chars.next_if(|&(_, n)| n != '\n').is_some() {}
            ElementKind::EolComment
        } else if rest.starts_with("/*") {
            let Some(close) = rest[2..].find("*/") else {
                return Err(ParseError::at(source, start, "unterminated block comment"));
            };
            let end = start + 2 + close + 2;
            while chars.next_if(|&(i, _)| i < end).is_some() {}
            ElementKind::BlockComment
        } else if c == '"' {
            let mut closed = false;
            let mut escaped = false;
            for (_, n) in chars.by_ref() {
                if escaped {
                    escaped = false;
                } else if n == '\\' {
                    escaped = true;
                } else if n == '"' {
                    closed = true;
                    break;
                }
            }
            if !closed {
                return Err(ParseError::at(source, start, "unterminated string literal"));
            }
            ElementKind::StringLiteral
        } else if c.is_ascii_digit() {
            while chars
                .next_if(|&(i, n)| {
                    n.is_alphanumeric()
                        || n == '_'
                        || (n == '.' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit))
                })
                .is_some()
            {}
            ElementKind::NumberLiteral
        } else if c.is_alphabetic() || c == '_' || c == '`' {
            while chars
                .next_if(|&(_, n)| n.is_alphanumeric() || n == '_')
                .is_some()
            {}
            ElementKind::Identifier
        } else {
            match c {
                '.' => ElementKind::Dot,
                ',' => ElementKind::Comma,
                ':' => ElementKind::Colon,
                ';' => ElementKind::Semicolon,
                '(' => ElementKind::LParen,
                ')' => ElementKind::RParen,
                '{' => ElementKind::LBrace,
                '}' => ElementKind::RBrace,
                '[' => ElementKind::LBracket,
                ']' => ElementKind::RBracket,
                c if is_operator(c) => ElementKind::Operator,
                other => {
                    return Err(ParseError::at(
                        source,
                        start,
                        format!("unexpected character {other:?}"),
                    ))
                }
            }
        };
        let end = chars.peek().map_or(source.len(), |&(i, _)| i);
        let kind = if kind == ElementKind::Identifier {
            ElementKind::keyword(&source[start..end]).unwrap_or(kind)
        } else {
            kind
        };
        tokens.push(Token { kind, start, end });
    }

    Ok(tokens)
}

struct TreeBuilder<'s> {
    source: &'s str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    tree: Tree,
}

impl TreeBuilder<'_> {
    fn leaf(&mut self, token: Token) -> NodeId {
        let text = token.text(self.source).to_string();
        self.tree.new_leaf(token.kind, text)
    }

    fn attach(&mut self, parent: NodeId, node: NodeId) -> Result<(), ParseError> {
        self.tree.append_child(parent, node).map_err(|e| {
            ParseError::at(self.source, self.tree.start_offset(parent), e.to_string())
        })
    }

    /// Parses tokens into `container` until `closer` (not consumed) or EOF.
    fn sequence(
        &mut self,
        container: NodeId,
        closer: Option<ElementKind>,
    ) -> Result<(), ParseError> {
        let statements = matches!(
            self.tree.kind(container),
            ElementKind::File | ElementKind::Block
        );
        let mut statement: Option<NodeId> = None;

        while let Some(&token) = self.tokens.get(self.pos) {
            if Some(token.kind) == closer {
                break;
            }
            if token.kind.is_closing() {
                return Err(ParseError::at(
                    self.source,
                    token.start,
                    format!("unexpected '{}'", token.text(self.source)),
                ));
            }

            let ends_line =
                token.kind.is_whitespace() && token.text(self.source).contains('\n');
            if statements && (ends_line || (statement.is_none() && !token.kind.is_code())) {
                if let Some(done) = statement.take() {
                    self.attach(container, done)?;
                }
                let node = self.leaf(token);
                self.attach(container, node)?;
                self.pos += 1;
                continue;
            }

            let target = if statements {
                if let Some(current) = statement {
                    current
                } else {
                    let node = self.tree.new_composite(statement_kind(token.kind));
                    statement = Some(node);
                    node
                }
            } else {
                container
            };

            if let Some(closing) = token.kind.closing() {
                let group = self.group(token, closing)?;
                self.attach(target, group)?;
            } else {
                let node = self.leaf(token);
                self.attach(target, node)?;
                self.pos += 1;
                if statements && token.kind == ElementKind::Semicolon {
                    if let Some(done) = statement.take() {
                        self.attach(container, done)?;
                    }
                }
            }
        }

        if let Some(done) = statement {
            self.attach(container, done)?;
        }
        Ok(())
    }

    fn group(&mut self, opener: Token, closing: ElementKind) -> Result<NodeId, ParseError> {
        if self.depth == MAX_NESTING_DEPTH {
            return Err(ParseError::at(
                self.source,
                opener.start,
                format!("brackets nested deeper than {MAX_NESTING_DEPTH} levels"),
            ));
        }
        self.depth += 1;
        let kind = match opener.kind {
            ElementKind::LBrace => ElementKind::Block,
            ElementKind::LBracket => ElementKind::Bracketed,
            _ => ElementKind::Parenthesized,
        };
        let group = self.tree.new_composite(kind);
        let open = self.leaf(opener);
        self.attach(group, open)?;
        self.pos += 1;

        self.sequence(group, Some(closing))?;

        let Some(&close) = self.tokens.get(self.pos) else {
            return Err(ParseError::at(
                self.source,
                opener.start,
                format!("unclosed '{}'", opener.text(self.source)),
            ));
        };
        let node = self.leaf(close);
        self.attach(group, node)?;
        self.pos += 1;
        self.depth -= 1;
        Ok(group)
    }
}

fn statement_kind(first: ElementKind) -> ElementKind {
    match first {
        ElementKind::PackageKeyword => ElementKind::PackageDirective,
        ElementKind::ImportKeyword => ElementKind::ImportDirective,
        ElementKind::VarKeyword | ElementKind::ValKeyword => ElementKind::PropertyDeclaration,
        ElementKind::FunKeyword => ElementKind::FunctionDeclaration,
        _ => ElementKind::Statement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Tree {
        SourceParser::new().parse(source).unwrap()
    }

    #[test]
    fn round_trips_text() {
        let source = "package a.b\n\nimport c.D\n\n/* c */ fun f(x: Int) {\n    val y = x.plus(1) // one\n}\n";
        assert_eq!(parse(source).to_text(), source);
    }

    #[test]
    fn empty_source_is_empty_file() {
        let tree = parse("");
        assert_eq!(tree.kind(tree.root()), ElementKind::File);
        assert!(tree.children(tree.root()).is_empty());
    }

    #[test]
    fn statement_structure() {
        let tree = parse("var foo = bar.baz(1)\n");
        insta::assert_snapshot!(tree.dump(), @r###"
        File@0..21
          PropertyDeclaration@0..20
            VarKeyword@0..3 "var"
            Whitespace@3..4 " "
            Identifier@4..7 "foo"
            Whitespace@7..8 " "
            Operator@8..9 "="
            Whitespace@9..10 " "
            Identifier@10..13 "bar"
            Dot@13..14 "."
            Identifier@14..17 "baz"
            Parenthesized@17..20
              LParen@17..18 "("
              NumberLiteral@18..19 "1"
              RParen@19..20 ")"
          Whitespace@20..21 "\n"
        "###);
    }

    #[test]
    fn block_statements_and_leading_trivia() {
        let tree = parse("fun f() {\n  // c\n  g()\n}");
        let root = tree.root();
        let fun = tree.children(root)[0];
        assert_eq!(tree.kind(fun), ElementKind::FunctionDeclaration);
        let block = *tree.children(fun).last().unwrap();
        assert_eq!(tree.kind(block), ElementKind::Block);
        let kinds: Vec<ElementKind> = tree
            .children(block)
            .iter()
            .map(|&c| tree.kind(c))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ElementKind::LBrace,
                ElementKind::Whitespace,
                ElementKind::EolComment,
                ElementKind::Whitespace,
                ElementKind::Statement,
                ElementKind::Whitespace,
                ElementKind::RBrace,
            ]
        );
    }

    #[test]
    fn semicolon_ends_statement() {
        let tree = parse("a; b");
        let kinds: Vec<ElementKind> = tree
            .children(tree.root())
            .iter()
            .map(|&c| tree.kind(c))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ElementKind::Statement,
                ElementKind::Whitespace,
                ElementKind::Statement
            ]
        );
    }

    #[test]
    fn number_with_decimal_point() {
        let tree = parse("1.5.toInt()");
        let leaves: Vec<String> = tree
            .leaves(tree.root())
            .into_iter()
            .map(|l| tree.text(l))
            .collect();
        assert_eq!(leaves, vec!["1.5", ".", "toInt", "(", ")"]);
    }

    #[test]
    fn errors_carry_position() {
        let err = SourceParser::new().parse("val x = 1\n/* open").unwrap_err();
        assert_eq!((err.line, err.column), (2, 1));
        assert_eq!(err.message, "unterminated block comment");

        let err = SourceParser::new().parse("f(\n").unwrap_err();
        assert_eq!(err.message, "unclosed '('");

        let err = SourceParser::new().parse("x }").unwrap_err();
        assert_eq!((err.line, err.column), (1, 3));

        let err = SourceParser::new().parse("\"abc").unwrap_err();
        assert_eq!(err.message, "unterminated string literal");
    }

    #[test]
    fn nesting_is_limited() {
        let nested =
            |depth: usize| format!("val x = {}{}\n", "(".repeat(depth), ")".repeat(depth));

        let tree = parse(&nested(MAX_NESTING_DEPTH));
        assert_eq!(tree.to_text(), nested(MAX_NESTING_DEPTH));

        let err = SourceParser::new()
            .parse(&nested(MAX_NESTING_DEPTH + 1))
            .unwrap_err();
        assert_eq!(err.message, "brackets nested deeper than 256 levels");
        assert_eq!((err.line, err.column), (1, 9 + MAX_NESTING_DEPTH));

        let err = SourceParser::new().parse(&nested(2000)).unwrap_err();
        assert_eq!(err.line, 1);
    }
}
