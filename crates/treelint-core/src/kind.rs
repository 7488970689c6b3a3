//! Element kinds of the syntax tree.

use serde::{Deserialize, Serialize};

/// The kind tag of a tree node.
///
/// Composite kinds own children; leaf kinds own text. The split is fixed per
/// kind, see [`ElementKind::is_leaf`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    // Composite kinds
    /// Root of every tree.
    File,
    /// `package a.b.c`
    PackageDirective,
    /// `import a.b.C`
    ImportDirective,
    /// `val x = ...` or `var x = ...`
    PropertyDeclaration,
    /// `fun name(...) { ... }`
    FunctionDeclaration,
    /// Any other statement.
    Statement,
    /// `{ ... }`
    Block,
    /// `( ... )`
    Parenthesized,
    /// `[ ... ]`
    Bracketed,

    // Leaf kinds
    /// `package`
    PackageKeyword,
    /// `import`
    ImportKeyword,
    /// `var`
    VarKeyword,
    /// `val`
    ValKeyword,
    /// `fun`
    FunKeyword,
    /// Identifier or any non-reserved word.
    Identifier,
    /// Numeric literal.
    NumberLiteral,
    /// Double quoted string literal.
    StringLiteral,
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `;`
    Semicolon,
    /// Single operator character such as `=` or `+`.
    Operator,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// Run of spaces, tabs and newlines.
    Whitespace,
    /// `// ...` up to (not including) the line break.
    EolComment,
    /// `/* ... */`
    BlockComment,
}

impl ElementKind {
    /// Returns true if nodes of this kind carry text instead of children.
    #[must_use]
    pub fn is_leaf(self) -> bool {
        !matches!(
            self,
            Self::File
                | Self::PackageDirective
                | Self::ImportDirective
                | Self::PropertyDeclaration
                | Self::FunctionDeclaration
                | Self::Statement
                | Self::Block
                | Self::Parenthesized
                | Self::Bracketed
        )
    }

    /// Returns true for whitespace.
    #[must_use]
    pub fn is_whitespace(self) -> bool {
        self == Self::Whitespace
    }

    /// Returns true for both comment kinds.
    #[must_use]
    pub fn is_comment(self) -> bool {
        matches!(self, Self::EolComment | Self::BlockComment)
    }

    /// Returns true for anything that is neither whitespace nor a comment.
    #[must_use]
    pub fn is_code(self) -> bool {
        !self.is_whitespace() && !self.is_comment()
    }

    /// Keyword kind for a reserved word, if any.
    #[must_use]
    pub fn keyword(word: &str) -> Option<Self> {
        match word {
            "package" => Some(Self::PackageKeyword),
            "import" => Some(Self::ImportKeyword),
            "var" => Some(Self::VarKeyword),
            "val" => Some(Self::ValKeyword),
            "fun" => Some(Self::FunKeyword),
            _ => None,
        }
    }

    /// Closing bracket kind matching an opening one.
    #[must_use]
    pub fn closing(self) -> Option<Self> {
        match self {
            Self::LParen => Some(Self::RParen),
            Self::LBrace => Some(Self::RBrace),
            Self::LBracket => Some(Self::RBracket),
            _ => None,
        }
    }

    /// Returns true for `)`, `}` and `]`.
    #[must_use]
    pub fn is_closing(self) -> bool {
        matches!(self, Self::RParen | Self::RBrace | Self::RBracket)
    }
}
