//! Lexical classification tags.

/// Major lexical category. Majors are mutually exclusive buckets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LexMajor {
    #[default]
    None,
    Comment,
    Constant,
    Identifier,
    Statement,
    Package,
    PreProc,
    Type,
    Special,
    Operator,
    Error,
    Todo,
}

impl LexMajor {
    /// Number of major categories, including `None`.
    pub const COUNT: usize = 12;

    /// Every major category, in declaration order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::None,
        Self::Comment,
        Self::Constant,
        Self::Identifier,
        Self::Statement,
        Self::Package,
        Self::PreProc,
        Self::Type,
        Self::Special,
        Self::Operator,
        Self::Error,
        Self::Todo,
    ];
}

/// Minor refinements. Each is only meaningful under its major.
pub mod minor {
    pub const NONE: u8 = 0;

    // Comment
    pub const COMMENT_DOC: u8 = 1;

    // Constant
    pub const CONSTANT_CHAR: u8 = 1;
    pub const CONSTANT_STRING: u8 = 2;
    pub const CONSTANT_NUMBER: u8 = 3;
    pub const CONSTANT_BOOL: u8 = 4;
    pub const CONSTANT_NULL: u8 = 5;

    // Identifier
    pub const IDENTIFIER_FUNCTION: u8 = 1;
    pub const IDENTIFIER_VARIABLE: u8 = 2;

    // Statement
    pub const STATEMENT_CONDITIONAL: u8 = 1;
    pub const STATEMENT_REPEAT: u8 = 2;

    // Type
    pub const TYPE_QUALIFIER: u8 = 1;
    pub const TYPE_OTHER: u8 = 2;
}

/// A (major, minor) pair classifying a token or region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LexTag {
    pub major: LexMajor,
    pub minor: u8,
}

impl LexTag {
    pub const NONE: Self = Self::major(LexMajor::None);
    pub const COMMENT: Self = Self::major(LexMajor::Comment);
    pub const STRING: Self = Self::new(LexMajor::Constant, minor::CONSTANT_STRING);
    pub const CHAR: Self = Self::new(LexMajor::Constant, minor::CONSTANT_CHAR);
    pub const NUMBER: Self = Self::new(LexMajor::Constant, minor::CONSTANT_NUMBER);
    pub const KEYWORD: Self = Self::major(LexMajor::Statement);
    pub const TYPE: Self = Self::major(LexMajor::Type);
    pub const OPERATOR: Self = Self::major(LexMajor::Operator);

    #[must_use]
    pub const fn new(major: LexMajor, minor: u8) -> Self {
        Self { major, minor }
    }

    /// A tag with no minor refinement.
    #[must_use]
    pub const fn major(major: LexMajor) -> Self {
        Self {
            major,
            minor: minor::NONE,
        }
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        self.major == LexMajor::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_tag_constants() {
        assert!(LexTag::NONE.is_none());
        assert_eq!(LexTag::STRING.major, LexMajor::Constant);
        assert_ne!(LexTag::STRING, LexTag::NUMBER);
        assert_eq!(LexTag::COMMENT.minor, minor::NONE);
    }

    #[test]
    fn lex_major_all_is_complete() {
        assert_eq!(LexMajor::ALL.len(), LexMajor::COUNT);
        assert_eq!(LexMajor::ALL[0], LexMajor::None);
        assert_eq!(LexMajor::ALL[LexMajor::COUNT - 1], LexMajor::Todo);
    }

    #[test]
    fn lex_tag_is_copy() {
        fn assert_copy<T: Copy>() {}
        assert_copy::<LexTag>();
    }
}
