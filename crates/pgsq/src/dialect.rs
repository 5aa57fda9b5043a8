//! Identifier quoting and placeholder conventions.

use serde::{Deserialize, Serialize};

/// Positional placeholder style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placeholder {
    /// `$1`, `$2`, ... (PostgreSQL)
    Numbered,
    /// `?` for every parameter (MySQL, SQLite)
    QuestionMark,
}

/// SQL dialect conventions honored by the renderer.
///
/// Only [`Dialect::POSTGRES`] can be executed through this crate; other dialects exist so the
/// renderer can produce SQL text for them (golden tests, code generation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialect {
    /// Identifier quote character.
    pub quote: char,
    /// Placeholder token style.
    pub placeholder: Placeholder,
}

impl Dialect {
    pub const POSTGRES: Dialect = Dialect {
        quote: '"',
        placeholder: Placeholder::Numbered,
    };

    pub const MYSQL: Dialect = Dialect {
        quote: '`',
        placeholder: Placeholder::QuestionMark,
    };

    /// Write the placeholder for the 1-based parameter `index`.
    pub(crate) fn write_placeholder(&self, out: &mut String, index: usize) {
        match self.placeholder {
            Placeholder::Numbered => {
                out.push('$');
                out.push_str(&index.to_string());
            }
            Placeholder::QuestionMark => out.push('?'),
        }
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::POSTGRES
    }
}
