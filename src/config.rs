use std::fs;
use std::path::Path;

use anyhow::{Context, Result, ensure};

use crate::token::{ReservedWord, TokenKind};

/// Keyword kinds in the canonical order a localization file must follow.
pub const RESERVED_KINDS: [TokenKind; 8] = [
    TokenKind::If,
    TokenKind::Then,
    TokenKind::Else,
    TokenKind::End,
    TokenKind::Repeat,
    TokenKind::Until,
    TokenKind::Read,
    TokenKind::Write,
];

const DEFAULT_SPELLINGS: [&str; 8] = [
    "if", "then", "else", "end", "repeat", "until", "read", "write",
];

pub fn default_reserved() -> Vec<ReservedWord> {
    RESERVED_KINDS
        .iter()
        .zip(DEFAULT_SPELLINGS)
        .map(|(&kind, spelling)| ReservedWord {
            kind,
            spelling: spelling.to_string(),
        })
        .collect()
}

/// Parses a localization file body: eight non-empty lines, one keyword
/// spelling each, in canonical order.
pub fn parse_reserved(text: &str) -> Result<Vec<ReservedWord>> {
    let spellings: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    ensure!(
        spellings.len() == RESERVED_KINDS.len(),
        "config must contain localizations for eight reserved words, found {}",
        spellings.len()
    );
    Ok(RESERVED_KINDS
        .iter()
        .zip(spellings)
        .map(|(&kind, spelling)| ReservedWord {
            kind,
            spelling: spelling.to_string(),
        })
        .collect())
}

pub fn load_reserved(path: &Path) -> Result<Vec<ReservedWord>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse_reserved(&text).with_context(|| format!("invalid config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn default_table_covers_all_keywords() {
        let reserved = default_reserved();
        assert_eq!(reserved.len(), 8);
        assert_eq!(reserved[0].kind, TokenKind::If);
        assert_eq!(reserved[0].spelling, "if");
        assert_eq!(reserved[7].kind, TokenKind::Write);
        assert_eq!(reserved[7].spelling, "write");
        assert!(reserved.iter().all(|word| word.kind.is_reserved()));
    }

    #[test]
    fn parses_localized_table_in_canonical_order() {
        let text = indoc! {"
            ako
            onda
            inace
            kraj
            ponavljaj
            dok
            ucitaj
            ispisi
        "};
        let reserved = parse_reserved(text).expect("parse failed");
        assert_eq!(reserved[0].spelling, "ako");
        assert_eq!(reserved[0].kind, TokenKind::If);
        assert_eq!(reserved[7].spelling, "ispisi");
        assert_eq!(reserved[7].kind, TokenKind::Write);
    }

    #[test]
    fn ignores_blank_lines_and_padding() {
        let text = "if\nthen\nelse\nend\n\nrepeat\n  until  \nread\nwrite\n\n";
        let reserved = parse_reserved(text).expect("parse failed");
        assert_eq!(reserved[5].spelling, "until");
    }

    #[test]
    fn rejects_wrong_line_count() {
        let err = parse_reserved("if\nthen\nelse\n").expect_err("expected config error");
        assert!(
            err.to_string()
                .contains("localizations for eight reserved words")
        );
    }
}
