//! Recursive-descent parser with two precedence tiers.
//!
//! ```text
//! expr   := term (OR term)*
//! term   := factor (AND factor)*
//! factor := URL | '(' expr ')'
//! ```
//!
//! Each combination step merges into the top level of its left operand, so
//! `a+b+c+d` becomes one flat AND instead of a left-leaning chain. Groups
//! nest at most [`MAX_NESTING`] deep.

use idassert_core::ServiceDirectory;
use tracing::debug;

use crate::error::{ParseError, ParseErrorKind, Result};
use crate::expr::AssertionExpression;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::url::AssertionUrl;

/// Deepest parenthesis nesting accepted.
pub const MAX_NESTING: usize = 256;

/// Parser options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Reject bare names that do not name a service.
    pub strict: bool,
    /// Reject OR operators.
    pub and_only: bool,
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token<'a>,
    directory: &'a ServiceDirectory,
    options: ParseOptions,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(directory: &'a ServiceDirectory, input: &'a str, options: ParseOptions) -> Result<Self> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            directory,
            options,
            depth: 0,
        })
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn error<T>(&self, position: usize, kind: ParseErrorKind) -> Result<T> {
        Err(ParseError::new(position, kind))
    }

    /// `after_op` is the offset of the operator this operand follows, if any.
    fn parse_expr(&mut self, after_op: Option<usize>) -> Result<AssertionExpression> {
        let mut lhs = self.parse_term(after_op)?;
        while self.current.kind == TokenKind::Or {
            let op = self.current.position;
            if self.options.and_only {
                return self.error(op, ParseErrorKind::OrNotAllowed);
            }
            self.advance()?;
            let rhs = self.parse_term(Some(op))?;
            lhs = lhs.join_or(rhs);
        }
        Ok(lhs)
    }

    fn parse_term(&mut self, after_op: Option<usize>) -> Result<AssertionExpression> {
        let mut lhs = self.parse_factor(after_op)?;
        while self.current.kind == TokenKind::And {
            let op = self.current.position;
            self.advance()?;
            let rhs = self.parse_factor(Some(op))?;
            lhs = lhs.join_and(rhs);
        }
        Ok(lhs)
    }

    fn parse_factor(&mut self, after_op: Option<usize>) -> Result<AssertionExpression> {
        let Token { kind, position } = self.current;
        match kind {
            TokenKind::Url(text) => {
                let url = AssertionUrl::from_token(self.directory, text, self.options.strict)
                    .map_err(|kind| ParseError::new(position, kind))?;
                self.advance()?;
                Ok(AssertionExpression::Url(url))
            }
            TokenKind::LParen => {
                if self.depth == MAX_NESTING {
                    return self.error(position, ParseErrorKind::NestingTooDeep);
                }
                self.advance()?;
                match self.current.kind {
                    TokenKind::RParen => return self.error(position, ParseErrorKind::EmptyGroup),
                    TokenKind::Eof => return self.error(position, ParseErrorKind::UnclosedParen),
                    _ => {}
                }
                self.depth += 1;
                let inner = self.parse_expr(None)?;
                self.depth -= 1;
                match self.current.kind {
                    TokenKind::RParen => {
                        self.advance()?;
                        Ok(inner)
                    }
                    TokenKind::Eof => self.error(position, ParseErrorKind::UnclosedParen),
                    _ => self.error(self.current.position, ParseErrorKind::UnexpectedToken),
                }
            }
            TokenKind::And | TokenKind::Or => {
                self.error(after_op.unwrap_or(position), ParseErrorKind::DanglingOperator)
            }
            TokenKind::RParen => match after_op {
                Some(op) => self.error(op, ParseErrorKind::DanglingOperator),
                None => self.error(position, ParseErrorKind::UnmatchedParen),
            },
            TokenKind::Eof => match after_op {
                Some(op) => self.error(op, ParseErrorKind::DanglingOperator),
                None => self.error(position, ParseErrorKind::EmptyExpression),
            },
        }
    }

    fn finish(&self) -> Result<()> {
        match self.current.kind {
            TokenKind::Eof => Ok(()),
            TokenKind::RParen => self.error(self.current.position, ParseErrorKind::UnmatchedParen),
            _ => self.error(self.current.position, ParseErrorKind::UnexpectedToken),
        }
    }
}

/// Parse an assertion with explicit options.
pub fn parse_with(
    directory: &ServiceDirectory,
    input: &str,
    options: ParseOptions,
) -> Result<AssertionExpression> {
    let mut parser = Parser::new(directory, input, options)?;
    let expr = parser.parse_expr(None)?;
    parser.finish()?;
    debug!("Parsed assertion {:?} as {}", input, expr);
    Ok(expr)
}

/// Parse an assertion. Bare names are keybase usernames.
///
/// # Example
/// ```
/// use idassert_assertion::parse;
/// use idassert_core::{Proof, ProofSet, ServiceDirectory};
///
/// let directory = ServiceDirectory::baseline();
/// let expr = parse(&directory, "web://maxk.org && twitter://maxtaco")?;
/// let proofs = ProofSet::new(vec![
///     Proof::new("http", "maxk.org"),
///     Proof::new("twitter", "maxtaco"),
/// ]);
/// assert!(expr.match_set(&proofs));
/// # Ok::<(), idassert_assertion::ParseError>(())
/// ```
pub fn parse(directory: &ServiceDirectory, input: &str) -> Result<AssertionExpression> {
    parse_with(directory, input, ParseOptions::default())
}

/// Parse an assertion in which every leaf must name its service.
pub fn parse_strict(directory: &ServiceDirectory, input: &str) -> Result<AssertionExpression> {
    parse_with(
        directory,
        input,
        ParseOptions {
            strict: true,
            ..ParseOptions::default()
        },
    )
}

/// Parse an assertion that may only combine leaves with AND.
pub fn parse_and_only(directory: &ServiceDirectory, input: &str) -> Result<AssertionExpression> {
    parse_with(
        directory,
        input,
        ParseOptions {
            and_only: true,
            ..ParseOptions::default()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir() -> ServiceDirectory {
        ServiceDirectory::baseline()
    }

    fn err(input: &str) -> ParseError {
        parse(&dir(), input).unwrap_err()
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let e = parse(&dir(), "a1 || b1 && c1").unwrap();
        assert_eq!(e.to_string(), "a1,b1+c1");
        match e {
            AssertionExpression::Or(terms) => {
                assert_eq!(terms.len(), 2);
                assert!(matches!(terms[1], AssertionExpression::And(_)));
            }
            other => panic!("expected OR, got {:?}", other),
        }
    }

    #[test]
    fn test_long_chains_are_flat() {
        let e = parse(&dir(), "a1 && b1 && c1 && d1 + e1").unwrap();
        assert!(matches!(&e, AssertionExpression::And(f) if f.len() == 5));

        let e = parse(&dir(), "a1, b1 || c1, (d1, e1)").unwrap();
        assert!(matches!(&e, AssertionExpression::Or(t) if t.len() == 5));
    }

    #[test]
    fn test_parens_override_precedence() {
        let e = parse(&dir(), "(a1 || b1) && c1").unwrap();
        assert_eq!(e.to_string(), "(a1,b1)+c1");
    }

    #[test]
    fn test_whitespace_is_insignificant() {
        let a = parse(&dir(), "  web://maxk.org&&( bb@twitter ,max )").unwrap();
        let b = parse(&dir(), "web://maxk.org && (bb@twitter, max)").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_error_positions() {
        assert_eq!(err(""), ParseError::new(0, ParseErrorKind::EmptyExpression));
        assert_eq!(err("   "), ParseError::new(3, ParseErrorKind::EmptyExpression));
        assert_eq!(err("max &&"), ParseError::new(4, ParseErrorKind::DanglingOperator));
        assert_eq!(err("&& max"), ParseError::new(0, ParseErrorKind::DanglingOperator));
        assert_eq!(err("max + + bob"), ParseError::new(4, ParseErrorKind::DanglingOperator));
        assert_eq!(err("(max,)"), ParseError::new(4, ParseErrorKind::DanglingOperator));
        assert_eq!(err("(max"), ParseError::new(0, ParseErrorKind::UnclosedParen));
        assert_eq!(err("("), ParseError::new(0, ParseErrorKind::UnclosedParen));
        assert_eq!(err("max)"), ParseError::new(3, ParseErrorKind::UnmatchedParen));
        assert_eq!(err(")"), ParseError::new(0, ParseErrorKind::UnmatchedParen));
        assert_eq!(err("()"), ParseError::new(0, ParseErrorKind::EmptyGroup));
        assert_eq!(err("max bob"), ParseError::new(4, ParseErrorKind::UnexpectedToken));
        assert_eq!(err("(max bob)"), ParseError::new(5, ParseErrorKind::UnexpectedToken));
        assert_eq!(err("max | bob"), ParseError::new(4, ParseErrorKind::UnexpectedChar('|')));
        assert_eq!(
            err("bob + twitter:(a@b"),
            ParseError::new(14, ParseErrorKind::UnterminatedName)
        );
    }

    #[test]
    fn test_leaf_errors_carry_token_position() {
        let e = err("max + dns:");
        assert_eq!(e.position, 6);
        assert!(matches!(e.kind, ParseErrorKind::InvalidValue(_)));

        let e = err("max, foo@");
        assert_eq!(
            e,
            ParseError::new(5, ParseErrorKind::InvalidIdentity("foo@".to_string()))
        );
    }

    #[test]
    fn test_nesting_limit() {
        let at_limit = format!("{}max{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert_eq!(parse(&dir(), &at_limit).unwrap().to_string(), "max");

        let over = format!(
            "{}max{}",
            "(".repeat(MAX_NESTING + 1),
            ")".repeat(MAX_NESTING + 1)
        );
        assert_eq!(
            err(&over),
            ParseError::new(MAX_NESTING, ParseErrorKind::NestingTooDeep)
        );

        let huge = format!("{}max{}", "(".repeat(100_000), ")".repeat(100_000));
        assert_eq!(
            err(&huge),
            ParseError::new(MAX_NESTING, ParseErrorKind::NestingTooDeep)
        );
    }

    #[test]
    fn test_long_chain_parses_flat() {
        let n = 20_000;
        let input = (0..n)
            .map(|i| format!("(u{}@twitter,v{}@github)", i, i))
            .collect::<Vec<_>>()
            .join("+");
        let e = parse(&dir(), &input).unwrap();
        match &e {
            AssertionExpression::And(factors) => {
                assert_eq!(factors.len(), n);
                assert!(factors
                    .iter()
                    .all(|f| matches!(f, AssertionExpression::Or(t) if t.len() == 2)));
            }
            other => panic!("expected AND, got {:?}", other),
        }
        assert_eq!(e.clone().simplify(), e);
    }

    #[test]
    fn test_strict_mode() {
        assert!(parse_strict(&dir(), "max@keybase + bb@twitter").is_ok());
        let e = parse_strict(&dir(), "bb@twitter + max").unwrap_err();
        assert_eq!(
            e,
            ParseError::new(13, ParseErrorKind::MissingService("max".to_string()))
        );
    }

    #[test]
    fn test_and_only_mode() {
        assert!(parse_and_only(&dir(), "max + bb@twitter && dns:a.io").is_ok());
        let e = parse_and_only(&dir(), "max + (bb@twitter || dns:a.io)").unwrap_err();
        assert_eq!(e, ParseError::new(18, ParseErrorKind::OrNotAllowed));
    }

    #[test]
    fn test_display_reparses_equivalently() {
        let input = "web://maxk.org && (twitter:(a+b) || max) && fingerprint:aabbcc";
        let e = parse(&dir(), input).unwrap();
        let rendered = e.to_string();
        assert_eq!(rendered, "maxk.org@web+((a+b)@twitter,max)+aabbcc@fingerprint");
        let again = parse(&dir(), &rendered).unwrap();
        assert_eq!(again.to_string(), rendered);
    }
}
