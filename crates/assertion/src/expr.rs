//! The assertion expression tree and its evaluation.

use std::fmt;

use idassert_core::{Proof, ProofSet};

use crate::url::AssertionUrl;

/// A parsed assertion.
///
/// Immutable once built and safe to share across threads; evaluating it
/// never touches shared state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssertionExpression {
    /// A single `(service, value)` requirement.
    Url(AssertionUrl),
    /// Every factor must hold.
    And(Vec<AssertionExpression>),
    /// At least one term must hold.
    Or(Vec<AssertionExpression>),
}

impl AssertionExpression {
    /// Evaluate against a proof set. AND and OR short-circuit.
    pub fn match_set(&self, ps: &ProofSet) -> bool {
        match self {
            AssertionExpression::Url(url) => url.match_set(ps),
            AssertionExpression::And(factors) => factors.iter().all(|f| f.match_set(ps)),
            AssertionExpression::Or(terms) => terms.iter().any(|t| t.match_set(ps)),
        }
    }

    /// Flatten nested same-operator nodes into their parent.
    ///
    /// `simplify(simplify(e)) == simplify(e)`.
    pub fn simplify(self) -> Self {
        match self {
            AssertionExpression::Url(_) => self,
            AssertionExpression::And(factors) => {
                let mut flat = Vec::with_capacity(factors.len());
                for factor in factors {
                    match factor.simplify() {
                        AssertionExpression::And(inner) => flat.extend(inner),
                        other => flat.push(other),
                    }
                }
                AssertionExpression::And(flat)
            }
            AssertionExpression::Or(terms) => {
                let mut flat = Vec::with_capacity(terms.len());
                for term in terms {
                    match term.simplify() {
                        AssertionExpression::Or(inner) => flat.extend(inner),
                        other => flat.push(other),
                    }
                }
                AssertionExpression::Or(flat)
            }
        }
    }

    /// AND two simplified operands, flattening only the top level.
    pub(crate) fn join_and(self, rhs: Self) -> Self {
        let mut factors = match self {
            AssertionExpression::And(factors) => factors,
            other => vec![other],
        };
        match rhs {
            AssertionExpression::And(inner) => factors.extend(inner),
            other => factors.push(other),
        }
        AssertionExpression::And(factors)
    }

    /// OR two simplified operands, flattening only the top level.
    pub(crate) fn join_or(self, rhs: Self) -> Self {
        let mut terms = match self {
            AssertionExpression::Or(terms) => terms,
            other => vec![other],
        };
        match rhs {
            AssertionExpression::Or(inner) => terms.extend(inner),
            other => terms.push(other),
        }
        AssertionExpression::Or(terms)
    }

    /// Whether any OR appears in the tree.
    pub fn has_or(&self) -> bool {
        match self {
            AssertionExpression::Url(_) => false,
            AssertionExpression::And(factors) => factors.iter().any(|f| f.has_or()),
            AssertionExpression::Or(_) => true,
        }
    }

    /// Whether rendering this node inside an AND would need parentheses.
    pub fn needs_parens(&self) -> bool {
        match self {
            AssertionExpression::Url(_) => false,
            AssertionExpression::And(factors) => factors.iter().any(|f| f.has_or()),
            AssertionExpression::Or(terms) => terms.iter().any(|t| t.needs_parens()),
        }
    }

    /// All leaves, left to right.
    pub fn collect_urls(&self) -> Vec<&AssertionUrl> {
        let mut urls = Vec::new();
        self.collect_urls_into(&mut urls);
        urls
    }

    fn collect_urls_into<'a>(&'a self, urls: &mut Vec<&'a AssertionUrl>) {
        match self {
            AssertionExpression::Url(url) => urls.push(url),
            AssertionExpression::And(children) | AssertionExpression::Or(children) => {
                for child in children {
                    child.collect_urls_into(urls);
                }
            }
        }
    }

    /// Whether `proof` on its own satisfies one of this node's AND factors.
    ///
    /// A node that is not an AND is treated as its own single factor.
    pub fn has_factor(&self, proof: &Proof) -> bool {
        let ps = ProofSet::new(vec![proof.clone()]);
        match self {
            AssertionExpression::And(factors) => factors.iter().any(|f| f.match_set(&ps)),
            other => other.match_set(&ps),
        }
    }

    /// Number of direct children (1 for a leaf).
    pub fn len(&self) -> usize {
        match self {
            AssertionExpression::Url(_) => 1,
            AssertionExpression::And(children) | AssertionExpression::Or(children) => {
                children.len()
            }
        }
    }

    /// Whether this is an AND or OR with no children.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for AssertionExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssertionExpression::Url(url) => write!(f, "{}", url),
            AssertionExpression::And(factors) => {
                for (i, factor) in factors.iter().enumerate() {
                    if i > 0 {
                        f.write_str("+")?;
                    }
                    if matches!(factor, AssertionExpression::Or(_)) {
                        write!(f, "({})", factor)?;
                    } else {
                        write!(f, "{}", factor)?;
                    }
                }
                Ok(())
            }
            AssertionExpression::Or(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", term)?;
                }
                Ok(())
            }
        }
    }
}

/// Pick the leaf best suited to look the identity up by.
///
/// Preference: keybase username, then fingerprint, then a social account,
/// then whatever leaf comes first.
pub fn find_best_identify_component(expr: &AssertionExpression) -> Option<&AssertionUrl> {
    let urls = expr.collect_urls();
    let mut keybase = None;
    let mut fingerprint = None;
    let mut social = None;

    for &url in &urls {
        if url.is_keybase() {
            keybase = Some(url);
        } else if url.is_fingerprint() {
            fingerprint = fingerprint.or(Some(url));
        } else if url.is_social() {
            social = social.or(Some(url));
        }
    }

    keybase
        .or(fingerprint)
        .or(social)
        .or_else(|| urls.first().copied())
}

/// Split leaves into remotely provable ones and local ones.
pub fn collect_assertions(expr: &AssertionExpression) -> (Vec<&AssertionUrl>, Vec<&AssertionUrl>) {
    expr.collect_urls().into_iter().partition(|url| url.is_remote())
}
