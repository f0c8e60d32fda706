use idassert_assertion::{parse, AssertionExpression};
use idassert_core::{config::Config, Proof, ProofSet, ServiceDirectory};
use proptest::prelude::*;

fn proofs(pairs: &[(&str, &str)]) -> ProofSet {
    pairs.iter().map(|(k, v)| Proof::new(k, *v)).collect()
}

fn parsed(input: &str) -> AssertionExpression {
    parse(&ServiceDirectory::baseline(), input).expect("assertion parses")
}

#[test]
fn web_and_twitter_assertion_matches() {
    let expr = parsed("web://maxk.org && twitter://maxtaco");
    let ps = proofs(&[("http", "maxk.org"), ("reddit", "maxtaco"), ("twitter", "maxtaco")]);
    assert!(expr.match_set(&ps));
}

#[test]
fn nested_assertion_accepts_good_sets_and_rejects_bad_ones() {
    let expr = parsed(concat!(
        "web://maxk.org && (https://foo.com || http://bar.com) ",
        "&& (bb@twitter || max || fingerprint://aabbcc)",
    ));

    let good = [
        proofs(&[("dns", "maxk.org"), ("https", "bar.com"), ("twitter", "bb")]),
        proofs(&[
            ("dns", "maxk.org"),
            ("https", "bar.com"),
            ("twitter", "bb"),
            ("github", "xxx"),
            ("keybase", "yyy"),
        ]),
        proofs(&[("dns", "maxk.org"), ("http", "bar.com"), ("keybase", "max")]),
        proofs(&[
            ("https", "maxk.org"),
            ("https", "foo.com"),
            ("fingerprint", "00aabbcc"),
        ]),
    ];
    for (i, ps) in good.iter().enumerate() {
        assert!(expr.match_set(ps), "good set {} should match", i);
    }

    let bad = [
        proofs(&[
            ("dns", "max.org"),
            ("http", "bar.com"),
            ("twitter", "bb"),
            ("github", "xxx"),
            ("keybase", "yyy"),
        ]),
        proofs(&[
            ("dns", "maxk.org"),
            ("http", "bar.com"),
            ("twitter", "bbb"),
            ("github", "xxx"),
            ("keybase", "yyy"),
        ]),
        proofs(&[("dns", "maxk.org"), ("https", "foo.org"), ("twitter", "bb")]),
        proofs(&[
            ("https", "maxk.org"),
            ("https", "foo.com"),
            ("fingerprint", "00aabbcce"),
        ]),
        proofs(&[("http", "foo.com"), ("https", "bar.com"), ("twitter", "bb")]),
        proofs(&[("dns", "maxk.org"), ("http", "foo.com"), ("keybase", "max")]),
    ];
    for (i, ps) in bad.iter().enumerate() {
        assert!(!expr.match_set(ps), "bad set {} should not match", i);
    }
}

#[test]
fn top_level_or_matches_each_alternative() {
    let expr = parsed(
        "web:maxk.org+max,malgorithms+https:nutflex.com+fingerprint:aabbcc,samwise+dns:match.com",
    );
    assert!(matches!(&expr, AssertionExpression::Or(terms) if terms.len() == 3));

    assert!(expr.match_set(&proofs(&[("https", "maxk.org"), ("keybase", "max")])));
    assert!(expr.match_set(&proofs(&[
        ("https", "nutflex.com"),
        ("fingerprint", "2233aabbcc"),
        ("keybase", "malgorithms"),
    ])));
    assert!(expr.match_set(&proofs(&[("keybase", "samwise"), ("dns", "match.com")])));
    assert!(!expr.match_set(&proofs(&[("keybase", "max")])));
    assert!(!expr.match_set(&proofs(&[("keybase", "samwise"), ("http", "match.com")])));
}

#[test]
fn web_is_satisfied_by_any_site_proof() {
    let web = parsed("web://maxk.org");
    for key in ["dns", "http", "https"] {
        assert!(web.match_set(&proofs(&[(key, "maxk.org")])), "{}", key);
    }
    assert!(web.match_set(&proofs(&[("dns", "MaxK.org")])));
    assert!(!web.match_set(&proofs(&[("twitter", "maxk.org")])));

    let https = parsed("https://maxk.org");
    assert!(!https.match_set(&proofs(&[("http", "maxk.org")])));
    assert!(https.match_set(&proofs(&[("https", "maxk.org")])));

    let dns = parsed("dns://maxk.org");
    assert!(!dns.match_set(&proofs(&[("https", "maxk.org")])));
}

#[test]
fn fingerprint_matches_on_suffix() {
    let fp = parsed("fingerprint://aabbcc");
    assert!(fp.match_set(&proofs(&[("fingerprint", "00aabbcc")])));
    assert!(fp.match_set(&proofs(&[("fingerprint", "00AABBCC")])));
    assert!(!fp.match_set(&proofs(&[("fingerprint", "00aabbcce")])));

    let empty = parsed("fingerprint:");
    assert!(!empty.match_set(&proofs(&[("fingerprint", "00aabbcc")])));
}

#[test]
fn case_rules_follow_the_directory() {
    let hn = parsed("MaxTaco@hackernews");
    assert!(hn.match_set(&proofs(&[("hackernews", "MaxTaco")])));
    assert!(!hn.match_set(&proofs(&[("hackernews", "maxtaco")])));

    let gh = parsed("MaxTaco@github");
    assert!(gh.match_set(&proofs(&[("github", "maxtaco")])));
    assert!(gh.match_set(&proofs(&[("github", "MAXTACO")])));
}

#[test]
fn unregistered_services_never_match() -> anyhow::Result<()> {
    let baseline = ServiceDirectory::baseline();
    let expr = parse(&baseline, "max@mastodon")?;
    assert!(!expr.match_set(&proofs(&[("mastodon", "max")])));

    let extended = Config::from_toml_str(
        r#"
        [[directory.services]]
        name = "mastodon"
        "#,
    )?
    .service_directory()?;
    let expr = parse(&extended, "Max@mastodon")?;
    assert!(expr.match_set(&proofs(&[("mastodon", "max")])));
    Ok(())
}

#[test]
fn parsed_expressions_are_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AssertionExpression>();
    assert_send_sync::<ProofSet>();

    let expr = parsed("web://maxk.org && (bb@twitter || max)");
    let sets = [
        (proofs(&[("dns", "maxk.org"), ("twitter", "bb")]), true),
        (proofs(&[("dns", "maxk.org"), ("keybase", "max")]), true),
        (proofs(&[("dns", "maxk.org")]), false),
        (proofs(&[("twitter", "bb")]), false),
    ];
    std::thread::scope(|scope| {
        for (ps, expected) in &sets {
            let expr = &expr;
            scope.spawn(move || assert_eq!(expr.match_set(ps), *expected));
        }
    });
}

/// Reference model for generated expressions.
#[derive(Debug, Clone)]
enum Tree {
    Leaf(usize),
    And(Box<Tree>, Box<Tree>),
    Or(Box<Tree>, Box<Tree>),
}

const LEAVES: usize = 6;

impl Tree {
    fn render(&self, and_op: &str, or_op: &str) -> String {
        match self {
            Tree::Leaf(i) => format!("user{}@twitter", i),
            Tree::And(a, b) => format!(
                "({} {} {})",
                a.render(and_op, or_op),
                and_op,
                b.render(and_op, or_op)
            ),
            Tree::Or(a, b) => format!(
                "({} {} {})",
                a.render(and_op, or_op),
                or_op,
                b.render(and_op, or_op)
            ),
        }
    }

    fn eval(&self, present: &[bool]) -> bool {
        match self {
            Tree::Leaf(i) => present[*i],
            Tree::And(a, b) => a.eval(present) && b.eval(present),
            Tree::Or(a, b) => a.eval(present) || b.eval(present),
        }
    }
}

fn tree_strategy() -> impl Strategy<Value = Tree> {
    let leaf = (0..LEAVES).prop_map(Tree::Leaf);
    leaf.prop_recursive(5, 48, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Tree::And(Box::new(a), Box::new(b))),
            (inner.clone(), inner).prop_map(|(a, b)| Tree::Or(Box::new(a), Box::new(b))),
        ]
    })
}

fn present_set(present: &[bool]) -> ProofSet {
    present
        .iter()
        .enumerate()
        .filter(|&(_, &p)| p)
        .map(|(i, _)| Proof::new("twitter", format!("user{}", i)))
        .collect()
}

proptest! {
    #[test]
    fn prop_parsed_expression_is_a_simplify_fixed_point(tree in tree_strategy()) {
        let expr = parsed(&tree.render("&&", "||"));
        let once = expr.clone().simplify();
        prop_assert_eq!(&once, &expr);
        prop_assert_eq!(once.clone().simplify(), once);
    }

    #[test]
    fn prop_parsing_is_pure(
        tree in tree_strategy(),
        present in proptest::collection::vec(any::<bool>(), LEAVES),
    ) {
        let input = tree.render("+", ",");
        let first = parsed(&input);
        let second = parsed(&input);
        let ps = present_set(&present);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.match_set(&ps), second.match_set(&ps));
    }

    #[test]
    fn prop_match_set_is_boolean_and_or(
        tree in tree_strategy(),
        present in proptest::collection::vec(any::<bool>(), LEAVES),
        symbolic in any::<bool>(),
    ) {
        let (and_op, or_op) = if symbolic { ("&&", "||") } else { ("+", ",") };
        let expr = parsed(&tree.render(and_op, or_op));
        prop_assert_eq!(expr.match_set(&present_set(&present)), tree.eval(&present));
    }

    #[test]
    fn prop_and_binds_tighter_than_or(
        leaves in proptest::collection::vec(0..LEAVES, 1..8),
        ops in proptest::collection::vec(any::<bool>(), 7),
        present in proptest::collection::vec(any::<bool>(), LEAVES),
    ) {
        let mut input = format!("user{}@twitter", leaves[0]);
        // Sum of products: OR splits groups, AND joins within one.
        let mut groups = vec![vec![leaves[0]]];
        for (i, &leaf) in leaves.iter().enumerate().skip(1) {
            if ops[i - 1] {
                input.push_str(" && ");
                if let Some(group) = groups.last_mut() {
                    group.push(leaf);
                }
            } else {
                input.push_str(" || ");
                groups.push(vec![leaf]);
            }
            input.push_str(&format!("user{}@twitter", leaf));
        }
        let expected = groups.iter().any(|g| g.iter().all(|&i| present[i]));

        let expr = parsed(&input);
        prop_assert_eq!(expr.match_set(&present_set(&present)), expected);
    }
}
