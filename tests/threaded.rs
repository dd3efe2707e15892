use std::sync::Arc;
use std::thread;

use rewrite_rules::{Condition, Context, RuleSetBuilder, SkipLoading};

#[test]
fn process_across_threads() {
    let ruleset = Arc::new(
        RuleSetBuilder::new()
            .rule("^/products/([0-9]+)$", |r| r.to("/product?id=$1"))
            .rule("^/product", |r| {
                r.to("/m$0")
                    .condition(Condition::header("user-agent", "mobile"))
            })
            .rule("^/private", |r| r.to("null"))
            .compile(&SkipLoading),
    );

    let mut handles = vec![];

    // desktop product page
    let rs = Arc::clone(&ruleset);
    handles.push(thread::spawn(move || {
        let mut ctx = Context::new().header("user-agent", "Firefox");
        rs.process("/products/7", &mut ctx).unwrap()
    }));

    // mobile product page
    let rs = Arc::clone(&ruleset);
    handles.push(thread::spawn(move || {
        let mut ctx = Context::new().header("user-agent", "Mobile Safari");
        rs.process("/products/8", &mut ctx).unwrap()
    }));

    // stopped
    let rs = Arc::clone(&ruleset);
    handles.push(thread::spawn(move || {
        rs.process("/private/x", &mut Context::new()).unwrap()
    }));

    // untouched
    let rs = Arc::clone(&ruleset);
    handles.push(thread::spawn(move || {
        rs.process("/about", &mut Context::new()).unwrap()
    }));

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results[0].target(), Some("/product?id=7"));
    assert_eq!(results[1].target(), Some("/m/product?id=8"));
    assert!(results[2].stopped());
    assert_eq!(results[3].target(), None);
}

#[test]
fn toggle_while_shared() {
    let ruleset = Arc::new(
        RuleSetBuilder::new()
            .rule("^/a$", |r| r.to("/b"))
            .compile(&SkipLoading),
    );
    ruleset.rules()[0].set_enabled(false);

    let rs = Arc::clone(&ruleset);
    let outcome = thread::spawn(move || rs.process("/a", &mut Context::new()).unwrap())
        .join()
        .unwrap();
    assert_eq!(outcome.target(), None);

    ruleset.rules()[0].set_enabled(true);
    let outcome = ruleset.process("/a", &mut Context::new()).unwrap();
    assert_eq!(outcome.target(), Some("/b"));
}
