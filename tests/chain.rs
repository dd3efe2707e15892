use rewrite_rules::{
    Action, ActionRegistry, ActionResult, Behavior, Condition, Context, Mutation, ParamKind,
    RuleSetBuilder, Selector, SkipLoading,
};

#[test]
fn targets_feed_later_rules() {
    let ruleset = RuleSetBuilder::new()
        .rule("^/old/(.*)$", |r| r.to("/legacy/$1"))
        .rule("^/legacy/(.*)\\.html$", |r| r.to("/pages/$1"))
        .rule("^/unrelated$", |r| r.to("/nope"))
        .compile(&SkipLoading);

    let outcome = ruleset.process("/old/about.html", &mut Context::new()).unwrap();
    assert_eq!(outcome.target(), Some("/pages/about"));
    assert_eq!(outcome.matched(), &[0, 1]);
    assert!(!outcome.stopped());
}

#[test]
fn nothing_matches() {
    let ruleset = RuleSetBuilder::new()
        .rule("^/a$", |r| r.to("/b"))
        .compile(&SkipLoading);
    let outcome = ruleset.process("/z", &mut Context::new()).unwrap();
    assert_eq!(outcome.target(), None);
    assert!(outcome.matched().is_empty());
}

#[test]
fn mutation_only_rule_does_not_consume_the_path() {
    let ruleset = RuleSetBuilder::new()
        .rule("^/shop/", |r| r.mutation(Mutation::attribute("section", "shop")))
        .rule("^/shop/(.*)$", |r| r.to("/store/$1"))
        .compile(&SkipLoading);
    let mut ctx = Context::new();
    let outcome = ruleset.process("/shop/cart", &mut ctx).unwrap();
    assert_eq!(outcome.target(), Some("/store/cart"));
    assert_eq!(outcome.matched(), &[0, 1]);
    assert_eq!(ctx.get(&Selector::Attribute("section".into())), Some("shop"));
}

#[test]
fn stop_rule_ends_the_chain() {
    let ruleset = RuleSetBuilder::new()
        .rule("^/admin", |r| {
            r.to("null")
                .condition(Condition::user_in_role("admin").not_equal())
                .mutation(Mutation::status("403"))
        })
        .rule("^/admin/(.*)$", |r| r.to("/console/$1"))
        .compile(&SkipLoading);

    let mut ctx = Context::new();
    let outcome = ruleset.process("/admin/users", &mut ctx).unwrap();
    assert!(outcome.stopped());
    assert_eq!(outcome.target(), None);
    assert_eq!(ctx.response().status, Some(403));

    let mut ctx = Context::new().role("admin");
    let outcome = ruleset.process("/admin/users", &mut ctx).unwrap();
    assert!(!outcome.stopped());
    assert_eq!(outcome.target(), Some("/console/users"));
}

#[test]
fn terminal_rule_ends_the_chain() {
    let ruleset = RuleSetBuilder::new()
        .rule("^/a$", |r| r.to("/b").terminal(true))
        .rule("^/b$", |r| r.to("/c"))
        .compile(&SkipLoading);
    let outcome = ruleset.process("/a", &mut Context::new()).unwrap();
    assert_eq!(outcome.target(), Some("/b"));
    assert_eq!(outcome.matched(), &[0]);
}

#[test]
fn action_results_are_collected() {
    let registry = ActionRegistry::new().register(
        Behavior::builder("stamp", || ())
            .method("run", &[ParamKind::Request, ParamKind::Response], |_, _| {
                Ok(Some(ActionResult::new("stamped")))
            })
            .build(),
    );
    let ruleset = RuleSetBuilder::new()
        .rule("^/a$", |r| r.to("/b").action(Action::new("stamp")))
        .rule("^/b$", |r| r.action(Action::new("stamp")))
        .compile(&registry);
    let outcome = ruleset.process("/a", &mut Context::new()).unwrap();
    assert_eq!(outcome.action_results().len(), 2);
}

#[test]
fn invalid_rules_are_skipped() {
    let ruleset = RuleSetBuilder::new()
        .rule("^/a$", |r| r.to("/b"))
        .rule("(", |r| r.to("/broken"))
        .rule("^/b$", |r| r.to("/c"))
        .compile(&SkipLoading);
    assert_eq!(ruleset.valid_count(), 2);
    let outcome = ruleset.process("/a", &mut Context::new()).unwrap();
    assert_eq!(outcome.target(), Some("/c"));
}

#[test]
fn detailed_report() {
    let ruleset = RuleSetBuilder::new()
        .rule("^/a$", |r| r.to("/b").name("start"))
        .rule("^/x$", |r| r.to("/y"))
        .rule("^/b$", |r| r.to("null"))
        .rule("^/b$", |r| r.to("/unreached"))
        .compile(&SkipLoading);
    let report = ruleset.process_detailed("/a", &mut Context::new()).unwrap();
    assert_eq!(report.fired(), &["start", "Rule 2"]);
    assert_eq!(report.evaluation_order(), &["start", "Rule 1", "Rule 2"]);
    assert!(report.outcome().stopped());
    assert_eq!(report.steps()[0].rewritten_to.as_deref(), Some("/b"));
    assert!(!report.steps()[1].fired);
    let trace = report.to_string();
    assert!(trace.starts_with("start => /b\nRule 2 (no rewrite)\n"));
    assert!(trace.contains("stopped at /b after 2 of 3 rules"));
}
