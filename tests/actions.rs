use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rewrite_rules::{
    Action, ActionRegistry, ActionResolutionError, ActionResult, Arg, Behavior, BoxError,
    Condition, Context, InitError, MutationKind, ParamKind, RequestContext, Rule, RuleOutcome,
    Selector,
};

const REQ_RES: &[ParamKind] = &[ParamKind::Request, ParamKind::Response];
const REQ_RES_CHAIN: &[ParamKind] = &[ParamKind::Request, ParamKind::Response, ParamKind::Chain];

fn recorder_registry() -> ActionRegistry {
    ActionRegistry::new().register(
        Behavior::builder("recorder", || ())
            .method("run", REQ_RES, |_, _| Ok(Some(ActionResult::new("ran"))))
            .method("record", &[ParamKind::Int, ParamKind::Bool], |_, _| Ok(None))
            .method("tag", &[ParamKind::Request, ParamKind::Str], |_, inv| {
                let value = inv.arg(1).and_then(Arg::as_str).unwrap_or_default().to_owned();
                inv.context_mut()
                    .apply(MutationKind::Attribute, Some("tag"), &value);
                Ok(Some(ActionResult::new(value)))
            })
            .method("fail", REQ_RES, |_, _| Err("boom".into()))
            .build(),
    )
}

/// A registry whose `probe.record` method stores every argument list it sees.
fn probe_registry(params: &[ParamKind]) -> (ActionRegistry, Arc<Mutex<Vec<Vec<Arg>>>>) {
    let seen: Arc<Mutex<Vec<Vec<Arg>>>> = Arc::default();
    let sink = Arc::clone(&seen);
    let registry = ActionRegistry::new().register(
        Behavior::builder("probe", || ())
            .method("record", params, move |_, inv| {
                sink.lock().unwrap().push(inv.args().to_vec());
                Ok(None)
            })
            .build(),
    );
    (registry, seen)
}

fn init(rule: Rule, registry: &ActionRegistry) -> Rule {
    let mut rule = rule;
    assert!(rule.initialize(registry), "{:?}", rule.errors());
    rule
}

#[test]
fn default_signature_runs_and_returns_result() {
    let registry = recorder_registry();
    let rule = init(Rule::new("^/a$").action(Action::new("recorder")), &registry);
    let outcome = rule.evaluate(Some("/a"), &mut Context::new()).unwrap();
    match outcome {
        RuleOutcome::MatchedNoRewrite { action_result } => {
            let result = action_result.unwrap();
            assert_eq!(result.downcast_ref::<&str>(), Some(&"ran"));
        }
        other => panic!("unexpected outcome {other}"),
    }
    assert!(!rule.is_filter());
}

#[test]
fn positional_args_follow_primary_then_condition_groups() {
    let (registry, seen) = probe_registry(&[ParamKind::Int, ParamKind::Bool]);
    let rule = init(
        Rule::new("^/item/([0-9]+)$")
            .condition(Condition::header("x-flag", "(true|false)"))
            .action(Action::new("probe").method("record(int, boolean)")),
        &registry,
    );
    let mut ctx = Context::new().header("x-flag", "TRUE");
    let outcome = rule.evaluate(Some("/item/42"), &mut ctx).unwrap();
    assert!(outcome.is_matched());
    assert_eq!(seen.lock().unwrap()[0], vec![Arg::Int(42), Arg::Bool(true)]);
}

#[test]
fn explicit_signature_coerces_and_binds() {
    let (registry, seen) = probe_registry(&[
        ParamKind::Long,
        ParamKind::Str,
        ParamKind::Bool,
        ParamKind::Int,
        ParamKind::Short,
    ]);
    let rule = init(
        Rule::new("^/item/([0-9]+)/([a-z]+)$").action(
            Action::new("probe").method("record(long, String, boolean enabled, Integer, short)"),
        ),
        &registry,
    );
    let mut ctx = Context::new().param("enabled", "true");
    let _ = rule.evaluate(Some("/item/42/abc"), &mut ctx).unwrap();

    assert_eq!(
        seen.lock().unwrap()[0],
        vec![
            Arg::Long(42),
            Arg::Str("abc".into()),
            Arg::Bool(true),
            Arg::Null,
            Arg::Short(0),
        ]
    );
}

#[test]
fn binding_by_selector() {
    let registry = recorder_registry();
    let rule = init(
        Rule::new("^/t$").action(Action::new("recorder").method("tag(req, str header:X-Tag)")),
        &registry,
    );
    let mut ctx = Context::new().header("x-tag", "blue");
    let outcome = rule.evaluate(Some("/t"), &mut ctx).unwrap();
    assert_eq!(
        outcome.action_result().and_then(|r| r.downcast_ref::<String>()),
        Some(&"blue".to_owned())
    );
    assert_eq!(ctx.get(&Selector::Attribute("tag".into())), Some("blue"));
}

#[test]
fn request_and_response_ignore_binding_names() {
    let (registry, seen) = probe_registry(&[ParamKind::Request, ParamKind::Response, ParamKind::Str]);
    let rule = init(
        Rule::new("^/t$").action(
            Action::new("probe").method("record(request header:X-Tag, response x, str header:X-Tag)"),
        ),
        &registry,
    );
    let mut ctx = Context::new().header("x-tag", "blue").param("x", "1");
    let _ = rule.evaluate(Some("/t"), &mut ctx).unwrap();
    assert_eq!(
        seen.lock().unwrap()[0],
        vec![Arg::Request, Arg::Response, Arg::Str("blue".into())]
    );
}

#[test]
fn unknown_behavior_invalidates_rule() {
    let mut rule = Rule::new("^/a$").action(Action::new("nobody"));
    assert!(!rule.initialize(&recorder_registry()));
    assert!(matches!(
        &rule.errors()[0],
        InitError::Action {
            source: ActionResolutionError::UnknownBehavior { name },
            ..
        } if name == "nobody"
    ));
}

#[test]
fn missing_method_invalidates_rule() {
    let mut rule = Rule::new("^/a$").action(Action::new("recorder").method("record(int)"));
    assert!(!rule.initialize(&recorder_registry()));
    assert!(matches!(
        &rule.errors()[0],
        InitError::Action {
            source: ActionResolutionError::NoMatchingSignature { .. },
            ..
        }
    ));
}

#[test]
fn action_failure_propagates() {
    let registry = recorder_registry();
    let rule = init(
        Rule::new("^/a$").to("/b").action(Action::new("recorder").method("fail")),
        &registry,
    );
    let err = rule.evaluate(Some("/a"), &mut Context::new()).unwrap_err();
    assert_eq!(err.action, "recorder");
    assert_eq!(err.method, "fail");
    assert_eq!(err.to_string(), "action 'recorder' failed in 'fail': boom");
}

#[test]
fn filter_action_drives_the_chain() {
    let registry = ActionRegistry::new().register(
        Behavior::builder("gate", || ())
            .method("run", REQ_RES_CHAIN, |_, inv| {
                inv.context_mut().apply(MutationKind::Header, Some("x-gate"), "before");
                inv.proceed()?;
                Ok(None)
            })
            .build(),
    );
    let rule = init(Rule::new("^/a$").action(Action::new("gate")), &registry);
    assert!(rule.is_filter());

    let mut calls = 0;
    let mut chain = |ctx: &mut dyn RequestContext| -> Result<(), BoxError> {
        calls += 1;
        ctx.apply(MutationKind::Header, Some("x-chain"), "after");
        Ok(())
    };
    let mut ctx = Context::new();
    let outcome = rule
        .evaluate_with_chain(Some("/a"), &mut ctx, &mut chain)
        .unwrap();
    assert!(outcome.is_matched());
    assert_eq!(calls, 1);
    assert_eq!(
        ctx.response().headers,
        vec![
            ("x-gate".to_owned(), "before".to_owned()),
            ("x-chain".to_owned(), "after".to_owned()),
        ]
    );
}

static CREATED: AtomicUsize = AtomicUsize::new(0);
static DESTROYED: AtomicUsize = AtomicUsize::new(0);

struct Tracked {
    greeting: String,
}

fn tracked_registry() -> ActionRegistry {
    ActionRegistry::new().register(
        Behavior::builder("tracked", || {
            CREATED.fetch_add(1, Ordering::SeqCst);
            Tracked {
                greeting: String::new(),
            }
        })
        .on_init(|t, params| {
            t.greeting = params.get("greeting").cloned().unwrap_or_default();
            Ok(())
        })
        .on_destroy(|_| {
            DESTROYED.fetch_add(1, Ordering::SeqCst);
        })
        .method("run", REQ_RES, |t, _| Ok(Some(ActionResult::new(t.greeting.clone()))))
        .build(),
    )
}

#[test]
fn instance_lifecycles() {
    let registry = tracked_registry();

    // singleton: constructed once at initialization, destroyed once
    let mut rule = init(
        Rule::new("^/a$").action(Action::new("tracked").init_param("greeting", "hi")),
        &registry,
    );
    let created = CREATED.load(Ordering::SeqCst);
    for _ in 0..3 {
        let outcome = rule.evaluate(Some("/a"), &mut Context::new()).unwrap();
        let greeting = outcome.action_result().and_then(|r| r.downcast_ref::<String>());
        assert_eq!(greeting.map(String::as_str), Some("hi"));
    }
    assert_eq!(CREATED.load(Ordering::SeqCst), created);
    let destroyed = DESTROYED.load(Ordering::SeqCst);
    rule.destroy();
    rule.destroy();
    assert_eq!(DESTROYED.load(Ordering::SeqCst), destroyed + 1);

    // per call: one instance per evaluation, each released afterwards
    let rule = init(
        Rule::new("^/a$").action(Action::new("tracked").per_call(true)),
        &registry,
    );
    let created = CREATED.load(Ordering::SeqCst);
    let destroyed = DESTROYED.load(Ordering::SeqCst);
    for _ in 0..3 {
        let _ = rule.evaluate(Some("/a"), &mut Context::new()).unwrap();
    }
    assert_eq!(CREATED.load(Ordering::SeqCst), created + 3);
    assert_eq!(DESTROYED.load(Ordering::SeqCst), destroyed + 3);
}

#[test]
fn last_result_wins() {
    let registry = ActionRegistry::new().register(
        Behavior::builder("value", || ())
            .method("first", REQ_RES, |_, _| Ok(Some(ActionResult::new(1_u8))))
            .method("second", REQ_RES, |_, _| Ok(None))
            .method("third", REQ_RES, |_, _| Ok(Some(ActionResult::new(3_u8))))
            .build(),
    );
    let rule = init(
        Rule::new("^/a$")
            .action(Action::new("value").method("first"))
            .action(Action::new("value").method("second"))
            .action(Action::new("value").method("third")),
        &registry,
    );
    let outcome = rule.evaluate(Some("/a"), &mut Context::new()).unwrap();
    assert_eq!(
        outcome.action_result().and_then(|r| r.downcast_ref::<u8>()),
        Some(&3)
    );

    let rule = init(
        Rule::new("^/a$")
            .action(Action::new("value").method("first"))
            .action(Action::new("value").method("second")),
        &registry,
    );
    let outcome = rule.evaluate(Some("/a"), &mut Context::new()).unwrap();
    assert_eq!(
        outcome.action_result().and_then(|r| r.downcast_ref::<u8>()),
        Some(&1)
    );
}
