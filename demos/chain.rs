use std::sync::atomic::{AtomicUsize, Ordering};

use rewrite_rules::{
    Action, ActionRegistry, ActionResult, Behavior, BoxError, Condition, Context, Mutation,
    ParamKind, RequestContext, RuleSetBuilder,
};

struct HitCounter {
    hits: AtomicUsize,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("rewrite_rules=debug")),
        )
        .init();

    let registry = ActionRegistry::new().register(
        Behavior::builder("counter", || HitCounter {
            hits: AtomicUsize::new(0),
        })
        .method(
            "count",
            &[ParamKind::Request, ParamKind::Response, ParamKind::Chain],
            |counter, inv| {
                let hits = counter.hits.fetch_add(1, Ordering::Relaxed) + 1;
                inv.proceed()?;
                Ok(Some(ActionResult::new(hits)))
            },
        )
        .build(),
    );

    let ruleset = RuleSetBuilder::new()
        .rule("/blog/**", |r| r.wildcard().to("/archive/$1").name("blog"))
        .rule("^/archive/(.*)$", |r| {
            r.to("/m/archive/$1")
                .condition(Condition::header("user-agent", "mobile"))
                .mutation(Mutation::header("Vary", "User-Agent"))
        })
        .rule("^/admin", |r| {
            r.to("null")
                .condition(Condition::user_in_role("admin").not_equal())
                .mutation(Mutation::status("403"))
        })
        .rule(".*", |r| r.action(Action::new("counter").method("count")))
        .compile(&registry);

    println!("{ruleset}");

    let mut downstream = |_ctx: &mut dyn RequestContext| -> Result<(), BoxError> {
        println!("  downstream handler reached");
        Ok(())
    };

    let requests = [
        ("/blog/2024/hello", Context::new().header("user-agent", "Mobile Safari")),
        ("/blog/2024/hello", Context::new().header("user-agent", "Firefox")),
        ("/admin/users", Context::new()),
        ("/admin/users", Context::new().role("admin")),
    ];
    for (path, mut ctx) in requests {
        println!("{path}:");
        match ruleset.process_with_chain(path, &mut ctx, &mut downstream) {
            Ok(outcome) => {
                println!("  target: {:?}, stopped: {}", outcome.target(), outcome.stopped());
                println!("  response: {:?}", ctx.response());
            }
            Err(e) => println!("  error: {e}"),
        }
    }

    let mut ctx = Context::new();
    match ruleset.process_detailed("/blog/intro", &mut ctx) {
        Ok(report) => println!("{report}"),
        Err(e) => println!("error: {e}"),
    }
}
