use anyhow::Result;
use script_bridge::{
    BlockRenderer, BridgeConfig, BridgeError, HandlebarsJs, HelperCall, HelperSet, NativeMap,
    NativeSeq, TranslationPolicy, Value,
};
use serde_json::json;
use std::io;
use std::rc::Rc;

const HELPERS: &str = r#"
Handlebars.registerHelper('check', function () {
  return this.a == 1 && this.b.length == 2 && this.b[0] == 2 && this.b[1] == 3 ? 'ok' : 'bad';
});
Handlebars.registerHelper('keys', function (obj) { return Object.keys(obj).join(','); });
Handlebars.registerHelper('sum', function (list) {
  var total = 0;
  for (var x of list) { total += x; }
  return total;
});
Handlebars.registerHelper('same', function (a, b) { return a === b; });
Handlebars.registerHelper('presence', function (obj) {
  return [obj.missing === undefined, obj.nothing === null, 'nothing' in obj, 'missing' in obj].join(',');
});
Handlebars.registerHelper('eval_on', function (obj, expr) {
  try {
    return String(new Function('o', 'return ' + expr)(obj));
  } catch (e) {
    return e.name + ': ' + e.message;
  }
});
"#;

fn load(policy: TranslationPolicy) -> Result<HelperSet> {
    let handlebars = HandlebarsJs::new(BridgeConfig::default().with_policy(policy))?;
    let mut helpers = HelperSet::new();
    handlebars.register_helpers(&mut helpers, "helpers.js", HELPERS)?;
    Ok(helpers)
}

fn map(json: serde_json::Value) -> NativeMap {
    match Value::from(json) {
        Value::Map(m) => m,
        other => panic!("expected a mapping, got {other:?}"),
    }
}

fn eval_on(helpers: &HelperSet, target: impl Into<Value>, expr: &str) -> Result<String> {
    let ctx = NativeMap::new();
    let call = HelperCall::new(&ctx).param(target).param(expr);
    Ok(helpers.apply("eval_on", &call)?.unwrap_or_default())
}

#[test]
fn test_context_seen_by_helper() -> Result<()> {
    for policy in [TranslationPolicy::Lazy, TranslationPolicy::Eager] {
        let helpers = load(policy)?;
        let ctx = map(json!({"a": 1, "b": [2, 3]}));
        let out = helpers.apply("check", &HelperCall::new(&ctx))?;
        assert_eq!(out.as_deref(), Some("ok"), "policy {policy}");
    }
    Ok(())
}

#[test]
fn test_key_order_and_iteration() -> Result<()> {
    for policy in [TranslationPolicy::Lazy, TranslationPolicy::Eager] {
        let helpers = load(policy)?;
        let ctx = NativeMap::new();

        let obj = map(json!({"z": 0, "a": 1, "m": 2}));
        let out = helpers.apply("keys", &HelperCall::new(&ctx).param(obj))?;
        assert_eq!(out.as_deref(), Some("z,a,m"));

        let list = Value::from(vec![1, 2, 3, 4]);
        let out = helpers.apply("sum", &HelperCall::new(&ctx).param(list))?;
        assert_eq!(out.as_deref(), Some("10"));
    }
    Ok(())
}

#[test]
fn test_absent_and_null_are_distinct() -> Result<()> {
    let helpers = load(TranslationPolicy::Lazy)?;
    let ctx = NativeMap::new();
    let obj = map(json!({"nothing": null}));
    let out = helpers.apply("presence", &HelperCall::new(&ctx).param(obj))?;
    assert_eq!(out.as_deref(), Some("true,true,true,false"));
    Ok(())
}

#[test]
fn test_shared_store_keeps_identity() -> Result<()> {
    for policy in [TranslationPolicy::Lazy, TranslationPolicy::Eager] {
        let helpers = load(policy)?;
        let ctx = NativeMap::new();
        let shared = map(json!({"x": 1}));

        let call = HelperCall::new(&ctx).param(shared.clone()).param(shared.clone());
        assert_eq!(helpers.apply("same", &call)?.as_deref(), Some("true"));

        let call = HelperCall::new(&ctx).param(shared).param(map(json!({"x": 1})));
        assert_eq!(helpers.apply("same", &call)?.as_deref(), Some("false"));
    }
    Ok(())
}

#[test]
fn test_cyclic_graph() -> Result<()> {
    for policy in [TranslationPolicy::Lazy, TranslationPolicy::Eager] {
        let helpers = load(policy)?;
        let node = NativeMap::new();
        node.insert("self", node.clone());
        assert_eq!(eval_on(&helpers, node.clone(), "o.self.self === o")?, "true");
        node.remove("self");
    }
    Ok(())
}

#[test]
fn test_wrong_shape_access_throws_type_error() -> Result<()> {
    let helpers = load(TranslationPolicy::Lazy)?;

    let list = Value::from(vec![1, 2]);
    assert_eq!(
        eval_on(&helpers, list.clone(), "o.first")?,
        "TypeError: access by name not supported on a sequence object"
    );
    assert_eq!(
        eval_on(&helpers, list, "(o.length = 0)")?,
        "TypeError: assignment to length not supported on a sequence object"
    );

    let obj = map(json!({"0": "zero"}));
    assert_eq!(
        eval_on(&helpers, obj.clone(), "o[0]")?,
        "TypeError: access by index not supported on a mapping object"
    );
    // Enumeration is by name, so numeric-looking keys still list.
    assert_eq!(eval_on(&helpers, obj, "Object.keys(o).join()")?, "0");
    Ok(())
}

#[test]
fn test_slot_membership() -> Result<()> {
    let helpers = load(TranslationPolicy::Lazy)?;
    let list = Value::from(vec!["a", "b"]);
    assert_eq!(
        eval_on(&helpers, list, "[0 in o, 1 in o, 2 in o, 'length' in o].join()")?,
        "true,true,false,true"
    );
    Ok(())
}

#[test]
fn test_script_writes_reach_native_stores() -> Result<()> {
    let helpers = load(TranslationPolicy::Lazy)?;

    let obj = NativeMap::new();
    eval_on(&helpers, obj.clone(), "(o.nested = {list: [1, 'two', null]}, 1)")?;
    let nested = obj.get("nested").expect("written");
    assert_eq!(nested.to_json(), json!({"list": [1, "two", null]}));

    let list: NativeSeq = vec![Value::from("a"), Value::from("b"), Value::from("c")]
        .into_iter()
        .collect();
    eval_on(&helpers, list.clone(), "delete o[0]")?;
    assert_eq!(list.to_vec(), vec![Value::from("b"), Value::from("c")]);

    eval_on(&helpers, list.clone(), "(o[o.length] = 'd', 1)")?;
    assert_eq!(list.len(), 3);

    let out = eval_on(&helpers, list.clone(), "(o[9] = 'far', 1)")?;
    assert!(out.starts_with("TypeError"), "{out}");
    assert_eq!(list.len(), 3);

    let out = eval_on(&helpers, list.clone(), "(o[0] = function () {}, 1)")?;
    assert_eq!(out, "TypeError: Conversion error: functions cannot be stored on host objects");
    assert_eq!(list.get(0), Some(Value::from("b")));
    Ok(())
}

#[test]
fn test_tag_like_member_is_ordinary_data() -> Result<()> {
    let helpers = load(TranslationPolicy::Lazy)?;
    let obj = map(json!({"__hostBridge": "data", "inner": {"v": 1}}));

    assert_eq!(eval_on(&helpers, obj.clone(), "o.__hostBridge")?, "data");
    assert_eq!(eval_on(&helpers, obj.clone(), "Object.keys(o).join()")?, "__hostBridge,inner");

    eval_on(&helpers, obj.clone(), "(o.__hostBridge = 'changed', 1)")?;
    assert_eq!(obj.get("__hostBridge"), Some(Value::from("changed")));

    // Proxies written back still resolve to their store.
    assert_eq!(eval_on(&helpers, obj.clone(), "(o.copy = o.inner, o.copy === o.inner)")?, "true");
    let inner = obj.get("inner").and_then(|v| v.store_id());
    assert!(inner.is_some());
    assert_eq!(obj.get("copy").and_then(|v| v.store_id()), inner);
    Ok(())
}

#[test]
fn test_eager_values_are_snapshots() -> Result<()> {
    let helpers = load(TranslationPolicy::Eager)?;
    let list: NativeSeq = vec![Value::from(1)].into_iter().collect();
    assert_eq!(eval_on(&helpers, list.clone(), "Array.isArray(o)")?, "true");
    eval_on(&helpers, list.clone(), "o.push(2)")?;
    assert_eq!(list.len(), 1);
    Ok(())
}

#[test]
fn test_helper_failure_reports_location() -> Result<()> {
    let handlebars = HandlebarsJs::new(BridgeConfig::default())?;
    let mut helpers = HelperSet::new();
    let source = "Handlebars.registerHelper('fail', function () {\n\
                  \x20 var x = 1;\n\
                  \x20 throw new Error('broken helper');\n\
                  });";
    handlebars.register_helpers(&mut helpers, "errors.js", source)?;

    let ctx = NativeMap::new();
    let err = helpers.apply("fail", &HelperCall::new(&ctx)).unwrap_err();
    match err {
        BridgeError::HelperExecution { helper, message, location } => {
            assert_eq!(helper, "fail");
            assert_eq!(message, "Error: broken helper");
            assert_eq!(location.as_deref(), Some("errors.js:3"));
        }
        other => panic!("unexpected {other:?}"),
    }

    // The environment is still usable afterwards.
    handlebars.register_helpers(&mut helpers, "more.js", "Handlebars.registerHelper('ok', function () { return 'ok'; });")?;
    assert_eq!(helpers.apply("ok", &HelperCall::new(&ctx))?.as_deref(), Some("ok"));
    Ok(())
}

struct Each;

impl BlockRenderer for Each {
    fn primary_block(&self, context: &Value) -> io::Result<String> {
        Ok(format!("[{context}]"))
    }

    fn alternate_block(&self, _context: &Value) -> io::Result<String> {
        Ok("empty".to_string())
    }
}

#[test]
fn test_block_helper() -> Result<()> {
    let handlebars = HandlebarsJs::new(BridgeConfig::default())?;
    let mut helpers = HelperSet::new();
    handlebars.register_helpers(
        &mut helpers,
        "each.js",
        r#"
        Handlebars.registerHelper('each', function (list, options) {
          if (!list.length) { return options.inverse(this); }
          var out = '';
          for (var i = 0; i < list.length; i++) { out += options.fn(list[i]); }
          return out;
        });
        "#,
    )?;

    let ctx = NativeMap::new();
    let blocks: Rc<dyn BlockRenderer> = Rc::new(Each);
    let call = HelperCall::new(&ctx)
        .param(Value::from(vec!["x", "y"]))
        .blocks(Rc::clone(&blocks));
    assert_eq!(helpers.apply("each", &call)?.as_deref(), Some("[x][y]"));

    let call = HelperCall::new(&ctx)
        .param(Value::from(Vec::<i32>::new()))
        .blocks(blocks);
    assert_eq!(helpers.apply("each", &call)?.as_deref(), Some("empty"));
    Ok(())
}

#[test]
fn test_prelude_utilities() -> Result<()> {
    let handlebars = HandlebarsJs::new(BridgeConfig::default())?;
    let mut helpers = HelperSet::new();
    handlebars.register_helpers(
        &mut helpers,
        "utils.js",
        r#"
        Handlebars.registerHelper('escape', function (s) { return Handlebars.Utils.escapeExpression(s); });
        Handlebars.registerHelper('isArray', function (v) { return Handlebars.Utils.isArray(v); });
        Handlebars.registerHelper('log', function () { console.log('logged', this); return 'done'; });
        "#,
    )?;

    let ctx = map(json!({"list": [1]}));
    let call = HelperCall::new(&ctx).param("<a href=\"x\">");
    assert_eq!(
        helpers.apply("escape", &call)?.as_deref(),
        Some("&lt;a href&#x3D;&quot;x&quot;&gt;")
    );

    let call = HelperCall::new(&ctx).param(Value::from(vec![1]));
    assert_eq!(helpers.apply("isArray", &call)?.as_deref(), Some("true"));
    let call = HelperCall::new(&ctx).param(map(json!({})));
    assert_eq!(helpers.apply("isArray", &call)?.as_deref(), Some("false"));

    assert_eq!(helpers.apply("log", &HelperCall::new(&ctx))?.as_deref(), Some("done"));
    Ok(())
}

#[test]
fn test_helpers_from_file_and_toml_config() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let script = dir.path().join("shout.js");
    std::fs::write(
        &script,
        "Handlebars.registerHelper('shout', function (s) { return String(s).toUpperCase(); });\n",
    )?;

    let config = BridgeConfig::from_toml_str("policy = \"eager\"")?;
    assert_eq!(config.policy, TranslationPolicy::Eager);

    let handlebars = HandlebarsJs::new(config)?;
    let mut helpers = HelperSet::new();
    let names = handlebars.register_helpers_file(&mut helpers, &script)?;
    assert_eq!(names, vec!["shout"]);
    assert_eq!(helpers.get("shout").map(|h| h.filename()), Some("shout.js"));

    let ctx = NativeMap::new();
    let out = helpers.apply("shout", &HelperCall::new(&ctx).param("hey"))?;
    assert_eq!(out.as_deref(), Some("HEY"));

    let missing = handlebars.register_helpers_file(&mut helpers, dir.path().join("nope.js"));
    assert!(matches!(missing, Err(BridgeError::Io(_))));
    Ok(())
}

#[test]
fn test_custom_prelude_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let prelude = dir.path().join("prelude.js");
    let embedded = script_bridge::bindings::EMBEDDED_PRELUDE;
    std::fs::write(&prelude, format!("{embedded}\nvar GREETING = 'hello';\n"))?;

    let mut config = BridgeConfig::default();
    config.apply_overrides(|key| match key {
        "SCRIPT_BRIDGE_PRELUDE" => Some(prelude.display().to_string()),
        _ => None,
    })?;

    let handlebars = HandlebarsJs::new(config)?;
    let mut helpers = HelperSet::new();
    handlebars.register_helpers(
        &mut helpers,
        "greet.js",
        "Handlebars.registerHelper('greet', function () { return GREETING; });",
    )?;
    let ctx = NativeMap::new();
    assert_eq!(helpers.apply("greet", &HelperCall::new(&ctx))?.as_deref(), Some("hello"));
    Ok(())
}
