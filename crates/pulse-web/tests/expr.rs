use std::rc::Rc;

use js_sys::{Object, Reflect};
use pulse_core::expr::Expr;
use pulse_core::value::PulseValue;
use pulse_web::expr::{eval, pulse_value_to_js, Env, RegistryLookup};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::wasm_bindgen_test;

wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

struct NoopRegistry;
impl RegistryLookup for NoopRegistry {
    fn resolve(&self, _name: &str) -> Option<JsValue> {
        None
    }
}

#[wasm_bindgen_test]
fn id_falls_back_to_window_global() {
    let env = Env::root();
    let expr = Expr::Id { name: "location".to_string() };
    let value = eval(&expr, &env, &NoopRegistry).unwrap();
    assert!(!value.is_undefined());
}

#[wasm_bindgen_test]
fn member_reads_real_object_property() {
    let obj = Object::new();
    Reflect::set(&obj, &JsValue::from_str("label"), &JsValue::from_str("hi")).unwrap();

    let env = Env::root();
    env.bind("widget", obj.into());

    let expr = Expr::Member {
        object: Box::new(Expr::Id { name: "widget".to_string() }),
        property: "label".to_string(),
    };
    let value = eval(&expr, &env, &NoopRegistry).unwrap();
    assert_eq!(value.as_string().as_deref(), Some("hi"));
}

#[wasm_bindgen_test]
fn call_dispatches_with_member_receiver_as_this() {
    let obj = Object::new();
    let get_value: js_sys::Function = js_sys::Function::new_no_args("return this.v;");
    Reflect::set(&obj, &JsValue::from_str("v"), &JsValue::from_f64(7.0)).unwrap();
    Reflect::set(&obj, &JsValue::from_str("getV"), &get_value).unwrap();

    let env = Env::root();
    env.bind("widget", obj.into());

    let expr = Expr::Call {
        callee: Box::new(Expr::Member {
            object: Box::new(Expr::Id { name: "widget".to_string() }),
            property: "getV".to_string(),
        }),
        args: vec![],
    };
    let value = eval(&expr, &env, &NoopRegistry).unwrap();
    assert_eq!(value.as_f64(), Some(7.0));
}

#[wasm_bindgen_test]
fn new_constructs_a_real_instance() {
    let ctor: js_sys::Function = js_sys::Function::new_with_args("n", "this.n = n;");
    let env = Env::root();
    env.bind("Box", ctor.into());

    let expr = Expr::New {
        callee: Box::new(Expr::Id { name: "Box".to_string() }),
        args: vec![Expr::Lit { value: PulseValue::Number(3.0) }],
    };
    let instance = eval(&expr, &env, &NoopRegistry).unwrap();
    let n = Reflect::get(&instance, &JsValue::from_str("n")).unwrap();
    assert_eq!(n.as_f64(), Some(3.0));
}

#[wasm_bindgen_test]
fn instanceof_walks_the_real_prototype_chain() {
    let ctor: js_sys::Function = js_sys::Function::new_no_args("");
    let env = Env::root();
    env.bind("Widget", ctor.clone().into());

    let instance_expr = Expr::New { callee: Box::new(Expr::Id { name: "Widget".to_string() }), args: vec![] };
    let env2 = Env::root();
    env2.bind("Widget", ctor.into());
    let instance = eval(&instance_expr, &env2, &NoopRegistry).unwrap();
    env.bind("instance", instance);

    let expr = Expr::Binary {
        op: "instanceof".to_string(),
        left: Box::new(Expr::Id { name: "instance".to_string() }),
        right: Box::new(Expr::Id { name: "Widget".to_string() }),
    };
    let value = eval(&expr, &env, &NoopRegistry).unwrap();
    assert!(value.is_truthy());
}

#[wasm_bindgen_test]
fn arrow_builds_a_callable_closure_over_its_environment() {
    let env = Env::root();
    env.bind("factor", JsValue::from_f64(10.0));

    let arrow = Expr::Arrow {
        params: vec!["x".to_string()],
        body: Box::new(Expr::Binary {
            op: "*".to_string(),
            left: Box::new(Expr::Id { name: "x".to_string() }),
            right: Box::new(Expr::Id { name: "factor".to_string() }),
        }),
    };
    let func = eval(&arrow, &env, &NoopRegistry).unwrap();
    let func: js_sys::Function = func.unchecked_into();

    let args = js_sys::Array::new();
    args.push(&JsValue::from_f64(4.0));
    let result = func.apply(&JsValue::UNDEFINED, &args).unwrap();
    assert_eq!(result.as_f64(), Some(40.0));
}

#[wasm_bindgen_test]
fn pulse_value_to_js_round_trips_an_object() {
    let mut entries = indexmap::IndexMap::new();
    entries.insert("ok".to_string(), PulseValue::Bool(true));
    let value = PulseValue::object(entries);

    let js = pulse_value_to_js(&value);
    let ok = Reflect::get(&js, &JsValue::from_str("ok")).unwrap();
    assert_eq!(ok.as_bool(), Some(true));
}
