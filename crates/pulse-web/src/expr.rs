//! Expression evaluation (§4.2 "Expression evaluation"). [`pulse_core::expr::Expr`]
//! is a parsed tree; evaluating `member`/`call`/`new`/`instanceof` against a
//! real host requires an actual `JsValue`, so evaluation works over
//! `JsValue` via `js_sys::Reflect` rather than reinterpreting JS semantics
//! in Rust.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Function, Object, Reflect};
use pulse_core::expr::Expr;
use pulse_core::value::PulseValue;
use wasm_bindgen::{JsCast, JsValue};

use crate::error::PulseError;

/// A lexical scope, extended by arrow-function invocation (§4.2 "`arrow`
/// yields a closure that ... extends the current environment").
#[derive(Clone, Default)]
pub struct Env {
    parent: Option<Rc<Env>>,
    bindings: RefCell<Vec<(String, JsValue)>>,
}

impl Env {
    pub fn root() -> Rc<Env> {
        Rc::new(Env::default())
    }

    pub fn child(parent: &Rc<Env>) -> Env {
        Env { parent: Some(Rc::clone(parent)), bindings: RefCell::new(Vec::new()) }
    }

    pub fn bind(&self, name: &str, value: JsValue) {
        self.bindings.borrow_mut().push((name.to_string(), value));
    }

    /// §4.2 "`id` first checks the environment, then a host global scope."
    pub fn lookup(&self, name: &str) -> Option<JsValue> {
        if let Some((_, v)) = self.bindings.borrow().iter().rev().find(|(n, _)| n == name) {
            return Some(v.clone());
        }
        self.parent.as_ref().and_then(|p| p.lookup(name))
    }
}

/// Resolves a `ref` expression's component-registry name to a `JsValue`.
pub trait RegistryLookup {
    fn resolve(&self, name: &str) -> Option<JsValue>;
}

pub fn pulse_value_to_js(value: &PulseValue) -> JsValue {
    match value {
        PulseValue::Null => JsValue::NULL,
        PulseValue::Undefined => JsValue::UNDEFINED,
        PulseValue::Bool(b) => JsValue::from_bool(*b),
        PulseValue::Number(n) => JsValue::from_f64(*n),
        PulseValue::String(s) => JsValue::from_str(s),
        PulseValue::Date(ms) => js_sys::Date::new(&JsValue::from_f64(**ms as f64)).into(),
        PulseValue::Array(_) | PulseValue::Set(_) => {
            let arr = Array::new();
            if let Some(items) = value.items() {
                for item in items {
                    arr.push(&pulse_value_to_js(&item));
                }
            }
            arr.into()
        }
        PulseValue::Object(_) | PulseValue::Map(_) => {
            let obj = Object::new();
            if let Some(entries) = value.entries() {
                for (k, v) in entries {
                    let _ = Reflect::set(&obj, &JsValue::from_str(&k), &pulse_value_to_js(&v));
                }
            }
            obj.into()
        }
    }
}

/// Evaluate `expr` in `env` against the given component registry and the
/// global (`window`) scope used for unresolved `id` lookups.
pub fn eval(expr: &Expr, env: &Rc<Env>, registry: &dyn RegistryLookup) -> Result<JsValue, PulseError> {
    match expr {
        Expr::Ref { name } => {
            registry.resolve(name).ok_or_else(|| PulseError::Vdom(pulse_core::VdomError::MissingRegistryRef { name: name.clone() }))
        }
        Expr::Id { name } => {
            if let Some(v) = env.lookup(name) {
                return Ok(v);
            }
            let global = js_sys::global();
            Ok(Reflect::get(&global, &JsValue::from_str(name)).unwrap_or(JsValue::UNDEFINED))
        }
        Expr::Lit { value } => Ok(pulse_value_to_js(value)),
        Expr::Undefined => Ok(JsValue::UNDEFINED),
        Expr::Array { items } => {
            let arr = Array::new();
            for item in items {
                arr.push(&eval(item, env, registry)?);
            }
            Ok(arr.into())
        }
        Expr::Object { entries } => {
            let obj = Object::new();
            for (k, v) in entries {
                Reflect::set(&obj, &JsValue::from_str(k), &eval(v, env, registry)?).map_err(PulseError::from)?;
            }
            Ok(obj.into())
        }
        Expr::Member { object, property } => {
            let obj = eval(object, env, registry)?;
            Reflect::get(&obj, &JsValue::from_str(property)).map_err(PulseError::from)
        }
        Expr::Index { object, index } => {
            let obj = eval(object, env, registry)?;
            let idx = eval(index, env, registry)?;
            Reflect::get(&obj, &idx).map_err(PulseError::from)
        }
        Expr::Call { callee, args } => {
            let (this_arg, func) = eval_callee(callee, env, registry)?;
            let func: Function = func.dyn_into().map_err(|_| PulseError::NotCallable { path: describe(callee) })?;
            let arr = Array::new();
            for a in args {
                arr.push(&eval(a, env, registry)?);
            }
            func.apply(&this_arg, &arr).map_err(PulseError::from)
        }
        Expr::New { callee, args } => {
            let ctor = eval(callee, env, registry)?;
            let ctor: Function = ctor.dyn_into().map_err(|_| PulseError::NotCallable { path: describe(callee) })?;
            let arr = Array::new();
            for a in args {
                arr.push(&eval(a, env, registry)?);
            }
            Reflect::construct(&ctor, &arr).map_err(PulseError::from)
        }
        Expr::Unary { op, argument } => eval_unary(op, argument, env, registry),
        Expr::Binary { op, left, right } => eval_binary(op, left, right, env, registry),
        Expr::Ternary { test, consequent, alternate } => {
            if eval(test, env, registry)?.is_truthy() {
                eval(consequent, env, registry)
            } else {
                eval(alternate, env, registry)
            }
        }
        Expr::Template { quasis, exprs } => {
            let mut out = String::new();
            for (i, quasi) in quasis.iter().enumerate() {
                out.push_str(quasi);
                if let Some(e) = exprs.get(i) {
                    let v = eval(e, env, registry)?;
                    out.push_str(&js_to_display_string(&v));
                }
            }
            Ok(JsValue::from_str(&out))
        }
        Expr::Arrow { params, body } => {
            // A real JS-callable closure needs a `Closure`-backed Function.
            // Since arrow values here are primarily used as event handlers
            // wired up before the event fires, construct the function lazily
            // through `make_arrow`, used by the renderer/callback registry.
            make_arrow(params.clone(), (**body).clone(), Rc::clone(env))
        }
    }
}

/// `member`/`index` callees pass the receiver as `this`; anything else calls
/// with `undefined` as `this` (matches a bare function-expression call).
fn eval_callee(callee: &Expr, env: &Rc<Env>, registry: &dyn RegistryLookup) -> Result<(JsValue, JsValue), PulseError> {
    match callee {
        Expr::Member { object, property } => {
            let obj = eval(object, env, registry)?;
            let func = Reflect::get(&obj, &JsValue::from_str(property)).map_err(PulseError::from)?;
            Ok((obj, func))
        }
        Expr::Index { object, index } => {
            let obj = eval(object, env, registry)?;
            let idx = eval(index, env, registry)?;
            let func = Reflect::get(&obj, &idx).map_err(PulseError::from)?;
            Ok((obj, func))
        }
        other => Ok((JsValue::UNDEFINED, eval(other, env, registry)?)),
    }
}

fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Id { name } => name.clone(),
        Expr::Member { property, .. } => property.clone(),
        Expr::Ref { name } => name.clone(),
        _ => "<expr>".to_string(),
    }
}

fn eval_unary(op: &str, argument: &Expr, env: &Rc<Env>, registry: &dyn RegistryLookup) -> Result<JsValue, PulseError> {
    let v = eval(argument, env, registry)?;
    match op {
        "!" => Ok(JsValue::from_bool(!v.is_truthy())),
        "-" => Ok(JsValue::from_f64(-v.as_f64().unwrap_or(f64::NAN))),
        "+" => Ok(JsValue::from_f64(v.as_f64().unwrap_or(f64::NAN))),
        "typeof" => Ok(JsValue::from_str(&js_typeof(&v))),
        other => Err(PulseError::Vdom(pulse_core::VdomError::UnknownOperator { op: other.to_string() })),
    }
}

fn eval_binary(op: &str, left: &Expr, right: &Expr, env: &Rc<Env>, registry: &dyn RegistryLookup) -> Result<JsValue, PulseError> {
    // `&&`/`||`/`??` short-circuit, so the right side is only evaluated when
    // needed (§4.2 "short-circuit `&&`/`||` preserve ordering").
    match op {
        "&&" => {
            let l = eval(left, env, registry)?;
            return if l.is_truthy() { eval(right, env, registry) } else { Ok(l) };
        }
        "||" => {
            let l = eval(left, env, registry)?;
            return if l.is_truthy() { Ok(l) } else { eval(right, env, registry) };
        }
        "??" => {
            let l = eval(left, env, registry)?;
            return if l.is_null() || l.is_undefined() { eval(right, env, registry) } else { Ok(l) };
        }
        _ => {}
    }

    let l = eval(left, env, registry)?;
    let r = eval(right, env, registry)?;
    match op {
        "+" => {
            if l.as_string().is_some() || r.as_string().is_some() {
                Ok(JsValue::from_str(&format!("{}{}", js_to_display_string(&l), js_to_display_string(&r))))
            } else {
                Ok(JsValue::from_f64(num(&l) + num(&r)))
            }
        }
        "-" => Ok(JsValue::from_f64(num(&l) - num(&r))),
        "*" => Ok(JsValue::from_f64(num(&l) * num(&r))),
        "/" => Ok(JsValue::from_f64(num(&l) / num(&r))),
        "%" => Ok(JsValue::from_f64(num(&l) % num(&r))),
        "===" => Ok(JsValue::from_bool(l == r)),
        "!==" => Ok(JsValue::from_bool(l != r)),
        "==" => Ok(JsValue::from_bool(l == r)),
        "!=" => Ok(JsValue::from_bool(l != r)),
        ">" => Ok(JsValue::from_bool(num(&l) > num(&r))),
        ">=" => Ok(JsValue::from_bool(num(&l) >= num(&r))),
        "<" => Ok(JsValue::from_bool(num(&l) < num(&r))),
        "<=" => Ok(JsValue::from_bool(num(&l) <= num(&r))),
        "in" => Ok(JsValue::from_bool(Reflect::has(&r, &l).unwrap_or(false))),
        "instanceof" => {
            // No generic runtime `instanceof` exists on `JsValue` (its
            // `is_instance_of::<T>()` is resolved at compile time), so walk
            // the prototype chain the way the operator itself does.
            let prototype = Reflect::get(&r, &JsValue::from_str("prototype")).map_err(PulseError::from)?;
            let is_prototype_of = Reflect::get(&prototype, &JsValue::from_str("isPrototypeOf")).map_err(PulseError::from)?;
            let is_prototype_of: Function = is_prototype_of
                .dyn_into()
                .map_err(|_| PulseError::Js("instanceof target is not a constructor".into()))?;
            let result = is_prototype_of.call1(&prototype, &l).map_err(PulseError::from)?;
            Ok(JsValue::from_bool(result.is_truthy()))
        }
        other => Err(PulseError::Vdom(pulse_core::VdomError::UnknownOperator { op: other.to_string() })),
    }
}

fn num(v: &JsValue) -> f64 {
    v.as_f64().unwrap_or(f64::NAN)
}

fn js_typeof(v: &JsValue) -> String {
    if v.is_undefined() {
        "undefined".to_string()
    } else if v.is_null() {
        "object".to_string()
    } else if v.as_bool().is_some() {
        "boolean".to_string()
    } else if v.as_f64().is_some() {
        "number".to_string()
    } else if v.as_string().is_some() {
        "string".to_string()
    } else if v.is_function() {
        "function".to_string()
    } else {
        "object".to_string()
    }
}

fn js_to_display_string(v: &JsValue) -> String {
    if let Some(s) = v.as_string() {
        s
    } else if v.is_undefined() {
        "undefined".to_string()
    } else if v.is_null() {
        "null".to_string()
    } else if let Some(n) = v.as_f64() {
        n.to_string()
    } else if let Some(b) = v.as_bool() {
        b.to_string()
    } else {
        js_sys::JsString::from(v.clone()).into()
    }
}

/// Builds a real callable `Function` backed by a `wasm_bindgen::Closure` that
/// re-enters the evaluator with `params` bound to the call's arguments.
/// Leaked deliberately: event-handler closures live as long as the element
/// that references them, which the metadata/callback registry already
/// tracks, so leaking the `Closure` wrapper here is the standard
/// `wasm_bindgen` pattern for a JS-callable value with no single clear Rust
/// owner.
fn make_arrow(params: Vec<String>, body: Expr, env: Rc<Env>) -> Result<JsValue, PulseError> {
    struct NoopRegistry;
    impl RegistryLookup for NoopRegistry {
        fn resolve(&self, _name: &str) -> Option<JsValue> {
            None
        }
    }

    let closure = wasm_bindgen::closure::Closure::wrap(Box::new(move |args: JsValue| -> JsValue {
        let call_env = Env::child(&env);
        if let Ok(arr) = args.dyn_into::<Array>() {
            for (i, param) in params.iter().enumerate() {
                call_env.bind(param, arr.get(i as u32));
            }
        }
        eval(&body, &Rc::new(call_env), &NoopRegistry).unwrap_or(JsValue::UNDEFINED)
    }) as Box<dyn FnMut(JsValue) -> JsValue>);

    let function = closure.as_ref().clone();
    closure.forget();
    Ok(function)
}

// Evaluation here runs against real `JsValue`s, which only work on the
// `wasm32` target — see `tests/expr.rs` for `wasm_bindgen_test` coverage.
