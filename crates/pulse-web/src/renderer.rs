//! VDOM → React tree translation and incremental patch application (§4.2).

use std::collections::HashSet;

use js_sys::{Array, Object, Reflect};
use pulse_core::patch::{EvalPatch, Op, ReconcileNew, ReconcileReuse};
use pulse_core::path::PathSegment;
use pulse_core::value::PulseValue;
use pulse_core::vdom::{Element, Node, Primitive, StaticTagKind, Tag};
use pulse_core::Path;
use pulse_interpreter::bindings;
use wasm_bindgen::{JsCast, JsValue};

use crate::callbacks::{parse_placeholder, CallbackRegistry};
use crate::error::PulseError;
use crate::expr::{self, Env, RegistryLookup};
use crate::meta::{MetaStore, NodeMeta};

/// Everything the renderer needs from the host to turn VDOM into React
/// elements: a component registry and the live callback bindings.
pub struct Renderer {
    pub registry: JsValue,
    pub meta: MetaStore,
    pub callbacks: CallbackRegistry,
}

struct JsRegistry<'a>(&'a JsValue);
impl RegistryLookup for JsRegistry<'_> {
    fn resolve(&self, name: &str) -> Option<JsValue> {
        let v = Reflect::get(self.0, &JsValue::from_str(name)).ok()?;
        if v.is_undefined() || v.is_null() {
            None
        } else {
            Some(v)
        }
    }
}

impl Renderer {
    pub fn new(registry: JsValue, callbacks: CallbackRegistry) -> Renderer {
        Renderer { registry, meta: MetaStore::new(), callbacks }
    }

    /// §4.2 "Rendering": build a React element tree for `node` at `path`.
    pub fn render_node(&mut self, node: &Node, path: &Path) -> Result<JsValue, PulseError> {
        match node {
            Node::Primitive(p) => Ok(primitive_to_js(p)),
            Node::Expr(expr) => self.evaluate_expr(expr),
            Node::Element(el) => self.render_element(el, path),
        }
    }

    pub fn evaluate_expr(&self, expr: &pulse_core::expr::Expr) -> Result<JsValue, PulseError> {
        let env = Env::root();
        expr::eval(expr, &env, &JsRegistry(&self.registry))
    }

    fn render_element(&mut self, el: &Element, path: &Path) -> Result<JsValue, PulseError> {
        let element_type = self.resolve_tag(&el.tag, path)?;

        let props_obj = Object::new();
        let mut cb_keys = Vec::new();
        for (key, value) in &el.props {
            let transformed = if el.eval.contains(key) {
                self.transform_eval_prop(value, key, path, &mut cb_keys)?
            } else {
                pulse_value_passthrough(value)
            };
            Reflect::set(&props_obj, &JsValue::from_str(key), &transformed).ok();
        }

        let mut children = Vec::with_capacity(el.children.len());
        for (i, child) in el.children.iter().enumerate() {
            children.push(self.render_node(child, &path.child_index(i))?);
        }

        if let Some(key) = &el.key {
            Reflect::set(&props_obj, &JsValue::from_str("key"), &JsValue::from_str(key)).ok();
        }

        let element = bindings::create_element(&element_type, &props_obj, &children);

        self.meta.insert(NodeMeta { eval: el.eval.clone(), cb_keys, path: path.clone() });
        Ok(element)
    }

    fn resolve_tag(&self, tag: &Tag, path: &Path) -> Result<JsValue, PulseError> {
        match tag {
            Tag::Static(_) => match tag.classify().expect("static tag always classifies") {
                StaticTagKind::Fragment => Ok(bindings::fragment_type()),
                StaticTagKind::Component(name) => Ok(bindings::resolve_component(&self.registry, name, path)?),
                StaticTagKind::Intrinsic(html_tag) => Ok(bindings::resolve_intrinsic(html_tag, path)?),
            },
            Tag::Dynamic(expr) => self.evaluate_expr(expr),
        }
    }

    /// A prop key listed in `eval`: callback placeholder, nested element
    /// subtree, expression, or plain JSON pass-through.
    fn transform_eval_prop(
        &mut self,
        value: &PulseValue,
        key: &str,
        path: &Path,
        cb_keys: &mut Vec<String>,
    ) -> Result<JsValue, PulseError> {
        if let Some(s) = value.as_str() {
            if s.starts_with("$cb") {
                let spec = parse_placeholder(s)?;
                let canonical = path.callback_name(key);
                self.callbacks.bind(&canonical, spec);
                cb_keys.push(key.to_string());
                return Ok(self.make_callback_bridge(canonical));
            }
        }
        if value.has_key("t") {
            let expr = pulse_core::expr::Expr::from_value(value)?;
            return self.evaluate_expr(&expr);
        }
        if value.has_key("tag") {
            let node = Node::from_value(value)?;
            return self.render_node(&node, &path.child_key(key.to_string()));
        }
        Ok(pulse_value_passthrough(value))
    }

    /// Wraps `canonical` as a JS function that, when React invokes it with
    /// an event, runs it through the event extractor and the callback
    /// registry (§4.3 "Invocation"). Leaked deliberately: the function lives
    /// as long as the element referencing it, tracked by `meta`/`callbacks`,
    /// not by a single Rust owner.
    fn make_callback_bridge(&self, canonical: String) -> JsValue {
        let registry = self.callbacks.clone();
        let closure = wasm_bindgen::closure::Closure::wrap(Box::new(move |event: JsValue| {
            let extracted = pulse_html::extract(&event);
            registry.invoke(&canonical, vec![extracted]);
        }) as Box<dyn FnMut(JsValue)>);
        let function: js_sys::Function = closure.as_ref().clone().unchecked_into();
        closure.forget();
        function.into()
    }

    /// §4.2 "Patch application": walk each op's path, clone the spine, and
    /// rebuild the destination subtree.
    pub fn apply_updates(&mut self, tree: JsValue, ops: &[Op]) -> Result<JsValue, PulseError> {
        let mut current = tree;
        for op in ops {
            current = self.apply_along_path(current, op.path().segments(), op, Path::root())?;
        }
        Ok(current)
    }

    fn apply_along_path(
        &mut self,
        node: JsValue,
        remaining: &[PathSegment],
        op: &Op,
        current_path: Path,
    ) -> Result<JsValue, PulseError> {
        let Some((head, rest)) = remaining.split_first() else {
            return self.apply_at_destination(node, op, &current_path);
        };

        match head {
            PathSegment::Index(i) => {
                let props = element_props(&node);
                let children = props_children(&props);
                let child = children.get(*i as u32);
                let new_child = self.apply_along_path(child, rest, op, current_path.child_index(*i))?;
                children.set(*i as u32, &new_child);
                let next_props = set_children(&props, &children);
                Ok(self.reconstruct_with_props(&node, next_props))
            }
            PathSegment::Key(key) => {
                let props = element_props(&node);
                let child = Reflect::get(&props, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED);
                let new_child = self.apply_along_path(child, rest, op, current_path.child_key(key.clone()))?;
                let next_props = clone_props(&props);
                Reflect::set(&next_props, &JsValue::from_str(key), &new_child).ok();
                Ok(self.reconstruct_with_props(&node, next_props))
            }
        }
    }

    fn apply_at_destination(&mut self, node: JsValue, op: &Op, path: &Path) -> Result<JsValue, PulseError> {
        match op {
            Op::Replace { data, .. } => {
                self.teardown_subtree(path);
                self.render_node(data, path)
            }
            Op::UpdateProps { set, remove, eval, .. } => self.apply_update_props(node, path, set, remove, eval),
            Op::Reconciliation { n, new, reuse, .. } => self.apply_reconciliation(node, path, *n, new, reuse),
        }
    }

    fn apply_update_props(
        &mut self,
        node: JsValue,
        path: &Path,
        set: &indexmap::IndexMap<String, PulseValue>,
        remove: &[String],
        eval: &EvalPatch,
    ) -> Result<JsValue, PulseError> {
        let old_meta = self.meta.get(path).cloned().unwrap_or_default();
        let next_eval = match eval {
            EvalPatch::Keep => old_meta.eval.clone(),
            EvalPatch::Clear => Vec::new(),
            EvalPatch::Replace(items) => items.clone(),
        };

        // Callback keys dropped from the eval set are torn down first.
        for key in &old_meta.cb_keys {
            if !next_eval.contains(key) {
                self.callbacks.teardown(&path.callback_name(key));
            }
        }

        let props = element_props(&node);
        let next_props = clone_props(&props);

        for key in remove {
            Reflect::delete_property(&next_props, &JsValue::from_str(key)).ok();
            self.teardown_subtree(&path.child_key(key.clone()));
        }

        let mut cb_keys: Vec<String> =
            old_meta.cb_keys.iter().filter(|k| next_eval.contains(k) && !set.contains_key(*k)).cloned().collect();

        for (key, value) in set {
            let transformed = if next_eval.contains(key) {
                self.transform_eval_prop(value, key, path, &mut cb_keys)?
            } else {
                pulse_value_passthrough(value)
            };
            Reflect::set(&next_props, &JsValue::from_str(key), &transformed).ok();
        }

        self.meta.insert(NodeMeta { eval: next_eval, cb_keys, path: path.clone() });
        Ok(self.reconstruct_with_props(&node, next_props))
    }

    fn apply_reconciliation(
        &mut self,
        node: JsValue,
        path: &Path,
        n: usize,
        new: &ReconcileNew,
        reuse: &ReconcileReuse,
    ) -> Result<JsValue, PulseError> {
        let props = element_props(&node);
        let prev_children = props_children(&props);
        let prev_len = prev_children.length();

        // Anything beyond the new length that isn't explicitly carried
        // forward is torn down.
        for i in 0..prev_len {
            if i as usize >= n {
                self.teardown_subtree(&path.child_index(i as usize));
            }
        }

        let next_children = Array::new();
        next_children.set_length(n as u32);

        for (slot, content) in new.dest_indices.iter().zip(&new.contents) {
            let rendered = self.render_node(content, &path.child_index(*slot))?;
            next_children.set(*slot as u32, &rendered);
        }

        for (dest, source) in reuse.dest_indices.iter().zip(&reuse.source_indices) {
            let moved = prev_children.get(*source as u32);
            let old_path = path.child_index(*source);
            let new_path = path.child_index(*dest);
            self.rebind_subtree(&old_path, &new_path);
            next_children.set(*dest as u32, &moved);
        }

        let covered: HashSet<usize> = new.dest_indices.iter().chain(reuse.dest_indices.iter()).copied().collect();
        for i in 0..n {
            if !covered.contains(&i) && (i as u32) < prev_len {
                next_children.set(i as u32, &prev_children.get(i as u32));
            }
        }

        let next_props = set_children(&props, &next_children);
        Ok(self.reconstruct_with_props(&node, next_props))
    }

    /// §4.3 "Rebinding on move": move both the metadata and any bound
    /// callbacks' canonical names from `old_prefix` to `new_prefix`.
    fn rebind_subtree(&mut self, old_prefix: &Path, new_prefix: &Path) {
        let entries: Vec<NodeMeta> = self
            .meta
            .remove_subtree(old_prefix)
            .into_iter()
            .map(|entry| {
                let suffix = &entry.path.segments()[old_prefix.segments().len()..];
                let mut rebased = new_prefix.clone();
                for seg in suffix {
                    rebased = match seg {
                        PathSegment::Index(i) => rebased.child_index(*i),
                        PathSegment::Key(k) => rebased.child_key(k.clone()),
                    };
                }
                for key in &entry.cb_keys {
                    self.callbacks.rebind(&entry.path.callback_name(key), &rebased.callback_name(key));
                }
                NodeMeta { path: rebased, ..entry }
            })
            .collect();
        for entry in entries {
            self.meta.insert(entry);
        }
    }

    fn teardown_subtree(&mut self, path: &Path) {
        for entry in self.meta.remove_subtree(path) {
            for key in &entry.cb_keys {
                self.callbacks.teardown(&entry.path.callback_name(key));
            }
        }
    }

    /// §4.2 "Critical property preservation": next-props are always fully
    /// computed before this call, so reconstructing via `createElement`
    /// (restoring `key`) is always correct — there's no separate
    /// `cloneElement` path to fall back from.
    fn reconstruct_with_props(&self, node: &JsValue, next_props: Object) -> JsValue {
        let element_type = element_type_of(node);
        let key = element_key_of(node);
        if !key.is_undefined() && !key.is_null() {
            Reflect::set(&next_props, &JsValue::from_str("key"), &key).ok();
        }
        let children = props_children(&next_props).to_vec();
        bindings::reconstruct_element(&element_type, &next_props, &children)
    }
}

fn element_type_of(el: &JsValue) -> JsValue {
    Reflect::get(el, &JsValue::from_str("type")).unwrap_or(JsValue::UNDEFINED)
}

fn element_key_of(el: &JsValue) -> JsValue {
    Reflect::get(el, &JsValue::from_str("key")).unwrap_or(JsValue::NULL)
}

fn element_props(el: &JsValue) -> Object {
    Reflect::get(el, &JsValue::from_str("props"))
        .ok()
        .and_then(|v| v.dyn_into::<Object>().ok())
        .unwrap_or_else(Object::new)
}

fn clone_props(props: &Object) -> Object {
    let target = Object::new();
    Object::assign(&target, props);
    target
}

/// React accepts `children` as a bare value, an array, or absent; normalize
/// to an `Array` for reconciliation.
fn props_children(props: &Object) -> Array {
    let children = Reflect::get(props, &JsValue::from_str("children")).unwrap_or(JsValue::UNDEFINED);
    if children.is_undefined() {
        Array::new()
    } else if children.is_array() {
        children.unchecked_into()
    } else {
        let arr = Array::new();
        arr.push(&children);
        arr
    }
}

fn set_children(props: &Object, children: &Array) -> Object {
    let next = clone_props(props);
    Reflect::set(&next, &JsValue::from_str("children"), children).ok();
    next
}

fn pulse_value_passthrough(value: &PulseValue) -> JsValue {
    expr::pulse_value_to_js(value)
}

fn primitive_to_js(p: &Primitive) -> JsValue {
    match p {
        Primitive::Null => JsValue::NULL,
        Primitive::Undefined => JsValue::UNDEFINED,
        Primitive::Bool(b) => JsValue::from_bool(*b),
        Primitive::Number(n) => JsValue::from_f64(*n),
        Primitive::String(s) => JsValue::from_str(s),
    }
}
