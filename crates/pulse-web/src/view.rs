//! A mounted view (§4.5 "View lifecycle"): the record the session dispatches
//! incoming `vdom_init`/`vdom_update`/`server_error`/`js_exec` to. The
//! handlers are owned by whatever mounted the view (typically a host
//! component wrapping a [`crate::renderer::Renderer`]); the session only
//! ever forwards to them, it never renders.

use pulse_core::expr::Expr;
use pulse_core::message::ServerErrorInfo;
use pulse_core::patch::Op;
use pulse_core::route::RouteInfo;
use pulse_core::vdom::Node;

/// A view attached at a path. `route_info` is mutated by
/// [`crate::session::Session::update_route`] and re-sent as the `routeInfo`
/// of every re-issued `attach` on reconnect.
pub struct MountedView {
    pub route_info: RouteInfo,
    pub on_init: Box<dyn FnMut(Node)>,
    pub on_update: Box<dyn FnMut(Vec<Op>)>,
    pub on_js_exec: Box<dyn FnMut(String, Expr)>,
    pub on_server_error: Box<dyn FnMut(ServerErrorInfo)>,
}

impl MountedView {
    pub fn new(
        route_info: RouteInfo,
        on_init: impl FnMut(Node) + 'static,
        on_update: impl FnMut(Vec<Op>) + 'static,
        on_js_exec: impl FnMut(String, Expr) + 'static,
        on_server_error: impl FnMut(ServerErrorInfo) + 'static,
    ) -> MountedView {
        MountedView {
            route_info,
            on_init: Box::new(on_init),
            on_update: Box::new(on_update),
            on_js_exec: Box::new(on_js_exec),
            on_server_error: Box::new(on_server_error),
        }
    }
}
