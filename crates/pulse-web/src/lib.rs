//! Web-sys client runtime: websocket session, VDOM reconciliation against a
//! React host tree, and the callback/channel/ref bridges that let a
//! server-rendered tree stay interactive in the browser (§4).

pub mod callbacks;
pub mod channel;
pub mod config;
pub mod error;
pub mod expr;
pub mod hydrate;
pub(crate) mod json;
pub mod meta;
pub mod mount;
pub mod offline;
pub mod refs;
pub mod renderer;
pub mod session;
pub mod view;
pub mod wire;

pub use callbacks::{CallbackRegistry, CallbackSpec};
pub use channel::ChannelRegistry;
pub use config::PulseConfig;
pub use error::PulseError;
pub use meta::{MetaStore, NodeMeta};
pub use refs::RefRegistry;
pub use renderer::Renderer;
pub use session::{ConnectionStateMachine, ConnectionStatus, Session};
pub use view::MountedView;
