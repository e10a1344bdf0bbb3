pub mod config;
pub mod element;
pub mod error;
pub mod graph;
pub mod logging;
pub mod notifier;
pub mod query;
pub mod relay;
pub mod shared;
pub mod store;

pub use config::WhiteboardConfig;
pub use element::{
    Element, ElementKind, EmbedType, EmbeddedLink, ExtraFields, FlowNode, FlowShape,
    MermaidDiagram, StickyColor, StickyNote, WELCOME_NOTE_ID, WELCOME_NOTE_TEXT, WhiteboardData,
};
pub use error::{ErrorCategory, WhiteboardError};
pub use graph::Edge;
pub use notifier::{Subscription, SubscriptionGuard, UpdateCallback, UpdateNotifier};
pub use query::WhiteboardStats;
pub use relay::{ClientMessage, ServerMessage, ViewerRelay, ViewerSession, handle_client_message};
pub use shared::SharedWhiteboard;
pub use store::{WhiteboardStore, generate_id};
