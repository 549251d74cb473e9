// Public API
pub use actions::{ActionError, ClientAction};
pub use broadcaster::{Broadcaster, Outbox};
pub use connection_manager::{ConnectionManager, InMemoryConnectionManager};
pub use handler::{websocket_handler, WebsocketReceiveHandler};
pub use messages::{MessageType, WebSocketMessage};
pub use socket::{Connection, MessageHandler, SocketError, SocketWrapper};

// Internal modules
pub mod actions;
pub mod broadcaster;
mod connection_manager;
mod handler;
pub mod messages;
mod socket;
