pub mod acquisition;
pub mod events;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod settings;
pub mod ws;

pub use events::RecentEvents;
pub use routes::create_router;
pub use ws::{WsBroadcaster, WsMessage};
