mod bulk;
pub use bulk::BulkLoad;

mod client;
pub use client::Client;

mod feed;
pub use feed::Feed;

mod insert;
pub use insert::{insert_sorted, Insertion};

mod placement;
pub use placement::{Anchor, Placement};

mod retry;
pub use retry::RetryQueue;

mod session;
pub use session::{Arrival, ChannelSession};

mod store;
pub use store::{NodeRef, NodeStore, ThreadNode};

mod surface;
pub use surface::{ListSurface, MessageView, Surface, SurfaceError};

mod transport;
pub use transport::{PayloadStream, Transport};

mod fuzz;

pub mod api {
    pub use chatter_api::*;
}
