mod index;
mod link;
mod passthrough;

pub use index::index_handler;
pub use link::link_handler;
pub use passthrough::{proxy_handler, sub_handler};
