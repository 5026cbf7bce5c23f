pub mod kv;

// We use Crux's built-in Render capability directly because it provides
// all necessary functionality for triggering view updates.
pub use crux_core::render::Render;
pub use crux_kv::KeyValue;

use crate::app::App;
use crate::event::Event;

pub use self::kv::{KvCapability, KvKeyError};

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub kv: KeyValue<Event>,
    pub render: Render<Event>,
}
