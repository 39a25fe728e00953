//! Toolbar layer over the inkstone engine: projects document and
//! selection into renderable state and turns toolbar intents into engine
//! commands. Holds no document data of its own.

mod controller;
mod projector;
mod state;
mod subscriptions;

pub use crate::controller::*;
pub use crate::projector::*;
pub use crate::state::*;
pub use crate::subscriptions::*;
