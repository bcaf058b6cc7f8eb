//! Rule dispatch engine for Voxrule.
//!
//! Matches a transcribed utterance against the enabled rules, runs the
//! matched rule's action through exactly one executor and turns the result,
//! or the failure, into an [`Outcome`].

pub mod device;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod handler;
pub mod matcher;
pub mod normalize;
pub mod types;

pub use device::{DeviceEvent, DeviceHandle, PlayRequest, PlaySource, PlaybackState};
pub use dispatcher::Dispatcher;
pub use engine::RuleEngine;
pub use error::ActionError;
pub use matcher::find_match;
pub use types::Outcome;
