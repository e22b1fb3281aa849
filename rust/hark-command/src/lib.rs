//! # Hark Command — trigger matching and handler dispatch
//!
//! Decides which handler answers a chat message and with which parameters:
//!
//! - [`Trigger`]s are named predicates over a [`Message`]: a classifier
//!   category ([`CategoryTrigger`]), a text shape ([`TextTrigger`]) or a
//!   number of parameters ([`RequiredParamsTrigger`]).
//! - [`ParamsParser`] finds keyword parameters and their arguments in the
//!   normalized message.
//! - [`TriggerCommand`] binds handlers to sets of triggers and runs the
//!   first binding whose triggers all apply. [`Listeners`] tries every
//!   command in order and stays silent when none applies.
//! - [`MessageSource`] renders replies from per-language templates.
//! - [`CommandsConfig`] reads trigger and reply declarations from JSON.
//!
//! ```text
//! message ─▶ Listeners ─▶ TriggerCommand ─▶ bindings ─▶ triggers ─▶ handler(params)
//!                                                                      │
//!                                                       MessageSource ◀┘
//! ```
//!
//! Errors are the [`NlpError`] of `hark-nlp`, so one error type flows from
//! training through dispatch.

pub mod command;
pub mod config;
pub mod message;
pub mod messages;
pub mod params;
pub mod trigger;

pub use command::{Binding, Handler, Listeners, MessageListener, TriggerCommand};
pub use config::{CommandConfig, CommandsConfig, ResolvedCommand, TriggerConfig};
pub use hark_nlp::{Language, NlpError, NlpResult};
pub use message::{Entity, EntityKind, Message, MessageNormalizer};
pub use messages::{
    MessageBank, MessageSource, MessageValue, RandomSource, SeededRandom, ThreadRandom,
};
pub use params::{ParamDefinition, ParamValue, ParamsParser};
pub use trigger::{CategoryTrigger, DEFAULT_SCORE, RequiredParamsTrigger, TextTrigger, Trigger};
