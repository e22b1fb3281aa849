//! Triggers decide whether a handler is interested in a message.
//!
//! Every trigger is a named, immutable predicate over a message and the
//! command language. Handlers are bound to trigger names, and a binding
//! applies only when all of its triggers do.

use hark_nlp::Language;

use crate::message::Message;

mod category;
mod required_params;
mod text;

pub use category::{CategoryTrigger, DEFAULT_SCORE};
pub use required_params::RequiredParamsTrigger;
pub use text::TextTrigger;

#[derive(Debug, Clone)]
pub enum Trigger {
    /// The message classifies into a category.
    Category(CategoryTrigger),
    /// The message text has a literal or regular shape.
    Text(TextTrigger),
    /// The message carries enough parameters.
    RequiredParams(RequiredParamsTrigger),
}

impl Trigger {
    pub fn name(&self) -> &str {
        match self {
            Trigger::Category(trigger) => trigger.name(),
            Trigger::Text(trigger) => trigger.name(),
            Trigger::RequiredParams(trigger) => trigger.name(),
        }
    }

    pub fn applies(&self, message: &Message, language: Language) -> bool {
        match self {
            Trigger::Category(trigger) => trigger.applies(message, language),
            Trigger::Text(trigger) => trigger.applies(message, language),
            Trigger::RequiredParams(trigger) => trigger.applies(message),
        }
    }
}

impl From<CategoryTrigger> for Trigger {
    fn from(trigger: CategoryTrigger) -> Self {
        Trigger::Category(trigger)
    }
}

impl From<TextTrigger> for Trigger {
    fn from(trigger: TextTrigger) -> Self {
        Trigger::Text(trigger)
    }
}

impl From<RequiredParamsTrigger> for Trigger {
    fn from(trigger: RequiredParamsTrigger) -> Self {
        Trigger::RequiredParams(trigger)
    }
}
