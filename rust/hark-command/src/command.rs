//! Commands and handler dispatch.
//!
//! A [`TriggerCommand`] owns a set of named triggers and binds handlers to
//! combinations of them. When a message arrives the first binding whose
//! triggers all apply wins, its parameters are parsed and its handler runs:
//!
//! ```rust,ignore
//! let command = TriggerCommand::new("ConvertNumbers", Language::Spanish, &normalizer)
//!     .trigger(CategoryTrigger::new("convert", classifier, "convert", DEFAULT_SCORE))
//!     .params("numbers", vec![ParamDefinition::param("romanos"), ParamDefinition::param("decimales")], 2, 2)
//!     .bind_with_params(["convert"], "numbers", |replies: &mut Vec<String>, _, params| {
//!         replies.push(params.iter().map(ToString::to_string).collect::<Vec<_>>().join(" -> "));
//!     })?;
//! ```
//!
//! [`Listeners`] runs a message past every command in order and answers
//! with the first command that takes it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use hark_nlp::{Language, NlpError, NlpResult, Normalizer};
use tracing::{debug, info, warn};

use crate::config::ResolvedCommand;
use crate::message::Message;
use crate::messages::MessageSource;
use crate::params::{ParamDefinition, ParamValue};
use crate::trigger::{RequiredParamsTrigger, Trigger};

pub type PlainHandler<C, R> = Box<dyn Fn(&mut C, &Message) -> R + Send + Sync>;
pub type ParamsHandler<C, R> = Box<dyn Fn(&mut C, &Message, &[ParamValue]) -> R + Send + Sync>;

/// The code run for a matching binding.
pub enum Handler<C, R> {
    Plain(PlainHandler<C, R>),
    WithParams(ParamsHandler<C, R>),
}

impl<C, R> Handler<C, R> {
    fn call(&self, context: &mut C, message: &Message, params: &[ParamValue]) -> R {
        match self {
            Handler::Plain(handler) => handler(context, message),
            Handler::WithParams(handler) => handler(context, message, params),
        }
    }
}

/// A handler with the triggers that must all apply for it to run.
pub struct Binding<C, R> {
    triggers: Vec<Arc<Trigger>>,
    params: Option<Arc<RequiredParamsTrigger>>,
    handler: Handler<C, R>,
}

impl<C, R> Binding<C, R> {
    pub fn trigger_names(&self) -> impl Iterator<Item = &str> {
        self.triggers.iter().map(|trigger| trigger.name())
    }

    pub fn params_name(&self) -> Option<&str> {
        self.params.as_deref().map(RequiredParamsTrigger::name)
    }

    fn applies(&self, message: &Message, language: Language) -> bool {
        self.triggers
            .iter()
            .all(|trigger| trigger.applies(message, language))
            && self
                .params
                .as_ref()
                .is_none_or(|params| params.applies(message))
    }
}

impl<C, R> fmt::Debug for Binding<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("triggers", &self.trigger_names().collect::<Vec<_>>())
            .field("params", &self.params_name())
            .finish_non_exhaustive()
    }
}

pub struct TriggerCommand<C, R> {
    name: String,
    language: Language,
    normalizer: Normalizer,
    triggers: Vec<Arc<Trigger>>,
    params: HashMap<String, Arc<RequiredParamsTrigger>>,
    bindings: Vec<Binding<C, R>>,
    messages: MessageSource,
}

impl<C, R> fmt::Debug for TriggerCommand<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerCommand")
            .field("name", &self.name)
            .field("language", &self.language)
            .field("bindings", &self.bindings)
            .finish_non_exhaustive()
    }
}

impl<C, R> TriggerCommand<C, R> {
    pub fn new(name: impl Into<String>, language: Language, normalizer: &Normalizer) -> Self {
        TriggerCommand {
            name: name.into(),
            language,
            normalizer: normalizer.reset(),
            triggers: Vec::new(),
            params: HashMap::new(),
            bindings: Vec::new(),
            messages: MessageSource::empty(language),
        }
    }

    /// A command with the triggers and messages of its configuration.
    pub fn from_config(config: ResolvedCommand, normalizer: &Normalizer) -> Self {
        let mut command = Self::new(config.name, config.language, normalizer);
        command.triggers = config.triggers.into_iter().map(Arc::new).collect();
        command.messages = config.messages;
        command
    }

    pub fn trigger(mut self, trigger: impl Into<Trigger>) -> Self {
        self.triggers.push(Arc::new(trigger.into()));
        self
    }

    pub fn messages(mut self, messages: MessageSource) -> Self {
        self.messages = messages;
        self
    }

    /// Declare a named parameter set, valid when between `min` and `max` of
    /// its parameters are present.
    pub fn params(
        mut self,
        name: impl Into<String>,
        definitions: Vec<ParamDefinition>,
        min: usize,
        max: usize,
    ) -> Self {
        let name = name.into();
        let trigger = RequiredParamsTrigger::new(
            name.clone(),
            definitions,
            min,
            max,
            self.language,
            &self.normalizer,
        );
        self.params.insert(name, Arc::new(trigger));
        self
    }

    /// Run `handler` when every trigger in `trigger_names` applies.
    pub fn bind<I, S, F>(self, trigger_names: I, handler: F) -> NlpResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&mut C, &Message) -> R + Send + Sync + 'static,
    {
        self.add_binding(trigger_names, None, Handler::Plain(Box::new(handler)))
    }

    /// Like [`TriggerCommand::bind`], also requiring the parameter set
    /// `params_name` and passing its valid values to `handler`.
    pub fn bind_with_params<I, S, F>(
        self,
        trigger_names: I,
        params_name: &str,
        handler: F,
    ) -> NlpResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&mut C, &Message, &[ParamValue]) -> R + Send + Sync + 'static,
    {
        self.add_binding(
            trigger_names,
            Some(params_name),
            Handler::WithParams(Box::new(handler)),
        )
    }

    fn add_binding<I, S>(
        mut self,
        trigger_names: I,
        params_name: Option<&str>,
        handler: Handler<C, R>,
    ) -> NlpResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let triggers = trigger_names
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                self.triggers
                    .iter()
                    .find(|trigger| trigger.name() == name)
                    .cloned()
                    .ok_or_else(|| {
                        NlpError::configuration(format!(
                            "command '{}' has no trigger named '{name}'",
                            self.name
                        ))
                    })
            })
            .collect::<NlpResult<Vec<_>>>()?;

        let params = params_name
            .map(|name| {
                self.params.get(name).cloned().ok_or_else(|| {
                    NlpError::configuration(format!(
                        "command '{}' has no parameter set named '{name}'",
                        self.name
                    ))
                })
            })
            .transpose()?;

        self.bindings.push(Binding {
            triggers,
            params,
            handler,
        });
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn message_source(&self) -> &MessageSource {
        &self.messages
    }

    /// Bindings that would take `message`, in registration order.
    pub fn matching_bindings(&self, message: &Message) -> Vec<&Binding<C, R>> {
        if message.is_bot_command() {
            return Vec::new();
        }
        self.bindings
            .iter()
            .filter(|binding| {
                let applies = binding.applies(message, self.language);
                debug!("command '{}': binding {binding:?} applies: {applies}", self.name);
                applies
            })
            .collect()
    }

    /// Whether some binding takes `message`. Bot commands are never taken.
    pub fn applies(&self, message: &Message) -> bool {
        !message.is_bot_command()
            && self
                .bindings
                .iter()
                .any(|binding| binding.applies(message, self.language))
    }

    /// Run the first binding that takes `message`.
    pub fn dispatch(&self, context: &mut C, message: &Message) -> NlpResult<R> {
        let matching = self.matching_bindings(message);
        let Some(binding) = matching.first() else {
            return Err(NlpError::NoHandlerMatched {
                command: self.name.clone(),
            });
        };
        if matching.len() > 1 {
            warn!(
                "command '{}': {} bindings apply, running the first one",
                self.name,
                matching.len()
            );
        }

        let params = match &binding.params {
            Some(params) => params.resolve(message)?,
            None => Vec::new(),
        };
        info!(
            "command '{}': running binding {binding:?} with [{}]",
            self.name,
            params
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(binding.handler.call(context, message, &params))
    }
}

/// Anything that can take a message.
pub trait MessageListener<C, R>: Send + Sync {
    fn name(&self) -> &str;

    fn applies(&self, message: &Message) -> bool;

    fn handle(&self, context: &mut C, message: &Message) -> NlpResult<R>;
}

impl<C, R> MessageListener<C, R> for TriggerCommand<C, R> {
    fn name(&self) -> &str {
        TriggerCommand::name(self)
    }

    fn applies(&self, message: &Message) -> bool {
        TriggerCommand::applies(self, message)
    }

    fn handle(&self, context: &mut C, message: &Message) -> NlpResult<R> {
        self.dispatch(context, message)
    }
}

/// Listeners in evaluation order.
pub struct Listeners<C, R> {
    listeners: Vec<Box<dyn MessageListener<C, R>>>,
}

impl<C, R> Default for Listeners<C, R> {
    fn default() -> Self {
        Listeners {
            listeners: Vec::new(),
        }
    }
}

impl<C, R> Listeners<C, R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, listener: impl MessageListener<C, R> + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// The answer of the first listener that takes `message`, or `None`.
    pub fn evaluate(&self, context: &mut C, message: &Message) -> Option<R> {
        for listener in &self.listeners {
            if !listener.applies(message) {
                continue;
            }
            match listener.handle(context, message) {
                Ok(reply) => return Some(reply),
                Err(error) => warn!("listener '{}' failed: {error}", listener.name()),
            }
        }
        debug!("no listener takes the message");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::TextTrigger;
    use hark_nlp::Lexicon;
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    fn normalizer() -> Normalizer {
        Normalizer::new(Arc::new(Lexicon::builtin().unwrap()))
    }

    fn command<R>() -> TriggerCommand<Vec<String>, R> {
        let normalizer = normalizer();
        TriggerCommand::new("Greeter", Language::Spanish, &normalizer)
            .trigger(TextTrigger::new("hello", &normalizer).starts_with("hola"))
            .trigger(TextTrigger::new("question", &normalizer).ends_with("?"))
    }

    #[test]
    fn first_matching_binding_wins() -> TestResult {
        let command = command()
            .bind(["hello", "question"], |log: &mut Vec<String>, _: &Message| {
                log.push("both".into());
                "both"
            })?
            .bind(["hello"], |log: &mut Vec<String>, _: &Message| {
                log.push("hello".into());
                "hello"
            })?;

        let mut log = Vec::new();
        assert_eq!(command.dispatch(&mut log, &Message::new("hola, todo bien?"))?, "both");
        assert_eq!(command.dispatch(&mut log, &Message::new("hola"))?, "hello");
        assert_eq!(log, vec!["both", "hello"]);

        assert_eq!(command.matching_bindings(&Message::new("hola?")).len(), 2);
        Ok(())
    }

    #[test]
    fn no_match_is_reported() -> TestResult {
        let command = command().bind(["hello"], |_: &mut Vec<String>, _: &Message| "hello")?;
        let message = Message::new("chau");
        assert!(!command.applies(&message));
        assert!(matches!(
            command.dispatch(&mut Vec::new(), &message),
            Err(NlpError::NoHandlerMatched { command }) if command == "Greeter"
        ));
        Ok(())
    }

    #[test]
    fn bot_commands_never_apply() -> TestResult {
        let command = command().bind(["hello"], |_: &mut Vec<String>, _: &Message| "hello")?;
        let message =
            Message::new("hola /start").with_entity(crate::EntityKind::BotCommand, "/start");
        assert!(!command.applies(&message));
        assert!(command.dispatch(&mut Vec::new(), &message).is_err());
        Ok(())
    }

    #[test]
    fn unknown_names_are_configuration_errors() {
        let unknown_trigger = command().bind(["nope"], |_: &mut Vec<String>, _: &Message| "");
        assert!(matches!(unknown_trigger, Err(NlpError::Configuration(_))));

        let unknown_params = command().bind_with_params(
            ["hello"],
            "numbers",
            |_: &mut Vec<String>, _: &Message, _: &[ParamValue]| "",
        );
        assert!(matches!(unknown_params, Err(NlpError::Configuration(_))));
    }

    #[test]
    fn params_are_passed_to_the_handler() -> TestResult {
        let command = command()
            .params("size", vec![ParamDefinition::with_args("base", 1)], 1, 1)
            .bind_with_params(
                ["hello"],
                "size",
                |_: &mut Vec<String>, _: &Message, params: &[ParamValue]| params.len(),
            )?;

        assert_eq!(command.dispatch(&mut Vec::new(), &Message::new("hola base 16"))?, 1);
        assert!(!command.applies(&Message::new("hola base")));
        Ok(())
    }

    #[test]
    fn listeners_answer_with_the_first_taker() -> TestResult {
        let normalizer = normalizer();
        let farewell = TriggerCommand::new("Farewell", Language::Spanish, &normalizer)
            .trigger(TextTrigger::new("bye", &normalizer).contains(["chau"]))
            .bind(["bye"], |_: &mut Vec<String>, _: &Message| "bye")?;
        let greeter = command().bind(["hello"], |_: &mut Vec<String>, _: &Message| "hello")?;
        let listeners = Listeners::new().add(farewell).add(greeter);

        let mut log = Vec::new();
        assert_eq!(listeners.evaluate(&mut log, &Message::new("hola")), Some("hello"));
        assert_eq!(listeners.evaluate(&mut log, &Message::new("chau")), Some("bye"));
        assert_eq!(listeners.evaluate(&mut log, &Message::new("nada")), None);
        Ok(())
    }
}
