use hark_nlp::{Language, NlpError, NlpResult, Normalizer};
use tracing::debug;

use crate::message::Message;
use crate::params::{ParamDefinition, ParamValue, ParamsParser};

/// Applies when a message carries between `min` and `max` valid parameters.
/// A trigger without parameters always applies.
#[derive(Debug, Clone)]
pub struct RequiredParamsTrigger {
    name: String,
    parser: ParamsParser,
    min: usize,
    max: usize,
}

impl RequiredParamsTrigger {
    pub fn new(
        name: impl Into<String>,
        params: Vec<ParamDefinition>,
        min: usize,
        max: usize,
        language: Language,
        normalizer: &Normalizer,
    ) -> Self {
        RequiredParamsTrigger {
            name: name.into(),
            parser: ParamsParser::new(params, language, normalizer),
            min,
            max,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamDefinition] {
        self.parser.params()
    }

    /// The valid parameters of `message`, in the order they were mentioned.
    pub fn resolve(&self, message: &Message) -> NlpResult<Vec<ParamValue>> {
        let valid: Vec<ParamValue> = self
            .parser
            .parse(&message.text)
            .into_iter()
            .filter(|param| param.valid)
            .collect();

        if (self.min..=self.max).contains(&valid.len()) {
            Ok(valid)
        } else {
            Err(NlpError::ParamParse {
                expected_min: self.min,
                expected_max: self.max,
                found: valid.len(),
            })
        }
    }

    pub fn applies(&self, message: &Message) -> bool {
        if self.parser.params().is_empty() {
            return true;
        }
        match self.resolve(message) {
            Ok(_) => true,
            Err(error) => {
                debug!("trigger '{}': {error}", self.name);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hark_nlp::Lexicon;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn trigger(params: Vec<ParamDefinition>, min: usize, max: usize) -> RequiredParamsTrigger {
        let normalizer = Normalizer::new(Arc::new(Lexicon::builtin().unwrap()));
        RequiredParamsTrigger::new("params", params, min, max, Language::Spanish, &normalizer)
    }

    #[test]
    fn counts_must_be_within_bounds() {
        let trigger = trigger(
            vec![ParamDefinition::param("romanos"), ParamDefinition::param("decimales")],
            2,
            2,
        );

        let message = Message::new("convertir de decimales a romanos");
        assert!(trigger.applies(&message));
        let names: Vec<String> = trigger
            .resolve(&message)
            .unwrap()
            .into_iter()
            .map(|param| param.name)
            .collect();
        assert_eq!(names, vec!["decimales", "romanos"]);

        let short = Message::new("convertir a romanos");
        assert!(!trigger.applies(&short));
        assert!(matches!(
            trigger.resolve(&short),
            Err(NlpError::ParamParse {
                expected_min: 2,
                expected_max: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn no_params_always_applies() {
        assert!(trigger(vec![], 1, 3).applies(&Message::new("hola")));
    }
}
