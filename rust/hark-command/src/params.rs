//! Positional parameters.
//!
//! A parameter is a keyword optionally followed by a fixed number of
//! arguments: in "convertir romanos base 10", `romanos` takes none and
//! `base` takes one. Keywords and arguments are matched on normalized
//! tokens, so "números" and "numeros" are the same keyword.

use std::fmt;

use hark_nlp::{Language, Normalizer};

/// A parameter a command understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDefinition {
    pub name: String,
    /// Number of tokens following the keyword that belong to it.
    pub args: usize,
    pub required: bool,
}

impl ParamDefinition {
    /// A keyword without arguments.
    pub fn param(name: impl Into<String>) -> Self {
        Self::with_args(name, 0)
    }

    pub fn with_args(name: impl Into<String>, args: usize) -> Self {
        ParamDefinition {
            name: name.into(),
            args,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A parameter as found in a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamValue {
    pub name: String,
    pub values: Vec<String>,
    pub valid: bool,
}

impl ParamValue {
    pub fn valid(name: impl Into<String>, values: Vec<String>) -> Self {
        ParamValue {
            name: name.into(),
            values,
            valid: true,
        }
    }

    pub fn invalid(name: impl Into<String>) -> Self {
        ParamValue {
            name: name.into(),
            values: Vec::new(),
            valid: false,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for value in &self.values {
            write!(f, " {value}")?;
        }
        Ok(())
    }
}

/// Finds declared parameters in a text.
#[derive(Debug, Clone)]
pub struct ParamsParser {
    params: Vec<ParamDefinition>,
    language: Language,
    /// Normalizes the text: stemmed, without stop words.
    text_normalizer: Normalizer,
    /// Normalizes keywords: stemmed, stop words kept.
    name_normalizer: Normalizer,
}

impl ParamsParser {
    pub fn new(params: Vec<ParamDefinition>, language: Language, normalizer: &Normalizer) -> Self {
        let name_normalizer = normalizer.reset();
        ParamsParser {
            params,
            language,
            text_normalizer: name_normalizer.clone().remove_stop_words(),
            name_normalizer,
        }
    }

    pub fn params(&self) -> &[ParamDefinition] {
        &self.params
    }

    /// One value per definition: the valid ones ordered by where their
    /// keyword appears in the text, then the invalid ones in definition order.
    pub fn parse(&self, text: &str) -> Vec<ParamValue> {
        let tokens = self.text_normalizer.tokens(text, self.language);
        let names: Vec<String> = self
            .params
            .iter()
            .map(|param| self.name_normalizer.normalize(&param.name, self.language))
            .collect();

        let mut parsed: Vec<(usize, ParamValue)> = self
            .params
            .iter()
            .zip(&names)
            .map(|(param, name)| {
                let Some(index) = tokens.iter().position(|token| token == name) else {
                    return (usize::MAX, ParamValue::invalid(&param.name));
                };
                let arguments = (index + 1)
                    .checked_add(param.args)
                    .and_then(|end| tokens.get(index + 1..end));
                match arguments {
                    Some(arguments) if !arguments.iter().any(|token| names.contains(token)) => {
                        (index, ParamValue::valid(&param.name, arguments.to_vec()))
                    }
                    _ => (usize::MAX, ParamValue::invalid(&param.name)),
                }
            })
            .collect();

        parsed.sort_by_key(|(index, _)| *index);
        parsed.into_iter().map(|(_, value)| value).collect()
    }
}
