//! Argument parsing for the string invocation surface
//!
//! Every argument is a string of at most [`MAX_ARG_LEN`] characters. Required
//! text arguments must also be non-empty. Numbers are decimal strings and
//! booleans are `true`/`false`; a parse failure is a validation error.

use crate::{types::Telemetry, Error, Result};
use std::str::FromStr;

/// Maximum characters in one argument
pub const MAX_ARG_LEN: usize = 256;

/// Positional arguments of one invocation
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    values: &'a [String],
}

impl<'a> Args<'a> {
    /// Check the argument count and lengths
    pub fn new(operation: &'a str, values: &'a [String], expected: usize) -> Result<Self> {
        if values.len() != expected {
            return Err(Error::Validation(format!(
                "Incorrect number of arguments for {}. Expecting {}, got {}",
                operation,
                expected,
                values.len()
            )));
        }
        for (i, value) in values.iter().enumerate() {
            if value.chars().count() > MAX_ARG_LEN {
                return Err(Error::Validation(format!(
                    "Argument {} must be <= {} characters",
                    i, MAX_ARG_LEN
                )));
            }
        }
        Ok(Self { values })
    }

    fn raw(&self, index: usize) -> Result<&'a str> {
        self.values
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| Error::Validation(format!("Argument {} is missing", index)))
    }

    /// Required, non-empty text
    pub fn text(&self, index: usize) -> Result<String> {
        let value = self.raw(index)?;
        if value.is_empty() {
            return Err(Error::Validation(format!(
                "Argument {} must be a non-empty string",
                index
            )));
        }
        Ok(value.to_string())
    }

    /// Text that may be empty
    pub fn optional_text(&self, index: usize) -> Result<String> {
        self.raw(index).map(str::to_string)
    }

    /// Integer of any width
    pub fn int<T>(&self, index: usize, name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let value = self.text(index)?;
        value
            .trim()
            .parse()
            .map_err(|e| Error::Validation(format!("{} must be an integer: {}", name, e)))
    }

    /// Finite decimal number
    pub fn float(&self, index: usize, name: &str) -> Result<f64> {
        let value = self.text(index)?;
        let parsed: f64 = value
            .trim()
            .parse()
            .map_err(|e| Error::Validation(format!("{} must be a number: {}", name, e)))?;
        if !parsed.is_finite() {
            return Err(Error::Validation(format!("{} must be finite", name)));
        }
        Ok(parsed)
    }

    /// `true` or `false`
    pub fn boolean(&self, index: usize, name: &str) -> Result<bool> {
        match self.text(index)?.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(Error::Validation(format!(
                "{} must be true or false, got {:?}",
                name, other
            ))),
        }
    }

    /// Integer percentage in 0..=100
    pub fn percent(&self, index: usize, name: &str) -> Result<u8> {
        let value: u8 = self.int(index, name)?;
        if value > 100 {
            return Err(Error::Validation(format!(
                "{} must be between 0 and 100, got {}",
                name, value
            )));
        }
        Ok(value)
    }

    /// Four consecutive arguments: soc, soh, energyContent, cdc
    pub fn telemetry(&self, start: usize) -> Result<Telemetry> {
        Ok(Telemetry {
            soc: self.percent(start, "soC")?,
            soh: self.percent(start + 1, "soH")?,
            energy_content: self.float(start + 2, "energyContent")?,
            cdc: self.int(start + 3, "cdc")?,
        })
    }
}
