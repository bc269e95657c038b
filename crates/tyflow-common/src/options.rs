//! Checker options that affect narrowing, relation and widening.

use serde::Deserialize;

/// Compiler options consumed by the checker core.
///
/// Deserializes from the `compilerOptions` object of a project config.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckerOptions {
    pub strict: bool,
    pub strict_null_checks: bool,
    pub strict_function_types: bool,
    pub no_implicit_any: bool,
    /// When true, optional properties are treated as exactly `T` instead of `T | undefined`.
    pub exact_optional_property_types: bool,
}

impl CheckerOptions {
    /// Options with the whole strict family enabled.
    pub fn strict() -> Self {
        CheckerOptions {
            strict: true,
            ..Default::default()
        }
        .apply_strict_defaults()
    }

    /// Apply `--strict` defaults to individual strict flags.
    pub fn apply_strict_defaults(mut self) -> Self {
        if self.strict {
            self.strict_null_checks = true;
            self.strict_function_types = true;
            self.no_implicit_any = true;
            // exactOptionalPropertyTypes is not implied by --strict
        }
        self
    }

    /// Parse options from a JSON object, applying strict defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let options: CheckerOptions = serde_json::from_str(text)?;
        Ok(options.apply_strict_defaults())
    }
}
