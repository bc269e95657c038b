#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Suggestion,
    Message,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

pub mod diagnostic_messages {
    pub const THE_CONTAINING_FUNCTION_OR_MODULE_BODY_IS_TOO_LARGE_FOR_CONTROL_FLOW_ANALYSIS:
        &str = "The containing function or module body is too large for control flow analysis.";
    pub const TYPE_PARAMETER_0_HAS_A_CIRCULAR_DEFAULT: &str =
        "Type parameter '{0}' has a circular default.";
    pub const MEMBER_0_IMPLICITLY_HAS_AN_1_TYPE: &str =
        "Member '{0}' implicitly has an '{1}' type.";
}

pub mod diagnostic_codes {
    pub const THE_CONTAINING_FUNCTION_OR_MODULE_BODY_IS_TOO_LARGE_FOR_CONTROL_FLOW_ANALYSIS: u32 =
        2563;
    pub const TYPE_PARAMETER_0_HAS_A_CIRCULAR_DEFAULT: u32 = 2716;
    pub const MEMBER_0_IMPLICITLY_HAS_AN_1_TYPE: u32 = 7008;
}

pub const DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    DiagnosticMessage {
        code: diagnostic_codes::THE_CONTAINING_FUNCTION_OR_MODULE_BODY_IS_TOO_LARGE_FOR_CONTROL_FLOW_ANALYSIS,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::THE_CONTAINING_FUNCTION_OR_MODULE_BODY_IS_TOO_LARGE_FOR_CONTROL_FLOW_ANALYSIS,
    },
    DiagnosticMessage {
        code: diagnostic_codes::TYPE_PARAMETER_0_HAS_A_CIRCULAR_DEFAULT,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::TYPE_PARAMETER_0_HAS_A_CIRCULAR_DEFAULT,
    },
    DiagnosticMessage {
        code: diagnostic_codes::MEMBER_0_IMPLICITLY_HAS_AN_1_TYPE,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::MEMBER_0_IMPLICITLY_HAS_AN_1_TYPE,
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRelatedInformation {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
    pub related_information: Vec<DiagnosticRelatedInformation>,
}

impl Diagnostic {
    pub fn error(
        file: impl Into<String>,
        start: u32,
        length: u32,
        message: impl Into<String>,
        code: u32,
    ) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            message_text: message.into(),
            code,
            file: file.into(),
            start,
            length,
            related_information: Vec::new(),
        }
    }

    /// Build an error diagnostic from its registered code and template arguments.
    pub fn from_code(
        file: impl Into<String>,
        start: u32,
        length: u32,
        code: u32,
        args: &[&str],
    ) -> Self {
        let message = get_message_template(code)
            .map(|template| format_message(template, args))
            .unwrap_or_default();
        Self::error(file, start, length, message, code)
    }

    pub fn with_related(
        mut self,
        file: impl Into<String>,
        start: u32,
        length: u32,
        message: impl Into<String>,
    ) -> Self {
        self.related_information.push(DiagnosticRelatedInformation {
            category: DiagnosticCategory::Message,
            code: 0,
            file: file.into(),
            start,
            length,
            message_text: message.into(),
        });
        self
    }
}

pub fn get_message_template(code: u32) -> Option<&'static str> {
    DIAGNOSTIC_MESSAGES
        .iter()
        .find(|m| m.code == code)
        .map(|m| m.message)
}

pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_uses_registered_template() {
        let diag = Diagnostic::from_code(
            "a.ts",
            10,
            4,
            diagnostic_codes::THE_CONTAINING_FUNCTION_OR_MODULE_BODY_IS_TOO_LARGE_FOR_CONTROL_FLOW_ANALYSIS,
            &[],
        );
        assert_eq!(diag.code, 2563);
        assert_eq!(diag.category, DiagnosticCategory::Error);
        assert_eq!(
            diag.message_text,
            "The containing function or module body is too large for control flow analysis."
        );
    }

    #[test]
    fn test_format_message_substitutes_placeholders() {
        let text = format_message(diagnostic_messages::TYPE_PARAMETER_0_HAS_A_CIRCULAR_DEFAULT, &["T"]);
        assert_eq!(text, "Type parameter 'T' has a circular default.");
    }
}
