//! Preset pattern tables for the built-in detectors.
//!
//! Contains the default signatures for:
//! - Prompt injection / jailbreak phrasings
//! - Context and role shifts
//! - Tool / function-call payload injection
//! - Sensitive keywords
//!
//! Tables are plain static data; the compiled regexes are built once per
//! process on first use. Callers override a table by passing their own
//! pattern list when constructing a detector.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

/// A named detection pattern
#[derive(Debug, Clone)]
pub struct ThreatPattern {
    /// Pattern name
    pub name: &'static str,
    /// Regex pattern
    pub pattern: &'static str,
    /// Which preset table the pattern belongs to
    pub kind: PatternKind,
    /// Description
    pub description: &'static str,
}

/// Preset table identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    /// Injection / jailbreak phrasing
    Injection,
    /// Role or persona override
    ContextShift,
    /// Structured tool-call payloads
    Tool,
}

impl PatternKind {
    /// All preset kinds, in detector registration order
    pub const ALL: [PatternKind; 3] = [
        PatternKind::Injection,
        PatternKind::ContextShift,
        PatternKind::Tool,
    ];

    /// Static table for this kind
    pub fn table(self) -> &'static [ThreatPattern] {
        match self {
            PatternKind::Injection => INJECTION_PATTERNS,
            PatternKind::ContextShift => CONTEXT_SHIFT_PATTERNS,
            PatternKind::Tool => TOOL_PATTERNS,
        }
    }

    /// Compiled table for this kind
    pub fn compiled(self) -> &'static [(Regex, &'static ThreatPattern)] {
        match self {
            PatternKind::Injection => INJECTION_REGEX.as_slice(),
            PatternKind::ContextShift => CONTEXT_SHIFT_REGEX.as_slice(),
            PatternKind::Tool => TOOL_REGEX.as_slice(),
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternKind::Injection => write!(f, "injection"),
            PatternKind::ContextShift => write!(f, "context_shift"),
            PatternKind::Tool => write!(f, "tool"),
        }
    }
}

impl std::str::FromStr for PatternKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "injection" => Ok(PatternKind::Injection),
            "context_shift" | "context" => Ok(PatternKind::ContextShift),
            "tool" => Ok(PatternKind::Tool),
            other => Err(format!("unknown pattern kind: {other}")),
        }
    }
}

macro_rules! threat {
    ($kind:ident, $name:literal, $pattern:literal, $desc:literal) => {
        ThreatPattern {
            name: $name,
            pattern: $pattern,
            kind: PatternKind::$kind,
            description: $desc,
        }
    };
}

/// Prompt injection and jailbreak patterns
pub static INJECTION_PATTERNS: &[ThreatPattern] = &[
    threat!(Injection, "ignore_previous", r"(?i)ignore\s+(all\s+)?previous\s+(instructions|prompts)", "Attempts to override prior instructions"),
    threat!(Injection, "disregard_context", r"(?i)disregard\s+earlier\s+context", "Attempts to discard conversation context"),
    threat!(Injection, "unfiltered_model", r"(?i)as\s+an?\s+(unfiltered|uncensored)\s+model", "Unfiltered model roleplay"),
    threat!(Injection, "no_longer_bound", r"(?i)you\s+are\s+no\s+longer\s+(chatgpt|bound\s+by\s+rules)", "Claims the model is released from its rules"),
    threat!(Injection, "injection_mention", r"(?i)prompt\s*injection", "Explicit prompt injection mention"),
    threat!(Injection, "dan", r"(?i)\bDAN\b", "DAN (Do Anything Now) jailbreak"),
    threat!(Injection, "markdown_system", r"(?i)###\s*system", "Markdown system header"),
    threat!(Injection, "begin_system_prompt", r"(?i)begin\s+system\s+prompt", "Fake system prompt opener"),
    threat!(Injection, "end_system_prompt", r"(?i)end\s+system\s+prompt", "Fake system prompt terminator"),
    threat!(Injection, "system_override", r"(?i)system\s+override", "System override request"),
    threat!(Injection, "system_tag", r"(?i)<\s*system\s*>", "Inline system tag"),
    threat!(Injection, "system_prefix", r"(?i)/?system:", "Fake system message prefix"),
    threat!(Injection, "bypass_safety", r"(?i)bypass\s+(safety|filter)", "Explicit safety bypass"),
    threat!(Injection, "strip_guardrails", r"(?i)strip\s+(safety|guardrails)", "Guardrail removal request"),
    threat!(Injection, "ignore_above", r"(?i)ignore\s+the\s+above\s+directions", "Attempts to override earlier directions"),
    threat!(Injection, "execute_instructions", r"(?i)execute\s+the\s+following\s+instructions", "Embedded instruction execution"),
    threat!(Injection, "translate_no_answer", r"(?i)translate\s+this\s+but\s+do\s+not\s+answer", "Task hijack through translation"),
    threat!(Injection, "pretend_to_be", r"(?i)pretend\s+to\s+be\s+", "Pretend/roleplay bypass"),
    threat!(Injection, "run_shell", r"(?i)run\s+shell\s+command", "Shell command request"),
    threat!(Injection, "plugin_call", r"(?i)\bplugin\b.*\bcall\b", "Plugin invocation request"),
    threat!(Injection, "function_call_json", r#"(?i)"function_call"\s*:\s*\{"#, "Inline function_call object"),
    threat!(Injection, "tool_calls_json", r#"(?i)"tool_calls?"\s*:\s*\["#, "Inline tool_calls array"),
    threat!(Injection, "system_role_json", r#"(?i)"role"\s*:\s*"system""#, "Inline system role message"),
    threat!(Injection, "prompt_jailbreak", r"(?i)prompt\s+jailbreak", "Explicit jailbreak mention"),
    threat!(Injection, "system_jailbreak", r"(?i)system\s+jailbreak", "Explicit jailbreak mention"),
];

/// Context / role shift patterns
pub static CONTEXT_SHIFT_PATTERNS: &[ThreatPattern] = &[
    threat!(ContextShift, "from_now_on", r"(?i)from\s+now\s+on[, ]{0,2}\s*you\s+are\s+", "Persistent persona reassignment"),
    threat!(ContextShift, "switch_role", r"(?i)switch\s+role\s+to\s+", "Role switch request"),
    threat!(ContextShift, "respond_as", r"(?i)start\s+responding\s+as\s+", "Persona override"),
    threat!(ContextShift, "act_as_privileged", r"(?i)act\s+as\s+(system|developer|root|sudo)", "Privileged role impersonation"),
    threat!(ContextShift, "reset_rules", r"(?i)reset\s+all\s+(rules|guidelines)", "Rule reset request"),
    threat!(ContextShift, "override_persona", r"(?i)override\s+the\s+assistant\s+persona", "Assistant persona override"),
    threat!(ContextShift, "new_system_prompt", r"(?i)use\s+the\s+following\s+new\s+system\s+prompt", "System prompt replacement"),
    threat!(ContextShift, "disclose_system_prompt", r"(?i)disclose\s+your\s+system\s+prompt", "System prompt extraction"),
    threat!(ContextShift, "print_hidden", r"(?i)print\s+the\s+hidden\s+instructions", "Hidden instruction extraction"),
    threat!(ContextShift, "reveal_developer", r"(?i)reveal\s+developer\s+message", "Developer message extraction"),
];

/// Tool / function-call injection patterns
pub static TOOL_PATTERNS: &[ThreatPattern] = &[
    threat!(Tool, "function_call_named", r#"(?is)"function_call"\s*:\s*\{[^}]*"name"\s*:\s*".+?""#, "Named function_call payload"),
    threat!(Tool, "tool_calls_array", r#"(?is)"tool_calls?"\s*:\s*\["#, "tool_calls payload"),
    threat!(Tool, "shell_arguments", r#"(?is)"arguments"\s*:\s*"\{?[^"]*"?(command|cmd|shell|bash)"?"#, "Tool arguments carrying a shell command"),
    threat!(Tool, "execute_cli", r"(?i)execute\s+the\s+(cli|shell|bash|powershell)\s+command", "Shell execution request"),
    threat!(Tool, "call_tool", r"(?i)call\s+the\s+following\s+tool", "Tool invocation request"),
    threat!(Tool, "invoke_payload", r"(?i)invoke\s+tool\s+with\s+payload", "Tool payload invocation"),
];

/// Literal keywords matched case-insensitively by the default keyword detector
pub static KEYWORD_LITERALS: &[&str] = &[
    "jailbreak",
    "developer mode",
    "do anything now",
    "ignore all rules",
    "no restrictions",
    "unfiltered response",
    "god mode",
    "sudo mode",
    "hidden instructions",
    "confidential instructions",
    "leak your prompt",
    "disable safety",
];

/// Regex keywords used by the default keyword detector
pub static KEYWORD_REGEXES: &[&str] = &[
    r"(?i)\bbase64\s*[-_]?\s*(decode|encoded)\b",
    r"(?i)\brm\s+-rf\s+/",
    r"(?i)\bcurl\s+[^|\n]*\|\s*(ba)?sh\b",
];

/// Score hint the default guard gives keyword hits
pub const DEFAULT_KEYWORD_SCORE: f64 = 9.0;

fn compile(table: &'static [ThreatPattern]) -> Vec<(Regex, &'static ThreatPattern)> {
    table
        .iter()
        .filter_map(|p| Regex::new(p.pattern).ok().map(|r| (r, p)))
        .collect()
}

lazy_static! {
    /// Compiled injection patterns
    pub static ref INJECTION_REGEX: Vec<(Regex, &'static ThreatPattern)> =
        compile(INJECTION_PATTERNS);

    /// Compiled context-shift patterns
    pub static ref CONTEXT_SHIFT_REGEX: Vec<(Regex, &'static ThreatPattern)> =
        compile(CONTEXT_SHIFT_PATTERNS);

    /// Compiled tool-injection patterns
    pub static ref TOOL_REGEX: Vec<(Regex, &'static ThreatPattern)> =
        compile(TOOL_PATTERNS);
}
