//! Utensil subsystem for agent-callable capabilities.
//!
//! Each utensil implements the [`Utensil`] trait defined in [`traits`]: a wire
//! name, a one-line description, the parameter names it accepts, and an async
//! `execute` that turns a [`ParamSet`] into a result string for the model.
//!
//! Utensils are assembled into a [`UtensilRegistry`], which dispatches parsed
//! calls by name and renders the system prompt teaching the model the
//! `UTENSIL:` wire format. Execution never fails at the registry boundary:
//! unknown names and unusable parameters come back as `Error: ...` result
//! strings so the agent loop can feed them straight back to the model.

pub mod file_edit;
pub mod file_read;
pub mod file_write;
pub mod shell;
pub mod traits;
pub mod validate;

pub use file_edit::FileEditUtensil;
pub use file_read::FileReadUtensil;
pub use file_write::FileWriteUtensil;
pub use shell::ShellUtensil;
pub use traits::{ArgumentError, Utensil};
pub use validate::ValidateSyntaxUtensil;

use crate::parser::{ParamSet, UtensilCall};

/// Create the default utensil set: file read/write/edit, shell, and syntax
/// validation.
pub fn default_utensils() -> Vec<Box<dyn Utensil>> {
    vec![
        Box::new(FileReadUtensil::new()),
        Box::new(FileWriteUtensil::new()),
        Box::new(FileEditUtensil::new()),
        Box::new(ShellUtensil::new()),
        Box::new(ValidateSyntaxUtensil::new()),
    ]
}

/// Name-indexed collection of utensils plus the prompt that advertises them.
pub struct UtensilRegistry {
    utensils: Vec<Box<dyn Utensil>>,
}

impl UtensilRegistry {
    pub fn new(utensils: Vec<Box<dyn Utensil>>) -> Self {
        Self { utensils }
    }

    pub fn with_defaults() -> Self {
        Self::new(default_utensils())
    }

    /// Registered wire names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.utensils.iter().map(|u| u.name()).collect()
    }

    pub fn lookup(&self, name: &str) -> Option<&dyn Utensil> {
        self.utensils
            .iter()
            .find(|u| u.name() == name)
            .map(Box::as_ref)
    }

    /// Runs the named utensil. Dispatch failures are result strings, not
    /// errors: the text goes back to the model, which can correct itself.
    pub async fn execute(&self, name: &str, params: &ParamSet) -> String {
        let Some(utensil) = self.lookup(name) else {
            return format!("Error: Unknown utensil '{name}'");
        };
        match utensil.execute(params).await {
            Ok(result) => result,
            Err(e) => format!("Error: Invalid arguments for utensil '{name}': {e}"),
        }
    }

    pub async fn execute_call(&self, call: &UtensilCall) -> String {
        self.execute(&call.name, &call.params).await
    }

    /// System prompt teaching the model the wire format and listing every
    /// registered utensil.
    pub fn system_prompt(&self) -> String {
        let mut prompt = String::from(
            "You are an agent that can use utensils (tools) to complete tasks. \
             You MUST use utensils to interact with files and the system.\n\n\
             CRITICAL: When you need to read a file, write a file, or run a command, \
             you MUST use a utensil. You cannot complete these tasks without using utensils.\n\n\
             Utensil Format (use EXACTLY this format):\n\
             UTENSIL:utensil_name\n\
             PARAM:param1=value1\n\
             PARAM:param2=value2\n\
             END_UTENSIL\n\n\
             For a value that spans several lines, wrap it in BEGIN_VALUE and END_VALUE:\n\
             UTENSIL:write_file\n\
             PARAM:file_path=notes.txt\n\
             PARAM:content=BEGIN_VALUE\n\
             first line\n\
             second line\n\
             END_VALUE\n\
             END_UTENSIL\n\n\
             Available utensils:\n",
        );
        for utensil in &self.utensils {
            prompt.push_str(&format!(
                "- {}: {} Parameters: {}\n",
                utensil.name(),
                utensil.description(),
                utensil.parameters().join(", ")
            ));
        }
        prompt.push_str(
            "\nIMPORTANT: Do NOT use Anthropic's tool use format. \
             Use ONLY the format shown above.\n\n\
             You may use several utensils in one response; their results come back \
             in the same order.\n\n\
             Example:\n\
             User asks: \"read the file test.txt\"\n\
             You respond:\n\
             I'll read that file for you.\n\n\
             UTENSIL:read_file\n\
             PARAM:file_path=test.txt\n\
             END_UTENSIL\n\n\
             Then you'll receive the file contents and can respond with analysis.",
        );
        prompt
    }
}

impl Default for UtensilRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
