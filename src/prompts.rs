//! Prompt text sent to the model.

/// Standing instructions prepended to every request.
pub const SYSTEM: &str = "You are forgeplan, a senior software architect who scaffolds projects. \
When asked for JSON, answer with a single JSON object and nothing else: no prose, no code fences.";

const PLAN_SHAPE: &str = r#"Answer with a JSON object of this shape:
{
  "structure": { "<dir>": { "<file>": "<file content or summary>" } },
  "todo": { "<category>": ["<task>", "..."] }
}
Directories are objects, files are strings.
Keep names relative; never use ".." or absolute paths."#;

/// Asks for a project name and stack for `idea`.
#[must_use]
pub fn name_and_stack(idea: &str) -> String {
    format!(
        "I want to build the following project:\n\n{idea}\n\n\
         Propose a short project name and a technology stack. \
         Answer with a JSON object: \
         {{\"name\": \"<name>\", \"stack\": {{\"<layer>\": [\"<technology>\"]}}}}"
    )
}

/// Asks for the initial plan of a confirmed project.
#[must_use]
pub fn plan(idea: &str, name: &str, stack: &str) -> String {
    format!(
        "Plan the initial file structure and task list for the project {name:?}.\n\n\
         Idea: {idea}\n\nStack:\n{stack}\n\n\
         Every file should contain a short summary of its purpose rather than full code.\n\n\
         {PLAN_SHAPE}"
    )
}

/// Asks for documentation headers and missing files for an existing codebase.
#[must_use]
pub fn scaffold(context: &str, memory: &str) -> String {
    format!(
        "Scaffold the existing project described below.\n\n\
         Context: {context}\n\nKnown project facts:\n{memory}\n\n\
         For files that already exist, give a one-paragraph documentation header as the \
         file content; it will be inserted as a leading comment. \
         For new files, give their initial content.\n\n{PLAN_SHAPE}"
    )
}

/// Asks for the changes needed to add a feature.
#[must_use]
pub fn feature(description: &str, memory: &str) -> String {
    format!(
        "Add the following feature to the project:\n\n{description}\n\n\
         Known project facts:\n{memory}\n\n\
         List only files to create or document, and the tasks needed to finish the feature.\n\n\
         {PLAN_SHAPE}"
    )
}

/// Asks for tests of a code excerpt.
#[must_use]
pub fn tests(mode: &str, language: &str, code: &str) -> String {
    let what = match mode {
        "specs" => "a test plan describing the cases to cover, as comments in a test file",
        "full" => "complete, runnable tests",
        _ => "test stubs: one empty test function per behaviour, with a descriptive name",
    };
    format!(
        "Write {what} for the following {language} code.\n\
         Answer with the test source only, no explanation and no code fences.\n\n{code}"
    )
}
