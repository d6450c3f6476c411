use crate::error::InputError;

/// Values needed by both maintenance operations.
#[derive(Clone, Debug, PartialEq)]
pub struct Inputs {
    pub token: String,
    pub dummy_runner: Option<String>,
}

/// Reads an Actions input the way the toolkit does: `INPUT_<NAME>` with spaces
/// replaced by underscores, upper-cased and trimmed.
fn action_input<E>(env: &E, name: &str) -> Option<String>
where
    E: Fn(&str) -> Option<String>,
{
    let key = format!("INPUT_{}", name.replace(' ', "_").to_uppercase());
    env(&key).map(|v| v.trim().to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

pub fn is_ci<E>(env: &E) -> bool
where
    E: Fn(&str) -> Option<String>,
{
    non_empty(env("CI")).is_some()
}

/// Resolves the token and dummy runner name from action inputs when running
/// under CI, or from plain environment variables otherwise.
pub fn resolve_inputs<E>(env: E) -> Result<Inputs, InputError>
where
    E: Fn(&str) -> Option<String>,
{
    if is_ci(&env) {
        let token = non_empty(action_input(&env, "githubToken"))
            .ok_or_else(|| InputError::RequiredInput("githubToken".to_string()))?;
        let dummy_runner = non_empty(action_input(&env, "dummyRunner"));

        Ok(Inputs {
            token,
            dummy_runner,
        })
    } else {
        let token = non_empty(env("GITHUB_TOKEN")).ok_or(InputError::MissingToken)?;
        let dummy_runner = non_empty(env("DUMMY_RUNNER"));

        Ok(Inputs {
            token,
            dummy_runner,
        })
    }
}

pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

pub fn load_inputs() -> Result<Inputs, InputError> {
    resolve_inputs(process_env)
}
