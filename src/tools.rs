//! Runtime tool path resolution
//!
//! External tools (docker, git) are resolved through an environment
//! variable override pattern: for each tool we check `{TOOL}_BIN`
//! (e.g. `DOCKER_BIN`) and fall back to PATH-based invocation when the
//! variable is not set. This keeps CI images free to pin exact binaries
//! while development machines just use whatever is on PATH, and makes
//! the binaries easy to stub out in tests.

use std::env;

/// Get the path to an external tool
///
/// Checks for an environment variable `{TOOL}_BIN` (uppercase tool name
/// + "_BIN"). Falls back to the tool name itself if the envvar is not
/// set, which relies on PATH.
pub fn get_tool_path(tool: &str) -> String {
    let env_var = format!("{}_BIN", tool.to_uppercase());
    env::var(&env_var).unwrap_or_else(|_| tool.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_to_tool_name() {
        env::remove_var("NO_SUCH_TOOL_BIN");
        assert_eq!(get_tool_path("no_such_tool"), "no_such_tool");
    }

    #[test]
    fn test_env_override() {
        env::set_var("FAKETOOL_BIN", "/opt/bin/faketool");
        assert_eq!(get_tool_path("faketool"), "/opt/bin/faketool");
        env::remove_var("FAKETOOL_BIN");
    }
}
