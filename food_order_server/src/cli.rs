use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // Any argument prints the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Secrets (FOS_JWT_SECRET, FOS_GATEWAY_KEY_SECRET) are deliberately left out
    const DISPLAY_ENVS: [&str; 9] = [
        "RUST_LOG",
        "FOS_HOST",
        "FOS_PORT",
        "FOS_DATABASE_URL",
        "FOS_RUN_MIGRATIONS",
        "FOS_GATEWAY_URL",
        "FOS_GATEWAY_KEY_ID",
        "FOS_GATEWAY_CURRENCY",
        "FOS_GATEWAY_TIMEOUT_SECS",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
