use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
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
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 18] = [
        "RUST_LOG",
        "TFS_HOST",
        "TFS_PORT",
        "TFS_DATABASE_URL",
        "TFS_PAYMENT_HMAC_CHECKS",
        "TFS_CALLBACK_HMAC_CHECKS",
        "TFS_SEND_TIMEOUT_SECS",
        "TFS_BADGE_VALIDITY_DAYS",
        "TFS_RETRY_INTERVAL_SECS",
        "TFS_RETRY_DEADLINE_MINS",
        "TFS_RETRY_MAX_ATTEMPTS",
        "TFS_SMS_BASE_URL",
        "TFS_SMS_ACCOUNT_SID",
        "TFS_SMS_FROM",
        "TFS_SMS_STATUS_CALLBACK_URL",
        "TFS_WHATSAPP_BASE_URL",
        "TFS_WHATSAPP_API_VERSION",
        "TFS_WHATSAPP_PHONE_NUMBER_ID",
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
