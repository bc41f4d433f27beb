use crate::cli::{actions::Action, globals::GlobalArgs};
use anyhow::Result;
use secrecy::SecretString;

pub fn handler(matches: &clap::ArgMatches) -> Result<(Action, GlobalArgs)> {
    // Closure to return a required argument or error out
    let required = |name: &str| -> Result<String> {
        matches
            .get_one::<String>(name)
            .map(std::string::ToString::to_string)
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{name}"))
    };

    let mut globals = GlobalArgs::new(required("identity-url")?);

    globals.set_identity_token(SecretString::from(required("identity-token")?));
    globals.allowed_origin = required("allowed-origin")?;
    globals.smtp_host = required("smtp-host")?;
    globals.smtp_port = matches.get_one::<u16>("smtp-port").copied().unwrap_or(587);
    globals.smtp_user = required("smtp-user")?;
    globals.smtp_password = SecretString::from(required("smtp-password")?);
    globals.otp_expiry_minutes = matches
        .get_one::<u64>("otp-expiry-minutes")
        .copied()
        .unwrap_or(5);

    // Fall back to the SMTP user when no From mailbox is given
    globals.mail_from = match matches.get_one::<String>("mail-from") {
        Some(from) => from.to_string(),
        None => format!("\"{}\" <{}>", env!("CARGO_PKG_NAME"), globals.smtp_user),
    };

    let action = Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(3000),
    };

    Ok((action, globals))
}
