use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("konfirmo")
        .about("One-time passcode issuance and verification")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("3000")
                .env("KONFIRMO_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("otp-expiry-minutes")
                .long("otp-expiry-minutes")
                .help("Minutes before an issued passcode expires")
                .default_value("5")
                .env("KONFIRMO_OTP_EXPIRY_MINUTES")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("allowed-origin")
                .long("allowed-origin")
                .help("Origin allowed by CORS, example: https://app.tld")
                .env("KONFIRMO_ALLOWED_ORIGIN")
                .required(true),
        )
        .arg(
            Arg::new("identity-url")
                .long("identity-url")
                .help("Identity provider base URL, example: https://identity.tld:8443")
                .env("KONFIRMO_IDENTITY_URL")
                .required(true),
        )
        .arg(
            Arg::new("identity-token")
                .long("identity-token")
                .help("Identity provider API token")
                .env("KONFIRMO_IDENTITY_TOKEN")
                .required(true),
        )
        .arg(
            Arg::new("smtp-host")
                .long("smtp-host")
                .help("SMTP server host")
                .env("KONFIRMO_SMTP_HOST")
                .required(true),
        )
        .arg(
            Arg::new("smtp-port")
                .long("smtp-port")
                .help("SMTP server port, 465 uses implicit TLS")
                .default_value("587")
                .env("KONFIRMO_SMTP_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("smtp-user")
                .long("smtp-user")
                .help("SMTP username, also the default sender address")
                .env("KONFIRMO_SMTP_USER")
                .required(true),
        )
        .arg(
            Arg::new("smtp-password")
                .long("smtp-password")
                .help("SMTP password")
                .env("KONFIRMO_SMTP_PASSWORD")
                .required(true),
        )
        .arg(
            Arg::new("mail-from")
                .long("mail-from")
                .help("From mailbox, example: \"konfirmo\" <no-reply@tld>")
                .env("KONFIRMO_MAIL_FROM"),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("KONFIRMO_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}
