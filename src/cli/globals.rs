use secrecy::SecretString;

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub identity_url: String,
    pub identity_token: SecretString,
    pub allowed_origin: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_password: SecretString,
    pub mail_from: String,
    pub otp_expiry_minutes: u64,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(identity_url: String) -> Self {
        Self {
            identity_url,
            identity_token: SecretString::default(),
            allowed_origin: String::new(),
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_user: String::new(),
            smtp_password: SecretString::default(),
            mail_from: String::new(),
            otp_expiry_minutes: 5,
        }
    }

    pub fn set_identity_token(&mut self, token: SecretString) {
        self.identity_token = token;
    }
}
