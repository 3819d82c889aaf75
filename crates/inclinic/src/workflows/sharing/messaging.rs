use super::domain::ShareToken;

/// Builds the public URLs and messaging deep link handed back after issuing a share.
#[derive(Debug, Clone)]
pub struct LinkComposer {
    public_base_url: String,
}

impl LinkComposer {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        Self { public_base_url }
    }

    pub fn verification_url(&self, token: &ShareToken) -> String {
        format!("{}{}", self.public_base_url, verify_path(token))
    }

    pub fn landing_url(&self, token: &ShareToken) -> String {
        format!("{}{}", self.public_base_url, landing_path(token))
    }

    /// `https://wa.me/<digits>?text=<message verification_url>`; non-digits in the contact are dropped.
    pub fn compose_share_link(&self, contact: &str, message: &str, token: &ShareToken) -> String {
        let digits: String = contact.chars().filter(char::is_ascii_digit).collect();
        let text = format!("{message} {}", self.verification_url(token));
        format!("https://wa.me/{digits}?text={}", urlencoding::encode(&text))
    }
}

pub fn verify_path(token: &ShareToken) -> String {
    format!("/api/v1/shares/{token}/verify")
}

pub fn landing_path(token: &ShareToken) -> String {
    format!("/api/v1/shares/{token}/landing")
}
