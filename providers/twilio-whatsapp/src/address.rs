pub const WHATSAPP_PREFIX: &str = "whatsapp:";

/// Twilio address for a WhatsApp number. Already prefixed input is returned unchanged.
///
/// ```
/// use bb_provider_twilio_whatsapp::whatsapp_address;
///
/// assert_eq!(whatsapp_address("+14155238886"), "whatsapp:+14155238886");
/// assert_eq!(whatsapp_address("whatsapp:+14155238886"), "whatsapp:+14155238886");
/// ```
pub fn whatsapp_address(number: &str) -> String {
    format!("{WHATSAPP_PREFIX}{}", strip_whatsapp_prefix(number))
}

pub fn strip_whatsapp_prefix(address: &str) -> &str {
    let trimmed = address.trim();
    trimmed.strip_prefix(WHATSAPP_PREFIX).unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_is_idempotent() {
        assert_eq!(strip_whatsapp_prefix("whatsapp:+1"), "+1");
        assert_eq!(strip_whatsapp_prefix("+1"), "+1");
        assert_eq!(whatsapp_address(&whatsapp_address(" +1 ")), "whatsapp:+1");
    }
}
