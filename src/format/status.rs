//! Customer-facing specimen status labels.

/// Status codes whose customer label differs from the code itself
const STATUS_LABELS: &[(&str, &str)] = &[("Received", "Received by Lab")];

/// Label for `code`; codes without an entry are returned unchanged
pub fn customer_status_label(code: &str) -> &str {
    STATUS_LABELS
        .iter()
        .find(|(c, _)| *c == code)
        .map_or(code, |&(_, label)| label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn received_is_relabelled() {
        assert_eq!(customer_status_label("Received"), "Received by Lab");
    }

    #[test]
    fn matching_is_exact() {
        assert_eq!(customer_status_label("RECEIVED"), "RECEIVED");
        assert_eq!(customer_status_label("Received by Lab"), "Received by Lab");
        assert_eq!(customer_status_label("Rejected"), "Rejected");
    }
}
