//! Request validation
//!
//! All checks are local and run before any network call. Checks run in a
//! fixed order and stop at the first violation.

use crate::config;
use crate::error::{BridgeError, Result};
use crate::pipeline::BridgeRequest;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EVM_ADDRESS_RE: Regex = Regex::new(r"^0x[0-9a-fA-F]{40}$").unwrap();
}

/// Validate a bridge request.
///
/// Returns the first violated rule as a human-readable message. A request
/// that passes is safe to hand to the transaction builder unchanged.
pub fn validate(request: &BridgeRequest) -> Result<()> {
    if request.user_address.trim().is_empty() {
        return Err(BridgeError::Validation("user address is required".into()));
    }

    if !config::is_supported_source_token(&request.from_token) {
        return Err(BridgeError::Validation(format!(
            "unsupported source token {}, expected {}",
            request.from_token,
            config::SOURCE_TOKEN
        )));
    }

    let token_chain = config::chain_for_dest_token(&request.dest_token).ok_or_else(|| {
        BridgeError::Validation(format!(
            "unsupported destination token {}",
            request.dest_token
        ))
    })?;

    let amount = parse_native_amount(&request.amount)?;
    if amount <= 0 {
        return Err(BridgeError::Validation(
            "amount must be greater than zero".into(),
        ));
    }

    if !config::is_supported_chain(&request.dest_chain) {
        return Err(BridgeError::Validation(format!(
            "unsupported destination chain {}",
            request.dest_chain
        )));
    }

    if token_chain != request.dest_chain {
        return Err(BridgeError::Validation(format!(
            "destination token {} settles on chain {}, not {}",
            request.dest_token, token_chain, request.dest_chain
        )));
    }

    if request.recipient_address.trim().is_empty() {
        return Err(BridgeError::Validation(
            "recipient address is required".into(),
        ));
    }

    // Both supported chains are EVM-family
    if !EVM_ADDRESS_RE.is_match(&request.recipient_address) {
        return Err(BridgeError::Validation(format!(
            "recipient {} is not a valid EVM address",
            request.recipient_address
        )));
    }

    Ok(())
}

/// Parse a decimal amount in whole source units into stroops.
///
/// Fractions beyond the ledger's 7 decimal places are rejected rather than
/// truncated.
pub fn parse_native_amount(raw: &str) -> Result<i128> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(BridgeError::Validation("amount is required".into()));
    }

    let (whole, frac) = match raw.split_once('.') {
        Some((w, f)) => (w, f),
        None => (raw, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(BridgeError::Validation(format!("invalid amount {}", raw)));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(BridgeError::Validation(format!(
            "amount {} must be a non-negative decimal number",
            raw
        )));
    }
    if frac.len() > 7 {
        return Err(BridgeError::Validation(format!(
            "amount {} has more than 7 decimal places",
            raw
        )));
    }

    let whole: i128 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| BridgeError::Validation(format!("amount {} is out of range", raw)))?
    };

    let mut frac_stroops: i128 = 0;
    if !frac.is_empty() {
        let padded = format!("{:0<7}", frac);
        frac_stroops = padded
            .parse()
            .map_err(|_| BridgeError::Validation(format!("invalid amount {}", raw)))?;
    }

    whole
        .checked_mul(config::STROOPS_PER_UNIT)
        .and_then(|w| w.checked_add(frac_stroops))
        .ok_or_else(|| BridgeError::Validation(format!("amount {} is out of range", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> BridgeRequest {
        BridgeRequest {
            user_address: "GABCDEFGHIJKLMNOPQRSTUVWXYZ234567ABCDEFGHIJKLMNOPQRSTUVW".into(),
            from_token: "XLM".into(),
            dest_token: "HOLSKEY".into(),
            amount: "5".into(),
            dest_chain: "17000".into(),
            recipient_address: "0x8Da1867ab5eE5385dc72f5901bC9Bd16F580d157".into(),
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(validate(&valid_request()).is_ok());
    }

    #[test]
    fn test_missing_user_address() {
        let mut req = valid_request();
        req.user_address = "  ".into();
        let err = validate(&req).unwrap_err();
        assert!(err.to_string().contains("user address"));
    }

    #[test]
    fn test_unsupported_source_token() {
        let mut req = valid_request();
        req.from_token = "USDC".into();
        let err = validate(&req).unwrap_err();
        assert!(err.to_string().contains("source token"));
    }

    #[test]
    fn test_unsupported_dest_token() {
        let mut req = valid_request();
        req.dest_token = "WETH".into();
        let err = validate(&req).unwrap_err();
        assert!(err.to_string().contains("destination token"));
    }

    #[test]
    fn test_zero_and_negative_amounts_rejected() {
        let mut req = valid_request();
        req.amount = "0".into();
        assert!(validate(&req).is_err());

        req.amount = "-3".into();
        assert!(validate(&req).is_err());
    }

    #[test]
    fn test_chain_token_consistency() {
        // HOLSKEY settles on 17000, not 8453
        let mut req = valid_request();
        req.dest_chain = "8453".into();
        let err = validate(&req).unwrap_err();
        assert!(err.to_string().contains("settles on chain"));
    }

    #[test]
    fn test_unsupported_chain() {
        let mut req = valid_request();
        req.dest_chain = "1".into();
        let err = validate(&req).unwrap_err();
        assert!(err.to_string().contains("unsupported destination chain"));
    }

    #[test]
    fn test_malformed_recipient() {
        let mut req = valid_request();
        req.recipient_address = "not-an-address".into();
        let err = validate(&req).unwrap_err();
        assert!(err.to_string().contains("EVM address"));

        // Too short
        req.recipient_address = "0x8Da1867ab5eE5385".into();
        assert!(validate(&req).is_err());
    }

    #[test]
    fn test_first_violation_wins() {
        // Both token and recipient are bad; token is checked first
        let mut req = valid_request();
        req.dest_token = "WETH".into();
        req.recipient_address = "junk".into();
        let err = validate(&req).unwrap_err();
        assert!(err.to_string().contains("destination token"));
    }

    #[test]
    fn test_parse_native_amount() {
        assert_eq!(parse_native_amount("5").unwrap(), 50_000_000);
        assert_eq!(parse_native_amount("1.25").unwrap(), 12_500_000);
        assert_eq!(parse_native_amount("0.0000001").unwrap(), 1);
        assert_eq!(parse_native_amount(".5").unwrap(), 5_000_000);
        assert_eq!(parse_native_amount("11").unwrap(), 110_000_000);
    }

    #[test]
    fn test_parse_native_amount_rejects_excess_precision() {
        let err = parse_native_amount("1.00000001").unwrap_err();
        assert!(err.to_string().contains("decimal places"));
    }

    #[test]
    fn test_parse_native_amount_rejects_garbage() {
        assert!(parse_native_amount("").is_err());
        assert!(parse_native_amount(".").is_err());
        assert!(parse_native_amount("1e5").is_err());
        assert!(parse_native_amount("five").is_err());
        assert!(parse_native_amount("-1").is_err());
    }
}
