//! Bridge Contract Revert Codes
//!
//! The liquidity bridge contract reverts with short `LBCxxx` codes. This
//! table turns them into readable descriptions for error details.

/// Code emitted when a registered pegin lacks bitcoin confirmations
pub const NOT_ENOUGH_CONFIRMATIONS_CODE: &str = "LBC031";

const REVERT_DESCRIPTIONS: &[(&str, &str)] = &[
    ("LBC001", "Caller is not a registered liquidity provider"),
    ("LBC002", "Caller is not the contract owner"),
    ("LBC003", "Transfer of funds failed"),
    ("LBC004", "Provider is not registered for this operation"),
    ("LBC005", "Insufficient collateral"),
    ("LBC006", "Provider already registered"),
    ("LBC007", "Refund address is not valid"),
    ("LBC008", "Quote already processed"),
    ("LBC009", "Insufficient gas for call"),
    ("LBC010", "Call for user already registered"),
    ("LBC011", "Quote already registered"),
    ("LBC012", "Provider did not call for user"),
    ("LBC013", "Sender is not the bridge"),
    ("LBC014", "Height must be lower than 2^31"),
    ("LBC015", "Bridge rejected the transaction registration"),
    ("LBC016", "Bitcoin transaction value is insufficient"),
    ("LBC017", "Bitcoin transaction paid the wrong amount"),
    ("LBC018", "Resignation delay not met"),
    ("LBC019", "Withdrawal amount exceeds balance"),
    ("LBC021", "Quote is not valid for this network"),
    ("LBC022", "Unable to refund penalty to provider"),
    ("LBC023", "Provider is not resigned"),
    ("LBC024", "Provider has pending operations"),
    ("LBC025", "Insufficient collateral to operate"),
    ("LBC026", "Invalid signature"),
    ("LBC027", "Quote has expired"),
    ("LBC028", "Quote value is above the maximum"),
    ("LBC029", "Quote value is below the minimum"),
    ("LBC030", "Deposit value is too low"),
    ("LBC031", "Not enough confirmations"),
    ("LBC032", "Bridge returned an unexpected error"),
    ("LBC033", "Sender is not the provider"),
    ("LBC034", "Pegout deposit already registered"),
    ("LBC035", "Pegout deposit value is too low"),
    ("LBC036", "Pegout deposit date limit exceeded"),
    ("LBC037", "Unable to send refund to user"),
    ("LBC038", "Pegout quote not registered"),
    ("LBC039", "Transaction does not pay the pegout destination"),
    ("LBC040", "Pegout quote already completed"),
    ("LBC041", "Bitcoin block is not yet confirmed enough"),
    ("LBC042", "Transfer time exceeded"),
    ("LBC043", "Unable to refund pegout user"),
    ("LBC044", "Pegout quote has no deposit"),
    ("LBC045", "Invalid quote hash"),
    ("LBC046", "Quote is not expired yet"),
    ("LBC047", "Pegout quote already refunded"),
    ("LBC048", "Invalid destination address"),
    ("LBC049", "Transaction is not a pegout payment"),
];

/// Describe a revert code; unknown codes come back verbatim
pub fn describe_revert(code: &str) -> String {
    REVERT_DESCRIPTIONS
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, description)| description.to_string())
        .unwrap_or_else(|| code.to_string())
}

/// Find the first `LBC` + 3 digit token anywhere in an error message.
///
/// Chain clients wrap reverts in differently nested messages, so the code
/// is located by scanning rather than by position.
pub fn extract_revert_code(message: &str) -> Option<&str> {
    let bytes = message.as_bytes();
    message.match_indices("LBC").find_map(|(start, _)| {
        let end = start + 6;
        let digits = bytes.get(start + 3..end)?;
        if !digits.iter().all(u8::is_ascii_digit) {
            return None;
        }
        // reject longer numbers like LBC0311
        if bytes.get(end).is_some_and(u8::is_ascii_digit) {
            return None;
        }
        Some(&message[start..end])
    })
}

/// Human readable form of a revert message: `LBCxxx: description` when a
/// known code is present, the original message otherwise.
pub fn explain_revert(message: &str) -> String {
    match extract_revert_code(message) {
        Some(code) => format!("{}: {}", code, describe_revert(code)),
        None => message.to_string(),
    }
}
