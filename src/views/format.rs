use donations_sdk::{format_amount, Event, EventId};

const ADDRESS_WIDTH: usize = 6;
const LABEL_DESCRIPTION_CHARS: usize = 50;

/// Shorten an address to `ABCDEF...UVWXYZ`. Addresses too short to benefit
/// are returned unchanged.
pub fn ellipse_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= ADDRESS_WIDTH * 2 + 3 {
        return address.to_string();
    }
    let head: String = chars[..ADDRESS_WIDTH].iter().collect();
    let tail: String = chars[chars.len() - ADDRESS_WIDTH..].iter().collect();
    format!("{head}...{tail}")
}

/// Label for one entry of the event selection list.
pub fn event_option_label(id: EventId, event: &Event) -> String {
    let mut description: String = event
        .description
        .chars()
        .take(LABEL_DESCRIPTION_CHARS)
        .collect();
    if event.description.chars().count() > LABEL_DESCRIPTION_CHARS {
        description.push_str("...");
    }
    format!(
        "ID: {id} | {description} | Oracle: {}",
        ellipse_address(&event.oracle_address)
    )
}

/// Micro-units rendered in whole currency units, e.g. `2.5 ALGO`.
pub fn display_amount(micro: u64) -> String {
    format!("{} ALGO", format_amount(micro))
}

pub fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

/// `Unresolved` while pending, otherwise `True`/`False`.
pub fn resolution_label(event: &Event) -> &'static str {
    match event.outcome() {
        None => "Unresolved",
        Some(true) => "True",
        Some(false) => "False",
    }
}
