use regex::Regex;
use std::fmt::Display;
use std::sync::OnceLock;

/// The canonical rack-id pattern: address code, data-center code, and a rack
/// number of 1 to 3 word characters, anchored at the end of the cell text.
///
/// This is the single definition shared by the locator and by the device
/// filter's "looks like a rack id, not a device" check.
fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([A-Z]{2}\d)\.([A-Z]{2}\d)\.(\w{1,3})$").expect("Hardcode regex pattern")
    })
}

/// A parsed rack identifier such as `MS1.DC2.A1`.
#[derive(Clone, Debug, PartialEq)]
pub struct RackToken {
    /// Address code (e.g. `MS1`)
    pub address_code: String,
    /// Data-center code (e.g. `DC2`)
    pub data_center: String,
    /// Rack number within the data center (e.g. `A1`)
    pub rack_number: String,
}

impl RackToken {
    /// Parses a rack token from cell text, anchored at the end of the text.
    pub fn parse(text: &str) -> Option<RackToken> {
        let captures = pattern().captures(text)?;
        Some(RackToken {
            address_code: captures[1].to_owned(),
            data_center: captures[2].to_owned(),
            rack_number: captures[3].to_owned(),
        })
    }

    /// Checks whether text ends in a rack id without building a token.
    pub fn matches(text: &str) -> bool {
        pattern().is_match(text)
    }

    /// The full rack id in its written form.
    pub fn id(&self) -> String {
        format!("{}.{}.{}", self.address_code, self.data_center, self.rack_number)
    }
}

impl Display for RackToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}
