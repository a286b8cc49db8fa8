use crate::error::RackScanError;
use crate::rack::token::RackToken;
use regex::Regex;

/// Stop-word patterns marking placeholder slots. Matching is case-insensitive
/// and unanchored unless the pattern anchors itself.
const DEFAULT_PATTERNS: &[&str] = &[
    "^blank",
    "^empty",
    "^free",
    "^reserved",
    "patch ?panel",
    "organi[sz]er",
    "cable management",
    "brush panel",
    "blanking",
    "filler",
];

/// Ordered list of stop-word patterns for placeholder slots.
///
/// A label that itself reads as a rack id is also not a device; that check
/// shares the one canonical rack-id pattern instead of duplicating it here.
pub struct IgnoreList {
    patterns: Vec<Regex>,
}

impl IgnoreList {
    /// Compiles an ignore list from pattern strings, preserving each
    /// pattern's own anchoring.
    pub fn new(patterns: &[&str]) -> Result<Self, RackScanError> {
        let patterns = patterns
            .iter()
            .map(|pattern| Regex::new(&format!("(?i){}", pattern)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(IgnoreList { patterns })
    }

    /// Checks whether text marks a placeholder slot.
    pub fn matches(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        self.patterns.iter().any(|pattern| pattern.is_match(text)) || RackToken::matches(text)
    }
}

impl Default for IgnoreList {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERNS).expect("Hardcode ignore patterns")
    }
}

/// Outcome of assembling one unit slot's texts into a device candidate.
#[derive(Clone, Debug, PartialEq)]
pub enum Assembly {
    /// A real asset
    Device {
        model: String,
        serial: String,
        label: String,
    },
    /// A placeholder slot, kept on the ignored stream
    Ignored { model: String, label: String },
    /// Nothing there at all, no output
    Empty,
}

/// Combines vendor, model, serial, and label into a device candidate.
///
/// A present serial number is authoritative evidence of a real asset and
/// overrides any stop-word match.
pub fn prepare_device(
    vendor: Option<String>,
    model: Option<String>,
    serial: Option<String>,
    label: &str,
    ignore: &IgnoreList,
) -> Assembly {
    let vendor = vendor.unwrap_or_default();
    let model = model.unwrap_or_default();
    let serial = serial.unwrap_or_default();
    if vendor.is_empty() && model.is_empty() && serial.is_empty() && label.is_empty() {
        return Assembly::Empty;
    }

    let vendor = capitalize(vendor);
    let merged = format!("{} {}", vendor, model).trim().to_owned();
    if serial.is_empty() && (ignore.matches(&vendor) || ignore.matches(&model) || ignore.matches(label)) {
        return Assembly::Ignored {
            model: merged,
            label: label.to_owned(),
        };
    }
    Assembly::Device {
        model: merged,
        serial,
        label: label.to_owned(),
    }
}

/// Capitalizes the first letter of an entirely lower-case vendor name.
fn capitalize(vendor: String) -> String {
    if vendor.is_empty() || vendor != vendor.to_lowercase() {
        return vendor;
    }
    let mut chars = vendor.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => vendor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(text: &str) -> Option<String> {
        Some(text.to_owned())
    }

    #[test]
    fn all_empty_is_no_output() {
        let ignore = IgnoreList::default();
        assert_eq!(prepare_device(None, None, None, "", &ignore), Assembly::Empty);
    }

    #[test]
    fn serial_overrides_stop_words() {
        let ignore = IgnoreList::default();
        let assembly = prepare_device(some("Patch Panel"), None, some("SN123"), "pp-01", &ignore);
        assert_eq!(
            assembly,
            Assembly::Device {
                model: "Patch Panel".to_owned(),
                serial: "SN123".to_owned(),
                label: "pp-01".to_owned(),
            }
        );
    }

    #[test]
    fn stop_word_label_without_serial_is_ignored() {
        let ignore = IgnoreList::default();
        let assembly = prepare_device(None, None, None, "cable organizer", &ignore);
        assert_eq!(
            assembly,
            Assembly::Ignored {
                model: String::new(),
                label: "cable organizer".to_owned(),
            }
        );
    }

    #[test]
    fn anchored_patterns_match_at_start_only() {
        let ignore = IgnoreList::default();
        assert!(ignore.matches("empty slot"));
        assert!(!ignore.matches("not empty"));
        assert!(ignore.matches("BLANKING plate"));
    }

    #[test]
    fn rack_id_text_is_never_a_device() {
        let ignore = IgnoreList::default();
        let assembly = prepare_device(None, None, None, "MS1.DC2.A1", &ignore);
        assert!(matches!(assembly, Assembly::Ignored { .. }));
    }

    #[test]
    fn lower_case_vendor_is_capitalized() {
        let ignore = IgnoreList::default();
        let assembly = prepare_device(some("dell"), some("R740"), some("SN1"), "db-01", &ignore);
        assert_eq!(
            assembly,
            Assembly::Device {
                model: "Dell R740".to_owned(),
                serial: "SN1".to_owned(),
                label: "db-01".to_owned(),
            }
        );
    }

    #[test]
    fn mixed_case_vendor_is_untouched() {
        let ignore = IgnoreList::default();
        let assembly = prepare_device(some("HPe"), None, some("SN2"), "web-01", &ignore);
        assert_eq!(
            assembly,
            Assembly::Device {
                model: "HPe".to_owned(),
                serial: "SN2".to_owned(),
                label: "web-01".to_owned(),
            }
        );
    }

    #[test]
    fn device_without_attributes_but_with_label_is_kept() {
        let ignore = IgnoreList::default();
        let assembly = prepare_device(None, None, None, "core-sw-01", &ignore);
        assert_eq!(
            assembly,
            Assembly::Device {
                model: String::new(),
                serial: String::new(),
                label: "core-sw-01".to_owned(),
            }
        );
    }
}
