use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalSpec {
    pub ui_key: &'static str,
    pub label: &'static str,
    pub backend_field: &'static str,
}

pub const SIGNAL_CATALOG: &[SignalSpec] = &[
    SignalSpec {
        ui_key: "contact_page",
        label: "contact page",
        backend_field: "has_contact_page",
    },
    SignalSpec {
        ui_key: "clear_services_page",
        label: "clear services page",
        backend_field: "has_clear_services_page",
    },
    SignalSpec {
        ui_key: "maps_listing",
        label: "maps/GMB listing",
        backend_field: "has_gmb_or_maps_listing",
    },
    SignalSpec {
        ui_key: "recent_updates",
        label: "recent updates",
        backend_field: "has_recent_updates",
    },
    SignalSpec {
        ui_key: "reviews",
        label: "reviews/testimonials",
        backend_field: "has_reviews_or_testimonials",
    },
    SignalSpec {
        ui_key: "online_booking",
        label: "online booking/form",
        backend_field: "has_online_booking_or_form",
    },
    SignalSpec {
        ui_key: "schema_markup",
        label: "basic schema markup",
        backend_field: "uses_basic_schema_markup",
    },
    SignalSpec {
        ui_key: "nap_consistent",
        label: "NAP consistent",
        backend_field: "has_consistent_name_address_phone",
    },
    SignalSpec {
        ui_key: "loads_fast",
        label: "loads fast",
        backend_field: "has_fast_load_time_claim",
    },
    SignalSpec {
        ui_key: "content_matches_intent",
        label: "content matches intent",
        backend_field: "content_matches_intent",
    },
];

pub fn backend_field_for(ui_key: &str) -> Option<&'static str> {
    SIGNAL_CATALOG
        .iter()
        .find(|spec| spec.ui_key == ui_key)
        .map(|spec| spec.backend_field)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalNaming {
    Raw,
    #[default]
    Translated,
}

#[derive(Debug, Error)]
#[error("unknown signal naming '{0}' (expected 'raw' or 'translated')")]
pub struct UnknownSignalNaming(pub String);

impl FromStr for SignalNaming {
    type Err = UnknownSignalNaming;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "translated" => Ok(Self::Translated),
            other => Err(UnknownSignalNaming(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalInput {
    pub key: String,
    pub checked: bool,
}

impl SignalInput {
    pub fn new(key: impl Into<String>, checked: bool) -> Self {
        Self {
            key: key.into(),
            checked,
        }
    }
}

// Reserved for the id in the evaluate body.
pub const COMPANY_ID_KEY: &str = "company_id";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SignalSet {
    entries: IndexMap<String, bool>,
}

impl SignalSet {
    pub fn from_inputs(inputs: &[SignalInput], naming: SignalNaming) -> Self {
        let mut set = Self::default();
        for input in inputs {
            let key = match naming {
                SignalNaming::Raw => input.key.as_str(),
                SignalNaming::Translated => match backend_field_for(&input.key) {
                    Some(field) => field,
                    None => continue,
                },
            };
            set.insert(key, input.checked);
        }
        set
    }

    // Re-inserting a key keeps its original position.
    pub fn insert(&mut self, key: &str, value: bool) {
        if key == COMPANY_ID_KEY {
            return;
        }
        self.entries.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<bool> {
        self.entries.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn raw_naming_keeps_checkbox_keys() {
        let inputs = [
            SignalInput::new("contact_page", true),
            SignalInput::new("made_up", false),
        ];
        let set = SignalSet::from_inputs(&inputs, SignalNaming::Raw);
        assert_eq!(
            serde_json::to_value(&set).expect("serialize"),
            json!({ "contact_page": true, "made_up": false })
        );
    }

    #[test]
    fn translated_naming_maps_and_drops_unknown_keys() {
        let inputs = [
            SignalInput::new("maps_listing", true),
            SignalInput::new("made_up", true),
            SignalInput::new("nap_consistent", false),
        ];
        let set = SignalSet::from_inputs(&inputs, SignalNaming::Translated);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("has_gmb_or_maps_listing"), Some(true));
        assert_eq!(set.get("has_consistent_name_address_phone"), Some(false));
        assert_eq!(set.get("made_up"), None);
    }

    #[test]
    fn duplicate_keys_keep_last_value_and_first_position() {
        let inputs = [
            SignalInput::new("a", false),
            SignalInput::new("b", true),
            SignalInput::new("a", true),
        ];
        let set = SignalSet::from_inputs(&inputs, SignalNaming::Raw);
        let entries: Vec<_> = set.iter().collect();
        assert_eq!(entries, vec![("a", true), ("b", true)]);
    }

    #[test]
    fn company_id_checkbox_is_never_a_signal() {
        let inputs = [
            SignalInput::new("company_id", true),
            SignalInput::new("contact_page", true),
        ];
        let set = SignalSet::from_inputs(&inputs, SignalNaming::Raw);
        assert_eq!(set.get(COMPANY_ID_KEY), None);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn catalog_is_one_to_one() {
        for (i, a) in SIGNAL_CATALOG.iter().enumerate() {
            for b in &SIGNAL_CATALOG[i + 1..] {
                assert_ne!(a.ui_key, b.ui_key);
                assert_ne!(a.backend_field, b.backend_field);
            }
        }
        assert_eq!(SIGNAL_CATALOG.len(), 10);
    }

    #[test]
    fn parses_naming_from_config_strings() {
        assert_eq!("RAW".parse::<SignalNaming>().ok(), Some(SignalNaming::Raw));
        assert_eq!(
            " translated ".parse::<SignalNaming>().ok(),
            Some(SignalNaming::Translated)
        );
        assert!("mapped".parse::<SignalNaming>().is_err());
    }
}
