//! The attribute dictionary collaborator.
//!
//! The engine proper treats the dictionary as an external interface (name/OID
//! lookup, unknown-attribute fabrication, promotion of undefined names). This
//! module ships the trait plus a minimal in-memory implementation so the rest
//! of the crate can be built and tested without a production dictionary
//! wired in. A real deployment supplies its own `Dictionary` impl, typically
//! backed by a compiled dictionary file rather than a `HashMap`.

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::TmplError;
use crate::value::DatumType;

/// A dictionary entry: everything the parser and verifier need to drive
/// tag-legality and self-ownership checks. Deliberately narrow — production
/// dictionaries carry far richer metadata (descriptions, vendor tables,
/// enum value maps) that this crate has no use for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictAttr {
    pub name: String,
    pub vendor: u32,
    pub attr: u32,
    pub data_type: DatumType,
    pub has_tag: bool,
    pub is_unknown: bool,
}

impl DictAttr {
    pub fn oid(&self) -> Vec<u32> {
        if self.vendor == 0 {
            vec![self.attr]
        } else {
            vec![self.vendor, self.attr]
        }
    }
}

/// External attribute-name/OID resolution, consumed by the parser (C2), the
/// dispatcher (C4), and the expansion/cast engine (C7).
pub trait Dictionary: Send + Sync {
    fn lookup_by_name(&self, name: &str) -> Option<DictAttr>;
    fn lookup_by_oid(&self, oid: &[u32]) -> Option<DictAttr>;

    /// Fabricate a descriptor for an OID path that didn't resolve. The
    /// returned value is `is_unknown = true`; callers embed it directly in
    /// the template rather than retaining a dictionary-owned copy.
    fn define_unknown(&self, name: &str, oid: &[u32]) -> DictAttr;

    /// Insert (or confirm) a definition, used by `define_unknown`/
    /// `define_undefined` promotion. Returns `TypeMismatch` if an existing
    /// entry with the same name has an incompatible type or tag flag.
    fn insert(&self, attr: DictAttr) -> Result<(), TmplError>;
}

/// A minimal in-memory dictionary, bootstrapped with a handful of attributes
/// common enough to appear in every scenario in the test suite.
pub struct StaticDictionary {
    by_name: RwLock<HashMap<String, DictAttr>>,
    by_oid: RwLock<HashMap<Vec<u32>, DictAttr>>,
}

impl StaticDictionary {
    pub fn new() -> Self {
        Self {
            by_name: RwLock::new(HashMap::new()),
            by_oid: RwLock::new(HashMap::new()),
        }
    }

    /// A dictionary pre-populated with the handful of attributes that show
    /// up across the end-to-end scenarios: `User-Name`, `User-Password`,
    /// `Tunnel-Password` (tagged), `Framed-IP-Address`, `NAS-IP-Address`.
    pub fn with_defaults() -> Self {
        let dict = Self::new();
        for attr in default_attrs() {
            dict.insert(attr).expect("default dictionary entries never conflict");
        }
        dict
    }
}

impl Default for StaticDictionary {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Dictionary for StaticDictionary {
    fn lookup_by_name(&self, name: &str) -> Option<DictAttr> {
        self.by_name.read().expect("dictionary lock poisoned").get(name).cloned()
    }

    fn lookup_by_oid(&self, oid: &[u32]) -> Option<DictAttr> {
        self.by_oid.read().expect("dictionary lock poisoned").get(oid).cloned()
    }

    fn define_unknown(&self, name: &str, oid: &[u32]) -> DictAttr {
        let (vendor, attr) = match oid {
            [v, a] => (*v, *a),
            [a] => (0, *a),
            _ => (0, 0),
        };
        DictAttr {
            name: name.to_string(),
            vendor,
            attr,
            data_type: DatumType::Octets,
            has_tag: false,
            is_unknown: true,
        }
    }

    fn insert(&self, attr: DictAttr) -> Result<(), TmplError> {
        let mut by_name = self.by_name.write().expect("dictionary lock poisoned");
        if let Some(existing) = by_name.get(&attr.name) {
            if existing.data_type != attr.data_type || existing.has_tag != attr.has_tag {
                return Err(TmplError::TypeMismatch { name: attr.name.clone() });
            }
            return Ok(());
        }
        self.by_oid
            .write()
            .expect("dictionary lock poisoned")
            .insert(attr.oid(), attr.clone());
        by_name.insert(attr.name.clone(), attr);
        tracing::debug!(attr = %by_name.len(), "dictionary grew");
        Ok(())
    }
}

/// A process-wide default dictionary, for callers that don't need to own
/// their own `Dictionary` (quick embeddings, tests). Production call sites
/// should still thread an explicit `&dyn Dictionary` through — global mutable
/// state behind a lazy static is a convenience for small tools, not a
/// substitute for the crate's primary entry point.
static GLOBAL_DICTIONARY: Lazy<StaticDictionary> = Lazy::new(StaticDictionary::with_defaults);

pub fn global_dictionary() -> &'static StaticDictionary {
    &GLOBAL_DICTIONARY
}

fn default_attrs() -> Vec<DictAttr> {
    vec![
        DictAttr { name: "User-Name".into(), vendor: 0, attr: 1, data_type: DatumType::String, has_tag: false, is_unknown: false },
        DictAttr { name: "User-Password".into(), vendor: 0, attr: 2, data_type: DatumType::String, has_tag: false, is_unknown: false },
        DictAttr { name: "NAS-IP-Address".into(), vendor: 0, attr: 4, data_type: DatumType::String, has_tag: false, is_unknown: false },
        DictAttr { name: "Framed-IP-Address".into(), vendor: 0, attr: 8, data_type: DatumType::String, has_tag: false, is_unknown: false },
        DictAttr { name: "Tunnel-Password".into(), vendor: 0, attr: 69, data_type: DatumType::String, has_tag: true, is_unknown: false },
    ]
}

/// Parse the `Attr-n.n.n` OID form. Returns `None` for anything else,
/// including a bare `Attr-` with no digits.
pub fn parse_oid(name: &str) -> Option<Vec<u32>> {
    let rest = name.strip_prefix("Attr-")?;
    if rest.is_empty() {
        return None;
    }
    rest.split('.').map(|part| part.parse::<u32>().ok()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_by_name_and_oid() {
        let dict = StaticDictionary::with_defaults();
        let un = dict.lookup_by_name("User-Name").expect("present");
        assert_eq!(un.attr, 1);
        assert_eq!(dict.lookup_by_oid(&[1]).expect("present").name, "User-Name");
    }

    #[test]
    fn insert_conflicting_type_is_rejected() {
        let dict = StaticDictionary::with_defaults();
        let conflicting = DictAttr {
            name: "User-Name".into(),
            vendor: 0,
            attr: 1,
            data_type: DatumType::Integer,
            has_tag: false,
            is_unknown: false,
        };
        assert_eq!(
            dict.insert(conflicting),
            Err(TmplError::TypeMismatch { name: "User-Name".into() })
        );
    }

    #[test]
    fn define_unknown_is_marked_unknown_and_not_tagged() {
        let dict = StaticDictionary::with_defaults();
        let d = dict.define_unknown("Attr-26.9999.1", &[26, 9999]);
        assert!(d.is_unknown);
        assert!(!d.has_tag);
    }

    #[test]
    fn parse_oid_rejects_non_oid_and_empty() {
        assert_eq!(parse_oid("User-Name"), None);
        assert_eq!(parse_oid("Attr-"), None);
        assert_eq!(parse_oid("Attr-26.9999"), Some(vec![26, 9999]));
    }

    #[test]
    fn global_dictionary_is_bootstrapped_with_defaults() {
        assert!(global_dictionary().lookup_by_name("User-Name").is_some());
    }

    #[test]
    fn dict_attr_survives_a_json_round_trip() {
        let attr = DictAttr { name: "User-Name".into(), vendor: 0, attr: 1, data_type: DatumType::String, has_tag: false, is_unknown: false };
        let json = serde_json::to_string(&attr).expect("serializable");
        let back: DictAttr = serde_json::from_str(&json).expect("deserializable");
        assert_eq!(attr, back);
    }
}
