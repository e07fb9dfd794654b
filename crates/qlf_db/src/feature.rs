//! Features: named, possibly multi-bit configuration knobs.

use crate::addr::BitAddress;
use serde::{Deserialize, Serialize};

/// A named configuration feature and the bits holding its value.
///
/// `bits[i]` is the address of value bit `i`, least significant first, so the
/// feature width is `bits.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    name: String,
    bits: Vec<BitAddress>,
}

impl Feature {
    /// Creates a feature from its name and LSB-first bit addresses.
    pub fn new(name: impl Into<String>, bits: Vec<BitAddress>) -> Self {
        Self {
            name: name.into(),
            bits,
        }
    }

    /// Returns the dotted feature name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of value bits.
    pub fn width(&self) -> u32 {
        self.bits.len() as u32
    }

    /// Returns the bit addresses, least significant first.
    pub fn bits(&self) -> &[BitAddress] {
        &self.bits
    }
}

/// Returns whether `name` is a dotted FASM identifier.
///
/// Each dot-separated segment must match `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_feature_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            let mut chars = segment.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

/// Splits a trailing bus index off a cell name.
///
/// `"LUT_INIT[3]"` yields `Some(("LUT_INIT", 3))`; names without a well-formed
/// trailing `[n]` yield `None`.
pub fn split_bus_index(name: &str) -> Option<(&str, u32)> {
    let inner = name.strip_suffix(']')?;
    let open = inner.rfind('[')?;
    let (base, index) = (&inner[..open], &inner[open + 1..]);
    if base.is_empty() || index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    index.parse().ok().map(|i| (base, i))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addr::ZoneId;

    #[test]
    fn width_follows_bits() {
        let z = ZoneId::from_raw(0);
        let f = Feature::new(
            "X",
            vec![BitAddress::new(z, 0, 1), BitAddress::new(z, 0, 2)],
        );
        assert_eq!(f.name(), "X");
        assert_eq!(f.width(), 2);
        assert_eq!(f.bits()[1].bit, 2);
    }

    #[test]
    fn valid_names() {
        assert!(is_valid_feature_name("A.B"));
        assert!(is_valid_feature_name("fpga_top.grid_clb_1__4_.LUT_INIT"));
        assert!(is_valid_feature_name("_x.y9"));
    }

    #[test]
    fn invalid_names() {
        assert!(!is_valid_feature_name(""));
        assert!(!is_valid_feature_name("A..B"));
        assert!(!is_valid_feature_name(".A"));
        assert!(!is_valid_feature_name("A.0B"));
        assert!(!is_valid_feature_name("A.B[0]"));
        assert!(!is_valid_feature_name("A B"));
    }

    #[test]
    fn bus_index_split() {
        assert_eq!(split_bus_index("LUT_INIT[3]"), Some(("LUT_INIT", 3)));
        assert_eq!(split_bus_index("a.b[12]"), Some(("a.b", 12)));
        assert_eq!(split_bus_index("LUT_INIT"), None);
        assert_eq!(split_bus_index("LUT_INIT[]"), None);
        assert_eq!(split_bus_index("[3]"), None);
        assert_eq!(split_bus_index("X[1:0]"), None);
    }
}
