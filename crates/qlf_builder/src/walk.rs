//! Hierarchy walk from scope tree to leaf cells.
//!
//! Each call receives the accumulated name prefix, chain and base position as
//! a [`Context`] value and returns the leaves of its subtree. Sibling scopes
//! each derive their own context from the parent's, so nothing one sibling
//! does can change another's names or positions.

use crate::description::{CellDef, ScopeDef};
use crate::resolver::AddressResolver;
use qlf_db::{BitAddress, DatabaseError, DeviceGeometry};

/// One resolved configuration bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    /// Full dotted name, including any trailing `[n]` bus index.
    pub name: String,
    /// Resolved address.
    pub address: BitAddress,
}

/// Inherited state of one scope instance.
#[derive(Debug, Clone, Default)]
pub struct Context<'a> {
    /// Dotted name of the enclosing instance; empty at the root.
    pub prefix: String,
    /// Chain inherited from the nearest scope that named one.
    pub chain: Option<&'a str>,
    /// Chain position of the enclosing instance.
    pub base: u64,
}

impl<'a> Context<'a> {
    fn enter(&self, segment: &str, chain: Option<&'a str>, base: u64) -> Self {
        Context {
            prefix: join(&self.prefix, segment),
            chain: chain.or(self.chain),
            base,
        }
    }
}

fn join(prefix: &str, segment: &str) -> String {
    match (prefix.is_empty(), segment.is_empty()) {
        (true, _) => segment.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}.{segment}"),
    }
}

/// Walks the scope tree, resolving every cell to an address.
pub struct Walker<'a, R: ?Sized> {
    geometry: &'a DeviceGeometry,
    resolver: &'a R,
}

impl<'a, R: AddressResolver + ?Sized> Walker<'a, R> {
    /// Creates a walker resolving chain positions through `resolver` and
    /// direct addresses through `geometry`.
    pub fn new(geometry: &'a DeviceGeometry, resolver: &'a R) -> Self {
        Self { geometry, resolver }
    }

    /// Returns the leaves of `scope` and its descendants, in description order.
    ///
    /// # Errors
    ///
    /// - [`DatabaseError::Description`] for malformed scopes or cells
    /// - [`DatabaseError::UnresolvedAddress`] for cells whose address cannot be
    ///   resolved
    pub fn walk<'d>(&self, scope: &'d ScopeDef, ctx: &Context<'d>) -> Result<Vec<Leaf>, DatabaseError> {
        let mut leaves = Vec::new();
        for (segment, offset) in instances(scope)? {
            let base = ctx
                .base
                .checked_add(scope.offset)
                .and_then(|b| b.checked_add(offset))
                .ok_or_else(|| position_overflow(&scope.name))?;
            let inner = ctx.enter(&segment, scope.chain.as_deref(), base);
            for cell in &scope.cells {
                leaves.push(self.leaf(cell, &inner)?);
            }
            for child in &scope.children {
                leaves.extend(self.walk(child, &inner)?);
            }
        }
        Ok(leaves)
    }

    fn leaf(&self, cell: &CellDef, ctx: &Context<'_>) -> Result<Leaf, DatabaseError> {
        let name = join(&ctx.prefix, &cell.name);
        let unresolved = |reason: String| DatabaseError::UnresolvedAddress {
            name: name.clone(),
            reason,
        };
        let address = match (cell.bit, &cell.address) {
            (Some(bit), None) => {
                let chain = ctx
                    .chain
                    .ok_or_else(|| unresolved("no chain in scope".to_string()))?;
                let position = ctx.base.checked_add(bit).ok_or_else(|| {
                    unresolved(format!("chain position {} + {bit} overflows", ctx.base))
                })?;
                self.resolver
                    .resolve(chain, position)
                    .map_err(unresolved)?
            }
            (None, Some(addr)) => {
                let text = format!("{}:{}:{}", addr.zone, addr.word, addr.bit);
                self.geometry
                    .parse_address(&text)
                    .map_err(|e| unresolved(e.to_string()))?
            }
            (Some(_), Some(_)) => {
                return Err(DatabaseError::Description(format!(
                    "cell '{name}' has both a chain bit and a direct address"
                )))
            }
            (None, None) => {
                return Err(DatabaseError::Description(format!(
                    "cell '{name}' has neither a chain bit nor a direct address"
                )))
            }
        };
        Ok(Leaf { name, address })
    }
}

/// Expands a scope into `(name segment, position offset)` per instance.
fn instances(scope: &ScopeDef) -> Result<Vec<(String, u64)>, DatabaseError> {
    let templated = scope.name.contains("{}");
    let instanced = scope.repeat.is_some() || !scope.instances.is_empty();
    if scope.repeat.is_some() && !scope.instances.is_empty() {
        return Err(DatabaseError::Description(format!(
            "scope '{}' uses both repeat and instances",
            scope.name
        )));
    }
    if instanced && !templated {
        return Err(DatabaseError::Description(format!(
            "instanced scope '{}' has no '{{}}' in its name",
            scope.name
        )));
    }
    if templated && !instanced {
        return Err(DatabaseError::Description(format!(
            "scope '{}' has a '{{}}' placeholder but no instances",
            scope.name
        )));
    }

    if let Some(count) = scope.repeat {
        return (0..u64::from(count))
            .map(|i| {
                let label = scope.index_base.checked_add(i);
                let offset = i.checked_mul(scope.stride);
                match (label, offset) {
                    (Some(label), Some(offset)) => {
                        Ok((scope.name.replace("{}", &label.to_string()), offset))
                    }
                    _ => Err(position_overflow(&scope.name)),
                }
            })
            .collect();
    }
    if !scope.instances.is_empty() {
        return Ok(scope
            .instances
            .iter()
            .map(|inst| (scope.name.replace("{}", &inst.index.to_string()), inst.offset))
            .collect());
    }
    Ok(vec![(scope.name.clone(), 0)])
}

fn position_overflow(scope: &str) -> DatabaseError {
    DatabaseError::Description(format!("chain positions overflow in scope '{scope}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{AddressDef, InstanceDef, InstanceLabel};
    use qlf_db::{ZoneId, Zone};

    /// Maps position `p` of any chain to word 0, bit `p`.
    struct Flat;

    impl AddressResolver for Flat {
        fn resolve(&self, _chain: &str, position: u64) -> Result<BitAddress, String> {
            u8::try_from(position)
                .map(|bit| BitAddress::new(ZoneId::from_raw(0), 0, bit))
                .map_err(|_| "too far".to_string())
        }
    }

    fn geometry() -> DeviceGeometry {
        DeviceGeometry::new(vec![Zone {
            name: "r0".to_string(),
            words: 2,
            word_width: 64,
            order: 0,
        }])
        .unwrap()
    }

    fn cell(name: &str, bit: u64) -> CellDef {
        CellDef {
            name: name.to_string(),
            bit: Some(bit),
            address: None,
        }
    }

    fn names(leaves: &[Leaf]) -> Vec<(&str, u8)> {
        leaves.iter().map(|l| (l.name.as_str(), l.address.bit)).collect()
    }

    #[test]
    fn repeated_children_get_own_prefix_and_base() {
        let g = geometry();
        let top = ScopeDef {
            name: "top".to_string(),
            chain: Some("c".to_string()),
            offset: 1,
            children: vec![
                ScopeDef {
                    name: "clb_{}_".to_string(),
                    repeat: Some(2),
                    stride: 10,
                    index_base: 1,
                    cells: vec![cell("A", 0), cell("B[0]", 2)],
                    ..Default::default()
                },
                ScopeDef {
                    cells: vec![cell("GLOBAL", 30)],
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let leaves = Walker::new(&g, &Flat).walk(&top, &Context::default()).unwrap();
        assert_eq!(
            names(&leaves),
            [
                ("top.clb_1_.A", 1),
                ("top.clb_1_.B[0]", 3),
                ("top.clb_2_.A", 11),
                ("top.clb_2_.B[0]", 13),
                ("top.GLOBAL", 31),
            ]
        );
    }

    #[test]
    fn explicit_instances_with_text_labels() {
        let g = geometry();
        let top = ScopeDef {
            name: "sb_{}_".to_string(),
            chain: Some("c".to_string()),
            instances: vec![
                InstanceDef {
                    index: InstanceLabel::Text("1__4".to_string()),
                    offset: 5,
                },
                InstanceDef {
                    index: InstanceLabel::Number(0),
                    offset: 0,
                },
            ],
            cells: vec![cell("MUX", 0)],
            ..Default::default()
        };
        let leaves = Walker::new(&g, &Flat).walk(&top, &Context::default()).unwrap();
        assert_eq!(names(&leaves), [("sb_1__4_.MUX", 5), ("sb_0_.MUX", 0)]);
    }

    #[test]
    fn direct_address_is_checked() {
        let g = geometry();
        let mut top = ScopeDef {
            name: "top".to_string(),
            cells: vec![CellDef {
                name: "X".to_string(),
                bit: None,
                address: Some(AddressDef {
                    zone: "r0".to_string(),
                    word: 1,
                    bit: 63,
                }),
            }],
            ..Default::default()
        };
        let walker = Walker::new(&g, &Flat);
        let leaves = walker.walk(&top, &Context::default()).unwrap();
        assert_eq!(leaves[0].address, BitAddress::new(ZoneId::from_raw(0), 1, 63));

        top.cells[0].address = Some(AddressDef {
            zone: "r0".to_string(),
            word: 2,
            bit: 0,
        });
        assert!(matches!(
            walker.walk(&top, &Context::default()),
            Err(DatabaseError::UnresolvedAddress { name, .. }) if name == "top.X"
        ));
    }

    #[test]
    fn chain_bit_without_chain() {
        let g = geometry();
        let top = ScopeDef {
            name: "top".to_string(),
            cells: vec![cell("A", 0)],
            ..Default::default()
        };
        let err = Walker::new(&g, &Flat).walk(&top, &Context::default()).unwrap_err();
        assert!(err.to_string().contains("no chain in scope"));
    }

    #[test]
    fn repeat_requires_placeholder() {
        let g = geometry();
        let top = ScopeDef {
            name: "clb".to_string(),
            repeat: Some(2),
            ..Default::default()
        };
        assert!(matches!(
            Walker::new(&g, &Flat).walk(&top, &Context::default()),
            Err(DatabaseError::Description(_))
        ));
    }

    #[test]
    fn stride_overflow_is_an_error() {
        let g = geometry();
        let top = ScopeDef {
            name: "clb_{}_".to_string(),
            chain: Some("c".to_string()),
            repeat: Some(3),
            stride: u64::MAX,
            cells: vec![cell("A", 0)],
            ..Default::default()
        };
        let err = Walker::new(&g, &Flat).walk(&top, &Context::default()).unwrap_err();
        assert!(matches!(&err, DatabaseError::Description(m) if m.contains("clb_{}_")));
    }

    #[test]
    fn index_base_overflow_is_an_error() {
        let g = geometry();
        let top = ScopeDef {
            name: "clb_{}_".to_string(),
            repeat: Some(2),
            index_base: u64::MAX,
            ..Default::default()
        };
        assert!(matches!(
            Walker::new(&g, &Flat).walk(&top, &Context::default()),
            Err(DatabaseError::Description(_))
        ));
    }

    #[test]
    fn scope_offset_overflow_is_an_error() {
        let g = geometry();
        let top = ScopeDef {
            name: "top".to_string(),
            chain: Some("c".to_string()),
            offset: u64::MAX,
            children: vec![ScopeDef {
                name: "inner".to_string(),
                offset: 1,
                cells: vec![cell("A", 0)],
                ..Default::default()
            }],
            ..Default::default()
        };
        let err = Walker::new(&g, &Flat).walk(&top, &Context::default()).unwrap_err();
        assert!(matches!(&err, DatabaseError::Description(m) if m.contains("'inner'")));
    }

    #[test]
    fn cell_bit_overflow_names_the_cell() {
        let g = geometry();
        let top = ScopeDef {
            name: "clb_{}_".to_string(),
            chain: Some("c".to_string()),
            repeat: Some(2),
            stride: u64::MAX,
            cells: vec![cell("A", 1)],
            ..Default::default()
        };
        let err = Walker::new(&g, &Flat).walk(&top, &Context::default()).unwrap_err();
        match err {
            DatabaseError::UnresolvedAddress { name, reason } => {
                assert_eq!(name, "clb_1_.A");
                assert!(reason.contains("overflows"));
            }
            other => panic!("expected unresolved address, got {other}"),
        }
    }
}
