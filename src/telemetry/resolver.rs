// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the feeder-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Registrar resolution
//!
//! Given a device's card configuration, determines which registrars feed
//! which zones, deduplicating when one registrar feeds both zones. Pure
//! function of the input, no state.

use super::device::{DeviceSpec, Zone};

/// One registrar to poll and the zones its readings fan out to.
///
/// A single resolved entry translates into exactly one fetch per cycle; all
/// zones in `zones` observe the same reading, so error counters and register
/// merges for co-fed zones always stay consistent with each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRegistrar {
    pub registrar_id: String,
    pub zones: Vec<Zone>,
}

/// Resolve the registrars feeding a device's card.
///
/// Rules, in order:
/// 1. Both zones bound to the same registrar: one entry covering both zones.
/// 2. Each zone bound to a distinct registrar: one entry per zone.
/// 3. Only one zone bound: one entry covering both zones (the configured
///    zone is taken as representative of the whole card). Legacy
///    compatibility rule, preserved exactly.
/// 4. No zone bindings but a device-level legacy registrar: one entry
///    covering both zones.
/// 5. Otherwise: empty, and the scheduler must refuse to start the device.
pub fn resolve_registrars(device: &DeviceSpec) -> Vec<ResolvedRegistrar> {
    let superior = device.card_design.superior.registrar_id.as_deref();
    let inferior = device.card_design.inferior.registrar_id.as_deref();

    match (superior, inferior) {
        (Some(sup), Some(inf)) if sup == inf => vec![ResolvedRegistrar {
            registrar_id: sup.to_string(),
            zones: Zone::ALL.to_vec(),
        }],
        (Some(sup), Some(inf)) => vec![
            ResolvedRegistrar {
                registrar_id: sup.to_string(),
                zones: vec![Zone::Superior],
            },
            ResolvedRegistrar {
                registrar_id: inf.to_string(),
                zones: vec![Zone::Inferior],
            },
        ],
        (Some(only), None) | (None, Some(only)) => vec![ResolvedRegistrar {
            registrar_id: only.to_string(),
            zones: Zone::ALL.to_vec(),
        }],
        (None, None) => match &device.legacy_registrar_id {
            Some(legacy) => vec![ResolvedRegistrar {
                registrar_id: legacy.clone(),
                zones: Zone::ALL.to_vec(),
            }],
            None => Vec::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::device::{CardDesign, ZoneBinding};

    fn device_with(
        superior: Option<&str>,
        inferior: Option<&str>,
        legacy: Option<&str>,
    ) -> DeviceSpec {
        DeviceSpec {
            id: "dev".to_string(),
            poll_interval_ms: Some(1000),
            card_design: CardDesign {
                superior: ZoneBinding {
                    registrar_id: superior.map(String::from),
                },
                inferior: ZoneBinding {
                    registrar_id: inferior.map(String::from),
                },
            },
            legacy_registrar_id: legacy.map(String::from),
        }
    }

    #[test]
    fn test_shared_registrar_resolves_to_single_entry() {
        let resolved = resolve_registrars(&device_with(Some("r1"), Some("r1"), None));
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].registrar_id, "r1");
        assert_eq!(resolved[0].zones, vec![Zone::Superior, Zone::Inferior]);
    }

    #[test]
    fn test_distinct_registrars_resolve_to_one_entry_per_zone() {
        let resolved = resolve_registrars(&device_with(Some("r1"), Some("r2"), None));
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].registrar_id, "r1");
        assert_eq!(resolved[0].zones, vec![Zone::Superior]);
        assert_eq!(resolved[1].registrar_id, "r2");
        assert_eq!(resolved[1].zones, vec![Zone::Inferior]);
    }

    #[test]
    fn test_single_zone_binding_covers_whole_card() {
        for device in [
            device_with(Some("r1"), None, None),
            device_with(None, Some("r1"), None),
        ] {
            let resolved = resolve_registrars(&device);
            assert_eq!(resolved.len(), 1);
            assert_eq!(resolved[0].registrar_id, "r1");
            assert_eq!(resolved[0].zones, vec![Zone::Superior, Zone::Inferior]);
        }
    }

    #[test]
    fn test_legacy_device_level_registrar() {
        let resolved = resolve_registrars(&device_with(None, None, Some("old")));
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].registrar_id, "old");
        assert_eq!(resolved[0].zones, vec![Zone::Superior, Zone::Inferior]);
    }

    #[test]
    fn test_zone_bindings_take_precedence_over_legacy() {
        let resolved = resolve_registrars(&device_with(Some("r1"), None, Some("old")));
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].registrar_id, "r1");
    }

    #[test]
    fn test_unconfigured_device_resolves_to_nothing() {
        assert!(resolve_registrars(&device_with(None, None, None)).is_empty());
    }
}
