//! Flat JSON views of decoded meter data
//!
//! Energy values are rendered as exact decimal strings so that no precision
//! is lost to floating point on the consumer side.

use mercury_core::{EnergyTariffSet, PassportRecord};
use serde_json::{json, Map, Value};

/// Passport as a flat mapping
///
/// Keys: `address`, `serial_number`, `build_date` (ISO date or null),
/// `software_version`, `voltage_transform_ratio`, `current_transform_ratio`.
pub fn as_dict(passport: &PassportRecord) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("address".to_string(), json!(passport.network_address));
    map.insert("serial_number".to_string(), json!(passport.serial_number));
    map.insert(
        "build_date".to_string(),
        passport
            .build_date
            .map_or(Value::Null, |date| Value::String(date.to_string())),
    );
    map.insert(
        "software_version".to_string(),
        json!(passport.firmware_version.to_string()),
    );
    map.insert(
        "voltage_transform_ratio".to_string(),
        json!(passport.transform_ratios.voltage),
    );
    map.insert(
        "current_transform_ratio".to_string(),
        json!(passport.transform_ratios.current),
    );
    map
}

/// Energy per tariff bucket in kWh / kvarh
pub fn format_energy_from_reset(energy: &EnergyTariffSet) -> Map<String, Value> {
    energy
        .iter()
        .map(|(tariff, pair)| {
            (
                tariff.label().to_string(),
                json!({
                    "active_kwh": pair.active.to_string(),
                    "reactive_kvarh": pair.reactive.to_string(),
                }),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mercury_core::{BuildDate, Energy, EnergyPair, FirmwareVersion, Tariff, TransformRatios};

    fn passport(build_date: Option<BuildDate>) -> PassportRecord {
        PassportRecord {
            network_address: 47,
            serial_number: "03328747".to_string(),
            serial_raw: [3, 32, 87, 47],
            build_date,
            firmware_version: FirmwareVersion {
                major: 2,
                minor: 2,
                patch: 84,
            },
            transform_ratios: TransformRatios {
                voltage: 1,
                current: 60,
            },
        }
    }

    #[test]
    fn test_passport_dict() {
        let dict = as_dict(&passport(BuildDate::new(2021, 6, 15)));
        assert_eq!(dict.len(), 6);
        assert_eq!(dict["address"], json!(47));
        assert_eq!(dict["serial_number"], json!("03328747"));
        assert_eq!(dict["build_date"], json!("2021-06-15"));
        assert_eq!(dict["software_version"], json!("2.2.84"));
        assert_eq!(dict["voltage_transform_ratio"], json!(1));
        assert_eq!(dict["current_transform_ratio"], json!(60));
    }

    #[test]
    fn test_passport_dict_without_date() {
        let dict = as_dict(&passport(None));
        assert_eq!(dict["build_date"], Value::Null);
    }

    #[test]
    fn test_energy_strings_are_exact() {
        let mut set = EnergyTariffSet::default();
        set.set(
            Tariff::Sum,
            EnergyPair::new(Energy::from_raw(12_345_678), Energy::from_raw(5)),
        );
        set.set(
            Tariff::Loss,
            EnergyPair::new(Energy::from_raw(u32::MAX), Energy::from_raw(1_000)),
        );

        let formatted = format_energy_from_reset(&set);
        assert_eq!(formatted.len(), 6);
        assert_eq!(
            formatted["sum"],
            json!({"active_kwh": "12345.678", "reactive_kvarh": "0.005"})
        );
        assert_eq!(formatted["loss"]["active_kwh"], json!("4294967.295"));
        assert_eq!(formatted["loss"]["reactive_kvarh"], json!("1.000"));
        assert_eq!(formatted["t3"]["active_kwh"], json!("0.000"));
    }
}
