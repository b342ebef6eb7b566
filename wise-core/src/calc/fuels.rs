use super::{field_groups, number, Calculation, ResponseShape};
use log::warn;
use serde::{Deserialize, Serialize};

/// A fuel type the Builder knows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelSummary {
    pub name: String,
    pub description: String,
}

/// Lists every fuel type.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListFuels;

impl Calculation for ListFuels {
    type Output = Vec<FuelSummary>;

    const COMMAND: &'static str = "LISTFUELS";
    const SHAPE: ResponseShape = ResponseShape::Sentinel;

    fn payload(&self) -> Vec<String> {
        Vec::new()
    }

    fn parse(&self, response: &str) -> Vec<FuelSummary> {
        field_groups(Self::COMMAND, response, 2)
            .into_iter()
            .map(|pair| FuelSummary {
                name: pair[0].to_string(),
                description: pair[1].to_string(),
            })
            .collect()
    }
}

pub const FLAG_CROWN_BASE_HEIGHT: u8 = 1;
pub const FLAG_PERCENT_CONIFER: u8 = 1 << 1;
pub const FLAG_PERCENT_DEAD_FIR: u8 = 1 << 2;
pub const FLAG_GRASS_CURING: u8 = 1 << 3;
pub const FLAG_GRASS_FUEL_LOAD: u8 = 1 << 4;

/// Default inputs for one fuel type, with the inputs it actually uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelDefaults {
    pub name: String,
    pub crown_base_height: f64,
    pub percent_conifer: f64,
    pub percent_dead_fir: f64,
    pub grass_curing: f64,
    pub grass_fuel_load: f64,
    pub flags: u8,
}

impl FuelDefaults {
    pub fn uses_crown_base_height(&self) -> bool {
        self.flags & FLAG_CROWN_BASE_HEIGHT != 0
    }

    pub fn uses_percent_conifer(&self) -> bool {
        self.flags & FLAG_PERCENT_CONIFER != 0
    }

    pub fn uses_percent_dead_fir(&self) -> bool {
        self.flags & FLAG_PERCENT_DEAD_FIR != 0
    }

    pub fn uses_grass_curing(&self) -> bool {
        self.flags & FLAG_GRASS_CURING != 0
    }

    pub fn uses_grass_fuel_load(&self) -> bool {
        self.flags & FLAG_GRASS_FUEL_LOAD != 0
    }
}

/// Default inputs for every fuel type.
#[derive(Debug, Clone, Copy, Default)]
pub struct FuelDefaultsRequest;

impl Calculation for FuelDefaultsRequest {
    type Output = Vec<FuelDefaults>;

    const COMMAND: &'static str = "FUELDEFAULTS";
    const SHAPE: ResponseShape = ResponseShape::Sentinel;

    fn payload(&self) -> Vec<String> {
        Vec::new()
    }

    fn parse(&self, response: &str) -> Vec<FuelDefaults> {
        field_groups(Self::COMMAND, response, 7)
            .into_iter()
            .filter_map(|group| {
                let flags = match group[6].parse::<u8>() {
                    Ok(flags) => flags,
                    Err(_) => {
                        warn!("FUELDEFAULTS flags '{}' for {} are not a bit set", group[6], group[0]);
                        return None;
                    }
                };
                Some(FuelDefaults {
                    name: group[0].to_string(),
                    crown_base_height: number(Self::COMMAND, group[1])?,
                    percent_conifer: number(Self::COMMAND, group[2])?,
                    percent_dead_fir: number(Self::COMMAND, group[3])?,
                    grass_curing: number(Self::COMMAND, group[4])?,
                    grass_fuel_load: number(Self::COMMAND, group[5])?,
                    flags,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_fuels() {
        let fuels = ListFuels.parse("C-1|Spruce-Lichen Woodland\r\nO-1a|Matted Grass\r\nCOMPLETE\r\n");
        assert_eq!(
            fuels,
            vec![
                FuelSummary {
                    name: "C-1".into(),
                    description: "Spruce-Lichen Woodland".into(),
                },
                FuelSummary {
                    name: "O-1a".into(),
                    description: "Matted Grass".into(),
                },
            ]
        );
        assert!(ListFuels.payload().is_empty());
    }

    #[test]
    fn test_fuel_defaults_flags() {
        let defaults = FuelDefaultsRequest.parse("O-1a|0|0|0|60|0.35|17\nCOMPLETE\n");
        assert_eq!(defaults.len(), 1);
        let grass = &defaults[0];
        assert_eq!(grass.flags, 0b0001_0001);
        assert!(grass.uses_crown_base_height());
        assert!(grass.uses_grass_fuel_load());
        assert!(!grass.uses_percent_conifer());
        assert!(!grass.uses_percent_dead_fir());
        assert!(!grass.uses_grass_curing());
        assert_eq!(grass.grass_fuel_load, 0.35);
    }

    #[test]
    fn test_fuel_defaults_bad_flags_dropped() {
        let defaults = FuelDefaultsRequest.parse("C-2|3|0|0|0|0|x\nC-3|8|0|0|0|0|1\nCOMPLETE\n");
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].name, "C-3");
    }
}
