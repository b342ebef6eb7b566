//! Custom fuel types and overrides of built-in fuel attributes.
//!
//! A definition streams its own record followed by one record per attribute
//! block it carries, always in the order spread, FMC, SFC, ROS,
//! acceleration, length-to-breadth, CFB, flame length. Each block record
//! starts with the owning fuel's id and the block's variant code.

use crate::{
    id::{check_id, next_default_id, Entity, EntityKind},
    validation::{check_comments, check_min, check_range, Validate, ValidationError},
    wire::{nullable, push_trailing, tags, Streamable, WireWriter},
    wire_fields,
};
use serde::{Deserialize, Serialize};

fn check_finite(errors: &mut Vec<ValidationError>, values: &[(&str, f64)]) {
    for (name, value) in values {
        if !value.is_finite() {
            errors.push(ValidationError::leaf(*name, "must be a finite number"));
        }
    }
}

fn check_component(errors: &mut Vec<ValidationError>, property: &str, value: &Option<String>) {
    if let Some(name) = value {
        crate::validation::require_text(errors, property, name);
    }
}

/// Display colour of a fuel in the Builder's legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

/// Spread behaviour and the fuel model it follows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpreadAttribute {
    Standard {
        q: f64,
        bui0: f64,
        max_be: f64,
        /// Crown base height, metres.
        cbh: f64,
        /// Crown fuel load, kg/m².
        cfl: f64,
    },
    /// A blend of a conifer and a deciduous component. Either component may
    /// be left to the Builder's default.
    Mixed {
        percent_conifer: f64,
        conifer: Option<String>,
        deciduous: Option<String>,
    },
    MixedDead {
        percent_dead_fir: f64,
        conifer: Option<String>,
        dead_fir: Option<String>,
    },
    Grass {
        curing: f64,
        fuel_load: f64,
    },
}

impl Validate for SpreadAttribute {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        match self {
            SpreadAttribute::Standard {
                q,
                bui0,
                max_be,
                cbh,
                cfl,
            } => {
                check_finite(&mut errors, &[("q", *q), ("bui0", *bui0), ("maxBe", *max_be)]);
                check_min(&mut errors, "cbh", *cbh, 0.0);
                check_min(&mut errors, "cfl", *cfl, 0.0);
            }
            SpreadAttribute::Mixed {
                percent_conifer,
                conifer,
                deciduous,
            } => {
                check_range(&mut errors, "percentConifer", *percent_conifer, 0.0, 100.0);
                check_component(&mut errors, "conifer", conifer);
                check_component(&mut errors, "deciduous", deciduous);
            }
            SpreadAttribute::MixedDead {
                percent_dead_fir,
                conifer,
                dead_fir,
            } => {
                check_range(&mut errors, "percentDeadFir", *percent_dead_fir, 0.0, 100.0);
                check_component(&mut errors, "conifer", conifer);
                check_component(&mut errors, "deadFir", dead_fir);
            }
            SpreadAttribute::Grass { curing, fuel_load } => {
                check_range(&mut errors, "curing", *curing, 0.0, 100.0);
                check_min(&mut errors, "fuelLoad", *fuel_load, 0.0);
            }
        }
        errors
    }
}

/// Foliar moisture content model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FmcAttribute {
    Standard { day0: f64 },
    NoCalculation,
}

/// Surface fuel consumption model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SfcAttribute {
    Standard {
        p1: f64,
        p2: f64,
        p3: f64,
        p4: f64,
        multiplier: f64,
    },
    Grass {
        fuel_load: f64,
    },
    Slash {
        ffc_a: f64,
        ffc_b: f64,
        wfc_a: f64,
        wfc_b: f64,
    },
}

/// Rate of spread equation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RosAttribute {
    Standard { a: f64, b: f64, c: f64 },
    /// Derived from the components of a mixed fuel.
    Mixed,
}

/// Length-to-breadth ratio model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LbAttribute {
    Standard { a: f64, b: f64, c: f64 },
    Grass,
}

/// Crown fraction burned model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CfbAttribute {
    Standard { csi_multiplier: f64, rso_divisor: f64 },
    NoCrown,
}

/// Flame length model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlameLengthAttribute {
    Alexander82 { a: f64, b: f64 },
    Byram,
}

/// A fuel type, either new or overriding a built-in one of the same name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelDefinition {
    /// The fuel's name, e.g. `C-2`.
    pub id: String,
    /// Value of the fuel in the lookup table and fuel grid.
    pub index: u32,
    pub color: Color,
    pub spread: Option<SpreadAttribute>,
    pub fmc: Option<FmcAttribute>,
    pub sfc: Option<SfcAttribute>,
    pub ros: Option<RosAttribute>,
    /// Initial acceleration parameter, 0 to 1.
    pub acceleration: Option<f64>,
    pub lb: Option<LbAttribute>,
    pub cfb: Option<CfbAttribute>,
    pub flame_length: Option<FlameLengthAttribute>,
    pub comments: Option<String>,
}

impl Default for FuelDefinition {
    fn default() -> Self {
        FuelDefinition {
            id: next_default_id(EntityKind::FuelDefinition),
            index: 0,
            color: Color::default(),
            spread: None,
            fmc: None,
            sfc: None,
            ros: None,
            acceleration: None,
            lb: None,
            cfb: None,
            flame_length: None,
            comments: None,
        }
    }
}

impl FuelDefinition {
    pub fn new(name: impl Into<String>, index: u32, color: Color) -> Self {
        FuelDefinition {
            id: name.into(),
            index,
            color,
            ..Default::default()
        }
    }
}

impl Validate for FuelDefinition {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_id(&mut errors, &self.id);
        crate::validation::push_child(&mut errors, "spread", || "SpreadAttribute".into(), &self.spread);
        let mut values: Vec<(&str, f64)> = Vec::new();
        if let Some(FmcAttribute::Standard { day0 }) = self.fmc {
            check_range(&mut errors, "fmc.day0", day0, -1.0, 366.0);
        }
        match self.sfc {
            Some(SfcAttribute::Standard {
                p1,
                p2,
                p3,
                p4,
                multiplier,
            }) => values.extend([
                ("sfc.p1", p1),
                ("sfc.p2", p2),
                ("sfc.p3", p3),
                ("sfc.p4", p4),
                ("sfc.multiplier", multiplier),
            ]),
            Some(SfcAttribute::Grass { fuel_load }) => {
                check_min(&mut errors, "sfc.fuelLoad", fuel_load, 0.0)
            }
            Some(SfcAttribute::Slash {
                ffc_a,
                ffc_b,
                wfc_a,
                wfc_b,
            }) => values.extend([
                ("sfc.ffcA", ffc_a),
                ("sfc.ffcB", ffc_b),
                ("sfc.wfcA", wfc_a),
                ("sfc.wfcB", wfc_b),
            ]),
            None => {}
        }
        if let Some(RosAttribute::Standard { a, b, c }) = self.ros {
            values.extend([("ros.a", a), ("ros.b", b), ("ros.c", c)]);
        }
        if let Some(acceleration) = self.acceleration {
            check_range(&mut errors, "acceleration", acceleration, 0.0, 1.0);
        }
        if let Some(LbAttribute::Standard { a, b, c }) = self.lb {
            values.extend([("lb.a", a), ("lb.b", b), ("lb.c", c)]);
        }
        if let Some(CfbAttribute::Standard {
            csi_multiplier,
            rso_divisor,
        }) = self.cfb
        {
            values.push(("cfb.csiMultiplier", csi_multiplier));
            if rso_divisor == 0.0 {
                errors.push(ValidationError::leaf("cfb.rsoDivisor", "may not be 0"));
            }
        }
        if let Some(FlameLengthAttribute::Alexander82 { a, b }) = self.flame_length {
            values.extend([("flameLength.a", a), ("flameLength.b", b)]);
        }
        check_finite(&mut errors, &values);
        check_comments(&mut errors, &self.comments);
        errors
    }
}

impl Entity for FuelDefinition {
    const KIND: EntityKind = EntityKind::FuelDefinition;

    fn id(&self) -> &str {
        &self.id
    }

    fn id_mut(&mut self) -> &mut String {
        &mut self.id
    }
}

impl Streamable for FuelDefinition {
    fn stream(&self, out: &mut WireWriter) {
        let id = &self.id;
        let mut fields = wire_fields![id, self.index, self.color.red, self.color.green, self.color.blue];
        push_trailing(&mut fields, self.comments.as_ref());
        out.record(tags::FUEL_DEFINITION, fields);

        if let Some(spread) = &self.spread {
            let fields = match spread {
                SpreadAttribute::Standard {
                    q,
                    bui0,
                    max_be,
                    cbh,
                    cfl,
                } => wire_fields![id, "standard", q, bui0, max_be, cbh, cfl],
                SpreadAttribute::Mixed {
                    percent_conifer,
                    conifer,
                    deciduous,
                } => {
                    let mut fields = wire_fields![id, "mixed", percent_conifer];
                    fields.push(nullable(conifer.as_ref()));
                    fields.push(nullable(deciduous.as_ref()));
                    fields
                }
                SpreadAttribute::MixedDead {
                    percent_dead_fir,
                    conifer,
                    dead_fir,
                } => {
                    let mut fields = wire_fields![id, "mixeddead", percent_dead_fir];
                    fields.push(nullable(conifer.as_ref()));
                    fields.push(nullable(dead_fir.as_ref()));
                    fields
                }
                SpreadAttribute::Grass { curing, fuel_load } => {
                    wire_fields![id, "grass", curing, fuel_load]
                }
            };
            out.record(tags::FUEL_SPREAD, fields);
        }
        if let Some(fmc) = &self.fmc {
            let fields = match fmc {
                FmcAttribute::Standard { day0 } => wire_fields![id, "standard", day0],
                FmcAttribute::NoCalculation => wire_fields![id, "nocalc"],
            };
            out.record(tags::FUEL_FMC, fields);
        }
        if let Some(sfc) = &self.sfc {
            let fields = match sfc {
                SfcAttribute::Standard {
                    p1,
                    p2,
                    p3,
                    p4,
                    multiplier,
                } => wire_fields![id, "standard", p1, p2, p3, p4, multiplier],
                SfcAttribute::Grass { fuel_load } => wire_fields![id, "grass", fuel_load],
                SfcAttribute::Slash {
                    ffc_a,
                    ffc_b,
                    wfc_a,
                    wfc_b,
                } => wire_fields![id, "slash", ffc_a, ffc_b, wfc_a, wfc_b],
            };
            out.record(tags::FUEL_SFC, fields);
        }
        if let Some(ros) = &self.ros {
            let fields = match ros {
                RosAttribute::Standard { a, b, c } => wire_fields![id, "standard", a, b, c],
                RosAttribute::Mixed => wire_fields![id, "mixed"],
            };
            out.record(tags::FUEL_ROS, fields);
        }
        if let Some(acceleration) = self.acceleration {
            out.record(tags::FUEL_ACCEL, wire_fields![id, acceleration]);
        }
        if let Some(lb) = &self.lb {
            let fields = match lb {
                LbAttribute::Standard { a, b, c } => wire_fields![id, "standard", a, b, c],
                LbAttribute::Grass => wire_fields![id, "grass"],
            };
            out.record(tags::FUEL_LB, fields);
        }
        if let Some(cfb) = &self.cfb {
            let fields = match cfb {
                CfbAttribute::Standard {
                    csi_multiplier,
                    rso_divisor,
                } => wire_fields![id, "standard", csi_multiplier, rso_divisor],
                CfbAttribute::NoCrown => wire_fields![id, "nocrown"],
            };
            out.record(tags::FUEL_CFB, fields);
        }
        if let Some(flame_length) = &self.flame_length {
            let fields = match flame_length {
                FlameLengthAttribute::Alexander82 { a, b } => {
                    wire_fields![id, "alexander82", a, b]
                }
                FlameLengthAttribute::Byram => wire_fields![id, "byram"],
            };
            out.record(tags::FUEL_FLAME_LENGTH, fields);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::WireReader;

    fn m1() -> FuelDefinition {
        let mut fuel = FuelDefinition::new(
            "M-1",
            5,
            Color {
                red: 255,
                green: 211,
                blue: 127,
            },
        );
        fuel.spread = Some(SpreadAttribute::Mixed {
            percent_conifer: 50.0,
            conifer: Some("C-2".into()),
            deciduous: None,
        });
        fuel
    }

    #[test]
    fn test_mixed_spread_uses_null_literal() {
        let mut out = WireWriter::new();
        m1().stream(&mut out);
        assert_eq!(
            out.render(),
            "fueldefinition\nM-1|5|255|211|127\nfuelspread\nM-1|mixed|50|C-2|null\n"
        );
    }

    #[test]
    fn test_blocks_stream_in_fixed_order() {
        let mut fuel = m1();
        fuel.flame_length = Some(FlameLengthAttribute::Byram);
        fuel.acceleration = Some(0.115);
        fuel.fmc = Some(FmcAttribute::NoCalculation);
        fuel.cfb = Some(CfbAttribute::NoCrown);
        fuel.ros = Some(RosAttribute::Mixed);
        let mut out = WireWriter::new();
        fuel.stream(&mut out);
        let records = WireReader::parse(&out.render());
        let order: Vec<&str> = records.iter().map(|r| r.tag.as_str()).collect();
        assert_eq!(
            order,
            vec![
                tags::FUEL_DEFINITION,
                tags::FUEL_SPREAD,
                tags::FUEL_FMC,
                tags::FUEL_ROS,
                tags::FUEL_ACCEL,
                tags::FUEL_CFB,
                tags::FUEL_FLAME_LENGTH,
            ]
        );
    }

    #[test]
    fn test_attribute_ranges() {
        let mut fuel = m1();
        fuel.spread = Some(SpreadAttribute::Grass {
            curing: 120.0,
            fuel_load: 0.35,
        });
        fuel.acceleration = Some(2.0);
        fuel.ros = Some(RosAttribute::Standard {
            a: f64::NAN,
            b: 0.0464,
            c: 1.4,
        });
        let flat: Vec<String> = fuel
            .check_valid()
            .iter()
            .flat_map(|e| e.flatten())
            .map(|(path, _)| path)
            .collect();
        assert_eq!(flat, vec!["spread.curing", "acceleration", "ros.a"]);
    }
}
