use super::{exact_fields, numbers, Calculation, ResponseShape};
use crate::wire::{nullable, WireField};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Number of fields in a complete FBP response.
pub const FBP_FIELDS: usize = 25;

/// Inputs of a single-point fire behaviour prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FbpCalculation {
    pub fuel_type: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    /// Percent slope.
    pub slope: f64,
    pub aspect: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub ffmc: f64,
    pub dmc: f64,
    pub dc: f64,
    /// Calculated from DMC and DC when absent.
    pub bui: Option<f64>,
    pub start_time: NaiveDateTime,
    /// Minutes since ignition.
    pub elapsed_time: f64,
    pub crown_base_height: Option<f64>,
    pub percent_conifer: Option<f64>,
    pub percent_dead_fir: Option<f64>,
    pub grass_curing: Option<f64>,
    pub grass_fuel_load: Option<f64>,
}

/// Fire behaviour at the point, or `is_calculated == false`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FbpResult {
    pub is_calculated: bool,
    pub ros_t: f64,
    pub ros_eq: f64,
    pub fros: f64,
    pub bros: f64,
    pub lb: f64,
    pub lbt: f64,
    pub hfi: f64,
    pub ffi: f64,
    pub bfi: f64,
    pub sfc: f64,
    pub ffc: f64,
    pub wfc: f64,
    pub cfc: f64,
    pub tfc: f64,
    pub cfb: f64,
    pub fcfb: f64,
    pub bcfb: f64,
    pub isi: f64,
    pub fmc: f64,
    pub wsv: f64,
    pub cfl: f64,
    pub area: f64,
    pub perimeter: f64,
    /// Surface, intermittent crown or crown fire.
    pub fire_description: String,
    pub raz: f64,
}

impl Calculation for FbpCalculation {
    type Output = FbpResult;

    const COMMAND: &'static str = "FBP";
    const SHAPE: ResponseShape = ResponseShape::Fields(FBP_FIELDS);

    fn payload(&self) -> Vec<String> {
        let fields = [
            self.fuel_type.clone(),
            self.latitude.to_field(),
            self.longitude.to_field(),
            self.elevation.to_field(),
            self.slope.to_field(),
            self.aspect.to_field(),
            self.wind_speed.to_field(),
            self.wind_direction.to_field(),
            self.ffmc.to_field(),
            self.dmc.to_field(),
            self.dc.to_field(),
            nullable(self.bui.as_ref()),
            self.start_time.to_field(),
            self.elapsed_time.to_field(),
            nullable(self.crown_base_height.as_ref()),
            nullable(self.percent_conifer.as_ref()),
            nullable(self.percent_dead_fir.as_ref()),
            nullable(self.grass_curing.as_ref()),
            nullable(self.grass_fuel_load.as_ref()),
        ];
        vec![fields.join("|")]
    }

    fn parse(&self, response: &str) -> FbpResult {
        let Some(fields) = exact_fields(Self::COMMAND, response, FBP_FIELDS) else {
            return FbpResult::default();
        };
        let description = fields[23].to_string();
        let mut values = fields;
        values.remove(23);
        let Some(v) = numbers(Self::COMMAND, &values) else {
            return FbpResult::default();
        };
        FbpResult {
            is_calculated: true,
            ros_t: v[0],
            ros_eq: v[1],
            fros: v[2],
            bros: v[3],
            lb: v[4],
            lbt: v[5],
            hfi: v[6],
            ffi: v[7],
            bfi: v[8],
            sfc: v[9],
            ffc: v[10],
            wfc: v[11],
            cfc: v[12],
            tfc: v[13],
            cfb: v[14],
            fcfb: v[15],
            bcfb: v[16],
            isi: v[17],
            fmc: v[18],
            wsv: v[19],
            cfl: v[20],
            area: v[21],
            perimeter: v[22],
            fire_description: description,
            raz: v[23],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn c1() -> FbpCalculation {
        FbpCalculation {
            fuel_type: "C-1".into(),
            latitude: 55.0,
            longitude: -120.0,
            elevation: 0.0,
            slope: 15.0,
            aspect: 0.0,
            wind_speed: 20.0,
            wind_direction: 0.0,
            ffmc: 90.0,
            dmc: 35.5,
            dc: 275.0,
            bui: None,
            start_time: NaiveDate::from_ymd_opt(2019, 6, 12)
                .unwrap()
                .and_hms_opt(13, 0, 0)
                .unwrap(),
            elapsed_time: 60.0,
            crown_base_height: None,
            percent_conifer: None,
            percent_dead_fir: None,
            grass_curing: None,
            grass_fuel_load: None,
        }
    }

    const C1_RESPONSE: &str = "8.5|8.1|8.5|0.6|1.9|1.8|3200|3200|220|1.2|1.2|0|0.3|1.5|0.2|0.2|0|10.4|97|22.4|0.75|9.1|1.3|Intermittent crown|180\n";

    #[test]
    fn test_payload() {
        assert_eq!(
            c1().payload(),
            vec!["C-1|55|-120|0|15|0|20|0|90|35.5|275|null|2019-06-12T13:00:00|60|null|null|null|null|null"]
        );
    }

    #[test]
    fn test_full_response_is_calculated() {
        let result = c1().parse(C1_RESPONSE);
        assert!(result.is_calculated);
        assert_eq!(result.ros_t, 8.5);
        assert_eq!(result.hfi, 3200.0);
        assert_eq!(result.fmc, 97.0);
        assert_eq!(result.fire_description, "Intermittent crown");
        assert_eq!(result.raz, 180.0);
    }

    #[test]
    fn test_short_response_is_not_calculated() {
        let result = c1().parse("8.5|8.1|8.5\n");
        assert!(!result.is_calculated);
        assert_eq!(result, FbpResult::default());
    }

    #[test]
    fn test_c1_with_crown_base_and_bui() {
        let request = FbpCalculation {
            elevation: 500.0,
            slope: 0.0,
            wind_speed: 10.0,
            ffmc: 85.0,
            bui: Some(40.0),
            crown_base_height: Some(7.0),
            ..c1()
        };
        assert_eq!(
            request.payload(),
            vec!["C-1|55|-120|500|0|0|10|0|85|35.5|275|40|2019-06-12T13:00:00|60|7|null|null|null|null"]
        );
        let result = request.parse(C1_RESPONSE);
        assert!(result.is_calculated);
        assert_eq!(result.ros_eq, 8.1);
        assert_eq!(result.area, 9.1);
        assert!(!request.parse("8.5|8.1|8.5|0.6\n").is_calculated);
    }

    #[test]
    fn test_bad_number_is_not_calculated() {
        let response = C1_RESPONSE.replacen("8.5", "fast", 1);
        assert!(!c1().parse(&response).is_calculated);
    }
}
